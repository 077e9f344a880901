//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building the browser-like HTTP session (headers, cookies, user agents)
//! - Rate-limited GET requests
//! - Retry logic with exponential backoff on blocking responses
//! - Classifying every fetch into a [`FetchOutcome`]

use crate::config::{CrawlerConfig, UserAgentConfig};
use crate::crawler::rate_limiter::{seconds, sleep_cancellable, RateLimiter};
use crate::{ConfigError, HarvestError};
use rand::Rng;
use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::{redirect::Policy, Client, RequestBuilder, StatusCode};
use std::fmt;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Maximum number of redirects followed per request
const MAX_REDIRECTS: usize = 10;

/// Headers sent with every request, in addition to the rotated User-Agent
const BROWSER_HEADERS: &[(&str, &str)] = &[
    (
        "accept",
        "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8",
    ),
    ("accept-language", "en-US,en;q=0.9"),
    ("upgrade-insecure-requests", "1"),
    ("sec-fetch-dest", "document"),
    ("sec-fetch-mode", "navigate"),
    ("sec-fetch-site", "none"),
    ("sec-fetch-user", "?1"),
    ("cache-control", "max-age=0"),
    ("dnt", "1"),
];

/// Why a fetch failed without a blocking signal
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureCause {
    /// A non-200, non-403 status code
    Status(u16),
    /// Timeout, connection failure or body read error
    Transport(String),
}

impl fmt::Display for FailureCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Status(code) => write!(f, "HTTP {}", code),
            Self::Transport(msg) => write!(f, "transport error: {}", msg),
        }
    }
}

/// Result of a fetch operation
#[derive(Debug, PartialEq, Eq)]
pub enum FetchOutcome {
    /// HTTP 200 with the page body
    Success {
        body: String,
        status: u16,
        /// Final URL after redirects
        final_url: Url,
        attempts: u32,
    },

    /// Every attempt was answered with HTTP 403
    Blocked { status: u16, attempts: u32 },

    /// Failed with a non-retryable status, or with transport errors only
    Failed { cause: FailureCause, attempts: u32 },

    /// Retries ran out on a mix of 403s and transport errors
    Exhausted { attempts: u32 },

    /// Cancellation was observed before the fetch completed
    Cancelled,
}

impl FetchOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Number of HTTP attempts made (zero when cancelled)
    pub fn attempts(&self) -> u32 {
        match self {
            Self::Success { attempts, .. }
            | Self::Blocked { attempts, .. }
            | Self::Failed { attempts, .. }
            | Self::Exhausted { attempts } => *attempts,
            Self::Cancelled => 0,
        }
    }

    /// Short description used in log lines
    pub fn describe(&self) -> String {
        match self {
            Self::Success { status, .. } => format!("HTTP {}", status),
            Self::Blocked { status, .. } => format!("blocked (HTTP {})", status),
            Self::Failed { cause, .. } => format!("failed ({})", cause),
            Self::Exhausted { .. } => "retries exhausted".to_string(),
            Self::Cancelled => "cancelled".to_string(),
        }
    }
}

/// The crawler's HTTP identity for one run
///
/// Owns a reqwest client with a cookie store, so cookies set by the site
/// (including during warm-up) are replayed on later requests. Dropped at the
/// end of the run.
#[derive(Debug, Clone)]
pub struct HttpSession {
    client: Client,
    user_agents: Vec<String>,
}

impl HttpSession {
    /// Builds the session's HTTP client
    ///
    /// # Arguments
    ///
    /// * `crawler` - Supplies the per-attempt timeout
    /// * `user_agents` - Pool of User-Agent strings rotated per request
    ///
    /// # Returns
    ///
    /// * `Ok(HttpSession)` - Session ready for use
    /// * `Err(HarvestError)` - The timeout is unusable or the client could not be built
    pub fn new(crawler: &CrawlerConfig, user_agents: &UserAgentConfig) -> Result<Self, HarvestError> {
        let timeout = Duration::try_from_secs_f64(crawler.request_timeout_seconds)
            .ok()
            .filter(|t| !t.is_zero())
            .ok_or_else(|| {
                ConfigError::Validation(format!(
                    "request_timeout_seconds {} is not a usable timeout",
                    crawler.request_timeout_seconds
                ))
            })?;

        let client = Client::builder()
            .default_headers(browser_headers())
            .cookie_store(true)
            .timeout(timeout)
            .redirect(Policy::limited(MAX_REDIRECTS))
            .gzip(true)
            .brotli(true)
            .build()?;

        Ok(Self {
            client,
            user_agents: user_agents.pool.clone(),
        })
    }

    /// Draws a User-Agent from the pool
    pub fn pick_user_agent(&self) -> Option<&str> {
        if self.user_agents.is_empty() {
            return None;
        }
        let index = rand::rng().random_range(0..self.user_agents.len());
        Some(self.user_agents[index].as_str())
    }

    fn get(&self, url: &Url) -> RequestBuilder {
        let request = self.client.get(url.clone());
        match self.pick_user_agent() {
            Some(agent) => request.header(header::USER_AGENT, agent),
            None => request,
        }
    }

    /// Visits `root` once to pick up session cookies
    ///
    /// Failures are logged and otherwise ignored. Returns true if the site
    /// answered with a success status.
    pub async fn warm_up(&self, root: &Url, cancel: &CancellationToken) -> bool {
        tracing::info!("Warming up session at {}", root);

        let result = tokio::select! {
            result = self.get(root).send() => result,
            _ = cancel.cancelled() => return false,
        };

        match result {
            Ok(response) if response.status().is_success() => {
                tracing::debug!(url = %root, status = response.status().as_u16(), "Warm-up complete");
                true
            }
            Ok(response) => {
                tracing::warn!(url = %root, status = response.status().as_u16(), "Warm-up returned non-success status");
                false
            }
            Err(e) => {
                tracing::warn!(url = %root, "Warm-up failed: {}", e);
                false
            }
        }
    }
}

fn browser_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    for (name, value) in BROWSER_HEADERS {
        headers.insert(*name, HeaderValue::from_static(*value));
    }
    headers
}

/// Computes the backoff applied after the 403 on attempt `attempt_index` (0-based)
///
/// `base * 2^attempt_index`, saturating.
pub fn backoff_delay(base: Duration, attempt_index: u32) -> Duration {
    base.saturating_mul(2u32.saturating_pow(attempt_index))
}

/// Retry parameters for one fetch
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Attempts per fetch, including the first; at least 1
    pub max_attempts: u32,
    pub backoff_base: Duration,
    pub transport_retry_delay: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &CrawlerConfig) -> Self {
        Self {
            max_attempts: config.max_retries.max(1),
            backoff_base: seconds(config.backoff_base_seconds),
            transport_retry_delay: seconds(config.transport_retry_delay_seconds),
        }
    }

    pub fn backoff_delay(&self, attempt_index: u32) -> Duration {
        backoff_delay(self.backoff_base, attempt_index)
    }
}

/// What a single HTTP attempt produced
enum Attempt {
    Ok { body: String, final_url: Url },
    Status(u16),
    Transport(String),
    Cancelled,
}

/// Performs rate-limited GETs with bounded retries
#[derive(Debug, Clone)]
pub struct RetryingFetcher {
    policy: RetryPolicy,
    limiter: RateLimiter,
}

impl RetryingFetcher {
    pub fn new(policy: RetryPolicy, limiter: RateLimiter) -> Self {
        Self { policy, limiter }
    }

    pub fn from_config(config: &CrawlerConfig) -> Self {
        Self::new(RetryPolicy::from_config(config), RateLimiter::per_request(config))
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Fetches `url`, retrying according to the policy
    ///
    /// # Retry Logic
    ///
    /// | Condition | Action |
    /// |-----------|--------|
    /// | HTTP 200 | Immediate → Success |
    /// | HTTP 403 | Sleep `base * 2^attempt`, retry; last attempt → Blocked |
    /// | Other status | Immediate → Failed |
    /// | Transport error | Sleep flat delay, retry; last attempt → Failed |
    ///
    /// When retries run out after both 403s and transport errors were seen
    /// the outcome is `Exhausted`. Each attempt is preceded by a rate-limit
    /// wait. Never panics and never returns an error.
    pub async fn fetch(
        &self,
        session: &HttpSession,
        url: &Url,
        cancel: &CancellationToken,
    ) -> FetchOutcome {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut saw_block = false;
        let mut last_transport: Option<String> = None;

        for attempt_index in 0..max_attempts {
            let attempt = attempt_index + 1;
            let is_last = attempt == max_attempts;

            if cancel.is_cancelled() || !self.limiter.wait_cancellable(cancel).await {
                tracing::info!(url = %url, attempt, "Fetch cancelled");
                return FetchOutcome::Cancelled;
            }

            tracing::debug!(url = %url, attempt, max_attempts, "Fetching");

            let retry_delay = match self.send_once(session, url, cancel).await {
                Attempt::Ok { body, final_url } => {
                    tracing::debug!(url = %url, attempt, status = 200u16, "Fetched");
                    return FetchOutcome::Success {
                        body,
                        status: StatusCode::OK.as_u16(),
                        final_url,
                        attempts: attempt,
                    };
                }
                Attempt::Status(status) if status == StatusCode::FORBIDDEN.as_u16() => {
                    saw_block = true;
                    let backoff = self.policy.backoff_delay(attempt_index);
                    tracing::warn!(
                        url = %url,
                        attempt,
                        status,
                        backoff_ms = if is_last { 0 } else { backoff.as_millis() as u64 },
                        "Blocked"
                    );
                    backoff
                }
                Attempt::Status(status) => {
                    tracing::warn!(url = %url, attempt, status, "Unexpected status");
                    return FetchOutcome::Failed {
                        cause: FailureCause::Status(status),
                        attempts: attempt,
                    };
                }
                Attempt::Transport(msg) => {
                    let backoff = self.policy.transport_retry_delay;
                    tracing::warn!(
                        url = %url,
                        attempt,
                        backoff_ms = if is_last { 0 } else { backoff.as_millis() as u64 },
                        "Transport error: {}",
                        msg
                    );
                    last_transport = Some(msg);
                    backoff
                }
                Attempt::Cancelled => {
                    tracing::info!(url = %url, attempt, "Fetch cancelled");
                    return FetchOutcome::Cancelled;
                }
            };

            if !is_last && !sleep_cancellable(retry_delay, cancel).await {
                tracing::info!(url = %url, attempt, "Fetch cancelled during backoff");
                return FetchOutcome::Cancelled;
            }
        }

        let outcome = match (saw_block, last_transport) {
            (true, None) => FetchOutcome::Blocked {
                status: StatusCode::FORBIDDEN.as_u16(),
                attempts: max_attempts,
            },
            (false, Some(msg)) => FetchOutcome::Failed {
                cause: FailureCause::Transport(msg),
                attempts: max_attempts,
            },
            _ => FetchOutcome::Exhausted {
                attempts: max_attempts,
            },
        };

        tracing::warn!(url = %url, attempts = max_attempts, "Giving up: {}", outcome.describe());
        outcome
    }

    async fn send_once(
        &self,
        session: &HttpSession,
        url: &Url,
        cancel: &CancellationToken,
    ) -> Attempt {
        let result = tokio::select! {
            result = session.get(url).send() => result,
            _ = cancel.cancelled() => return Attempt::Cancelled,
        };

        let response = match result {
            Ok(response) => response,
            Err(e) => return Attempt::Transport(classify_transport_error(&e)),
        };

        let status = response.status();
        if status != StatusCode::OK {
            return Attempt::Status(status.as_u16());
        }

        let final_url = response.url().clone();
        let body = tokio::select! {
            body = response.text() => body,
            _ = cancel.cancelled() => return Attempt::Cancelled,
        };

        match body {
            Ok(body) => Attempt::Ok { body, final_url },
            Err(e) => Attempt::Transport(classify_transport_error(&e)),
        }
    }
}

fn classify_transport_error(error: &reqwest::Error) -> String {
    if error.is_timeout() {
        format!("timeout: {}", error)
    } else if error.is_connect() {
        format!("connection failed: {}", error)
    } else if error.is_body() || error.is_decode() {
        format!("body read failed: {}", error)
    } else {
        error.to_string()
    }
}
