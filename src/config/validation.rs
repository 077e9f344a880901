use crate::config::types::{
    Config, CrawlerConfig, FilterConfig, OutputConfig, SiteConfig, UserAgentConfig,
};
use crate::ConfigError;
use regex::Regex;
use reqwest::header::HeaderValue;
use url::Url;

/// Upper bound for any configured duration
const MAX_SECONDS: f64 = 3600.0;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_partitions(&config.partitions)?;
    validate_site_config(&config.site)?;
    validate_crawler_config(&config.crawler)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_output_config(&config.output)?;
    validate_filter_config(&config.filters)?;
    Ok(())
}

/// Validates the partition list
fn validate_partitions(partitions: &[String]) -> Result<(), ConfigError> {
    if partitions.is_empty() {
        return Err(ConfigError::Validation(
            "at least one partition must be configured".to_string(),
        ));
    }

    for key in partitions {
        let trimmed = key.trim();
        if trimmed.is_empty() {
            return Err(ConfigError::Validation(
                "partition keys cannot be empty".to_string(),
            ));
        }

        if !trimmed
            .chars()
            .all(|c| c.is_alphanumeric() || c == '-' || c == ' ')
        {
            return Err(ConfigError::Validation(format!(
                "partition key '{}' may only contain letters, digits, spaces and hyphens",
                key
            )));
        }
    }

    Ok(())
}

/// Validates the site layout
fn validate_site_config(config: &SiteConfig) -> Result<(), ConfigError> {
    let base = Url::parse(&config.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base_url: {}", e)))?;

    if base.scheme() != "http" && base.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "base_url must use http or https, got '{}'",
            base.scheme()
        )));
    }

    if base.host_str().is_none() {
        return Err(ConfigError::InvalidUrl(format!(
            "base_url '{}' has no host",
            config.base_url
        )));
    }

    if !config.search_path.contains("{partition}") {
        return Err(ConfigError::Validation(format!(
            "search_path '{}' must contain the {{partition}} placeholder",
            config.search_path
        )));
    }

    if config.detail_path_pattern.is_empty() {
        return Err(ConfigError::InvalidPattern(
            "detail_path_pattern cannot be empty".to_string(),
        ));
    }

    Regex::new(&config.detail_path_pattern).map_err(|e| {
        ConfigError::InvalidPattern(format!(
            "detail_path_pattern '{}': {}",
            config.detail_path_pattern, e
        ))
    })?;

    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.max_retries < 1 {
        return Err(ConfigError::Validation(format!(
            "max_retries must be >= 1, got {}",
            config.max_retries
        )));
    }

    let timeout = config.request_timeout_seconds;
    if !timeout.is_finite() || timeout <= 0.0 || timeout > MAX_SECONDS {
        return Err(ConfigError::Validation(format!(
            "request_timeout_seconds must be in (0, {}], got {}",
            MAX_SECONDS, timeout
        )));
    }

    validate_delay_range(
        "min_delay_seconds/max_delay_seconds",
        config.min_delay_seconds,
        config.max_delay_seconds,
    )?;

    validate_delay_range(
        "inter_partition_delay",
        config.inter_partition_delay[0],
        config.inter_partition_delay[1],
    )?;

    if config.max_pages_per_partition < 1 {
        return Err(ConfigError::Validation(format!(
            "max_pages_per_partition must be >= 1, got {}",
            config.max_pages_per_partition
        )));
    }

    if config.max_listings_per_page < 1 {
        return Err(ConfigError::Validation(format!(
            "max_listings_per_page must be >= 1, got {}",
            config.max_listings_per_page
        )));
    }

    for (name, value) in [
        ("backoff_base_seconds", config.backoff_base_seconds),
        ("transport_retry_delay_seconds", config.transport_retry_delay_seconds),
    ] {
        if !value.is_finite() || !(0.0..=MAX_SECONDS).contains(&value) {
            return Err(ConfigError::Validation(format!(
                "{} must be in [0, {}], got {}",
                name, MAX_SECONDS, value
            )));
        }
    }

    Ok(())
}

/// Validates a `[min, max]` pair of delays in seconds
fn validate_delay_range(name: &str, min: f64, max: f64) -> Result<(), ConfigError> {
    if !min.is_finite() || !max.is_finite() || min < 0.0 || max < 0.0 {
        return Err(ConfigError::Validation(format!(
            "{} must be non-negative, got [{}, {}]",
            name, min, max
        )));
    }

    if max > MAX_SECONDS {
        return Err(ConfigError::Validation(format!(
            "{}: maximum {} exceeds {} seconds",
            name, max, MAX_SECONDS
        )));
    }

    if min > max {
        return Err(ConfigError::Validation(format!(
            "{}: minimum {} exceeds maximum {}",
            name, min, max
        )));
    }

    Ok(())
}

/// Validates the user agent pool
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    if config.pool.is_empty() {
        return Err(ConfigError::Validation(
            "user-agent pool cannot be empty".to_string(),
        ));
    }

    for agent in &config.pool {
        if agent.trim().is_empty() {
            return Err(ConfigError::Validation(
                "user-agent pool entries cannot be blank".to_string(),
            ));
        }

        HeaderValue::from_str(agent).map_err(|_| {
            ConfigError::Validation(format!(
                "user-agent '{}' is not a valid header value",
                agent
            ))
        })?;
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.backup_path.is_empty() {
        return Err(ConfigError::Validation(
            "backup_path cannot be empty".to_string(),
        ));
    }

    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database_path cannot be empty".to_string(),
        ));
    }

    if config.summary_path.is_empty() {
        return Err(ConfigError::Validation(
            "summary_path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates the optional record filters
fn validate_filter_config(config: &FilterConfig) -> Result<(), ConfigError> {
    for (name, value) in [
        ("min_price", config.min_price),
        ("max_price", config.max_price),
        ("min_revenue", config.min_revenue),
    ] {
        if let Some(v) = value {
            if !v.is_finite() || v < 0.0 {
                return Err(ConfigError::Validation(format!(
                    "{} must be a non-negative amount, got {}",
                    name, v
                )));
            }
        }
    }

    if let (Some(min), Some(max)) = (config.min_price, config.max_price) {
        if min > max {
            return Err(ConfigError::Validation(format!(
                "min_price {} exceeds max_price {}",
                min, max
            )));
        }
    }

    Ok(())
}
