use serde::Deserialize;

/// Main configuration structure for Listing Harvester
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Ordered partition keys (e.g. county slugs) to crawl
    pub partitions: Vec<String>,
    pub site: SiteConfig,
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub output: OutputConfig,
    #[serde(default)]
    pub filters: FilterConfig,
}

/// Target site layout
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SiteConfig {
    /// Absolute base URL of the listing site
    pub base_url: String,

    /// Region qualifier substituted for `{region}` in the search path
    pub region: String,

    /// Search path template; must contain `{partition}`
    #[serde(default = "default_search_path")]
    pub search_path: String,

    /// Regex matched against link paths to recognize detail pages
    #[serde(default = "default_detail_path_pattern")]
    pub detail_path_pattern: String,

    /// Visit the site root once before crawling to pick up session cookies
    #[serde(default = "default_warm_up")]
    pub warm_up: bool,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct CrawlerConfig {
    /// Attempts per fetch (including the first)
    pub max_retries: u32,

    /// Per-attempt request timeout
    pub request_timeout_seconds: f64,

    /// Lower bound of the per-request delay
    pub min_delay_seconds: f64,

    /// Upper bound of the per-request delay
    pub max_delay_seconds: f64,

    /// `[min, max]` delay between two partitions
    pub inter_partition_delay: [f64; 2],

    /// Safety ceiling on search pages per partition
    pub max_pages_per_partition: u32,

    /// Politeness cap on new detail pages fetched per search page
    pub max_listings_per_page: usize,

    /// Base of the exponential backoff applied after a 403
    pub backoff_base_seconds: f64,

    /// Flat delay applied after a transport-level failure
    pub transport_retry_delay_seconds: f64,

    /// How the "next page" affordance is detected
    pub pagination: PaginationStrategy,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            request_timeout_seconds: 30.0,
            min_delay_seconds: 3.0,
            max_delay_seconds: 7.0,
            inter_partition_delay: [5.0, 10.0],
            max_pages_per_partition: 20,
            max_listings_per_page: 10,
            backoff_base_seconds: 5.0,
            transport_retry_delay_seconds: 5.0,
            pagination: PaginationStrategy::NextLinkText,
        }
    }
}

/// Pagination detection strategies selectable from config
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum PaginationStrategy {
    /// An anchor whose text reads "Next", "›" or "»"
    #[default]
    NextLinkText,
    /// A `rel="next"` anchor or link element
    RelNext,
    /// Either of the above
    Any,
}

/// Browser identities rotated across requests
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Pool of User-Agent strings; one is drawn per request
    pub pool: Vec<String>,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct OutputConfig {
    /// Path of the local JSON backup snapshot
    pub backup_path: String,

    /// Path to the SQLite database that receives published records
    pub database_path: String,

    /// Path to the markdown run summary
    pub summary_path: String,
}

/// Optional record filters
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct FilterConfig {
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub min_revenue: Option<f64>,
    #[serde(default)]
    pub franchise_only: bool,
}

fn default_search_path() -> String {
    "/businesses-for-sale/in/{region}/{partition}-county/".to_string()
}

fn default_detail_path_pattern() -> String {
    "/listing/".to_string()
}

fn default_warm_up() -> bool {
    true
}
