use crate::config::SiteConfig;
use crate::url::partition_slug;
use crate::UrlError;
use url::Url;

/// Builds paginated search-result URLs for a partition
///
/// The search path is a template with `{region}` and `{partition}`
/// placeholders. Page 1 is the bare search URL; later pages carry a
/// `page=N` query parameter.
#[derive(Debug, Clone)]
pub struct SearchUrlBuilder {
    base: Url,
    region: String,
    template: String,
}

impl SearchUrlBuilder {
    /// Creates a builder from the site configuration
    pub fn new(site: &SiteConfig) -> Result<Self, UrlError> {
        let base = Url::parse(&site.base_url).map_err(|e| UrlError::Parse(e.to_string()))?;
        Ok(Self {
            base,
            region: site.region.clone(),
            template: site.search_path.clone(),
        })
    }

    /// The site root, used to resolve relative links and warm up the session
    pub fn base(&self) -> &Url {
        &self.base
    }

    /// Returns the URL of `page` (1-based) of the search results for `partition`
    ///
    /// # Examples
    ///
    /// ```
    /// use listing_harvester::config::SiteConfig;
    /// use listing_harvester::url::SearchUrlBuilder;
    ///
    /// let site = SiteConfig {
    ///     base_url: "https://www.bizbuysell.com".to_string(),
    ///     region: "NC".to_string(),
    ///     search_path: "/businesses-for-sale/in/{region}/{partition}-county/".to_string(),
    ///     detail_path_pattern: "/listing/".to_string(),
    ///     warm_up: false,
    /// };
    /// let builder = SearchUrlBuilder::new(&site).unwrap();
    /// assert_eq!(
    ///     builder.page_url("iredell", 2).unwrap().as_str(),
    ///     "https://www.bizbuysell.com/businesses-for-sale/in/NC/iredell-county/?page=2"
    /// );
    /// ```
    pub fn page_url(&self, partition: &str, page: u32) -> Result<Url, UrlError> {
        let path = self
            .template
            .replace("{region}", &self.region)
            .replace("{partition}", &partition_slug(partition));

        let mut url = self
            .base
            .join(&path)
            .map_err(|e| UrlError::Malformed(format!("search path '{}': {}", path, e)))?;

        if page > 1 {
            url.query_pairs_mut()
                .append_pair("page", &page.to_string());
        }

        Ok(url)
    }
}
