//! Best-effort favicon lookup keyed by a bookmark URL's hostname.

use reqwest::Url;

use crate::types::settings::FaviconSettings;

/// Builds icon URLs against a third-party favicon image service.
#[derive(Debug, Clone)]
pub struct FaviconResolver {
    service_url: String,
    size: u32,
}

impl FaviconResolver {
    pub fn new(settings: &FaviconSettings) -> Self {
        Self {
            service_url: settings.service_url.clone(),
            size: settings.size,
        }
    }

    /// Icon URL for `bookmark_url`, or `None` if it has no parseable host.
    pub fn favicon_url(&self, bookmark_url: &str) -> Option<String> {
        let parsed = Url::parse(bookmark_url).ok()?;
        let host = parsed.host_str().filter(|h| !h.is_empty())?;
        Some(format!("{}?domain={}&sz={}", self.service_url, host, self.size))
    }
}

impl Default for FaviconResolver {
    fn default() -> Self {
        Self::new(&FaviconSettings::default())
    }
}
