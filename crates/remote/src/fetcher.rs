//! Font catalog downloads.

use async_trait::async_trait;
use fontpush_core::FontArchive;
use std::time::Duration;

use crate::Result;

/// Download endpoint of the Google Fonts catalog; the family name is
/// appended.
pub const DEFAULT_CATALOG_URL: &str = "https://fonts.google.com/download?family=";

/// A source of font packages by family name.
#[async_trait]
pub trait FontSource: Send + Sync {
    /// Fetch the package for `family`, or `None` if it is unavailable.
    async fn fetch(&self, family: &str) -> Option<FontArchive>;
}

/// HTTP client for the font catalog.
///
/// One GET per lookup, no retries. Any non-success status or transport
/// failure means the font is unavailable.
#[derive(Debug, Clone)]
pub struct FontFetcher {
    client: reqwest::Client,
    catalog_url: String,
}

impl FontFetcher {
    /// Create a fetcher for the catalog at `catalog_url`.
    ///
    /// Without a timeout a stalled catalog blocks the caller indefinitely.
    pub fn new(catalog_url: impl Into<String>, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
            catalog_url: catalog_url.into(),
        })
    }

    /// Download URL for a family. Spaces become `%20`; nothing else is
    /// escaped.
    pub fn download_url(&self, family: &str) -> String {
        format!("{}{}", self.catalog_url, family.replace(' ', "%20"))
    }
}

#[async_trait]
impl FontSource for FontFetcher {
    async fn fetch(&self, family: &str) -> Option<FontArchive> {
        let url = self.download_url(family);
        log::debug!("Fetching font '{}' from {}", family, url);

        let response = match self.client.get(&url).send().await {
            Ok(response) => response,
            Err(e) => {
                log::warn!("Font '{}' unavailable: request failed: {}", family, e);
                return None;
            }
        };

        let status = response.status();
        if !status.is_success() {
            log::warn!("Font '{}' unavailable: catalog returned {}", family, status);
            return None;
        }

        match response.bytes().await {
            Ok(body) => {
                log::info!("Fetched font '{}' ({} bytes)", family, body.len());
                Some(FontArchive::new(family, body.to_vec()))
            }
            Err(e) => {
                log::warn!("Font '{}' unavailable: reading body failed: {}", family, e);
                None
            }
        }
    }
}
