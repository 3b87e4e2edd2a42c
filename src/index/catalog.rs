//! Media Catalog Listing Client
//!
//! Pages the remote media library's admin listing API. The `CatalogSource`
//! trait is the seam between index construction and the network; the
//! `MediaLibraryClient` implements it against a Cloudinary-style endpoint
//! with blocking HTTP and basic authentication.

use std::collections::HashMap;

use serde::Deserialize;
use tracing::debug;

use crate::config::MediaLibraryConfig;
use crate::utils::error::{MedPlantError, Result};

/// One listed asset from the media library
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogResource {
    /// Provider-side identifier, usually `<folder>/<filename-stem>`
    pub public_id: String,

    /// Free-form tags attached at upload time
    #[serde(default)]
    pub tags: Vec<String>,

    /// Key/value metadata attached at upload time
    #[serde(default)]
    pub context: HashMap<String, String>,

    /// Directly resolvable HTTPS URL for the asset bytes
    #[serde(default)]
    pub secure_url: Option<String>,
}

impl CatalogResource {
    /// Filename portion of the public id
    pub fn filename(&self) -> &str {
        self.public_id
            .rsplit('/')
            .next()
            .unwrap_or(&self.public_id)
    }
}

/// One page of the catalog listing
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogPage {
    #[serde(default)]
    pub resources: Vec<CatalogResource>,

    /// Continuation cursor; `None` means the listing is complete
    #[serde(default)]
    pub next_cursor: Option<String>,
}

/// Source of catalog listing pages.
///
/// Index construction only depends on this trait, so tests can feed fixture
/// pages without a network.
pub trait CatalogSource {
    /// Fetch one listing page. `cursor` is the continuation token returned
    /// by the previous page, or `None` for the first page.
    fn list_page(&self, cursor: Option<&str>) -> Result<CatalogPage>;

    /// Verify connectivity and credentials before any paging starts
    fn verify(&self) -> Result<()> {
        Ok(())
    }
}

/// Blocking HTTP client for the media library admin API
pub struct MediaLibraryClient {
    http: reqwest::blocking::Client,
    config: MediaLibraryConfig,
}

impl MediaLibraryClient {
    /// Create a client from a validated configuration
    pub fn new(config: MediaLibraryConfig) -> Result<Self> {
        config.validate()?;

        let http = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .user_agent("MedPlant/1.0")
            .build()
            .map_err(|e| MedPlantError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { http, config })
    }

    fn listing_url(&self) -> String {
        format!(
            "{}/v1_1/{}/resources/image/upload",
            self.config.base_url.trim_end_matches('/'),
            self.config.cloud_name
        )
    }

    /// Check connectivity and credentials before any paging starts
    pub fn ping(&self) -> Result<()> {
        let url = format!(
            "{}/v1_1/{}/ping",
            self.config.base_url.trim_end_matches('/'),
            self.config.cloud_name
        );

        let response = self
            .http
            .get(&url)
            .basic_auth(&self.config.api_key, Some(&self.config.api_secret))
            .send()
            .map_err(|e| MedPlantError::Config(format!("provider unreachable: {}", e)))?;

        if !response.status().is_success() {
            return Err(MedPlantError::Config(format!(
                "provider ping failed with status {}",
                response.status()
            )));
        }
        Ok(())
    }
}

impl CatalogSource for MediaLibraryClient {
    fn verify(&self) -> Result<()> {
        self.ping()
    }

    fn list_page(&self, cursor: Option<&str>) -> Result<CatalogPage> {
        let url = self.listing_url();
        let max_results = self.config.page_size.to_string();

        let mut query: Vec<(&str, &str)> = vec![("max_results", &max_results)];
        if let Some(prefix) = &self.config.folder_prefix {
            query.push(("prefix", prefix));
        }
        if let Some(cursor) = cursor {
            query.push(("next_cursor", cursor));
        }

        debug!("Listing catalog page (cursor: {:?})", cursor);

        let response = self
            .http
            .get(&url)
            .basic_auth(&self.config.api_key, Some(&self.config.api_secret))
            .query(&query)
            .send()
            .map_err(|e| MedPlantError::Catalog(format!("request to {} failed: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(MedPlantError::Catalog(format!(
                "listing returned status {}",
                status
            )));
        }

        let page: CatalogPage = response
            .json()
            .map_err(|e| MedPlantError::Catalog(format!("invalid listing response: {}", e)))?;

        debug!(
            "Fetched {} resources (more: {})",
            page.resources.len(),
            page.next_cursor.is_some()
        );

        Ok(page)
    }
}
