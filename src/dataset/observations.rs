//! Observation API Fetcher
//!
//! Alternate manifest source: research-grade observations fetched per
//! species from an iNaturalist-style API. Produces `PlantRecord`s in direct
//! image-URL mode, deduplicated against an existing manifest.

use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::{error, info, warn};

use super::manifest::PlantRecord;
use crate::utils::logging::ProgressLogger;

/// Default observation API endpoint
pub const DEFAULT_OBSERVATIONS_URL: &str = "https://api.inaturalist.org/v1/observations";

#[derive(Debug, Deserialize)]
struct ObservationPage {
    #[serde(default)]
    results: Vec<Observation>,
}

#[derive(Debug, Deserialize)]
struct Observation {
    id: u64,
    taxon: Option<Taxon>,
    #[serde(default)]
    photos: Vec<Photo>,
}

#[derive(Debug, Deserialize)]
struct Taxon {
    name: Option<String>,
    preferred_common_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Photo {
    url: Option<String>,
    license_code: Option<String>,
}

/// Blocking client for the observation API
pub struct ObservationClient {
    http: reqwest::blocking::Client,
    base_url: String,
    /// Observations requested per species
    per_page: usize,
    /// Pause between species requests to stay under the API rate limit
    pacing: Duration,
}

impl ObservationClient {
    /// Create a client against the default endpoint
    pub fn new() -> Result<Self> {
        Self::with_base_url(DEFAULT_OBSERVATIONS_URL)
    }

    /// Create a client against a custom endpoint (used in tests)
    pub fn with_base_url(base_url: &str) -> Result<Self> {
        let http = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(10))
            .user_agent("MedPlant/1.0")
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            http,
            base_url: base_url.to_string(),
            per_page: 30,
            pacing: Duration::from_millis(100),
        })
    }

    /// Fetch observation records for one species.
    ///
    /// Observations without photos are skipped. The photo URL is upgraded
    /// from the thumbnail variant to the large variant.
    pub fn fetch_species(&self, species: &str) -> Result<Vec<PlantRecord>> {
        let per_page = self.per_page.to_string();
        let query = [
            ("taxon_name", species),
            ("taxon_rank", "species"),
            ("photos", "true"),
            ("per_page", per_page.as_str()),
            ("quality_grade", "research"),
            ("order_by", "updated_at"),
            ("order", "desc"),
        ];

        let page: ObservationPage = self
            .http
            .get(&self.base_url)
            .query(&query)
            .send()
            .with_context(|| format!("Observation request for '{}' failed", species))?
            .error_for_status()
            .with_context(|| format!("Observation request for '{}' rejected", species))?
            .json()
            .with_context(|| format!("Invalid observation response for '{}'", species))?;

        info!("Fetched {} observations for {}", page.results.len(), species);
        if page.results.is_empty() {
            warn!("No observations found for {}", species);
        }

        let records = page
            .results
            .into_iter()
            .filter_map(|obs| {
                let photo = obs.photos.first()?;
                let url = photo.url.as_deref().filter(|u| !u.is_empty())?;
                let taxon = obs.taxon.as_ref();

                Some(PlantRecord {
                    scientific_name: taxon
                        .and_then(|t| t.name.clone())
                        .unwrap_or_else(|| species.to_string()),
                    common_name: taxon.and_then(|t| t.preferred_common_name.clone()),
                    image_name: None,
                    image_url: Some(url.replace("square", "large")),
                    observation_id: Some(obs.id),
                    license: Some(
                        photo
                            .license_code
                            .clone()
                            .unwrap_or_else(|| "CC0".to_string()),
                    ),
                })
            })
            .collect();

        Ok(records)
    }

    /// Fetch records for every species not already present in `existing`.
    ///
    /// A per-species failure is logged and skipped; requests are paced to
    /// respect the provider's rate limit.
    pub fn fetch_all(&self, species: &[String], existing: &[PlantRecord]) -> Vec<PlantRecord> {
        let known: std::collections::HashSet<String> = existing
            .iter()
            .map(|r| r.canonical_species())
            .collect();

        let to_fetch: Vec<&String> = species
            .iter()
            .filter(|s| !known.contains(&s.trim().to_lowercase()))
            .collect();

        if to_fetch.is_empty() {
            info!("All requested species already present in manifest");
            return Vec::new();
        }

        info!("Fetching {} new species", to_fetch.len());
        let mut progress = ProgressLogger::new("Observation fetch", to_fetch.len());
        let mut records = Vec::new();

        for species in to_fetch {
            match self.fetch_species(species) {
                Ok(batch) => records.extend(batch),
                Err(e) => error!("Error fetching data for {}: {:#}", species, e),
            }
            progress.increment();
            std::thread::sleep(self.pacing);
        }
        progress.finish();

        records
    }
}
