//! Asset Index Construction
//!
//! Builds the mapping from normalized name terms to asset URLs by paging
//! the media catalog once at dataset creation. The index is append-only
//! during construction and read-only afterwards.

use std::collections::{HashMap, HashSet};

use tracing::{debug, info, warn};

use super::catalog::{CatalogResource, CatalogSource};
use super::normalize::{name_variations, normalize};
use super::MIN_TERM_LEN;
use crate::utils::backoff::Backoff;
use crate::utils::error::{MedPlantError, Result};

/// Read access to an indexed term space.
///
/// The resolver is generic over this trait so tests can observe lookup
/// traffic without touching the real index.
pub trait TermIndex {
    /// URLs indexed under the exact term, in discovery order
    fn candidates(&self, term: &str) -> Option<&[String]>;

    /// Every indexed term, in discovery order (used by the substring
    /// containment fallback)
    fn terms(&self) -> &[String];
}

/// Summary statistics of a built index
#[derive(Debug, Clone)]
pub struct IndexStats {
    pub total_terms: usize,
    pub total_urls: usize,
    pub assets_indexed: usize,
    pub avg_urls_per_term: f64,
}

/// Mapping from normalized term to asset URLs, built once per dataset
#[derive(Debug, Default)]
pub struct AssetIndex {
    map: HashMap<String, Vec<String>>,
    /// Terms in discovery order; the map alone would iterate nondeterministically
    term_order: Vec<String>,
    assets_indexed: usize,
    urls_indexed: usize,
}

impl AssetIndex {
    /// Build the index by paging the catalog until no continuation cursor
    /// remains.
    ///
    /// A page fetch error is fatal: a partial index would silently pair
    /// records with "no image" instead of failing loudly. An individual
    /// asset that cannot be processed is logged and skipped. After paging,
    /// an index with no assets, no URLs, or no terms is rejected as
    /// indistinguishable from a misconfigured provider.
    ///
    /// `expected_terms` is only used for coverage logging; it does not
    /// restrict what gets indexed.
    pub fn build<S: CatalogSource>(
        source: &S,
        expected_terms: &HashSet<String>,
        pacing: &Backoff,
    ) -> Result<Self> {
        info!("Building asset index from media catalog...");
        source.verify()?;

        let mut index = AssetIndex::default();
        let mut cursor: Option<String> = None;
        let mut pages = 0usize;

        loop {
            let page = source.list_page(cursor.as_deref())?;
            pages += 1;

            if page.resources.is_empty() {
                warn!("Catalog page {} contained no resources", pages);
            }

            for resource in &page.resources {
                match index.add_resource(resource) {
                    Ok(added) => {
                        debug!("Indexed '{}' under {} new URLs", resource.public_id, added)
                    }
                    Err(e) => warn!("Skipping resource '{}': {}", resource.public_id, e),
                }
            }

            cursor = page.next_cursor;
            if cursor.is_none() {
                break;
            }

            info!(
                "Indexed {} URLs across {} pages, fetching next page...",
                index.urls_indexed, pages
            );
            // Steady inter-page pacing; the exponential curve of the same
            // policy applies to download retries.
            pacing.sleep(0);
        }

        index.validate()?;

        let matched = expected_terms
            .iter()
            .filter(|term| index.map.contains_key(term.as_str()))
            .count();
        let stats = index.stats();
        info!(
            "Asset index ready: {} terms, {} URLs, {} assets ({:.2} URLs/term); \
             {}/{} expected terms covered",
            stats.total_terms,
            stats.total_urls,
            stats.assets_indexed,
            stats.avg_urls_per_term,
            matched,
            expected_terms.len()
        );

        Ok(index)
    }

    /// Index one catalog resource under every derived name variation.
    /// Returns the number of term/URL pairs added.
    fn add_resource(&mut self, resource: &CatalogResource) -> anyhow::Result<usize> {
        let url = resource
            .secure_url
            .as_deref()
            .filter(|u| !u.is_empty())
            .ok_or_else(|| anyhow::anyhow!("resource has no secure_url"))?;

        let variations = name_variations(
            resource.filename(),
            resource.tags.iter().map(String::as_str),
            resource.context.values().map(String::as_str),
        );

        let mut added = 0;
        for variation in variations {
            // Variations arrive normalized; normalizing again keeps the
            // invariant local and is a no-op by idempotence.
            let term = normalize(&variation);
            if term.len() > MIN_TERM_LEN && self.insert(term, url) {
                added += 1;
            }
        }

        self.assets_indexed += 1;
        Ok(added)
    }

    /// Append `url` under `term` unless already present. Returns whether a
    /// new entry was created.
    fn insert(&mut self, term: String, url: &str) -> bool {
        use std::collections::hash_map::Entry;

        let urls = match self.map.entry(term) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                self.term_order.push(entry.key().clone());
                entry.insert(Vec::new())
            }
        };

        if urls.iter().any(|u| u == url) {
            return false;
        }
        urls.push(url.to_string());
        self.urls_indexed += 1;
        true
    }

    fn validate(&self) -> Result<()> {
        if self.assets_indexed == 0 {
            return Err(MedPlantError::EmptyIndex(
                "no assets were indexed from the catalog".into(),
            ));
        }
        if self.urls_indexed == 0 {
            return Err(MedPlantError::EmptyIndex("no asset URLs were indexed".into()));
        }
        if self.map.is_empty() {
            return Err(MedPlantError::EmptyIndex(
                "no searchable terms were generated".into(),
            ));
        }
        Ok(())
    }

    /// Number of distinct terms
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Whether the index holds no terms
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Summary statistics
    pub fn stats(&self) -> IndexStats {
        IndexStats {
            total_terms: self.map.len(),
            total_urls: self.urls_indexed,
            assets_indexed: self.assets_indexed,
            avg_urls_per_term: if self.map.is_empty() {
                0.0
            } else {
                self.urls_indexed as f64 / self.map.len() as f64
            },
        }
    }

    #[cfg(test)]
    pub(crate) fn fixture(entries: &[(&str, &str)]) -> Self {
        let mut index = AssetIndex::default();
        for (term, url) in entries {
            index.insert(normalize(term), url);
            index.assets_indexed += 1;
        }
        index
    }
}

impl TermIndex for AssetIndex {
    fn candidates(&self, term: &str) -> Option<&[String]> {
        self.map.get(term).map(Vec::as_slice).filter(|urls| !urls.is_empty())
    }

    fn terms(&self) -> &[String] {
        &self.term_order
    }
}
