//! Sample Materialization
//!
//! Turns a resolved URL into the final training sample: fetch bytes (or
//! hit the disk cache), decode, apply the augmentation variant, resize and
//! channel-normalize. Every failure here is a per-sample failure; the
//! dataset traversal skips past it.

use image::DynamicImage;
use tracing::{debug, warn};

use super::cache::ImageCache;
use super::download::Downloader;
use crate::config::DatasetConfig;
use crate::dataset::augmentation::{AugmentationVariant, Augmenter};
use crate::utils::error::{MedPlantError, Result};

/// A materialized training sample
#[derive(Debug, Clone)]
pub struct ResolvedSample {
    /// Channel-normalized CHW pixel data, `3 * size * size` values
    pub pixels: Vec<f32>,
    /// Dense class label from the label space
    pub label: usize,
}

/// Produces normalized samples from resolved URLs
pub struct Materializer {
    downloader: Downloader,
    augmenter: Augmenter,
    cache: Option<ImageCache>,
}

impl Materializer {
    /// Create a materializer from the dataset configuration
    pub fn new(config: &DatasetConfig) -> Result<Self> {
        config.validate()?;

        let cache = match &config.cache_dir {
            Some(dir) => {
                let cache = ImageCache::new(dir)?;
                let stats = cache.stats();
                debug!(
                    "Image cache at {:?}: {} entries, {} bytes",
                    dir, stats.entries, stats.total_bytes
                );
                Some(cache)
            }
            None => None,
        };

        Ok(Self {
            downloader: Downloader::new(config)?,
            augmenter: Augmenter::new(config.image_size as u32),
            cache,
        })
    }

    /// Materialize one sample.
    ///
    /// `cache_key` is the stable external id used for the disk cache;
    /// pass `None` to derive one from the URL.
    pub fn materialize(
        &self,
        url: &str,
        cache_key: Option<&str>,
        variant: AugmentationVariant,
        label: usize,
    ) -> Result<ResolvedSample> {
        let key = cache_key
            .map(str::to_owned)
            .unwrap_or_else(|| ImageCache::key_for_url(url));

        let img = match self.cached(&key) {
            Some(img) => img,
            None => self.fetch_and_decode(url, &key)?,
        };

        let pixels = self.augmenter.process(img, variant);
        Ok(ResolvedSample { pixels, label })
    }

    fn cached(&self, key: &str) -> Option<DynamicImage> {
        let img = self.cache.as_ref()?.load(key)?;
        debug!("Cache hit for '{}'", key);
        Some(img)
    }

    fn fetch_and_decode(&self, url: &str, key: &str) -> Result<DynamicImage> {
        let bytes = self.downloader.fetch_image_bytes(url)?;

        let img = image::load_from_memory(&bytes)
            .map_err(|e| MedPlantError::ImageDecode(url.to_string(), e.to_string()))?;

        if let Some(cache) = &self.cache {
            if let Err(e) = cache.store(key, &img) {
                warn!("Failed to cache '{}': {}", key, e);
            }
        }

        Ok(img)
    }
}
