//! Local Image Cache
//!
//! On-disk cache of fetched images, keyed by a stable external id and
//! stored JPEG-encoded. Writes go to a temporary file that is renamed into
//! place, so a partially written entry is never read back as valid; decode
//! failures on read are treated as a miss and the entry is discarded.

use std::fs;
use std::path::{Path, PathBuf};

use image::DynamicImage;
use sha2::{Digest, Sha256};
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::utils::error::Result;

/// Statistics about the cache directory
#[derive(Debug, Clone, Copy)]
pub struct CacheStats {
    pub entries: usize,
    pub total_bytes: u64,
}

/// Disk-backed image cache
#[derive(Debug, Clone)]
pub struct ImageCache {
    root: PathBuf,
}

impl ImageCache {
    /// Open (and create if needed) a cache directory
    pub fn new<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// Derive a stable cache key from a URL, for sources that do not carry
    /// their own external id
    pub fn key_for_url(url: &str) -> String {
        let digest = Sha256::digest(url.as_bytes());
        format!("{:x}", digest)[..16].to_string()
    }

    /// File path for a cache key
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(format!("{}.jpg", key))
    }

    /// Whether an entry exists for the key
    pub fn contains(&self, key: &str) -> bool {
        self.path_for(key).exists()
    }

    /// Store an image under the key. The JPEG is written to a temporary
    /// sibling first and renamed into place.
    pub fn store(&self, key: &str, img: &DynamicImage) -> Result<PathBuf> {
        let path = self.path_for(key);
        let tmp = self.root.join(format!(".{}.tmp", key));

        img.to_rgb8()
            .save_with_format(&tmp, image::ImageFormat::Jpeg)
            .map_err(|e| {
                crate::utils::error::MedPlantError::Io(std::io::Error::new(
                    std::io::ErrorKind::Other,
                    format!("failed to encode cache entry '{}': {}", key, e),
                ))
            })?;
        fs::rename(&tmp, &path)?;

        debug!("Cached image under {:?}", path);
        Ok(path)
    }

    /// Load an image for the key. A missing or undecodable entry is a
    /// miss; corrupt entries are removed.
    pub fn load(&self, key: &str) -> Option<DynamicImage> {
        let path = self.path_for(key);
        if !path.exists() {
            return None;
        }

        match image::open(&path) {
            Ok(img) => Some(img),
            Err(e) => {
                warn!("Discarding corrupt cache entry {:?}: {}", path, e);
                let _ = fs::remove_file(&path);
                None
            }
        }
    }

    /// Inventory of the cache directory
    pub fn stats(&self) -> CacheStats {
        let mut entries = 0usize;
        let mut total_bytes = 0u64;

        for entry in WalkDir::new(&self.root)
            .min_depth(1)
            .max_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) == Some("jpg") {
                entries += 1;
                total_bytes += entry.metadata().map(|m| m.len()).unwrap_or(0);
            }
        }

        CacheStats {
            entries,
            total_bytes,
        }
    }
}
