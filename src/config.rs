//! Configuration Module
//!
//! Settings for the remote media library (credentials, folder prefix,
//! paging) and for dataset materialization (image size, augmentation,
//! retries, caching). Credential problems are surfaced before any network
//! work starts.

use std::env;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::utils::error::{MedPlantError, Result};

/// Default number of resources requested per catalog listing page
pub const DEFAULT_PAGE_SIZE: usize = 500;

/// Configuration for the remote media library (Cloudinary-style admin API)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaLibraryConfig {
    /// Account identifier, part of the API base path
    pub cloud_name: String,

    /// API key for basic authentication
    pub api_key: String,

    /// API secret for basic authentication
    pub api_secret: String,

    /// Folder prefix to list (e.g. "Dataset/"); `None` lists the whole library
    pub folder_prefix: Option<String>,

    /// Resources per listing page
    pub page_size: usize,

    /// API endpoint root, overridable for testing
    pub base_url: String,
}

impl MediaLibraryConfig {
    /// Build the configuration from `CLOUDINARY_*` environment variables.
    ///
    /// Missing credentials are a fatal configuration error: a misconfigured
    /// provider must be reported before index construction starts, not
    /// discovered as an empty index later.
    pub fn from_env() -> Result<Self> {
        let cloud_name = require_env("CLOUDINARY_CLOUD_NAME")?;
        let api_key = require_env("CLOUDINARY_API_KEY")?;
        let api_secret = require_env("CLOUDINARY_API_SECRET")?;
        let folder_prefix = env::var("CLOUDINARY_FOLDER")
            .ok()
            .filter(|s| !s.is_empty())
            .or_else(|| Some("Dataset/".to_string()));

        let config = Self {
            cloud_name,
            api_key,
            api_secret,
            folder_prefix,
            page_size: DEFAULT_PAGE_SIZE,
            base_url: "https://api.cloudinary.com".to_string(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Create a configuration with explicit credentials
    pub fn new(cloud_name: &str, api_key: &str, api_secret: &str) -> Self {
        Self {
            cloud_name: cloud_name.to_string(),
            api_key: api_key.to_string(),
            api_secret: api_secret.to_string(),
            folder_prefix: Some("Dataset/".to_string()),
            page_size: DEFAULT_PAGE_SIZE,
            base_url: "https://api.cloudinary.com".to_string(),
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.cloud_name.is_empty() {
            return Err(MedPlantError::Config("cloud_name must not be empty".into()));
        }
        if self.api_key.is_empty() || self.api_secret.is_empty() {
            return Err(MedPlantError::Config(
                "api_key and api_secret must not be empty".into(),
            ));
        }
        if self.page_size == 0 {
            return Err(MedPlantError::Config("page_size must be greater than 0".into()));
        }
        Ok(())
    }
}

fn require_env(name: &str) -> Result<String> {
    env::var(name)
        .ok()
        .filter(|v| !v.is_empty())
        .ok_or_else(|| {
            MedPlantError::Config(format!("{} environment variable is not set", name))
        })
}

/// Configuration for dataset materialization
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetConfig {
    /// Edge length of materialized square images
    pub image_size: usize,

    /// Whether to expand each record into augmentation variants
    pub augment: bool,

    /// Retry attempts for transient download failures
    pub max_retries: u32,

    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,

    /// Base backoff delay in milliseconds
    pub backoff_base_ms: u64,

    /// Backoff ceiling in milliseconds
    pub backoff_cap_ms: u64,

    /// Directory for the on-disk image cache; `None` disables caching
    pub cache_dir: Option<PathBuf>,

    /// User agent sent with every request
    pub user_agent: String,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            image_size: crate::IMAGE_SIZE,
            augment: true,
            max_retries: 3,
            request_timeout_secs: 10,
            backoff_base_ms: 500,
            backoff_cap_ms: 10_000,
            cache_dir: None,
            user_agent: "MedPlant/1.0".to_string(),
        }
    }
}

impl DatasetConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.image_size == 0 {
            return Err(MedPlantError::Config("image_size must be greater than 0".into()));
        }
        if self.max_retries == 0 {
            return Err(MedPlantError::Config("max_retries must be at least 1".into()));
        }
        if self.backoff_cap_ms < self.backoff_base_ms {
            return Err(MedPlantError::Config(
                "backoff_cap_ms must be at least backoff_base_ms".into(),
            ));
        }
        Ok(())
    }

    /// Backoff policy derived from this configuration
    pub fn backoff(&self) -> crate::utils::Backoff {
        crate::utils::Backoff::new(self.backoff_base_ms, self.backoff_cap_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dataset_config_default_is_valid() {
        let config = DatasetConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.image_size, crate::IMAGE_SIZE);
        assert!(config.augment);
    }

    #[test]
    fn test_dataset_config_rejects_zero_image_size() {
        let config = DatasetConfig {
            image_size: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_media_library_config_rejects_empty_credentials() {
        let config = MediaLibraryConfig::new("demo", "", "");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_media_library_config_new() {
        let config = MediaLibraryConfig::new("demo", "key", "secret");
        assert!(config.validate().is_ok());
        assert_eq!(config.folder_prefix.as_deref(), Some("Dataset/"));
        assert_eq!(config.page_size, DEFAULT_PAGE_SIZE);
    }
}
