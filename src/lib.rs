//! # MedPlant Dataset Pipeline
//!
//! A Rust library implementing the training-data pipeline of the MedPlant
//! plant-identification service: building a searchable index of remotely
//! hosted plant images, resolving manifest records to image URLs through a
//! chain of fuzzy name-matching strategies, and materializing normalized
//! training samples with deterministic augmentation.
//!
//! ## Pipeline
//!
//! 1. A JSON manifest of [`PlantRecord`]s is loaded and validated.
//! 2. An [`AssetIndex`] is built once by paging a remote media catalog and
//!    deriving searchable name variations per asset.
//! 3. For each requested sample, the [`resolve`] strategy chain pairs the
//!    record with a candidate URL.
//! 4. The [`Materializer`] downloads, validates, augments and normalizes the
//!    image into a `(pixels, label)` sample, with an optional atomic disk
//!    cache of the fetched bytes.
//!
//! The whole pipeline is synchronous and blocking; the index and label space
//! are built once and read-only afterwards, so they are safe to share across
//! concurrent callers.
//!
//! ## Modules
//!
//! - `dataset`: manifest loading, label space, augmentation, splits, and the
//!   skip-and-advance sample traversal
//! - `index`: name normalization and the remote asset index
//! - `resolve`: the ordered name-matching strategy chain
//! - `fetch`: HTTP download with retry, payload validation, disk caching and
//!   sample materialization
//! - `checkpoint`: training-checkpoint metadata consumed on resume
//! - `utils`: errors, logging, backoff helpers
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use medplant_dataset::{DatasetConfig, MediaLibraryClient, MediaLibraryConfig, PlantDataset};
//!
//! let catalog = MediaLibraryClient::new(MediaLibraryConfig::from_env()?)?;
//! let config = DatasetConfig::default();
//! let dataset = PlantDataset::from_manifest("medicinal_plant_dataset.json", &catalog, &config)?;
//! let sample = dataset.get(0)?;
//! ```

pub mod checkpoint;
pub mod config;
pub mod dataset;
pub mod fetch;
pub mod index;
pub mod resolve;
pub mod utils;

// Re-export commonly used items for convenience
pub use checkpoint::CheckpointMeta;
pub use config::{DatasetConfig, MediaLibraryConfig};
pub use dataset::augmentation::{AugmentationVariant, Augmenter};
pub use dataset::labels::LabelSpace;
pub use dataset::manifest::{load_manifest, ManifestStats, PlantRecord};
pub use dataset::observations::ObservationClient;
pub use dataset::plant_dataset::PlantDataset;
pub use dataset::split::{split_records, DatasetSplits, SplitConfig};
pub use fetch::cache::ImageCache;
pub use fetch::download::Downloader;
pub use fetch::materialize::{Materializer, ResolvedSample};
pub use index::asset_index::{AssetIndex, TermIndex};
pub use index::catalog::{CatalogPage, CatalogResource, CatalogSource, MediaLibraryClient};
pub use index::normalize::normalize;
pub use resolve::{resolve, MatchStrategy, Resolution};
pub use utils::error::{MedPlantError, Result};

/// Default edge length of materialized sample images (EfficientNet-B4 input)
pub const IMAGE_SIZE: usize = 380;

/// Per-channel mean used for sample normalization (ImageNet statistics)
pub const CHANNEL_MEAN: [f32; 3] = [0.485, 0.456, 0.406];

/// Per-channel standard deviation used for sample normalization
pub const CHANNEL_STD: [f32; 3] = [0.229, 0.224, 0.225];

/// Version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
