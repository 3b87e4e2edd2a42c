//! Dataset module for MedPlant training data
//!
//! This module provides functionality for:
//! - Loading and validating the JSON plant manifest
//! - The deterministic label space over scientific names
//! - Deterministic image augmentation variants
//! - Seeded train/validation splits
//! - Fetching observation records from the remote observation API
//! - The `PlantDataset` sample traversal with bounded skip-and-advance
//!
//! Records are immutable once loaded; the label space and asset index are
//! built once at dataset creation and never mutated afterwards.

pub mod augmentation;
pub mod labels;
pub mod manifest;
pub mod observations;
pub mod plant_dataset;
pub mod split;

// Re-export main types for convenience
pub use augmentation::{AugmentationVariant, Augmenter};
pub use labels::LabelSpace;
pub use manifest::{load_manifest, merge_records, save_manifest, ManifestStats, PlantRecord};
pub use observations::ObservationClient;
pub use plant_dataset::PlantDataset;
pub use split::{split_records, DatasetSplits, SplitConfig};
