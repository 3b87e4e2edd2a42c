//! Remote asset index
//!
//! This module builds the searchable index of remotely hosted plant images:
//! - `normalize`: canonical name form shared by indexing and resolution
//! - `catalog`: paginated listing client for the media library
//! - `asset_index`: normalized term -> asset URL mapping with post-build
//!   validation
//!
//! The index is constructed once per dataset instantiation and is read-only
//! afterwards. Matching is only reliable because both the indexing side and
//! the resolution side normalize names through the same function.

pub mod asset_index;
pub mod catalog;
pub mod normalize;

pub use asset_index::{AssetIndex, IndexStats, TermIndex};
pub use catalog::{CatalogPage, CatalogResource, CatalogSource, MediaLibraryClient};
pub use normalize::{name_variations, normalize, strip_image_extension};

/// Minimum length a normalized variation must exceed to be indexed.
/// Shorter terms are too ambiguous to act as lookup keys.
pub const MIN_TERM_LEN: usize = 2;
