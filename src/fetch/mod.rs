//! Sample fetching and materialization
//!
//! - `download`: blocking HTTP byte fetch with retry/backoff and payload
//!   validation (content type + magic bytes) before any decode attempt
//! - `cache`: atomic on-disk cache of fetched images, keyed by a stable
//!   external id
//! - `materialize`: decode, augment, resize and normalize into the final
//!   `(pixels, label)` sample

pub mod cache;
pub mod download;
pub mod materialize;

pub use cache::{CacheStats, ImageCache};
pub use download::Downloader;
pub use materialize::{Materializer, ResolvedSample};
