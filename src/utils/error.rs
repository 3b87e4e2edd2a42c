//! Error Handling Module
//!
//! Defines the error type shared across the dataset pipeline.
//! Uses thiserror for ergonomic error definitions.

use thiserror::Error;

/// Main error type for MedPlant dataset operations
#[derive(Error, Debug)]
pub enum MedPlantError {
    /// Missing credentials, invalid settings — fatal before any work starts
    #[error("Configuration error: {0}")]
    Config(String),

    /// Manifest loading or validation failure
    #[error("Manifest error: {0}")]
    Manifest(String),

    /// A catalog listing page could not be fetched — fatal, a partial index
    /// would produce silent false negatives during resolution
    #[error("Catalog listing failed: {0}")]
    Catalog(String),

    /// Index construction finished with no usable data
    #[error("Asset index is empty: {0}")]
    EmptyIndex(String),

    /// No matching asset was found for a record
    #[error("No image match for record '{0}'")]
    ResolutionMiss(String),

    /// An image download failed after exhausting retries
    #[error("Failed to download '{0}': {1}")]
    Download(String, String),

    /// The response body is not a recognizable image payload
    #[error("Invalid image payload from '{0}': {1}")]
    InvalidPayload(String, String),

    /// The payload passed validation but could not be decoded
    #[error("Failed to decode image from '{0}': {1}")]
    ImageDecode(String, String),

    /// A record's scientific name is not part of the label space
    #[error("Unknown label: {0}")]
    UnknownLabel(String),

    /// A full pass over the records produced no valid sample
    #[error("No valid sample found after {0} attempts")]
    Exhausted(usize),

    /// The checkpoint's label mapping does not match the current label space
    #[error("Checkpoint label mapping mismatch: {0}")]
    ClassMappingMismatch(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Bridge for errors carried through anyhow-based loaders
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl MedPlantError {
    /// Whether the error is a per-sample failure the dataset traversal may
    /// skip past, as opposed to a fatal pipeline failure.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            MedPlantError::ResolutionMiss(_)
                | MedPlantError::Download(_, _)
                | MedPlantError::InvalidPayload(_, _)
                | MedPlantError::ImageDecode(_, _)
                | MedPlantError::UnknownLabel(_)
        )
    }
}

/// Convenience Result type for MedPlant dataset operations
pub type Result<T> = std::result::Result<T, MedPlantError>;
