//! Checkpoint Metadata
//!
//! Sidecar metadata of a training checkpoint: epoch counter, best
//! validation accuracy, and the label-to-index mapping in effect when the
//! weights were saved. This pipeline consumes the metadata on resume; the
//! current label space must match the recorded mapping exactly, otherwise
//! resolution would silently misassign classes.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::dataset::labels::LabelSpace;
use crate::utils::error::{MedPlantError, Result};

/// Metadata bundle stored alongside model weights
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckpointMeta {
    /// Last completed epoch (0-indexed)
    pub epoch: usize,

    /// Best validation accuracy seen so far
    pub best_val_accuracy: f64,

    /// Label mapping used at training time
    pub label_to_index: HashMap<String, usize>,

    /// When the checkpoint was written
    pub created_at: DateTime<Utc>,
}

impl CheckpointMeta {
    /// Snapshot the current label space into checkpoint metadata
    pub fn new(epoch: usize, best_val_accuracy: f64, labels: &LabelSpace) -> Self {
        Self {
            epoch,
            best_val_accuracy,
            label_to_index: labels.to_mapping(),
            created_at: Utc::now(),
        }
    }

    /// Load metadata from a JSON sidecar file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read_to_string(path)?;
        let meta: CheckpointMeta = serde_json::from_str(&data)?;
        info!(
            "Loaded checkpoint metadata from {:?} (epoch {}, best acc {:.2}%)",
            path,
            meta.epoch,
            meta.best_val_accuracy * 100.0
        );
        Ok(meta)
    }

    /// Write metadata to a JSON sidecar file (temp-then-rename)
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self)?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, path)?;
        Ok(())
    }

    /// Number of classes recorded in the checkpoint
    pub fn num_classes(&self) -> usize {
        self.label_to_index.len()
    }

    /// Verify that the current label space matches the recorded mapping
    /// exactly: same class count, same names, same indices.
    pub fn verify_label_space(&self, labels: &LabelSpace) -> Result<()> {
        if self.label_to_index.len() != labels.len() {
            return Err(MedPlantError::ClassMappingMismatch(format!(
                "checkpoint has {} classes, current data has {}",
                self.label_to_index.len(),
                labels.len()
            )));
        }

        for (name, &recorded) in &self.label_to_index {
            match labels.index_of(name) {
                None => {
                    return Err(MedPlantError::ClassMappingMismatch(format!(
                        "class '{}' from checkpoint is missing from current data",
                        name
                    )));
                }
                Some(current) if current != recorded => {
                    return Err(MedPlantError::ClassMappingMismatch(format!(
                        "class '{}' maps to {} but checkpoint recorded {}",
                        name, current, recorded
                    )));
                }
                Some(_) => {}
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn label_space() -> LabelSpace {
        LabelSpace::from_names(["Aloe vera", "Mentha piperita", "Urtica dioica"]).unwrap()
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("checkpoint_meta.json");

        let meta = CheckpointMeta::new(7, 0.91, &label_space());
        meta.save(&path).unwrap();

        let loaded = CheckpointMeta::load(&path).unwrap();
        assert_eq!(loaded.epoch, 7);
        assert!((loaded.best_val_accuracy - 0.91).abs() < f64::EPSILON);
        assert_eq!(loaded.num_classes(), 3);
    }

    #[test]
    fn test_verify_accepts_identical_space() {
        let labels = label_space();
        let meta = CheckpointMeta::new(0, 0.0, &labels);
        assert!(meta.verify_label_space(&labels).is_ok());
    }

    #[test]
    fn test_verify_rejects_different_class_count() {
        let meta = CheckpointMeta::new(0, 0.0, &label_space());
        let smaller = LabelSpace::from_names(["Aloe vera", "Urtica dioica"]).unwrap();
        let err = meta.verify_label_space(&smaller).unwrap_err();
        assert!(matches!(err, MedPlantError::ClassMappingMismatch(_)));
    }

    #[test]
    fn test_verify_rejects_renamed_class() {
        let meta = CheckpointMeta::new(0, 0.0, &label_space());
        let renamed =
            LabelSpace::from_names(["Aloe vera", "Mentha piperita", "Panax ginseng"]).unwrap();
        let err = meta.verify_label_space(&renamed).unwrap_err();
        assert!(matches!(err, MedPlantError::ClassMappingMismatch(_)));
    }

    #[test]
    fn test_verify_rejects_shifted_indices() {
        let labels = label_space();
        let mut meta = CheckpointMeta::new(0, 0.0, &labels);
        // Simulate a checkpoint trained against a differently ordered mapping
        meta.label_to_index.insert("aloe vera".to_string(), 2);
        meta.label_to_index.insert("urtica dioica".to_string(), 0);

        let err = meta.verify_label_space(&labels).unwrap_err();
        assert!(matches!(err, MedPlantError::ClassMappingMismatch(_)));
    }
}
