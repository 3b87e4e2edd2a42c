//! Train/validation split of manifest records
//!
//! Deterministic, seed-driven partitioning of the plant records before
//! dataset construction. With stratification enabled the split keeps every
//! species represented in the training set.

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::manifest::PlantRecord;
use crate::utils::error::{MedPlantError, Result};

/// Configuration for record splitting
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SplitConfig {
    /// Fraction of records assigned to the training set
    pub train_fraction: f64,
    /// Random seed for reproducibility
    pub seed: u64,
    /// Split within each species instead of globally
    pub stratified: bool,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            train_fraction: 0.8,
            seed: 42,
            stratified: false,
        }
    }
}

impl SplitConfig {
    /// Create a validated configuration
    pub fn new(train_fraction: f64, seed: u64) -> Result<Self> {
        if !(0.0..=1.0).contains(&train_fraction) {
            return Err(MedPlantError::Config(
                "train_fraction must be between 0.0 and 1.0".to_string(),
            ));
        }
        Ok(Self {
            train_fraction,
            seed,
            stratified: false,
        })
    }
}

/// The two record pools produced by a split
#[derive(Debug, Clone)]
pub struct DatasetSplits {
    pub train: Vec<PlantRecord>,
    pub validation: Vec<PlantRecord>,
}

/// Split records into train and validation pools.
///
/// The same records, fraction and seed always produce the same pools.
pub fn split_records(records: &[PlantRecord], config: &SplitConfig) -> Result<DatasetSplits> {
    if !(0.0..=1.0).contains(&config.train_fraction) {
        return Err(MedPlantError::Config(
            "train_fraction must be between 0.0 and 1.0".to_string(),
        ));
    }

    let mut rng = ChaCha8Rng::seed_from_u64(config.seed);

    if !config.stratified {
        return Ok(partition(records.to_vec(), config.train_fraction, &mut rng));
    }

    // Group record indices per species, split each group independently
    let mut by_species: HashMap<String, Vec<PlantRecord>> = HashMap::new();
    for record in records {
        by_species
            .entry(record.canonical_species())
            .or_default()
            .push(record.clone());
    }

    let mut species: Vec<String> = by_species.keys().cloned().collect();
    species.sort();

    let mut train = Vec::new();
    let mut validation = Vec::new();
    for name in species {
        let group = by_species.remove(&name).unwrap_or_default();
        let splits = partition(group, config.train_fraction, &mut rng);
        train.extend(splits.train);
        validation.extend(splits.validation);
    }

    Ok(DatasetSplits { train, validation })
}

fn partition(
    mut records: Vec<PlantRecord>,
    train_fraction: f64,
    rng: &mut ChaCha8Rng,
) -> DatasetSplits {
    records.shuffle(rng);

    // A single-record group always lands in train so no species disappears
    // from the training pool.
    let train_len = ((records.len() as f64 * train_fraction).round() as usize)
        .clamp(usize::from(!records.is_empty()), records.len());

    let validation = records.split_off(train_len);
    DatasetSplits {
        train: records,
        validation,
    }
}
