//! Plant Manifest Loading
//!
//! This module handles loading the plant manifest from disk: a JSON array
//! of records pairing a scientific name with either a declared image name
//! (resolved against the asset index) or a direct image URL.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// A single plant record from the manifest
///
/// Records are immutable once loaded; a record's identity is its position
/// in the manifest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlantRecord {
    /// Scientific (binomial) name; required and non-empty
    pub scientific_name: String,

    /// Common name, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub common_name: Option<String>,

    /// Declared image name, resolved against the asset index
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_name: Option<String>,

    /// Direct image URL, fetched without resolution
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,

    /// Source observation id, when the record came from the observation API
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observation_id: Option<u64>,

    /// Photo license code, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license: Option<String>,
}

impl PlantRecord {
    /// Create a record in declared-image-name mode
    pub fn named(scientific_name: &str, image_name: &str) -> Self {
        Self {
            scientific_name: scientific_name.to_string(),
            common_name: None,
            image_name: Some(image_name.to_string()),
            image_url: None,
            observation_id: None,
            license: None,
        }
    }

    /// Whether the record carries any image reference at all
    pub fn has_image_reference(&self) -> bool {
        self.image_name.as_deref().is_some_and(|n| !n.is_empty())
            || self.image_url.as_deref().is_some_and(|u| !u.is_empty())
    }

    /// Scientific name in canonical comparison form
    pub fn canonical_species(&self) -> String {
        self.scientific_name.trim().to_lowercase()
    }
}

/// Load a manifest from a JSON file
pub fn load_manifest<P: AsRef<Path>>(path: P) -> Result<Vec<PlantRecord>> {
    let path = path.as_ref();
    info!("Loading plant manifest from: {:?}", path);

    let data = fs::read_to_string(path)
        .with_context(|| format!("Failed to read manifest: {:?}", path))?;

    let records: Vec<PlantRecord> = serde_json::from_str(&data)
        .with_context(|| format!("Failed to parse manifest: {:?}", path))?;

    info!("Loaded {} plant records", records.len());
    Ok(records)
}

/// Validate manifest records before any network work starts.
///
/// A missing or empty scientific name is fatal: the label space cannot be
/// built without it. A missing image reference is only warned about; the
/// traversal will skip such records.
pub fn validate_records(records: &[PlantRecord]) -> Result<()> {
    if records.is_empty() {
        anyhow::bail!("No plant records in manifest");
    }

    let invalid: Vec<usize> = records
        .iter()
        .enumerate()
        .filter(|(_, r)| r.scientific_name.trim().is_empty())
        .map(|(idx, _)| idx)
        .collect();

    if !invalid.is_empty() {
        anyhow::bail!(
            "Missing scientific names found in manifest at indices: {:?}. \
             Please ensure all plants have valid scientific names.",
            invalid
        );
    }

    for (idx, record) in records.iter().enumerate() {
        if !record.has_image_reference() {
            warn!(
                "Missing image reference for '{}' at index {}",
                record.scientific_name, idx
            );
        }
    }

    Ok(())
}

/// Save records to a JSON manifest, writing to a temp file and renaming so
/// a partially written manifest is never read back.
pub fn save_manifest<P: AsRef<Path>>(path: P, records: &[PlantRecord]) -> Result<()> {
    let path = path.as_ref();
    let json = serde_json::to_string_pretty(records).context("Failed to serialize manifest")?;

    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json).with_context(|| format!("Failed to write manifest: {:?}", tmp))?;
    fs::rename(&tmp, path)
        .with_context(|| format!("Failed to move manifest into place: {:?}", path))?;

    info!("Saved {} records to {:?}", records.len(), path);
    Ok(())
}

/// Merge new records into an existing manifest, keeping one record per
/// species: duplicates by observation id or by canonical scientific name
/// are dropped.
pub fn merge_records(existing: Vec<PlantRecord>, new: Vec<PlantRecord>) -> Vec<PlantRecord> {
    let mut seen_ids: std::collections::HashSet<u64> = existing
        .iter()
        .filter_map(|r| r.observation_id)
        .collect();
    let mut seen_species: std::collections::HashSet<String> =
        existing.iter().map(|r| r.canonical_species()).collect();

    let mut merged = existing;
    let mut appended = 0usize;

    for record in new {
        if record
            .observation_id
            .is_some_and(|id| !seen_ids.insert(id))
        {
            continue;
        }
        if !seen_species.insert(record.canonical_species()) {
            continue;
        }
        merged.push(record);
        appended += 1;
    }

    info!("Appended {} new records (total: {})", appended, merged.len());
    merged
}

/// Statistics about the loaded manifest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestStats {
    pub total_records: usize,
    pub distinct_species: usize,
    pub missing_image_reference: usize,
    pub records_per_species: HashMap<String, usize>,
}

/// Compute statistics for a set of records
pub fn stats(records: &[PlantRecord]) -> ManifestStats {
    let mut records_per_species: HashMap<String, usize> = HashMap::new();
    for record in records {
        *records_per_species
            .entry(record.canonical_species())
            .or_insert(0) += 1;
    }

    ManifestStats {
        total_records: records.len(),
        distinct_species: records_per_species.len(),
        missing_image_reference: records
            .iter()
            .filter(|r| !r.has_image_reference())
            .count(),
        records_per_species,
    }
}

impl ManifestStats {
    /// Print statistics to console
    pub fn print(&self) {
        println!("\nManifest statistics:");
        println!("  Total records: {}", self.total_records);
        println!("  Distinct species: {}", self.distinct_species);
        println!(
            "  Records without image reference: {}",
            self.missing_image_reference
        );

        let mut sorted: Vec<_> = self.records_per_species.iter().collect();
        sorted.sort_by(|a, b| a.0.cmp(b.0));
        for (species, count) in sorted {
            println!("    {:40} {:5}", species, count);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str) -> PlantRecord {
        PlantRecord::named(name, "img.jpg")
    }

    #[test]
    fn test_parse_manifest_json() {
        let json = r#"[
            {"scientific_name": "Aloe vera", "image_name": "aloe-vera-plant.jpg"},
            {"scientific_name": "Mentha piperita", "image_url": "https://img.example.com/1.jpg", "common_name": "Peppermint"}
        ]"#;

        let records: Vec<PlantRecord> = serde_json::from_str(json).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].scientific_name, "Aloe vera");
        assert!(records[0].image_url.is_none());
        assert_eq!(records[1].common_name.as_deref(), Some("Peppermint"));
    }

    #[test]
    fn test_validate_rejects_empty_scientific_name() {
        let records = vec![record("Aloe vera"), record("  ")];
        let err = validate_records(&records).unwrap_err();
        assert!(err.to_string().contains("[1]"));
    }

    #[test]
    fn test_validate_rejects_empty_manifest() {
        assert!(validate_records(&[]).is_err());
    }

    #[test]
    fn test_validate_accepts_missing_image_reference() {
        let mut r = record("Aloe vera");
        r.image_name = None;
        // Warned about, not fatal
        assert!(validate_records(&[r]).is_ok());
    }

    #[test]
    fn test_save_and_reload_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("manifest.json");

        let records = vec![record("Aloe vera"), record("Urtica dioica")];
        save_manifest(&path, &records).unwrap();

        let reloaded = load_manifest(&path).unwrap();
        assert_eq!(reloaded.len(), 2);
        assert_eq!(reloaded[1].scientific_name, "Urtica dioica");
        // No temp file left behind
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn test_merge_deduplicates_by_species_and_id() {
        let mut existing = vec![record("Aloe vera")];
        existing[0].observation_id = Some(1);

        let mut dup_species = record("ALOE VERA ");
        dup_species.observation_id = Some(2);
        let mut dup_id = record("Salvia officinalis");
        dup_id.observation_id = Some(1);
        let fresh = record("Urtica dioica");

        let merged = merge_records(existing, vec![dup_species, dup_id, fresh]);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[1].scientific_name, "Urtica dioica");
    }

    #[test]
    fn test_stats() {
        let mut no_image = record("Aloe vera");
        no_image.image_name = None;
        let records = vec![record("Aloe vera"), no_image, record("Urtica dioica")];

        let stats = stats(&records);
        assert_eq!(stats.total_records, 3);
        assert_eq!(stats.distinct_species, 2);
        assert_eq!(stats.missing_image_reference, 1);
        assert_eq!(stats.records_per_species["aloe vera"], 2);
    }
}
