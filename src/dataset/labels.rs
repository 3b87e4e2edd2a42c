//! Label Space
//!
//! The bijection between scientific names and dense class indices used by
//! the classifier. Built once from the sorted set of distinct scientific
//! names so that identical input data always yields identical indices,
//! regardless of record order.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::manifest::PlantRecord;
use crate::utils::error::{MedPlantError, Result};

/// Mapping between scientific names and dense integer labels `[0, N)`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabelSpace {
    /// Canonical names in index order (sorted)
    names: Vec<String>,
    /// Reverse lookup from canonical name to index
    index: HashMap<String, usize>,
}

impl LabelSpace {
    /// Build from manifest records
    pub fn from_records(records: &[PlantRecord]) -> Result<Self> {
        Self::from_names(records.iter().map(|r| r.scientific_name.as_str()))
    }

    /// Build from an iterator of scientific names. Names are trimmed and
    /// lower-cased; duplicates collapse; the sorted order fixes the index
    /// assignment.
    pub fn from_names<'a, I>(names: I) -> Result<Self>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut canonical: Vec<String> = names
            .into_iter()
            .map(|n| n.trim().to_lowercase())
            .filter(|n| !n.is_empty())
            .collect();
        canonical.sort();
        canonical.dedup();

        if canonical.is_empty() {
            return Err(MedPlantError::Manifest(
                "cannot build a label space from zero scientific names".into(),
            ));
        }

        let index = canonical
            .iter()
            .enumerate()
            .map(|(idx, name)| (name.clone(), idx))
            .collect();

        Ok(Self {
            names: canonical,
            index,
        })
    }

    /// Index of a scientific name, if present
    pub fn index_of(&self, scientific_name: &str) -> Option<usize> {
        self.index
            .get(&scientific_name.trim().to_lowercase())
            .copied()
    }

    /// Name at a given index
    pub fn name_of(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(String::as_str)
    }

    /// Number of classes
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether the label space is empty (never true for a built space)
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// All names in index order
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Owned name-to-index mapping, e.g. for checkpoint comparison
    pub fn to_mapping(&self) -> HashMap<String, usize> {
        self.index.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indices_are_dense_and_sorted() {
        let space =
            LabelSpace::from_names(["Mentha piperita", "Aloe vera", "Urtica dioica"]).unwrap();
        assert_eq!(space.len(), 3);
        assert_eq!(space.index_of("Aloe vera"), Some(0));
        assert_eq!(space.index_of("Mentha piperita"), Some(1));
        assert_eq!(space.index_of("Urtica dioica"), Some(2));
    }

    #[test]
    fn test_determinism_under_permutation() {
        let a = LabelSpace::from_names(["Zingiber officinale", "Aloe vera", "Curcuma longa"])
            .unwrap();
        let b = LabelSpace::from_names(["Curcuma longa", "Zingiber officinale", "Aloe vera"])
            .unwrap();
        assert_eq!(a.names(), b.names());
        for name in a.names() {
            assert_eq!(a.index_of(name), b.index_of(name));
        }
    }

    #[test]
    fn test_casefold_and_trim() {
        let space = LabelSpace::from_names(["  ALOE VERA ", "aloe vera"]).unwrap();
        assert_eq!(space.len(), 1);
        assert_eq!(space.index_of("Aloe Vera"), Some(0));
    }

    #[test]
    fn test_unknown_name() {
        let space = LabelSpace::from_names(["Aloe vera"]).unwrap();
        assert_eq!(space.index_of("Panax ginseng"), None);
        assert_eq!(space.name_of(5), None);
    }

    #[test]
    fn test_empty_input_is_an_error() {
        let no_names: Vec<&str> = Vec::new();
        assert!(LabelSpace::from_names(no_names).is_err());
        assert!(LabelSpace::from_names(["  "]).is_err());
    }
}
