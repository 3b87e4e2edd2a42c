//! Label Resolver
//!
//! Pairs a plant record with a candidate asset URL by trying an ordered
//! chain of matching strategies against the asset index. The first strategy
//! that produces a hit wins; later strategies are never consulted.
//!
//! Strategy order:
//! 1. exact match on the normalized declared image name
//! 2. exact match on the normalized scientific name, then its genus
//! 3. the parenthesized common name, then its words and their synonyms
//! 4. individual words of the declared name, then synonyms, then substring
//!    containment for longer words
//!
//! The substring fallback can match unrelated terms that merely share a
//! fragment. The behavior is kept as-is: tightening it would change which
//! samples the training pipeline has historically seen.

use tracing::{debug, info};

use crate::dataset::manifest::PlantRecord;
use crate::index::asset_index::TermIndex;
use crate::index::normalize::{normalize, strip_image_extension};

/// Words never used as standalone lookup terms
const STOPWORDS: [&str; 4] = ["and", "the", "of", "or"];

/// Minimum word length considered by the word-match strategy
const MIN_WORD_LEN: usize = 3;

/// Words longer than this fall back to substring containment
const SUBSTRING_WORD_LEN: usize = 4;

/// Known common-name tokens that expand to scientific synonyms
fn synonyms(word: &str) -> &'static [&'static str] {
    match word {
        "neem" => &["azadirachta", "indica"],
        "lemon" => &["citrus", "limon"],
        "bitter" => &["garcinia", "kola"],
        "kola" => &["garcinia", "bitter"],
        _ => &[],
    }
}

/// Which strategy produced a resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchStrategy {
    /// Exact match on the full declared image name
    DeclaredName,
    /// Exact match on the scientific name
    ScientificName,
    /// Match on the first word of the scientific name
    Genus,
    /// Exact match on the parenthesized common name
    CommonName,
    /// Match on one word of the common name
    CommonWord,
    /// Match through the synonym expansion table
    Synonym,
    /// Exact match on one word of the declared name
    DeclaredWord,
    /// Substring containment between a word and an indexed term
    Substring,
}

impl MatchStrategy {
    /// Human-readable label for logging
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchStrategy::DeclaredName => "exact match",
            MatchStrategy::ScientificName => "scientific name",
            MatchStrategy::Genus => "scientific genus",
            MatchStrategy::CommonName => "common name",
            MatchStrategy::CommonWord => "common word",
            MatchStrategy::Synonym => "name variation",
            MatchStrategy::DeclaredWord => "individual word",
            MatchStrategy::Substring => "partial word match",
        }
    }
}

/// A successful resolution
#[derive(Debug, Clone)]
pub struct Resolution {
    /// First candidate URL indexed under the matched term
    pub url: String,
    /// Strategy that produced the match
    pub strategy: MatchStrategy,
    /// The indexed term that matched
    pub matched_term: String,
}

fn hit<I: TermIndex>(index: &I, term: &str, strategy: MatchStrategy) -> Option<Resolution> {
    index.candidates(term).map(|urls| Resolution {
        url: urls[0].clone(),
        strategy,
        matched_term: term.to_string(),
    })
}

/// Extract the parenthesized common name from a raw declared name, e.g.
/// `"Azadirachta indica (Neem)"` yields `"Neem"`.
fn parenthesized_common_name(declared: &str) -> Option<&str> {
    let open = declared.find('(')?;
    let rest = &declared[open + 1..];
    let close = rest.find(')')?;
    let inner = rest[..close].trim();
    (!inner.is_empty()).then_some(inner)
}

/// Resolve a record to a candidate asset URL.
///
/// Returns `None` when every strategy misses; the caller is expected to
/// skip the record. Records without a declared image name cannot be
/// resolved against the index.
pub fn resolve<I: TermIndex>(record: &PlantRecord, index: &I) -> Option<Resolution> {
    let declared = record.image_name.as_deref().filter(|n| !n.is_empty())?;
    let clean_name = normalize(strip_image_extension(declared));

    debug!(
        "Resolving '{}' (scientific: '{}') as '{}'",
        declared, record.scientific_name, clean_name
    );

    // Strategy 1: exact match on the full declared name
    let exact_declared = || hit(index, &clean_name, MatchStrategy::DeclaredName);

    // Strategy 2: scientific name, falling back to the genus
    let scientific = || {
        let clean_scientific = normalize(&record.scientific_name);
        if clean_scientific.is_empty() {
            return None;
        }
        hit(index, &clean_scientific, MatchStrategy::ScientificName).or_else(|| {
            let genus = clean_scientific.split_whitespace().next()?;
            hit(index, genus, MatchStrategy::Genus)
        })
    };

    // Strategy 3: parenthesized common name, then its words and synonyms
    let common = || {
        let common_name = parenthesized_common_name(declared)
            .map(str::to_owned)
            .or_else(|| record.common_name.clone())?;
        let clean_common = normalize(&common_name);
        if clean_common.is_empty() {
            return None;
        }

        hit(index, &clean_common, MatchStrategy::CommonName).or_else(|| {
            for word in clean_common.split_whitespace() {
                if let Some(resolution) = hit(index, word, MatchStrategy::CommonWord) {
                    return Some(resolution);
                }
                for synonym in synonyms(word) {
                    if let Some(resolution) = hit(index, synonym, MatchStrategy::Synonym) {
                        return Some(resolution);
                    }
                }
            }
            None
        })
    };

    // Strategy 4: individual words of the declared name, then synonyms,
    // then substring containment for longer words
    let word_fallback = || {
        for word in clean_name.split_whitespace() {
            if word.len() < MIN_WORD_LEN || STOPWORDS.contains(&word) {
                continue;
            }

            if let Some(resolution) = hit(index, word, MatchStrategy::DeclaredWord) {
                return Some(resolution);
            }

            for synonym in synonyms(word) {
                if let Some(resolution) = hit(index, synonym, MatchStrategy::Synonym) {
                    return Some(resolution);
                }
            }

            if word.len() > SUBSTRING_WORD_LEN {
                let partial = index
                    .terms()
                    .iter()
                    .find(|term| term.contains(word) || word.contains(term.as_str()))
                    .and_then(|term| hit(index, term, MatchStrategy::Substring));
                if partial.is_some() {
                    return partial;
                }
            }
        }
        None
    };

    let strategies: [&dyn Fn() -> Option<Resolution>; 4] =
        [&exact_declared, &scientific, &common, &word_fallback];

    let resolution = strategies.iter().find_map(|strategy| strategy());

    match &resolution {
        Some(r) => info!(
            "Found match using {}: '{}' -> '{}'",
            r.strategy.as_str(),
            declared,
            r.matched_term
        ),
        None => debug!("No matching image found for '{}'", declared),
    }

    resolution
}
