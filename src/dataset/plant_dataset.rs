//! Plant Dataset Traversal
//!
//! The dataset object ties the pipeline together: it owns the immutable
//! records, the asset index and label space built once at creation, and
//! the materializer. Each requested index maps to a (base record,
//! augmentation variant) pair; failures advance to the next record modulo
//! the dataset size, bounded by a skip budget equal to the record count.

use std::collections::HashSet;
use std::path::Path;

use tracing::{info, warn};

use super::augmentation::{AugmentationVariant, TRANSFORM_COUNT};
use super::labels::LabelSpace;
use super::manifest::{self, PlantRecord};
use crate::config::DatasetConfig;
use crate::fetch::materialize::{Materializer, ResolvedSample};
use crate::index::asset_index::AssetIndex;
use crate::index::catalog::CatalogSource;
use crate::index::normalize::{normalize, strip_image_extension};
use crate::resolve::resolve;
use crate::utils::error::{MedPlantError, Result};

/// Dataset over plant records with remote image resolution
pub struct PlantDataset {
    records: Vec<PlantRecord>,
    index: AssetIndex,
    labels: LabelSpace,
    materializer: Materializer,
    augment: bool,
}

impl PlantDataset {
    /// Create a dataset from records, building the asset index by paging
    /// the given catalog once.
    pub fn new<S: CatalogSource>(
        records: Vec<PlantRecord>,
        catalog: &S,
        config: &DatasetConfig,
    ) -> Result<Self> {
        config.validate()?;
        manifest::validate_records(&records)?;

        let expected = expected_terms(&records);
        let index = AssetIndex::build(catalog, &expected, &config.backoff())?;
        let labels = LabelSpace::from_records(&records)?;
        let materializer = Materializer::new(config)?;

        info!(
            "Dataset initialized with {} records across {} species",
            records.len(),
            labels.len()
        );

        Ok(Self {
            records,
            index,
            labels,
            materializer,
            augment: config.augment,
        })
    }

    /// Create a dataset from a JSON manifest file
    pub fn from_manifest<P: AsRef<Path>, S: CatalogSource>(
        path: P,
        catalog: &S,
        config: &DatasetConfig,
    ) -> Result<Self> {
        let records = manifest::load_manifest(path)?;
        Self::new(records, catalog, config)
    }

    fn variants_per_record(&self) -> usize {
        if self.augment {
            1 + TRANSFORM_COUNT
        } else {
            1
        }
    }

    /// Number of addressable samples (records times augmentation variants)
    pub fn len(&self) -> usize {
        self.records.len() * self.variants_per_record()
    }

    /// Whether the dataset holds no records
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of classes in the label space
    pub fn num_classes(&self) -> usize {
        self.labels.len()
    }

    /// The label space built from the records
    pub fn labels(&self) -> &LabelSpace {
        &self.labels
    }

    /// The asset index built at creation
    pub fn index(&self) -> &AssetIndex {
        &self.index
    }

    /// The backing records
    pub fn records(&self) -> &[PlantRecord] {
        &self.records
    }

    /// Materialize the sample at `idx`.
    ///
    /// Recoverable per-sample failures (resolution miss, download, decode)
    /// advance to the next base record, wrapping modulo the record count.
    /// After a full fruitless pass the traversal fails with
    /// [`MedPlantError::Exhausted`]: a handful of bad records is expected,
    /// a whole pass of them means the pipeline is broken.
    pub fn get(&self, idx: usize) -> Result<ResolvedSample> {
        if self.records.is_empty() {
            return Err(MedPlantError::Exhausted(0));
        }

        let variants = self.variants_per_record();
        let mut base = (idx / variants) % self.records.len();
        let variant =
            AugmentationVariant::from_offset(idx % variants).unwrap_or(AugmentationVariant::Original);

        for _ in 0..self.records.len() {
            let record = &self.records[base];
            match self.try_sample(record, variant) {
                Ok(sample) => return Ok(sample),
                Err(e) if e.is_recoverable() => {
                    warn!(
                        "Skipping record {} ('{}'): {}",
                        base, record.scientific_name, e
                    );
                    base = (base + 1) % self.records.len();
                }
                Err(e) => return Err(e),
            }
        }

        Err(MedPlantError::Exhausted(self.records.len()))
    }

    fn try_sample(
        &self,
        record: &PlantRecord,
        variant: AugmentationVariant,
    ) -> Result<ResolvedSample> {
        let label = self
            .labels
            .index_of(&record.scientific_name)
            .ok_or_else(|| MedPlantError::UnknownLabel(record.scientific_name.clone()))?;

        let (url, cache_key) = match record.image_url.as_deref().filter(|u| !u.is_empty()) {
            // Direct-URL records skip resolution entirely
            Some(url) => (
                url.to_string(),
                record.observation_id.map(|id| format!("obs-{}", id)),
            ),
            None => {
                let resolution = resolve(record, &self.index).ok_or_else(|| {
                    MedPlantError::ResolutionMiss(
                        record
                            .image_name
                            .clone()
                            .unwrap_or_else(|| record.scientific_name.clone()),
                    )
                })?;
                (resolution.url, None)
            }
        };

        self.materializer
            .materialize(&url, cache_key.as_deref(), variant, label)
    }
}

/// Terms the index is expected to cover, used for coverage logging during
/// construction: the normalized declared image names and scientific names
/// of every record.
fn expected_terms(records: &[PlantRecord]) -> HashSet<String> {
    let mut expected = HashSet::new();
    for record in records {
        if let Some(name) = &record.image_name {
            let term = normalize(strip_image_extension(name));
            if !term.is_empty() {
                expected.insert(term);
            }
        }
        let term = normalize(&record.scientific_name);
        if !term.is_empty() {
            expected.insert(term);
        }
    }
    expected
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::catalog::{CatalogPage, CatalogResource};
    use std::cell::RefCell;
    use std::io::Cursor;

    struct MockCatalog {
        pages: RefCell<Vec<CatalogPage>>,
    }

    impl CatalogSource for MockCatalog {
        fn list_page(&self, _cursor: Option<&str>) -> Result<CatalogPage> {
            let mut pages = self.pages.borrow_mut();
            if pages.is_empty() {
                return Err(MedPlantError::Catalog("no more pages".into()));
            }
            Ok(pages.remove(0))
        }
    }

    fn catalog_with(resources: Vec<CatalogResource>) -> MockCatalog {
        MockCatalog {
            pages: RefCell::new(vec![CatalogPage {
                resources,
                next_cursor: None,
            }]),
        }
    }

    fn resource(public_id: &str, url: &str) -> CatalogResource {
        CatalogResource {
            public_id: public_id.to_string(),
            tags: vec![],
            context: std::collections::HashMap::new(),
            secure_url: Some(url.to_string()),
        }
    }

    fn config(augment: bool) -> DatasetConfig {
        DatasetConfig {
            image_size: 16,
            augment,
            max_retries: 2,
            backoff_base_ms: 1,
            backoff_cap_ms: 2,
            ..Default::default()
        }
    }

    fn jpeg_bytes() -> Vec<u8> {
        let img = image::DynamicImage::new_rgb8(32, 32);
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Jpeg)
            .unwrap();
        bytes
    }

    /// Serve the same JPEG for up to `requests` requests
    fn serve_jpeg(requests: usize) -> String {
        let server = tiny_http::Server::http("127.0.0.1:0").unwrap();
        let url = format!("http://{}/plant.jpg", server.server_addr().to_ip().unwrap());
        std::thread::spawn(move || {
            for _ in 0..requests {
                let request = match server.recv() {
                    Ok(r) => r,
                    Err(_) => return,
                };
                let response = tiny_http::Response::from_data(jpeg_bytes()).with_header(
                    tiny_http::Header::from_bytes(&b"Content-Type"[..], &b"image/jpeg"[..])
                        .unwrap(),
                );
                let _ = request.respond(response);
            }
        });
        url
    }

    #[test]
    fn test_len_accounts_for_augmentation_variants() {
        let records = vec![
            PlantRecord::named("Aloe vera", "aloe-vera-plant.jpg"),
            PlantRecord::named("Urtica dioica", "nettle.jpg"),
        ];
        let catalog = catalog_with(vec![resource("Dataset/aloe-vera-plant", "https://x/a.jpg")]);

        let dataset = PlantDataset::new(records.clone(), &catalog, &config(true)).unwrap();
        assert_eq!(dataset.len(), 2 * (1 + TRANSFORM_COUNT));

        let catalog = catalog_with(vec![resource("Dataset/aloe-vera-plant", "https://x/a.jpg")]);
        let plain = PlantDataset::new(records, &catalog, &config(false)).unwrap();
        assert_eq!(plain.len(), 2);
        assert_eq!(plain.num_classes(), 2);
    }

    #[test]
    fn test_get_resolves_and_materializes_sample() {
        // End-to-end: declared name resolves through the index to a URL
        // served by a local fixture server.
        let image_url = serve_jpeg(1);
        let records = vec![PlantRecord::named("Aloe vera", "aloe-vera-plant.jpg")];
        let catalog = catalog_with(vec![resource("Dataset/aloe-vera-plant", &image_url)]);

        let dataset = PlantDataset::new(records, &catalog, &config(false)).unwrap();
        let sample = dataset.get(0).unwrap();

        assert_eq!(sample.label, 0);
        assert_eq!(sample.pixels.len(), 3 * 16 * 16);
    }

    #[test]
    fn test_get_exhausts_when_nothing_resolves() {
        // No term in the index matches the record; the materializer is
        // never reached (nothing listens on the asset URL) and the bounded
        // traversal fails rather than looping.
        let records = vec![PlantRecord::named("Unknown species", "xyz123")];
        let catalog = catalog_with(vec![resource("Dataset/rosemary", "https://x/r.jpg")]);

        let dataset = PlantDataset::new(records, &catalog, &config(false)).unwrap();
        let err = dataset.get(0).unwrap_err();
        assert!(matches!(err, MedPlantError::Exhausted(1)));
    }

    #[test]
    fn test_get_skips_to_next_record_on_miss() {
        let image_url = serve_jpeg(1);
        let records = vec![
            PlantRecord::named("Unknown species", "xyz123"),
            PlantRecord::named("Aloe vera", "aloe-vera-plant.jpg"),
        ];
        let catalog = catalog_with(vec![resource("Dataset/aloe-vera-plant", &image_url)]);

        let dataset = PlantDataset::new(records, &catalog, &config(false)).unwrap();
        // Index 0 addresses the unresolvable record; the traversal advances
        // to the next record instead of failing.
        let sample = dataset.get(0).unwrap();
        assert_eq!(sample.label, dataset.labels().index_of("Aloe vera").unwrap());
    }

    #[test]
    fn test_get_uses_direct_image_url() {
        let image_url = serve_jpeg(1);
        let mut record = PlantRecord::named("Aloe vera", "ignored");
        record.image_name = None;
        record.image_url = Some(image_url);
        record.observation_id = Some(42);

        // The index still needs at least one asset to build
        let catalog = catalog_with(vec![resource("Dataset/rosemary", "https://x/r.jpg")]);
        let dataset = PlantDataset::new(vec![record], &catalog, &config(false)).unwrap();

        let sample = dataset.get(0).unwrap();
        assert_eq!(sample.label, 0);
    }

    #[test]
    fn test_expected_terms_cover_names_and_stems() {
        let records = vec![PlantRecord::named("Aloe vera", "aloe-vera-plant.jpg")];
        let expected = expected_terms(&records);
        assert!(expected.contains("aloe vera plant"));
        assert!(expected.contains("aloe vera"));
    }
}
