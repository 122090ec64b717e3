#![cfg(any(test, feature = "mock"))]

use std::sync::RwLock;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use super::client::{CatalogWriter, RecordStore};
use super::error::StoreError;
use super::model::{CatalogPoint, GameRecord, VectorQuery, name_matches};

const MOCK_URL: &str = "mock://catalog";
const MOCK_COLLECTION: &str = "mock_games";

#[derive(Clone)]
struct StoredRecord {
    record: GameRecord,
    vector: Option<Vec<f32>>,
}

/// In-memory catalog preserving insertion order.
#[derive(Default)]
pub struct MockRecordStore {
    records: RwLock<Vec<StoredRecord>>,
    dimension: RwLock<Option<u64>>,
    unavailable: AtomicBool,
    vector_searches: AtomicUsize,
    name_searches: AtomicUsize,
}

impl MockRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog with no vectors (semantic search returns nothing).
    pub fn with_records(records: Vec<GameRecord>) -> Self {
        let store = Self::new();
        store.insert_all(records.into_iter().map(|r| (r, None)));
        store
    }

    /// Catalog where each record may carry an embedding.
    pub fn with_embedded_records(records: Vec<(GameRecord, Option<Vec<f32>>)>) -> Self {
        let store = Self::new();
        store.insert_all(records);
        store
    }

    fn insert_all(&self, records: impl IntoIterator<Item = (GameRecord, Option<Vec<f32>>)>) {
        if let Ok(mut stored) = self.records.write() {
            stored.extend(
                records
                    .into_iter()
                    .map(|(record, vector)| StoredRecord { record, vector }),
            );
        }
    }

    /// Simulates an unreachable store: every call fails while set.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub fn len(&self) -> usize {
        self.records.read().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of `vector_search` calls served.
    pub fn vector_search_count(&self) -> usize {
        self.vector_searches.load(Ordering::SeqCst)
    }

    /// Number of `find_by_name` calls served.
    pub fn name_search_count(&self) -> usize {
        self.name_searches.load(Ordering::SeqCst)
    }

    /// Stored vector for a record id, if any.
    pub fn vector_of(&self, id: &str) -> Option<Vec<f32>> {
        self.records
            .read()
            .ok()?
            .iter()
            .find(|s| s.record.id == id)
            .and_then(|s| s.vector.clone())
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::ConnectionFailed {
                url: MOCK_URL.to_string(),
                message: "store marked unavailable".to_string(),
            });
        }
        Ok(())
    }

    fn read_failed() -> StoreError {
        StoreError::QueryFailed {
            collection: MOCK_COLLECTION.to_string(),
            message: "lock poisoned".to_string(),
        }
    }
}

impl RecordStore for MockRecordStore {
    async fn find(&self, limit: usize) -> Result<Vec<GameRecord>, StoreError> {
        self.check_available()?;
        let records = self.records.read().map_err(|_| Self::read_failed())?;

        Ok(records
            .iter()
            .take(limit)
            .map(|s| s.record.clone())
            .collect())
    }

    async fn get(&self, id: &str) -> Result<Option<GameRecord>, StoreError> {
        self.check_available()?;
        let records = self.records.read().map_err(|_| Self::read_failed())?;

        Ok(records
            .iter()
            .find(|s| s.record.id == id)
            .map(|s| s.record.clone()))
    }

    async fn find_by_name(
        &self,
        fragment: &str,
        limit: usize,
    ) -> Result<Vec<GameRecord>, StoreError> {
        self.check_available()?;
        self.name_searches.fetch_add(1, Ordering::SeqCst);
        let records = self.records.read().map_err(|_| Self::read_failed())?;

        Ok(records
            .iter()
            .filter(|s| name_matches(&s.record.name, fragment))
            .take(limit)
            .map(|s| s.record.clone())
            .collect())
    }

    async fn vector_search(&self, query: VectorQuery) -> Result<Vec<GameRecord>, StoreError> {
        self.check_available()?;
        self.vector_searches.fetch_add(1, Ordering::SeqCst);
        let records = self.records.read().map_err(|_| Self::read_failed())?;

        let mut scored: Vec<GameRecord> = records
            .iter()
            .filter_map(|s| {
                let vector = s.vector.as_ref()?;
                if vector.len() != query.vector.len() {
                    return None;
                }
                Some(
                    s.record
                        .clone()
                        .with_score(cosine_similarity(&query.vector, vector)),
                )
            })
            .collect();

        // Stable sort: equal scores keep insertion order.
        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        scored.truncate(query.limit);

        Ok(scored)
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        self.check_available()
    }
}

impl CatalogWriter for MockRecordStore {
    async fn ensure_collection(&self, dimension: u64) -> Result<(), StoreError> {
        self.check_available()?;
        let mut current = self
            .dimension
            .write()
            .map_err(|_| StoreError::CreateCollectionFailed {
                collection: MOCK_COLLECTION.to_string(),
                message: "lock poisoned".to_string(),
            })?;

        if current.is_none() {
            *current = Some(dimension);
        }
        Ok(())
    }

    async fn upsert(&self, points: Vec<CatalogPoint>) -> Result<(), StoreError> {
        self.check_available()?;
        let dimension = self.dimension.read().ok().and_then(|d| *d);

        let mut records = self
            .records
            .write()
            .map_err(|_| StoreError::UpsertFailed {
                collection: MOCK_COLLECTION.to_string(),
                message: "lock poisoned".to_string(),
            })?;

        for point in points {
            if let (Some(expected), Some(vector)) = (dimension, point.vector.as_ref())
                && vector.len() as u64 != expected
            {
                return Err(StoreError::InvalidDimension {
                    expected: expected as usize,
                    actual: vector.len(),
                });
            }

            let stored = StoredRecord {
                record: point.record,
                vector: point.vector,
            };

            match records.iter_mut().find(|s| s.record.id == stored.record.id) {
                Some(existing) => *existing = stored,
                None => records.push(stored),
            }
        }

        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<bool, StoreError> {
        self.check_available()?;
        let mut records = self
            .records
            .write()
            .map_err(|_| StoreError::DeleteFailed {
                collection: MOCK_COLLECTION.to_string(),
                message: "lock poisoned".to_string(),
            })?;

        let before = records.len();
        records.retain(|s| s.record.id != id);
        Ok(records.len() < before)
    }
}

pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot_product / (norm_a * norm_b)
    }
}
