use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};

use crate::embedding::compute_similarity;
use crate::vectordb::{StoreMatch, VectorDbError, VectorPoint, VectorStore};

/// In-memory [`VectorStore`] for tests.
///
/// Distances are `1 − clamp(cosine, 0, 1)`. Failures can be injected with
/// [`MockVectorStore::fail_next`], and query results replaced with
/// [`MockVectorStore::script_results`].
#[derive(Default)]
pub struct MockVectorStore {
    collections: std::sync::RwLock<HashMap<String, MockCollection>>,
    scripted: std::sync::RwLock<Option<Vec<StoreMatch>>>,
    failures_remaining: AtomicU32,
    query_calls: AtomicUsize,
    upsert_calls: AtomicUsize,
}

#[derive(Default, Clone)]
struct MockCollection {
    dimension: u64,
    points: HashMap<u64, VectorPoint>,
}

impl MockVectorStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn point_count(&self, collection: &str) -> Option<usize> {
        self.collections
            .read()
            .ok()?
            .get(collection)
            .map(|c| c.points.len())
    }

    pub fn has_collection(&self, collection: &str) -> bool {
        self.point_count(collection).is_some()
    }

    /// Makes the next `count` operations fail with a transient error.
    pub fn fail_next(&self, count: u32) {
        self.failures_remaining.store(count, Ordering::SeqCst);
    }

    /// Returns `results` (truncated to the limit) from every query instead of searching.
    pub fn script_results(&self, results: Vec<StoreMatch>) {
        if let Ok(mut scripted) = self.scripted.write() {
            *scripted = Some(results);
        }
    }

    pub fn query_calls(&self) -> usize {
        self.query_calls.load(Ordering::SeqCst)
    }

    pub fn upsert_calls(&self) -> usize {
        self.upsert_calls.load(Ordering::SeqCst)
    }

    fn injected_failure(&self) -> bool {
        self.failures_remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

impl VectorStore for MockVectorStore {
    async fn ensure_collection(&self, name: &str, dimension: u64) -> Result<(), VectorDbError> {
        if self.injected_failure() {
            return Err(VectorDbError::CreateCollectionFailed {
                collection: name.to_string(),
                message: "injected failure".to_string(),
            });
        }

        let mut collections =
            self.collections
                .write()
                .map_err(|_| VectorDbError::CreateCollectionFailed {
                    collection: name.to_string(),
                    message: "lock poisoned".to_string(),
                })?;

        collections
            .entry(name.to_string())
            .or_insert(MockCollection {
                dimension,
                points: HashMap::new(),
            });

        Ok(())
    }

    async fn upsert(&self, collection: &str, points: Vec<VectorPoint>) -> Result<(), VectorDbError> {
        self.upsert_calls.fetch_add(1, Ordering::SeqCst);
        if self.injected_failure() {
            return Err(VectorDbError::UpsertFailed {
                collection: collection.to_string(),
                message: "injected failure".to_string(),
            });
        }

        let mut collections =
            self.collections
                .write()
                .map_err(|_| VectorDbError::UpsertFailed {
                    collection: collection.to_string(),
                    message: "lock poisoned".to_string(),
                })?;

        let coll =
            collections
                .get_mut(collection)
                .ok_or_else(|| VectorDbError::CollectionNotFound {
                    collection: collection.to_string(),
                })?;

        for point in points {
            if point.vector.len() as u64 != coll.dimension {
                return Err(VectorDbError::InvalidDimension {
                    expected: coll.dimension as usize,
                    actual: point.vector.len(),
                });
            }
            coll.points.insert(point.id, point);
        }

        Ok(())
    }

    async fn query(
        &self,
        collection: &str,
        vector: Vec<f32>,
        limit: u64,
        domain: Option<&str>,
    ) -> Result<Vec<StoreMatch>, VectorDbError> {
        self.query_calls.fetch_add(1, Ordering::SeqCst);
        if self.injected_failure() {
            return Err(VectorDbError::SearchFailed {
                collection: collection.to_string(),
                message: "injected failure".to_string(),
            });
        }

        if let Ok(scripted) = self.scripted.read()
            && let Some(results) = scripted.as_ref()
        {
            return Ok(results.iter().take(limit as usize).cloned().collect());
        }

        let collections = self
            .collections
            .read()
            .map_err(|_| VectorDbError::SearchFailed {
                collection: collection.to_string(),
                message: "lock poisoned".to_string(),
            })?;

        let coll =
            collections
                .get(collection)
                .ok_or_else(|| VectorDbError::CollectionNotFound {
                    collection: collection.to_string(),
                })?;

        let mut results: Vec<StoreMatch> = coll
            .points
            .values()
            .filter(|p| domain.is_none_or(|d| p.metadata.domain == d))
            .map(|p| StoreMatch {
                id: p.chunk_id.clone(),
                distance: 1.0 - compute_similarity(&vector, &p.vector),
                document: p.document.clone(),
                metadata: p.metadata.clone(),
            })
            .collect();

        results.sort_by(|a, b| {
            a.distance
                .partial_cmp(&b.distance)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.id.cmp(&b.id))
        });

        results.truncate(limit as usize);
        Ok(results)
    }

    async fn delete_collection(&self, name: &str) -> Result<bool, VectorDbError> {
        if self.injected_failure() {
            return Err(VectorDbError::DeleteFailed {
                collection: name.to_string(),
                message: "injected failure".to_string(),
            });
        }

        let mut collections =
            self.collections
                .write()
                .map_err(|_| VectorDbError::DeleteFailed {
                    collection: name.to_string(),
                    message: "lock poisoned".to_string(),
                })?;

        Ok(collections.remove(name).is_some())
    }
}
