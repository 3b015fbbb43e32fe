use qdrant_client::Qdrant;
use qdrant_client::qdrant::{
    Condition, CreateCollectionBuilder, DeleteCollectionBuilder, Distance, Filter, PointStruct,
    SearchPointsBuilder, UpsertPointsBuilder, VectorParamsBuilder,
};
use tracing::{debug, info};

use super::error::VectorDbError;
use super::model::{StoreMatch, VectorPoint};

#[derive(Clone)]
/// Qdrant-backed reference store.
pub struct QdrantStore {
    client: Qdrant,
    url: String,
}

impl QdrantStore {
    /// Creates a client for `url`.
    pub fn new(url: &str) -> Result<Self, VectorDbError> {
        let client =
            Qdrant::from_url(url)
                .build()
                .map_err(|e| VectorDbError::ConnectionFailed {
                    url: url.to_string(),
                    message: e.to_string(),
                })?;

        Ok(Self {
            client,
            url: url.to_string(),
        })
    }

    /// Returns the underlying Qdrant client.
    pub fn client(&self) -> &Qdrant {
        &self.client
    }

    /// Returns the configured URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Performs a basic health check request.
    pub async fn health_check(&self) -> Result<(), VectorDbError> {
        self.client
            .health_check()
            .await
            .map_err(|e| VectorDbError::ConnectionFailed {
                url: self.url.clone(),
                message: e.to_string(),
            })?;
        Ok(())
    }

    /// Returns `true` if the collection exists.
    pub async fn collection_exists(&self, name: &str) -> Result<bool, VectorDbError> {
        self.client.collection_exists(name).await.map_err(|e| {
            VectorDbError::CreateCollectionFailed {
                collection: name.to_string(),
                message: e.to_string(),
            }
        })
    }

    async fn create_collection(&self, name: &str, dimension: u64) -> Result<(), VectorDbError> {
        let vectors_config = VectorParamsBuilder::new(dimension, Distance::Cosine);

        self.client
            .create_collection(
                CreateCollectionBuilder::new(name)
                    .vectors_config(vectors_config)
                    .on_disk_payload(true),
            )
            .await
            .map_err(|e| VectorDbError::CreateCollectionFailed {
                collection: name.to_string(),
                message: e.to_string(),
            })?;

        info!(collection = name, dimension, "Created vector collection");
        Ok(())
    }
}

/// Async interface the matcher drives.
///
/// `query` returns at most `limit` hits ordered by ascending cosine distance, optionally
/// restricted to one domain.
pub trait VectorStore: Send + Sync {
    /// Creates the collection if it does not exist.
    fn ensure_collection(
        &self,
        name: &str,
        dimension: u64,
    ) -> impl std::future::Future<Output = Result<(), VectorDbError>> + Send;

    /// Writes points, replacing any with the same id.
    fn upsert(
        &self,
        collection: &str,
        points: Vec<VectorPoint>,
    ) -> impl std::future::Future<Output = Result<(), VectorDbError>> + Send;

    fn query(
        &self,
        collection: &str,
        vector: Vec<f32>,
        limit: u64,
        domain: Option<&str>,
    ) -> impl std::future::Future<Output = Result<Vec<StoreMatch>, VectorDbError>> + Send;

    /// Drops the collection. Returns `false` if it did not exist.
    fn delete_collection(
        &self,
        name: &str,
    ) -> impl std::future::Future<Output = Result<bool, VectorDbError>> + Send;
}

impl VectorStore for QdrantStore {
    async fn ensure_collection(&self, name: &str, dimension: u64) -> Result<(), VectorDbError> {
        if !self.collection_exists(name).await? {
            self.create_collection(name, dimension).await?;
        }
        Ok(())
    }

    async fn upsert(&self, collection: &str, points: Vec<VectorPoint>) -> Result<(), VectorDbError> {
        if points.is_empty() {
            return Ok(());
        }
        let count = points.len();

        let qdrant_points: Vec<PointStruct> = points
            .into_iter()
            .map(|p| {
                let payload = p.payload();
                PointStruct::new(p.id, p.vector, payload)
            })
            .collect();

        self.client
            .upsert_points(UpsertPointsBuilder::new(collection, qdrant_points).wait(true))
            .await
            .map_err(|e| VectorDbError::UpsertFailed {
                collection: collection.to_string(),
                message: e.to_string(),
            })?;

        debug!(collection, count, "Upserted reference points");
        Ok(())
    }

    async fn query(
        &self,
        collection: &str,
        vector: Vec<f32>,
        limit: u64,
        domain: Option<&str>,
    ) -> Result<Vec<StoreMatch>, VectorDbError> {
        let mut search_builder =
            SearchPointsBuilder::new(collection, vector, limit).with_payload(true);

        if let Some(domain) = domain {
            let filter = Filter::must([Condition::matches("domain", domain.to_string())]);
            search_builder = search_builder.filter(filter);
        }

        let search_result = self
            .client
            .search_points(search_builder)
            .await
            .map_err(|e| VectorDbError::SearchFailed {
                collection: collection.to_string(),
                message: e.to_string(),
            })?;

        let results = search_result
            .result
            .into_iter()
            .filter_map(StoreMatch::from_scored_point)
            .collect();

        Ok(results)
    }

    async fn delete_collection(&self, name: &str) -> Result<bool, VectorDbError> {
        if !self.collection_exists(name).await? {
            return Ok(false);
        }

        self.client
            .delete_collection(DeleteCollectionBuilder::new(name))
            .await
            .map_err(|e| VectorDbError::DeleteFailed {
                collection: name.to_string(),
                message: e.to_string(),
            })?;

        info!(collection = name, "Deleted vector collection");
        Ok(true)
    }
}
