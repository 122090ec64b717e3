use std::collections::HashMap;

use qdrant_client::Qdrant;
use qdrant_client::qdrant::{
    CreateCollectionBuilder, DeletePointsBuilder, Distance, GetPointsBuilder, PointId,
    PointStruct, PointsIdsList, ScrollPointsBuilder, SearchParamsBuilder, SearchPointsBuilder,
    UpsertPointsBuilder, VectorParamsBuilder, VectorsConfigBuilder,
};
use tracing::debug;

use super::error::StoreError;
use crate::hashing::point_id_for;
use super::model::{CatalogPoint, GameRecord, VectorQuery, name_matches};

/// Points fetched per scroll request.
const SCROLL_PAGE_SIZE: usize = 256;

/// Read access to the game catalog.
pub trait RecordStore: Send + Sync {
    /// Up to `limit` records in store order.
    fn find(
        &self,
        limit: usize,
    ) -> impl std::future::Future<Output = Result<Vec<GameRecord>, StoreError>> + Send;

    /// The record with catalog id `id`, if present.
    fn get(
        &self,
        id: &str,
    ) -> impl std::future::Future<Output = Result<Option<GameRecord>, StoreError>> + Send;

    /// Up to `limit` records whose name contains `fragment`, ignoring case, in store order.
    fn find_by_name(
        &self,
        fragment: &str,
        limit: usize,
    ) -> impl std::future::Future<Output = Result<Vec<GameRecord>, StoreError>> + Send;

    /// Up to `query.limit` records ranked by descending similarity, with `score` set.
    fn vector_search(
        &self,
        query: VectorQuery,
    ) -> impl std::future::Future<Output = Result<Vec<GameRecord>, StoreError>> + Send;

    /// Cheap reachability check.
    fn health_check(&self) -> impl std::future::Future<Output = Result<(), StoreError>> + Send;
}

/// Write access used by the catalog indexer and the catalog CRUD routes (never by analysis).
pub trait CatalogWriter: Send + Sync {
    /// Ensures the catalog collection exists with a named vector of `dimension`.
    fn ensure_collection(
        &self,
        dimension: u64,
    ) -> impl std::future::Future<Output = Result<(), StoreError>> + Send;

    /// Inserts or replaces points.
    fn upsert(
        &self,
        points: Vec<CatalogPoint>,
    ) -> impl std::future::Future<Output = Result<(), StoreError>> + Send;

    /// Removes the record with catalog id `id`. Returns whether it existed.
    fn delete(
        &self,
        id: &str,
    ) -> impl std::future::Future<Output = Result<bool, StoreError>> + Send;
}

#[derive(Clone)]
/// Qdrant-backed catalog.
pub struct QdrantRecordStore {
    client: Qdrant,
    url: String,
    collection: String,
    vector_name: String,
}

impl std::fmt::Debug for QdrantRecordStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QdrantRecordStore")
            .field("url", &self.url)
            .field("collection", &self.collection)
            .field("vector_name", &self.vector_name)
            .finish_non_exhaustive()
    }
}

impl QdrantRecordStore {
    /// Creates a client for `url` (no request is made until first use).
    pub fn new(url: &str, collection: &str, vector_name: &str) -> Result<Self, StoreError> {
        let client =
            Qdrant::from_url(url)
                .build()
                .map_err(|e| StoreError::ConnectionFailed {
                    url: url.to_string(),
                    message: e.to_string(),
                })?;

        Ok(Self {
            client,
            url: url.to_string(),
            collection: collection.to_string(),
            vector_name: vector_name.to_string(),
        })
    }

    /// Returns the configured URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Returns the catalog collection name.
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Returns the named vector used for similarity search.
    pub fn vector_name(&self) -> &str {
        &self.vector_name
    }

    async fn scroll_page(
        &self,
        offset: Option<PointId>,
        page_size: usize,
    ) -> Result<(Vec<GameRecord>, Option<PointId>), StoreError> {
        let mut builder = ScrollPointsBuilder::new(&self.collection)
            .limit(page_size as u32)
            .with_payload(true)
            .with_vectors(false);

        if let Some(offset) = offset {
            builder = builder.offset(offset);
        }

        let response = self
            .client
            .scroll(builder)
            .await
            .map_err(|e| StoreError::QueryFailed {
                collection: self.collection.clone(),
                message: e.to_string(),
            })?;

        let records = response
            .result
            .into_iter()
            .filter_map(|p| GameRecord::from_payload(p.id, p.payload, None))
            .collect();

        Ok((records, response.next_page_offset))
    }

    /// Pages through the collection, keeping records accepted by `keep`, until `limit`
    /// records are collected or the collection is exhausted.
    async fn scan<F>(&self, limit: usize, keep: F) -> Result<Vec<GameRecord>, StoreError>
    where
        F: Fn(&GameRecord) -> bool + Send + Sync,
    {
        let mut collected = Vec::new();
        let mut offset = None;

        while collected.len() < limit {
            let (page, next) = self.scroll_page(offset, SCROLL_PAGE_SIZE).await?;

            for record in page {
                if collected.len() == limit {
                    break;
                }
                if keep(&record) {
                    collected.push(record);
                }
            }

            match next {
                Some(next) => offset = Some(next),
                None => break,
            }
        }

        debug!(
            collection = %self.collection,
            returned = collected.len(),
            "Catalog scan complete"
        );
        Ok(collected)
    }
}

impl RecordStore for QdrantRecordStore {
    async fn find(&self, limit: usize) -> Result<Vec<GameRecord>, StoreError> {
        self.scan(limit, |_| true).await
    }

    async fn get(&self, id: &str) -> Result<Option<GameRecord>, StoreError> {
        let builder = GetPointsBuilder::new(&self.collection, vec![PointId::from(point_id_for(id))])
            .with_payload(true)
            .with_vectors(false);

        let response = self
            .client
            .get_points(builder)
            .await
            .map_err(|e| StoreError::QueryFailed {
                collection: self.collection.clone(),
                message: e.to_string(),
            })?;

        Ok(response
            .result
            .into_iter()
            .filter_map(|p| GameRecord::from_payload(p.id, p.payload, None))
            .find(|record| record.id == id))
    }

    async fn find_by_name(
        &self,
        fragment: &str,
        limit: usize,
    ) -> Result<Vec<GameRecord>, StoreError> {
        self.scan(limit, |record| name_matches(&record.name, fragment))
            .await
    }

    async fn vector_search(&self, query: VectorQuery) -> Result<Vec<GameRecord>, StoreError> {
        let builder = SearchPointsBuilder::new(&self.collection, query.vector, query.limit as u64)
            .vector_name(query.index)
            .with_payload(true)
            .params(SearchParamsBuilder::default().hnsw_ef(query.num_candidates as u64));

        let response =
            self.client
                .search_points(builder)
                .await
                .map_err(|e| StoreError::SearchFailed {
                    collection: self.collection.clone(),
                    message: e.to_string(),
                })?;

        Ok(response
            .result
            .into_iter()
            .filter_map(|p| GameRecord::from_payload(p.id, p.payload, Some(p.score)))
            .collect())
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        self.client
            .health_check()
            .await
            .map_err(|e| StoreError::ConnectionFailed {
                url: self.url.clone(),
                message: e.to_string(),
            })?;
        Ok(())
    }
}

impl CatalogWriter for QdrantRecordStore {
    async fn ensure_collection(&self, dimension: u64) -> Result<(), StoreError> {
        let exists = self
            .client
            .collection_exists(&self.collection)
            .await
            .map_err(|e| StoreError::CreateCollectionFailed {
                collection: self.collection.clone(),
                message: e.to_string(),
            })?;

        if exists {
            return Ok(());
        }

        let mut vectors_config = VectorsConfigBuilder::default();
        vectors_config.add_named_vector_params(
            &self.vector_name,
            VectorParamsBuilder::new(dimension, Distance::Cosine),
        );

        self.client
            .create_collection(
                CreateCollectionBuilder::new(&self.collection)
                    .vectors_config(vectors_config)
                    .on_disk_payload(true),
            )
            .await
            .map_err(|e| StoreError::CreateCollectionFailed {
                collection: self.collection.clone(),
                message: e.to_string(),
            })?;

        Ok(())
    }

    async fn upsert(&self, points: Vec<CatalogPoint>) -> Result<(), StoreError> {
        if points.is_empty() {
            return Ok(());
        }

        let qdrant_points: Vec<PointStruct> = points
            .into_iter()
            .map(|p| {
                let mut vectors: HashMap<String, Vec<f32>> = HashMap::new();
                if let Some(vector) = p.vector {
                    vectors.insert(self.vector_name.clone(), vector);
                }
                PointStruct::new(p.id, vectors, p.record.to_payload())
            })
            .collect();

        self.client
            .upsert_points(UpsertPointsBuilder::new(&self.collection, qdrant_points).wait(true))
            .await
            .map_err(|e| StoreError::UpsertFailed {
                collection: self.collection.clone(),
                message: e.to_string(),
            })?;

        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<bool, StoreError> {
        // Qdrant acknowledges deletes of unknown ids, so existence is checked first.
        if RecordStore::get(self, id).await?.is_none() {
            return Ok(false);
        }

        let ids = PointsIdsList {
            ids: vec![PointId::from(point_id_for(id))],
        };
        self.client
            .delete_points(
                DeletePointsBuilder::new(&self.collection)
                    .points(ids)
                    .wait(true),
            )
            .await
            .map_err(|e| StoreError::DeleteFailed {
                collection: self.collection.clone(),
                message: e.to_string(),
            })?;

        debug!(collection = %self.collection, id, "Catalog record deleted");
        Ok(true)
    }
}
