use std::collections::HashMap;

use qdrant_client::qdrant::point_id::PointIdOptions;
use qdrant_client::qdrant::{ScoredPoint, Value};
use serde::{Deserialize, Serialize};

use crate::hashing::point_id;
use crate::model::{ReferenceChunk, SourceType};

const KEY_CHUNK_ID: &str = "chunk_id";
const KEY_DOCUMENT: &str = "document";
const KEY_DOMAIN: &str = "domain";
const KEY_SOURCE_TYPE: &str = "source_type";
const KEY_TRUST_SCORE: &str = "trust_score";
const KEY_TITLE: &str = "title";
const KEY_PARENT_ID: &str = "parent_id";
const KEY_IS_CHUNK: &str = "is_chunk";
const KEY_CHUNK_INDEX: &str = "chunk_index";

/// Metadata stored beside each vector.
///
/// Fields are optional on read because stores may hold records written by other producers.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ChunkMetadata {
    pub domain: String,
    pub source_type: Option<SourceType>,
    pub trust_score: Option<f32>,
    pub title: String,
    pub parent_id: Option<String>,
    pub is_chunk: bool,
    pub chunk_index: usize,
}

impl ChunkMetadata {
    pub fn from_chunk(chunk: &ReferenceChunk) -> Self {
        Self {
            domain: chunk.domain.clone(),
            source_type: Some(chunk.source_type),
            trust_score: Some(chunk.trust_score),
            title: chunk.title.clone(),
            parent_id: Some(chunk.parent_id.clone()),
            is_chunk: chunk.is_chunk,
            chunk_index: chunk.chunk_index,
        }
    }
}

/// A vector ready to be written.
#[derive(Debug, Clone)]
pub struct VectorPoint {
    /// Numeric store id derived from `chunk_id`.
    pub id: u64,
    pub chunk_id: String,
    pub vector: Vec<f32>,
    pub document: String,
    pub metadata: ChunkMetadata,
}

impl VectorPoint {
    pub fn from_chunk(chunk: ReferenceChunk, vector: Vec<f32>) -> Self {
        let metadata = ChunkMetadata::from_chunk(&chunk);
        Self {
            id: point_id(&chunk.id),
            chunk_id: chunk.id,
            vector,
            document: chunk.text,
            metadata,
        }
    }

    pub(crate) fn payload(&self) -> HashMap<String, Value> {
        let m = &self.metadata;
        let mut payload: HashMap<String, Value> = HashMap::new();
        payload.insert(KEY_CHUNK_ID.to_string(), self.chunk_id.clone().into());
        payload.insert(KEY_DOCUMENT.to_string(), self.document.clone().into());
        payload.insert(KEY_DOMAIN.to_string(), m.domain.clone().into());
        payload.insert(KEY_TITLE.to_string(), m.title.clone().into());
        payload.insert(KEY_IS_CHUNK.to_string(), m.is_chunk.into());
        payload.insert(KEY_CHUNK_INDEX.to_string(), (m.chunk_index as i64).into());
        if let Some(source_type) = m.source_type {
            payload.insert(KEY_SOURCE_TYPE.to_string(), source_type.as_str().into());
        }
        if let Some(trust) = m.trust_score {
            payload.insert(KEY_TRUST_SCORE.to_string(), f64::from(trust).into());
        }
        if let Some(parent) = &m.parent_id {
            payload.insert(KEY_PARENT_ID.to_string(), parent.clone().into());
        }
        payload
    }
}

/// One query hit. `distance` is cosine distance (`1 − similarity`), ascending across results.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreMatch {
    pub id: String,
    pub distance: f32,
    pub document: String,
    pub metadata: ChunkMetadata,
}

impl StoreMatch {
    /// Parent document id, falling back to the record id for records without one.
    pub fn parent_id(&self) -> &str {
        self.metadata.parent_id.as_deref().unwrap_or(&self.id)
    }

    pub fn from_scored_point(point: ScoredPoint) -> Option<Self> {
        let numeric_id = match point.id.and_then(|pid| pid.point_id_options) {
            Some(PointIdOptions::Num(n)) => n.to_string(),
            Some(PointIdOptions::Uuid(u)) => u,
            None => return None,
        };

        let payload = point.payload;
        let text = |key: &str| payload.get(key).and_then(|v| v.as_str()).map(|s| s.to_string());

        let metadata = ChunkMetadata {
            domain: text(KEY_DOMAIN).unwrap_or_default(),
            source_type: text(KEY_SOURCE_TYPE).and_then(|s| s.parse().ok()),
            trust_score: payload
                .get(KEY_TRUST_SCORE)
                .and_then(|v| v.as_double())
                .map(|d| d as f32),
            title: text(KEY_TITLE).unwrap_or_default(),
            parent_id: text(KEY_PARENT_ID),
            is_chunk: payload
                .get(KEY_IS_CHUNK)
                .and_then(|v| v.as_bool())
                .unwrap_or(false),
            chunk_index: payload
                .get(KEY_CHUNK_INDEX)
                .and_then(|v| v.as_integer())
                .map(|i| i.max(0) as usize)
                .unwrap_or(0),
        };

        Some(StoreMatch {
            id: text(KEY_CHUNK_ID).unwrap_or(numeric_id),
            distance: 1.0 - point.score,
            document: text(KEY_DOCUMENT).unwrap_or_default(),
            metadata,
        })
    }
}
