//! Vector store integration for reference chunks.

pub mod client;
pub mod error;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod model;


pub use client::{QdrantStore, VectorStore};
pub use error::VectorDbError;
#[cfg(any(test, feature = "mock"))]
pub use mock::MockVectorStore;
pub use model::{ChunkMetadata, StoreMatch, VectorPoint};
