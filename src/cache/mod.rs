//! Namespaced key/value cache with per-namespace TTL and glob invalidation.

pub mod backend;
pub mod error;
pub mod store;
pub mod types;


pub use backend::{CacheBackend, MemoryCacheBackend, compile_pattern};
pub use error::{CacheError, CacheResult};
pub use store::CacheStore;
pub use types::CacheNamespace;
