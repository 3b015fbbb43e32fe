//! Content-gap detection and quality scoring.

pub mod engine;
pub mod types;


pub use engine::ValidationEngine;
pub use types::{ContentGap, GapType, ValidationResult};
