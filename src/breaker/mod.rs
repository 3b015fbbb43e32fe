//! Per-service circuit breakers guarding external calls.

pub mod circuit;
pub mod registry;


pub use circuit::{
    BreakerSnapshot, CircuitBreaker, CircuitState, FailurePredicate, transient_failures,
};
pub use registry::BreakerRegistry;
