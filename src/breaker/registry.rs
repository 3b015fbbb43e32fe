use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use super::circuit::{BreakerSnapshot, CircuitBreaker};
use crate::config::BreakerConfig;

/// Service name → shared [`CircuitBreaker`].
///
/// Every caller asking for the same name gets the same breaker, so failures observed by one
/// component protect the others.
pub struct BreakerRegistry {
    config: BreakerConfig,
    breakers: RwLock<HashMap<String, Arc<CircuitBreaker>>>,
}

impl BreakerRegistry {
    pub fn new(config: BreakerConfig) -> Self {
        Self {
            config,
            breakers: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the breaker for `service`, creating it on first use.
    pub fn get(&self, service: &str) -> Arc<CircuitBreaker> {
        if let Some(breaker) = self.breakers.read().get(service) {
            return Arc::clone(breaker);
        }
        let mut breakers = self.breakers.write();
        Arc::clone(
            breakers
                .entry(service.to_string())
                .or_insert_with(|| Arc::new(CircuitBreaker::new(service, self.config))),
        )
    }

    /// Registers a pre-built breaker (e.g. with a custom failure predicate).
    pub fn insert(&self, breaker: CircuitBreaker) -> Arc<CircuitBreaker> {
        let breaker = Arc::new(breaker);
        self.breakers
            .write()
            .insert(breaker.name().to_string(), Arc::clone(&breaker));
        breaker
    }

    pub fn len(&self) -> usize {
        self.breakers.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.breakers.read().is_empty()
    }

    /// Snapshots of every registered breaker, sorted by name.
    pub fn snapshot(&self) -> Vec<BreakerSnapshot> {
        let breakers: Vec<Arc<CircuitBreaker>> = self.breakers.read().values().cloned().collect();
        let mut snapshots: Vec<BreakerSnapshot> = breakers.iter().map(|b| b.snapshot()).collect();
        snapshots.sort_by(|a, b| a.name.cmp(&b.name));
        snapshots
    }
}

impl Default for BreakerRegistry {
    fn default() -> Self {
        Self::new(BreakerConfig::default())
    }
}

impl std::fmt::Debug for BreakerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BreakerRegistry")
            .field("config", &self.config)
            .field("services", &self.len())
            .finish()
    }
}
