use std::future::Future;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::config::BreakerConfig;
use crate::error::{PipelineError, PipelineResult};

/// Breaker state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CircuitState {
    /// Calls pass through; counted failures accumulate.
    Closed,
    /// Calls are rejected until the recovery timeout elapses.
    Open,
    /// Trial calls pass; the next outcome decides between Closed and Open.
    HalfOpen,
}

impl CircuitState {
    pub fn as_str(&self) -> &'static str {
        match self {
            CircuitState::Closed => "CLOSED",
            CircuitState::Open => "OPEN",
            CircuitState::HalfOpen => "HALF_OPEN",
        }
    }
}

impl std::fmt::Display for CircuitState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Point-in-time view of a breaker.
#[derive(Debug, Clone, PartialEq)]
pub struct BreakerSnapshot {
    pub name: String,
    pub state: CircuitState,
    pub failure_count: u32,
    /// Time since the last counted failure.
    pub since_last_failure: Option<Duration>,
}

/// Decides which errors count toward opening the circuit.
pub type FailurePredicate = fn(&PipelineError) -> bool;

/// Default failure family: transient errors (timeouts, 5xx, rate limits).
pub fn transient_failures(err: &PipelineError) -> bool {
    err.is_transient() && !err.is_circuit_open()
}

#[derive(Debug)]
struct BreakerInner {
    state: CircuitState,
    failure_count: u32,
    last_failure: Option<Instant>,
}

/// Failure-tracking guard for one named external service.
///
/// All reads and writes of the state go through one mutex. Reading the state may itself
/// move OPEN to HALF_OPEN once the recovery timeout has elapsed. The lock is never held
/// across the guarded call.
pub struct CircuitBreaker {
    name: String,
    config: BreakerConfig,
    counts_as_failure: FailurePredicate,
    inner: Mutex<BreakerInner>,
}

impl CircuitBreaker {
    pub fn new(name: impl Into<String>, config: BreakerConfig) -> Self {
        Self::with_predicate(name, config, transient_failures)
    }

    /// Breaker counting only errors accepted by `counts_as_failure`.
    pub fn with_predicate(
        name: impl Into<String>,
        config: BreakerConfig,
        counts_as_failure: FailurePredicate,
    ) -> Self {
        Self {
            name: name.into(),
            config,
            counts_as_failure,
            inner: Mutex::new(BreakerInner {
                state: CircuitState::Closed,
                failure_count: 0,
                last_failure: None,
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &BreakerConfig {
        &self.config
    }

    /// Current state (may transition OPEN → HALF_OPEN as a side effect).
    pub fn state(&self) -> CircuitState {
        let mut inner = self.inner.lock();
        self.refresh(&mut inner);
        inner.state
    }

    pub fn failure_count(&self) -> u32 {
        self.inner.lock().failure_count
    }

    pub fn snapshot(&self) -> BreakerSnapshot {
        let mut inner = self.inner.lock();
        self.refresh(&mut inner);
        BreakerSnapshot {
            name: self.name.clone(),
            state: inner.state,
            failure_count: inner.failure_count,
            since_last_failure: inner.last_failure.map(|at| at.elapsed()),
        }
    }

    fn refresh(&self, inner: &mut BreakerInner) {
        if inner.state != CircuitState::Open {
            return;
        }
        let recovered = inner
            .last_failure
            .is_none_or(|at| at.elapsed() >= self.config.recovery_timeout);
        if recovered {
            inner.state = CircuitState::HalfOpen;
            info!(service = %self.name, "Circuit half-open, allowing trial call");
        }
    }

    /// Admits a call or rejects it with [`PipelineError::CircuitOpen`].
    pub fn try_acquire(&self, operation: &str) -> PipelineResult<()> {
        let mut inner = self.inner.lock();
        self.refresh(&mut inner);
        if inner.state == CircuitState::Open {
            debug!(service = %self.name, operation = operation, "Circuit open, rejecting call");
            return Err(PipelineError::circuit_open(&self.name, operation));
        }
        Ok(())
    }

    pub fn record_success(&self) {
        let mut inner = self.inner.lock();
        if inner.state == CircuitState::HalfOpen {
            info!(service = %self.name, "Trial call succeeded, circuit closed");
        }
        inner.state = CircuitState::Closed;
        inner.failure_count = 0;
    }

    pub fn record_failure(&self) {
        let mut inner = self.inner.lock();
        inner.failure_count = inner.failure_count.saturating_add(1);
        inner.last_failure = Some(Instant::now());

        match inner.state {
            CircuitState::HalfOpen => {
                inner.state = CircuitState::Open;
                warn!(service = %self.name, "Trial call failed, circuit re-opened");
            }
            CircuitState::Closed if inner.failure_count >= self.config.failure_threshold => {
                inner.state = CircuitState::Open;
                warn!(
                    service = %self.name,
                    failures = inner.failure_count,
                    recovery_secs = self.config.recovery_timeout.as_secs_f64(),
                    "Failure threshold reached, circuit opened"
                );
            }
            _ => {}
        }
    }

    /// Runs `call` if the circuit admits it and records the outcome.
    ///
    /// Errors outside the configured failure family pass through without touching the
    /// counter.
    pub async fn call<F, Fut, T>(&self, operation: &str, call: F) -> PipelineResult<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = PipelineResult<T>>,
    {
        self.try_acquire(operation)?;

        match call().await {
            Ok(value) => {
                self.record_success();
                Ok(value)
            }
            Err(err) => {
                if (self.counts_as_failure)(&err) {
                    self.record_failure();
                } else {
                    debug!(
                        service = %self.name,
                        operation = operation,
                        category = %err.category(),
                        "Error outside breaker failure family, not counted"
                    );
                }
                Err(err)
            }
        }
    }
}

impl std::fmt::Debug for CircuitBreaker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("CircuitBreaker")
            .field("name", &self.name)
            .field("state", &inner.state)
            .field("failure_count", &inner.failure_count)
            .field("config", &self.config)
            .finish()
    }
}
