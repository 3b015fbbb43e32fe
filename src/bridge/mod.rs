//! Blocking entry points into the async pipeline.
//!
//! Worker code that is not async runs pipeline futures through [`ExecutionBridge::run`].
//! Each call builds a fresh current-thread runtime, drives the future to completion, and
//! drops the runtime. At most `max_concurrent` calls are active; further callers block
//! until a slot frees up. Calling from inside a running runtime is refused instead of
//! deadlocking or panicking.

use std::future::Future;

use parking_lot::{Condvar, Mutex};
use thiserror::Error;
use tracing::debug;

use crate::config::BridgeConfig;
use crate::constants::SERVICE_BRIDGE;
use crate::error::{ErrorCategory, PipelineError};

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("blocking bridge called from inside a running async runtime; await the async API instead")]
    NestedRuntime,

    #[error("failed to build bridge runtime: {reason}")]
    RuntimeBuild { reason: String },
}

impl BridgeError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            BridgeError::NestedRuntime => ErrorCategory::Permanent,
            BridgeError::RuntimeBuild { .. } => ErrorCategory::Transient,
        }
    }

    pub fn into_pipeline(self, operation: &str) -> PipelineError {
        PipelineError::categorized(self.category(), SERVICE_BRIDGE, operation, self.to_string())
    }
}

/// Bounded executor running futures to completion on per-call runtimes.
pub struct ExecutionBridge {
    max_concurrent: usize,
    active: Mutex<usize>,
    released: Condvar,
}

impl ExecutionBridge {
    pub fn new(config: BridgeConfig) -> Self {
        Self {
            max_concurrent: config.max_concurrent.max(1),
            active: Mutex::new(0),
            released: Condvar::new(),
        }
    }

    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    /// Calls currently holding a slot.
    pub fn active(&self) -> usize {
        *self.active.lock()
    }

    /// Runs `future` to completion on a fresh current-thread runtime.
    pub fn run<F: Future>(&self, future: F) -> Result<F::Output, BridgeError> {
        if tokio::runtime::Handle::try_current().is_ok() {
            return Err(BridgeError::NestedRuntime);
        }

        let _slot = self.acquire();
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| BridgeError::RuntimeBuild {
                reason: e.to_string(),
            })?;

        Ok(runtime.block_on(future))
    }

    fn acquire(&self) -> Slot<'_> {
        let mut active = self.active.lock();
        while *active >= self.max_concurrent {
            debug!(active = *active, max = self.max_concurrent, "Bridge saturated, waiting");
            self.released.wait(&mut active);
        }
        *active += 1;
        Slot { bridge: self }
    }
}

impl Default for ExecutionBridge {
    fn default() -> Self {
        Self::new(BridgeConfig::default())
    }
}

impl std::fmt::Debug for ExecutionBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionBridge")
            .field("max_concurrent", &self.max_concurrent)
            .field("active", &self.active())
            .finish()
    }
}

struct Slot<'a> {
    bridge: &'a ExecutionBridge,
}

impl Drop for Slot<'_> {
    fn drop(&mut self) {
        let mut active = self.bridge.active.lock();
        *active = active.saturating_sub(1);
        self.bridge.released.notify_one();
    }
}
