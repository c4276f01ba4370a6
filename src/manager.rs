//! # LoopManager: registry of named loops.
//!
//! A [`LoopManager`] owns a mapping from unique name to [`Loop`] and provides
//! centralized lifecycle control: register, start/stop individually or in
//! bulk, remove, and dispose.
//!
//! ## Architecture
//! ```text
//! LoopManager
//!   ├─ loops: RwLock<HashMap<name, Arc<Loop>>>     (concurrent reads/writes)
//!   ├─ register(name, work, options)  → conflict error on duplicate
//!   ├─ start/stop(name)               → no-op for unknown names
//!   ├─ start_all / stop_all           → snapshot, fan out concurrently
//!   ├─ remove(name)                   → stop (bounded) → dispose → Ok(existed)
//!   └─ dispose()                      → stop+dispose everything, swallow failures
//! ```
//!
//! ## Rules
//! - Names are unique; a duplicate `register` fails without mutating state.
//! - Bulk operations iterate a **snapshot**, so concurrent register/remove
//!   never invalidates them.
//! - `stop_all` and `dispose` fan out concurrently: one slow loop does not
//!   serialize the shutdown of the others.
//! - Mutating calls on a disposed manager fail; `dispose` itself is idempotent.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tokio::sync::RwLock;

use crate::error::LoopError;
use crate::loops::{Loop, LoopOptions, LoopState};
use crate::work::WorkRef;

/// Bounded per-loop wait used by `remove` and `dispose`.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Registry of named [`Loop`]s with bulk lifecycle control.
pub struct LoopManager {
    loops: RwLock<HashMap<String, Arc<Loop>>>,
    disposed: AtomicBool,
}

impl Default for LoopManager {
    fn default() -> Self {
        Self::new()
    }
}

impl LoopManager {
    /// Creates an empty manager.
    pub fn new() -> Self {
        Self {
            loops: RwLock::new(HashMap::new()),
            disposed: AtomicBool::new(false),
        }
    }

    fn ensure_live(&self) -> Result<(), LoopError> {
        if self.disposed.load(Ordering::Acquire) {
            Err(LoopError::Disposed { what: "manager" })
        } else {
            Ok(())
        }
    }

    async fn get(&self, name: &str) -> Option<Arc<Loop>> {
        self.loops.read().await.get(name).cloned()
    }

    async fn snapshot(&self) -> Vec<Arc<Loop>> {
        self.loops.read().await.values().cloned().collect()
    }

    /// Constructs a new [`Loop`] in the `Idle` state and stores it under `name`.
    ///
    /// # Errors
    /// - [`LoopError::DuplicateName`] when the name is taken; the registry is
    ///   left unchanged.
    /// - [`LoopError::ZeroInterval`] when the options are invalid.
    /// - [`LoopError::Disposed`] after disposal.
    pub async fn register(
        &self,
        name: impl Into<String>,
        work: WorkRef,
        options: LoopOptions,
    ) -> Result<(), LoopError> {
        self.ensure_live()?;
        let name = name.into();
        let lp = Arc::new(Loop::new(work, options)?);

        let mut loops = self.loops.write().await;
        if loops.contains_key(&name) {
            drop(loops);
            // Never started, so disposal is immediate.
            lp.dispose().await;
            return Err(LoopError::DuplicateName { name });
        }
        loops.insert(name, lp);
        Ok(())
    }

    /// Starts the named loop; unknown names are a no-op.
    pub async fn start(&self, name: &str) -> Result<(), LoopError> {
        self.ensure_live()?;
        if let Some(lp) = self.get(name).await {
            lp.start()?;
        }
        Ok(())
    }

    /// Starts every registered loop.
    pub async fn start_all(&self) -> Result<(), LoopError> {
        self.ensure_live()?;
        for lp in self.snapshot().await {
            lp.start()?;
        }
        Ok(())
    }

    /// Stops the named loop, waiting up to `timeout`; unknown names are a no-op.
    pub async fn stop(&self, name: &str, timeout: Option<Duration>) -> Result<(), LoopError> {
        self.ensure_live()?;
        if let Some(lp) = self.get(name).await {
            lp.stop(timeout).await?;
        }
        Ok(())
    }

    /// Stops every registered loop concurrently, waiting up to `timeout` per
    /// loop, so one slow loop does not delay the others.
    pub async fn stop_all(&self, timeout: Option<Duration>) -> Result<(), LoopError> {
        self.ensure_live()?;
        let snapshot = self.snapshot().await;
        let results = join_all(snapshot.iter().map(|lp| lp.stop(timeout))).await;
        for res in results {
            if let Err(err) = res {
                log::warn!("stop_all: {}", err.as_message());
            }
        }
        Ok(())
    }

    /// Stops (bounded wait), disposes, and removes the named loop.
    ///
    /// Returns whether the name existed.
    pub async fn remove(&self, name: &str) -> Result<bool, LoopError> {
        self.ensure_live()?;
        let Some(lp) = self.loops.write().await.remove(name) else {
            return Ok(false);
        };
        if let Err(err) = lp.stop(Some(SHUTDOWN_GRACE)).await {
            log::warn!("remove '{name}': stop failed: {}", err.as_message());
        }
        lp.dispose().await;
        Ok(true)
    }

    /// Returns the state of the named loop, or `None` when not registered.
    pub async fn state(&self, name: &str) -> Option<LoopState> {
        self.loops.read().await.get(name).map(|lp| lp.state())
    }

    /// Returns the sorted list of registered names.
    pub async fn names(&self) -> Vec<String> {
        let loops = self.loops.read().await;
        let mut names: Vec<String> = loops.keys().cloned().collect();
        names.sort_unstable();
        names
    }

    /// Returns true when no loops are registered.
    pub async fn is_empty(&self) -> bool {
        self.loops.read().await.is_empty()
    }

    /// Stops and disposes every remaining loop concurrently, swallowing
    /// individual failures, then clears the registry. Idempotent.
    pub async fn dispose(&self) {
        if self.disposed.swap(true, Ordering::AcqRel) {
            return;
        }
        let drained: Vec<(String, Arc<Loop>)> =
            { self.loops.write().await.drain().collect() };

        join_all(drained.iter().map(|(name, lp)| async move {
            if let Err(err) = lp.stop(Some(SHUTDOWN_GRACE)).await {
                log::warn!("dispose '{name}': stop failed: {}", err.as_message());
            }
            lp.dispose().await;
        }))
        .await;
        log::debug!("manager disposed ({} loops)", drained.len());
    }
}
