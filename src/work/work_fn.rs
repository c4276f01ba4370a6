//! # Function-backed work (`WorkFn`)
//!
//! [`WorkFn`] wraps a closure `F: Fn(CancellationToken) -> Fut`, producing a fresh
//! future per attempt. This avoids shared mutable state between attempts.
//!
//! ## Concurrency semantics
//! - Each attempt calls the closure again, so every future owns its own state.
//! - No hidden mutation between cycles; if shared state is needed, capture an
//!   `Arc<...>` explicitly inside the closure.
//!
//! ## Example
//! ```rust
//! use tokio_util::sync::CancellationToken;
//! use tickloop::{WorkFn, WorkRef, WorkError};
//!
//! let w: WorkRef = WorkFn::arc(|ctx: CancellationToken| async move {
//!     if ctx.is_cancelled() {
//!         return Err(WorkError::Canceled);
//!     }
//!     // do work...
//!     Ok::<_, WorkError>(())
//! });
//! ```

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::WorkError;
use crate::work::unit::Work;

/// Shared handle to a unit of work (`Arc<dyn Work>`).
pub type WorkRef = Arc<dyn Work>;

/// Function-backed work implementation.
///
/// Wraps a closure that *creates* a new future per attempt.
pub struct WorkFn<F> {
    f: F,
}

impl<F> WorkFn<F> {
    /// Creates a new function-backed unit of work.
    ///
    /// Prefer [`WorkFn::arc`] when you immediately need a [`WorkRef`].
    pub fn new(f: F) -> Self {
        Self { f }
    }

    /// Creates the work and returns it as a shared handle (`Arc<dyn Work>`).
    pub fn arc<Fut>(f: F) -> WorkRef
    where
        F: Fn(CancellationToken) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), WorkError>> + Send + 'static,
    {
        Arc::new(Self::new(f))
    }
}

#[async_trait]
impl<F, Fut> Work for WorkFn<F>
where
    F: Fn(CancellationToken) -> Fut + Send + Sync + 'static, // Fn, not FnMut
    Fut: Future<Output = Result<(), WorkError>> + Send + 'static,
{
    async fn run(&self, ctx: CancellationToken) -> Result<(), WorkError> {
        (self.f)(ctx).await
    }
}
