//! # Work abstraction.
//!
//! Defines the [`Work`] trait: an async, cancelable unit of work that a
//! [`Loop`](crate::Loop) invokes once per attempt.
//!
//! Work receives a [`CancellationToken`] and should periodically check it to
//! stop cooperatively. The scheduler cannot preempt non-cooperative work: a
//! configured execution timeout or a `stop()` request only takes effect
//! mid-attempt if the work itself polls or selects on the token.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::WorkError;

/// # Asynchronous, cancelable unit of work.
///
/// A `Work` implementation has an async [`run`](Work::run) method that receives a
/// [`CancellationToken`]. The token is a fresh child per attempt: it is cancelled
/// when the attempt's timeout elapses or when the owning loop is stopped.
/// Implementors should regularly check cancellation and exit promptly.
///
/// Returning [`WorkError::Canceled`] signals a graceful exit; it is never retried.
///
/// # Example
/// ```
/// use tokio_util::sync::CancellationToken;
/// use async_trait::async_trait;
/// use tickloop::{Work, WorkError};
///
/// struct Heartbeat;
///
/// #[async_trait]
/// impl Work for Heartbeat {
///     async fn run(&self, ctx: CancellationToken) -> Result<(), WorkError> {
///         if ctx.is_cancelled() {
///             return Err(WorkError::Canceled);
///         }
///         // do work...
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Work: Send + Sync + 'static {
    /// Executes one attempt until completion or cancellation.
    ///
    /// Implementations should check `ctx.is_cancelled()` (or select on
    /// `ctx.cancelled()`) and exit quickly to honor timeouts and shutdown.
    async fn run(&self, ctx: CancellationToken) -> Result<(), WorkError>;
}
