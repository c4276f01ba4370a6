//! # Run a single attempt of the unit of work.
//!
//! Executes one attempt of a [`Work`] with an optional timeout.
//!
//! ## Flow
//! ```text
//! Success:
//!   work.run(child) → Ok(())
//!
//! Failure:
//!   work.run(child) → Err(Fail)            (retryable)
//!
//! Timeout:
//!   timeout exceeded → cancel child → Err(Timeout)   (retryable)
//!
//! Cancellation:
//!   work observes token → Err(Canceled)    (graceful, never retried)
//! ```
//!
//! ## Rules
//! - Derives a **child token** per attempt (isolated cancellation).
//! - Parent cancellation propagates to the child; child cancellation (from a
//!   timeout) does **not** affect the parent.
//! - A timeout is reported as [`WorkError::Timeout`] and is not distinguished
//!   from an ordinary failure by the retry policy.

use std::panic::AssertUnwindSafe;
use std::time::Duration;

use futures::FutureExt;
use tokio::time;
use tokio_util::sync::CancellationToken;

use crate::error::WorkError;
use crate::loops::engine::panic_message;
use crate::work::Work;

/// Executes a single attempt of `work` with an optional timeout.
///
/// If `timeout` is `Some(dur)` the attempt races `tokio::time::timeout`; on
/// expiry the attempt future is dropped, the child token is cancelled (so any
/// sub-tasks the work spawned unwind promptly), and [`WorkError::Timeout`] is
/// returned.
pub(crate) async fn run_attempt<W: Work + ?Sized>(
    work: &W,
    parent: &CancellationToken,
    timeout: Option<Duration>,
) -> Result<(), WorkError> {
    let child = parent.child_token();

    // Panics inside the work are captured into the attempt result; a failing
    // unit of work is never fatal to the host process.
    let fut = AssertUnwindSafe(work.run(child.clone())).catch_unwind();

    let res = match timeout {
        Some(dur) => match time::timeout(dur, fut).await {
            Ok(res) => res,
            Err(_elapsed) => {
                child.cancel();
                return Err(WorkError::Timeout { timeout: dur });
            }
        },
        None => fut.await,
    };

    match res {
        Ok(res) => res,
        Err(payload) => Err(WorkError::fail(format!(
            "work panicked: {}",
            panic_message(payload.as_ref())
        ))),
    }
}
