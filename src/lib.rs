//! # tickloop
//!
//! Recurring background execution for async Rust: run a unit of work on a
//! fixed interval with retries, per-attempt timeouts, pause/resume, and
//! lifecycle callbacks.
//!
//! ## Architecture
//! ```text
//!                 ┌─────────────────────────────┐
//!                 │         LoopManager         │
//!                 │  name → Loop  (registry,    │
//!                 │  bulk start/stop, dispose)  │
//!                 └──────────────┬──────────────┘
//!                                │
//!                         ┌──────▼──────┐
//!                         │    Loop     │  handle: start / pause /
//!                         │  (handle)   │  resume / stop / dispose
//!                         └──────┬──────┘
//!                                │ spawns per start()
//!                         ┌──────▼──────┐
//!                         │   engine    │  cycle loop: retries,
//!                         │   (task)    │  timeout, callbacks,
//!                         └──────┬──────┘  anchored scheduling
//!                                │
//!                         ┌──────▼──────┐
//!                         │    Work     │  async fn run(token)
//!                         └─────────────┘
//! ```
//!
//! ## Lifecycle
//! ```text
//! Idle ──start──► Running ◄──resume── Paused
//!                    │  ▲──pause──────────┘
//!                    │
//!          stop / cap / fatal cycle
//!                    │
//!                    ▼
//!                 Stopped ──start──► Running      (restart, count reset)
//!                    │
//!                 dispose
//!                    ▼
//!                 Disposed                        (terminal)
//! ```
//!
//! Each completed cycle invokes `on_executed` with an [`ExecutionContext`];
//! each failed attempt invokes `on_error`; `on_stopped` fires exactly once
//! per run with the final execution count. Work receives a
//! [`CancellationToken`](tokio_util::sync::CancellationToken) and should
//! return [`WorkError::Canceled`] when it observes cancellation mid-attempt.
//!
//! ## Quick start
//! ```rust
//! use std::time::Duration;
//! use tickloop::{Loop, LoopOptions, WorkFn};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let work = WorkFn::arc(|_ctx| async {
//!         println!("tick");
//!         Ok(())
//!     });
//!
//!     let opts = LoopOptions::new(Duration::from_millis(10))
//!         .with_max_retries(2)
//!         .with_retry_delay(Duration::from_millis(5))
//!         .with_max_executions(3)
//!         .with_on_stopped(|count| println!("done after {count} cycles"));
//!
//!     let lp = Loop::new(work, opts)?;
//!     lp.start()?;
//!     lp.stop(Some(Duration::from_secs(1))).await?;
//!     lp.dispose().await;
//!     Ok(())
//! }
//! ```

mod error;
mod loops;
mod manager;
mod work;

pub use error::{LoopError, WorkError};
pub use loops::{AnchorMode, ExecutionContext, Loop, LoopOptions, LoopState};
pub use manager::LoopManager;
pub use work::{Work, WorkFn, WorkRef};
