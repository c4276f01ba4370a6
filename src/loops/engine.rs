//! # Loop engine: the background execution path of one [`Loop`](crate::Loop).
//!
//! One engine task is spawned per `start()`. It owns the per-cycle algorithm:
//! initial delay, pause gate, retry loop, callback dispatch, and inter-cycle
//! scheduling.
//!
//! ## Cycle flow
//! ```text
//! loop {
//!   ├─► pause gate (parked on Notify until resume()/cancel)
//!   ├─► stop cleanly if max_execution_count reached
//!   ├─► for retry in 0..=max_retry_count:
//!   │     ├─► sleep retry_delay (cancellable) when retry > 0
//!   │     ├─► run_attempt(work, timeout)
//!   │     │     ├─ Ok        ─► final context, break
//!   │     │     ├─ Canceled  ─► exit engine (cycle not counted)
//!   │     │     └─ Fail/Timeout ─► on_error(ctx)
//!   │     │            └─ exhausted + !continue_on_error ─► halt loop
//!   ├─► increment execution_count, on_executed(final ctx)
//!   └─► inter-cycle wait per anchor_mode (cancellable, pause keeps the deadline)
//! }
//! ```
//!
//! ## Rules
//! - Cycles run **sequentially**: cycle *n+1* never begins before cycle *n*'s
//!   retries are exhausted and its callbacks have returned.
//! - Cancellation is checked at **safe points**: initial delay, retry delay,
//!   pause park, inter-cycle sleep. Mid-attempt cancellation relies on the
//!   work honoring its token.
//! - Callback panics are caught and routed to `on_error`; they never crash
//!   the engine.
//! - `on_stopped` fires **exactly once per run**, guarded by an atomic flag
//!   shared with [`Loop::stop`](crate::Loop::stop).
//! - Every run carries an **epoch**: an engine detached by a timed-out stop
//!   becomes inert the moment a restart supersedes it.

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;

use crate::loops::attempt::run_attempt;
use crate::loops::context::ExecutionContext;
use crate::loops::options::{AnchorMode, LoopOptions};
use crate::loops::state::LoopState;
use crate::work::WorkRef;

/// Mutable lifecycle slot: state plus the handles of the current run.
///
/// Guarded by one mutex per loop so that no two threads are mid-transition
/// on the same loop simultaneously.
pub(crate) struct Lifecycle {
    pub(crate) state: LoopState,
    pub(crate) cancel: Option<CancellationToken>,
    pub(crate) handle: Option<JoinHandle<()>>,
    /// Monotonic run counter; engines from superseded runs fence on it.
    pub(crate) epoch: u64,
}

/// State shared between the [`Loop`](crate::Loop) handle and its engine task.
pub(crate) struct Shared {
    pub(crate) work: WorkRef,
    pub(crate) options: LoopOptions,
    pub(crate) lifecycle: Mutex<Lifecycle>,
    /// Completed-cycle counter; readable lock-free for telemetry.
    pub(crate) count: AtomicU64,
    /// Woken by `pause()`/`resume()`/`stop()` so parked waits re-check state.
    pub(crate) state_changed: Notify,
    /// Ensures `on_stopped` fires once per run; reset by `start()`.
    pub(crate) stop_reported: AtomicBool,
}

impl Shared {
    pub(crate) fn new(work: WorkRef, options: LoopOptions) -> Arc<Self> {
        Arc::new(Self {
            work,
            options,
            lifecycle: Mutex::new(Lifecycle {
                state: LoopState::Idle,
                cancel: None,
                handle: None,
                epoch: 0,
            }),
            count: AtomicU64::new(0),
            state_changed: Notify::new(),
            stop_reported: AtomicBool::new(false),
        })
    }

    /// Locks the lifecycle slot, recovering from a poisoned mutex.
    pub(crate) fn lock(&self) -> MutexGuard<'_, Lifecycle> {
        self.lifecycle.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Current state (brief lock).
    pub(crate) fn state(&self) -> LoopState {
        self.lock().state
    }

    /// Completed-cycle count (lock-free).
    pub(crate) fn executions(&self) -> u64 {
        self.count.load(Ordering::Acquire)
    }

    /// Invokes `on_stopped` with the final count, at most once per run.
    pub(crate) fn report_stopped(&self) {
        if self.stop_reported.swap(true, Ordering::AcqRel) {
            return;
        }
        let count = self.executions();
        if let Some(cb) = &self.options.on_stopped {
            if let Err(payload) = catch_unwind(AssertUnwindSafe(|| cb(count))) {
                log::warn!(
                    "on_stopped callback panicked: {}",
                    panic_message(payload.as_ref())
                );
            }
        }
    }

    /// Invokes `on_error`; a panicking error callback is only logged.
    pub(crate) fn emit_error(&self, ctx: &ExecutionContext) {
        if let Some(cb) = &self.options.on_error {
            if let Err(payload) = catch_unwind(AssertUnwindSafe(|| cb(ctx))) {
                log::warn!(
                    "on_error callback panicked: {}",
                    panic_message(payload.as_ref())
                );
            }
        }
    }

    /// Invokes `on_executed`; a panic is captured and routed to `on_error`.
    pub(crate) fn emit_executed(&self, ctx: &ExecutionContext) {
        let Some(cb) = &self.options.on_executed else {
            return;
        };
        if let Err(payload) = catch_unwind(AssertUnwindSafe(|| cb(ctx))) {
            let msg = panic_message(payload.as_ref());
            log::warn!("on_executed callback panicked: {msg}");
            let err_ctx = ExecutionContext::failure(
                ctx.execution_count,
                ctx.retry_count,
                ctx.elapsed,
                crate::error::WorkError::fail(msg),
            );
            self.emit_error(&err_ctx);
        }
    }
}

/// Renders a panic payload into a log-friendly message.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "panicked (non-string payload)".to_string()
    }
}

/// Outcome of a cancellable wait.
enum Flow {
    Continue,
    Exit,
}

/// Background execution path of one loop run.
pub(crate) struct Engine {
    shared: Arc<Shared>,
    token: CancellationToken,
    epoch: u64,
}

impl Engine {
    pub(crate) fn new(shared: Arc<Shared>, token: CancellationToken, epoch: u64) -> Self {
        Self {
            shared,
            token,
            epoch,
        }
    }

    /// True while no later `start()` has superseded this engine's run.
    ///
    /// A timed-out `stop()` detaches the engine but cannot kill its stuck
    /// attempt; once a restart bumps the epoch, the detached engine must not
    /// touch the count, the callbacks, or the published state.
    fn is_current(&self) -> bool {
        self.shared.lock().epoch == self.epoch
    }

    /// Runs until cancellation, execution-cap exhaustion, or a fatal cycle.
    pub(crate) async fn run(self) {
        let natural = self.drive().await;
        self.finish(natural);
    }

    /// Main cycle loop. Returns `true` when the loop terminated on its own
    /// (cap reached or fatal cycle failure), in which case the engine reports
    /// `on_stopped`; cancellation-driven exits leave reporting to `stop()`.
    async fn drive(&self) -> bool {
        let opts = &self.shared.options;

        if opts.initial_delay > Duration::ZERO
            && matches!(self.wait(opts.initial_delay).await, Flow::Exit)
        {
            return false;
        }

        loop {
            if self.shared.state() == LoopState::Paused
                && matches!(self.wait_resumed().await, Flow::Exit)
            {
                return false;
            }
            if self.token.is_cancelled() {
                return false;
            }
            if let Some(max) = opts.max_execution_count {
                if self.shared.executions() >= max {
                    log::debug!("execution cap {max} reached");
                    return true;
                }
            }

            let cycle_start = Instant::now();
            let cycle_no = self.shared.executions() + 1;
            let mut outcome: Option<ExecutionContext> = None;
            let mut fatal = false;

            for retry in 0..=opts.max_retry_count {
                if retry > 0 && matches!(self.wait(opts.retry_delay).await, Flow::Exit) {
                    return false;
                }

                let attempt_start = Instant::now();
                let res =
                    run_attempt(self.shared.work.as_ref(), &self.token, opts.attempt_timeout())
                        .await;
                let elapsed = attempt_start.elapsed();

                // A late attempt of a superseded run must not leak into the
                // new run's count or callbacks.
                if !self.is_current() {
                    return false;
                }

                match res {
                    Ok(()) => {
                        outcome = Some(ExecutionContext::success(cycle_no, retry, elapsed));
                        break;
                    }
                    Err(err) if !err.is_retryable() => {
                        // Cooperative cancellation: the cycle did not complete,
                        // so it is neither counted nor reported via on_executed.
                        return false;
                    }
                    Err(err) => {
                        let ctx = ExecutionContext::failure(cycle_no, retry, elapsed, err);
                        self.shared.emit_error(&ctx);
                        if retry == opts.max_retry_count {
                            fatal = !opts.continue_on_error;
                            outcome = Some(ctx);
                        } else {
                            log::debug!(
                                "cycle {cycle_no}: attempt {retry} failed, retrying in {:?}",
                                opts.retry_delay
                            );
                        }
                    }
                }
            }

            let Some(ctx) = outcome else { return false };

            if fatal {
                // Retries exhausted and the loop is configured to halt: the
                // failed cycle is not counted and on_executed is skipped.
                log::debug!("cycle {cycle_no}: retries exhausted, halting loop");
                return true;
            }

            {
                // Increment under the lock so a concurrent restart cannot
                // reset the count between the epoch check and the add.
                let lc = self.shared.lock();
                if lc.epoch != self.epoch {
                    return false;
                }
                self.shared.count.fetch_add(1, Ordering::AcqRel);
            }
            self.shared.emit_executed(&ctx);

            let gap = match opts.anchor_mode {
                // Negative remainders clamp to zero: the next cycle starts
                // immediately when work outran the interval.
                AnchorMode::FromExecutionStart => {
                    opts.interval.saturating_sub(cycle_start.elapsed())
                }
                AnchorMode::FromExecutionEnd => opts.interval,
            };
            if gap > Duration::ZERO {
                if matches!(self.idle(gap).await, Flow::Exit) {
                    return false;
                }
            } else if self.token.is_cancelled() {
                return false;
            }
        }
    }

    /// Cancellable sleep for the initial delay and retry delays.
    async fn wait(&self, dur: Duration) -> Flow {
        tokio::select! {
            _ = time::sleep(dur) => Flow::Continue,
            _ = self.token.cancelled() => Flow::Exit,
        }
    }

    /// Inter-cycle sleep: interruptible by cancellation, parked on pause with
    /// the deadline intact. A resume before the deadline waits out the rest of
    /// the gap; a resume after it starts the next cycle immediately.
    async fn idle(&self, dur: Duration) -> Flow {
        let sleep = time::sleep(dur);
        tokio::pin!(sleep);
        loop {
            let notified = self.shared.state_changed.notified();
            tokio::pin!(notified);
            // Checked after arming `notified` so a concurrent pause is never missed.
            if self.shared.state() == LoopState::Paused {
                // The sleep deadline stays armed across the pause: a pause
                // shorter than the remaining gap never shortens the interval,
                // and one that outlasts it resumes into an immediate cycle.
                if matches!(self.wait_resumed().await, Flow::Exit) {
                    return Flow::Exit;
                }
                continue;
            }
            tokio::select! {
                _ = &mut sleep => return Flow::Continue,
                _ = self.token.cancelled() => return Flow::Exit,
                _ = &mut notified => {}
            }
        }
    }

    /// Parks until `resume()` flips the state back to Running, or cancellation.
    async fn wait_resumed(&self) -> Flow {
        loop {
            let notified = self.shared.state_changed.notified();
            tokio::pin!(notified);
            match self.shared.state() {
                LoopState::Paused => {}
                LoopState::Running => return Flow::Continue,
                _ => return Flow::Exit,
            }
            tokio::select! {
                _ = &mut notified => {}
                _ = self.token.cancelled() => return Flow::Exit,
            }
        }
    }

    /// Terminal bookkeeping. Natural exits report `on_stopped` before the
    /// Stopped state becomes visible, so a restart cannot race the report.
    fn finish(&self, natural: bool) {
        if natural {
            if !self.is_current() {
                return;
            }
            self.shared.report_stopped();
        }
        {
            let mut lc = self.shared.lock();
            if lc.epoch == self.epoch && lc.state != LoopState::Disposed {
                lc.state = LoopState::Stopped;
            }
        }
        log::debug!("loop engine exited (natural={natural})");
    }
}
