//! # Loop: state machine owning one recurring execution.
//!
//! A [`Loop`] wraps a unit of work and a [`LoopOptions`] bundle, and drives
//! the work on a fixed cadence via a background engine task.
//!
//! ## Lifecycle
//! ```text
//! Loop::new (Idle)
//!   ├─► start()   spawns the engine, resets execution_count to 0
//!   ├─► pause()   Running → Paused  (between cycles; in-flight attempt unaffected)
//!   ├─► resume()  Paused  → Running (wakes the parked engine directly)
//!   ├─► stop(t)   Running/Paused → Stopped; cancels, joins up to `t`,
//!   │             then reports on_stopped(execution_count)
//!   ├─► start()   Stopped → Running (fresh run, count reset)
//!   └─► dispose() any state → Disposed (terminal, idempotent)
//! ```
//!
//! ## Rules
//! - At most one attempt is in flight at any time for a given loop.
//! - Transitions are serialized by one mutex; `execution_count` reads are
//!   lock-free.
//! - `pause`/`resume`/`start` against an inapplicable state are no-ops;
//!   every mutating call on a Disposed loop fails.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use tickloop::{Loop, LoopOptions, WorkFn};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), tickloop::LoopError> {
//!     let work = WorkFn::arc(|_ctx| async { Ok(()) });
//!     let opts = LoopOptions::new(Duration::from_millis(5)).with_max_executions(2);
//!     let lp = Loop::new(work, opts)?;
//!
//!     lp.start()?;
//!     lp.stop(Some(Duration::from_secs(1))).await?;
//!     lp.dispose().await;
//!     Ok(())
//! }
//! ```

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;

use crate::error::LoopError;
use crate::loops::engine::{Engine, Shared};
use crate::loops::options::LoopOptions;
use crate::loops::state::LoopState;
use crate::work::WorkRef;

/// Bounded wait applied when `dispose()` has to force a stop.
const DISPOSE_GRACE: Duration = Duration::from_secs(5);

/// Poll step used by [`Loop::start_and_wait`].
const FIRST_CYCLE_POLL: Duration = Duration::from_millis(10);

/// Recurring executor for one unit of work.
///
/// Cheap to share behind an `Arc`; all control methods take `&self`.
/// `start()` must be called from within a tokio runtime (it spawns the
/// background engine task).
pub struct Loop {
    shared: Arc<Shared>,
}

impl Loop {
    /// Creates a loop in the `Idle` state, validating `options`.
    ///
    /// # Errors
    /// Returns [`LoopError::ZeroInterval`] when `options.interval` is zero.
    pub fn new(work: WorkRef, options: LoopOptions) -> Result<Self, LoopError> {
        options.validate()?;
        Ok(Self {
            shared: Shared::new(work, options),
        })
    }

    /// Current lifecycle state.
    pub fn state(&self) -> LoopState {
        self.shared.state()
    }

    /// Number of completed cycles in the current run (lock-free read).
    pub fn execution_count(&self) -> u64 {
        self.shared.executions()
    }

    /// Starts the loop.
    ///
    /// - `Idle`/`Stopped`: spawns a fresh engine task and resets the count.
    /// - `Paused`: equivalent to [`resume`](Loop::resume).
    /// - `Running`: no-op.
    ///
    /// # Errors
    /// Returns [`LoopError::Disposed`] after disposal.
    pub fn start(&self) -> Result<(), LoopError> {
        let mut lc = self.shared.lock();
        match lc.state {
            LoopState::Disposed => Err(LoopError::Disposed { what: "loop" }),
            LoopState::Running => Ok(()),
            LoopState::Paused => {
                lc.state = LoopState::Running;
                drop(lc);
                self.shared.state_changed.notify_waiters();
                Ok(())
            }
            LoopState::Idle | LoopState::Stopped => {
                self.shared.count.store(0, Ordering::Release);
                self.shared.stop_reported.store(false, Ordering::Release);

                let token = CancellationToken::new();
                lc.cancel = Some(token.clone());
                lc.state = LoopState::Running;
                lc.epoch += 1;

                // A previous run's handle may still be live after a timed-out
                // stop(); dropping it detaches the task, and the epoch fences
                // it off from this run's count, callbacks, and state.
                let _ = lc.handle.take();

                let engine = Engine::new(self.shared.clone(), token, lc.epoch);
                lc.handle = Some(tokio::spawn(engine.run()));
                log::debug!("loop started");
                Ok(())
            }
        }
    }

    /// Starts the loop and waits until the first cycle completes.
    ///
    /// The wait is bounded by `initial_delay + interval + 5s` and also ends
    /// early if the loop stops before completing a cycle.
    pub async fn start_and_wait(&self) -> Result<(), LoopError> {
        self.start()?;
        let opts = &self.shared.options;
        let deadline = Instant::now() + opts.initial_delay + opts.interval + Duration::from_secs(5);
        while self.execution_count() == 0 && Instant::now() < deadline {
            if !self.state().is_active() {
                break;
            }
            time::sleep(FIRST_CYCLE_POLL).await;
        }
        Ok(())
    }

    /// Pauses the loop. Takes effect between cycles; the in-flight attempt
    /// (if any) runs to completion and the execution count is preserved.
    ///
    /// No-op unless the loop is `Running`.
    pub fn pause(&self) -> Result<(), LoopError> {
        {
            let mut lc = self.shared.lock();
            if lc.state == LoopState::Disposed {
                return Err(LoopError::Disposed { what: "loop" });
            }
            if lc.state != LoopState::Running {
                return Ok(());
            }
            lc.state = LoopState::Paused;
        }
        self.shared.state_changed.notify_waiters();
        log::debug!("loop paused");
        Ok(())
    }

    /// Resumes a paused loop, waking the parked engine directly.
    ///
    /// No-op unless the loop is `Paused`.
    pub fn resume(&self) -> Result<(), LoopError> {
        {
            let mut lc = self.shared.lock();
            if lc.state == LoopState::Disposed {
                return Err(LoopError::Disposed { what: "loop" });
            }
            if lc.state != LoopState::Paused {
                return Ok(());
            }
            lc.state = LoopState::Running;
        }
        self.shared.state_changed.notify_waiters();
        log::debug!("loop resumed");
        Ok(())
    }

    /// Stops the loop: signals cancellation, joins the engine up to `timeout`
    /// (forever when `None`), then reports completion via `on_stopped` with
    /// the final execution count — even if the join timed out.
    ///
    /// No-op when the loop is not `Running`/`Paused` (a loop that already
    /// stopped on its own has reported `on_stopped` already).
    ///
    /// # Errors
    /// Returns [`LoopError::Disposed`] after disposal.
    pub async fn stop(&self, timeout: Option<Duration>) -> Result<(), LoopError> {
        let handle = {
            let mut lc = self.shared.lock();
            if lc.state == LoopState::Disposed {
                return Err(LoopError::Disposed { what: "loop" });
            }
            if !lc.state.is_active() {
                return Ok(());
            }
            lc.state = LoopState::Stopped;
            if let Some(cancel) = lc.cancel.take() {
                cancel.cancel();
            }
            lc.handle.take()
        };
        self.shared.state_changed.notify_waiters();

        if let Some(handle) = handle {
            join_engine(handle, timeout).await;
        }
        self.shared.report_stopped();
        log::debug!("loop stopped at {} executions", self.execution_count());
        Ok(())
    }

    /// Forces a stop (bounded 5s join) and releases the run handles.
    /// Terminal and idempotent; further mutating calls fail.
    pub async fn dispose(&self) {
        let handle = {
            let mut lc = self.shared.lock();
            if lc.state == LoopState::Disposed {
                return;
            }
            lc.state = LoopState::Disposed;
            if let Some(cancel) = lc.cancel.take() {
                cancel.cancel();
            }
            lc.handle.take()
        };
        self.shared.state_changed.notify_waiters();

        if let Some(handle) = handle {
            join_engine(handle, Some(DISPOSE_GRACE)).await;
        }
        log::debug!("loop disposed");
    }
}

/// Joins the engine task, detaching it when the wait times out. A stuck
/// non-cooperative attempt keeps its task alive until it next observes its
/// cancellation token; the loop is considered stopped regardless.
async fn join_engine(handle: JoinHandle<()>, timeout: Option<Duration>) {
    match timeout {
        Some(dur) => {
            if time::timeout(dur, handle).await.is_err() {
                log::warn!("loop engine did not exit within {dur:?}; detaching");
            }
        }
        None => {
            let _ = handle.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::WorkError;
    use crate::loops::context::ExecutionContext;
    use crate::loops::options::AnchorMode;
    use crate::work::WorkFn;
    use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
    use std::sync::Mutex;

    fn instant_work() -> WorkRef {
        WorkFn::arc(|_ctx| async { Ok(()) })
    }

    fn slow_work(dur: Duration) -> WorkRef {
        WorkFn::arc(move |_ctx| async move {
            time::sleep(dur).await;
            Ok(())
        })
    }

    #[derive(Default)]
    struct Probe {
        executed: Mutex<Vec<ExecutionContext>>,
        errors: Mutex<Vec<ExecutionContext>>,
        stopped: Mutex<Vec<u64>>,
    }

    impl Probe {
        fn wire(self: &Arc<Self>, opts: LoopOptions) -> LoopOptions {
            let (a, b, c) = (self.clone(), self.clone(), self.clone());
            opts.with_on_executed(move |ctx| a.executed.lock().unwrap().push(ctx.clone()))
                .with_on_error(move |ctx| b.errors.lock().unwrap().push(ctx.clone()))
                .with_on_stopped(move |n| c.stopped.lock().unwrap().push(n))
        }

        fn executed(&self) -> Vec<ExecutionContext> {
            self.executed.lock().unwrap().clone()
        }

        fn errors(&self) -> Vec<ExecutionContext> {
            self.errors.lock().unwrap().clone()
        }

        fn stopped(&self) -> Vec<u64> {
            self.stopped.lock().unwrap().clone()
        }
    }

    // Scenario: fixed interval, capped executions, instant success.
    #[tokio::test(start_paused = true)]
    async fn test_execution_cap_stops_cleanly() {
        let probe = Arc::new(Probe::default());
        let opts = probe.wire(
            LoopOptions::new(Duration::from_millis(100)).with_max_executions(5),
        );
        let lp = Loop::new(instant_work(), opts).unwrap();

        lp.start().unwrap();
        time::sleep(Duration::from_millis(600)).await;

        assert_eq!(lp.execution_count(), 5);
        assert_eq!(lp.state(), LoopState::Stopped);
        assert_eq!(probe.stopped(), vec![5]);
        assert!(probe.errors().is_empty());
        assert_eq!(probe.executed().len(), 5);

        // Stopping an already-stopped loop is a no-op and must not re-report.
        lp.stop(None).await.unwrap();
        assert_eq!(probe.stopped(), vec![5]);
    }

    // Scenario: work fails twice per cycle and succeeds on the third attempt.
    #[tokio::test(start_paused = true)]
    async fn test_retries_then_success_per_cycle() {
        let attempts = Arc::new(AtomicU32::new(0));
        let work = {
            let attempts = attempts.clone();
            WorkFn::arc(move |_ctx| {
                let n = attempts.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n % 3 < 2 {
                        Err(WorkError::fail("flaky"))
                    } else {
                        Ok(())
                    }
                }
            })
        };

        let probe = Arc::new(Probe::default());
        let opts = probe.wire(
            LoopOptions::new(Duration::from_millis(100))
                .with_max_retries(2)
                .with_retry_delay(Duration::from_millis(10))
                .with_max_executions(2),
        );
        let lp = Loop::new(work, opts).unwrap();

        lp.start().unwrap();
        time::sleep(Duration::from_millis(500)).await;

        assert_eq!(lp.execution_count(), 2);
        assert_eq!(lp.state(), LoopState::Stopped);

        let executed = probe.executed();
        assert_eq!(executed.len(), 2);
        for ctx in &executed {
            assert!(ctx.is_success());
            assert_eq!(ctx.retry_count, 2);
        }
        // Two failed attempts precede each success.
        assert_eq!(probe.errors().len(), 4);
        assert_eq!(probe.errors()[0].retry_count, 0);
        assert_eq!(probe.errors()[1].retry_count, 1);
    }

    // Retry bound: an always-failing work triggers on_error k+1 times per cycle.
    #[tokio::test(start_paused = true)]
    async fn test_retry_bound_exhausted_cycle_counts() {
        let work = WorkFn::arc(|_ctx| async { Err(WorkError::fail("always")) });
        let probe = Arc::new(Probe::default());
        let opts = probe.wire(
            LoopOptions::new(Duration::from_millis(100))
                .with_max_retries(3)
                .with_retry_delay(Duration::from_millis(5))
                .with_max_executions(2),
        );
        let lp = Loop::new(work, opts).unwrap();

        lp.start().unwrap();
        time::sleep(Duration::from_millis(500)).await;

        assert_eq!(lp.execution_count(), 2);
        assert_eq!(probe.errors().len(), 8);
        let executed = probe.executed();
        assert_eq!(executed.len(), 2);
        for ctx in &executed {
            assert!(!ctx.is_success());
            assert_eq!(ctx.retry_count, 3);
        }
    }

    // A single failing cycle halts the loop when continue_on_error is off.
    #[tokio::test(start_paused = true)]
    async fn test_halt_on_error_stops_loop() {
        let work = WorkFn::arc(|_ctx| async { Err(WorkError::fail("boom")) });
        let probe = Arc::new(Probe::default());
        let opts = probe.wire(
            LoopOptions::new(Duration::from_millis(100)).with_continue_on_error(false),
        );
        let lp = Loop::new(work, opts).unwrap();

        lp.start().unwrap();
        time::sleep(Duration::from_millis(500)).await;

        assert_eq!(lp.state(), LoopState::Stopped);
        assert_eq!(lp.execution_count(), 0);
        assert_eq!(probe.errors().len(), 1);
        assert!(probe.executed().is_empty());
        assert_eq!(probe.stopped(), vec![0]);
    }

    // Attempts never overlap, even when work outruns the interval.
    #[tokio::test(start_paused = true)]
    async fn test_cycles_never_overlap() {
        let in_flight = Arc::new(AtomicBool::new(false));
        let overlapped = Arc::new(AtomicBool::new(false));
        let work = {
            let (in_flight, overlapped) = (in_flight.clone(), overlapped.clone());
            WorkFn::arc(move |_ctx| {
                let (in_flight, overlapped) = (in_flight.clone(), overlapped.clone());
                async move {
                    if in_flight.swap(true, Ordering::SeqCst) {
                        overlapped.store(true, Ordering::SeqCst);
                    }
                    time::sleep(Duration::from_millis(150)).await;
                    in_flight.store(false, Ordering::SeqCst);
                    Ok(())
                }
            })
        };

        let opts = LoopOptions::new(Duration::from_millis(100))
            .with_anchor_mode(AnchorMode::FromExecutionStart)
            .with_max_executions(5);
        let lp = Loop::new(work, opts).unwrap();

        lp.start().unwrap();
        time::sleep(Duration::from_millis(1000)).await;

        assert_eq!(lp.execution_count(), 5);
        assert!(!overlapped.load(Ordering::SeqCst));
    }

    // Start-anchored scheduling subtracts cycle time; end-anchored does not.
    #[tokio::test(start_paused = true)]
    async fn test_anchor_mode_cadence() {
        let start_anchored = Loop::new(
            slow_work(Duration::from_millis(50)),
            LoopOptions::new(Duration::from_millis(100))
                .with_anchor_mode(AnchorMode::FromExecutionStart),
        )
        .unwrap();
        let end_anchored = Loop::new(
            slow_work(Duration::from_millis(50)),
            LoopOptions::new(Duration::from_millis(100))
                .with_anchor_mode(AnchorMode::FromExecutionEnd),
        )
        .unwrap();

        start_anchored.start().unwrap();
        end_anchored.start().unwrap();
        time::sleep(Duration::from_millis(1020)).await;

        // 100ms period vs 150ms period (50ms work + 100ms gap). Sampled
        // before stop(): joining lets an in-flight cycle complete and count.
        assert_eq!(start_anchored.execution_count(), 10);
        assert_eq!(end_anchored.execution_count(), 7);

        start_anchored.stop(None).await.unwrap();
        end_anchored.stop(None).await.unwrap();
    }

    // Pause preserves the count; resume continues from where it left off.
    #[tokio::test(start_paused = true)]
    async fn test_pause_resume_preserves_count() {
        let lp = Loop::new(
            instant_work(),
            LoopOptions::new(Duration::from_millis(100)),
        )
        .unwrap();

        lp.start().unwrap();
        time::sleep(Duration::from_millis(250)).await;
        let before = lp.execution_count();
        assert!(before >= 2);

        lp.pause().unwrap();
        assert_eq!(lp.state(), LoopState::Paused);
        time::sleep(Duration::from_millis(500)).await;
        assert_eq!(lp.execution_count(), before);

        lp.resume().unwrap();
        assert_eq!(lp.state(), LoopState::Running);
        time::sleep(Duration::from_millis(250)).await;
        assert!(lp.execution_count() > before);

        lp.stop(None).await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_initial_delay_honored_once() {
        let lp = Loop::new(
            instant_work(),
            LoopOptions::new(Duration::from_millis(100))
                .with_initial_delay(Duration::from_millis(200)),
        )
        .unwrap();

        lp.start().unwrap();
        time::sleep(Duration::from_millis(150)).await;
        assert_eq!(lp.execution_count(), 0);

        time::sleep(Duration::from_millis(100)).await;
        assert!(lp.execution_count() >= 1);

        lp.stop(None).await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_during_initial_delay() {
        let probe = Arc::new(Probe::default());
        let opts = probe.wire(
            LoopOptions::new(Duration::from_millis(100))
                .with_initial_delay(Duration::from_secs(10)),
        );
        let lp = Loop::new(instant_work(), opts).unwrap();

        lp.start().unwrap();
        time::sleep(Duration::from_millis(50)).await;
        lp.stop(None).await.unwrap();

        assert_eq!(lp.execution_count(), 0);
        assert_eq!(lp.state(), LoopState::Stopped);
        assert_eq!(probe.stopped(), vec![0]);
        assert!(probe.executed().is_empty());
    }

    // A timed-out attempt is an ordinary failure for the retry policy.
    #[tokio::test(start_paused = true)]
    async fn test_timeout_treated_as_failure() {
        let probe = Arc::new(Probe::default());
        let opts = probe.wire(
            LoopOptions::new(Duration::from_millis(100))
                .with_execution_timeout(Some(Duration::from_millis(100)))
                .with_max_executions(2),
        );
        let lp = Loop::new(slow_work(Duration::from_millis(500)), opts).unwrap();

        lp.start().unwrap();
        time::sleep(Duration::from_millis(600)).await;

        assert_eq!(lp.execution_count(), 2);
        assert_eq!(lp.state(), LoopState::Stopped);
        assert_eq!(probe.errors().len(), 2);
        for ctx in probe.errors() {
            assert!(matches!(ctx.error, Some(WorkError::Timeout { .. })));
        }
        for ctx in probe.executed() {
            assert!(!ctx.is_success());
        }
    }

    // A panicking on_executed callback is routed to on_error, not fatal.
    #[tokio::test(start_paused = true)]
    async fn test_callback_panic_routed_to_on_error() {
        let errors = Arc::new(AtomicUsize::new(0));
        let opts = {
            let errors = errors.clone();
            LoopOptions::new(Duration::from_millis(100))
                .with_max_executions(2)
                .with_on_executed(|_ctx| panic!("telemetry bug"))
                .with_on_error(move |ctx| {
                    assert!(!ctx.is_success());
                    errors.fetch_add(1, Ordering::SeqCst);
                })
        };
        let lp = Loop::new(instant_work(), opts).unwrap();

        lp.start().unwrap();
        time::sleep(Duration::from_millis(400)).await;

        assert_eq!(lp.execution_count(), 2);
        assert_eq!(lp.state(), LoopState::Stopped);
        assert_eq!(errors.load(Ordering::SeqCst), 2);
    }

    // Restart from Stopped spawns a fresh run with the count reset.
    #[tokio::test(start_paused = true)]
    async fn test_restart_resets_count() {
        let lp = Loop::new(
            instant_work(),
            LoopOptions::new(Duration::from_millis(100)).with_max_executions(2),
        )
        .unwrap();

        lp.start().unwrap();
        time::sleep(Duration::from_millis(300)).await;
        assert_eq!(lp.execution_count(), 2);
        assert_eq!(lp.state(), LoopState::Stopped);

        lp.start().unwrap();
        time::sleep(Duration::from_millis(10)).await;
        assert_eq!(lp.execution_count(), 1);

        time::sleep(Duration::from_millis(300)).await;
        assert_eq!(lp.execution_count(), 2);
        lp.dispose().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_inapplicable_transitions_are_noops() {
        let lp = Loop::new(
            instant_work(),
            LoopOptions::new(Duration::from_millis(100)),
        )
        .unwrap();

        // Nothing to pause/resume/stop yet.
        lp.pause().unwrap();
        assert_eq!(lp.state(), LoopState::Idle);
        lp.resume().unwrap();
        assert_eq!(lp.state(), LoopState::Idle);
        lp.stop(None).await.unwrap();
        assert_eq!(lp.state(), LoopState::Idle);

        lp.start().unwrap();
        // start() while Running is a no-op, not a restart.
        time::sleep(Duration::from_millis(150)).await;
        let count = lp.execution_count();
        lp.start().unwrap();
        assert_eq!(lp.execution_count(), count);
        lp.dispose().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_dispose_is_terminal_and_idempotent() {
        let lp = Loop::new(
            instant_work(),
            LoopOptions::new(Duration::from_millis(100)),
        )
        .unwrap();
        lp.start().unwrap();
        time::sleep(Duration::from_millis(150)).await;

        lp.dispose().await;
        assert_eq!(lp.state(), LoopState::Disposed);
        lp.dispose().await;
        assert_eq!(lp.state(), LoopState::Disposed);

        assert!(matches!(lp.start(), Err(LoopError::Disposed { .. })));
        assert!(matches!(lp.pause(), Err(LoopError::Disposed { .. })));
        assert!(matches!(lp.resume(), Err(LoopError::Disposed { .. })));
        assert!(matches!(
            lp.stop(None).await,
            Err(LoopError::Disposed { .. })
        ));
    }

    // A run detached by a timed-out stop() must not bleed into a restart.
    #[tokio::test(start_paused = true)]
    async fn test_detached_run_cannot_touch_restarted_run() {
        let first = Arc::new(AtomicBool::new(true));
        let work = {
            let first = first.clone();
            WorkFn::arc(move |_ctx| {
                let first = first.clone();
                async move {
                    if first.swap(false, Ordering::SeqCst) {
                        // Ignores its token: simulates stuck non-cooperative work.
                        time::sleep(Duration::from_secs(10)).await;
                    }
                    Ok(())
                }
            })
        };

        let probe = Arc::new(Probe::default());
        let opts = probe.wire(LoopOptions::new(Duration::from_millis(100)));
        let lp = Loop::new(work, opts).unwrap();

        lp.start().unwrap();
        // Yield so the spawned engine is polled into the stuck attempt.
        time::sleep(Duration::from_millis(1)).await;
        // The stuck attempt outlives the bounded join; the engine is detached.
        lp.stop(Some(Duration::from_millis(10))).await.unwrap();
        assert_eq!(lp.state(), LoopState::Stopped);
        assert_eq!(probe.stopped(), vec![0]);

        lp.start().unwrap();
        // Run well past the stuck attempt's completion at ~10s.
        time::sleep(Duration::from_millis(10_150)).await;

        // The detached engine exited without publishing Stopped over the new
        // run, counting its late cycle, or re-reporting on_stopped.
        assert_eq!(lp.state(), LoopState::Running);
        assert_eq!(lp.execution_count(), 102);
        assert_eq!(probe.executed().len(), 102);
        assert_eq!(probe.stopped(), vec![0]);

        lp.stop(None).await.unwrap();
    }

    // A brief pause during the inter-cycle gap must not shorten the gap.
    #[tokio::test(start_paused = true)]
    async fn test_pause_during_gap_keeps_interval() {
        let lp = Loop::new(
            instant_work(),
            LoopOptions::new(Duration::from_millis(1000)),
        )
        .unwrap();

        lp.start().unwrap();
        time::sleep(Duration::from_millis(50)).await;
        assert_eq!(lp.execution_count(), 1);

        lp.pause().unwrap();
        time::sleep(Duration::from_millis(10)).await;
        lp.resume().unwrap();

        // Resume lands back in the same gap: the second cycle still waits out
        // the full interval from the end of the first.
        time::sleep(Duration::from_millis(800)).await;
        assert_eq!(lp.execution_count(), 1);

        time::sleep(Duration::from_millis(200)).await;
        assert_eq!(lp.execution_count(), 2);

        lp.stop(None).await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_and_wait_sees_first_cycle() {
        let lp = Loop::new(
            instant_work(),
            LoopOptions::new(Duration::from_millis(100))
                .with_initial_delay(Duration::from_millis(200)),
        )
        .unwrap();

        lp.start_and_wait().await.unwrap();
        assert!(lp.execution_count() >= 1);
        lp.stop(None).await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_interval_rejected_at_construction() {
        let res = Loop::new(instant_work(), LoopOptions::new(Duration::ZERO));
        assert!(matches!(res, Err(LoopError::ZeroInterval)));
    }
}
