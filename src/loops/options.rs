//! # Loop configuration.
//!
//! Defines [`LoopOptions`], the configuration bundle describing how a
//! [`Loop`](crate::Loop) schedules and supervises its unit of work, and
//! [`AnchorMode`], the policy for computing the gap before the next cycle.
//!
//! Options are immutable once the loop is created. They are validated at
//! [`Loop::new`](crate::Loop::new); an invalid configuration (zero interval)
//! is rejected immediately rather than surfacing at runtime.
//!
//! ## Sentinel values
//! - `execution_timeout = Some(0s)` → treated as no timeout (normalized to `None`)
//! - `max_execution_count = None` → unlimited
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use tickloop::{AnchorMode, LoopOptions};
//!
//! let opts = LoopOptions::new(Duration::from_secs(2))
//!     .with_initial_delay(Duration::from_millis(500))
//!     .with_anchor_mode(AnchorMode::FromExecutionStart)
//!     .with_max_retries(3)
//!     .with_retry_delay(Duration::from_millis(100))
//!     .with_max_executions(10)
//!     .with_on_executed(|ctx| println!("cycle {} done", ctx.execution_count));
//!
//! assert_eq!(opts.interval, Duration::from_secs(2));
//! assert_eq!(opts.max_retry_count, 3);
//! ```

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::error::LoopError;
use crate::loops::context::ExecutionContext;

/// Callback receiving a per-attempt or per-cycle [`ExecutionContext`].
pub(crate) type ContextHook = Arc<dyn Fn(&ExecutionContext) + Send + Sync>;

/// Callback receiving the final execution count when the loop stops.
pub(crate) type StoppedHook = Arc<dyn Fn(u64) + Send + Sync>;

/// Policy for computing the gap before the next cycle.
///
/// Determines drift behavior:
/// - [`AnchorMode::FromExecutionStart`] favors a fixed wall-clock cadence.
///   The wait is `interval - elapsed_of_whole_cycle`, clamped to zero, so
///   cycles may run back-to-back when work exceeds the interval. No catch-up
///   executions are scheduled for missed slots.
/// - [`AnchorMode::FromExecutionEnd`] guarantees a minimum idle gap: the full
///   `interval` is waited after the cycle (work plus retries) completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnchorMode {
    /// Schedule relative to when the current cycle began.
    FromExecutionStart,
    /// Schedule relative to when the current cycle ended (default).
    FromExecutionEnd,
}

impl Default for AnchorMode {
    /// Returns [`AnchorMode::FromExecutionEnd`].
    fn default() -> Self {
        AnchorMode::FromExecutionEnd
    }
}

/// Configuration for a recurring [`Loop`](crate::Loop).
///
/// All tunables in one place:
/// - **Cadence**: `interval`, `initial_delay`, `anchor_mode`
/// - **Retry policy**: `max_retry_count`, `retry_delay`, `continue_on_error`
/// - **Bounds**: `execution_timeout`, `max_execution_count`
/// - **Telemetry**: `on_executed`, `on_error`, `on_stopped` callbacks
///
/// Callbacks run synchronously on the loop's own execution path; panics from
/// callbacks are caught and routed to `on_error`, never crashing the loop.
#[derive(Clone)]
pub struct LoopOptions {
    /// Duration between executions (required, must be > 0).
    pub interval: Duration,
    /// Duration to wait before the first execution.
    pub initial_delay: Duration,
    /// Whether the next cycle is scheduled from the current cycle's start or end.
    pub anchor_mode: AnchorMode,
    /// Number of additional attempts after an initial failure within one cycle.
    pub max_retry_count: u32,
    /// Duration between retry attempts.
    pub retry_delay: Duration,
    /// Whether the loop proceeds to its next cycle after exhausting retries.
    /// If `false`, an exhausted cycle terminates the loop.
    pub continue_on_error: bool,
    /// Optional per-attempt timeout; an attempt exceeding it is cancelled and
    /// treated as a failure.
    pub execution_timeout: Option<Duration>,
    /// Optional cap on completed cycles; the loop stops cleanly once reached.
    pub max_execution_count: Option<u64>,

    pub(crate) on_executed: Option<ContextHook>,
    pub(crate) on_error: Option<ContextHook>,
    pub(crate) on_stopped: Option<StoppedHook>,
}

impl Default for LoopOptions {
    /// Defaults: `interval = 1s`, no initial delay, end-anchored scheduling,
    /// no retries, `retry_delay = 5s`, `continue_on_error = true`, no timeout,
    /// no execution cap, no callbacks.
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            initial_delay: Duration::ZERO,
            anchor_mode: AnchorMode::default(),
            max_retry_count: 0,
            retry_delay: Duration::from_secs(5),
            continue_on_error: true,
            execution_timeout: None,
            max_execution_count: None,
            on_executed: None,
            on_error: None,
            on_stopped: None,
        }
    }
}

impl LoopOptions {
    /// Creates options with the given interval and all other fields at their defaults.
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            ..Self::default()
        }
    }

    /// Sets the delay before the first execution.
    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Sets the interval-anchoring mode.
    pub fn with_anchor_mode(mut self, mode: AnchorMode) -> Self {
        self.anchor_mode = mode;
        self
    }

    /// Sets the number of additional attempts after an initial failure.
    pub fn with_max_retries(mut self, count: u32) -> Self {
        self.max_retry_count = count;
        self
    }

    /// Sets the delay between retry attempts.
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Sets whether the loop survives a cycle whose retries are exhausted.
    pub fn with_continue_on_error(mut self, cont: bool) -> Self {
        self.continue_on_error = cont;
        self
    }

    /// Sets the per-attempt timeout (`None` = unlimited).
    pub fn with_execution_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.execution_timeout = timeout;
        self
    }

    /// Sets the cap on completed cycles (`None` = unlimited).
    pub fn with_max_executions(mut self, count: u64) -> Self {
        self.max_execution_count = Some(count);
        self
    }

    /// Sets the callback invoked with the final context of each completed cycle.
    pub fn with_on_executed(mut self, f: impl Fn(&ExecutionContext) + Send + Sync + 'static) -> Self {
        self.on_executed = Some(Arc::new(f));
        self
    }

    /// Sets the callback invoked for every failed attempt (and for callback panics).
    pub fn with_on_error(mut self, f: impl Fn(&ExecutionContext) + Send + Sync + 'static) -> Self {
        self.on_error = Some(Arc::new(f));
        self
    }

    /// Sets the callback invoked once per run when the loop stops, with the
    /// final execution count.
    pub fn with_on_stopped(mut self, f: impl Fn(u64) + Send + Sync + 'static) -> Self {
        self.on_stopped = Some(Arc::new(f));
        self
    }

    /// Returns the per-attempt timeout with the zero sentinel normalized away.
    pub(crate) fn attempt_timeout(&self) -> Option<Duration> {
        self.execution_timeout.filter(|d| *d > Duration::ZERO)
    }

    /// Validates the configuration, rejecting a non-positive interval.
    pub(crate) fn validate(&self) -> Result<(), LoopError> {
        if self.interval == Duration::ZERO {
            return Err(LoopError::ZeroInterval);
        }
        Ok(())
    }
}

impl fmt::Debug for LoopOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoopOptions")
            .field("interval", &self.interval)
            .field("initial_delay", &self.initial_delay)
            .field("anchor_mode", &self.anchor_mode)
            .field("max_retry_count", &self.max_retry_count)
            .field("retry_delay", &self.retry_delay)
            .field("continue_on_error", &self.continue_on_error)
            .field("execution_timeout", &self.execution_timeout)
            .field("max_execution_count", &self.max_execution_count)
            .field("on_executed", &self.on_executed.is_some())
            .field("on_error", &self.on_error.is_some())
            .field("on_stopped", &self.on_stopped.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_contract() {
        let opts = LoopOptions::default();
        assert_eq!(opts.interval, Duration::from_secs(1));
        assert_eq!(opts.initial_delay, Duration::ZERO);
        assert_eq!(opts.anchor_mode, AnchorMode::FromExecutionEnd);
        assert_eq!(opts.max_retry_count, 0);
        assert_eq!(opts.retry_delay, Duration::from_secs(5));
        assert!(opts.continue_on_error);
        assert!(opts.execution_timeout.is_none());
        assert!(opts.max_execution_count.is_none());
    }

    #[test]
    fn test_zero_interval_rejected() {
        let opts = LoopOptions::new(Duration::ZERO);
        assert_eq!(opts.validate(), Err(LoopError::ZeroInterval));
    }

    #[test]
    fn test_positive_interval_accepted() {
        let opts = LoopOptions::new(Duration::from_millis(1));
        assert!(opts.validate().is_ok());
    }

    #[test]
    fn test_zero_timeout_normalized_to_none() {
        let opts = LoopOptions::new(Duration::from_secs(1))
            .with_execution_timeout(Some(Duration::ZERO));
        assert!(opts.attempt_timeout().is_none());

        let opts = opts.with_execution_timeout(Some(Duration::from_millis(50)));
        assert_eq!(opts.attempt_timeout(), Some(Duration::from_millis(50)));
    }

    #[test]
    fn test_builder_chain() {
        let opts = LoopOptions::new(Duration::from_secs(3))
            .with_initial_delay(Duration::from_secs(1))
            .with_anchor_mode(AnchorMode::FromExecutionStart)
            .with_max_retries(2)
            .with_retry_delay(Duration::from_millis(250))
            .with_continue_on_error(false)
            .with_max_executions(7)
            .with_on_stopped(|_| {});

        assert_eq!(opts.interval, Duration::from_secs(3));
        assert_eq!(opts.anchor_mode, AnchorMode::FromExecutionStart);
        assert_eq!(opts.max_retry_count, 2);
        assert!(!opts.continue_on_error);
        assert_eq!(opts.max_execution_count, Some(7));
        assert!(opts.on_stopped.is_some());
        assert!(opts.on_executed.is_none());
    }
}
