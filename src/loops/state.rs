//! # Loop lifecycle states.
//!
//! [`LoopState`] classifies where a [`Loop`](crate::Loop) is in its lifecycle.
//!
//! ## Transitions
//! ```text
//! Idle ──start()──► Running ──pause()──► Paused
//!                      ▲                   │
//!                      └─────resume()──────┘
//!
//! Running/Paused ──stop()──► Stopped ──start()──► Running   (fresh run, count reset)
//! any state ──dispose()──► Disposed                          (terminal)
//! ```
//!
//! ## Rules
//! - Transitions are serialized by one mutex per loop.
//! - `pause`/`resume`/`start` against an inapplicable state are no-ops.
//! - Once `Disposed`, all further mutating calls fail.

/// Lifecycle state of a [`Loop`](crate::Loop).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    /// Created but never started.
    Idle,
    /// Background execution path is active.
    Running,
    /// Execution is suspended between cycles; the in-flight attempt (if any)
    /// is not interrupted and the execution count is preserved.
    Paused,
    /// Execution has ended (explicit stop, max-count reached, or fatal cycle
    /// failure). A stopped loop may be started again.
    Stopped,
    /// Terminal state; resources released.
    Disposed,
}

impl LoopState {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            LoopState::Idle => "idle",
            LoopState::Running => "running",
            LoopState::Paused => "paused",
            LoopState::Stopped => "stopped",
            LoopState::Disposed => "disposed",
        }
    }

    /// True while the background execution path exists (`Running` or `Paused`).
    pub fn is_active(&self) -> bool {
        matches!(self, LoopState::Running | LoopState::Paused)
    }
}
