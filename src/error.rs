//! Error types used by the loop runtime and units of work.
//!
//! This module defines two main error enums:
//!
//! - [`LoopError`] — errors raised by loop configuration and lifecycle control.
//! - [`WorkError`] — errors raised by individual attempts of the unit of work.
//!
//! Both types provide helper methods (`as_label`, `as_message`) for logging/metrics
//! and additional utilities such as [`WorkError::is_retryable`].

use std::time::Duration;
use thiserror::Error;

/// # Errors produced by loop configuration and lifecycle control.
///
/// These represent misconfiguration or misuse of a [`Loop`](crate::Loop) or
/// [`LoopManager`](crate::LoopManager), detected immediately rather than
/// deferred to runtime.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LoopError {
    /// The configured interval is zero; a loop needs a positive cadence.
    #[error("interval must be greater than zero")]
    ZeroInterval,

    /// A loop with this name is already registered in the manager.
    #[error("loop with name '{name}' already exists")]
    DuplicateName {
        /// The conflicting registration name.
        name: String,
    },

    /// A mutating call was made after disposal.
    #[error("{what} has been disposed")]
    Disposed {
        /// Which object the call targeted (`"loop"` or `"manager"`).
        what: &'static str,
    },
}

impl LoopError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use tickloop::LoopError;
    ///
    /// let err = LoopError::ZeroInterval;
    /// assert_eq!(err.as_label(), "loop_zero_interval");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            LoopError::ZeroInterval => "loop_zero_interval",
            LoopError::DuplicateName { .. } => "loop_duplicate_name",
            LoopError::Disposed { .. } => "loop_disposed",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            LoopError::ZeroInterval => "interval must be greater than zero".to_string(),
            LoopError::DuplicateName { name } => format!("duplicate name: {name}"),
            LoopError::Disposed { what } => format!("disposed: {what}"),
        }
    }
}

/// # Errors produced by one attempt of the unit of work.
///
/// An attempt either fails outright ([`WorkError::Fail`]), exceeds its
/// configured timeout ([`WorkError::Timeout`]), or observes cooperative
/// cancellation ([`WorkError::Canceled`]). Timeouts are not distinguished
/// from ordinary failures for retry purposes.
#[non_exhaustive]
#[derive(Error, Debug, Clone)]
pub enum WorkError {
    /// Attempt exceeded its timeout duration.
    #[error("timed out after {timeout:?}")]
    Timeout {
        /// The timeout duration that was exceeded.
        timeout: Duration,
    },

    /// Attempt failed but may succeed if retried.
    #[error("execution failed: {error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },

    /// Attempt was cancelled via its [`CancellationToken`](tokio_util::sync::CancellationToken).
    #[error("context cancelled")]
    Canceled,
}

impl WorkError {
    /// Convenience constructor for an ordinary failure.
    pub fn fail(error: impl Into<String>) -> Self {
        WorkError::Fail {
            error: error.into(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use tickloop::WorkError;
    /// use std::time::Duration;
    ///
    /// let err = WorkError::Timeout { timeout: Duration::from_secs(1) };
    /// assert_eq!(err.as_label(), "work_timeout");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            WorkError::Timeout { .. } => "work_timeout",
            WorkError::Fail { .. } => "work_failed",
            WorkError::Canceled => "work_canceled",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            WorkError::Timeout { timeout } => format!("timeout: {timeout:?}"),
            WorkError::Fail { error } => format!("error: {error}"),
            WorkError::Canceled => "context cancelled".to_string(),
        }
    }

    /// Indicates whether the error type is safe to retry.
    ///
    /// Returns `true` for [`WorkError::Fail`] and [`WorkError::Timeout`],
    /// `false` for [`WorkError::Canceled`].
    ///
    /// # Example
    /// ```
    /// use tickloop::WorkError;
    ///
    /// let retryable = WorkError::fail("boom");
    /// assert!(retryable.is_retryable());
    ///
    /// assert!(!WorkError::Canceled.is_retryable());
    /// ```
    pub fn is_retryable(&self) -> bool {
        matches!(self, WorkError::Fail { .. } | WorkError::Timeout { .. })
    }
}
