//! # Per-cycle execution telemetry.
//!
//! [`ExecutionContext`] describes one execution attempt: sequence number,
//! retry index, elapsed time, and the captured failure (if any). Contexts are
//! produced by the loop engine and handed to the caller-supplied callbacks;
//! consumers treat them as read-only.

use std::time::Duration;

use crate::error::WorkError;

/// Read-only record describing one execution attempt.
///
/// - `on_error` receives a context per failed attempt (`retry_count` tells
///   which attempt within the cycle).
/// - `on_executed` receives the final context for the cycle: the successful
///   attempt, or the last failed attempt when retries were exhausted and the
///   loop is configured to continue.
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    /// 1-based sequence number of the cycle this attempt belongs to.
    pub execution_count: u64,
    /// 0-based index of the attempt within its cycle.
    pub retry_count: u32,
    /// Wall-clock duration of the attempt.
    pub elapsed: Duration,
    /// Captured failure; `None` exactly when the attempt succeeded.
    pub error: Option<WorkError>,
}

impl ExecutionContext {
    pub(crate) fn success(execution_count: u64, retry_count: u32, elapsed: Duration) -> Self {
        Self {
            execution_count,
            retry_count,
            elapsed,
            error: None,
        }
    }

    pub(crate) fn failure(
        execution_count: u64,
        retry_count: u32,
        elapsed: Duration,
        error: WorkError,
    ) -> Self {
        Self {
            execution_count,
            retry_count,
            elapsed,
            error: Some(error),
        }
    }

    /// True when the attempt completed without error.
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_has_no_error() {
        let ctx = ExecutionContext::success(3, 0, Duration::from_millis(12));
        assert!(ctx.is_success());
        assert!(ctx.error.is_none());
        assert_eq!(ctx.execution_count, 3);
    }

    #[test]
    fn test_failure_carries_error() {
        let ctx = ExecutionContext::failure(
            1,
            2,
            Duration::from_millis(5),
            WorkError::fail("boom"),
        );
        assert!(!ctx.is_success());
        assert_eq!(ctx.retry_count, 2);
        assert!(matches!(ctx.error, Some(WorkError::Fail { .. })));
    }
}
