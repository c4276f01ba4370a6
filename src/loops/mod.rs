//! # Recurring loop runtime.
//!
//! This module provides the single-loop runner and its value types:
//! - [`Loop`] - state machine owning one recurring execution
//! - [`LoopOptions`] / [`AnchorMode`] - configuration bundle
//! - [`ExecutionContext`] - per-cycle telemetry record
//! - [`LoopState`] - lifecycle states

mod attempt;
mod context;
mod core;
mod engine;
mod options;
mod state;

pub use context::ExecutionContext;
pub use core::Loop;
pub use options::{AnchorMode, LoopOptions};
pub use state::LoopState;
