//! # Unit-of-work abstractions.
//!
//! This module provides the types a caller uses to describe what a loop runs:
//! - [`Work`] - trait for implementing async cancelable units of work
//! - [`WorkFn`] - function-based work implementation
//! - [`WorkRef`] - shared reference to a unit of work (`Arc<dyn Work>`)

mod unit;
mod work_fn;

pub use unit::Work;
pub use work_fn::{WorkFn, WorkRef};
