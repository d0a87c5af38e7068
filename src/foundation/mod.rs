//! Shared value types, integer pixel math, and the crate error type.

pub mod core;
pub mod error;
pub(crate) mod math;
