//! Input records.

pub mod quote;
