//! Review date arithmetic.
//!
//! # Responsibility
//! - Compute cumulative review dates from a start date and intervals.
//! - Parse and format the canonical `YYYY-MM-DD` date text.

pub mod calculator;
