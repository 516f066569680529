//! Review-cycle domain model.
//!
//! # Responsibility
//! - Define interval, chapter, subject and catalog records.
//! - Keep invariants in constructors and conversions rather than in callers.
//!
//! # Invariants
//! - Interval sequences are non-empty and strictly positive.
//! - A chapter's remaining dates and calendar ids live in one paired queue.
//! - Names and titles are unique at their level.

pub mod catalog;
pub mod chapter;
pub mod interval;
