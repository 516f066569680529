//! Core use-case services.
//!
//! # Responsibility
//! - Apply chapter review-cycle transitions (`lifecycle`).
//! - Orchestrate catalog mutation, calendar sync and persistence into the
//!   operations presentation layers call (`review_service`).
//!
//! # Invariants
//! - Services hold no ambient state; the catalog is owned by `ReviewService`.

pub mod lifecycle;
pub mod review_service;
