//! Durable catalog storage.
//!
//! # Responsibility
//! - Define the whole-document load/save contract used by services.
//! - Isolate file formats and filesystem details from orchestration code.
//!
//! # Invariants
//! - Repositories never partially persist a catalog.
//! - Loaded catalogs satisfy `Catalog::validate()`.

pub mod catalog_repo;
