//! Core business logic for Kontera.
//!
//! This crate contains pure business logic with ZERO web dependencies.
//! All domain types, the expense lifecycle, and the record store live here.
//!
//! # Modules
//!
//! - `expense` - Pending-expense lifecycle, visibility filter, domain types
//! - `store` - File-backed keyed record store with snapshot persistence
//! - `coa` - Chart-of-accounts lookup collaborator interface
//! - `upstream` - Upstream expense-posting collaborator interface

pub mod coa;
pub mod expense;
pub mod store;
pub mod upstream;
