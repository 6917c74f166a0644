//! Registry entity model and the schema-less attribute document.
//!
//! # Responsibility
//! - Define the fixed-schema records the resolver reads and writes.
//! - Define the extensible document stored in one text field per record.
//!
//! # Invariants
//! - Every entity is identified by an address or an address-derived key.
//! - Price-like values are arbitrary-precision integers.

pub mod address;
pub mod configuration;
pub mod document;
pub mod filter;
pub mod minter;
pub mod project;
