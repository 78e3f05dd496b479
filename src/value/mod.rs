//! Value type system for Tidemark
//!
//! Field values cross the ORM core as `sea_query::Value`. This module maps Rust
//! field types to and from those values.
//!
//! - **`ValueType`** - Maps Rust types to their corresponding `sea_query::Value` variant
//! - **`ValueExtractionError`** - Why a `Value` could not become a field

pub mod types;

pub use types::{ValueExtractionError, ValueType};
