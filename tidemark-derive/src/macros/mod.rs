//! Macro implementations

pub mod domain;

pub use domain::derive_domain;
