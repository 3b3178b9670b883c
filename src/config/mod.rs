//! Configuration module for registry lookups
//!
//! This module provides the `LookupConfig` struct, its type-safe builder and
//! the `TargetProfile` data that parameterizes navigation and extraction.

// Sub-modules
pub mod builder;
pub mod profile;
pub mod types;

// Re-exports for public API
pub use builder::{LookupConfigBuilder, WithProfile};
pub use profile::{Candidate, ExtractionRules, TargetProfile};
pub use types::{LookupConfig, Timings};
