//! # Gardenwise Domain
//!
//! Business domain types for the maintenance scheduling engine.
//!
//! This crate contains:
//! - Maintenance task, notification and recommendation types
//! - Domain error types and Result definitions
//! - Configuration structures
//! - Domain constants
//!
//! ## Architecture
//! - No dependencies on other Gardenwise crates
//! - Only external dependencies allowed
//! - Pure domain models and data structures

pub mod config;
pub mod constants;
pub mod errors;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
