//! # Gardenwise App
//!
//! Worker process wiring.
//!
//! This crate contains:
//! - Application context (dependency injection)
//! - Main entry point and setup
//!
//! ## Architecture
//! - Depends on `common`, `domain`, `core` and `infra`
//! - Wires up the hexagonal architecture

pub mod context;

pub use context::AppContext;
