//! Shared test helpers for `gardenwise-core` integration tests.
//!
//! Lightweight in-memory doubles for every core port so the scheduling
//! tests can focus on behaviour instead of boilerplate.

#![allow(dead_code)]

pub mod fixtures;
pub mod recommendations;
pub mod repositories;
pub mod store;
