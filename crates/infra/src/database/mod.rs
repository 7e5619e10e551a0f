//! Database implementations

pub mod manager;
pub mod task_repository;

pub use manager::*;
pub use task_repository::*;
