//! Shared store implementations

pub mod memory;

pub use memory::InMemorySharedStore;
