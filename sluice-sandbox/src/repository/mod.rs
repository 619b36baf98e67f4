//! Repository Module
//!
//! Data access layer for the sandbox.
//! Each repository handles store operations for a specific domain entity.

pub mod pipeline;

// Re-export for convenience
pub use pipeline as pipeline_repository;
