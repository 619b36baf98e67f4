//! Service Module
//!
//! Business logic layer for the sandbox.
//! Services validate requests and orchestrate repository calls.

pub mod pipeline;

// Re-export for convenience
pub use pipeline as pipeline_service;
