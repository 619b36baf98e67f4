//! Core domain types
//!
//! This module contains the pipeline model shared by the planner, the CLI
//! (which persists observed state) and the sandbox server.

pub mod declaration;
pub mod pipeline;
