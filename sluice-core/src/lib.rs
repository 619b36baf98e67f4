//! Sluice Core
//!
//! Pipeline configuration lifecycle for a streaming-platform control plane.
//!
//! This crate contains:
//! - Domain types: pipelines, configuration versions, the deployment pointer
//! - Normalization: canonical YAML rendering for content-based comparison
//! - Planner: computes and applies the backend actions of a reconciliation
//! - Backend: the control-plane capability the planner is built on
//! - DTOs: request/response bodies of the control-plane API

pub mod backend;
pub mod domain;
pub mod dto;
pub mod error;
pub mod normalize;
pub mod planner;

#[cfg(test)]
mod testing;

pub use backend::{Backend, BackendResult};
pub use error::{ApplyError, BackendError, Error, Result};
pub use planner::{Action, Plan, Planner};
