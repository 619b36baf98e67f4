//! Sluice Sandbox
//!
//! An in-memory stand-in for the streaming-platform control plane. It serves
//! the pipeline endpoints the reconciler uses so the CLI and client can be
//! exercised locally without a real platform account.

pub mod api;
pub mod repository;
pub mod service;
pub mod store;

pub use api::create_router;
pub use store::{Store, create_store};
