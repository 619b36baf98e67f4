//! Data Transfer Objects for the control-plane API
//!
//! Request and response bodies exchanged between the HTTP client and the
//! control plane (or the sandbox server standing in for it).

pub mod pipeline;
