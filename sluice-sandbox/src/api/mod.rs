//! API Module
//!
//! HTTP API layer for the sandbox control plane.

pub mod error;
pub mod health;
pub mod pipeline;

use axum::{
    Router,
    routing::{get, post, put},
};
use tower_http::trace::TraceLayer;

use crate::store::Store;

/// Create the main API router with all endpoints
pub fn create_router(store: Store) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health::health_check))
        // Pipeline endpoints
        .route(
            "/v1/virtual-clusters/{virtual_cluster_id}/pipelines",
            post(pipeline::create_pipeline),
        )
        .route(
            "/v1/pipelines/{id}",
            get(pipeline::describe_pipeline).delete(pipeline::delete_pipeline),
        )
        .route(
            "/v1/pipelines/{id}/configurations",
            post(pipeline::create_configuration),
        )
        .route("/v1/pipelines/{id}/deployment", put(pipeline::set_deployment))
        // Add state and middleware
        .with_state(store)
        .layer(TraceLayer::new_for_http())
}
