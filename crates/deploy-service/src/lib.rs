//! Deployment Manager service
//!
//! Chat-operated deployment dashboard: cross-references the SCM host, the
//! container-image registry, and the GitOps cluster-config repository to
//! answer "what is deployed where" and to trigger redeploys.

pub mod blocks;
pub mod catalog;
pub mod config;
pub mod dispatch;
pub mod github;
pub mod handlers;
pub mod reconcile;
pub mod registry;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub use catalog::{Catalog, ServiceSpec};
pub use config::Config;
pub use dispatch::{dispatch_selected, Environment, WorkflowDispatcher};
pub use github::GitHubClient;
pub use handlers::AppState;
pub use reconcile::{classify, reconcile, Classified, DriftRule, Providers, ReconcileMode};
pub use registry::RegistryClient;

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    let shared_state = Arc::new(state);

    Router::new()
        .route("/health", get(handlers::health_handler))
        .route("/api/deployments", get(handlers::status_handler))
        .route(
            "/api/deployments/development",
            get(handlers::development_proposal_handler),
        )
        .route(
            "/api/deployments/production",
            get(handlers::production_proposal_handler),
        )
        .route(
            "/api/deployments/{environment}/dispatch",
            post(handlers::dispatch_handler),
        )
        .with_state(shared_state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
