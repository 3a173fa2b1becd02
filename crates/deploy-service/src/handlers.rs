//! API request handlers for the deployment dashboard
//!
//! Thin glue between the chat command layer and the engine: every request
//! produces exactly one reply, either a block payload or an error notice.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::info;

use deploy_common::{DispatchOutcome, Error};

use crate::blocks;
use crate::catalog::Catalog;
use crate::dispatch::{dispatch_selected, Environment};
use crate::reconcile::{classify, reconcile, DriftRule, Providers, ReconcileMode};

/// Shared application state
pub struct AppState {
    pub catalog: Catalog,
    pub providers: Providers,
}

/// API Error type
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = json!({
            "error": self.message,
            "text": format!("❌ Error: {}", self.message),
        });

        (self.status, Json(body)).into_response()
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        let status = match err {
            Error::Upstream(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        ApiError {
            status,
            message: err.to_string(),
        }
    }
}

/// Health check endpoint
pub async fn health_handler() -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "service": "deploy-service"
    }))
}

/// Full deployment status overview
pub async fn status_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Value>, ApiError> {
    info!("Building deployment status overview");

    let reconciled = reconcile(
        &state.providers,
        state.catalog.services(),
        ReconcileMode::Status,
    )
    .await?;

    Ok(Json(json!({ "blocks": blocks::status_blocks(&reconciled) })))
}

/// Development redeploy proposal: recommended vs already updated
pub async fn development_proposal_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Value>, ApiError> {
    info!("Building development deployment proposal");

    let reconciled = reconcile(
        &state.providers,
        state.catalog.services(),
        ReconcileMode::Development,
    )
    .await?;
    let classified = classify(reconciled, DriftRule::Development);

    Ok(Json(json!({
        "blocks": blocks::proposal_blocks(Environment::Development, &classified)
    })))
}

/// Production promotion proposal: development vs production versions
pub async fn production_proposal_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Value>, ApiError> {
    info!("Building production deployment proposal");

    let reconciled = reconcile(
        &state.providers,
        state.catalog.services(),
        ReconcileMode::Production,
    )
    .await?;
    let classified = classify(reconciled, DriftRule::Production);

    Ok(Json(json!({
        "blocks": blocks::proposal_blocks(Environment::Production, &classified)
    })))
}

/// Selection payload delivered by the chat layer
#[derive(Debug, Deserialize)]
pub struct DispatchRequest {
    #[serde(default)]
    pub services: Vec<String>,
}

/// Dispatch the selected services to the requested environment
pub async fn dispatch_handler(
    State(state): State<Arc<AppState>>,
    Path(environment): Path<Environment>,
    Json(payload): Json<DispatchRequest>,
) -> Result<Json<Value>, ApiError> {
    let outcome = dispatch_selected(
        &state.providers.github,
        &state.catalog,
        &payload.services,
        environment,
    )
    .await;

    match outcome {
        DispatchOutcome::NothingSelected => Ok(Json(json!({
            "text": "❌ No services selected for deployment."
        }))),
        DispatchOutcome::Dispatched(reports) => Ok(Json(json!({
            "blocks": blocks::dispatch_blocks(environment, &reports)
        }))),
    }
}
