use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use utoipa::ToSchema;

use crate::{error::ApiResult, state::AppState};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub services: HashMap<String, String>,
}

/// Health check endpoint
///
/// Reports the API version and whether the storage backend answers
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is up", body = HealthResponse)
    ),
    tag = "health"
)]
pub async fn health_check(State(state): State<Arc<AppState>>) -> ApiResult<Json<HealthResponse>> {
    let store = state.service.store();

    let storage = match store.ping().await {
        Ok(()) => "connected",
        Err(e) => {
            tracing::warn!(backend = store.backend_name(), error = %e, "Storage ping failed");
            "disconnected"
        }
    };

    let mut services = HashMap::new();
    services.insert(store.backend_name().to_string(), storage.to_string());
    services.insert(
        "title_tasks".to_string(),
        state.service.titles().in_flight().to_string(),
    );

    Ok(Json(HealthResponse {
        status: if storage == "connected" { "healthy" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        services,
    }))
}
