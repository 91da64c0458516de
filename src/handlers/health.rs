use axum::{extract::State, routing::get, Json, Router};
use serde_json::{json, Value};

use crate::{ApiResponse, ApiResult, AppState};

/// Service identity and build information
#[utoipa::path(
    get,
    path = "/api/v1/status",
    responses((status = 200, description = "Service status")),
    tag = "Health"
)]
pub async fn api_status(State(state): State<AppState>) -> ApiResult<Value> {
    let status_data = json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "git": option_env!("GIT_HASH").unwrap_or("unknown"),
        "service": "apartment-billing",
        "environment": state.config.environment,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    });

    Ok(Json(ApiResponse::success(status_data)))
}

/// Liveness plus database connectivity
#[utoipa::path(
    get,
    path = "/api/v1/health",
    responses((status = 200, description = "Health report")),
    tag = "Health"
)]
pub async fn health_check(State(state): State<AppState>) -> ApiResult<Value> {
    let db_status = match &state.db {
        Some(db) => match db.ping().await {
            Ok(_) => "healthy",
            Err(err) => {
                tracing::warn!(error = %err, "Database ping failed");
                "unhealthy"
            }
        },
        None => "not_configured",
    };

    let health_data = json!({
        "status": if db_status == "unhealthy" { "unhealthy" } else { "healthy" },
        "checks": {
            "database": db_status,
        },
        "timestamp": chrono::Utc::now().to_rfc3339(),
    });

    Ok(Json(ApiResponse::success(health_data)))
}

pub fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/status", get(api_status))
}
