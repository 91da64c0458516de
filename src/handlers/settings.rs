use axum::{extract::State, routing::get, Json, Router};

use crate::models::{InvoiceSettings, InvoiceSettingsPatch};
use crate::{ApiResponse, ApiResult, AppState};

/// Current invoice settings
#[utoipa::path(
    get,
    path = "/api/v1/settings/invoice",
    responses(
        (status = 200, description = "Current settings", body = crate::ApiResponse<InvoiceSettings>)
    ),
    tag = "Settings"
)]
pub async fn get_settings(State(state): State<AppState>) -> ApiResult<InvoiceSettings> {
    let settings = state.services.settings.current().await;
    Ok(Json(ApiResponse::success(settings)))
}

/// Update invoice settings; omitted fields keep their value
#[utoipa::path(
    put,
    path = "/api/v1/settings/invoice",
    request_body = InvoiceSettingsPatch,
    responses(
        (status = 200, description = "Settings updated", body = crate::ApiResponse<InvoiceSettings>),
        (status = 400, description = "Invalid settings", body = crate::errors::ErrorResponse)
    ),
    tag = "Settings"
)]
pub async fn update_settings(
    State(state): State<AppState>,
    Json(patch): Json<InvoiceSettingsPatch>,
) -> ApiResult<InvoiceSettings> {
    let settings = state.services.settings.update(patch).await?;
    Ok(Json(ApiResponse::success(settings)))
}

pub fn settings_routes() -> Router<AppState> {
    Router::new().route("/settings/invoice", get(get_settings).put(update_settings))
}
