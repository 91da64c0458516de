use axum::{
    extract::{multipart::MultipartError, DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use tracing::info;

use crate::errors::ServiceError;
use crate::services::invoice_import::ImportResult;
use crate::{ApiResponse, ApiResult, AppState};

const FILE_FIELD: &str = "file";
/// Room left for multipart boundaries and part headers on top of the file.
const MULTIPART_OVERHEAD: usize = 16 * 1024;

fn multipart_error(err: MultipartError) -> ServiceError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ServiceError::PayloadTooLarge(err.body_text())
    } else {
        ServiceError::BadRequest(format!("Failed to read multipart body: {}", err.body_text()))
    }
}

/// Create invoices in bulk from a CSV upload
#[utoipa::path(
    post,
    path = "/api/v1/invoices/import",
    request_body(content = String, content_type = "multipart/form-data", description = "CSV file in the `file` field"),
    responses(
        (status = 200, description = "Import finished; per-line failures are listed in `errors`", body = crate::ApiResponse<ImportResult>),
        (status = 400, description = "Missing or structurally invalid file", body = crate::errors::ErrorResponse),
        (status = 413, description = "File exceeds the upload limit", body = crate::errors::ErrorResponse)
    ),
    tag = "Imports"
)]
pub async fn import_invoices(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<ImportResult> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let file_name = field.file_name().unwrap_or_default().to_string();
        let data = field.bytes().await.map_err(multipart_error)?;
        info!(file_name = %file_name, size = data.len(), "Received invoice import");

        let result = state
            .services
            .imports
            .import_file(&file_name, &data)
            .await?;
        let message = format!(
            "Imported {} of {} lines",
            result.success_count, result.total_processed
        );
        return Ok(Json(ApiResponse::success(result).with_message(message)));
    }

    Err(ServiceError::BadRequest(format!(
        "Multipart field '{}' is required",
        FILE_FIELD
    )))
}

/// Import routes; the body limit leaves headroom so oversize files reach
/// the service and get a precise error.
pub fn import_routes(max_import_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/invoices/import", post(import_invoices))
        .layer(DefaultBodyLimit::max(
            max_import_bytes.saturating_add(MULTIPART_OVERHEAD),
        ))
}
