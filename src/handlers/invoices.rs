use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::entities::invoice;
use crate::errors::ServiceError;
use crate::services::invoice_recompute::InvoicePatch;
use crate::services::invoicing::CreateInvoiceRequest;
use crate::{ApiResponse, ApiResult, AppState};

/// Body for `POST /invoices/:id/pay`
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct MarkPaidRequest {
    /// Defaults to today
    pub paid_date: Option<NaiveDate>,
}

/// Body for `POST /invoices/mark-overdue`
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct MarkOverdueRequest {
    /// Invoices due strictly before this date are flagged; defaults to today
    pub as_of: Option<NaiveDate>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MarkOverdueResponse {
    pub as_of: NaiveDate,
    pub updated: u64,
}

/// Create the invoice for one room and billing period
#[utoipa::path(
    post,
    path = "/api/v1/invoices",
    request_body = CreateInvoiceRequest,
    responses(
        (status = 201, description = "Invoice created", body = crate::ApiResponse<invoice::Model>),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 404, description = "Room or tenant not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Invoice already exists for the period", body = crate::errors::ErrorResponse)
    ),
    tag = "Invoices"
)]
pub async fn create_invoice(
    State(state): State<AppState>,
    Json(request): Json<CreateInvoiceRequest>,
) -> Result<(StatusCode, Json<ApiResponse<invoice::Model>>), ServiceError> {
    let invoice = state.services.invoicing.create_invoice(request).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(invoice).with_message("Invoice created")),
    ))
}

/// Fetch one invoice
#[utoipa::path(
    get,
    path = "/api/v1/invoices/{id}",
    params(("id" = i32, Path, description = "Invoice id")),
    responses(
        (status = 200, description = "Invoice found", body = crate::ApiResponse<invoice::Model>),
        (status = 404, description = "Invoice not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Invoices"
)]
pub async fn get_invoice(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> ApiResult<invoice::Model> {
    let invoice = state.services.invoicing.get_invoice(id).await?;
    Ok(Json(ApiResponse::success(invoice)))
}

/// Edit line items; the total is recomputed from the components
#[utoipa::path(
    patch,
    path = "/api/v1/invoices/{id}",
    params(("id" = i32, Path, description = "Invoice id")),
    request_body = InvoicePatch,
    responses(
        (status = 200, description = "Invoice updated", body = crate::ApiResponse<invoice::Model>),
        (status = 400, description = "Invalid patch", body = crate::errors::ErrorResponse),
        (status = 404, description = "Invoice not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Invoices"
)]
pub async fn patch_invoice(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(patch): Json<InvoicePatch>,
) -> ApiResult<invoice::Model> {
    let invoice = state.services.invoicing.patch_invoice(id, patch).await?;
    Ok(Json(ApiResponse::success(invoice)))
}

/// Record payment of an invoice
#[utoipa::path(
    post,
    path = "/api/v1/invoices/{id}/pay",
    params(("id" = i32, Path, description = "Invoice id")),
    request_body = MarkPaidRequest,
    responses(
        (status = 200, description = "Invoice marked paid", body = crate::ApiResponse<invoice::Model>),
        (status = 404, description = "Invoice not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Invoice already paid", body = crate::errors::ErrorResponse)
    ),
    tag = "Invoices"
)]
pub async fn mark_paid(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    body: Option<Json<MarkPaidRequest>>,
) -> ApiResult<invoice::Model> {
    let paid_date = body.and_then(|Json(req)| req.paid_date);
    let invoice = state.services.invoicing.mark_paid(id, paid_date).await?;
    Ok(Json(ApiResponse::success(invoice)))
}

/// Flag pending invoices past their due date as overdue
#[utoipa::path(
    post,
    path = "/api/v1/invoices/mark-overdue",
    request_body = MarkOverdueRequest,
    responses(
        (status = 200, description = "Overdue sweep finished", body = crate::ApiResponse<MarkOverdueResponse>)
    ),
    tag = "Invoices"
)]
pub async fn mark_overdue(
    State(state): State<AppState>,
    body: Option<Json<MarkOverdueRequest>>,
) -> ApiResult<MarkOverdueResponse> {
    let as_of = body
        .and_then(|Json(req)| req.as_of)
        .unwrap_or_else(crate::services::invoicing::today);
    let updated = state.services.invoicing.mark_overdue(as_of).await?;
    Ok(Json(ApiResponse::success(MarkOverdueResponse { as_of, updated })))
}

/// List a room's invoices, oldest period first
#[utoipa::path(
    get,
    path = "/api/v1/rooms/{room_id}/invoices",
    params(("room_id" = i32, Path, description = "Room id")),
    responses(
        (status = 200, description = "Invoices of the room", body = crate::ApiResponse<Vec<invoice::Model>>),
        (status = 404, description = "Room not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Invoices"
)]
pub async fn list_room_invoices(
    State(state): State<AppState>,
    Path(room_id): Path<i32>,
) -> ApiResult<Vec<invoice::Model>> {
    let invoices = state
        .services
        .invoicing
        .list_invoices_for_room(room_id)
        .await?;
    Ok(Json(ApiResponse::success(invoices)))
}

pub fn invoice_routes() -> Router<AppState> {
    Router::new()
        .route("/invoices", post(create_invoice))
        .route("/invoices/mark-overdue", post(mark_overdue))
        .route("/invoices/:id", get(get_invoice).patch(patch_invoice))
        .route("/invoices/:id/pay", post(mark_paid))
        .route("/rooms/:room_id/invoices", get(list_room_invoices))
}
