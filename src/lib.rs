//! Apartment billing service
//!
//! Monthly invoices per room with carried-forward debt, simple monthly
//! interest and bulk CSV import, served over an axum JSON API.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod handlers;
pub mod metrics;
pub mod middleware_helpers;
pub mod migrator;
pub mod models;
pub mod openapi;
pub mod repositories;
pub mod services;
pub mod tracing;

use axum::{response::Json, routing::get, Router};
use chrono::Utc;
use http::HeaderValue;
use sea_orm::DatabaseConnection;
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use utoipa::ToSchema;

use crate::config::AppConfig;
use crate::repositories::Repositories;

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub services: handlers::AppServices,
    /// Present when the repositories are backed by a database
    pub db: Option<Arc<DatabaseConnection>>,
}

impl AppState {
    /// State backed by SeaORM repositories on `db`.
    pub fn with_database(config: AppConfig, db: Arc<DatabaseConnection>) -> Self {
        let services = handlers::AppServices::new(Repositories::sea_orm(db.clone()), &config);
        Self {
            config,
            services,
            db: Some(db),
        }
    }

    /// State over caller-supplied repositories, e.g. the in-memory store.
    pub fn with_repositories(config: AppConfig, repos: Repositories) -> Self {
        let services = handlers::AppServices::new(repos, &config);
        Self {
            config,
            services,
            db: None,
        }
    }
}

/// Envelope wrapped around every successful JSON body.
#[derive(Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<ResponseMeta>,
}

#[derive(Serialize, ToSchema)]
pub struct ResponseMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    pub timestamp: String,
}

impl ResponseMeta {
    fn capture() -> Self {
        Self {
            request_id: crate::tracing::current_request_id().map(|rid| rid.to_string()),
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            meta: Some(ResponseMeta::capture()),
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}


/// Standard API result type for JSON responses
pub type ApiResult<T> = Result<Json<ApiResponse<T>>, errors::ServiceError>;

pub fn api_v1_routes(max_import_bytes: usize) -> Router<AppState> {
    Router::new()
        .merge(handlers::invoices::invoice_routes())
        .merge(handlers::imports::import_routes(max_import_bytes))
        .merge(handlers::settings::settings_routes())
        .merge(handlers::health::health_routes())
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .cors_origins()
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect();

    if origins.is_empty() {
        ::tracing::info!("No CORS origins configured; allowing any origin");
        CorsLayer::permissive()
    } else {
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    }
}

/// Full application router: API, metrics, Swagger UI and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config);
    let max_import_bytes = state.config.max_import_bytes;

    Router::<AppState>::new()
        .route("/", get(|| async { "apartment-billing up" }))
        .route("/metrics", get(metrics::metrics_handler))
        .route("/metrics/json", get(metrics::metrics_json_handler))
        .nest("/api/v1", api_v1_routes(max_import_bytes))
        .merge(openapi::swagger_ui())
        .layer(crate::tracing::configure_http_tracing())
        .layer(cors)
        .layer(axum::middleware::from_fn(
            middleware_helpers::request_id::request_id_middleware,
        ))
        .with_state(state)
}
