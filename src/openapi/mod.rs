use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Apartment Billing API",
        version = "0.1.0",
        description = r#"
# Apartment Billing API

Monthly invoicing for rented rooms.

- **Invoices**: create one invoice per room and billing period, edit line items, record payments
- **Debt carry-forward**: unpaid earlier invoices are summed into the previous balance and accrue simple monthly interest
- **CSV import**: bulk-create invoices from meter readings, with per-line error reporting
- **Settings**: interest rate and payment details printed on invoices

Money amounts are decimal strings in baht with two decimal places.
"#
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development")
    ),
    tags(
        (name = "Invoices", description = "Invoice lifecycle endpoints"),
        (name = "Imports", description = "CSV bulk import"),
        (name = "Settings", description = "Invoice settings"),
        (name = "Health", description = "Health check endpoints")
    ),
    paths(
        crate::handlers::invoices::create_invoice,
        crate::handlers::invoices::get_invoice,
        crate::handlers::invoices::patch_invoice,
        crate::handlers::invoices::mark_paid,
        crate::handlers::invoices::mark_overdue,
        crate::handlers::invoices::list_room_invoices,
        crate::handlers::imports::import_invoices,
        crate::handlers::settings::get_settings,
        crate::handlers::settings::update_settings,
        crate::handlers::health::health_check,
        crate::handlers::health::api_status,
    ),
    components(
        schemas(
            crate::ApiResponse<serde_json::Value>,
            crate::entities::invoice::Model,
            crate::entities::invoice::InvoiceStatus,
            crate::services::invoicing::CreateInvoiceRequest,
            crate::services::invoice_recompute::InvoicePatch,
            crate::services::invoice_import::ImportResult,
            crate::services::debt::DebtSummary,
            crate::handlers::invoices::MarkPaidRequest,
            crate::handlers::invoices::MarkOverdueRequest,
            crate::handlers::invoices::MarkOverdueResponse,
            crate::models::InvoiceSettings,
            crate::models::InvoiceSettingsPatch,
            crate::errors::ErrorResponse
        )
    )
)]
pub struct ApiDocV1;

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDocV1::openapi())
        .config(utoipa_swagger_ui::Config::from("/api-docs/openapi.json").try_it_out_enabled(true))
}
