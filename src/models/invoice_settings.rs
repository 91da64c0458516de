use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// Payment and interest settings shared by every invoice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct InvoiceSettings {
    /// Simple interest charged on overdue balances, percent per month
    #[schema(example = "2.00")]
    pub interest_rate_per_month: Option<Decimal>,
    pub bank_name: Option<String>,
    pub account_name: Option<String>,
    pub account_number: Option<String>,
    pub promptpay_id: Option<String>,
    /// Location of the payment QR image rendered on invoice PDFs
    pub qr_image_url: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Partial update of [`InvoiceSettings`]; absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct InvoiceSettingsPatch {
    #[schema(example = "1.50")]
    pub interest_rate_per_month: Option<Decimal>,
    #[validate(length(max = 100))]
    pub bank_name: Option<String>,
    #[validate(length(max = 100))]
    pub account_name: Option<String>,
    #[validate(length(max = 50))]
    pub account_number: Option<String>,
    #[validate(length(max = 20))]
    pub promptpay_id: Option<String>,
    #[validate(length(max = 500))]
    pub qr_image_url: Option<String>,
}
