//! Plain value types shared by services and handlers.

pub mod billing_period;
pub mod invoice_settings;

pub use billing_period::{whole_months_between, BillingPeriod};
pub use invoice_settings::{InvoiceSettings, InvoiceSettingsPatch};
