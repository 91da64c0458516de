//! Process-wide invoice settings.
//!
//! The settings start empty and are materialized from [`BillingConfig`] on
//! first read. Updates are last-write-wins; a debt calculation reads the rate
//! once and is not isolated from a concurrent update.

use chrono::Utc;
use rust_decimal::Decimal;
use tokio::sync::RwLock;
use tracing::info;
use validator::Validate;

use crate::config::BillingConfig;
use crate::errors::ServiceError;
use crate::models::{InvoiceSettings, InvoiceSettingsPatch};

pub struct InvoiceSettingsStore {
    defaults: BillingConfig,
    current: RwLock<Option<InvoiceSettings>>,
}

impl InvoiceSettingsStore {
    pub fn new(defaults: BillingConfig) -> Self {
        Self {
            defaults,
            current: RwLock::new(None),
        }
    }

    fn initial_settings(&self) -> InvoiceSettings {
        InvoiceSettings {
            interest_rate_per_month: self.defaults.default_interest_rate_percent,
            bank_name: self.defaults.bank_name.clone(),
            account_name: self.defaults.account_name.clone(),
            account_number: self.defaults.account_number.clone(),
            promptpay_id: self.defaults.promptpay_id.clone(),
            qr_image_url: None,
            updated_at: None,
        }
    }

    /// Current settings, creating the defaults on first access.
    pub async fn current(&self) -> InvoiceSettings {
        if let Some(settings) = self.current.read().await.as_ref() {
            return settings.clone();
        }
        let mut guard = self.current.write().await;
        guard.get_or_insert_with(|| self.initial_settings()).clone()
    }

    /// Monthly interest rate in percent, if one is configured.
    pub async fn interest_rate(&self) -> Option<Decimal> {
        self.current().await.interest_rate_per_month
    }

    pub fn payment_term_days(&self) -> u32 {
        self.defaults.payment_term_days
    }

    /// Applies the fields present in `patch`.
    pub async fn update(
        &self,
        patch: InvoiceSettingsPatch,
    ) -> Result<InvoiceSettings, ServiceError> {
        patch.validate()?;
        if let Some(rate) = patch.interest_rate_per_month {
            if (rate.is_sign_negative() && !rate.is_zero()) || rate > Decimal::ONE_HUNDRED {
                return Err(ServiceError::ValidationError(format!(
                    "Interest rate must be between 0 and 100 percent, got {}",
                    rate
                )));
            }
        }

        let mut guard = self.current.write().await;
        let settings = guard.get_or_insert_with(|| self.initial_settings());

        if let Some(rate) = patch.interest_rate_per_month {
            settings.interest_rate_per_month = Some(rate);
        }
        if let Some(bank_name) = patch.bank_name {
            settings.bank_name = Some(bank_name);
        }
        if let Some(account_name) = patch.account_name {
            settings.account_name = Some(account_name);
        }
        if let Some(account_number) = patch.account_number {
            settings.account_number = Some(account_number);
        }
        if let Some(promptpay_id) = patch.promptpay_id {
            settings.promptpay_id = Some(promptpay_id);
        }
        if let Some(qr_image_url) = patch.qr_image_url {
            settings.qr_image_url = Some(qr_image_url);
        }
        settings.updated_at = Some(Utc::now());

        info!(
            interest_rate = ?settings.interest_rate_per_month,
            "Invoice settings updated"
        );
        Ok(settings.clone())
    }
}
