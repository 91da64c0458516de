use chrono::{Datelike, Days, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use validator::Validate;

use crate::entities::invoice::{self, InvoiceStatus};
use crate::errors::ServiceError;
use crate::metrics::BILLING_METRICS;
use crate::models::BillingPeriod;
use crate::repositories::{duplicate_invoice_message, Repositories};
use crate::services::debt::DebtCalculator;
use crate::services::fee_resolver::FeeOverrides;
use crate::services::invoice_assembler::{InvoiceAssembler, InvoiceDraft};
use crate::services::invoice_recompute::{apply_patch, InvoicePatch};
use crate::services::invoice_settings::InvoiceSettingsStore;
use crate::services::maintenance_costs::MaintenanceAggregator;

/// Request body for creating one invoice.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct CreateInvoiceRequest {
    #[validate(range(min = 1))]
    pub room_id: i32,
    pub tenant_id: Option<i32>,
    /// Defaults to the issue date's year
    pub billing_year: Option<i32>,
    /// Defaults to the issue date's month
    pub billing_month: Option<u32>,
    /// Defaults to today
    pub issue_date: Option<NaiveDate>,
    /// Defaults to the issue date plus the configured payment term
    pub due_date: Option<NaiveDate>,
    pub rent_baht: Option<Decimal>,
    pub electricity_units: Option<i32>,
    pub electricity_rate: Option<Decimal>,
    pub electricity_baht: Option<Decimal>,
    pub water_units: Option<i32>,
    pub water_rate: Option<Decimal>,
    pub water_baht: Option<Decimal>,
    pub other_baht: Option<Decimal>,
    pub common_fee_baht: Option<Decimal>,
    pub garbage_fee_baht: Option<Decimal>,
    #[serde(default)]
    pub include_common_fee: bool,
    #[serde(default)]
    pub include_garbage_fee: bool,
}

impl CreateInvoiceRequest {
    fn overrides(&self) -> FeeOverrides {
        FeeOverrides {
            rent_baht: self.rent_baht,
            electricity_units: self.electricity_units,
            electricity_rate: self.electricity_rate,
            electricity_baht: self.electricity_baht,
            water_units: self.water_units,
            water_rate: self.water_rate,
            water_baht: self.water_baht,
            other_baht: self.other_baht,
            common_fee_baht: self.common_fee_baht,
            garbage_fee_baht: self.garbage_fee_baht,
            include_common_fee: self.include_common_fee,
            include_garbage_fee: self.include_garbage_fee,
        }
    }
}

pub(crate) fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// Default due date: `issue_date` plus `term_days`.
pub fn default_due_date(issue_date: NaiveDate, term_days: u32) -> NaiveDate {
    issue_date
        .checked_add_days(Days::new(u64::from(term_days)))
        .unwrap_or(issue_date)
}

/// Invoice lifecycle operations on top of the repositories.
#[derive(Clone)]
pub struct InvoicingService {
    repos: Repositories,
    assembler: InvoiceAssembler,
    settings: Arc<InvoiceSettingsStore>,
}

impl InvoicingService {
    pub fn new(repos: Repositories, settings: Arc<InvoiceSettingsStore>) -> Self {
        let assembler = InvoiceAssembler::new(
            repos.tenants.clone(),
            MaintenanceAggregator::new(repos.maintenance.clone()),
            DebtCalculator::new(repos.invoices.clone(), settings.clone()),
        );
        Self {
            repos,
            assembler,
            settings,
        }
    }

    pub fn assembler(&self) -> &InvoiceAssembler {
        &self.assembler
    }

    pub fn settings(&self) -> &Arc<InvoiceSettingsStore> {
        &self.settings
    }

    pub fn repositories(&self) -> &Repositories {
        &self.repos
    }

    /// Creates the invoice for one room and period.
    ///
    /// A second invoice for the same room and period is a `Conflict`.
    #[instrument(skip(self, request), fields(room_id = request.room_id))]
    pub async fn create_invoice(
        &self,
        request: CreateInvoiceRequest,
    ) -> Result<invoice::Model, ServiceError> {
        request.validate()?;

        let room = self
            .repos
            .rooms
            .find_by_id(request.room_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Room {} not found", request.room_id)))?;

        let issue_date = request.issue_date.unwrap_or_else(today);
        let period = BillingPeriod::new(
            request.billing_year.unwrap_or_else(|| issue_date.year()),
            request.billing_month.unwrap_or_else(|| issue_date.month()),
        )?;
        let due_date = request
            .due_date
            .unwrap_or_else(|| default_due_date(issue_date, self.settings.payment_term_days()));
        if due_date < issue_date {
            return Err(ServiceError::ValidationError(format!(
                "Due date {} is before issue date {}",
                due_date, issue_date
            )));
        }

        if self.repos.invoices.exists_for_period(room.id, period).await? {
            return Err(ServiceError::Conflict(duplicate_invoice_message(
                room.id,
                period.year(),
                period.month() as i32,
            )));
        }

        let lease = self
            .repos
            .leases
            .find_active_for_room_on(room.id, issue_date)
            .await?;

        let draft = InvoiceDraft {
            overrides: request.overrides(),
            room,
            lease,
            tenant_id: request.tenant_id,
            period,
            issue_date,
            due_date: Some(due_date),
        };
        let invoice = self.assembler.assemble(&draft).await?;
        let saved = self.repos.invoices.insert(invoice).await?;

        BILLING_METRICS.record_invoice_created();
        info!(
            invoice_id = saved.id,
            %period,
            total = %saved.total_baht,
            accumulated = %saved.accumulated_total,
            "Invoice created"
        );
        Ok(saved)
    }

    pub async fn get_invoice(&self, id: i32) -> Result<invoice::Model, ServiceError> {
        self.repos
            .invoices
            .find_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Invoice {} not found", id)))
    }

    /// Invoices of a room, oldest period first.
    pub async fn list_invoices_for_room(
        &self,
        room_id: i32,
    ) -> Result<Vec<invoice::Model>, ServiceError> {
        if self.repos.rooms.find_by_id(room_id).await?.is_none() {
            return Err(ServiceError::NotFound(format!("Room {} not found", room_id)));
        }
        self.repos.invoices.list_by_room(room_id).await
    }

    /// Applies a partial edit and recomputes `total_baht`; the debt
    /// snapshot is not recomputed.
    #[instrument(skip(self, patch))]
    pub async fn patch_invoice(
        &self,
        id: i32,
        patch: InvoicePatch,
    ) -> Result<invoice::Model, ServiceError> {
        let mut invoice = self.get_invoice(id).await?;
        apply_patch(&mut invoice, &patch)?;
        let updated = self.repos.invoices.update(invoice).await?;
        info!(invoice_id = id, total = %updated.total_baht, "Invoice patched");
        Ok(updated)
    }

    /// Marks an invoice PAID; `paid_date` defaults to today.
    #[instrument(skip(self))]
    pub async fn mark_paid(
        &self,
        id: i32,
        paid_date: Option<NaiveDate>,
    ) -> Result<invoice::Model, ServiceError> {
        let mut invoice = self.get_invoice(id).await?;
        if invoice.is_paid() {
            return Err(ServiceError::Conflict(format!(
                "Invoice {} is already paid",
                id
            )));
        }
        invoice.status = InvoiceStatus::Paid;
        invoice.paid_date = Some(paid_date.unwrap_or_else(today));
        let updated = self.repos.invoices.update(invoice).await?;
        info!(invoice_id = id, "Invoice marked paid");
        Ok(updated)
    }

    /// Flags every PENDING invoice due before `as_of` as OVERDUE and
    /// returns how many changed.
    #[instrument(skip(self))]
    pub async fn mark_overdue(&self, as_of: NaiveDate) -> Result<u64, ServiceError> {
        let pending = self.repos.invoices.find_pending_due_before(as_of).await?;
        let mut changed = 0u64;
        for mut invoice in pending {
            invoice.status = InvoiceStatus::Overdue;
            self.repos.invoices.update(invoice).await?;
            changed += 1;
        }
        info!(changed, %as_of, "Marked overdue invoices");
        Ok(changed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn due_date_adds_payment_term() {
        let issue = NaiveDate::from_ymd_opt(2025, 1, 28).unwrap();
        assert_eq!(
            default_due_date(issue, 7),
            NaiveDate::from_ymd_opt(2025, 2, 4).unwrap()
        );
        assert_eq!(default_due_date(issue, 0), issue);
    }
}
