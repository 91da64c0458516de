//! Carry-forward balance and simple monthly interest on unpaid invoices.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, instrument};
use utoipa::ToSchema;

use crate::entities::invoice;
use crate::errors::ServiceError;
use crate::models::{whole_months_between, BillingPeriod};
use crate::repositories::InvoiceRepository;
use crate::services::invoice_settings::InvoiceSettingsStore;
use crate::services::money;

/// What a room owes from earlier periods as of a target period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, ToSchema)]
pub struct DebtSummary {
    pub previous_balance: Decimal,
    pub interest_charge: Decimal,
    /// `previous_balance + interest_charge`; the current period's total is
    /// added by the caller.
    pub accumulated_total: Decimal,
}

/// Interest owed on one unpaid invoice, rounded to satang.
///
/// Zero unless at least one whole month separates `due_date` from the first
/// day of `period`.
pub fn interest_for(
    total: Decimal,
    due_date: NaiveDate,
    period: BillingPeriod,
    rate_percent: Decimal,
) -> Result<Decimal, ServiceError> {
    let months = whole_months_between(due_date, period.first_day());
    if months <= 0 {
        return Ok(Decimal::ZERO);
    }
    Ok(money::round_money(money::percent_of(total, rate_percent, months)?))
}

/// Debt from `unpaid`, which must already be limited to the room's unpaid
/// invoices from periods before `period`.
pub fn compute_debt(
    unpaid: &[invoice::Model],
    period: BillingPeriod,
    rate_percent: Option<Decimal>,
) -> Result<DebtSummary, ServiceError> {
    let rate = money::or_zero(rate_percent);

    let previous_balance = money::sum(unpaid.iter().map(|inv| Some(inv.total_baht)))?;
    let mut interest_charge = Decimal::ZERO;
    for inv in unpaid {
        if let Some(due) = inv.due_date {
            let interest = interest_for(inv.total_baht, due, period, rate)?;
            interest_charge = money::checked_add(interest_charge, interest)?;
        }
    }

    Ok(DebtSummary {
        previous_balance,
        interest_charge,
        accumulated_total: money::checked_add(previous_balance, interest_charge)?,
    })
}

#[derive(Clone)]
pub struct DebtCalculator {
    invoices: Arc<dyn InvoiceRepository>,
    settings: Arc<InvoiceSettingsStore>,
}

impl DebtCalculator {
    pub fn new(invoices: Arc<dyn InvoiceRepository>, settings: Arc<InvoiceSettingsStore>) -> Self {
        Self { invoices, settings }
    }

    #[instrument(skip(self), fields(period = %period))]
    pub async fn calculate(
        &self,
        room_id: i32,
        period: BillingPeriod,
    ) -> Result<DebtSummary, ServiceError> {
        let unpaid = self.invoices.find_unpaid_before(room_id, period).await?;
        if unpaid.is_empty() {
            return Ok(DebtSummary::default());
        }

        let rate = self.settings.interest_rate().await;
        let summary = compute_debt(&unpaid, period, rate)?;
        debug!(
            unpaid_invoices = unpaid.len(),
            previous_balance = %summary.previous_balance,
            interest_charge = %summary.interest_charge,
            "Computed carried-forward debt"
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::invoice::InvoiceStatus;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn unpaid(total: Decimal, year: i32, month: i32, due: Option<NaiveDate>) -> invoice::Model {
        invoice::Model {
            id: 0,
            room_id: 1,
            tenant_id: 1,
            billing_year: year,
            billing_month: month,
            issue_date: date(year, month as u32, 1),
            due_date: due,
            rent_baht: total,
            electricity_units: None,
            electricity_rate: None,
            electricity_baht: None,
            water_units: None,
            water_rate: None,
            water_baht: None,
            other_baht: Decimal::ZERO,
            common_fee_baht: Decimal::ZERO,
            garbage_fee_baht: Decimal::ZERO,
            maintenance_baht: Decimal::ZERO,
            total_baht: total,
            previous_balance: Decimal::ZERO,
            interest_charge: Decimal::ZERO,
            accumulated_total: total,
            status: InvoiceStatus::Pending,
            paid_date: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn no_unpaid_invoices_means_no_debt() {
        let period = BillingPeriod::new(2025, 4).unwrap();
        assert_eq!(
            compute_debt(&[], period, Some(dec!(2))).unwrap(),
            DebtSummary::default()
        );
    }

    #[test]
    fn single_invoice_two_months_late() {
        let period = BillingPeriod::new(2025, 4).unwrap();
        let invoices = [unpaid(dec!(3000), 2025, 1, Some(date(2025, 1, 5)))];

        let debt = compute_debt(&invoices, period, Some(dec!(2))).unwrap();
        assert_eq!(debt.previous_balance, dec!(3000.00));
        assert_eq!(debt.interest_charge, dec!(120.00));
        assert_eq!(debt.accumulated_total, dec!(3120.00));
    }

    #[test]
    fn missing_rate_still_carries_balance() {
        let period = BillingPeriod::new(2025, 4).unwrap();
        let invoices = [unpaid(dec!(3000), 2025, 1, Some(date(2025, 1, 5)))];

        let debt = compute_debt(&invoices, period, None).unwrap();
        assert_eq!(debt.previous_balance, dec!(3000));
        assert_eq!(debt.interest_charge, Decimal::ZERO);
    }

    #[test]
    fn invoices_without_due_date_accrue_no_interest() {
        let period = BillingPeriod::new(2025, 6).unwrap();
        let invoices = [unpaid(dec!(1000), 2025, 1, None)];
        assert_eq!(
            compute_debt(&invoices, period, Some(dec!(2)))
                .unwrap()
                .interest_charge,
            Decimal::ZERO
        );
    }

    #[test]
    fn interest_is_rounded_per_invoice_before_summing() {
        let period = BillingPeriod::new(2025, 2).unwrap();
        // 0.125 each: rounding per invoice gives 0.26, rounding the sum 0.25
        let invoices = [
            unpaid(dec!(25), 2024, 12, Some(date(2025, 1, 1))),
            unpaid(dec!(25), 2025, 1, Some(date(2025, 1, 1))),
        ];
        let debt = compute_debt(&invoices, period, Some(dec!(0.5))).unwrap();
        assert_eq!(debt.interest_charge, dec!(0.26));
        assert_eq!(debt.accumulated_total, dec!(50.26));
    }

    #[test]
    fn less_than_a_month_late_is_free() {
        let period = BillingPeriod::new(2025, 2).unwrap();
        assert_eq!(
            interest_for(dec!(5000), date(2025, 1, 7), period, dec!(2)).unwrap(),
            Decimal::ZERO
        );
    }
}
