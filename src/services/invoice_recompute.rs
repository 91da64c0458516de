//! Applies a partial edit to a stored invoice and recomputes its total.
//!
//! The debt snapshot (`previous_balance`, `interest_charge`,
//! `accumulated_total`) is left exactly as it was at creation, so
//! `accumulated_total` can drift from a recomputed `total_baht`.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::ToSchema;

use crate::entities::invoice;
use crate::errors::ServiceError;
use crate::services::money::{self, ensure_amount, ensure_non_negative_units, ensure_rate};

/// Editable invoice fields. A `null` or absent field means "leave as is".
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct InvoicePatch {
    pub issue_date: Option<NaiveDate>,
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
    pub maintenance_baht: Option<Decimal>,
}

impl InvoicePatch {
    fn validate(&self) -> Result<(), ServiceError> {
        ensure_amount("rent_baht", self.rent_baht)?;
        ensure_non_negative_units("electricity_units", self.electricity_units)?;
        ensure_rate("electricity_rate", self.electricity_rate)?;
        ensure_amount("electricity_baht", self.electricity_baht)?;
        ensure_non_negative_units("water_units", self.water_units)?;
        ensure_rate("water_rate", self.water_rate)?;
        ensure_amount("water_baht", self.water_baht)?;
        ensure_amount("other_baht", self.other_baht)?;
        ensure_amount("common_fee_baht", self.common_fee_baht)?;
        ensure_amount("garbage_fee_baht", self.garbage_fee_baht)?;
        ensure_amount("maintenance_baht", self.maintenance_baht)
    }
}

/// Sum of all category amounts of `invoice`.
pub fn component_total(invoice: &invoice::Model) -> Result<Decimal, ServiceError> {
    money::sum([
        Some(invoice.rent_baht),
        invoice.electricity_baht,
        invoice.water_baht,
        Some(invoice.other_baht),
        Some(invoice.common_fee_baht),
        Some(invoice.garbage_fee_baht),
        Some(invoice.maintenance_baht),
    ])
}

fn set_if_present<T: Copy>(target: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *target = value;
    }
}

fn set_optional_if_present<T: Copy>(target: &mut Option<T>, value: Option<T>) {
    if value.is_some() {
        *target = value;
    }
}

/// Applies `patch` in place. Nothing is modified if validation or
/// recomputation fails.
pub fn apply_patch(invoice: &mut invoice::Model, patch: &InvoicePatch) -> Result<(), ServiceError> {
    patch.validate()?;

    let issue_date = patch.issue_date.unwrap_or(invoice.issue_date);
    if let Some(due) = patch.due_date.or(invoice.due_date) {
        if due < issue_date {
            return Err(ServiceError::ValidationError(format!(
                "Due date {} is before issue date {}",
                due, issue_date
            )));
        }
    }

    let mut updated = invoice.clone();
    set_if_present(&mut updated.issue_date, patch.issue_date);
    set_optional_if_present(&mut updated.due_date, patch.due_date);
    set_if_present(&mut updated.rent_baht, patch.rent_baht);
    set_optional_if_present(&mut updated.electricity_units, patch.electricity_units);
    set_optional_if_present(&mut updated.electricity_rate, patch.electricity_rate);
    set_optional_if_present(&mut updated.electricity_baht, patch.electricity_baht);
    set_optional_if_present(&mut updated.water_units, patch.water_units);
    set_optional_if_present(&mut updated.water_rate, patch.water_rate);
    set_optional_if_present(&mut updated.water_baht, patch.water_baht);
    set_if_present(&mut updated.other_baht, patch.other_baht);
    set_if_present(&mut updated.common_fee_baht, patch.common_fee_baht);
    set_if_present(&mut updated.garbage_fee_baht, patch.garbage_fee_baht);
    set_if_present(&mut updated.maintenance_baht, patch.maintenance_baht);

    // Metered amounts always follow units × rate once both are known
    if let Some(amount) = money::multiply(updated.electricity_units, updated.electricity_rate)? {
        ensure_amount("electricity_baht", Some(amount))?;
        updated.electricity_baht = Some(amount);
    }
    if let Some(amount) = money::multiply(updated.water_units, updated.water_rate)? {
        ensure_amount("water_baht", Some(amount))?;
        updated.water_baht = Some(amount);
    }

    updated.total_baht = component_total(&updated)?;
    ensure_amount("total_baht", Some(updated.total_baht))?;
    *invoice = updated;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::invoice::InvoiceStatus;
    use assert_matches::assert_matches;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn stored_invoice() -> invoice::Model {
        invoice::Model {
            id: 11,
            room_id: 1,
            tenant_id: 2,
            billing_year: 2025,
            billing_month: 4,
            issue_date: NaiveDate::from_ymd_opt(2025, 4, 1).unwrap(),
            due_date: NaiveDate::from_ymd_opt(2025, 4, 8),
            rent_baht: dec!(4000),
            electricity_units: Some(100),
            electricity_rate: Some(dec!(5)),
            electricity_baht: Some(dec!(500)),
            water_units: None,
            water_rate: None,
            water_baht: Some(dec!(100)),
            other_baht: Decimal::ZERO,
            common_fee_baht: dec!(300),
            garbage_fee_baht: Decimal::ZERO,
            maintenance_baht: Decimal::ZERO,
            total_baht: dec!(4900),
            previous_balance: dec!(3000),
            interest_charge: dec!(120),
            accumulated_total: dec!(8020),
            status: InvoiceStatus::Pending,
            paid_date: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn water_units_and_rate_recompute_amount_and_total_only() {
        let mut invoice = stored_invoice();
        let patch = InvoicePatch {
            water_units: Some(15),
            water_rate: Some(dec!(18.50)),
            ..Default::default()
        };

        apply_patch(&mut invoice, &patch).unwrap();

        assert_eq!(invoice.water_baht, Some(dec!(277.50)));
        assert_eq!(invoice.total_baht, dec!(5077.50));
        assert_eq!(invoice.previous_balance, dec!(3000));
        assert_eq!(invoice.interest_charge, dec!(120));
        assert_eq!(invoice.accumulated_total, dec!(8020));
    }

    #[test]
    fn explicit_amount_is_overwritten_when_units_and_rate_exist() {
        let mut invoice = stored_invoice();
        let patch = InvoicePatch {
            electricity_baht: Some(dec!(999)),
            ..Default::default()
        };

        apply_patch(&mut invoice, &patch).unwrap();
        assert_eq!(invoice.electricity_baht, Some(dec!(500)));
    }

    #[test]
    fn empty_patch_leaves_fields_untouched() {
        let mut invoice = stored_invoice();
        let before = invoice.clone();
        apply_patch(&mut invoice, &InvoicePatch::default()).unwrap();
        assert_eq!(invoice, before);
    }

    #[test]
    fn rejected_patch_changes_nothing() {
        let mut invoice = stored_invoice();
        let before = invoice.clone();
        let patch = InvoicePatch {
            rent_baht: Some(dec!(100)),
            other_baht: Some(dec!(-5)),
            ..Default::default()
        };
        assert_matches!(
            apply_patch(&mut invoice, &patch),
            Err(ServiceError::ValidationError(_))
        );
        assert_eq!(invoice, before);
    }

    #[test]
    fn overflowing_product_is_rejected_without_changes() {
        let mut invoice = stored_invoice();
        let before = invoice.clone();
        let patch = InvoicePatch {
            electricity_units: Some(i32::MAX),
            electricity_rate: Some(dec!(999999.9999)),
            ..Default::default()
        };
        assert_matches!(
            apply_patch(&mut invoice, &patch),
            Err(ServiceError::ValidationError(msg)) if msg.contains("electricity_baht")
        );
        assert_eq!(invoice, before);
    }

    #[test]
    fn rates_finer_than_four_places_are_rejected() {
        let mut invoice = stored_invoice();
        let patch = InvoicePatch {
            water_units: Some(1),
            water_rate: Some(dec!(0.00001)),
            ..Default::default()
        };
        assert_matches!(
            apply_patch(&mut invoice, &patch),
            Err(ServiceError::ValidationError(msg)) if msg.contains("decimal places")
        );
    }
}
