//! Builds a fully computed invoice from its inputs.
//!
//! Shared by interactive creation and CSV import so both follow the same
//! fee precedence, maintenance and debt rules.

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{debug, instrument};

use crate::entities::invoice::{self, InvoiceStatus};
use crate::entities::{lease, room};
use crate::errors::ServiceError;
use crate::models::BillingPeriod;
use crate::repositories::TenantRepository;
use crate::services::debt::{DebtCalculator, DebtSummary};
use crate::services::fee_resolver::{resolve_fees, FeeOverrides, ResolvedFees};
use crate::services::maintenance_costs::MaintenanceAggregator;
use crate::services::money;

/// Everything needed to assemble one invoice.
#[derive(Debug, Clone)]
pub struct InvoiceDraft {
    pub room: room::Model,
    /// Lease active on the issue date
    pub lease: Option<lease::Model>,
    /// Tenant named by the caller; must match the lease tenant when both exist
    pub tenant_id: Option<i32>,
    pub period: BillingPeriod,
    pub issue_date: NaiveDate,
    pub due_date: Option<NaiveDate>,
    pub overrides: FeeOverrides,
}

/// Picks the tenant to bill.
pub fn resolve_tenant(
    lease: Option<&lease::Model>,
    explicit: Option<i32>,
) -> Result<i32, ServiceError> {
    match (lease, explicit) {
        (Some(lease), Some(tenant_id)) if lease.tenant_id != tenant_id => {
            Err(ServiceError::ValidationError(format!(
                "Tenant {} does not match tenant {} on the active lease {}",
                tenant_id, lease.tenant_id, lease.id
            )))
        }
        (Some(lease), _) => Ok(lease.tenant_id),
        (None, Some(tenant_id)) => Ok(tenant_id),
        (None, None) => Err(ServiceError::ValidationError(
            "No tenant could be resolved: the room has no active lease and no tenant was given"
                .to_string(),
        )),
    }
}

/// Combines resolved parts into an unsaved invoice (id 0, status PENDING).
///
/// `total_baht` is the exact sum of the category amounts and
/// `accumulated_total` adds the carried-forward debt on top. Both must fit
/// the stored amount columns.
pub fn build_invoice(
    draft: &InvoiceDraft,
    tenant_id: i32,
    fees: ResolvedFees,
    maintenance_baht: Decimal,
    debt: DebtSummary,
) -> Result<invoice::Model, ServiceError> {
    let total_baht = money::checked_add(fees.subtotal()?, maintenance_baht)?;
    let accumulated_total = money::sum([
        Some(total_baht),
        Some(debt.previous_balance),
        Some(debt.interest_charge),
    ])?;
    money::ensure_amount("total_baht", Some(total_baht))?;
    money::ensure_amount("accumulated_total", Some(accumulated_total))?;

    Ok(invoice::Model {
        id: 0,
        room_id: draft.room.id,
        tenant_id,
        billing_year: draft.period.year(),
        billing_month: draft.period.month() as i32,
        issue_date: draft.issue_date,
        due_date: draft.due_date,
        rent_baht: fees.rent_baht,
        electricity_units: fees.electricity_units,
        electricity_rate: fees.electricity_rate,
        electricity_baht: fees.electricity_baht,
        water_units: fees.water_units,
        water_rate: fees.water_rate,
        water_baht: fees.water_baht,
        other_baht: fees.other_baht,
        common_fee_baht: fees.common_fee_baht,
        garbage_fee_baht: fees.garbage_fee_baht,
        maintenance_baht,
        total_baht,
        previous_balance: debt.previous_balance,
        interest_charge: debt.interest_charge,
        accumulated_total,
        status: InvoiceStatus::Pending,
        paid_date: None,
        created_at: Utc::now(),
    })
}

#[derive(Clone)]
pub struct InvoiceAssembler {
    tenants: Arc<dyn TenantRepository>,
    maintenance: MaintenanceAggregator,
    debt: DebtCalculator,
}

impl InvoiceAssembler {
    pub fn new(
        tenants: Arc<dyn TenantRepository>,
        maintenance: MaintenanceAggregator,
        debt: DebtCalculator,
    ) -> Self {
        Self {
            tenants,
            maintenance,
            debt,
        }
    }

    /// Resolves tenant, fees, maintenance and debt into an unsaved invoice.
    #[instrument(skip(self, draft), fields(room_id = draft.room.id, period = %draft.period))]
    pub async fn assemble(&self, draft: &InvoiceDraft) -> Result<invoice::Model, ServiceError> {
        let tenant_id = resolve_tenant(draft.lease.as_ref(), draft.tenant_id)?;
        if self.tenants.find_by_id(tenant_id).await?.is_none() {
            return Err(ServiceError::NotFound(format!(
                "Tenant {} not found",
                tenant_id
            )));
        }

        let fees = resolve_fees(&draft.room, draft.lease.as_ref(), &draft.overrides)?;
        let maintenance_baht = self
            .maintenance
            .total_for_period(draft.room.id, draft.period)
            .await?;
        let debt = self.debt.calculate(draft.room.id, draft.period).await?;

        let invoice = build_invoice(draft, tenant_id, fees, maintenance_baht, debt)?;
        debug!(
            tenant_id,
            total = %invoice.total_baht,
            accumulated = %invoice.accumulated_total,
            "Assembled invoice"
        );
        Ok(invoice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::lease::LeaseStatus;
    use crate::entities::room::RoomStatus;
    use assert_matches::assert_matches;
    use rust_decimal_macros::dec;

    fn lease_for(tenant_id: i32) -> lease::Model {
        lease::Model {
            id: 9,
            room_id: 1,
            tenant_id,
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            end_date: None,
            monthly_rent: dec!(5000),
            deposit: dec!(10000),
            status: LeaseStatus::Active,
        }
    }

    #[test]
    fn tenant_resolution_rules() {
        let lease = lease_for(4);
        assert_eq!(resolve_tenant(Some(&lease), None).unwrap(), 4);
        assert_eq!(resolve_tenant(Some(&lease), Some(4)).unwrap(), 4);
        assert_eq!(resolve_tenant(None, Some(8)).unwrap(), 8);
        assert_matches!(
            resolve_tenant(Some(&lease), Some(5)),
            Err(ServiceError::ValidationError(_))
        );
        assert_matches!(
            resolve_tenant(None, None),
            Err(ServiceError::ValidationError(_))
        );
    }

    #[test]
    fn built_invoice_totals_add_up() {
        let draft = InvoiceDraft {
            room: room::Model {
                id: 1,
                room_number: "101".into(),
                status: RoomStatus::Occupied,
                common_fee_baht: dec!(200),
                garbage_fee_baht: dec!(40),
                tenant_id: None,
            },
            lease: Some(lease_for(4)),
            tenant_id: None,
            period: BillingPeriod::new(2025, 4).unwrap(),
            issue_date: NaiveDate::from_ymd_opt(2025, 4, 1).unwrap(),
            due_date: NaiveDate::from_ymd_opt(2025, 4, 8),
            overrides: FeeOverrides {
                electricity_units: Some(120),
                electricity_rate: Some(dec!(7)),
                include_common_fee: true,
                include_garbage_fee: true,
                ..Default::default()
            },
        };
        let fees = resolve_fees(&draft.room, draft.lease.as_ref(), &draft.overrides).unwrap();
        let debt = DebtSummary {
            previous_balance: dec!(3000),
            interest_charge: dec!(120),
            accumulated_total: dec!(3120),
        };

        let invoice = build_invoice(&draft, 4, fees, dec!(350), debt).unwrap();
        // 5000 rent + 840 electricity + 200 common + 40 garbage + 350 maintenance
        assert_eq!(invoice.total_baht, dec!(6430));
        assert_eq!(invoice.accumulated_total, dec!(9550));
        assert_eq!(invoice.water_baht, None);
        assert_eq!(invoice.status, InvoiceStatus::Pending);
        assert_eq!(invoice.billing_month, 4);
    }
}
