use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::debug;

use crate::errors::ServiceError;
use crate::models::BillingPeriod;
use crate::repositories::MaintenanceRepository;
use crate::services::money;

/// Sums completed maintenance costs for a room within one billing month.
#[derive(Clone)]
pub struct MaintenanceAggregator {
    maintenance: Arc<dyn MaintenanceRepository>,
}

impl MaintenanceAggregator {
    pub fn new(maintenance: Arc<dyn MaintenanceRepository>) -> Self {
        Self { maintenance }
    }

    /// Total cost of COMPLETED items finished between the first and last day
    /// of `period`, inclusive. Items without a cost count as zero.
    pub async fn total_for_period(
        &self,
        room_id: i32,
        period: BillingPeriod,
    ) -> Result<Decimal, ServiceError> {
        let items = self
            .maintenance
            .find_completed_between(room_id, period.first_day(), period.last_day())
            .await?;

        let total = money::sum(items.iter().map(|item| item.cost))?;
        debug!(room_id, %period, items = items.len(), %total, "Aggregated maintenance costs");
        Ok(total)
    }
}
