#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use apartment_billing::{
    config::AppConfig,
    db::{self, DbConfig},
    entities::{
        invoice::{self, InvoiceStatus},
        lease::{self, LeaseStatus},
        maintenance::{self, MaintenanceStatus},
        room::{self, RoomStatus},
        tenant,
    },
    repositories::Repositories,
    AppState,
};

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid test date")
}

/// Configuration with a 2% monthly interest rate and a 7 day payment term.
pub fn test_config() -> AppConfig {
    let mut cfg = AppConfig::new(
        "sqlite::memory:".to_string(),
        "127.0.0.1".to_string(),
        0,
        "test".to_string(),
    );
    cfg.billing.default_interest_rate_percent = Some(dec!(2));
    cfg.billing.payment_term_days = 7;
    cfg
}

/// Application state over the in-memory repositories.
pub struct TestApp {
    pub state: AppState,
    pub repos: Repositories,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_config(test_config())
    }

    pub fn with_config(cfg: AppConfig) -> Self {
        let repos = Repositories::in_memory();
        let state = AppState::with_repositories(cfg, repos.clone());
        Self { state, repos }
    }

    /// Test app whose repositories run on a migrated in-memory SQLite database.
    pub async fn sqlite() -> Self {
        let pool = db::establish_connection_with_config(&DbConfig::in_memory_sqlite())
            .await
            .expect("connect sqlite");
        db::run_migrations(&pool).await.expect("migrate sqlite");

        let db = Arc::new(pool);
        let repos = Repositories::sea_orm(db.clone());
        let state = AppState::with_database(test_config(), db);
        Self { state, repos }
    }

    pub fn router(&self) -> Router {
        apartment_billing::build_router(self.state.clone())
    }

    pub async fn tenant(&self, name: &str) -> tenant::Model {
        self.repos
            .tenants
            .insert(tenant::Model {
                id: 0,
                name: name.to_string(),
                phone: None,
                email: None,
                created_at: Utc::now(),
            })
            .await
            .expect("insert tenant")
    }

    /// Room with a 300 baht common fee and a 50 baht garbage fee.
    pub async fn room(&self, number: &str, tenant_id: Option<i32>) -> room::Model {
        self.repos
            .rooms
            .insert(room::Model {
                id: 0,
                room_number: number.to_string(),
                status: if tenant_id.is_some() {
                    RoomStatus::Occupied
                } else {
                    RoomStatus::Available
                },
                common_fee_baht: dec!(300),
                garbage_fee_baht: dec!(50),
                tenant_id,
            })
            .await
            .expect("insert room")
    }

    pub async fn lease(
        &self,
        room_id: i32,
        tenant_id: i32,
        start: NaiveDate,
        monthly_rent: Decimal,
    ) -> lease::Model {
        self.repos
            .leases
            .insert(lease::Model {
                id: 0,
                room_id,
                tenant_id,
                start_date: start,
                end_date: None,
                monthly_rent,
                deposit: monthly_rent * dec!(2),
                status: LeaseStatus::Active,
            })
            .await
            .expect("insert lease")
    }

    pub async fn completed_maintenance(
        &self,
        room_id: i32,
        completed: NaiveDate,
        cost: Option<Decimal>,
    ) -> maintenance::Model {
        self.maintenance(room_id, MaintenanceStatus::Completed, completed, cost)
            .await
    }

    /// Maintenance item in `status`; `date` is both the scheduled and the
    /// completed date.
    pub async fn maintenance(
        &self,
        room_id: i32,
        status: MaintenanceStatus,
        date: NaiveDate,
        cost: Option<Decimal>,
    ) -> maintenance::Model {
        self.repos
            .maintenance
            .insert(maintenance::Model {
                id: 0,
                room_id,
                description: "Air conditioner service".to_string(),
                status,
                scheduled_date: date,
                completed_date: Some(date),
                cost,
            })
            .await
            .expect("insert maintenance")
    }

    /// Stores a historical PENDING invoice with only rent filled in.
    pub async fn unpaid_invoice(
        &self,
        room_id: i32,
        tenant_id: i32,
        year: i32,
        month: u32,
        total: Decimal,
        due_date: NaiveDate,
    ) -> invoice::Model {
        self.repos
            .invoices
            .insert(invoice::Model {
                id: 0,
                room_id,
                tenant_id,
                billing_year: year,
                billing_month: month as i32,
                issue_date: date(year, month, 1),
                due_date: Some(due_date),
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
            })
            .await
            .expect("insert invoice")
    }
}
