//! Persistence seams for the billing engine.
//!
//! Each entity has an object-safe async trait. [`Repositories`] bundles one
//! implementation of each, backed either by SeaORM or by process memory.

use async_trait::async_trait;
use chrono::NaiveDate;
use sea_orm::DatabaseConnection;
use std::sync::Arc;

use crate::entities::{invoice, lease, maintenance, room, tenant};
use crate::errors::ServiceError;
use crate::models::BillingPeriod;

pub mod in_memory;
pub mod invoice_repository;
pub mod lease_repository;
pub mod maintenance_repository;
pub mod room_repository;
pub mod tenant_repository;

pub use in_memory::InMemoryStore;
pub use invoice_repository::SeaOrmInvoiceRepository;
pub use lease_repository::SeaOrmLeaseRepository;
pub use maintenance_repository::SeaOrmMaintenanceRepository;
pub use room_repository::SeaOrmRoomRepository;
pub use tenant_repository::SeaOrmTenantRepository;

/// Repository trait for common database operations
pub trait Repository {
    fn get_db(&self) -> &DatabaseConnection;
}

#[derive(Debug, Clone)]
pub struct BaseRepository {
    db: Arc<DatabaseConnection>,
}

impl BaseRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

impl Repository for BaseRepository {
    fn get_db(&self) -> &DatabaseConnection {
        &self.db
    }
}

#[async_trait]
pub trait RoomRepository: Send + Sync {
    async fn find_by_id(&self, id: i32) -> Result<Option<room::Model>, ServiceError>;
    async fn find_by_number(&self, room_number: &str)
        -> Result<Option<room::Model>, ServiceError>;
    /// Inserts `room`, ignoring its `id` and returning the stored row.
    async fn insert(&self, room: room::Model) -> Result<room::Model, ServiceError>;
}

#[async_trait]
pub trait TenantRepository: Send + Sync {
    async fn find_by_id(&self, id: i32) -> Result<Option<tenant::Model>, ServiceError>;
    async fn insert(&self, tenant: tenant::Model) -> Result<tenant::Model, ServiceError>;
}

#[async_trait]
pub trait LeaseRepository: Send + Sync {
    /// The ACTIVE lease of `room_id` whose date range covers `date`.
    async fn find_active_for_room_on(
        &self,
        room_id: i32,
        date: NaiveDate,
    ) -> Result<Option<lease::Model>, ServiceError>;
    async fn insert(&self, lease: lease::Model) -> Result<lease::Model, ServiceError>;
}

#[async_trait]
pub trait MaintenanceRepository: Send + Sync {
    /// COMPLETED items of `room_id` with a completed date in `from..=to`.
    async fn find_completed_between(
        &self,
        room_id: i32,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<maintenance::Model>, ServiceError>;
    async fn insert(&self, item: maintenance::Model)
        -> Result<maintenance::Model, ServiceError>;
}

#[async_trait]
pub trait InvoiceRepository: Send + Sync {
    async fn find_by_id(&self, id: i32) -> Result<Option<invoice::Model>, ServiceError>;

    async fn exists_for_period(
        &self,
        room_id: i32,
        period: BillingPeriod,
    ) -> Result<bool, ServiceError>;

    /// Invoices of `room_id` billed strictly before `period` and not PAID,
    /// oldest period first.
    async fn find_unpaid_before(
        &self,
        room_id: i32,
        period: BillingPeriod,
    ) -> Result<Vec<invoice::Model>, ServiceError>;

    /// Inserts the invoice unless one already exists for its room and
    /// period, in which case `ServiceError::Conflict` is returned and
    /// nothing is written.
    async fn insert(&self, invoice: invoice::Model) -> Result<invoice::Model, ServiceError>;

    /// Overwrites every column of an existing invoice.
    async fn update(&self, invoice: invoice::Model) -> Result<invoice::Model, ServiceError>;

    /// All invoices of `room_id`, oldest period first.
    async fn list_by_room(&self, room_id: i32) -> Result<Vec<invoice::Model>, ServiceError>;

    /// PENDING invoices whose due date is strictly before `date`.
    async fn find_pending_due_before(
        &self,
        date: NaiveDate,
    ) -> Result<Vec<invoice::Model>, ServiceError>;
}

pub(crate) fn duplicate_invoice_message(room_id: i32, year: i32, month: i32) -> String {
    format!(
        "Invoice already exists for room {} in period {:04}-{:02}",
        room_id, year, month
    )
}

/// One implementation of every repository trait.
#[derive(Clone)]
pub struct Repositories {
    pub rooms: Arc<dyn RoomRepository>,
    pub tenants: Arc<dyn TenantRepository>,
    pub leases: Arc<dyn LeaseRepository>,
    pub maintenance: Arc<dyn MaintenanceRepository>,
    pub invoices: Arc<dyn InvoiceRepository>,
}

impl Repositories {
    pub fn sea_orm(db: Arc<DatabaseConnection>) -> Self {
        Self {
            rooms: Arc::new(SeaOrmRoomRepository::new(db.clone())),
            tenants: Arc::new(SeaOrmTenantRepository::new(db.clone())),
            leases: Arc::new(SeaOrmLeaseRepository::new(db.clone())),
            maintenance: Arc::new(SeaOrmMaintenanceRepository::new(db.clone())),
            invoices: Arc::new(SeaOrmInvoiceRepository::new(db)),
        }
    }

    pub fn in_memory() -> Self {
        let store = Arc::new(InMemoryStore::default());
        Self {
            rooms: store.clone(),
            tenants: store.clone(),
            leases: store.clone(),
            maintenance: store.clone(),
            invoices: store,
        }
    }
}
