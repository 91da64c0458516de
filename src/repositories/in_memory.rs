//! Process-memory implementation of every repository trait.
//!
//! Used by tests and by local runs without a database. All tables sit behind
//! one `RwLock`, so the invoice existence check and insert happen atomically.

use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

use crate::entities::{
    invoice::{self, InvoiceStatus},
    lease, maintenance,
    maintenance::MaintenanceStatus,
    room, tenant,
};
use crate::errors::ServiceError;
use crate::models::BillingPeriod;

use super::{
    duplicate_invoice_message, InvoiceRepository, LeaseRepository, MaintenanceRepository,
    RoomRepository, TenantRepository,
};

#[derive(Debug, Default)]
struct Tables {
    rooms: BTreeMap<i32, room::Model>,
    tenants: BTreeMap<i32, tenant::Model>,
    leases: BTreeMap<i32, lease::Model>,
    maintenance: BTreeMap<i32, maintenance::Model>,
    invoices: BTreeMap<i32, invoice::Model>,
    last_id: i32,
}

impl Tables {
    fn next_id(&mut self) -> i32 {
        self.last_id += 1;
        self.last_id
    }
}

#[derive(Debug, Default)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
}

fn period_key(invoice: &invoice::Model) -> (i32, i32) {
    (invoice.billing_year, invoice.billing_month)
}

fn sort_by_period(invoices: &mut [invoice::Model]) {
    invoices.sort_by_key(|inv| (period_key(inv), inv.id));
}

#[async_trait]
impl RoomRepository for InMemoryStore {
    async fn find_by_id(&self, id: i32) -> Result<Option<room::Model>, ServiceError> {
        Ok(self.tables.read().await.rooms.get(&id).cloned())
    }

    async fn find_by_number(&self, room_number: &str) -> Result<Option<room::Model>, ServiceError> {
        Ok(self
            .tables
            .read()
            .await
            .rooms
            .values()
            .find(|r| r.room_number == room_number)
            .cloned())
    }

    async fn insert(&self, mut room: room::Model) -> Result<room::Model, ServiceError> {
        let mut tables = self.tables.write().await;
        if tables
            .rooms
            .values()
            .any(|r| r.room_number == room.room_number)
        {
            return Err(ServiceError::Conflict(format!(
                "Room {} already exists",
                room.room_number
            )));
        }
        room.id = tables.next_id();
        tables.rooms.insert(room.id, room.clone());
        Ok(room)
    }
}

#[async_trait]
impl TenantRepository for InMemoryStore {
    async fn find_by_id(&self, id: i32) -> Result<Option<tenant::Model>, ServiceError> {
        Ok(self.tables.read().await.tenants.get(&id).cloned())
    }

    async fn insert(&self, mut tenant: tenant::Model) -> Result<tenant::Model, ServiceError> {
        let mut tables = self.tables.write().await;
        tenant.id = tables.next_id();
        tables.tenants.insert(tenant.id, tenant.clone());
        Ok(tenant)
    }
}

#[async_trait]
impl LeaseRepository for InMemoryStore {
    async fn find_active_for_room_on(
        &self,
        room_id: i32,
        date: NaiveDate,
    ) -> Result<Option<lease::Model>, ServiceError> {
        Ok(self
            .tables
            .read()
            .await
            .leases
            .values()
            .filter(|l| l.room_id == room_id && l.covers(date))
            .max_by_key(|l| l.start_date)
            .cloned())
    }

    async fn insert(&self, mut lease: lease::Model) -> Result<lease::Model, ServiceError> {
        let mut tables = self.tables.write().await;
        lease.id = tables.next_id();
        tables.leases.insert(lease.id, lease.clone());
        Ok(lease)
    }
}

#[async_trait]
impl MaintenanceRepository for InMemoryStore {
    async fn find_completed_between(
        &self,
        room_id: i32,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<maintenance::Model>, ServiceError> {
        Ok(self
            .tables
            .read()
            .await
            .maintenance
            .values()
            .filter(|m| {
                m.room_id == room_id
                    && m.status == MaintenanceStatus::Completed
                    && m.completed_date.is_some_and(|d| from <= d && d <= to)
            })
            .cloned()
            .collect())
    }

    async fn insert(
        &self,
        mut item: maintenance::Model,
    ) -> Result<maintenance::Model, ServiceError> {
        let mut tables = self.tables.write().await;
        item.id = tables.next_id();
        tables.maintenance.insert(item.id, item.clone());
        Ok(item)
    }
}

#[async_trait]
impl InvoiceRepository for InMemoryStore {
    async fn find_by_id(&self, id: i32) -> Result<Option<invoice::Model>, ServiceError> {
        Ok(self.tables.read().await.invoices.get(&id).cloned())
    }

    async fn exists_for_period(
        &self,
        room_id: i32,
        period: BillingPeriod,
    ) -> Result<bool, ServiceError> {
        let key = (period.year(), period.month() as i32);
        Ok(self
            .tables
            .read()
            .await
            .invoices
            .values()
            .any(|inv| inv.room_id == room_id && period_key(inv) == key))
    }

    async fn find_unpaid_before(
        &self,
        room_id: i32,
        period: BillingPeriod,
    ) -> Result<Vec<invoice::Model>, ServiceError> {
        let key = (period.year(), period.month() as i32);
        let mut unpaid: Vec<invoice::Model> = self
            .tables
            .read()
            .await
            .invoices
            .values()
            .filter(|inv| inv.room_id == room_id && !inv.is_paid() && period_key(inv) < key)
            .cloned()
            .collect();
        sort_by_period(&mut unpaid);
        Ok(unpaid)
    }

    async fn insert(&self, mut invoice: invoice::Model) -> Result<invoice::Model, ServiceError> {
        let mut tables = self.tables.write().await;
        let key = period_key(&invoice);
        if tables
            .invoices
            .values()
            .any(|inv| inv.room_id == invoice.room_id && period_key(inv) == key)
        {
            return Err(ServiceError::Conflict(duplicate_invoice_message(
                invoice.room_id,
                invoice.billing_year,
                invoice.billing_month,
            )));
        }
        invoice.id = tables.next_id();
        tables.invoices.insert(invoice.id, invoice.clone());
        Ok(invoice)
    }

    async fn update(&self, invoice: invoice::Model) -> Result<invoice::Model, ServiceError> {
        let mut tables = self.tables.write().await;
        match tables.invoices.get_mut(&invoice.id) {
            Some(stored) => {
                *stored = invoice.clone();
                Ok(invoice)
            }
            None => Err(ServiceError::NotFound(format!(
                "Invoice {} not found",
                invoice.id
            ))),
        }
    }

    async fn list_by_room(&self, room_id: i32) -> Result<Vec<invoice::Model>, ServiceError> {
        let mut invoices: Vec<invoice::Model> = self
            .tables
            .read()
            .await
            .invoices
            .values()
            .filter(|inv| inv.room_id == room_id)
            .cloned()
            .collect();
        sort_by_period(&mut invoices);
        Ok(invoices)
    }

    async fn find_pending_due_before(
        &self,
        date: NaiveDate,
    ) -> Result<Vec<invoice::Model>, ServiceError> {
        Ok(self
            .tables
            .read()
            .await
            .invoices
            .values()
            .filter(|inv| {
                inv.status == InvoiceStatus::Pending && inv.due_date.is_some_and(|due| due < date)
            })
            .cloned()
            .collect())
    }
}
