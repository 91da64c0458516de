use async_trait::async_trait;
use chrono::NaiveDate;
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, Condition, DatabaseConnection, DbErr,
    EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
};
use std::sync::Arc;

use crate::entities::invoice::{ActiveModel, Column, Entity as Invoice, InvoiceStatus, Model};
use crate::errors::ServiceError;
use crate::models::BillingPeriod;

use super::{duplicate_invoice_message, BaseRepository, InvoiceRepository, Repository};

#[derive(Debug, Clone)]
pub struct SeaOrmInvoiceRepository {
    base: BaseRepository,
}

impl SeaOrmInvoiceRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }
}

fn period_columns(period: BillingPeriod) -> (i32, i32) {
    (period.year(), period.month() as i32)
}

#[async_trait]
impl InvoiceRepository for SeaOrmInvoiceRepository {
    async fn find_by_id(&self, id: i32) -> Result<Option<Model>, ServiceError> {
        Ok(Invoice::find_by_id(id).one(self.base.get_db()).await?)
    }

    async fn exists_for_period(
        &self,
        room_id: i32,
        period: BillingPeriod,
    ) -> Result<bool, ServiceError> {
        let (year, month) = period_columns(period);
        let count = Invoice::find()
            .filter(Column::RoomId.eq(room_id))
            .filter(Column::BillingYear.eq(year))
            .filter(Column::BillingMonth.eq(month))
            .count(self.base.get_db())
            .await?;
        Ok(count > 0)
    }

    async fn find_unpaid_before(
        &self,
        room_id: i32,
        period: BillingPeriod,
    ) -> Result<Vec<Model>, ServiceError> {
        let (year, month) = period_columns(period);
        Ok(Invoice::find()
            .filter(Column::RoomId.eq(room_id))
            .filter(Column::Status.ne(InvoiceStatus::Paid))
            .filter(
                Condition::any().add(Column::BillingYear.lt(year)).add(
                    Condition::all()
                        .add(Column::BillingYear.eq(year))
                        .add(Column::BillingMonth.lt(month)),
                ),
            )
            .order_by_asc(Column::BillingYear)
            .order_by_asc(Column::BillingMonth)
            .all(self.base.get_db())
            .await?)
    }

    async fn insert(&self, invoice: Model) -> Result<Model, ServiceError> {
        let (room_id, year, month) = (invoice.room_id, invoice.billing_year, invoice.billing_month);
        let mut active: ActiveModel = invoice.into();
        active.id = NotSet;
        active.insert(self.base.get_db()).await.map_err(|e| {
            ServiceError::from_insert_error(e, duplicate_invoice_message(room_id, year, month))
        })
    }

    async fn update(&self, invoice: Model) -> Result<Model, ServiceError> {
        let id = invoice.id;
        let active: ActiveModel = invoice.into();
        active
            .reset_all()
            .update(self.base.get_db())
            .await
            .map_err(|e| match e {
                DbErr::RecordNotUpdated => {
                    ServiceError::NotFound(format!("Invoice {} not found", id))
                }
                other => ServiceError::DatabaseError(other),
            })
    }

    async fn list_by_room(&self, room_id: i32) -> Result<Vec<Model>, ServiceError> {
        Ok(Invoice::find()
            .filter(Column::RoomId.eq(room_id))
            .order_by_asc(Column::BillingYear)
            .order_by_asc(Column::BillingMonth)
            .all(self.base.get_db())
            .await?)
    }

    async fn find_pending_due_before(&self, date: NaiveDate) -> Result<Vec<Model>, ServiceError> {
        Ok(Invoice::find()
            .filter(Column::Status.eq(InvoiceStatus::Pending))
            .filter(Column::DueDate.lt(date))
            .order_by_asc(Column::Id)
            .all(self.base.get_db())
            .await?)
    }
}
