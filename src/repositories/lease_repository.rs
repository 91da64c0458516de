use async_trait::async_trait;
use chrono::NaiveDate;
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, Condition, DatabaseConnection,
    EntityTrait, QueryFilter, QueryOrder,
};
use std::sync::Arc;

use crate::entities::lease::{ActiveModel, Column, Entity as Lease, LeaseStatus, Model};
use crate::errors::ServiceError;

use super::{BaseRepository, LeaseRepository, Repository};

#[derive(Debug, Clone)]
pub struct SeaOrmLeaseRepository {
    base: BaseRepository,
}

impl SeaOrmLeaseRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }
}

#[async_trait]
impl LeaseRepository for SeaOrmLeaseRepository {
    async fn find_active_for_room_on(
        &self,
        room_id: i32,
        date: NaiveDate,
    ) -> Result<Option<Model>, ServiceError> {
        Ok(Lease::find()
            .filter(Column::RoomId.eq(room_id))
            .filter(Column::Status.eq(LeaseStatus::Active))
            .filter(Column::StartDate.lte(date))
            .filter(
                Condition::any()
                    .add(Column::EndDate.is_null())
                    .add(Column::EndDate.gte(date)),
            )
            .order_by_desc(Column::StartDate)
            .one(self.base.get_db())
            .await?)
    }

    async fn insert(&self, lease: Model) -> Result<Model, ServiceError> {
        let mut active: ActiveModel = lease.into();
        active.id = NotSet;
        Ok(active.insert(self.base.get_db()).await?)
    }
}
