use async_trait::async_trait;
use chrono::NaiveDate;
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, DatabaseConnection, EntityTrait,
    QueryFilter, QueryOrder,
};
use std::sync::Arc;

use crate::entities::maintenance::{
    ActiveModel, Column, Entity as Maintenance, MaintenanceStatus, Model,
};
use crate::errors::ServiceError;

use super::{BaseRepository, MaintenanceRepository, Repository};

#[derive(Debug, Clone)]
pub struct SeaOrmMaintenanceRepository {
    base: BaseRepository,
}

impl SeaOrmMaintenanceRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }
}

#[async_trait]
impl MaintenanceRepository for SeaOrmMaintenanceRepository {
    async fn find_completed_between(
        &self,
        room_id: i32,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Model>, ServiceError> {
        Ok(Maintenance::find()
            .filter(Column::RoomId.eq(room_id))
            .filter(Column::Status.eq(MaintenanceStatus::Completed))
            .filter(Column::CompletedDate.between(from, to))
            .order_by_asc(Column::CompletedDate)
            .all(self.base.get_db())
            .await?)
    }

    async fn insert(&self, item: Model) -> Result<Model, ServiceError> {
        let mut active: ActiveModel = item.into();
        active.id = NotSet;
        Ok(active.insert(self.base.get_db()).await?)
    }
}
