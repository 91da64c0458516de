use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, DatabaseConnection, EntityTrait,
    QueryFilter,
};
use std::sync::Arc;

use crate::entities::room::{ActiveModel, Column, Entity as Room, Model};
use crate::errors::ServiceError;

use super::{BaseRepository, Repository, RoomRepository};

#[derive(Debug, Clone)]
pub struct SeaOrmRoomRepository {
    base: BaseRepository,
}

impl SeaOrmRoomRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }
}

#[async_trait]
impl RoomRepository for SeaOrmRoomRepository {
    async fn find_by_id(&self, id: i32) -> Result<Option<Model>, ServiceError> {
        Ok(Room::find_by_id(id).one(self.base.get_db()).await?)
    }

    async fn find_by_number(&self, room_number: &str) -> Result<Option<Model>, ServiceError> {
        Ok(Room::find()
            .filter(Column::RoomNumber.eq(room_number))
            .one(self.base.get_db())
            .await?)
    }

    async fn insert(&self, room: Model) -> Result<Model, ServiceError> {
        let room_number = room.room_number.clone();
        let mut active: ActiveModel = room.into();
        active.id = NotSet;
        active.insert(self.base.get_db()).await.map_err(|e| {
            ServiceError::from_insert_error(e, format!("Room {} already exists", room_number))
        })
    }
}
