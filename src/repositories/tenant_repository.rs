use async_trait::async_trait;
use sea_orm::{ActiveModelTrait, ActiveValue::NotSet, DatabaseConnection, EntityTrait};
use std::sync::Arc;

use crate::entities::tenant::{ActiveModel, Entity as Tenant, Model};
use crate::errors::ServiceError;

use super::{BaseRepository, Repository, TenantRepository};

#[derive(Debug, Clone)]
pub struct SeaOrmTenantRepository {
    base: BaseRepository,
}

impl SeaOrmTenantRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }
}

#[async_trait]
impl TenantRepository for SeaOrmTenantRepository {
    async fn find_by_id(&self, id: i32) -> Result<Option<Model>, ServiceError> {
        Ok(Tenant::find_by_id(id).one(self.base.get_db()).await?)
    }

    async fn insert(&self, tenant: Model) -> Result<Model, ServiceError> {
        let mut active: ActiveModel = tenant.into();
        active.id = NotSet;
        Ok(active.insert(self.base.get_db()).await?)
    }
}
