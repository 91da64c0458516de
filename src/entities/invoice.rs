use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Monthly invoice for one room.
///
/// `total_baht` is always the sum of the category amounts. The debt fields
/// (`previous_balance`, `interest_charge`, `accumulated_total`) are a snapshot
/// taken at creation time.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "invoices")]
#[schema(as = Invoice)]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub room_id: i32,
    pub tenant_id: i32,
    pub billing_year: i32,
    pub billing_month: i32,
    pub issue_date: NaiveDate,
    #[sea_orm(nullable)]
    pub due_date: Option<NaiveDate>,

    #[sea_orm(column_type = "Decimal(Some((18, 4)))")]
    pub rent_baht: Decimal,
    #[sea_orm(nullable)]
    pub electricity_units: Option<i32>,
    #[sea_orm(column_type = "Decimal(Some((10, 4)))", nullable)]
    pub electricity_rate: Option<Decimal>,
    #[sea_orm(column_type = "Decimal(Some((18, 4)))", nullable)]
    pub electricity_baht: Option<Decimal>,
    #[sea_orm(nullable)]
    pub water_units: Option<i32>,
    #[sea_orm(column_type = "Decimal(Some((10, 4)))", nullable)]
    pub water_rate: Option<Decimal>,
    #[sea_orm(column_type = "Decimal(Some((18, 4)))", nullable)]
    pub water_baht: Option<Decimal>,
    #[sea_orm(column_type = "Decimal(Some((18, 4)))")]
    pub other_baht: Decimal,
    #[sea_orm(column_type = "Decimal(Some((18, 4)))")]
    pub common_fee_baht: Decimal,
    #[sea_orm(column_type = "Decimal(Some((18, 4)))")]
    pub garbage_fee_baht: Decimal,
    #[sea_orm(column_type = "Decimal(Some((18, 4)))")]
    pub maintenance_baht: Decimal,
    #[sea_orm(column_type = "Decimal(Some((18, 4)))")]
    pub total_baht: Decimal,

    #[sea_orm(column_type = "Decimal(Some((18, 4)))")]
    pub previous_balance: Decimal,
    #[sea_orm(column_type = "Decimal(Some((18, 4)))")]
    pub interest_charge: Decimal,
    #[sea_orm(column_type = "Decimal(Some((18, 4)))")]
    pub accumulated_total: Decimal,

    pub status: InvoiceStatus,
    #[sea_orm(nullable)]
    pub paid_date: Option<NaiveDate>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl Model {
    pub fn is_paid(&self) -> bool {
        self.status == InvoiceStatus::Paid
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::room::Entity",
        from = "Column::RoomId",
        to = "super::room::Column::Id"
    )]
    Room,
    #[sea_orm(
        belongs_to = "super::tenant::Entity",
        from = "Column::TenantId",
        to = "super::tenant::Column::Id"
    )]
    Tenant,
}

impl Related<super::room::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Room.def()
    }
}

impl Related<super::tenant::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Tenant.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InvoiceStatus {
    #[sea_orm(string_value = "PENDING")]
    Pending,
    #[sea_orm(string_value = "PAID")]
    Paid,
    #[sea_orm(string_value = "OVERDUE")]
    Overdue,
}
