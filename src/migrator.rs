use anyhow::Result;
use sea_orm::{ConnectOptions, Database};
use sea_orm_migration::prelude::*;
use std::time::Duration;
use tracing::{error, info};

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250101_000001_create_tenants_and_rooms::Migration),
            Box::new(m20250101_000002_create_leases_and_maintenance::Migration),
            Box::new(m20250101_000003_create_invoices::Migration),
        ]
    }
}

mod m20250101_000001_create_tenants_and_rooms {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250101_000001_create_tenants_and_rooms"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Tenants::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Tenants::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Tenants::Name).string().not_null())
                        .col(ColumnDef::new(Tenants::Phone).string().null())
                        .col(ColumnDef::new(Tenants::Email).string().null())
                        .col(
                            ColumnDef::new(Tenants::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Rooms::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Rooms::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(Rooms::RoomNumber)
                                .string_len(20)
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Rooms::Status).string_len(20).not_null())
                        .col(
                            ColumnDef::new(Rooms::CommonFeeBaht)
                                .decimal_len(12, 2)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Rooms::GarbageFeeBaht)
                                .decimal_len(12, 2)
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(Rooms::TenantId).integer().null())
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_rooms_tenant_id")
                                .from(Rooms::Table, Rooms::TenantId)
                                .to(Tenants::Table, Tenants::Id)
                                .on_delete(ForeignKeyAction::SetNull),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Rooms::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Tenants::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum Tenants {
        Table,
        Id,
        Name,
        Phone,
        Email,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    pub(super) enum Rooms {
        Table,
        Id,
        RoomNumber,
        Status,
        CommonFeeBaht,
        GarbageFeeBaht,
        TenantId,
    }
}

mod m20250101_000002_create_leases_and_maintenance {
    use super::m20250101_000001_create_tenants_and_rooms::{Rooms, Tenants};
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250101_000002_create_leases_and_maintenance"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Leases::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Leases::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Leases::RoomId).integer().not_null())
                        .col(ColumnDef::new(Leases::TenantId).integer().not_null())
                        .col(ColumnDef::new(Leases::StartDate).date().not_null())
                        .col(ColumnDef::new(Leases::EndDate).date().null())
                        .col(
                            ColumnDef::new(Leases::MonthlyRent)
                                .decimal_len(12, 2)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Leases::Deposit)
                                .decimal_len(12, 2)
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(Leases::Status).string_len(20).not_null())
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_leases_room_id")
                                .from(Leases::Table, Leases::RoomId)
                                .to(Rooms::Table, Rooms::Id),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_leases_tenant_id")
                                .from(Leases::Table, Leases::TenantId)
                                .to(Tenants::Table, Tenants::Id),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_leases_room_status")
                        .table(Leases::Table)
                        .col(Leases::RoomId)
                        .col(Leases::Status)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Maintenance::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Maintenance::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Maintenance::RoomId).integer().not_null())
                        .col(ColumnDef::new(Maintenance::Description).text().not_null())
                        .col(
                            ColumnDef::new(Maintenance::Status)
                                .string_len(20)
                                .not_null(),
                        )
                        .col(ColumnDef::new(Maintenance::ScheduledDate).date().not_null())
                        .col(ColumnDef::new(Maintenance::CompletedDate).date().null())
                        .col(ColumnDef::new(Maintenance::Cost).decimal_len(12, 2).null())
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_maintenance_room_id")
                                .from(Maintenance::Table, Maintenance::RoomId)
                                .to(Rooms::Table, Rooms::Id),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_maintenance_room_completed")
                        .table(Maintenance::Table)
                        .col(Maintenance::RoomId)
                        .col(Maintenance::CompletedDate)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Maintenance::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Leases::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Leases {
        Table,
        Id,
        RoomId,
        TenantId,
        StartDate,
        EndDate,
        MonthlyRent,
        Deposit,
        Status,
    }

    #[derive(DeriveIden)]
    enum Maintenance {
        Table,
        Id,
        RoomId,
        Description,
        Status,
        ScheduledDate,
        CompletedDate,
        Cost,
    }
}

mod m20250101_000003_create_invoices {
    use super::m20250101_000001_create_tenants_and_rooms::{Rooms, Tenants};
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250101_000003_create_invoices"
        }
    }

    /// Amounts keep the scale of `units × rate`.
    fn money(col: Invoices) -> ColumnDef {
        ColumnDef::new(col)
            .decimal_len(18, 4)
            .not_null()
            .default(0)
            .to_owned()
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Invoices::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Invoices::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Invoices::RoomId).integer().not_null())
                        .col(ColumnDef::new(Invoices::TenantId).integer().not_null())
                        .col(ColumnDef::new(Invoices::BillingYear).integer().not_null())
                        .col(ColumnDef::new(Invoices::BillingMonth).integer().not_null())
                        .col(ColumnDef::new(Invoices::IssueDate).date().not_null())
                        .col(ColumnDef::new(Invoices::DueDate).date().null())
                        .col(money(Invoices::RentBaht))
                        .col(ColumnDef::new(Invoices::ElectricityUnits).integer().null())
                        .col(
                            ColumnDef::new(Invoices::ElectricityRate)
                                .decimal_len(10, 4)
                                .null(),
                        )
                        .col(
                            ColumnDef::new(Invoices::ElectricityBaht)
                                .decimal_len(18, 4)
                                .null(),
                        )
                        .col(ColumnDef::new(Invoices::WaterUnits).integer().null())
                        .col(ColumnDef::new(Invoices::WaterRate).decimal_len(10, 4).null())
                        .col(ColumnDef::new(Invoices::WaterBaht).decimal_len(18, 4).null())
                        .col(money(Invoices::OtherBaht))
                        .col(money(Invoices::CommonFeeBaht))
                        .col(money(Invoices::GarbageFeeBaht))
                        .col(money(Invoices::MaintenanceBaht))
                        .col(money(Invoices::TotalBaht))
                        .col(money(Invoices::PreviousBalance))
                        .col(money(Invoices::InterestCharge))
                        .col(money(Invoices::AccumulatedTotal))
                        .col(ColumnDef::new(Invoices::Status).string_len(20).not_null())
                        .col(ColumnDef::new(Invoices::PaidDate).date().null())
                        .col(
                            ColumnDef::new(Invoices::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_invoices_room_id")
                                .from(Invoices::Table, Invoices::RoomId)
                                .to(Rooms::Table, Rooms::Id),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_invoices_tenant_id")
                                .from(Invoices::Table, Invoices::TenantId)
                                .to(Tenants::Table, Tenants::Id),
                        )
                        .to_owned(),
                )
                .await?;

            // One invoice per room and billing period
            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("uq_invoices_room_period")
                        .table(Invoices::Table)
                        .col(Invoices::RoomId)
                        .col(Invoices::BillingYear)
                        .col(Invoices::BillingMonth)
                        .unique()
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_invoices_status_due_date")
                        .table(Invoices::Table)
                        .col(Invoices::Status)
                        .col(Invoices::DueDate)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Invoices::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden, Clone, Copy)]
    enum Invoices {
        Table,
        Id,
        RoomId,
        TenantId,
        BillingYear,
        BillingMonth,
        IssueDate,
        DueDate,
        RentBaht,
        ElectricityUnits,
        ElectricityRate,
        ElectricityBaht,
        WaterUnits,
        WaterRate,
        WaterBaht,
        OtherBaht,
        CommonFeeBaht,
        GarbageFeeBaht,
        MaintenanceBaht,
        TotalBaht,
        PreviousBalance,
        InterestCharge,
        AccumulatedTotal,
        Status,
        PaidDate,
        CreatedAt,
    }
}

/// Connects to `db_url` and applies every pending migration.
pub async fn run_migration(db_url: &str) -> Result<()> {
    info!("Setting up database connection for migrations");

    let mut opt = ConnectOptions::new(db_url);
    opt.max_connections(5)
        .min_connections(1)
        .connect_timeout(Duration::from_secs(30))
        .acquire_timeout(Duration::from_secs(30))
        .sqlx_logging(true);

    let db = Database::connect(opt).await?;

    info!("Running database migrations");

    match Migrator::up(&db, None).await {
        Ok(_) => {
            info!("Migrations completed successfully");
            Ok(())
        }
        Err(e) => {
            error!("Migration failed: {}", e);
            Err(e.into())
        }
    }
}
