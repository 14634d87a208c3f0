use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.create_table(
            Table::create()
                .table(Appointments::Table)
                .if_not_exists()
                .col(ColumnDef::new(Appointments::Id).uuid().not_null().primary_key())
                .col(ColumnDef::new(Appointments::VendorId).uuid().not_null())
                .col(ColumnDef::new(Appointments::Date).timestamp_with_time_zone().not_null())
                .col(ColumnDef::new(Appointments::Status).string_len(20).not_null())
                .col(ColumnDef::new(Appointments::Mode).string_len(20).not_null())
                .col(ColumnDef::new(Appointments::PaymentStatus).string_len(20).not_null())
                .col(ColumnDef::new(Appointments::PaymentMethod).string_len(30).not_null())
                .col(ColumnDef::new(Appointments::TotalAmount).decimal_len(14, 2).not_null())
                .col(
                    ColumnDef::new(Appointments::PlatformFee)
                        .decimal_len(14, 2)
                        .not_null()
                        .default(0)
                )
                .col(
                    ColumnDef::new(Appointments::ServiceTax)
                        .decimal_len(14, 2)
                        .not_null()
                        .default(0)
                )
                .col(ColumnDef::new(Appointments::FinalAmount).decimal_len(14, 2).not_null())
                .col(
                    ColumnDef::new(Appointments::CreatedAt)
                        .timestamp_with_time_zone()
                        .not_null()
                        .extra("DEFAULT NOW()".to_string())
                )
                .foreign_key(
                    ForeignKey::create()
                        .name("fk_appointment_vendor")
                        .from(Appointments::Table, Appointments::VendorId)
                        .to(Vendors::Table, Vendors::Id)
                )
                .to_owned()
        ).await?;

        manager.create_index(
            Index::create()
                .if_not_exists()
                .name("idx_appointments_vendor_date")
                .table(Appointments::Table)
                .col(Appointments::VendorId)
                .col(Appointments::Date)
                .to_owned()
        ).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Appointments::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Appointments {
    Table,
    Id,
    VendorId,
    Date,
    Status,
    Mode,
    PaymentStatus,
    PaymentMethod,
    TotalAmount,
    PlatformFee,
    ServiceTax,
    FinalAmount,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Vendors {
    Table,
    Id,
}
