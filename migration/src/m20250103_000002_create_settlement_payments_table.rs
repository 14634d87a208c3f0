use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.create_table(
            Table::create()
                .table(SettlementPayments::Table)
                .if_not_exists()
                .col(ColumnDef::new(SettlementPayments::Id).uuid().not_null().primary_key())
                .col(ColumnDef::new(SettlementPayments::VendorId).uuid().not_null())
                .col(ColumnDef::new(SettlementPayments::Amount).decimal_len(14, 2).not_null())
                .col(ColumnDef::new(SettlementPayments::Direction).string_len(30).not_null())
                .col(ColumnDef::new(SettlementPayments::PaymentMethod).string_len(50).not_null())
                .col(ColumnDef::new(SettlementPayments::TransactionId).string().null())
                .col(ColumnDef::new(SettlementPayments::Notes).text().null())
                .col(
                    ColumnDef::new(SettlementPayments::PaymentDate)
                        .timestamp_with_time_zone()
                        .not_null()
                )
                .col(ColumnDef::new(SettlementPayments::CreatedBy).uuid().not_null())
                .foreign_key(
                    ForeignKey::create()
                        .name("fk_settlement_payment_vendor")
                        .from(SettlementPayments::Table, SettlementPayments::VendorId)
                        .to(Vendors::Table, Vendors::Id)
                )
                .to_owned()
        ).await?;

        manager.create_index(
            Index::create()
                .if_not_exists()
                .name("idx_settlement_payments_vendor_date")
                .table(SettlementPayments::Table)
                .col(SettlementPayments::VendorId)
                .col(SettlementPayments::PaymentDate)
                .to_owned()
        ).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(SettlementPayments::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum SettlementPayments {
    Table,
    Id,
    VendorId,
    Amount,
    Direction,
    PaymentMethod,
    TransactionId,
    Notes,
    PaymentDate,
    CreatedBy,
}

#[derive(DeriveIden)]
enum Vendors {
    Table,
    Id,
}
