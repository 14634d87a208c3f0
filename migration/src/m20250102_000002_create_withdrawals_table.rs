use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.create_table(
            Table::create()
                .table(Withdrawals::Table)
                .if_not_exists()
                .col(ColumnDef::new(Withdrawals::Id).uuid().not_null().primary_key())
                .col(ColumnDef::new(Withdrawals::UserId).uuid().not_null())
                .col(ColumnDef::new(Withdrawals::Amount).decimal_len(14, 2).not_null())
                .col(ColumnDef::new(Withdrawals::Fee).decimal_len(14, 2).not_null())
                .col(ColumnDef::new(Withdrawals::NetAmount).decimal_len(14, 2).not_null())
                .col(ColumnDef::new(Withdrawals::Method).string_len(20).not_null())
                .col(ColumnDef::new(Withdrawals::BankDetails).json_binary().not_null())
                .col(ColumnDef::new(Withdrawals::Status).string_len(30).not_null())
                .col(ColumnDef::new(Withdrawals::RiskScore).integer().not_null().default(0))
                .col(ColumnDef::new(Withdrawals::RiskFlags).json_binary().not_null())
                .col(ColumnDef::new(Withdrawals::RejectionReason).string().null())
                .col(ColumnDef::new(Withdrawals::ProviderReference).string_len(64).not_null())
                .col(
                    ColumnDef::new(Withdrawals::RequestedAt)
                        .timestamp_with_time_zone()
                        .not_null()
                )
                .col(ColumnDef::new(Withdrawals::ProcessedAt).timestamp_with_time_zone().null())
                .col(ColumnDef::new(Withdrawals::CompletedAt).timestamp_with_time_zone().null())
                .col(ColumnDef::new(Withdrawals::FailedAt).timestamp_with_time_zone().null())
                .col(ColumnDef::new(Withdrawals::FailureReason).string().null())
                .foreign_key(
                    ForeignKey::create()
                        .name("fk_withdrawal_user")
                        .from(Withdrawals::Table, Withdrawals::UserId)
                        .to(Users::Table, Users::Id)
                )
                .to_owned()
        ).await?;

        manager.create_index(
            Index::create()
                .if_not_exists()
                .name("idx_withdrawals_user_requested_at")
                .table(Withdrawals::Table)
                .col(Withdrawals::UserId)
                .col(Withdrawals::RequestedAt)
                .to_owned()
        ).await?;

        manager.create_index(
            Index::create()
                .if_not_exists()
                .name("idx_withdrawals_provider_reference")
                .table(Withdrawals::Table)
                .col(Withdrawals::ProviderReference)
                .unique()
                .to_owned()
        ).await?;

        manager.create_index(
            Index::create()
                .if_not_exists()
                .name("idx_withdrawals_status")
                .table(Withdrawals::Table)
                .col(Withdrawals::Status)
                .to_owned()
        ).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Withdrawals::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Withdrawals {
    Table,
    Id,
    UserId,
    Amount,
    Fee,
    NetAmount,
    Method,
    BankDetails,
    Status,
    RiskScore,
    RiskFlags,
    RejectionReason,
    ProviderReference,
    RequestedAt,
    ProcessedAt,
    CompletedAt,
    FailedAt,
    FailureReason,
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
}
