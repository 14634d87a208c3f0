use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.create_table(
            Table::create()
                .table(WalletSettings::Table)
                .if_not_exists()
                .col(ColumnDef::new(WalletSettings::Id).integer().not_null().primary_key())
                .col(ColumnDef::new(WalletSettings::MinWithdrawalAmount).decimal_len(14, 2).not_null())
                .col(ColumnDef::new(WalletSettings::MaxWithdrawalAmount).decimal_len(14, 2).not_null())
                .col(ColumnDef::new(WalletSettings::MaxWithdrawalsPerDay).integer().not_null())
                .col(
                    ColumnDef::new(WalletSettings::MaxDailyWithdrawalAmount)
                        .decimal_len(14, 2)
                        .not_null()
                )
                .col(
                    ColumnDef::new(WalletSettings::CooldownPeriodHours)
                        .integer()
                        .not_null()
                        .default(0)
                )
                .col(ColumnDef::new(WalletSettings::FeeType).string_len(20).not_null())
                .col(ColumnDef::new(WalletSettings::FeeValue).decimal_len(14, 2).not_null())
                .col(
                    ColumnDef::new(WalletSettings::NewAccountRestrictionDays)
                        .integer()
                        .not_null()
                )
                .col(
                    ColumnDef::new(WalletSettings::MaxNewAccountWithdrawal)
                        .decimal_len(14, 2)
                        .not_null()
                )
                .col(
                    ColumnDef::new(WalletSettings::RapidWithdrawalWindowMinutes)
                        .integer()
                        .not_null()
                )
                .col(ColumnDef::new(WalletSettings::RapidWithdrawalCount).integer().not_null())
                .col(
                    ColumnDef::new(WalletSettings::SuspiciousActivityThreshold)
                        .integer()
                        .not_null()
                )
                .col(
                    ColumnDef::new(WalletSettings::MaxAmountPerTransaction)
                        .decimal_len(14, 2)
                        .not_null()
                )
                .col(
                    ColumnDef::new(WalletSettings::AutoFraudDetection)
                        .boolean()
                        .not_null()
                        .default(true)
                )
                .col(
                    ColumnDef::new(WalletSettings::UpdatedAt)
                        .timestamp_with_time_zone()
                        .not_null()
                )
                .to_owned()
        ).await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(WalletSettings::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum WalletSettings {
    Table,
    Id,
    MinWithdrawalAmount,
    MaxWithdrawalAmount,
    MaxWithdrawalsPerDay,
    MaxDailyWithdrawalAmount,
    CooldownPeriodHours,
    FeeType,
    FeeValue,
    NewAccountRestrictionDays,
    MaxNewAccountWithdrawal,
    RapidWithdrawalWindowMinutes,
    RapidWithdrawalCount,
    SuspiciousActivityThreshold,
    MaxAmountPerTransaction,
    AutoFraudDetection,
    UpdatedAt,
}
