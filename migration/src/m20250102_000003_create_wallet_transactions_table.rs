use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.create_table(
            Table::create()
                .table(WalletTransactions::Table)
                .if_not_exists()
                .col(ColumnDef::new(WalletTransactions::Id).uuid().not_null().primary_key())
                .col(ColumnDef::new(WalletTransactions::UserId).uuid().not_null())
                .col(ColumnDef::new(WalletTransactions::Amount).decimal_len(14, 2).not_null())
                .col(
                    ColumnDef::new(WalletTransactions::BalanceBefore)
                        .decimal_len(14, 2)
                        .not_null()
                )
                .col(
                    ColumnDef::new(WalletTransactions::BalanceAfter)
                        .decimal_len(14, 2)
                        .not_null()
                )
                .col(ColumnDef::new(WalletTransactions::Source).string_len(30).not_null())
                .col(ColumnDef::new(WalletTransactions::Status).string_len(20).not_null())
                .col(ColumnDef::new(WalletTransactions::WithdrawalId).uuid().null())
                .col(ColumnDef::new(WalletTransactions::Description).string().null())
                .col(
                    ColumnDef::new(WalletTransactions::CreatedAt)
                        .timestamp_with_time_zone()
                        .not_null()
                )
                .check(Expr::col(WalletTransactions::BalanceAfter).gte(0))
                .foreign_key(
                    ForeignKey::create()
                        .name("fk_wallet_transaction_withdrawal")
                        .from(WalletTransactions::Table, WalletTransactions::WithdrawalId)
                        .to(Withdrawals::Table, Withdrawals::Id)
                )
                .to_owned()
        ).await?;

        manager.create_index(
            Index::create()
                .if_not_exists()
                .name("idx_wallet_transactions_user_status")
                .table(WalletTransactions::Table)
                .col(WalletTransactions::UserId)
                .col(WalletTransactions::Status)
                .to_owned()
        ).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(WalletTransactions::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum WalletTransactions {
    Table,
    Id,
    UserId,
    Amount,
    BalanceBefore,
    BalanceAfter,
    Source,
    Status,
    WithdrawalId,
    Description,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Withdrawals {
    Table,
    Id,
}
