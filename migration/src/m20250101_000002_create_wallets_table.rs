use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.create_table(
            Table::create()
                .table(Wallets::Table)
                .if_not_exists()
                .col(ColumnDef::new(Wallets::Id).uuid().not_null().primary_key())
                .col(ColumnDef::new(Wallets::UserId).uuid().not_null().unique_key())
                .col(
                    ColumnDef::new(Wallets::Balance)
                        .decimal_len(14, 2)
                        .not_null()
                        .default(0)
                )
                .col(
                    ColumnDef::new(Wallets::UpdatedAt)
                        .timestamp_with_time_zone()
                        .not_null()
                        .extra("DEFAULT NOW()".to_string())
                )
                .check(Expr::col(Wallets::Balance).gte(0))
                .foreign_key(
                    ForeignKey::create()
                        .name("fk_wallet_user")
                        .from(Wallets::Table, Wallets::UserId)
                        .to(Users::Table, Users::Id)
                        .on_delete(ForeignKeyAction::Cascade)
                )
                .to_owned()
        ).await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Wallets::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Wallets {
    Table,
    Id,
    UserId,
    Balance,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
}
