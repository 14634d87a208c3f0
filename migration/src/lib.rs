pub use sea_orm_migration::prelude::*;

mod m20250101_000001_create_accounts_tables;
mod m20250101_000002_create_wallets_table;
mod m20250102_000001_create_wallet_settings_table;
mod m20250102_000002_create_withdrawals_table;
mod m20250102_000003_create_wallet_transactions_table;
mod m20250103_000001_create_appointments_table;
mod m20250103_000002_create_settlement_payments_table;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250101_000001_create_accounts_tables::Migration),
            Box::new(m20250101_000002_create_wallets_table::Migration),
            Box::new(m20250102_000001_create_wallet_settings_table::Migration),
            Box::new(m20250102_000002_create_withdrawals_table::Migration),
            Box::new(m20250102_000003_create_wallet_transactions_table::Migration),
            Box::new(m20250103_000001_create_appointments_table::Migration),
            Box::new(m20250103_000002_create_settlement_payments_table::Migration)
        ]
    }
}
