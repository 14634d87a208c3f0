use chrono::Utc;
use sea_orm::{
    entity::prelude::*,
    sea_query::Expr,
    ConnectionTrait,
    PaginatorTrait,
    QuerySelect,
    Set,
};
use uuid::Uuid;

use crate::enums::{ LedgerStatus, TransactionSource };
use crate::error::{ AppError, Result };

pub mod entity;
pub use entity::*;

mod account_repository;
pub use account_repository::AccountRepository;

mod withdrawal_repository;
pub use withdrawal_repository::{ NewWithdrawal, WithdrawalPage, WithdrawalRepository };

mod settlement_repository;
pub use settlement_repository::{ NewSettlementPayment, SettlementRepository };

/// Ledger entry to post against a wallet.
pub struct LedgerEntry<'a> {
    /// Signed: negative for debits.
    pub amount: Decimal,
    pub source: TransactionSource,
    pub status: LedgerStatus,
    pub withdrawal_id: Option<Uuid>,
    pub description: Option<&'a str>,
}

/// Wallet balance and ledger access. Every function takes the connection
/// explicitly so it can run inside the caller's database transaction.
pub struct WalletRepository;

impl WalletRepository {
    /// Loads the user's wallet with `SELECT ... FOR UPDATE`.
    ///
    /// Only meaningful inside a transaction; concurrent withdrawals for the
    /// same user serialize on this row.
    pub async fn find_by_user_for_update<C: ConnectionTrait>(
        conn: &C,
        user_id: Uuid
    ) -> Result<entity::wallet::Model> {
        entity::wallet::Entity
            ::find()
            .filter(entity::wallet::Column::UserId.eq(user_id))
            .lock_exclusive()
            .one(conn).await?
            .ok_or_else(|| AppError::NotFound("Wallet not found".to_string()))
    }

    /// Moves the wallet balance by `entry.amount` and appends the matching
    /// ledger row. Refuses any entry that would leave the balance negative.
    pub async fn post_entry<C: ConnectionTrait>(
        conn: &C,
        wallet: entity::wallet::Model,
        entry: LedgerEntry<'_>
    ) -> Result<(entity::wallet::Model, entity::wallet_transaction::Model)> {
        let balance_before = wallet.balance;
        let balance_after = balance_before + entry.amount;

        if balance_after < Decimal::ZERO {
            return Err(AppError::InsufficientBalance);
        }

        let now = Utc::now();
        let user_id = wallet.user_id;

        let mut active: entity::wallet::ActiveModel = wallet.into();
        active.balance = Set(balance_after);
        active.updated_at = Set(now);
        let wallet = active.update(conn).await?;

        let ledger = entity::wallet_transaction::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            amount: Set(entry.amount),
            balance_before: Set(balance_before),
            balance_after: Set(balance_after),
            source: Set(entry.source.as_str().to_string()),
            status: Set(entry.status.as_str().to_string()),
            withdrawal_id: Set(entry.withdrawal_id),
            description: Set(entry.description.map(str::to_string)),
            created_at: Set(now),
        };

        let ledger = ledger.insert(conn).await?;
        Ok((wallet, ledger))
    }

    /// Updates the status of the ledger rows a withdrawal produced.
    pub async fn set_withdrawal_entry_status<C: ConnectionTrait>(
        conn: &C,
        withdrawal_id: Uuid,
        source: TransactionSource,
        status: LedgerStatus
    ) -> Result<u64> {
        let result = entity::wallet_transaction::Entity
            ::update_many()
            .col_expr(entity::wallet_transaction::Column::Status, Expr::value(status.as_str()))
            .filter(entity::wallet_transaction::Column::WithdrawalId.eq(withdrawal_id))
            .filter(entity::wallet_transaction::Column::Source.eq(source.as_str()))
            .exec(conn).await?;

        Ok(result.rows_affected)
    }

    pub async fn count_completed_transactions<C: ConnectionTrait>(
        conn: &C,
        user_id: Uuid
    ) -> Result<u64> {
        let count = entity::wallet_transaction::Entity
            ::find()
            .filter(entity::wallet_transaction::Column::UserId.eq(user_id))
            .filter(entity::wallet_transaction::Column::Status.eq(LedgerStatus::Completed.as_str()))
            .count(conn).await?;

        Ok(count)
    }
}
