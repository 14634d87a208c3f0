use std::sync::Arc;

use chrono::{ DateTime, Duration, FixedOffset, Utc };
use sea_orm::{
    prelude::Decimal,
    ActiveModelTrait,
    DatabaseConnection,
    Set,
    TransactionTrait,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::db::entity::withdrawal;
use crate::db::{
    AccountRepository,
    LedgerEntry,
    NewWithdrawal,
    WalletRepository,
    WithdrawalPage,
    WithdrawalRepository,
};
use crate::enums::{ LedgerStatus, TransactionSource, WithdrawalMethod, WithdrawalStatus };
use crate::error::{ AppError, Result };
use crate::services::period::local_day_start;
use crate::services::risk_scoring::{ self, RiskAssessment, RiskContext };
use crate::services::settings_service::SettingsService;
use crate::services::withdrawal_policy::{
    parse_amount,
    BankDetailsInput,
    DailyUsage,
    Destination,
    WithdrawalPolicy,
};

const SYSTEM_REJECTION_REASON: &str = "Flagged by automated risk checks";
const SWEEP_BATCH_SIZE: u64 = 100;
pub const DEFAULT_PAGE_SIZE: u64 = 10;
pub const MAX_PAGE_SIZE: u64 = 100;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawalRequest {
    /// Kept loose so a malformed amount gets a validation message instead of
    /// a body rejection.
    #[serde(default)]
    pub amount: serde_json::Value,
    #[serde(default)]
    pub bank_details: BankDetailsInput,
    pub withdrawal_method: Option<WithdrawalMethod>,
}

#[derive(Debug)]
pub struct AcceptedWithdrawal {
    pub withdrawal: withdrawal::Model,
    pub new_balance: Decimal,
    pub transaction_id: Uuid,
    pub estimated_credit_time: &'static str,
}

#[derive(Debug)]
pub struct BlockedWithdrawal {
    pub withdrawal_id: Uuid,
    pub risk_flags: Vec<String>,
    pub reason: String,
}

#[derive(Debug)]
pub enum WithdrawalOutcome {
    Accepted(AcceptedWithdrawal),
    /// Refused by fraud scoring. The record is persisted; the wallet is not
    /// touched.
    Blocked(BlockedWithdrawal),
}

/// Final result reported by the payout provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderOutcome {
    Completed,
    Failed {
        reason: String,
    },
}

pub struct WithdrawalService {
    db: DatabaseConnection,
    settings: Arc<SettingsService>,
    business_offset: FixedOffset,
}

impl WithdrawalService {
    pub fn new(
        db: DatabaseConnection,
        settings: Arc<SettingsService>,
        business_offset: FixedOffset
    ) -> Self {
        Self {
            db,
            settings,
            business_offset,
        }
    }

    /// Validates, limits, scores and (when allowed) debits a withdrawal in a
    /// single database transaction.
    pub async fn request_withdrawal(
        &self,
        user_id: Uuid,
        request: WithdrawalRequest
    ) -> Result<WithdrawalOutcome> {
        let amount = parse_amount(&request.amount)?;
        let method = request.withdrawal_method.unwrap_or_default();
        let destination = Destination::validate(method, &request.bank_details)?;

        let settings = self.settings.get_or_create_settings().await?;
        let policy = WithdrawalPolicy::from_settings(&settings)?;
        policy.check_amount(amount)?;

        // Any early return below drops the transaction, which rolls it back.
        let txn = self.db.begin().await?;

        let user = AccountRepository::find_user(&txn, user_id).await?;
        let wallet = WalletRepository::find_by_user_for_update(&txn, user_id).await?;
        WithdrawalPolicy::check_balance(amount, wallet.balance)?;

        let now = Utc::now();
        let counted = WithdrawalStatus::counted_towards_limits();
        let day_start = local_day_start(now, self.business_offset);
        let usage = DailyUsage {
            count: WithdrawalRepository::count_since(&txn, user_id, day_start, counted).await?,
            amount: WithdrawalRepository::sum_since(&txn, user_id, day_start, counted).await?,
        };
        policy.check_daily_limits(&usage, amount)?;

        if policy.cooldown.is_some() {
            let last = WithdrawalRepository::find_last_completed(&txn, user_id).await?;
            policy.check_cooldown(
                last.and_then(|w| w.completed_at),
                now
            )?;
        }

        let fee = policy.fee.apply(amount);

        let assessment = match &policy.fraud_rules {
            Some(rules) => {
                let window_start = now - Duration::minutes(rules.rapid_withdrawal_window_minutes);
                let ctx = RiskContext {
                    amount,
                    wallet_balance: wallet.balance,
                    account_age_days: (now - user.created_at).num_days(),
                    recent_withdrawals: WithdrawalRepository::count_since(
                        &txn,
                        user_id,
                        window_start,
                        counted
                    ).await?,
                    completed_transactions: WalletRepository::count_completed_transactions(
                        &txn,
                        user_id
                    ).await?,
                };
                risk_scoring::assess(rules, &ctx)
            }
            None => RiskAssessment::clean(),
        };

        let bank_details = serde_json
            ::to_value(&destination)
            .map_err(|e| AppError::Internal(format!("Failed to snapshot destination: {}", e)))?;

        if assessment.blocked {
            let record = WithdrawalRepository::create(&txn, NewWithdrawal {
                user_id,
                amount,
                fee: fee.fee,
                net_amount: fee.net_amount,
                method: destination.method(),
                bank_details,
                status: WithdrawalStatus::RejectedBySystem,
                risk_score: assessment.persisted_score(),
                risk_flags: assessment.flag_names(),
                rejection_reason: Some(SYSTEM_REJECTION_REASON.to_string()),
                requested_at: now,
            }).await?;

            txn.commit().await?;

            tracing::warn!(
                withdrawal_id = %record.id,
                user_id = %user_id,
                score = assessment.raw_score,
                flags = ?assessment.flag_names(),
                "Withdrawal blocked by risk checks"
            );

            return Ok(
                WithdrawalOutcome::Blocked(BlockedWithdrawal {
                    withdrawal_id: record.id,
                    risk_flags: assessment.flag_names(),
                    reason: SYSTEM_REJECTION_REASON.to_string(),
                })
            );
        }

        let record = WithdrawalRepository::create(&txn, NewWithdrawal {
            user_id,
            amount,
            fee: fee.fee,
            net_amount: fee.net_amount,
            method: destination.method(),
            bank_details,
            status: WithdrawalStatus::Processing,
            risk_score: assessment.persisted_score(),
            risk_flags: assessment.flag_names(),
            rejection_reason: None,
            requested_at: now,
        }).await?;

        let (wallet, ledger) = WalletRepository::post_entry(&txn, wallet, LedgerEntry {
            amount: -amount,
            source: TransactionSource::Withdrawal,
            status: LedgerStatus::Pending,
            withdrawal_id: Some(record.id),
            description: Some("Wallet withdrawal"),
        }).await?;

        txn.commit().await?;

        tracing::info!(
            withdrawal_id = %record.id,
            user_id = %user_id,
            amount = %amount,
            fee = %fee.fee,
            method = %record.method,
            "Withdrawal accepted"
        );

        Ok(
            WithdrawalOutcome::Accepted(AcceptedWithdrawal {
                new_balance: wallet.balance,
                transaction_id: ledger.id,
                estimated_credit_time: destination.method().estimated_credit_time(),
                withdrawal: record,
            })
        )
    }

    /// Applies a provider outcome to a `processing` withdrawal. Repeated
    /// calls for a record already in a terminal state return it unchanged.
    pub async fn settle_withdrawal(
        &self,
        provider_reference: &str,
        outcome: ProviderOutcome
    ) -> Result<withdrawal::Model> {
        let txn = self.db.begin().await?;

        let record = WithdrawalRepository::find_by_provider_reference_for_update(
            &txn,
            provider_reference
        ).await?.ok_or_else(|| AppError::NotFound("Withdrawal not found".to_string()))?;

        let status: WithdrawalStatus = record.status.parse()?;
        if status.is_terminal() {
            tracing::debug!(
                withdrawal_id = %record.id,
                status = %status,
                "Ignoring outcome for settled withdrawal"
            );
            return Ok(record);
        }

        let now = Utc::now();
        let withdrawal_id = record.id;
        let user_id = record.user_id;
        let amount = record.amount;

        let mut active: withdrawal::ActiveModel = record.into();

        match &outcome {
            ProviderOutcome::Completed => {
                active.status = Set(WithdrawalStatus::Completed.as_str().to_string());
                active.completed_at = Set(Some(now));

                WalletRepository::set_withdrawal_entry_status(
                    &txn,
                    withdrawal_id,
                    TransactionSource::Withdrawal,
                    LedgerStatus::Completed
                ).await?;
            }
            ProviderOutcome::Failed { reason } => {
                active.status = Set(WithdrawalStatus::Failed.as_str().to_string());
                active.failed_at = Set(Some(now));
                active.failure_reason = Set(Some(reason.clone()));

                WalletRepository::set_withdrawal_entry_status(
                    &txn,
                    withdrawal_id,
                    TransactionSource::Withdrawal,
                    LedgerStatus::Reversed
                ).await?;

                let wallet = WalletRepository::find_by_user_for_update(&txn, user_id).await?;
                WalletRepository::post_entry(&txn, wallet, LedgerEntry {
                    amount,
                    source: TransactionSource::WithdrawalRefund,
                    status: LedgerStatus::Completed,
                    withdrawal_id: Some(withdrawal_id),
                    description: Some("Refund for failed withdrawal"),
                }).await?;
            }
        }

        let updated = active.update(&txn).await?;
        txn.commit().await?;

        match outcome {
            ProviderOutcome::Completed => {
                tracing::info!(withdrawal_id = %withdrawal_id, "Withdrawal completed");
            }
            ProviderOutcome::Failed { reason } => {
                tracing::warn!(
                    withdrawal_id = %withdrawal_id,
                    reason = %reason,
                    "Withdrawal failed, amount credited back"
                );
            }
        }

        Ok(updated)
    }

    /// Marks `processing` withdrawals requested before `cutoff` as completed.
    /// Returns how many were settled.
    pub async fn complete_due(&self, cutoff: DateTime<Utc>) -> Result<usize> {
        let due = WithdrawalRepository::find_processing_before(
            &self.db,
            cutoff,
            SWEEP_BATCH_SIZE
        ).await?;

        let mut settled = 0;
        for record in due {
            match self.settle_withdrawal(&record.provider_reference, ProviderOutcome::Completed).await {
                Ok(_) => {
                    settled += 1;
                }
                Err(e) => {
                    tracing::error!(
                        withdrawal_id = %record.id,
                        error = %e,
                        "Failed to complete withdrawal"
                    );
                }
            }
        }

        Ok(settled)
    }

    pub async fn list_withdrawals(
        &self,
        user_id: Uuid,
        status: Option<WithdrawalStatus>,
        page: Option<u64>,
        limit: Option<u64>
    ) -> Result<(WithdrawalPage, u64, u64)> {
        let page = page.unwrap_or(1).max(1);
        let limit = limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);

        let result = WithdrawalRepository::list_for_user(&self.db, user_id, status, page, limit).await?;
        Ok((result, page, limit))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::db::entity::{ user, wallet, wallet_settings, wallet_transaction };
    use crate::services::withdrawal_policy::tests::settings;
    use rust_decimal_macros::dec;
    use sea_orm::{ DatabaseBackend, MockDatabase, MockExecResult, Value };

    fn offset() -> FixedOffset {
        FixedOffset::east_opt(330 * 60).unwrap()
    }

    /// `DatabaseConnection` is not `Clone` under sea-orm's `mock` feature;
    /// share the mock connection's inner `Arc` instead.
    fn share(db: &DatabaseConnection) -> DatabaseConnection {
        match db {
            DatabaseConnection::MockDatabaseConnection(conn) => {
                DatabaseConnection::MockDatabaseConnection(Arc::clone(conn))
            }
            _ => panic!("Not mock connection"),
        }
    }

    fn service(db: &DatabaseConnection) -> WithdrawalService {
        let settings = Arc::new(SettingsService::new(share(db)));
        WithdrawalService::new(share(db), settings, offset())
    }

    fn executed_sql(db: DatabaseConnection) -> String {
        format!("{:?}", db.into_transaction_log())
    }

    fn count_row(n: i64) -> BTreeMap<&'static str, Value> {
        BTreeMap::from([("num_items", Value::BigInt(Some(n)))])
    }

    fn sum_row(total: Decimal) -> BTreeMap<&'static str, Value> {
        BTreeMap::from([("total", Value::from(Some(total)))])
    }

    fn account(user_id: Uuid, age_days: i64) -> user::Model {
        user::Model {
            id: user_id,
            name: "Asha Rao".to_string(),
            role: "vendor".to_string(),
            created_at: Utc::now() - Duration::days(age_days),
        }
    }

    fn wallet(user_id: Uuid, balance: Decimal) -> wallet::Model {
        wallet::Model {
            id: Uuid::new_v4(),
            user_id,
            balance,
            updated_at: Utc::now(),
        }
    }

    fn record(user_id: Uuid, amount: Decimal, status: WithdrawalStatus) -> withdrawal::Model {
        let id = Uuid::new_v4();
        withdrawal::Model {
            id,
            user_id,
            amount,
            fee: dec!(10),
            net_amount: amount - dec!(10),
            method: "bank_transfer".to_string(),
            bank_details: serde_json::json!({ "method": "bank_transfer" }),
            status: status.as_str().to_string(),
            risk_score: 0,
            risk_flags: serde_json::json!([]),
            rejection_reason: None,
            provider_reference: format!("WD-{}", id.simple()),
            requested_at: Utc::now(),
            processed_at: Some(Utc::now()),
            completed_at: None,
            failed_at: None,
            failure_reason: None,
        }
    }

    fn ledger(
        user_id: Uuid,
        amount: Decimal,
        balance_before: Decimal,
        source: TransactionSource
    ) -> wallet_transaction::Model {
        wallet_transaction::Model {
            id: Uuid::new_v4(),
            user_id,
            amount,
            balance_before,
            balance_after: balance_before + amount,
            source: source.as_str().to_string(),
            status: LedgerStatus::Pending.as_str().to_string(),
            withdrawal_id: None,
            description: None,
            created_at: Utc::now(),
        }
    }

    fn request(amount: serde_json::Value) -> WithdrawalRequest {
        WithdrawalRequest {
            amount,
            bank_details: BankDetailsInput {
                account_number: Some("123456789012".to_string()),
                ifsc: Some("HDFC0001234".to_string()),
                account_holder_name: Some("Asha Rao".to_string()),
                upi_id: None,
                bank_name: None,
            },
            withdrawal_method: None,
        }
    }

    fn without_fraud_checks() -> wallet_settings::Model {
        let mut s = settings();
        s.auto_fraud_detection = false;
        s
    }

    #[tokio::test]
    async fn test_insufficient_balance_leaves_wallet_untouched() {
        let user_id = Uuid::new_v4();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![settings()]])
            .append_query_results([vec![account(user_id, 400)]])
            .append_query_results([vec![wallet(user_id, dec!(1000))]])
            .into_connection();

        let err = service(&db).request_withdrawal(user_id, request(serde_json::json!(1500))).await.unwrap_err();
        assert!(matches!(err, AppError::InsufficientBalance));

        let sql = executed_sql(db);
        assert!(!sql.contains(r#"UPDATE \"wallets\""#));
        assert!(!sql.contains("INSERT INTO"));
    }

    #[tokio::test]
    async fn test_blocked_request_is_recorded_without_debit() {
        let user_id = Uuid::new_v4();
        let rejected = record(user_id, dec!(6000), WithdrawalStatus::RejectedBySystem);
        let rejected_id = rejected.id;

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![settings()]])
            .append_query_results([vec![account(user_id, 2)]])
            .append_query_results([vec![wallet(user_id, dec!(10000))]])
            .append_query_results([vec![count_row(0)]])
            .append_query_results([vec![sum_row(Decimal::ZERO)]])
            .append_query_results([vec![count_row(0)], vec![count_row(0)]])
            .append_query_results([vec![rejected]])
            .into_connection();

        let outcome = service(&db).request_withdrawal(user_id, request(serde_json::json!(6000))).await.unwrap();

        match outcome {
            WithdrawalOutcome::Blocked(blocked) => {
                assert_eq!(blocked.withdrawal_id, rejected_id);
                assert_eq!(
                    blocked.risk_flags,
                    vec!["new_account", "high_amount_new_account", "first_transaction_withdrawal"]
                );
            }
            other => panic!("expected a blocked withdrawal, got {:?}", other),
        }

        let sql = executed_sql(db);
        assert!(sql.contains(r#"INSERT INTO \"withdrawals\""#));
        assert!(sql.contains(r#"String(Some("rejected_by_system"))"#));
        assert!(!sql.contains(r#"UPDATE \"wallets\""#));
        assert!(!sql.contains(r#"INSERT INTO \"wallet_transactions\""#));
    }

    #[tokio::test]
    async fn test_accepted_request_debits_wallet() {
        let user_id = Uuid::new_v4();
        let processing = record(user_id, dec!(2500), WithdrawalStatus::Processing);
        let debit = ledger(user_id, dec!(-2500), dec!(10000), TransactionSource::Withdrawal);
        let debit_id = debit.id;

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![without_fraud_checks()]])
            .append_query_results([vec![account(user_id, 400)]])
            .append_query_results([vec![wallet(user_id, dec!(10000))]])
            .append_query_results([vec![count_row(1)]])
            .append_query_results([vec![sum_row(dec!(500))]])
            .append_query_results([vec![processing]])
            .append_query_results([vec![wallet(user_id, dec!(7500))]])
            .append_query_results([vec![debit]])
            .into_connection();

        let outcome = service(&db).request_withdrawal(user_id, request(serde_json::json!("2500"))).await.unwrap();

        match outcome {
            WithdrawalOutcome::Accepted(accepted) => {
                assert_eq!(accepted.new_balance, dec!(7500));
                assert_eq!(accepted.transaction_id, debit_id);
                assert_eq!(accepted.estimated_credit_time, "1-2 business days");
            }
            other => panic!("expected an accepted withdrawal, got {:?}", other),
        }

        let sql = executed_sql(db);
        assert!(sql.contains(r#"UPDATE \"wallets\""#));
        assert!(sql.contains(r#"INSERT INTO \"wallet_transactions\""#));
        assert!(sql.contains("Decimal(Some(-2500))"));
        assert!(sql.contains("Decimal(Some(7500))"));
        assert!(sql.contains(r#"String(Some("pending"))"#));
    }

    #[tokio::test]
    async fn test_failed_payout_reverses_debit_and_refunds() {
        let user_id = Uuid::new_v4();
        let processing = record(user_id, dec!(2500), WithdrawalStatus::Processing);
        let reference = processing.provider_reference.clone();
        let mut failed = processing.clone();
        failed.status = WithdrawalStatus::Failed.as_str().to_string();
        failed.failure_reason = Some("Beneficiary account closed".to_string());

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![processing]])
            .append_exec_results([MockExecResult { last_insert_id: 0, rows_affected: 1 }])
            .append_query_results([vec![wallet(user_id, dec!(7500))]])
            .append_query_results([vec![wallet(user_id, dec!(10000))]])
            .append_query_results([
                vec![ledger(user_id, dec!(2500), dec!(7500), TransactionSource::WithdrawalRefund)],
            ])
            .append_query_results([vec![failed]])
            .into_connection();

        let outcome = ProviderOutcome::Failed {
            reason: "Beneficiary account closed".to_string(),
        };
        let updated = service(&db).settle_withdrawal(&reference, outcome).await.unwrap();
        assert_eq!(updated.status, "failed");

        let sql = executed_sql(db);
        assert!(sql.contains(r#"UPDATE \"wallet_transactions\""#));
        assert!(sql.contains(r#"String(Some("reversed"))"#));
        assert!(sql.contains(r#"String(Some("withdrawal_refund"))"#));
        assert!(sql.contains("Decimal(Some(10000))"));
        assert!(sql.contains(r#"UPDATE \"withdrawals\""#));
    }

    #[tokio::test]
    async fn test_settled_withdrawal_is_returned_unchanged() {
        let user_id = Uuid::new_v4();
        let mut completed = record(user_id, dec!(2500), WithdrawalStatus::Completed);
        completed.completed_at = Some(Utc::now());
        let reference = completed.provider_reference.clone();

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![completed.clone()]])
            .into_connection();

        let outcome = ProviderOutcome::Failed {
            reason: "Late failure notice".to_string(),
        };
        let result = service(&db).settle_withdrawal(&reference, outcome).await.unwrap();
        assert_eq!(result, completed);

        let sql = executed_sql(db);
        assert!(!sql.contains(r#"UPDATE \"withdrawals\""#));
        assert!(!sql.contains(r#"UPDATE \"wallets\""#));
        assert!(!sql.contains("INSERT INTO"));
    }

    #[tokio::test]
    async fn test_unknown_reference_is_not_found() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<withdrawal::Model>::new()])
            .into_connection();

        let err = service(&db).settle_withdrawal("WD-missing", ProviderOutcome::Completed).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(msg) if msg == "Withdrawal not found"));
    }

    #[tokio::test]
    async fn test_history_page_beyond_end_is_empty() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![count_row(3)]])
            .into_connection();

        let (page, current, limit) = service(&db)
            .list_withdrawals(Uuid::new_v4(), None, Some(u64::MAX), Some(500)).await
            .unwrap();

        assert!(page.items.is_empty());
        assert_eq!(page.total_items, 3);
        assert_eq!(page.total_pages, 1);
        assert_eq!(current, u64::MAX);
        assert_eq!(limit, MAX_PAGE_SIZE);
    }
}
