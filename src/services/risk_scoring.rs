//! Additive fraud scoring for withdrawal requests.
//!
//! Each rule contributes a fixed number of points independently. The raw sum
//! is not bounded: with every rule firing it reaches 150. Blocking compares
//! the raw sum against the configured threshold; only the persisted score is
//! clamped to 0..=100.

use std::fmt;

use sea_orm::prelude::Decimal;
use serde::Serialize;

use crate::db::entity::wallet_settings;

/// Upper bound of the persisted `risk_score` column.
pub const MAX_PERSISTED_SCORE: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskFlag {
    NewAccount,
    HighAmountNewAccount,
    LargePercentageWithdrawal,
    RapidWithdrawals,
    ExceedsMaxAmount,
    FirstTransactionWithdrawal,
}

impl RiskFlag {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskFlag::NewAccount => "new_account",
            RiskFlag::HighAmountNewAccount => "high_amount_new_account",
            RiskFlag::LargePercentageWithdrawal => "large_percentage_withdrawal",
            RiskFlag::RapidWithdrawals => "rapid_withdrawals",
            RiskFlag::ExceedsMaxAmount => "exceeds_max_amount",
            RiskFlag::FirstTransactionWithdrawal => "first_transaction_withdrawal",
        }
    }

    pub fn points(&self) -> u32 {
        match self {
            RiskFlag::NewAccount => 20,
            RiskFlag::HighAmountNewAccount => 30,
            RiskFlag::LargePercentageWithdrawal => 15,
            RiskFlag::RapidWithdrawals => 25,
            RiskFlag::ExceedsMaxAmount => 20,
            RiskFlag::FirstTransactionWithdrawal => 40,
        }
    }
}

impl fmt::Display for RiskFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fraud-detection rule set from wallet settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FraudRules {
    pub new_account_restriction_days: i64,
    pub max_new_account_withdrawal: Decimal,
    pub rapid_withdrawal_window_minutes: i64,
    pub rapid_withdrawal_count: u64,
    pub suspicious_activity_threshold: u32,
    pub max_amount_per_transaction: Decimal,
}

impl FraudRules {
    pub fn from_settings(settings: &wallet_settings::Model) -> Self {
        Self {
            new_account_restriction_days: settings.new_account_restriction_days as i64,
            max_new_account_withdrawal: settings.max_new_account_withdrawal,
            rapid_withdrawal_window_minutes: settings.rapid_withdrawal_window_minutes as i64,
            rapid_withdrawal_count: settings.rapid_withdrawal_count.max(0) as u64,
            suspicious_activity_threshold: settings.suspicious_activity_threshold.max(0) as u32,
            max_amount_per_transaction: settings.max_amount_per_transaction,
        }
    }
}

/// Facts about the requester gathered inside the withdrawal transaction.
#[derive(Debug, Clone, Copy)]
pub struct RiskContext {
    pub amount: Decimal,
    /// Balance before the debit.
    pub wallet_balance: Decimal,
    /// Whole days since the account was created.
    pub account_age_days: i64,
    /// Processing or completed withdrawals inside the rapid-withdrawal window.
    pub recent_withdrawals: u64,
    /// Completed ledger entries of any kind.
    pub completed_transactions: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RiskAssessment {
    pub raw_score: u32,
    pub flags: Vec<RiskFlag>,
    pub blocked: bool,
}

impl RiskAssessment {
    /// Assessment used when automatic fraud detection is off.
    pub fn clean() -> Self {
        Self {
            raw_score: 0,
            flags: Vec::new(),
            blocked: false,
        }
    }

    pub fn persisted_score(&self) -> i32 {
        self.raw_score.min(MAX_PERSISTED_SCORE) as i32
    }

    pub fn flag_names(&self) -> Vec<String> {
        self.flags
            .iter()
            .map(|f| f.as_str().to_string())
            .collect()
    }
}

pub fn assess(rules: &FraudRules, ctx: &RiskContext) -> RiskAssessment {
    let mut flags = Vec::new();

    if ctx.account_age_days < rules.new_account_restriction_days {
        flags.push(RiskFlag::NewAccount);

        if ctx.amount > rules.max_new_account_withdrawal {
            flags.push(RiskFlag::HighAmountNewAccount);
        }
    }

    if ctx.amount > ctx.wallet_balance * Decimal::new(9, 1) {
        flags.push(RiskFlag::LargePercentageWithdrawal);
    }

    if ctx.recent_withdrawals >= rules.rapid_withdrawal_count {
        flags.push(RiskFlag::RapidWithdrawals);
    }

    if ctx.amount > rules.max_amount_per_transaction {
        flags.push(RiskFlag::ExceedsMaxAmount);
    }

    if ctx.completed_transactions == 0 {
        flags.push(RiskFlag::FirstTransactionWithdrawal);
    }

    let raw_score = flags
        .iter()
        .map(RiskFlag::points)
        .sum::<u32>();

    RiskAssessment {
        raw_score,
        blocked: raw_score > rules.suspicious_activity_threshold,
        flags,
    }
}
