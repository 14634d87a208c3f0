use sea_orm::entity::prelude::*;
use serde::{ Deserialize, Serialize };

/// Singleton row (id = 1) holding withdrawal limits, fees and fraud rules.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "wallet_settings")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: i32,
    pub min_withdrawal_amount: Decimal,
    pub max_withdrawal_amount: Decimal,
    pub max_withdrawals_per_day: i32,
    pub max_daily_withdrawal_amount: Decimal,
    pub cooldown_period_hours: i32,
    pub fee_type: String,
    pub fee_value: Decimal,
    pub new_account_restriction_days: i32,
    pub max_new_account_withdrawal: Decimal,
    pub rapid_withdrawal_window_minutes: i32,
    pub rapid_withdrawal_count: i32,
    pub suspicious_activity_threshold: i32,
    pub max_amount_per_transaction: Decimal,
    pub auto_fraud_detection: bool,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
