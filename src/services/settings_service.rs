use chrono::Utc;
use rust_decimal_macros::dec;
use sea_orm::{
    sea_query::OnConflict,
    ActiveValue,
    DatabaseConnection,
    EntityTrait,
};

use crate::db::entity::{ wallet_settings, WalletSettings };
use crate::enums::FeeType;
use crate::error::{ AppError, Result };

const SETTINGS_ID: i32 = 1;

/// Read access to the wallet settings singleton.
// sea-orm's `mock` feature (dev-dependency) makes `DatabaseConnection` non-Clone.
#[cfg_attr(not(test), derive(Clone))]
pub struct SettingsService {
    db: DatabaseConnection,
}

impl SettingsService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Get or create the settings row
    pub async fn get_or_create_settings(&self) -> Result<wallet_settings::Model> {
        if let Some(settings) = WalletSettings::find_by_id(SETTINGS_ID).one(&self.db).await? {
            return Ok(settings);
        }

        tracing::info!("Wallet settings missing, creating defaults");

        // Two first readers may race here; the loser's insert is a no-op.
        WalletSettings::insert(Self::defaults())
            .on_conflict(OnConflict::column(wallet_settings::Column::Id).do_nothing().to_owned())
            .exec_without_returning(&self.db).await?;

        WalletSettings::find_by_id(SETTINGS_ID)
            .one(&self.db).await?
            .ok_or_else(|| AppError::Internal("Wallet settings could not be created".to_string()))
    }

    fn defaults() -> wallet_settings::ActiveModel {
        wallet_settings::ActiveModel {
            id: ActiveValue::Set(SETTINGS_ID),
            min_withdrawal_amount: ActiveValue::Set(dec!(100)),
            max_withdrawal_amount: ActiveValue::Set(dec!(50000)),
            max_withdrawals_per_day: ActiveValue::Set(3),
            max_daily_withdrawal_amount: ActiveValue::Set(dec!(100000)),
            cooldown_period_hours: ActiveValue::Set(0),
            fee_type: ActiveValue::Set(FeeType::Fixed.as_str().to_string()),
            fee_value: ActiveValue::Set(dec!(10)),
            new_account_restriction_days: ActiveValue::Set(30),
            max_new_account_withdrawal: ActiveValue::Set(dec!(5000)),
            rapid_withdrawal_window_minutes: ActiveValue::Set(60),
            rapid_withdrawal_count: ActiveValue::Set(3),
            suspicious_activity_threshold: ActiveValue::Set(50),
            max_amount_per_transaction: ActiveValue::Set(dec!(25000)),
            auto_fraud_detection: ActiveValue::Set(true),
            updated_at: ActiveValue::Set(Utc::now()),
        }
    }
}
