use std::str::FromStr;

use chrono::{ DateTime, Duration, Utc };
use lazy_static::lazy_static;
use regex::Regex;
use rust_decimal::RoundingStrategy;
use sea_orm::prelude::Decimal;
use rust_decimal_macros::dec;
use serde::{ Deserialize, Serialize };
use validator::Validate;

use crate::db::entity::wallet_settings;
use crate::enums::{ FeeType, WithdrawalMethod };
use crate::error::{ AppError, Result };
use crate::services::risk_scoring::FraudRules;

lazy_static! {
    static ref ACCOUNT_NUMBER_RE: Regex =
        Regex::new(r"^[0-9]{9,18}$").expect("Invalid account number regex");
    static ref IFSC_RE: Regex =
        Regex::new(r"^[A-Z]{4}0[A-Z0-9]{6}$").expect("Invalid IFSC regex");
    static ref UPI_ID_RE: Regex =
        Regex::new(r"^[a-zA-Z0-9._-]{2,256}@[a-zA-Z][a-zA-Z0-9]{1,64}$").expect("Invalid UPI regex");
}

/// Largest value the `numeric(14,2)` money columns hold.
pub const MAX_MONEY_AMOUNT: Decimal = dec!(999999999999.99);

/// Destination fields as submitted. Which ones are required depends on the
/// withdrawal method.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BankDetailsInput {
    pub account_number: Option<String>,
    pub ifsc: Option<String>,
    pub account_holder_name: Option<String>,
    pub upi_id: Option<String>,
    pub bank_name: Option<String>,
}

#[derive(Debug, Validate)]
struct BankTransferFields {
    #[validate(length(min = 1, message = "Account holder name is required"))]
    account_holder_name: String,
    #[validate(regex(path = "ACCOUNT_NUMBER_RE", message = "Account number must be 9 to 18 digits"))]
    account_number: String,
    #[validate(regex(path = "IFSC_RE", message = "Please enter a valid IFSC code"))]
    ifsc: String,
}

#[derive(Debug, Validate)]
struct UpiFields {
    #[validate(regex(path = "UPI_ID_RE", message = "Please enter a valid UPI ID"))]
    upi_id: String,
    #[validate(length(min = 1, message = "Account holder name is required"))]
    account_holder_name: String,
}

/// Validated, normalized payout destination. Stored as the record's
/// destination snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "method", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum Destination {
    BankTransfer {
        account_number: String,
        ifsc: String,
        account_holder_name: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        bank_name: Option<String>,
    },
    Upi {
        upi_id: String,
        account_holder_name: String,
    },
}

impl Destination {
    pub fn validate(method: WithdrawalMethod, input: &BankDetailsInput) -> Result<Self> {
        match method {
            WithdrawalMethod::Upi => {
                let fields = UpiFields {
                    upi_id: trimmed(&input.upi_id),
                    account_holder_name: trimmed(&input.account_holder_name),
                };
                fields
                    .validate()
                    .map_err(|e| AppError::validation(&e, &["upi_id", "account_holder_name"]))?;

                Ok(Destination::Upi {
                    upi_id: fields.upi_id,
                    account_holder_name: fields.account_holder_name,
                })
            }
            WithdrawalMethod::BankTransfer => {
                let fields = BankTransferFields {
                    account_holder_name: trimmed(&input.account_holder_name),
                    account_number: trimmed(&input.account_number),
                    ifsc: trimmed(&input.ifsc).to_uppercase(),
                };
                fields
                    .validate()
                    .map_err(|e| {
                        AppError::validation(&e, &["account_holder_name", "account_number", "ifsc"])
                    })?;

                let bank_name = trimmed(&input.bank_name);

                Ok(Destination::BankTransfer {
                    account_number: fields.account_number,
                    ifsc: fields.ifsc,
                    account_holder_name: fields.account_holder_name,
                    bank_name: (!bank_name.is_empty()).then_some(bank_name),
                })
            }
        }
    }

    pub fn method(&self) -> WithdrawalMethod {
        match self {
            Destination::BankTransfer { .. } => WithdrawalMethod::BankTransfer,
            Destination::Upi { .. } => WithdrawalMethod::Upi,
        }
    }
}

fn trimmed(value: &Option<String>) -> String {
    value.as_deref().map(str::trim).unwrap_or_default().to_string()
}

/// Why a submitted money amount was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AmountError {
    NotANumber,
    NotPositive,
    TooPrecise,
    TooLarge,
}

/// Accepts a JSON number or numeric string holding a positive rupee amount
/// with at most two decimal places that fits the money columns.
pub fn parse_money(raw: &serde_json::Value) -> std::result::Result<Decimal, AmountError> {
    let amount = match raw {
        serde_json::Value::Number(n) => {
            let text = n.to_string();
            Decimal::from_str(&text)
                .or_else(|_| Decimal::from_scientific(&text))
                .map_err(|_| AmountError::NotANumber)?
        }
        serde_json::Value::String(s) =>
            Decimal::from_str(s.trim()).map_err(|_| AmountError::NotANumber)?,
        _ => {
            return Err(AmountError::NotANumber);
        }
    };

    let amount = amount.normalize();

    if amount <= Decimal::ZERO {
        return Err(AmountError::NotPositive);
    }
    if amount.scale() > 2 {
        return Err(AmountError::TooPrecise);
    }
    if amount > MAX_MONEY_AMOUNT {
        return Err(AmountError::TooLarge);
    }

    Ok(amount)
}

pub fn parse_amount(raw: &serde_json::Value) -> Result<Decimal> {
    parse_money(raw).map_err(|_| {
        AppError::InvalidInput("Please enter a valid withdrawal amount".to_string())
    })
}

/// Rupee amount without trailing zeros, for user-facing messages.
pub fn format_rupees(amount: Decimal) -> String {
    format!("₹{}", amount.normalize())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeeRule {
    Fixed(Decimal),
    Percentage(Decimal),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeBreakdown {
    pub fee: Decimal,
    pub net_amount: Decimal,
}

impl FeeRule {
    /// Fee is capped at the amount so the net payout never goes negative.
    pub fn apply(&self, amount: Decimal) -> FeeBreakdown {
        let fee = match *self {
            FeeRule::Fixed(value) => value,
            FeeRule::Percentage(percent) => {
                (amount * percent / Decimal::ONE_HUNDRED).round_dp_with_strategy(
                    2,
                    RoundingStrategy::MidpointAwayFromZero
                )
            }
        };
        let fee = fee.max(Decimal::ZERO).min(amount);

        FeeBreakdown {
            fee,
            net_amount: amount - fee,
        }
    }
}

/// Today's usage for one user, counting only withdrawals that were not
/// rejected or failed.
#[derive(Debug, Clone, Copy, Default)]
pub struct DailyUsage {
    pub count: u64,
    pub amount: Decimal,
}

/// Limits and fee configuration resolved from the wallet settings row.
#[derive(Debug, Clone)]
pub struct WithdrawalPolicy {
    pub min_amount: Decimal,
    pub max_amount: Decimal,
    pub max_withdrawals_per_day: u64,
    pub max_daily_amount: Decimal,
    pub cooldown: Option<Duration>,
    pub fee: FeeRule,
    /// `None` when automatic fraud detection is switched off.
    pub fraud_rules: Option<FraudRules>,
}

impl WithdrawalPolicy {
    pub fn from_settings(settings: &wallet_settings::Model) -> Result<Self> {
        let fee = match settings.fee_type.parse::<FeeType>()? {
            FeeType::Fixed => FeeRule::Fixed(settings.fee_value),
            FeeType::Percentage => FeeRule::Percentage(settings.fee_value),
        };

        let cooldown = (settings.cooldown_period_hours > 0).then(|| {
            Duration::hours(settings.cooldown_period_hours as i64)
        });

        Ok(Self {
            min_amount: settings.min_withdrawal_amount,
            max_amount: settings.max_withdrawal_amount,
            max_withdrawals_per_day: settings.max_withdrawals_per_day.max(0) as u64,
            max_daily_amount: settings.max_daily_withdrawal_amount,
            cooldown,
            fee,
            fraud_rules: settings.auto_fraud_detection.then(|| FraudRules::from_settings(settings)),
        })
    }

    pub fn check_amount(&self, amount: Decimal) -> Result<()> {
        if amount < self.min_amount {
            return Err(
                AppError::policy(
                    format!("Minimum withdrawal amount is {}", format_rupees(self.min_amount))
                )
            );
        }

        if amount > self.max_amount {
            return Err(
                AppError::policy(
                    format!("Maximum withdrawal amount is {}", format_rupees(self.max_amount))
                )
            );
        }

        Ok(())
    }

    pub fn check_balance(amount: Decimal, balance: Decimal) -> Result<()> {
        if amount > balance {
            return Err(AppError::InsufficientBalance);
        }
        Ok(())
    }

    pub fn check_daily_limits(&self, usage: &DailyUsage, amount: Decimal) -> Result<()> {
        if usage.count >= self.max_withdrawals_per_day {
            return Err(
                AppError::policy(
                    format!(
                        "Daily withdrawal limit reached. You can make up to {} withdrawals per day",
                        self.max_withdrawals_per_day
                    )
                )
            );
        }

        if usage.amount + amount > self.max_daily_amount {
            let remaining = (self.max_daily_amount - usage.amount).max(Decimal::ZERO);
            return Err(
                AppError::policy(
                    format!(
                        "Daily withdrawal amount limit of {} exceeded. Remaining today: {}",
                        format_rupees(self.max_daily_amount),
                        format_rupees(remaining)
                    )
                )
            );
        }

        Ok(())
    }

    /// The cooldown must have fully elapsed since the last completed
    /// withdrawal.
    pub fn check_cooldown(
        &self,
        last_completed_at: Option<DateTime<Utc>>,
        now: DateTime<Utc>
    ) -> Result<()> {
        let (Some(cooldown), Some(last)) = (self.cooldown, last_completed_at) else {
            return Ok(());
        };

        if now - last <= cooldown {
            return Err(AppError::PolicyViolation {
                message: "Please wait before making another withdrawal".to_string(),
                next_allowed_at: Some(last + cooldown),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn settings() -> wallet_settings::Model {
        wallet_settings::Model {
            id: 1,
            min_withdrawal_amount: dec!(100),
            max_withdrawal_amount: dec!(50000),
            max_withdrawals_per_day: 3,
            max_daily_withdrawal_amount: dec!(100000),
            cooldown_period_hours: 0,
            fee_type: "fixed".to_string(),
            fee_value: dec!(10),
            new_account_restriction_days: 30,
            max_new_account_withdrawal: dec!(5000),
            rapid_withdrawal_window_minutes: 60,
            rapid_withdrawal_count: 3,
            suspicious_activity_threshold: 40,
            max_amount_per_transaction: dec!(100000),
            auto_fraud_detection: true,
            updated_at: Utc::now(),
        }
    }

    fn bank_input() -> BankDetailsInput {
        BankDetailsInput {
            account_number: Some("123456789012".to_string()),
            ifsc: Some(" hdfc0001234 ".to_string()),
            account_holder_name: Some("Asha Rao".to_string()),
            upi_id: None,
            bank_name: Some("HDFC Bank".to_string()),
        }
    }

    #[test]
    fn test_bank_destination_normalizes_ifsc() {
        let destination = Destination::validate(WithdrawalMethod::BankTransfer, &bank_input()).unwrap();

        match destination {
            Destination::BankTransfer { ifsc, .. } => assert_eq!(ifsc, "HDFC0001234"),
            other => panic!("unexpected destination {:?}", other),
        }
    }

    #[test]
    fn test_bank_destination_rejects_short_account_number() {
        let mut input = bank_input();
        input.account_number = Some("12345678".to_string());

        let err = Destination::validate(WithdrawalMethod::BankTransfer, &input).unwrap_err();
        assert_eq!(err.to_string(), "Account number must be 9 to 18 digits");
    }

    #[test]
    fn test_bank_destination_rejects_bad_ifsc() {
        let mut input = bank_input();
        input.ifsc = Some("HDFC1001234".to_string());

        let err = Destination::validate(WithdrawalMethod::BankTransfer, &input).unwrap_err();
        assert_eq!(err.to_string(), "Please enter a valid IFSC code");
    }

    #[test]
    fn test_bank_destination_rejects_non_ascii_digits() {
        let mut input = bank_input();
        input.account_number = Some("१२३४५६७८९०".to_string());

        let err = Destination::validate(WithdrawalMethod::BankTransfer, &input).unwrap_err();
        assert_eq!(err.to_string(), "Account number must be 9 to 18 digits");
    }

    #[test]
    fn test_bank_destination_reports_holder_name_first() {
        let input = BankDetailsInput {
            account_number: Some("12".to_string()),
            ifsc: Some("bad".to_string()),
            ..Default::default()
        };

        let err = Destination::validate(WithdrawalMethod::BankTransfer, &input).unwrap_err();
        assert_eq!(err.to_string(), "Account holder name is required");
    }

    #[test]
    fn test_blank_bank_name_is_dropped() {
        let mut input = bank_input();
        input.bank_name = Some("  ".to_string());

        match Destination::validate(WithdrawalMethod::BankTransfer, &input).unwrap() {
            Destination::BankTransfer { bank_name, account_number, .. } => {
                assert_eq!(bank_name, None);
                assert_eq!(account_number, "123456789012");
            }
            other => panic!("unexpected destination {:?}", other),
        }
    }

    #[test]
    fn test_upi_destination_requires_handle_and_holder() {
        let mut input = BankDetailsInput {
            upi_id: Some("asha.rao@okhdfc".to_string()),
            account_holder_name: Some("Asha Rao".to_string()),
            ..Default::default()
        };
        let destination = Destination::validate(WithdrawalMethod::Upi, &input).unwrap();
        assert_eq!(destination.method(), WithdrawalMethod::Upi);

        input.upi_id = Some("asha.rao".to_string());
        let err = Destination::validate(WithdrawalMethod::Upi, &input).unwrap_err();
        assert_eq!(err.to_string(), "Please enter a valid UPI ID");

        input.upi_id = Some("asha.rao@okhdfc".to_string());
        input.account_holder_name = Some("   ".to_string());
        let err = Destination::validate(WithdrawalMethod::Upi, &input).unwrap_err();
        assert_eq!(err.to_string(), "Account holder name is required");
    }

    #[test]
    fn test_destination_snapshot_shape() {
        let destination = Destination::validate(WithdrawalMethod::BankTransfer, &bank_input()).unwrap();
        let json = serde_json::to_value(&destination).unwrap();

        assert_eq!(json["method"], "bank_transfer");
        assert_eq!(json["accountHolderName"], "Asha Rao");
        assert_eq!(json["bankName"], "HDFC Bank");
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount(&serde_json::json!(500)).unwrap(), dec!(500));
        assert_eq!(parse_amount(&serde_json::json!("250.50")).unwrap(), dec!(250.50));
        assert!(parse_amount(&serde_json::json!(0)).is_err());
        assert!(parse_amount(&serde_json::json!(-5)).is_err());
        assert!(parse_amount(&serde_json::json!("abc")).is_err());
        assert!(parse_amount(&serde_json::Value::Null).is_err());
    }

    #[test]
    fn test_amount_limited_to_paise() {
        assert_eq!(parse_amount(&serde_json::json!("100.50")).unwrap(), dec!(100.5));
        assert_eq!(parse_amount(&serde_json::json!("100.500")).unwrap(), dec!(100.5));
        assert_eq!(parse_money(&serde_json::json!("100.005")), Err(AmountError::TooPrecise));
        assert_eq!(parse_money(&serde_json::json!(100.005)), Err(AmountError::TooPrecise));

        let err = parse_amount(&serde_json::json!("100.005")).unwrap_err();
        assert_eq!(err.to_string(), "Please enter a valid withdrawal amount");
    }

    #[test]
    fn test_amount_must_fit_money_column() {
        assert_eq!(parse_money(&serde_json::json!("999999999999.99")), Ok(MAX_MONEY_AMOUNT));
        assert_eq!(parse_money(&serde_json::json!("1000000000000")), Err(AmountError::TooLarge));
        assert_eq!(parse_money(&serde_json::json!(1e15)), Err(AmountError::TooLarge));
        assert_eq!(parse_money(&serde_json::json!("-1")), Err(AmountError::NotPositive));
        assert_eq!(parse_money(&serde_json::json!(true)), Err(AmountError::NotANumber));
    }

    #[test]
    fn test_minimum_amount_message() {
        let policy = WithdrawalPolicy::from_settings(&settings()).unwrap();
        let err = policy.check_amount(dec!(50)).unwrap_err();

        assert_eq!(err.to_string(), "Minimum withdrawal amount is ₹100");
        assert!(policy.check_amount(dec!(100)).is_ok());
        assert!(policy.check_amount(dec!(50001)).is_err());
    }

    #[test]
    fn test_insufficient_balance() {
        let err = WithdrawalPolicy::check_balance(dec!(1500), dec!(1000)).unwrap_err();
        assert_eq!(err.to_string(), "Insufficient wallet balance");
        assert!(WithdrawalPolicy::check_balance(dec!(1000), dec!(1000)).is_ok());
    }

    #[test]
    fn test_fixed_fee() {
        let policy = WithdrawalPolicy::from_settings(&settings()).unwrap();
        let breakdown = policy.fee.apply(dec!(500));

        assert_eq!(breakdown.fee, dec!(10));
        assert_eq!(breakdown.net_amount, dec!(490));
        assert_eq!(breakdown.fee + breakdown.net_amount, dec!(500));
    }

    #[test]
    fn test_percentage_fee_rounds_to_paise() {
        let rule = FeeRule::Percentage(dec!(1.5));
        let breakdown = rule.apply(dec!(333.33));

        assert_eq!(breakdown.fee, dec!(5.00));
        assert_eq!(breakdown.net_amount, dec!(328.33));
    }

    #[test]
    fn test_fee_never_exceeds_amount() {
        let breakdown = FeeRule::Fixed(dec!(25)).apply(dec!(20));
        assert_eq!(breakdown.fee, dec!(20));
        assert_eq!(breakdown.net_amount, Decimal::ZERO);
    }

    #[test]
    fn test_daily_count_limit() {
        let policy = WithdrawalPolicy::from_settings(&settings()).unwrap();
        let usage = DailyUsage { count: 3, amount: dec!(300) };

        assert!(policy.check_daily_limits(&usage, dec!(100)).is_err());
        assert!(policy.check_daily_limits(&DailyUsage { count: 2, ..usage }, dec!(100)).is_ok());
    }

    #[test]
    fn test_daily_amount_limit() {
        let policy = WithdrawalPolicy::from_settings(&settings()).unwrap();
        let usage = DailyUsage { count: 1, amount: dec!(60000) };

        assert!(policy.check_daily_limits(&usage, dec!(40000)).is_ok());

        let err = policy.check_daily_limits(&usage, dec!(40001)).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Daily withdrawal amount limit of ₹100000 exceeded. Remaining today: ₹40000"
        );
    }

    #[test]
    fn test_cooldown_reports_next_allowed_time() {
        let mut s = settings();
        s.cooldown_period_hours = 24;
        let policy = WithdrawalPolicy::from_settings(&s).unwrap();

        let now = Utc::now();
        let last = now - Duration::hours(5);

        match policy.check_cooldown(Some(last), now) {
            Err(AppError::PolicyViolation { message, next_allowed_at }) => {
                assert_eq!(message, "Please wait before making another withdrawal");
                assert_eq!(next_allowed_at, Some(last + Duration::hours(24)));
            }
            other => panic!("expected cooldown violation, got {:?}", other),
        }

        assert!(policy.check_cooldown(Some(now - Duration::hours(25)), now).is_ok());
        assert!(policy.check_cooldown(None, now).is_ok());
    }

    #[test]
    fn test_zero_cooldown_is_disabled() {
        let policy = WithdrawalPolicy::from_settings(&settings()).unwrap();
        assert!(policy.cooldown.is_none());
        assert!(policy.check_cooldown(Some(Utc::now()), Utc::now()).is_ok());
    }

    #[test]
    fn test_fraud_rules_follow_toggle() {
        let mut s = settings();
        assert!(WithdrawalPolicy::from_settings(&s).unwrap().fraud_rules.is_some());

        s.auto_fraud_detection = false;
        assert!(WithdrawalPolicy::from_settings(&s).unwrap().fraud_rules.is_none());
    }
}
