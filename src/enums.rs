use std::fmt;
use std::str::FromStr;

use serde::{ Deserialize, Serialize };

use crate::error::AppError;

// ─── WithdrawalMethod ───────────────────────────────────────────────

/// Where a withdrawal is paid out to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WithdrawalMethod {
    #[default]
    BankTransfer,
    Upi,
}

impl WithdrawalMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            WithdrawalMethod::BankTransfer => "bank_transfer",
            WithdrawalMethod::Upi => "upi",
        }
    }

    /// Customer-facing estimate shown after a withdrawal is accepted.
    pub fn estimated_credit_time(&self) -> &'static str {
        match self {
            WithdrawalMethod::BankTransfer => "1-2 business days",
            WithdrawalMethod::Upi => "Within 30 minutes",
        }
    }
}

impl fmt::Display for WithdrawalMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WithdrawalMethod {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "bank_transfer" | "bank" => Ok(WithdrawalMethod::BankTransfer),
            "upi" => Ok(WithdrawalMethod::Upi),
            _ => Err(AppError::InvalidInput(format!(
                "Invalid withdrawal method: {}. Supported: bank_transfer, upi",
                s
            ))),
        }
    }
}

// ─── WithdrawalStatus ───────────────────────────────────────────────

/// Lifecycle of a withdrawal record.
///
/// `processing` is the only non-terminal state. Records enter it once the
/// wallet has been debited and leave it through a provider outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WithdrawalStatus {
    Processing,
    Completed,
    RejectedBySystem,
    Failed,
}

impl WithdrawalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            WithdrawalStatus::Processing => "processing",
            WithdrawalStatus::Completed => "completed",
            WithdrawalStatus::RejectedBySystem => "rejected_by_system",
            WithdrawalStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, WithdrawalStatus::Processing)
    }

    /// Statuses that count against the daily count and amount limits.
    pub fn counted_towards_limits() -> &'static [WithdrawalStatus] {
        &[WithdrawalStatus::Processing, WithdrawalStatus::Completed]
    }
}

impl fmt::Display for WithdrawalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WithdrawalStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "processing" => Ok(WithdrawalStatus::Processing),
            "completed" => Ok(WithdrawalStatus::Completed),
            "rejected_by_system" => Ok(WithdrawalStatus::RejectedBySystem),
            "failed" => Ok(WithdrawalStatus::Failed),
            _ => Err(AppError::InvalidInput(format!("Invalid withdrawal status: {}", s))),
        }
    }
}

// ─── FeeType ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeeType {
    Fixed,
    Percentage,
}

impl FeeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeeType::Fixed => "fixed",
            FeeType::Percentage => "percentage",
        }
    }
}

impl fmt::Display for FeeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FeeType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "fixed" => Ok(FeeType::Fixed),
            "percentage" | "percent" => Ok(FeeType::Percentage),
            _ => Err(AppError::Config(format!("Invalid withdrawal fee type: {}", s))),
        }
    }
}

// ─── Ledger ─────────────────────────────────────────────────────────

/// Why a wallet ledger entry exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionSource {
    Withdrawal,
    WithdrawalRefund,
}

impl TransactionSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionSource::Withdrawal => "withdrawal",
            TransactionSource::WithdrawalRefund => "withdrawal_refund",
        }
    }
}

impl fmt::Display for TransactionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerStatus {
    Pending,
    Completed,
    Reversed,
}

impl LedgerStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LedgerStatus::Pending => "pending",
            LedgerStatus::Completed => "completed",
            LedgerStatus::Reversed => "reversed",
        }
    }
}

impl fmt::Display for LedgerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── PaymentMethod ──────────────────────────────────────────────────

/// How the customer paid for an appointment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentMethod {
    /// Platform collected the full amount.
    #[serde(rename = "Pay Online")]
    PayOnline,
    /// Vendor collected in person.
    #[serde(rename = "Pay at Salon")]
    PayAtSalon,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::PayOnline => "Pay Online",
            PaymentMethod::PayAtSalon => "Pay at Salon",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pay online" | "online" => Ok(PaymentMethod::PayOnline),
            "pay at salon" | "salon" => Ok(PaymentMethod::PayAtSalon),
            _ => Err(AppError::InvalidInput(format!("Invalid payment method: {}", s))),
        }
    }
}

// ─── SettlementDirection ────────────────────────────────────────────

/// Direction of a manual settlement transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SettlementDirection {
    #[serde(rename = "Payment to Vendor")]
    ToVendor,
    #[serde(rename = "Payment to Admin")]
    ToAdmin,
}

impl SettlementDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SettlementDirection::ToVendor => "Payment to Vendor",
            SettlementDirection::ToAdmin => "Payment to Admin",
        }
    }
}

impl fmt::Display for SettlementDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SettlementDirection {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "payment to vendor" => Ok(SettlementDirection::ToVendor),
            "payment to admin" => Ok(SettlementDirection::ToAdmin),
            _ => Err(AppError::InvalidInput(format!(
                "Invalid payment type: {}. Supported: Payment to Vendor, Payment to Admin",
                s
            ))),
        }
    }
}

// ─── SettlementStatus ───────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SettlementStatus {
    Paid,
    #[serde(rename = "Partially Paid")]
    PartiallyPaid,
    Pending,
}

impl SettlementStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SettlementStatus::Paid => "Paid",
            SettlementStatus::PartiallyPaid => "Partially Paid",
            SettlementStatus::Pending => "Pending",
        }
    }
}

impl fmt::Display for SettlementStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SettlementStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace(['_', '-'], " ").as_str() {
            "paid" => Ok(SettlementStatus::Paid),
            "partially paid" => Ok(SettlementStatus::PartiallyPaid),
            "pending" => Ok(SettlementStatus::Pending),
            _ => Err(AppError::InvalidInput(format!(
                "Invalid settlement status: {}. Supported: Paid, Partially Paid, Pending",
                s
            ))),
        }
    }
}

// ─── SettlementPeriod ───────────────────────────────────────────────

/// Named settlement window, resolved against the business timezone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SettlementPeriod {
    Today,
    Week,
    #[default]
    Month,
    Year,
    All,
}

impl SettlementPeriod {
    pub fn as_str(&self) -> &'static str {
        match self {
            SettlementPeriod::Today => "today",
            SettlementPeriod::Week => "week",
            SettlementPeriod::Month => "month",
            SettlementPeriod::Year => "year",
            SettlementPeriod::All => "all",
        }
    }
}

impl fmt::Display for SettlementPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SettlementPeriod {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "today" | "day" => Ok(SettlementPeriod::Today),
            "week" => Ok(SettlementPeriod::Week),
            "month" => Ok(SettlementPeriod::Month),
            "year" => Ok(SettlementPeriod::Year),
            "all" => Ok(SettlementPeriod::All),
            _ => Err(AppError::InvalidInput(format!(
                "Invalid period: {}. Supported: today, week, month, year, all",
                s
            ))),
        }
    }
}

// ─── CallerRole ─────────────────────────────────────────────────────

/// Role carried by an authenticated session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallerRole {
    Vendor,
    Doctor,
    Staff,
    Admin,
    Customer,
}

impl CallerRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            CallerRole::Vendor => "vendor",
            CallerRole::Doctor => "doctor",
            CallerRole::Staff => "staff",
            CallerRole::Admin => "admin",
            CallerRole::Customer => "customer",
        }
    }
}

impl fmt::Display for CallerRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CallerRole {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "vendor" => Ok(CallerRole::Vendor),
            "doctor" => Ok(CallerRole::Doctor),
            "staff" => Ok(CallerRole::Staff),
            "admin" => Ok(CallerRole::Admin),
            "customer" | "user" => Ok(CallerRole::Customer),
            _ => Err(AppError::Unauthorized(format!("Unknown role: {}", s))),
        }
    }
}
