pub mod period;
pub mod risk_scoring;
pub mod settings_service;
pub mod settlement_reconciler;
pub mod settlement_service;
pub mod withdrawal_policy;
pub mod withdrawal_service;

pub use settings_service::SettingsService;
pub use settlement_service::SettlementService;
pub use withdrawal_service::WithdrawalService;
