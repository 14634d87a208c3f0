pub mod user;
pub mod vendor;
pub mod staff;
pub mod wallet;
pub mod wallet_transaction;
pub mod wallet_settings;
pub mod withdrawal;
pub mod appointment;
pub mod settlement_payment;

pub use user::Entity as User;
pub use vendor::Entity as Vendor;
pub use staff::Entity as Staff;
pub use wallet::Entity as Wallet;
pub use wallet_transaction::Entity as WalletTransaction;
pub use wallet_settings::Entity as WalletSettings;
pub use withdrawal::Entity as Withdrawal;
pub use appointment::Entity as Appointment;
pub use settlement_payment::Entity as SettlementPayment;
