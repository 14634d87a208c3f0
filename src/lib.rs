pub mod config;
pub mod enums;
pub mod error;
pub mod caller;
pub mod db;
pub mod services;
pub mod api;
pub mod scheduler;

pub use caller::Caller;
pub use config::Config;
pub use enums::{ SettlementDirection, SettlementPeriod, SettlementStatus, WithdrawalMethod, WithdrawalStatus };
pub use error::{ AppError, Result };
