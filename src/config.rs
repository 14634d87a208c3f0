use std::env;
use std::time::Duration;

use chrono::FixedOffset;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub server_host: String,
    pub server_port: u16,
    /// Offset that defines "today", calendar periods and daily limits.
    pub business_offset: FixedOffset,
    pub withdrawal_settle_delay: Duration,
    /// `None` disables the background settlement sweep.
    pub sweep_interval: Option<Duration>,
    pub payout_webhook_secret: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        dotenv::dotenv().ok();

        let database_url = env::var("DATABASE_URL")?;

        let server_host = env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let server_port = env::var("SERVER_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse()?;

        let offset_minutes: i32 = env::var("BUSINESS_UTC_OFFSET_MINUTES")
            .unwrap_or_else(|_| "330".to_string())
            .parse()?;
        let business_offset = Self::parse_offset(offset_minutes)?;

        let settle_delay_secs: u64 = env::var("WITHDRAWAL_SETTLE_DELAY_SECS")
            .unwrap_or_else(|_| "30".to_string())
            .parse()?;

        let sweep_interval_secs: u64 = env::var("SETTLEMENT_SWEEP_INTERVAL_SECS")
            .unwrap_or_else(|_| "15".to_string())
            .parse()?;

        let payout_webhook_secret = env::var("PAYOUT_WEBHOOK_SECRET")
            .ok()
            .filter(|s| !s.trim().is_empty());

        Ok(Config {
            database_url,
            server_host,
            server_port,
            business_offset,
            withdrawal_settle_delay: Duration::from_secs(settle_delay_secs),
            sweep_interval: (sweep_interval_secs > 0).then(|| Duration::from_secs(sweep_interval_secs)),
            payout_webhook_secret,
        })
    }

    fn parse_offset(minutes: i32) -> Result<FixedOffset, Box<dyn std::error::Error>> {
        FixedOffset::east_opt(minutes * 60).ok_or_else(|| {
            format!("BUSINESS_UTC_OFFSET_MINUTES out of range: {}", minutes).into()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_offset_accepts_ist() {
        let offset = Config::parse_offset(330).unwrap();
        assert_eq!(offset.local_minus_utc(), 330 * 60);
    }

    #[test]
    fn test_parse_offset_rejects_out_of_range() {
        assert!(Config::parse_offset(24 * 60).is_err());
    }
}
