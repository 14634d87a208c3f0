use std::sync::Arc;

use chrono::Utc;
use tokio::time::{ interval, Duration, MissedTickBehavior };

use crate::services::WithdrawalService;

/// Completes `processing` withdrawals once they are older than the settle
/// delay, standing in for the payout provider's success callback.
pub struct SettlementSweeper {
    withdrawal_service: Arc<WithdrawalService>,
    every: Duration,
    settle_delay: Duration,
}

impl SettlementSweeper {
    pub fn new(
        withdrawal_service: Arc<WithdrawalService>,
        every: Duration,
        settle_delay: Duration
    ) -> Self {
        Self {
            withdrawal_service,
            every,
            settle_delay,
        }
    }

    pub async fn start(self) {
        let mut interval = interval(self.every);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!(
            every_secs = self.every.as_secs(),
            settle_delay_secs = self.settle_delay.as_secs(),
            "Settlement sweeper started"
        );

        loop {
            interval.tick().await;

            if let Err(e) = self.sweep().await {
                tracing::error!(error = %e, "Settlement sweep failed");
            }
        }
    }

    async fn sweep(&self) -> crate::error::Result<()> {
        let delay = chrono::Duration
            ::from_std(self.settle_delay)
            .map_err(|e| crate::error::AppError::Config(e.to_string()))?;

        let settled = self.withdrawal_service.complete_due(Utc::now() - delay).await?;
        if settled > 0 {
            tracing::info!(settled, "Settled processing withdrawals");
        }

        Ok(())
    }
}
