use std::sync::Arc;

use migration::{ Migrator, MigratorTrait };
use salon_payouts::{ AppError, Config, Result };
use salon_payouts::scheduler::SettlementSweeper;
use salon_payouts::services::{ SettingsService, SettlementService, WithdrawalService };
use tower_http::{ cors::CorsLayer, trace::TraceLayer };
use tracing_subscriber::{ layer::SubscriberExt, util::SubscriberInitExt };

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber
        ::registry()
        .with(
            tracing_subscriber::EnvFilter
                ::try_from_default_env()
                .unwrap_or_else(|_| "salon_payouts=debug,tower_http=debug".into())
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env().map_err(|e| AppError::Config(e.to_string()))?;

    tracing::info!(
        utc_offset_secs = config.business_offset.local_minus_utc(),
        "Starting salon-payouts"
    );

    // Initialize database connection
    let db = sea_orm::Database::connect(&config.database_url).await?;

    tracing::info!("Database connected successfully");

    Migrator::up(&db, None).await?;

    tracing::info!("Migrations completed successfully");

    // Initialize services
    let settings_service = Arc::new(SettingsService::new(db.clone()));

    let withdrawal_service = Arc::new(
        WithdrawalService::new(db.clone(), settings_service.clone(), config.business_offset)
    );

    let settlement_service = Arc::new(SettlementService::new(db.clone(), config.business_offset));

    if let Some(every) = config.sweep_interval {
        let sweeper = SettlementSweeper::new(
            withdrawal_service.clone(),
            every,
            config.withdrawal_settle_delay
        );
        tokio::spawn(sweeper.start());
    } else {
        tracing::info!("Settlement sweeper disabled");
    }

    let app_state = salon_payouts::api::AppState::new(
        withdrawal_service,
        settlement_service,
        settings_service,
        config.payout_webhook_secret.clone()
    );

    // Build application router
    let app = salon_payouts::api
        ::router(app_state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    // Start server
    let addr = format!("{}:{}", config.server_host, config.server_port);
    tracing::info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener
        ::bind(&addr).await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    axum::serve(listener, app).await.map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(())
}
