use std::sync::Arc;

use axum::{ extract::rejection::{ JsonRejection, QueryRejection }, routing::{ get, post }, Json, Router };
use serde::Serialize;

pub mod settlement;
pub mod withdrawal;

use crate::error::{ AppError, Result };
use crate::services::{ SettingsService, SettlementService, WithdrawalService };

#[derive(Clone)]
pub struct AppState {
    pub withdrawal_service: Arc<WithdrawalService>,
    pub settlement_service: Arc<SettlementService>,
    pub settings_service: Arc<SettingsService>,
    /// Shared secret payout callbacks must present, when configured.
    pub webhook_secret: Option<Arc<str>>,
}

impl AppState {
    pub fn new(
        withdrawal_service: Arc<WithdrawalService>,
        settlement_service: Arc<SettlementService>,
        settings_service: Arc<SettingsService>,
        webhook_secret: Option<String>
    ) -> Self {
        Self {
            withdrawal_service,
            settlement_service,
            settings_service,
            webhook_secret: webhook_secret.map(Arc::from),
        }
    }
}

/// Success envelope shared by every endpoint.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            message: None,
            data,
        })
    }

    pub fn with_message(message: impl Into<String>, data: T) -> Json<Self> {
        Json(Self {
            success: true,
            message: Some(message.into()),
            data,
        })
    }
}

/// Unwraps a JSON body, turning extractor rejections into our error shape.
pub(crate) fn json_body<T>(payload: std::result::Result<Json<T>, JsonRejection>) -> Result<T> {
    payload.map(|Json(body)| body).map_err(|rejection| AppError::InvalidInput(rejection.body_text()))
}

pub(crate) fn query_params<T>(
    params: std::result::Result<axum::extract::Query<T>, QueryRejection>
) -> Result<T> {
    params
        .map(|axum::extract::Query(query)| query)
        .map_err(|rejection| AppError::InvalidInput(rejection.body_text()))
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route(
            "/api/wallet/withdrawals",
            post(withdrawal::request_withdrawal).get(withdrawal::list_withdrawals)
        )
        .route("/api/wallet/withdrawals/callback", post(withdrawal::provider_callback))
        .route("/api/wallet/settings", get(withdrawal::get_settings))
        .route("/api/settlements", get(settlement::get_settlements))
        .route("/api/settlements/payments", post(settlement::record_payment))
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{ body::Body, http::{ Request, StatusCode } };
    use chrono::FixedOffset;
    use sea_orm::DatabaseConnection;
    use tower::ServiceExt;

    fn app(secret: Option<&str>) -> Router {
        let db = DatabaseConnection::Disconnected;
        let offset = FixedOffset::east_opt(330 * 60).unwrap();
        let settings = Arc::new(SettingsService::new(DatabaseConnection::Disconnected));

        router(
            AppState::new(
                Arc::new(WithdrawalService::new(DatabaseConnection::Disconnected, settings.clone(), offset)),
                Arc::new(SettlementService::new(db, offset)),
                settings,
                secret.map(str::to_string)
            )
        )
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let response = app(None)
            .oneshot(Request::get("/health").body(Body::empty()).unwrap()).await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_settlements_require_session() {
        let response = app(None)
            .oneshot(Request::get("/api/settlements").body(Body::empty()).unwrap()).await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = body_json(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "Please log in to continue");
    }

    #[tokio::test]
    async fn test_customer_cannot_read_settlements() {
        let request = Request::get("/api/settlements")
            .header("x-user-id", uuid::Uuid::new_v4().to_string())
            .header("x-user-role", "customer")
            .body(Body::empty())
            .unwrap();
        let response = app(None).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_malformed_withdrawal_amount_is_rejected_before_storage() {
        let request = Request::post("/api/wallet/withdrawals")
            .header("x-user-id", uuid::Uuid::new_v4().to_string())
            .header("x-user-role", "vendor")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"amount":"abc","bankDetails":{}}"#))
            .unwrap();
        let response = app(None).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["message"], "Please enter a valid withdrawal amount");
    }

    #[tokio::test]
    async fn test_callback_checks_webhook_secret() {
        let request = Request::post("/api/wallet/withdrawals/callback")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"providerReference":"WD-1","status":"completed"}"#))
            .unwrap();
        let response = app(Some("s3cret")).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
