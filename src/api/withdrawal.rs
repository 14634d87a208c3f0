use axum::{
    extract::{ rejection::{ JsonRejection, QueryRejection }, Query, State },
    http::{ HeaderMap, StatusCode },
    response::{ IntoResponse, Response },
    Json,
};
use chrono::{ DateTime, Utc };
use sea_orm::prelude::Decimal;
use serde::{ Deserialize, Serialize };
use uuid::Uuid;

use crate::caller::Caller;
use crate::db::entity::{ wallet_settings, withdrawal };
use crate::enums::WithdrawalStatus;
use crate::error::{ AppError, ErrorResponse, Result };
use crate::services::withdrawal_service::{
    ProviderOutcome,
    WithdrawalOutcome,
    WithdrawalRequest,
};

use super::{ json_body, query_params, ApiResponse, AppState };

pub const WEBHOOK_SECRET_HEADER: &str = "x-webhook-secret";
const BLOCKED_MESSAGE: &str = "Withdrawal request could not be processed. Please contact support.";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawalReceipt {
    pub withdrawal_id: Uuid,
    pub amount: Decimal,
    pub withdrawal_fee: Decimal,
    pub net_amount: Decimal,
    pub status: String,
    pub estimated_credit_time: &'static str,
    pub new_balance: Decimal,
    pub transaction_id: Uuid,
}

pub async fn request_withdrawal(
    State(state): State<AppState>,
    caller: Caller,
    payload: std::result::Result<Json<WithdrawalRequest>, JsonRejection>
) -> Result<Response> {
    let request = json_body(payload)?;

    match state.withdrawal_service.request_withdrawal(caller.user_id(), request).await? {
        WithdrawalOutcome::Accepted(accepted) => {
            let receipt = WithdrawalReceipt {
                withdrawal_id: accepted.withdrawal.id,
                amount: accepted.withdrawal.amount,
                withdrawal_fee: accepted.withdrawal.fee,
                net_amount: accepted.withdrawal.net_amount,
                status: accepted.withdrawal.status,
                estimated_credit_time: accepted.estimated_credit_time,
                new_balance: accepted.new_balance,
                transaction_id: accepted.transaction_id,
            };

            Ok(
                ApiResponse::with_message(
                    "Withdrawal request submitted successfully",
                    receipt
                ).into_response()
            )
        }
        WithdrawalOutcome::Blocked(blocked) => {
            let body = ErrorResponse {
                success: false,
                message: BLOCKED_MESSAGE.to_string(),
                data: Some(
                    serde_json::json!({
                        "withdrawalId": blocked.withdrawal_id,
                        "riskFlags": blocked.risk_flags,
                        "reason": blocked.reason,
                    })
                ),
            };

            Ok((StatusCode::BAD_REQUEST, Json(body)).into_response())
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub status: Option<String>,
}

impl HistoryQuery {
    /// `None` when no status filter applies.
    fn status(&self) -> Result<Option<WithdrawalStatus>> {
        match self.status.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(raw) if raw.eq_ignore_ascii_case("all") => Ok(None),
            Some(raw) => raw.parse().map(Some),
        }
    }
}

/// History entry. Risk scoring details stay internal.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawalView {
    pub id: Uuid,
    pub amount: Decimal,
    pub fee: Decimal,
    pub net_amount: Decimal,
    pub method: String,
    pub bank_details: serde_json::Value,
    pub status: String,
    pub rejection_reason: Option<String>,
    pub failure_reason: Option<String>,
    pub requested_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub failed_at: Option<DateTime<Utc>>,
}

impl From<withdrawal::Model> for WithdrawalView {
    fn from(w: withdrawal::Model) -> Self {
        Self {
            id: w.id,
            amount: w.amount,
            fee: w.fee,
            net_amount: w.net_amount,
            method: w.method,
            bank_details: w.bank_details,
            status: w.status,
            rejection_reason: w.rejection_reason,
            failure_reason: w.failure_reason,
            requested_at: w.requested_at,
            processed_at: w.processed_at,
            completed_at: w.completed_at,
            failed_at: w.failed_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub current_page: u64,
    pub total_pages: u64,
    pub total_withdrawals: u64,
    pub limit: u64,
}

#[derive(Debug, Serialize)]
pub struct WithdrawalHistory {
    pub withdrawals: Vec<WithdrawalView>,
    pub pagination: Pagination,
}

pub async fn list_withdrawals(
    State(state): State<AppState>,
    caller: Caller,
    params: std::result::Result<Query<HistoryQuery>, QueryRejection>
) -> Result<Json<ApiResponse<WithdrawalHistory>>> {
    let query = query_params(params)?;

    let status = query.status()?;

    let (result, current_page, limit) = state.withdrawal_service.list_withdrawals(
        caller.user_id(),
        status,
        query.page,
        query.limit
    ).await?;

    Ok(
        ApiResponse::ok(WithdrawalHistory {
            withdrawals: result.items.into_iter().map(WithdrawalView::from).collect(),
            pagination: Pagination {
                current_page,
                total_pages: result.total_pages,
                total_withdrawals: result.total_items,
                limit,
            },
        })
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallbackStatus {
    Completed,
    Failed,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderCallback {
    pub provider_reference: String,
    pub status: CallbackStatus,
    pub failure_reason: Option<String>,
}

impl ProviderCallback {
    fn outcome(&self) -> ProviderOutcome {
        match self.status {
            CallbackStatus::Completed => ProviderOutcome::Completed,
            CallbackStatus::Failed => ProviderOutcome::Failed {
                reason: self.failure_reason
                    .as_deref()
                    .map(str::trim)
                    .filter(|r| !r.is_empty())
                    .unwrap_or("Payout failed")
                    .to_string(),
            },
        }
    }
}

fn verify_webhook_secret(expected: Option<&str>, headers: &HeaderMap) -> Result<()> {
    let Some(expected) = expected else {
        return Ok(());
    };

    let presented = headers.get(WEBHOOK_SECRET_HEADER).and_then(|v| v.to_str().ok());
    if presented != Some(expected) {
        return Err(AppError::Unauthorized("Invalid webhook signature".to_string()));
    }

    Ok(())
}

pub async fn provider_callback(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: std::result::Result<Json<ProviderCallback>, JsonRejection>
) -> Result<Json<ApiResponse<WithdrawalView>>> {
    verify_webhook_secret(state.webhook_secret.as_deref(), &headers)?;
    let callback = json_body(payload)?;

    tracing::info!(
        provider_reference = %callback.provider_reference,
        status = ?callback.status,
        "Payout callback received"
    );

    let updated = state.withdrawal_service.settle_withdrawal(
        callback.provider_reference.trim(),
        callback.outcome()
    ).await?;

    Ok(ApiResponse::ok(WithdrawalView::from(updated)))
}

pub async fn get_settings(
    State(state): State<AppState>,
    _caller: Caller
) -> Result<Json<ApiResponse<wallet_settings::Model>>> {
    let settings = state.settings_service.get_or_create_settings().await?;
    Ok(ApiResponse::ok(settings))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn history(status: Option<&str>) -> HistoryQuery {
        HistoryQuery {
            page: None,
            limit: None,
            status: status.map(str::to_string),
        }
    }

    #[test]
    fn test_history_status_filter() {
        assert_eq!(history(None).status().unwrap(), None);
        assert_eq!(history(Some(" ")).status().unwrap(), None);
        assert_eq!(history(Some("all")).status().unwrap(), None);
        assert_eq!(history(Some("All")).status().unwrap(), None);
        assert_eq!(history(Some("ALL")).status().unwrap(), None);
        assert_eq!(
            history(Some("Completed")).status().unwrap(),
            Some(WithdrawalStatus::Completed)
        );
        assert!(matches!(history(Some("paid")).status(), Err(AppError::InvalidInput(_))));
    }

    #[test]
    fn test_webhook_secret_optional() {
        assert!(verify_webhook_secret(None, &HeaderMap::new()).is_ok());
    }

    #[test]
    fn test_webhook_secret_must_match() {
        let mut headers = HeaderMap::new();
        assert!(matches!(
            verify_webhook_secret(Some("s3cret"), &headers),
            Err(AppError::Unauthorized(_))
        ));

        headers.insert(WEBHOOK_SECRET_HEADER, HeaderValue::from_static("wrong"));
        assert!(verify_webhook_secret(Some("s3cret"), &headers).is_err());

        headers.insert(WEBHOOK_SECRET_HEADER, HeaderValue::from_static("s3cret"));
        assert!(verify_webhook_secret(Some("s3cret"), &headers).is_ok());
    }

    #[test]
    fn test_failed_callback_defaults_reason() {
        let callback: ProviderCallback = serde_json::from_value(
            serde_json::json!({ "providerReference": "WD-1", "status": "failed", "failureReason": "  " })
        ).unwrap();

        assert_eq!(callback.outcome(), ProviderOutcome::Failed { reason: "Payout failed".to_string() });
    }

    #[test]
    fn test_receipt_field_names() {
        let receipt = WithdrawalReceipt {
            withdrawal_id: Uuid::nil(),
            amount: Decimal::new(500, 0),
            withdrawal_fee: Decimal::new(10, 0),
            net_amount: Decimal::new(490, 0),
            status: "processing".to_string(),
            estimated_credit_time: "Within 30 minutes",
            new_balance: Decimal::new(500, 0),
            transaction_id: Uuid::nil(),
        };
        let json = serde_json::to_value(&receipt).unwrap();

        assert_eq!(json["withdrawalFee"], 10.0);
        assert_eq!(json["netAmount"], 490.0);
        assert_eq!(json["estimatedCreditTime"], "Within 30 minutes");
    }
}
