use chrono::{ DateTime, Utc };
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")] Database(#[from] sea_orm::DbErr),

    #[error("{0}")] InvalidInput(String),

    /// A request that is well formed but not allowed by wallet policy.
    #[error("{message}")] PolicyViolation {
        message: String,
        next_allowed_at: Option<DateTime<Utc>>,
    },

    #[error("Insufficient wallet balance")]
    InsufficientBalance,

    #[error("{0}")] Unauthorized(String),

    #[error("{0}")] Forbidden(String),

    #[error("{0}")] NotFound(String),

    #[error("Configuration error: {0}")] Config(String),

    #[error("Internal error: {0}")] Internal(String),
}

impl AppError {
    pub fn policy(message: impl Into<String>) -> Self {
        AppError::PolicyViolation {
            message: message.into(),
            next_allowed_at: None,
        }
    }

    /// Reports the first failing field, checked in `field_order`, as an
    /// input error carrying that field's message.
    pub fn validation(errors: &validator::ValidationErrors, field_order: &[&str]) -> Self {
        let fields = errors.field_errors();
        let message = field_order
            .iter()
            .filter_map(|field| fields.get(*field))
            .chain(fields.values())
            .flat_map(|errs| errs.iter())
            .find_map(|e| e.message.as_ref().map(|m| m.to_string()))
            .unwrap_or_else(|| "Invalid request".to_string());

        AppError::InvalidInput(message)
    }

    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;

        match self {
            | AppError::InvalidInput(_)
            | AppError::PolicyViolation { .. }
            | AppError::InsufficientBalance => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Database(_) | AppError::Config(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn to_error_response(&self) -> ErrorResponse {
        match self {
            AppError::Database(_) | AppError::Config(_) | AppError::Internal(_) => ErrorResponse {
                success: false,
                message: "Internal server error".to_string(),
                data: None,
            },
            AppError::PolicyViolation { message, next_allowed_at: Some(at) } => ErrorResponse {
                success: false,
                message: message.clone(),
                data: Some(serde_json::json!({ "nextAllowedAt": at })),
            },
            other => ErrorResponse {
                success: false,
                message: other.to_string(),
                data: None,
            },
        }
    }
}

#[derive(Debug, serde::Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status_code();

        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        } else {
            tracing::debug!(error = %self, status = status.as_u16(), "Request rejected");
        }

        let response = self.to_error_response();
        (status, axum::Json(response)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
