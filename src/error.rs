//! API error type. Every handler returns `Result<_, AppError>`; service errors
//! convert into it with `?`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use sea_orm::DbErr;

use crate::auth::AuthError;
use crate::config::ConfigError;
use crate::models::common::ErrorResponse;
use crate::services::enrollment_writer::EnrollmentError;
use crate::services::gateway::GatewayError;
use crate::services::order_ledger::LedgerError;

const PAYMENT_NOT_CONFIRMED: &str = "Payment could not be confirmed";
const INTERNAL_ERROR: &str = "Internal server error";

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("payment signature verification failed")]
    InvalidSignature,
    #[error("payment gateway unavailable: {0}")]
    GatewayUnavailable(String),
    #[error("payment gateway rejected the request: {0}")]
    GatewayRejected(String),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("database error: {0}")]
    Database(#[from] DbErr),
    #[error("{0}")]
    Internal(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) | AppError::InvalidSignature => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::GatewayUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::GatewayRejected(_) => StatusCode::BAD_GATEWAY,
            AppError::Config(_) | AppError::Database(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::BadRequest(_) => "BAD_REQUEST",
            AppError::Unauthorized(_) => "UNAUTHORIZED",
            AppError::Forbidden(_) => "FORBIDDEN",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Conflict(_) => "CONFLICT",
            AppError::InvalidSignature => "INVALID_SIGNATURE",
            AppError::GatewayUnavailable(_) => "GATEWAY_UNAVAILABLE",
            AppError::GatewayRejected(_) => "GATEWAY_REJECTED",
            AppError::Config(_) => "CONFIG_ERROR",
            AppError::Database(_) => "DATABASE_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Message shown to the client. Server-side failures only expose a
    /// generic message; the detail goes to the log.
    fn public_message(&self) -> String {
        match self {
            AppError::BadRequest(msg)
            | AppError::Unauthorized(msg)
            | AppError::Forbidden(msg)
            | AppError::NotFound(msg)
            | AppError::Conflict(msg) => msg.clone(),
            AppError::InvalidSignature => PAYMENT_NOT_CONFIRMED.to_string(),
            AppError::GatewayUnavailable(_) => {
                "Payment service is temporarily unavailable".to_string()
            }
            AppError::GatewayRejected(_) => "Payment service rejected the request".to_string(),
            AppError::Config(_) | AppError::Database(_) | AppError::Internal(_) => {
                INTERNAL_ERROR.to_string()
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(code = self.code(), "{}", self);
        } else {
            tracing::debug!(code = self.code(), "{}", self);
        }

        let body = ErrorResponse {
            success: false,
            error: self.public_message(),
            code: Some(self.code().to_string()),
        };
        (status, Json(body)).into_response()
    }
}

impl From<GatewayError> for AppError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::InvalidAmount(msg) => AppError::BadRequest(msg),
            GatewayError::Unavailable(msg) => AppError::GatewayUnavailable(msg),
            GatewayError::Rejected(msg) => AppError::GatewayRejected(msg),
        }
    }
}

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::OrderNotFound(_) => AppError::NotFound("Order not found".to_string()),
            LedgerError::InvalidTransition { .. } => AppError::Conflict(
                "Order has already been settled with a different outcome".to_string(),
            ),
            LedgerError::PaymentAlreadyUsed(_) => {
                AppError::Conflict("Payment has already been applied to another order".to_string())
            }
            LedgerError::DuplicateOrderId(id) => {
                AppError::Internal(format!("gateway issued a duplicate order id {}", id))
            }
            LedgerError::Database(e) => AppError::Database(e),
        }
    }
}

impl From<EnrollmentError> for AppError {
    fn from(err: EnrollmentError) -> Self {
        match err {
            EnrollmentError::BadRequest(msg) => AppError::BadRequest(msg),
            EnrollmentError::InvalidSignature(_) => AppError::InvalidSignature,
            EnrollmentError::OrderNotFound(_) => AppError::NotFound("Order not found".to_string()),
            EnrollmentError::CourseNotFound(_) => {
                AppError::NotFound("Course not found".to_string())
            }
            EnrollmentError::UserNotFound(_) => AppError::NotFound("User not found".to_string()),
            EnrollmentError::Gateway(e) => e.into(),
            EnrollmentError::Ledger(e) => e.into(),
            EnrollmentError::Database(e) => AppError::Database(e),
        }
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingToken => AppError::Unauthorized("No token provided".to_string()),
            AuthError::InvalidToken => AppError::Unauthorized("Invalid token".to_string()),
            AuthError::TokenExpired => AppError::Unauthorized("Token expired".to_string()),
            AuthError::Hash(msg) => AppError::Internal(msg),
        }
    }
}

impl From<ConfigError> for AppError {
    fn from(err: ConfigError) -> Self {
        AppError::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(AppError::InvalidSignature.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            AppError::from(GatewayError::Unavailable("timeout".into())).status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            AppError::from(GatewayError::Rejected("400".into())).status(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            AppError::from(GatewayError::InvalidAmount("0".into())).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::from(LedgerError::InvalidTransition {
                order_id: "order_1".into(),
                from: "failed".into(),
                to: crate::models::order::OrderStatus::Completed,
            })
            .status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::from(EnrollmentError::CourseNotFound("c".into())).status(),
            StatusCode::NOT_FOUND
        );
    }

    #[tokio::test]
    async fn test_invalid_signature_body() {
        let (status, body) = body_json(AppError::InvalidSignature).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "Payment could not be confirmed");
        assert_eq!(body["code"], "INVALID_SIGNATURE");
    }

    #[tokio::test]
    async fn test_server_errors_hide_detail() {
        let (status, body) =
            body_json(AppError::Database(DbErr::Custom("password=hunter2".into()))).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Internal server error");

        let (_, body) = body_json(AppError::GatewayUnavailable(
            "connect to 10.0.0.1 refused".into(),
        ))
        .await;
        assert!(!body["error"].as_str().unwrap().contains("10.0.0.1"));
    }
}
