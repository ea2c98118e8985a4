pub mod auth;
pub mod course;
pub mod enrollment;
pub mod payment;
pub mod review;

use crate::error::AppError;

/// Root banner
pub async fn root() -> &'static str {
    "Gurukul backend is running"
}

/// Path ids are UUIDs; anything else is rejected before touching the store.
pub(crate) fn parse_id(raw: &str, what: &str) -> Result<String, AppError> {
    uuid::Uuid::parse_str(raw)
        .map(|id| id.to_string())
        .map_err(|_| AppError::BadRequest(format!("Invalid {} id", what)))
}

pub(crate) fn require_text(value: Option<String>, field: &str) -> Result<String, AppError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::BadRequest(format!("Missing required field: {}", field)))
}
