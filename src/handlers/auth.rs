use axum::{extract::State, http::HeaderMap, http::StatusCode, Json};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set, SqlErr};
use uuid::Uuid;

use crate::auth::{bearer_token, hash_password, verify_password, AuthError, Role};
use crate::entities::{prelude::*, users};
use crate::error::AppError;
use crate::handlers::require_text;
use crate::models::auth::{AuthResponse, LoginRequest, SignupRequest, UserSummary};
use crate::AppState;

const INVALID_CREDENTIALS: &str = "Invalid credentials";
const EMAIL_TAKEN: &str = "User already exists";

fn respond(state: &AppState, user: &users::Model) -> Result<AuthResponse, AppError> {
    Ok(AuthResponse {
        token: state.auth.tokens().issue(user)?,
        user: UserSummary::from(user),
    })
}

/// POST /api/auth/signup
pub async fn signup(
    State(state): State<AppState>,
    Json(payload): Json<SignupRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    let email = require_text(payload.email, "email")?.to_lowercase();
    let password = payload
        .password
        .filter(|p| !p.is_empty())
        .ok_or_else(|| AppError::BadRequest("Missing required field: password".to_string()))?;
    let name = require_text(payload.name, "name")?;

    if !email.contains('@') {
        return Err(AppError::BadRequest("Invalid email address".to_string()));
    }

    let existing = Users::find()
        .filter(users::Column::Email.eq(&email))
        .one(&state.db)
        .await?;
    if existing.is_some() {
        return Err(AppError::BadRequest(EMAIL_TAKEN.to_string()));
    }

    let user = users::ActiveModel {
        id: Set(Uuid::new_v4().to_string()),
        email: Set(email),
        name: Set(name),
        password_hash: Set(hash_password(&password)?),
        role: Set(Role::Student.to_string()),
        created_at: Set(Utc::now()),
    };

    let created = user.insert(&state.db).await.map_err(|e| match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => AppError::BadRequest(EMAIL_TAKEN.to_string()),
        _ => AppError::Database(e),
    })?;
    tracing::info!(user_id = %created.id, "User signed up");

    Ok((StatusCode::CREATED, Json(respond(&state, &created)?)))
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let email = require_text(payload.email, "email")?.to_lowercase();
    let password = payload
        .password
        .filter(|p| !p.is_empty())
        .ok_or_else(|| AppError::BadRequest("Missing required field: password".to_string()))?;

    let user = Users::find()
        .filter(users::Column::Email.eq(&email))
        .one(&state.db)
        .await?
        .filter(|u| verify_password(&u.password_hash, &password))
        .ok_or_else(|| AppError::BadRequest(INVALID_CREDENTIALS.to_string()))?;

    tracing::debug!(user_id = %user.id, "User logged in");
    Ok(Json(respond(&state, &user)?))
}

/// POST /api/auth/refresh
///
/// Accepts an expired token as long as its signature is valid and the
/// account still exists.
pub async fn refresh(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<AuthResponse>, AppError> {
    let token = bearer_token(&headers).ok_or(AuthError::MissingToken)?;
    let claims = state.auth.tokens().verify_ignoring_expiry(token)?;

    let user = Users::find_by_id(claims.id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::Unauthorized("User no longer exists".to_string()))?;

    Ok(Json(respond(&state, &user)?))
}
