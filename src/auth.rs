//! Session tokens, password hashing and the request extractors that
//! identify the caller.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use sea_orm::{ActiveModelTrait, DatabaseConnection, DbErr, EntityTrait, Set};
use serde::{Deserialize, Serialize};

use crate::config::{AuthConfig, AuthMode};
use crate::entities::{prelude::*, users};
use crate::error::AppError;
use crate::AppState;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("no bearer token provided")]
    MissingToken,
    #[error("invalid token")]
    InvalidToken,
    #[error("token expired")]
    TokenExpired,
    #[error("password hashing failed: {0}")]
    Hash(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Admin => "admin",
        }
    }

    /// Unknown role strings degrade to the least privileged role
    pub fn parse_lenient(value: &str) -> Self {
        match value {
            "admin" => Role::Admin,
            _ => Role::Student,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: String,
    pub iat: i64,
    pub exp: i64,
}

/// HS256 session tokens
#[derive(Clone)]
pub struct SessionTokens {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl SessionTokens {
    pub fn new(secret: &str, ttl_days: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl: Duration::days(ttl_days),
        }
    }

    pub fn issue(&self, user: &users::Model) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims = Claims {
            id: user.id.clone(),
            email: user.email.clone(),
            name: user.name.clone(),
            role: user.role.clone(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };

        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AuthError::Hash(format!("failed to sign token: {}", e)))
    }

    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        self.decode(token, Validation::new(Algorithm::HS256))
    }

    /// Checks the signature but accepts expired tokens. Used by refresh.
    pub fn verify_ignoring_expiry(&self, token: &str) -> Result<Claims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        self.decode(token, validation)
    }

    fn decode(&self, token: &str, validation: Validation) -> Result<Claims, AuthError> {
        jsonwebtoken::decode::<Claims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => AuthError::InvalidToken,
            })
    }
}

/// Identity used for every request when `AUTH_MODE=fixture`
#[derive(Debug, Clone)]
pub struct FixtureIdentity {
    pub id: String,
    pub email: String,
}

#[derive(Debug, Clone)]
pub enum AuthProvider {
    Jwt,
    Fixture(FixtureIdentity),
}

#[derive(Clone)]
pub struct Auth {
    tokens: SessionTokens,
    provider: AuthProvider,
}

impl Auth {
    pub fn new(tokens: SessionTokens, provider: AuthProvider) -> Self {
        Self { tokens, provider }
    }

    pub fn from_config(config: &AuthConfig) -> Self {
        let provider = match config.mode {
            AuthMode::Jwt => AuthProvider::Jwt,
            AuthMode::Fixture => AuthProvider::Fixture(FixtureIdentity {
                id: config.fixture_user_id.clone(),
                email: config.fixture_user_email.clone(),
            }),
        };
        // Fixture mode may run without a configured secret; tokens issued by
        // signup/login then only live as long as the process.
        let secret = config
            .jwt_secret
            .clone()
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

        Self::new(SessionTokens::new(&secret, config.token_ttl_days), provider)
    }

    pub fn tokens(&self) -> &SessionTokens {
        &self.tokens
    }

    pub fn provider(&self) -> &AuthProvider {
        &self.provider
    }

    pub fn authenticate(&self, headers: &HeaderMap) -> Result<AuthUser, AuthError> {
        match &self.provider {
            AuthProvider::Fixture(identity) => Ok(AuthUser {
                id: identity.id.clone(),
                email: identity.email.clone(),
                role: Role::Admin,
            }),
            AuthProvider::Jwt => {
                let token = bearer_token(headers).ok_or(AuthError::MissingToken)?;
                let claims = self.tokens.verify(token)?;
                Ok(AuthUser {
                    id: claims.id,
                    email: claims.email,
                    role: Role::parse_lenient(&claims.role),
                })
            }
        }
    }
}

pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// The authenticated caller
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: String,
    pub email: String,
    pub role: Role,
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        state.auth.authenticate(&parts.headers).map_err(|e| {
            tracing::debug!(path = %parts.uri.path(), "Rejected request: {}", e);
            AppError::from(e)
        })
    }
}

/// An authenticated caller with the admin role
#[derive(Debug, Clone)]
pub struct AdminUser(pub AuthUser);

impl FromRequestParts<AppState> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if user.role != Role::Admin {
            tracing::warn!(user_id = %user.id, path = %parts.uri.path(), "Admin route denied");
            return Err(AppError::Forbidden("Admin access required".to_string()));
        }
        Ok(AdminUser(user))
    }
}

pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthError::Hash(e.to_string()))
}

/// A stored hash that cannot be parsed never matches.
pub fn verify_password(stored_hash: &str, password: &str) -> bool {
    match PasswordHash::new(stored_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

/// Makes sure the fixture identity exists so that orders and enrollments
/// created in fixture mode point at a real user.
pub async fn ensure_fixture_user(
    db: &DatabaseConnection,
    identity: &FixtureIdentity,
) -> Result<users::Model, DbErr> {
    if let Some(existing) = Users::find_by_id(identity.id.clone()).one(db).await? {
        return Ok(existing);
    }

    let user = users::ActiveModel {
        id: Set(identity.id.clone()),
        email: Set(identity.email.clone()),
        name: Set("Local Developer".to_string()),
        // Not a valid hash: the fixture user cannot log in with a password
        password_hash: Set(String::new()),
        role: Set(Role::Admin.to_string()),
        created_at: Set(Utc::now()),
    };
    let created = user.insert(db).await?;
    tracing::info!(user_id = %created.id, email = %created.email, "Fixture user created");
    Ok(created)
}
