#![allow(dead_code)]

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, Method, Request, StatusCode},
    routing::post,
    Json, Router,
};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ConnectOptions, Database, DatabaseConnection, DbErr, Set};
use sea_orm_migration::MigratorTrait;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};
use std::time::Duration;
use tower::ServiceExt;
use uuid::Uuid;

use gurukul_backend::{
    config::AppConfig,
    entities::{courses, users},
    routes::api_router,
    AppState,
};

pub const GATEWAY_KEY_ID: &str = "rzp_test_key";
pub const GATEWAY_SECRET: &str = "rzp_test_secret";
pub const JWT_SECRET: &str = "test-jwt-secret";

/// Set up an in-memory SQLite database with all migrations applied
pub async fn setup_test_db() -> Result<DatabaseConnection, DbErr> {
    // A single connection keeps every query on the same in-memory database
    let mut options = ConnectOptions::new("sqlite::memory:");
    options
        .max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);

    let db = Database::connect(options).await?;
    migration::Migrator::up(&db, None).await?;
    Ok(db)
}

#[derive(Clone, Copy, Debug)]
pub enum GatewayBehavior {
    Accept,
    Delay(Duration),
    Reject,
}

#[derive(Clone)]
struct MockGatewayState {
    behavior: GatewayBehavior,
    created: Arc<AtomicUsize>,
}

/// In-process stand-in for the payment gateway's order API
pub struct MockGateway {
    pub base_url: String,
    pub created: Arc<AtomicUsize>,
}

impl MockGateway {
    pub fn orders_created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }
}

async fn mock_create_order(
    State(state): State<MockGatewayState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let authorized = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.starts_with("Basic "))
        .unwrap_or(false);
    if !authorized {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"error": {"code": "BAD_REQUEST_ERROR", "description": "Authentication failed"}})),
        );
    }

    match state.behavior {
        GatewayBehavior::Reject => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({"error": {"code": "BAD_REQUEST_ERROR", "description": "The amount is invalid"}})),
            );
        }
        GatewayBehavior::Delay(delay) => tokio::time::sleep(delay).await,
        GatewayBehavior::Accept => {}
    }

    let n = state.created.fetch_add(1, Ordering::SeqCst) + 1;
    (
        StatusCode::OK,
        Json(json!({
            "id": format!("order_test{:04}", n),
            "entity": "order",
            "amount": body["amount"],
            "currency": body["currency"],
            "receipt": body["receipt"],
            "status": "created",
            "notes": body["notes"],
        })),
    )
}

pub async fn spawn_mock_gateway(behavior: GatewayBehavior) -> MockGateway {
    let created = Arc::new(AtomicUsize::new(0));
    let app = Router::new()
        .route("/v1/orders", post(mock_create_order))
        .with_state(MockGatewayState {
            behavior,
            created: created.clone(),
        });

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    MockGateway {
        base_url: format!("http://{}", addr),
        created,
    }
}

pub fn test_config(gateway_base_url: &str, extra: &[(&str, &str)]) -> AppConfig {
    let mut vars: HashMap<String, String> = [
        ("DATABASE_URL", "sqlite::memory:"),
        ("JWT_SECRET", JWT_SECRET),
        ("RAZORPAY_KEY_ID", GATEWAY_KEY_ID),
        ("RAZORPAY_KEY_SECRET", GATEWAY_SECRET),
        ("RAZORPAY_BASE_URL", gateway_base_url),
        ("GATEWAY_TIMEOUT_SECS", "5"),
    ]
    .iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();
    for (k, v) in extra {
        vars.insert(k.to_string(), v.to_string());
    }

    AppConfig::from_lookup(|name| vars.get(name).cloned()).unwrap()
}

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub gateway: MockGateway,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_gateway(GatewayBehavior::Accept, &[]).await
    }

    pub async fn with_gateway(behavior: GatewayBehavior, extra: &[(&str, &str)]) -> Self {
        let gateway = spawn_mock_gateway(behavior).await;
        let config = test_config(&gateway.base_url, extra);
        let db = setup_test_db().await.expect("Failed to set up test DB");
        let state = AppState::new(db, &config).unwrap();

        Self {
            router: api_router().with_state(state.clone()),
            state,
            gateway,
        }
    }

    pub fn db(&self) -> &DatabaseConnection {
        &self.state.db
    }

    pub fn token_for(&self, user: &users::Model) -> String {
        self.state.auth.tokens().issue(user).unwrap()
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };
        (status, json)
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.request(Method::GET, uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, uri, token, Some(body)).await
    }
}

pub async fn seed_user(db: &DatabaseConnection, email: &str, role: &str) -> users::Model {
    users::ActiveModel {
        id: Set(Uuid::new_v4().to_string()),
        email: Set(email.to_string()),
        name: Set(format!("User {}", email)),
        password_hash: Set(String::new()),
        role: Set(role.to_string()),
        created_at: Set(Utc::now()),
    }
    .insert(db)
    .await
    .unwrap()
}

pub async fn seed_course(db: &DatabaseConnection, title: &str, price: f64) -> courses::Model {
    courses::ActiveModel {
        id: Set(Uuid::new_v4().to_string()),
        title: Set(title.to_string()),
        description: Set(format!("All about {}", title)),
        price: Set(price),
        duration_weeks: Set(6),
        level: Set("beginner".to_string()),
        language: Set("English".to_string()),
        image: Set(Some(format!("https://cdn.example.com/{}.png", title.len()))),
        instructor_name: Set("A. Sharma".to_string()),
        instructor_title: Set("Lecturer".to_string()),
        instructor_bio: Set("Teaches classical subjects".to_string()),
        instructor_image: Set("https://cdn.example.com/sharma.png".to_string()),
        syllabus_title: Set(None),
        syllabus_file_url: Set(None),
        timetable: Set(Some(json!({"saturday": "10:00-12:00"}))),
        created_at: Set(Utc::now()),
    }
    .insert(db)
    .await
    .unwrap()
}
