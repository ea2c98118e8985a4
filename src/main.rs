use axum::http::{HeaderValue, Method};
use sea_orm::{ConnectOptions, Database};
use sea_orm_migration::MigratorTrait;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gurukul_backend::{
    auth::{ensure_fixture_user, AuthProvider},
    config::AppConfig,
    routes::api_router,
    AppState,
};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,gurukul_backend=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration (.env supported)
    let config = AppConfig::from_env().expect("Invalid configuration");

    if !config.gateway.has_credentials() {
        tracing::warn!("RAZORPAY_KEY_ID / RAZORPAY_KEY_SECRET not set; payment endpoints will return 503");
    }

    // Connect to database
    tracing::info!("Connecting to database...");
    let mut options = ConnectOptions::new(config.database_url.clone());
    options.sqlx_logging(false);
    let db = Database::connect(options)
        .await
        .expect("Failed to connect to database");

    // Run migrations
    if config.run_migrations {
        tracing::info!("Running migrations...");
        migration::Migrator::up(&db, None)
            .await
            .expect("Failed to run migrations");
    }

    let state = AppState::new(db.clone(), &config).expect("Failed to initialize services");

    if let AuthProvider::Fixture(identity) = state.auth.provider() {
        tracing::warn!(
            user_id = %identity.id,
            "AUTH_MODE=fixture: every request is authenticated as the fixture user. Never use this in production"
        );
        ensure_fixture_user(&db, identity)
            .await
            .expect("Failed to create fixture user");
    }

    // Build router
    let app = api_router()
        .with_state(state)
        .layer(cors_layer(&config.cors_origins))
        .layer(TraceLayer::new_for_http());

    // Start server
    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .expect("Failed to bind address");

    tracing::info!("🚀 Server listening on {}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    tracing::info!("Server stopped, closing database connection");
    if let Err(e) = db.close().await {
        tracing::error!("Failed to close database connection: {}", e);
    }
}

/// No configured origins means any origin without credentials; a wildcard
/// cannot be combined with credentials.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let methods = [
        Method::GET,
        Method::POST,
        Method::PUT,
        Method::PATCH,
        Method::DELETE,
        Method::OPTIONS,
    ];

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    if allowed.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(methods)
            .allow_headers(Any)
    } else {
        CorsLayer::new()
            .allow_origin(allowed)
            .allow_methods(methods)
            .allow_headers([
                axum::http::header::AUTHORIZATION,
                axum::http::header::CONTENT_TYPE,
            ])
            .allow_credentials(true)
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        return;
    }
    tracing::info!("Shutdown signal received");
}
