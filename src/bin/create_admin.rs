use std::env;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Database, EntityTrait, IntoActiveModel, QueryFilter, Set,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use gurukul_backend::auth::{hash_password, Role};
use gurukul_backend::entities::{prelude::*, users};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,gurukul_backend=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load environment variables
    dotenvy::dotenv().ok();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: ADMIN_PASSWORD=... cargo run --bin create_admin <email> [name]");
        eprintln!("Example: ADMIN_PASSWORD=changeme cargo run --bin create_admin admin@gurukul.in \"Site Admin\"");
        std::process::exit(1);
    }

    let email = args[1].trim().to_lowercase();
    let name = args.get(2).cloned().unwrap_or_else(|| "Administrator".to_string());
    let password = env::var("ADMIN_PASSWORD").ok().filter(|p| !p.is_empty());

    let database_url = env::var("DATABASE_URL").map_err(|_| "DATABASE_URL must be set")?;
    tracing::info!("Connecting to database...");
    let db = Database::connect(&database_url).await?;

    let existing = Users::find()
        .filter(users::Column::Email.eq(&email))
        .one(&db)
        .await?;

    match existing {
        Some(user) => {
            let mut active = user.into_active_model();
            active.role = Set(Role::Admin.to_string());
            if let Some(password) = password {
                active.password_hash = Set(hash_password(&password)?);
            }
            let updated = active.update(&db).await?;
            tracing::info!(user_id = %updated.id, "✅ Promoted {} to admin", updated.email);
        }
        None => {
            let password = password.ok_or("ADMIN_PASSWORD must be set to create a new admin")?;
            let created = users::ActiveModel {
                id: Set(Uuid::new_v4().to_string()),
                email: Set(email),
                name: Set(name),
                password_hash: Set(hash_password(&password)?),
                role: Set(Role::Admin.to_string()),
                created_at: Set(Utc::now()),
            }
            .insert(&db)
            .await?;
            tracing::info!(user_id = %created.id, "✅ Created admin {}", created.email);
        }
    }

    db.close().await?;
    Ok(())
}
