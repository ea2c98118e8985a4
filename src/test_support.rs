//! Shared fixtures for unit tests: an in-memory SQLite store with the full
//! schema applied.

use chrono::Utc;
use migration::{Migrator, MigratorTrait};
use sea_orm::{ActiveModelTrait, ConnectOptions, Database, DatabaseConnection, Set};
use uuid::Uuid;

use crate::entities::{courses, users};

pub async fn memory_db() -> DatabaseConnection {
    // One pooled connection, otherwise every connection sees its own empty database
    let mut options = ConnectOptions::new("sqlite::memory:");
    options.max_connections(1).min_connections(1).sqlx_logging(false);

    let db = Database::connect(options).await.unwrap();
    Migrator::up(&db, None).await.unwrap();
    db
}

pub async fn insert_user(db: &DatabaseConnection, email: &str) -> users::Model {
    users::ActiveModel {
        id: Set(Uuid::new_v4().to_string()),
        email: Set(email.to_string()),
        name: Set("Test Learner".to_string()),
        password_hash: Set(String::new()),
        role: Set("student".to_string()),
        created_at: Set(Utc::now()),
    }
    .insert(db)
    .await
    .unwrap()
}

pub async fn insert_course(db: &DatabaseConnection, title: &str, price: f64) -> courses::Model {
    courses::ActiveModel {
        id: Set(Uuid::new_v4().to_string()),
        title: Set(title.to_string()),
        description: Set(format!("{} description", title)),
        price: Set(price),
        duration_weeks: Set(8),
        level: Set("beginner".to_string()),
        language: Set("English".to_string()),
        image: Set(None),
        instructor_name: Set("A. Sharma".to_string()),
        instructor_title: Set("Lecturer".to_string()),
        instructor_bio: Set("Teaches".to_string()),
        instructor_image: Set("https://cdn.example.com/a.png".to_string()),
        syllabus_title: Set(None),
        syllabus_file_url: Set(None),
        timetable: Set(None),
        created_at: Set(Utc::now()),
    }
    .insert(db)
    .await
    .unwrap()
}
