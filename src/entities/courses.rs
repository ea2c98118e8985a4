//! `SeaORM` Entity for courses table

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "courses")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub title: String,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    /// Major currency units (e.g. rupees)
    pub price: f64,
    pub duration_weeks: i32,
    pub level: String,
    pub language: String,
    pub image: Option<String>,
    pub instructor_name: String,
    pub instructor_title: String,
    #[sea_orm(column_type = "Text")]
    pub instructor_bio: String,
    pub instructor_image: String,
    pub syllabus_title: Option<String>,
    pub syllabus_file_url: Option<String>,
    pub timetable: Option<Json>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
