//! `SeaORM` Entity for enrollments table
//!
//! The `course_*` columns are a snapshot of the course taken at enrollment
//! time, so the record stays readable after the course is edited or deleted.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "enrollments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub user_id: String,
    pub course_id: String,
    pub email: String,
    pub course_name: String,
    pub price: f64,
    pub course_title: String,
    #[sea_orm(column_type = "Text")]
    pub course_description: String,
    pub course_image: Option<String>,
    pub course_duration_weeks: i32,
    pub course_level: String,
    pub status: String,
    pub progress: i32,
    pub order_id: Option<String>,
    pub enrolled_at: DateTimeUtc,
    pub completed_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
