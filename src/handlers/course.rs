use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, EntityTrait, IntoActiveModel, QueryOrder, QuerySelect, Set};
use uuid::Uuid;

use crate::auth::AdminUser;
use crate::entities::{courses, prelude::*};
use crate::error::AppError;
use crate::handlers::parse_id;
use crate::models::course::{
    CourseResponse, CourseSummary, CreateCourseRequest, DeleteCourseResponse, Syllabus,
    Timetable, UpdateCourseRequest,
};
use crate::AppState;

fn timetable_json(timetable: Option<Timetable>) -> Result<Option<serde_json::Value>, AppError> {
    timetable
        .map(serde_json::to_value)
        .transpose()
        .map_err(|e| AppError::Internal(format!("failed to encode timetable: {}", e)))
}

fn split_syllabus(syllabus: Option<Syllabus>) -> (Option<String>, Option<String>) {
    match syllabus {
        Some(s) => (Some(s.title), Some(s.file_url)),
        None => (None, None),
    }
}

async fn find_course(state: &AppState, id: &str) -> Result<courses::Model, AppError> {
    let id = parse_id(id, "course")?;
    Courses::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Course not found".to_string()))
}

/// GET /api/courses (newest first)
pub async fn list_courses(
    State(state): State<AppState>,
) -> Result<Json<Vec<CourseResponse>>, AppError> {
    let courses = Courses::find()
        .order_by_desc(courses::Column::CreatedAt)
        .all(&state.db)
        .await?;

    Ok(Json(courses.into_iter().map(CourseResponse::from).collect()))
}

/// GET /api/courses/list
pub async fn list_course_summaries(
    State(state): State<AppState>,
) -> Result<Json<Vec<CourseSummary>>, AppError> {
    let rows: Vec<(String, String, f64)> = Courses::find()
        .select_only()
        .column(courses::Column::Id)
        .column(courses::Column::Title)
        .column(courses::Column::Price)
        .order_by_asc(courses::Column::Title)
        .into_tuple()
        .all(&state.db)
        .await?;

    Ok(Json(
        rows.into_iter()
            .map(|(id, title, price)| CourseSummary { id, title, price })
            .collect(),
    ))
}

/// GET /api/courses/{id}
pub async fn get_course(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<CourseResponse>, AppError> {
    Ok(Json(find_course(&state, &id).await?.into()))
}

/// POST /api/courses
pub async fn create_course(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Json(payload): Json<CreateCourseRequest>,
) -> Result<(StatusCode, Json<CourseResponse>), AppError> {
    let course = payload.validate().map_err(AppError::BadRequest)?;
    let (syllabus_title, syllabus_file_url) = split_syllabus(course.syllabus);

    let record = courses::ActiveModel {
        id: Set(Uuid::new_v4().to_string()),
        title: Set(course.title),
        description: Set(course.description),
        price: Set(course.price),
        duration_weeks: Set(course.duration_weeks),
        level: Set(course.level),
        language: Set(course.language),
        image: Set(course.image),
        instructor_name: Set(course.instructor.name),
        instructor_title: Set(course.instructor.title),
        instructor_bio: Set(course.instructor.bio),
        instructor_image: Set(course.instructor.image),
        syllabus_title: Set(syllabus_title),
        syllabus_file_url: Set(syllabus_file_url),
        timetable: Set(timetable_json(course.timetable)?),
        created_at: Set(Utc::now()),
    };

    let created = record.insert(&state.db).await?;
    tracing::info!(course_id = %created.id, admin_id = %admin.id, "Course created");

    Ok((StatusCode::CREATED, Json(created.into())))
}

/// PUT /api/courses/{id}
///
/// Fields that are absent keep their stored value.
pub async fn update_course(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<String>,
    Json(payload): Json<UpdateCourseRequest>,
) -> Result<Json<CourseResponse>, AppError> {
    let existing = find_course(&state, &id).await?;
    let mut course = existing.clone().into_active_model();

    let text = |value: Option<String>| value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

    if let Some(title) = text(payload.title) {
        course.title = Set(title);
    }
    if let Some(description) = text(payload.description) {
        course.description = Set(description);
    }
    if let Some(price) = payload.price {
        if !price.is_finite() || price <= 0.0 {
            return Err(AppError::BadRequest("Price must be a positive number".to_string()));
        }
        course.price = Set(price);
    }
    if let Some(weeks) = payload.duration_weeks {
        if weeks <= 0 {
            return Err(AppError::BadRequest(
                "duration_weeks must be a positive number".to_string(),
            ));
        }
        course.duration_weeks = Set(weeks);
    }
    if let Some(level) = text(payload.level) {
        course.level = Set(level);
    }
    if let Some(language) = text(payload.language) {
        course.language = Set(language);
    }
    if let Some(image) = payload.image {
        course.image = Set(Some(image).filter(|i| !i.trim().is_empty()));
    }
    if let Some(instructor) = payload.instructor {
        if let Some(name) = text(instructor.name) {
            course.instructor_name = Set(name);
        }
        if let Some(title) = text(instructor.title) {
            course.instructor_title = Set(title);
        }
        if let Some(bio) = text(instructor.bio) {
            course.instructor_bio = Set(bio);
        }
        if let Some(image) = text(instructor.image) {
            course.instructor_image = Set(image);
        }
    }
    if payload.syllabus.is_some() {
        let (title, file_url) = split_syllabus(payload.syllabus);
        course.syllabus_title = Set(title);
        course.syllabus_file_url = Set(file_url);
    }
    if payload.timetable.is_some() {
        course.timetable = Set(timetable_json(payload.timetable)?);
    }

    if !course.is_changed() {
        return Ok(Json(existing.into()));
    }

    let updated = course.update(&state.db).await?;
    tracing::info!(course_id = %updated.id, admin_id = %admin.id, "Course updated");

    Ok(Json(updated.into()))
}

/// DELETE /api/courses/{id}
///
/// Enrollments keep their course snapshot, so they stay readable.
pub async fn delete_course(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<String>,
) -> Result<Json<DeleteCourseResponse>, AppError> {
    let existing = find_course(&state, &id).await?;

    Courses::delete_by_id(existing.id.clone())
        .exec(&state.db)
        .await?;
    tracing::info!(course_id = %existing.id, admin_id = %admin.id, "Course deleted");

    Ok(Json(DeleteCourseResponse {
        success: true,
        message: "Course deleted successfully".to_string(),
        data: existing.into(),
    }))
}
