use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, IntoActiveModel,
    QueryFilter, QueryOrder, Set,
};
use std::collections::HashMap;

use crate::auth::{AuthUser, Role};
use crate::entities::{courses, enrollments, prelude::*};
use crate::error::AppError;
use crate::handlers::{parse_id, require_text};
use crate::models::enrollment::{
    DirectEnrollRequest, DirectEnrollResponse, EnrollmentStatus, EnrollmentView,
    UpdateEnrollmentRequest,
};
use crate::services::enrollment_writer::EnrollmentOutcome;
use crate::AppState;

/// Joins enrollment rows with the courses that still exist
async fn project(
    db: &DatabaseConnection,
    records: Vec<enrollments::Model>,
) -> Result<Vec<EnrollmentView>, DbErr> {
    let mut course_ids: Vec<String> = records.iter().map(|e| e.course_id.clone()).collect();
    course_ids.sort();
    course_ids.dedup();

    let live: HashMap<String, courses::Model> = if course_ids.is_empty() {
        HashMap::new()
    } else {
        Courses::find()
            .filter(courses::Column::Id.is_in(course_ids))
            .all(db)
            .await?
            .into_iter()
            .map(|c| (c.id.clone(), c))
            .collect()
    };

    Ok(records
        .into_iter()
        .map(|record| {
            let course = live.get(&record.course_id);
            EnrollmentView::new(record, course)
        })
        .collect())
}

async fn enrollments_for(
    db: &DatabaseConnection,
    user_id: &str,
) -> Result<Vec<EnrollmentView>, DbErr> {
    let records = Enrollments::find()
        .filter(enrollments::Column::UserId.eq(user_id))
        .order_by_desc(enrollments::Column::EnrolledAt)
        .all(db)
        .await?;
    project(db, records).await
}

/// GET /api/enrollments
pub async fn list_enrollments(
    State(state): State<AppState>,
) -> Result<Json<Vec<EnrollmentView>>, AppError> {
    let records = Enrollments::find()
        .order_by_desc(enrollments::Column::EnrolledAt)
        .all(&state.db)
        .await?;

    Ok(Json(project(&state.db, records).await?))
}

/// GET /api/enrollments/my-courses
pub async fn my_courses(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Vec<EnrollmentView>>, AppError> {
    Ok(Json(enrollments_for(&state.db, &user.id).await?))
}

/// GET /api/enrollments/user/{user_id}
pub async fn user_enrollments(
    State(state): State<AppState>,
    user: AuthUser,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<EnrollmentView>>, AppError> {
    let user_id = parse_id(&user_id, "user")?;
    if user.id != user_id && user.role != Role::Admin {
        return Err(AppError::Forbidden(
            "Not allowed to view another user's enrollments".to_string(),
        ));
    }

    Ok(Json(enrollments_for(&state.db, &user_id).await?))
}

/// POST /api/enrollments
pub async fn create_enrollment(
    State(state): State<AppState>,
    Json(payload): Json<DirectEnrollRequest>,
) -> Result<(StatusCode, Json<DirectEnrollResponse>), AppError> {
    let user_id = require_text(payload.user_id, "userId")?;
    let course_ref = payload
        .course_id
        .ok_or_else(|| AppError::BadRequest("Missing required field: courseId".to_string()))?;
    let course_name = payload
        .course_name
        .or_else(|| course_ref.title().map(str::to_string));

    let outcome = state
        .enrollments
        .enroll_direct(&user_id, course_ref.id(), course_name.as_deref())
        .await?;

    let (status, message) = match &outcome {
        EnrollmentOutcome::Created(_) => (StatusCode::CREATED, "Enrollment created successfully"),
        EnrollmentOutcome::AlreadyEnrolled(_) => (StatusCode::OK, "Already enrolled in this course"),
    };

    let view = project(&state.db, vec![outcome.into_enrollment()])
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| AppError::Internal("enrollment projection came back empty".to_string()))?;

    Ok((
        status,
        Json(DirectEnrollResponse {
            message: message.to_string(),
            enrollment: view,
        }),
    ))
}

/// PATCH /api/enrollments/{id}
///
/// Only the enrolled user may update their own record.
pub async fn update_enrollment(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    Json(payload): Json<UpdateEnrollmentRequest>,
) -> Result<Json<EnrollmentView>, AppError> {
    let id = parse_id(&id, "enrollment")?;

    if payload.status.is_none() && payload.progress.is_none() {
        return Err(AppError::BadRequest("Nothing to update".to_string()));
    }

    let status = payload
        .status
        .as_deref()
        .map(|s| s.parse::<EnrollmentStatus>().map_err(AppError::BadRequest))
        .transpose()?;

    if let Some(progress) = payload.progress {
        if !(0..=100).contains(&progress) {
            return Err(AppError::BadRequest(
                "Progress must be between 0 and 100".to_string(),
            ));
        }
    }

    let record = Enrollments::find_by_id(id.clone())
        .filter(enrollments::Column::UserId.eq(&user.id))
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Enrollment not found".to_string()))?;

    let mut active = record.into_active_model();
    if let Some(status) = status {
        active.status = Set(status.to_string());
        active.completed_at = Set(match status {
            EnrollmentStatus::Completed => Some(chrono::Utc::now()),
            _ => None,
        });
    }
    if let Some(progress) = payload.progress {
        active.progress = Set(progress);
    }

    let updated = active.update(&state.db).await?;
    tracing::info!(enrollment_id = %updated.id, status = %updated.status, progress = updated.progress, "Enrollment updated");

    let view = project(&state.db, vec![updated])
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| AppError::Internal("enrollment projection came back empty".to_string()))?;
    Ok(Json(view))
}
