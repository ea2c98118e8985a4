use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, IntoActiveModel, QueryFilter, QueryOrder, Set,
    SqlErr,
};
use std::collections::HashMap;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::entities::{prelude::*, reviews, users};
use crate::error::AppError;
use crate::handlers::{parse_id, require_text};
use crate::models::common::MessageResponse;
use crate::models::review::{
    validate_rating, CreateReviewRequest, ReviewResponse, UpdateReviewRequest,
};
use crate::AppState;

const DUPLICATE_REVIEW: &str = "You have already reviewed this course";

async fn owned_review(
    state: &AppState,
    user: &AuthUser,
    id: &str,
) -> Result<reviews::Model, AppError> {
    let id = parse_id(id, "review")?;
    let review = Reviews::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Review not found".to_string()))?;

    if review.user_id != user.id {
        return Err(AppError::Forbidden(
            "Not authorized to modify this review".to_string(),
        ));
    }
    Ok(review)
}

/// GET /api/reviews/course/{course_id} (newest first)
pub async fn list_course_reviews(
    State(state): State<AppState>,
    Path(course_id): Path<String>,
) -> Result<Json<Vec<ReviewResponse>>, AppError> {
    let course_id = parse_id(&course_id, "course")?;

    let reviews = Reviews::find()
        .filter(reviews::Column::CourseId.eq(&course_id))
        .order_by_desc(reviews::Column::CreatedAt)
        .all(&state.db)
        .await?;

    let author_ids: Vec<String> = reviews.iter().map(|r| r.user_id.clone()).collect();
    let authors: HashMap<String, users::Model> = if author_ids.is_empty() {
        HashMap::new()
    } else {
        Users::find()
            .filter(users::Column::Id.is_in(author_ids))
            .all(&state.db)
            .await?
            .into_iter()
            .map(|u| (u.id.clone(), u))
            .collect()
    };

    Ok(Json(
        reviews
            .into_iter()
            .map(|review| {
                let author = authors.get(&review.user_id);
                ReviewResponse::new(review, author)
            })
            .collect(),
    ))
}

/// POST /api/reviews
pub async fn create_review(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateReviewRequest>,
) -> Result<(StatusCode, Json<ReviewResponse>), AppError> {
    let course_id = require_text(payload.course_id, "courseId")?;
    let rating = payload
        .rating
        .ok_or_else(|| AppError::BadRequest("Missing required field: rating".to_string()))?;
    let rating = validate_rating(rating).map_err(AppError::BadRequest)?;
    let comment = require_text(payload.comment, "comment")?;

    if Courses::find_by_id(course_id.clone())
        .one(&state.db)
        .await?
        .is_none()
    {
        return Err(AppError::NotFound("Course not found".to_string()));
    }

    let existing = Reviews::find()
        .filter(reviews::Column::UserId.eq(&user.id))
        .filter(reviews::Column::CourseId.eq(&course_id))
        .one(&state.db)
        .await?;
    if existing.is_some() {
        return Err(AppError::BadRequest(DUPLICATE_REVIEW.to_string()));
    }

    let now = Utc::now();
    let review = reviews::ActiveModel {
        id: Set(Uuid::new_v4().to_string()),
        user_id: Set(user.id.clone()),
        course_id: Set(course_id),
        rating: Set(rating),
        comment: Set(comment),
        created_at: Set(now),
        updated_at: Set(now),
    };

    let created = review.insert(&state.db).await.map_err(|e| match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            AppError::BadRequest(DUPLICATE_REVIEW.to_string())
        }
        _ => AppError::Database(e),
    })?;
    tracing::info!(review_id = %created.id, course_id = %created.course_id, user_id = %user.id, "Review created");

    let author = Users::find_by_id(user.id).one(&state.db).await?;
    Ok((
        StatusCode::CREATED,
        Json(ReviewResponse::new(created, author.as_ref())),
    ))
}

/// PUT /api/reviews/{id}
pub async fn update_review(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    Json(payload): Json<UpdateReviewRequest>,
) -> Result<Json<ReviewResponse>, AppError> {
    let review = owned_review(&state, &user, &id).await?;

    let mut active = review.into_active_model();
    if let Some(rating) = payload.rating {
        active.rating = Set(validate_rating(rating).map_err(AppError::BadRequest)?);
    }
    if let Some(comment) = payload.comment.map(|c| c.trim().to_string()).filter(|c| !c.is_empty()) {
        active.comment = Set(comment);
    }
    active.updated_at = Set(Utc::now());

    let updated = active.update(&state.db).await?;
    let author = Users::find_by_id(user.id).one(&state.db).await?;

    Ok(Json(ReviewResponse::new(updated, author.as_ref())))
}

/// DELETE /api/reviews/{id}
pub async fn delete_review(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    let review = owned_review(&state, &user, &id).await?;

    Reviews::delete_by_id(review.id.clone())
        .exec(&state.db)
        .await?;
    tracing::info!(review_id = %review.id, user_id = %user.id, "Review deleted");

    Ok(Json(MessageResponse {
        message: "Review deleted successfully".to_string(),
    }))
}
