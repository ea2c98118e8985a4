//! Turns a verified payment (or an admin/direct request) into exactly one
//! enrollment per user and course.
//!
//! Reconciliation runs strictly in order:
//!
//! 1. signature check against the gateway secret (nothing is written before this)
//! 2. order lookup and `created -> completed`
//! 3. course and user lookup
//! 4. insert the enrollment unless the pair already has one
//!
//! The `(user_id, course_id)` unique index is the final arbiter: a racing
//! insert that loses is reported as already enrolled with the winner's row.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, Set,
    SqlErr,
};
use uuid::Uuid;

use crate::entities::{courses, enrollments, prelude::*, users};
use crate::models::enrollment::EnrollmentStatus;
use crate::services::gateway::{GatewayClient, GatewayError};
use crate::services::order_ledger::{LedgerError, OrderLedger};

#[derive(Debug, thiserror::Error)]
pub enum EnrollmentError {
    #[error("{0}")]
    BadRequest(String),
    #[error("payment signature mismatch for order {0}")]
    InvalidSignature(String),
    #[error("order {0} not found")]
    OrderNotFound(String),
    #[error("course {0} not found")]
    CourseNotFound(String),
    #[error("user {0} not found")]
    UserNotFound(String),
    #[error(transparent)]
    Gateway(#[from] GatewayError),
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    #[error(transparent)]
    Database(#[from] DbErr),
}

/// Signed callback fields as received from the storefront
#[derive(Debug, Clone)]
pub struct PaymentConfirmation {
    pub order_id: String,
    pub payment_id: String,
    pub signature: String,
    pub course_id: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EnrollmentOutcome {
    Created(enrollments::Model),
    AlreadyEnrolled(enrollments::Model),
}

impl EnrollmentOutcome {
    pub fn enrollment(&self) -> &enrollments::Model {
        match self {
            EnrollmentOutcome::Created(e) | EnrollmentOutcome::AlreadyEnrolled(e) => e,
        }
    }

    pub fn into_enrollment(self) -> enrollments::Model {
        match self {
            EnrollmentOutcome::Created(e) | EnrollmentOutcome::AlreadyEnrolled(e) => e,
        }
    }

    pub fn is_new(&self) -> bool {
        matches!(self, EnrollmentOutcome::Created(_))
    }
}

#[derive(Clone)]
pub struct EnrollmentWriter {
    db: DatabaseConnection,
    gateway: GatewayClient,
    ledger: OrderLedger,
}

impl EnrollmentWriter {
    pub fn new(db: DatabaseConnection, gateway: GatewayClient, ledger: OrderLedger) -> Self {
        Self { db, gateway, ledger }
    }

    pub async fn reconcile(
        &self,
        confirmation: &PaymentConfirmation,
    ) -> Result<EnrollmentOutcome, EnrollmentError> {
        let required = [
            ("razorpay_order_id", &confirmation.order_id),
            ("razorpay_payment_id", &confirmation.payment_id),
            ("razorpay_signature", &confirmation.signature),
            ("courseId", &confirmation.course_id),
        ];
        if let Some((field, _)) = required.iter().find(|(_, v)| v.trim().is_empty()) {
            return Err(EnrollmentError::BadRequest(format!(
                "Missing required field: {}",
                field
            )));
        }

        let verified = self.gateway.verify_signature(
            &confirmation.order_id,
            &confirmation.payment_id,
            &confirmation.signature,
        )?;
        if !verified {
            tracing::warn!(
                order_id = %confirmation.order_id,
                payment_id = %confirmation.payment_id,
                "Payment signature verification failed"
            );
            return Err(EnrollmentError::InvalidSignature(confirmation.order_id.clone()));
        }

        let order = self
            .ledger
            .find_by_order_id(&confirmation.order_id)
            .await?
            .ok_or_else(|| EnrollmentError::OrderNotFound(confirmation.order_id.clone()))?;

        if order.course_id != confirmation.course_id {
            tracing::warn!(
                order_id = %order.order_id,
                order_course_id = %order.course_id,
                requested_course_id = %confirmation.course_id,
                "Payment confirmation names a different course than the order"
            );
            return Err(EnrollmentError::BadRequest(
                "Course does not match the paid order".to_string(),
            ));
        }

        let order = self
            .ledger
            .mark_completed(&order.order_id, &confirmation.payment_id)
            .await?;

        let course = self.load_course(&order.course_id).await?;
        let user = self.load_user(&order.user_id).await?;

        let outcome = self
            .enroll_once(&user, &course, None, Some(order.order_id.clone()))
            .await?;

        tracing::info!(
            order_id = %order.order_id,
            enrollment_id = %outcome.enrollment().id,
            new = outcome.is_new(),
            "Payment reconciled"
        );
        Ok(outcome)
    }

    /// Enrollment without a payment. `course_name` overrides the stored
    /// display name when present.
    pub async fn enroll_direct(
        &self,
        user_id: &str,
        course_id: &str,
        course_name: Option<&str>,
    ) -> Result<EnrollmentOutcome, EnrollmentError> {
        let user = self.load_user(user_id).await?;
        let course = self.load_course(course_id).await?;

        let course_name = course_name.map(str::trim).filter(|n| !n.is_empty());
        let outcome = self.enroll_once(&user, &course, course_name, None).await?;

        tracing::info!(
            user_id = %user.id,
            course_id = %course.id,
            enrollment_id = %outcome.enrollment().id,
            new = outcome.is_new(),
            "Direct enrollment processed"
        );
        Ok(outcome)
    }

    async fn load_course(&self, course_id: &str) -> Result<courses::Model, EnrollmentError> {
        Courses::find_by_id(course_id.to_string())
            .one(&self.db)
            .await?
            .ok_or_else(|| EnrollmentError::CourseNotFound(course_id.to_string()))
    }

    async fn load_user(&self, user_id: &str) -> Result<users::Model, EnrollmentError> {
        Users::find_by_id(user_id.to_string())
            .one(&self.db)
            .await?
            .ok_or_else(|| EnrollmentError::UserNotFound(user_id.to_string()))
    }

    async fn find_existing(
        &self,
        user_id: &str,
        course_id: &str,
    ) -> Result<Option<enrollments::Model>, DbErr> {
        Enrollments::find()
            .filter(enrollments::Column::UserId.eq(user_id))
            .filter(enrollments::Column::CourseId.eq(course_id))
            .one(&self.db)
            .await
    }

    async fn enroll_once(
        &self,
        user: &users::Model,
        course: &courses::Model,
        course_name: Option<&str>,
        order_id: Option<String>,
    ) -> Result<EnrollmentOutcome, EnrollmentError> {
        if let Some(existing) = self.find_existing(&user.id, &course.id).await? {
            return Ok(EnrollmentOutcome::AlreadyEnrolled(existing));
        }

        let record = enrollments::ActiveModel {
            id: Set(Uuid::new_v4().to_string()),
            user_id: Set(user.id.clone()),
            course_id: Set(course.id.clone()),
            email: Set(user.email.clone()),
            course_name: Set(course_name.unwrap_or(&course.title).to_string()),
            price: Set(course.price),
            course_title: Set(course.title.clone()),
            course_description: Set(course.description.clone()),
            course_image: Set(course.image.clone()),
            course_duration_weeks: Set(course.duration_weeks),
            course_level: Set(course.level.clone()),
            status: Set(EnrollmentStatus::Active.to_string()),
            progress: Set(0),
            order_id: Set(order_id),
            enrolled_at: Set(Utc::now()),
            completed_at: Set(None),
        };

        match record.insert(&self.db).await {
            Ok(created) => Ok(EnrollmentOutcome::Created(created)),
            Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                tracing::debug!(
                    user_id = %user.id,
                    course_id = %course.id,
                    "Concurrent enrollment won the insert"
                );
                self.find_existing(&user.id, &course.id)
                    .await?
                    .map(EnrollmentOutcome::AlreadyEnrolled)
                    .ok_or(EnrollmentError::Database(e))
            }
            Err(e) => Err(e.into()),
        }
    }
}
