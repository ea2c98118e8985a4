use axum::{extract::State, Json};
use sea_orm::EntityTrait;

use crate::auth::AuthUser;
use crate::entities::prelude::*;
use crate::error::AppError;
use crate::handlers::require_text;
use crate::models::order::{
    CreateOrderRequest, CreateOrderResponse, PaymentFailureRequest,
    PaymentStatusResponse, VerifyPaymentRequest,
};
use crate::services::enrollment_writer::PaymentConfirmation;
use crate::services::gateway::{to_minor_units, OrderNotes};
use crate::services::order_ledger::NewOrder;
use crate::AppState;

/// POST /api/payments/create-order
pub async fn create_order(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateOrderRequest>,
) -> Result<Json<CreateOrderResponse>, AppError> {
    let course_id = require_text(payload.course_id, "courseId")?;
    let amount = payload
        .amount
        .ok_or_else(|| AppError::BadRequest("Missing required field: amount".to_string()))?;

    let course = Courses::find_by_id(course_id.clone())
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Course not found".to_string()))?;

    // The client-side amount must agree with the catalog price
    let requested = to_minor_units(amount)?;
    let expected = to_minor_units(course.price)?;
    if requested != expected {
        tracing::warn!(
            user_id = %user.id,
            course_id = %course.id,
            requested,
            expected,
            "Order amount does not match course price"
        );
        return Err(AppError::BadRequest(
            "Amount does not match the course price".to_string(),
        ));
    }

    let remote = state
        .gateway
        .create_remote_order(
            amount,
            &state.currency,
            OrderNotes {
                course_id: course.id.clone(),
                user_id: user.id.clone(),
            },
        )
        .await?;

    let order = state
        .ledger
        .record_created_order(NewOrder {
            order_id: remote.id.clone(),
            amount: remote.amount,
            currency: remote.currency.clone(),
            receipt: remote.receipt.clone(),
            course_id: course.id,
            user_id: user.id,
        })
        .await?;

    Ok(Json(CreateOrderResponse {
        success: true,
        id: order.order_id,
        currency: order.currency,
        amount: order.amount,
        receipt: order.receipt,
    }))
}

/// POST /api/payments/verify
///
/// A fresh enrollment and an existing one produce the same response.
pub async fn verify_payment(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<VerifyPaymentRequest>,
) -> Result<Json<PaymentStatusResponse>, AppError> {
    let confirmation = PaymentConfirmation {
        order_id: payload.razorpay_order_id.unwrap_or_default(),
        payment_id: payload.razorpay_payment_id.unwrap_or_default(),
        signature: payload.razorpay_signature.unwrap_or_default(),
        course_id: payload.course_id.unwrap_or_default(),
    };

    tracing::debug!(order_id = %confirmation.order_id, user_id = %user.id, "Verifying payment");
    state.enrollments.reconcile(&confirmation).await?;

    Ok(Json(PaymentStatusResponse {
        success: true,
        message: "Payment verified and enrollment created".to_string(),
    }))
}

/// POST /api/payments/failure
///
/// Called by the storefront when the hosted checkout is dismissed or the
/// payment is declined.
pub async fn report_payment_failure(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<PaymentFailureRequest>,
) -> Result<Json<PaymentStatusResponse>, AppError> {
    let order_id = require_text(payload.razorpay_order_id, "razorpay_order_id")?;

    let order = state
        .ledger
        .find_by_order_id(&order_id)
        .await?
        .filter(|o| o.user_id == user.id)
        .ok_or_else(|| AppError::NotFound("Order not found".to_string()))?;

    let order = state.ledger.mark_failed(&order.order_id).await?;
    tracing::info!(order_id = %order.order_id, user_id = %user.id, "Payment reported as failed");
    Ok(Json(PaymentStatusResponse {
        success: true,
        message: "Payment marked as failed".to_string(),
    }))
}
