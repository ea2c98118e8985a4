use axum::{
    routing::{get, patch, post, put},
    Router,
};

use crate::handlers::{auth, course, enrollment, payment, review, root};
use crate::AppState;

/// Every route the API serves. Layers (CORS, tracing) are added by the caller.
pub fn api_router() -> Router<AppState> {
    Router::new()
        .route("/", get(root))
        // Auth
        .route("/api/auth/signup", post(auth::signup))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/refresh", post(auth::refresh))
        // Catalog
        .route(
            "/api/courses",
            get(course::list_courses).post(course::create_course),
        )
        .route("/api/courses/list", get(course::list_course_summaries))
        .route(
            "/api/courses/{id}",
            get(course::get_course)
                .put(course::update_course)
                .delete(course::delete_course),
        )
        // Payments
        .route("/api/payments/create-order", post(payment::create_order))
        .route("/api/payments/verify", post(payment::verify_payment))
        .route("/api/payments/failure", post(payment::report_payment_failure))
        // Enrollments
        .route(
            "/api/enrollments",
            get(enrollment::list_enrollments).post(enrollment::create_enrollment),
        )
        .route("/api/enrollments/my-courses", get(enrollment::my_courses))
        .route(
            "/api/enrollments/user/{user_id}",
            get(enrollment::user_enrollments),
        )
        .route("/api/enrollments/{id}", patch(enrollment::update_enrollment))
        // Reviews
        .route("/api/reviews", post(review::create_review))
        .route(
            "/api/reviews/course/{course_id}",
            get(review::list_course_reviews),
        )
        .route(
            "/api/reviews/{id}",
            put(review::update_review).delete(review::delete_review),
        )
}
