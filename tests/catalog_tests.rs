mod common;

use axum::http::{Method, StatusCode};
use serde_json::{json, Value};

use crate::common::{seed_course, seed_user, TestApp};

fn course_body() -> Value {
    json!({
        "title": "Carnatic Vocals",
        "description": "Voice culture and ragas",
        "price": 1499,
        "duration_weeks": 12,
        "level": "intermediate",
        "language": "Tamil",
        "instructor": {
            "name": "R. Iyer",
            "title": "Vidwan",
            "bio": "Performs and teaches",
            "image": "https://cdn.example.com/iyer.png"
        },
        "syllabus": {"title": "Outline", "fileUrl": "https://cdn.example.com/outline.pdf"},
        "timetable": {"monday": "18:00-19:00", "thursday": "18:00-19:00"}
    })
}

#[tokio::test]
async fn test_signup_login_refresh() {
    let app = TestApp::new().await;

    let (status, body) = app
        .post(
            "/api/auth/signup",
            None,
            json!({"email": "New@Example.com", "password": "pa55word", "name": "New Learner"}),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert_eq!(body["user"]["email"], "new@example.com");
    assert_eq!(body["user"]["role"], "student");
    assert!(body["user"].get("password_hash").is_none());

    let (status, body) = app
        .post(
            "/api/auth/signup",
            None,
            json!({"email": "new@example.com", "password": "other", "name": "Dup"}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "User already exists");

    let (status, _) = app
        .post(
            "/api/auth/login",
            None,
            json!({"email": "new@example.com", "password": "wrong"}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app
        .post(
            "/api/auth/login",
            None,
            json!({"email": "new@example.com", "password": "pa55word"}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let token = body["token"].as_str().unwrap().to_string();

    let (status, body) = app.get("/api/enrollments/my-courses", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.as_array().unwrap().is_empty());

    let (status, body) = app
        .request(Method::POST, "/api/auth/refresh", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["email"], "new@example.com");

    let (status, _) = app.request(Method::POST, "/api/auth/refresh", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_course_admin_lifecycle() {
    let app = TestApp::new().await;
    let admin = seed_user(app.db(), "admin@example.com", "admin").await;
    let student = seed_user(app.db(), "learner@example.com", "student").await;
    let admin_token = app.token_for(&admin);

    let (status, _) = app
        .post("/api/courses", Some(&app.token_for(&student)), course_body())
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app.post("/api/courses", None, course_body()).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let mut incomplete = course_body();
    incomplete["instructor"]["bio"] = json!("");
    let (status, body) = app.post("/api/courses", Some(&admin_token), incomplete).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Missing required instructor field: bio");

    let (status, created) = app.post("/api/courses", Some(&admin_token), course_body()).await;
    assert_eq!(status, StatusCode::CREATED, "{}", created);
    assert_eq!(created["instructor"]["name"], "R. Iyer");
    assert_eq!(created["syllabus"]["fileUrl"], "https://cdn.example.com/outline.pdf");
    assert_eq!(created["timetable"]["monday"], "18:00-19:00");
    let id = created["id"].as_str().unwrap().to_string();
    let uri = format!("/api/courses/{}", id);

    let (status, updated) = app
        .request(
            Method::PUT,
            &uri,
            Some(&admin_token),
            Some(json!({"price": 1299, "instructor": {"title": "Sangita Kalanidhi"}})),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", updated);
    assert_eq!(updated["price"], 1299.0);
    assert_eq!(updated["instructor"]["title"], "Sangita Kalanidhi");
    assert_eq!(updated["instructor"]["name"], "R. Iyer");

    let (status, fetched) = app.get(&uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["price"], 1299.0);

    let (status, list) = app.get("/api/courses/list", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list[0]["title"], "Carnatic Vocals");

    let (status, deleted) = app
        .request(Method::DELETE, &uri, Some(&admin_token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(deleted["success"], true);
    assert_eq!(deleted["data"]["id"], id.as_str());

    let (status, _) = app.get(&uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_course_listing_and_lookup() {
    let app = TestApp::new().await;
    seed_course(app.db(), "Older", 100.0).await;
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    seed_course(app.db(), "Newer", 200.0).await;

    let (status, body) = app.get("/api/courses", None).await;
    assert_eq!(status, StatusCode::OK);
    let courses = body.as_array().unwrap();
    assert_eq!(courses.len(), 2);
    assert_eq!(courses[0]["title"], "Newer");

    let (status, _) = app.get("/api/courses/not-a-uuid", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .get("/api/courses/6f1c2f3e-8a7b-4c1d-9e2f-0a1b2c3d4e5f", None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_reviews() {
    let app = TestApp::new().await;
    let author = seed_user(app.db(), "author@example.com", "student").await;
    let stranger = seed_user(app.db(), "stranger@example.com", "student").await;
    let course = seed_course(app.db(), "Carnatic Vocals", 1499.0).await;
    let token = app.token_for(&author);

    let (status, _) = app
        .post(
            "/api/reviews",
            Some(&token),
            json!({"courseId": course.id, "rating": 6, "comment": "Too good"}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, review) = app
        .post(
            "/api/reviews",
            Some(&token),
            json!({"courseId": course.id, "rating": 5, "comment": "Wonderful instructor"}),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", review);
    assert_eq!(review["user"]["email"], "author@example.com");

    let (status, body) = app
        .post(
            "/api/reviews",
            Some(&token),
            json!({"courseId": course.id, "rating": 4, "comment": "Again"}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "You have already reviewed this course");

    let (status, list) = app
        .get(&format!("/api/reviews/course/{}", course.id), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list.as_array().unwrap().len(), 1);
    assert_eq!(list[0]["rating"], 5);

    let uri = format!("/api/reviews/{}", review["id"].as_str().unwrap());

    let (status, _) = app
        .request(
            Method::PUT,
            &uri,
            Some(&app.token_for(&stranger)),
            Some(json!({"rating": 1})),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, updated) = app
        .request(Method::PUT, &uri, Some(&token), Some(json!({"rating": 4})))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["rating"], 4);
    assert_eq!(updated["comment"], "Wonderful instructor");

    let (status, _) = app
        .request(Method::DELETE, &uri, Some(&app.token_for(&stranger)), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app.request(Method::DELETE, &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Review deleted successfully");

    let (status, _) = app.request(Method::DELETE, &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_fixture_mode_authenticates_every_request() {
    let app = TestApp::with_gateway(
        common::GatewayBehavior::Accept,
        &[("AUTH_MODE", "fixture")],
    )
    .await;
    let identity = match app.state.auth.provider() {
        gurukul_backend::auth::AuthProvider::Fixture(identity) => identity.clone(),
        other => panic!("expected fixture provider, got {:?}", other),
    };
    gurukul_backend::auth::ensure_fixture_user(app.db(), &identity)
        .await
        .unwrap();

    let (status, body) = app.get("/api/enrollments/my-courses", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.as_array().unwrap().is_empty());

    let (status, _) = app.post("/api/courses", None, course_body()).await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_root_banner() {
    let app = TestApp::new().await;
    let (status, body) = app.get("/", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.as_str().unwrap().contains("Gurukul"));
}
