use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use learnhub_dashboard::{
    config::Config,
    error::LOAD_FAILED_MESSAGE,
    routes,
    services::{
        course::COURSES, enrollment::ENROLLMENTS, grade::GRADES, notification::NOTIFICATIONS, MemoryStore,
    },
    state::AppState,
    views::course_browser::ENROLL_FAILED_MESSAGE,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

fn seeded_store() -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new());
    store.insert_many(COURSES, vec![
        json!({
            "id": "rust", "title": "Rust Basics", "description": "Ownership and borrowing",
            "category": "Programming", "status": "Published", "students": 3,
            "createdAt": "2024-03-01T00:00:00Z",
            "modules": [
                {"id": "m1", "title": "Intro", "lessons": [
                    {"id": "l1", "title": "Hello", "contentBlocks": [{"id": "b1", "type": "text", "content": "Hi"}]},
                    {"id": "l2", "title": "Cargo"}
                ]}
            ]
        }),
        json!({
            "id": "calc", "title": "Calculus", "category": "Math", "level": "Intermediate",
            "status": "Published", "students": 10, "createdAt": "2024-01-01T00:00:00Z"
        }),
        json!({"id": "draft", "title": "Secret", "category": "Math", "status": "Draft"}),
    ]);
    store.insert(ENROLLMENTS, json!({
        "id": "e1", "userId": "u1", "courseId": "calc", "status": "active", "progress": 40
    }));
    store.insert(GRADES, json!({
        "id": "g1", "userId": "u1", "title": "Midterm", "type": "exam", "points": 90, "maxPoints": 100,
        "letterGrade": "A-", "gradedAt": "2024-04-01T00:00:00Z"
    }));
    store.insert_many(NOTIFICATIONS, vec![
        json!({"id": "n1", "userId": "u1", "title": "Welcome", "isRead": false, "createdAt": "2024-01-01T00:00:00Z"}),
        json!({"id": "n2", "userId": "u1", "title": "Reminder", "isRead": false, "createdAt": "2024-02-01T00:00:00Z"}),
        json!({"id": "n3", "userId": "u2", "title": "Other", "isRead": false}),
    ]);
    store
}

async fn app_with(store: Arc<MemoryStore>) -> Router {
    let state = AppState::new(Config::default(), store).await.unwrap();
    routes::app(Arc::new(state))
}

async fn send(app: &Router, method: Method, uri: &str, user: Option<&str>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(user) = user {
        builder = builder.header("X-User-Id", user);
    }
    let response = app.clone().oneshot(builder.body(Body::empty()).unwrap()).await.unwrap();
    let status = response.status();
    let bytes = hyper::body::to_bytes(response.into_body()).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

#[tokio::test]
async fn health_check_needs_no_identity() {
    let app = app_with(Arc::new(MemoryStore::new())).await;
    let (status, _) = send(&app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn requests_without_user_header_are_rejected() {
    let app = app_with(seeded_store()).await;
    let (status, body) = send(&app, Method::GET, "/api/lms/courses", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "AUTHENTICATION_ERROR");
}

#[tokio::test]
async fn catalog_lists_published_courses_newest_first() {
    let app = app_with(seeded_store()).await;
    let (status, body) = send(&app, Method::GET, "/api/lms/courses", Some("u1")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    let courses = body["data"]["courses"].as_array().unwrap();
    let ids: Vec<&str> = courses.iter().map(|c| c["id"].as_str().unwrap()).collect();
    assert_eq!(ids, vec!["rust", "calc"]);

    assert_eq!(courses[0]["isEnrolled"], false);
    assert_eq!(courses[1]["isEnrolled"], true);
    assert_eq!(courses[1]["progress"], 40);
    assert_eq!(body["data"]["filterOptions"]["categories"], json!(["Math", "Programming"]));
}

#[tokio::test]
async fn catalog_filters_combine() {
    let app = app_with(seeded_store()).await;

    let (_, body) = send(&app, Method::GET, "/api/lms/courses?search=OWNERSHIP", Some("u1")).await;
    assert_eq!(body["data"]["total"], 1);
    assert_eq!(body["data"]["courses"][0]["id"], "rust");

    let (_, body) = send(&app, Method::GET, "/api/lms/courses?category=Programming&enrolledOnly=true", Some("u1")).await;
    assert_eq!(body["data"]["total"], 0);

    let (_, body) = send(&app, Method::GET, "/api/lms/courses?level=Intermediate&enrolled_only=true", Some("u1")).await;
    assert_eq!(body["data"]["courses"][0]["id"], "calc");
}

#[tokio::test]
async fn catalog_outage_is_a_load_failure() {
    let store = seeded_store();
    store.fail_collection(COURSES);
    let app = app_with(store).await;

    let (status, body) = send(&app, Method::GET, "/api/lms/courses", Some("u1")).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"]["code"], "LOAD_FAILED");
}

#[tokio::test]
async fn course_viewer_opens_first_lesson_and_hides_drafts() {
    let app = app_with(seeded_store()).await;

    let (status, body) = send(&app, Method::GET, "/api/lms/courses/rust", Some("u1")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["selection"]["lessonId"], "l1");
    assert_eq!(body["data"]["currentLesson"]["contentBlocks"][0]["type"], "text");

    let (status, body) = send(&app, Method::GET, "/api/lms/courses/rust/modules/m1/lessons/l2", Some("u1")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["currentLesson"]["title"], "Cargo");

    let (status, _) = send(&app, Method::GET, "/api/lms/courses/rust/modules/m1/lessons/nope", Some("u1")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, Method::GET, "/api/lms/courses/draft", Some("u1")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn enrolling_twice_is_rejected_without_double_counting() {
    let store = seeded_store();
    let app = app_with(store.clone()).await;

    let (status, body) = send(&app, Method::POST, "/api/lms/courses/rust/enroll", Some("u1")).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["success"], true);
    assert_eq!(body["message"], "Successfully enrolled in Rust Basics");
    assert_eq!(body["data"]["course"]["students"], 4);
    assert_eq!(body["data"]["course"]["isEnrolled"], true);
    assert_eq!(body["data"]["course"]["progress"], 0);

    let (status, body) = send(&app, Method::POST, "/api/lms/courses/rust/enroll", Some("u1")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "You are already enrolled in this course");

    let rust = store.documents(COURSES).into_iter().find(|c| c["id"] == "rust").unwrap();
    assert_eq!(rust["students"], 4);

    let (_, body) = send(&app, Method::POST, "/api/lms/courses/draft/enroll", Some("u1")).await;
    assert_eq!(body["message"], "Course is not available for enrollment");
}

#[tokio::test]
async fn enrollment_store_failure_is_reported_inline() {
    let store = seeded_store();
    store.fail_collection(ENROLLMENTS);
    let app = app_with(store.clone()).await;

    let (status, body) = send(&app, Method::POST, "/api/lms/courses/rust/enroll", Some("u1")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], false);
    assert_eq!(body["data"]["success"], false);
    assert_eq!(body["message"], ENROLL_FAILED_MESSAGE);
    assert_eq!(body["data"]["course"]["students"], 3);

    let rust = store.documents(COURSES).into_iter().find(|c| c["id"] == "rust").unwrap();
    assert_eq!(rust["students"], 3);
}

#[tokio::test]
async fn dashboard_aggregates_and_reports_failure() {
    let store = seeded_store();
    let app = app_with(store.clone()).await;

    let (status, body) = send(&app, Method::GET, "/api/lms/dashboard", Some("u1")).await;
    assert_eq!(status, StatusCode::OK);
    let data = &body["data"]["data"];
    assert_eq!(data["stats"]["totalEnrolledCourses"], 1);
    assert_eq!(data["stats"]["overallProgress"], 40);
    assert_eq!(data["stats"]["currentGPA"], 3.6);
    assert_eq!(data["stats"]["unreadNotifications"], 2);
    assert_eq!(data["courseProgress"]["calc"], 40);
    assert_eq!(data["activity"][0]["title"], "New Grade: Midterm");
    assert_eq!(body["data"]["generation"], 1);

    store.fail_collection(GRADES);
    let (status, body) = send(&app, Method::GET, "/api/lms/dashboard", Some("u1")).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"]["message"], LOAD_FAILED_MESSAGE);

    let (_, body) = send(&app, Method::GET, "/api/lms/dashboard/state", Some("u1")).await;
    assert_eq!(body["data"]["data"], Value::Null);
    assert_eq!(body["data"]["error"], LOAD_FAILED_MESSAGE);
}

#[tokio::test]
async fn notifications_are_scoped_to_their_owner() {
    let app = app_with(seeded_store()).await;

    let (_, body) = send(&app, Method::GET, "/api/lms/notifications?limit=1", Some("u1")).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"][0]["id"], "n2");

    let (status, _) = send(&app, Method::GET, "/api/lms/notifications?limit=0", Some("u1")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, Method::POST, "/api/lms/notifications/n3/read", Some("u1")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, Method::POST, "/api/lms/notifications/n1/read", Some("u1")).await;
    assert_eq!(status, StatusCode::OK);
    let (_, body) = send(&app, Method::GET, "/api/lms/notifications/unread-count", Some("u1")).await;
    assert_eq!(body["data"]["count"], 1);

    let (_, body) = send(&app, Method::POST, "/api/lms/notifications/read-all", Some("u1")).await;
    assert_eq!(body["data"]["updated"], 1);

    let (_, body) = send(&app, Method::GET, "/api/lms/notifications/unread-count", Some("u2")).await;
    assert_eq!(body["data"]["count"], 1);
}

#[tokio::test]
async fn shell_tracks_tab_and_dropdown_per_session() {
    let app = app_with(seeded_store()).await;

    let (_, body) = send(&app, Method::GET, "/api/lms/shell", Some("u1")).await;
    assert_eq!(body["data"]["activeTab"], "dashboard");
    assert_eq!(body["data"]["dropdownOpen"], false);

    let (_, body) = send(&app, Method::POST, "/api/lms/shell/bell/toggle", Some("u1")).await;
    assert_eq!(body["data"]["dropdownOpen"], true);

    let (_, body) = send(&app, Method::POST, "/api/lms/shell/tab/grades", Some("u1")).await;
    assert_eq!(body["data"]["activeTab"], "grades");
    assert_eq!(body["data"]["dropdownOpen"], false);

    let (status, _) = send(&app, Method::POST, "/api/lms/shell/tab/settings", Some("u1")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, Method::DELETE, "/api/lms/shell", Some("u1")).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&app, Method::DELETE, "/api/lms/shell", Some("u1")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
