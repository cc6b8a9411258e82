//! HTTP-level tests: drive the router in-process with `tower::ServiceExt`.

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use serde_json::{Value, json};
use std::sync::Arc;
use taskflow::api::{AppState, build_router};
use taskflow::auth::JwtGate;
use taskflow::db::Database;
use taskflow::types::UserId;
use tower::ServiceExt;

const SECRET: &str = "api-test-secret";

struct TestApp {
    router: Router,
    gate: JwtGate,
}

impl TestApp {
    fn new() -> Self {
        let db = Database::open_in_memory().expect("Failed to create in-memory database");
        let state = AppState::new(Arc::new(db), Arc::new(JwtGate::new(SECRET, None)));
        Self {
            router: build_router(state),
            gate: JwtGate::new(SECRET, None),
        }
    }

    fn token_for(&self, user: &str) -> String {
        self.gate
            .issue(&UserId::new(user), chrono::Duration::hours(1))
            .unwrap()
    }

    async fn send(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .unwrap();

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    async fn create(&self, token: &str, body: Value) -> Value {
        let (status, json) = self.send("POST", "/api/tasks", Some(token), Some(body)).await;
        assert_eq!(status, StatusCode::CREATED, "{json}");
        json["task"].clone()
    }
}

fn error_paths(body: &Value) -> Vec<String> {
    body["errors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["path"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn health_needs_no_token() {
    let app = TestApp::new();
    let (status, body) = app.send("GET", "/api/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Server is running!");
}

#[tokio::test]
async fn unknown_route_is_404() {
    let app = TestApp::new();
    let (status, body) = app.send("GET", "/api/nope", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Route not found");
}

#[tokio::test]
async fn missing_and_invalid_tokens_are_401() {
    let app = TestApp::new();

    let (status, body) = app.send("GET", "/api/tasks", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "No token, authorization denied");

    let (status, body) = app.send("GET", "/api/tasks", Some("garbage"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Token is not valid");

    let foreign = JwtGate::new("another-secret", None)
        .issue(&UserId::new("alice"), chrono::Duration::hours(1))
        .unwrap();
    let (status, _) = app.send("GET", "/api/tasks", Some(&foreign), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn me_returns_token_subject() {
    let app = TestApp::new();
    let token = app.token_for("alice");
    let (status, body) = app.send("GET", "/api/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["id"], "alice");
}

#[tokio::test]
async fn create_delete_get_scenario() {
    let app = TestApp::new();
    let token = app.token_for("alice");

    let (status, body) = app
        .send(
            "POST",
            "/api/tasks",
            Some(&token),
            Some(json!({"title": "Buy milk", "dueDate": "2025-01-01"})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "Task created successfully");
    let task = &body["task"];
    assert_eq!(task["title"], "Buy milk");
    assert_eq!(task["priority"], "Medium");
    assert_eq!(task["status"], "Pending");
    assert_eq!(task["user"], "alice");
    let id = task["_id"].as_str().unwrap().to_string();

    let (status, body) = app
        .send("DELETE", &format!("/api/tasks/{id}"), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Task deleted successfully");

    let (status, body) = app
        .send("GET", &format!("/api/tasks/{id}"), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Task not found");
}

#[tokio::test]
async fn create_then_get_returns_same_attributes() {
    let app = TestApp::new();
    let token = app.token_for("alice");
    let created = app
        .create(
            &token,
            json!({
                "title": "  Plan sprint  ",
                "description": "Backlog grooming",
                "dueDate": "2030-06-01T09:30:00Z",
                "priority": "High",
                "status": "In Progress"
            }),
        )
        .await;
    assert_eq!(created["title"], "Plan sprint");

    let id = created["_id"].as_str().unwrap();
    let (status, body) = app
        .send("GET", &format!("/api/tasks/{id}"), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Task retrieved successfully");
    assert_eq!(body["task"], created);
}

#[tokio::test]
async fn validation_lists_every_bad_field() {
    let app = TestApp::new();
    let token = app.token_for("alice");

    let (status, body) = app
        .send(
            "POST",
            "/api/tasks",
            Some(&token),
            Some(json!({
                "title": "x".repeat(101),
                "dueDate": "not a date",
                "priority": "Urgent"
            })),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Validation failed");
    let paths = error_paths(&body);
    assert!(paths.contains(&"title".to_string()));
    assert!(paths.contains(&"dueDate".to_string()));
    assert!(paths.contains(&"priority".to_string()));
    assert_eq!(body["errors"][0]["type"], "field");
    assert_eq!(body["errors"][0]["location"], "body");
}

#[tokio::test]
async fn empty_title_is_rejected() {
    let app = TestApp::new();
    let token = app.token_for("alice");
    let (status, body) = app
        .send(
            "POST",
            "/api/tasks",
            Some(&token),
            Some(json!({"title": "   ", "dueDate": "2030-01-01"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_paths(&body), vec!["title"]);
}

#[tokio::test]
async fn malformed_body_is_400() {
    let app = TestApp::new();
    let token = app.token_for("alice");
    let (status, body) = app
        .send("POST", "/api/tasks", Some(&token), Some(json!({"title": 42})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid request body");
}

#[tokio::test]
async fn bad_query_parameters_are_reported_in_query() {
    let app = TestApp::new();
    let token = app.token_for("alice");
    let (status, body) = app
        .send(
            "GET",
            "/api/tasks?status=Done&sortBy=owner&sortOrder=up",
            Some(&token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_paths(&body), vec!["status", "sortBy", "sortOrder"]);
    assert_eq!(body["errors"][0]["location"], "query");
}

#[tokio::test]
async fn unparseable_query_string_gets_json_error() {
    let app = TestApp::new();
    let token = app.token_for("alice");
    let (status, body) = app
        .send(
            "GET",
            "/api/tasks?status=Pending&status=Completed",
            Some(&token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid query string");
}

#[tokio::test]
async fn list_filters_by_status_and_search() {
    let app = TestApp::new();
    let token = app.token_for("alice");
    app.create(&token, json!({"title": "Foo bar", "dueDate": "2030-01-01", "status": "Completed"}))
        .await;
    app.create(&token, json!({"title": "FOOD shopping", "dueDate": "2030-01-02"}))
        .await;
    app.create(&token, json!({"title": "Laundry", "dueDate": "2030-01-03", "status": "Completed"}))
        .await;

    let (status, body) = app
        .send("GET", "/api/tasks?status=Completed", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Tasks retrieved successfully");
    assert_eq!(body["tasks"].as_array().unwrap().len(), 2);

    let (_, body) = app
        .send(
            "GET",
            "/api/tasks?search=foo&sortBy=title&sortOrder=asc",
            Some(&token),
            None,
        )
        .await;
    let titles: Vec<&str> = body["tasks"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["FOOD shopping", "Foo bar"]);

    let (_, body) = app
        .send("GET", "/api/tasks?status=All", Some(&token), None)
        .await;
    assert_eq!(body["tasks"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn update_replaces_fields() {
    let app = TestApp::new();
    let token = app.token_for("alice");
    let task = app
        .create(
            &token,
            json!({
                "title": "Draft",
                "description": "first pass",
                "dueDate": "2030-01-01",
                "priority": "High",
                "status": "In Progress"
            }),
        )
        .await;
    let id = task["_id"].as_str().unwrap();

    let (status, body) = app
        .send(
            "PUT",
            &format!("/api/tasks/{id}"),
            Some(&token),
            Some(json!({"title": "Final", "dueDate": "2030-02-01"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Task updated successfully");
    assert_eq!(body["task"]["title"], "Final");
    assert!(body["task"].get("description").is_none());
    assert_eq!(body["task"]["priority"], "Medium");
    assert_eq!(body["task"]["status"], "Pending");
    assert_eq!(body["task"]["createdAt"], task["createdAt"]);
}

#[tokio::test]
async fn toggle_round_trips() {
    let app = TestApp::new();
    let token = app.token_for("alice");
    let task = app
        .create(&token, json!({"title": "Flip", "dueDate": "2030-01-01", "status": "In Progress"}))
        .await;
    let uri = format!("/api/tasks/{}/toggle", task["_id"].as_str().unwrap());

    let (status, body) = app.send("PATCH", &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Task status updated successfully");
    assert_eq!(body["task"]["status"], "Completed");

    let (_, body) = app.send("PATCH", &uri, Some(&token), None).await;
    assert_eq!(body["task"]["status"], "Pending");
}

#[tokio::test]
async fn other_users_get_404_and_task_is_untouched() {
    let app = TestApp::new();
    let alice = app.token_for("alice");
    let bob = app.token_for("bob");
    let task = app
        .create(&alice, json!({"title": "Secret", "dueDate": "2030-01-01"}))
        .await;
    let id = task["_id"].as_str().unwrap();
    let uri = format!("/api/tasks/{id}");

    let (status, _) = app.send("GET", &uri, Some(&bob), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .send(
            "PUT",
            &uri,
            Some(&bob),
            Some(json!({"title": "Mine now", "dueDate": "2030-01-01"})),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .send("PATCH", &format!("{uri}/toggle"), Some(&bob), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app.send("DELETE", &uri, Some(&bob), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = app.send("GET", "/api/tasks", Some(&bob), None).await;
    assert!(body["tasks"].as_array().unwrap().is_empty());

    let (status, body) = app.send("GET", &uri, Some(&alice), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["task"], task);
}

#[tokio::test]
async fn validation_is_checked_before_existence() {
    let app = TestApp::new();
    let token = app.token_for("alice");
    let (status, _) = app
        .send(
            "PUT",
            "/api/tasks/does-not-exist",
            Some(&token),
            Some(json!({"title": "", "dueDate": "2030-01-01"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
