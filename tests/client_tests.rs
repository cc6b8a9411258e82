//! End-to-end tests: a real server on an ephemeral port, driven through
//! `TaskClient` and `Session`.

use chrono::Utc;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use taskflow::api::{AppState, start_server};
use taskflow::auth::JwtGate;
use taskflow::client::{
    ClientError, Credential, RequestContext, Session, SessionState, TaskClient, TaskStats,
};
use taskflow::db::Database;
use taskflow::types::{TaskStatus, UserId};
use taskflow::validation::{ListParams, TaskInput};
use tokio::sync::oneshot;

const SECRET: &str = "client-test-secret";

struct Harness {
    client: TaskClient,
    gate: JwtGate,
    _shutdown: oneshot::Sender<()>,
}

impl Harness {
    async fn start() -> Self {
        let db = Database::open_in_memory().expect("Failed to create in-memory database");
        let state = AppState::new(Arc::new(db), Arc::new(JwtGate::new(SECRET, None)));
        let addr: SocketAddr = "127.0.0.1:0".parse().unwrap();
        let (shutdown, bound) = start_server(state, addr).await.unwrap();

        Self {
            client: TaskClient::new(format!("http://{bound}"), Duration::from_secs(5)).unwrap(),
            gate: JwtGate::new(SECRET, None),
            _shutdown: shutdown,
        }
    }

    fn context(&self, user: &str) -> RequestContext {
        let token = self
            .gate
            .issue(&UserId::new(user), chrono::Duration::hours(1))
            .unwrap();
        RequestContext::new(Credential::new(token))
    }
}

fn input(title: &str, due: &str) -> TaskInput {
    TaskInput {
        title: Some(title.to_string()),
        due_date: Some(due.to_string()),
        ..Default::default()
    }
}

#[tokio::test]
async fn full_task_lifecycle() {
    let harness = Harness::start().await;
    let client = &harness.client;
    let ctx = harness.context("alice");

    let created = client
        .create_task(&ctx, &input("Buy milk", "2025-01-01"))
        .await
        .unwrap();
    assert_eq!(created.status, TaskStatus::Pending);

    let fetched = client.get_task(&ctx, &created.id).await.unwrap();
    assert_eq!(fetched, created);

    let toggled = client.toggle_task(&ctx, &created.id).await.unwrap();
    assert_eq!(toggled.status, TaskStatus::Completed);

    let updated = client
        .update_task(&ctx, &created.id, &input("Buy oat milk", "2025-01-02"))
        .await
        .unwrap();
    assert_eq!(updated.title, "Buy oat milk");
    assert_eq!(updated.status, TaskStatus::Pending);

    client.delete_task(&ctx, &created.id).await.unwrap();
    let err = client.get_task(&ctx, &created.id).await.unwrap_err();
    assert!(matches!(err, ClientError::NotFound(_)));
}

#[tokio::test]
async fn ids_with_path_characters_stay_in_one_segment() {
    let harness = Harness::start().await;
    let client = &harness.client;
    let ctx = harness.context("alice");

    let created = client
        .create_task(&ctx, &input("Keep me", "2025-01-01"))
        .await
        .unwrap();

    let smuggled = format!("{}/toggle", created.id);
    let err = client.delete_task(&ctx, &smuggled).await.unwrap_err();
    assert!(matches!(err, ClientError::NotFound(_)), "{err:?}");

    let err = client.get_task(&ctx, "missing?x=1").await.unwrap_err();
    assert!(matches!(err, ClientError::NotFound(_)), "{err:?}");

    let still_there = client.get_task(&ctx, &created.id).await.unwrap();
    assert_eq!(still_there.status, TaskStatus::Pending);
}

#[tokio::test]
async fn validation_errors_come_back_typed() {
    let harness = Harness::start().await;
    let ctx = harness.context("alice");

    let err = harness
        .client
        .create_task(&ctx, &input("", "whenever"))
        .await
        .unwrap_err();

    match err {
        ClientError::Validation(errors) => {
            let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
            assert_eq!(fields, vec!["title", "dueDate"]);
        }
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[tokio::test]
async fn bad_credential_is_unauthorized() {
    let harness = Harness::start().await;
    let ctx = RequestContext::new(Credential::new("not-a-jwt"));

    let err = harness
        .client
        .list_tasks(&ctx, &ListParams::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Unauthorized(ref m) if m == "Token is not valid"));
}

#[tokio::test]
async fn list_and_stats_reflect_only_own_tasks() {
    let harness = Harness::start().await;
    let client = &harness.client;
    let alice = harness.context("alice");
    let bob = harness.context("bob");

    client.create_task(&alice, &input("Overdue", "2000-01-01")).await.unwrap();
    let done = client.create_task(&alice, &input("Done", "2000-01-01")).await.unwrap();
    client.toggle_task(&alice, &done.id).await.unwrap();
    let mut future = input("Later", "2999-01-01");
    future.status = Some("In Progress".to_string());
    client.create_task(&alice, &future).await.unwrap();
    client.create_task(&bob, &input("Bob's", "2000-01-01")).await.unwrap();

    let params = ListParams {
        status: Some("Completed".to_string()),
        ..Default::default()
    };
    let completed = client.list_tasks(&alice, &params).await.unwrap();
    assert_eq!(completed.len(), 1);
    assert_eq!(completed[0].title, "Done");

    let tasks = client.list_tasks(&alice, &ListParams::default()).await.unwrap();
    let stats = TaskStats::from_tasks(&tasks, Utc::now());
    assert_eq!(stats.total, 3);
    assert_eq!(stats.completed, 1);
    assert_eq!(stats.pending, 1);
    assert_eq!(stats.in_progress, 1);
    assert_eq!(stats.overdue, 1);
}

#[tokio::test]
async fn session_login_and_logout() {
    let harness = Harness::start().await;
    let mut session = Session::new(harness.client.clone());
    let credential = harness.context("alice").credential;

    let identity = session.login(credential).await.unwrap();
    assert_eq!(identity.id, UserId::new("alice"));
    assert!(session.state().is_authenticated());

    let ctx = session.context().unwrap();
    let tasks = session
        .client()
        .list_tasks(&ctx, &ListParams::default())
        .await
        .unwrap();
    assert!(tasks.is_empty());

    session.logout();
    assert_eq!(*session.state(), SessionState::Unauthenticated);
    assert!(session.context().is_none());
}

#[tokio::test]
async fn session_rejects_bad_credential() {
    let harness = Harness::start().await;
    let mut session = Session::new(harness.client.clone());

    let err = session.login(Credential::new("forged")).await.unwrap_err();
    assert!(matches!(err, ClientError::Unauthorized(_)));
    assert_eq!(*session.state(), SessionState::Unauthenticated);
}
