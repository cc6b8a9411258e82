//! Router construction and server lifecycle.

use super::handlers::{
    create_task, current_user, delete_task, get_task, health, list_tasks, route_not_found,
    toggle_task, update_task,
};
use crate::auth::IdentityGate;
use crate::db::Database;
use crate::service::TaskService;
use axum::Router;
use axum::extract::FromRef;
use axum::routing::{get, patch};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::oneshot;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

/// State shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub service: TaskService,
    pub gate: Arc<dyn IdentityGate>,
}

impl AppState {
    pub fn new(db: Arc<Database>, gate: Arc<dyn IdentityGate>) -> Self {
        Self {
            service: TaskService::new(db),
            gate,
        }
    }
}

impl FromRef<AppState> for Arc<dyn IdentityGate> {
    fn from_ref(state: &AppState) -> Self {
        Arc::clone(&state.gate)
    }
}

/// Build the router with all routes.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/health", get(health))
        .route("/api/auth/me", get(current_user))
        .route("/api/tasks", get(list_tasks).post(create_task))
        .route(
            "/api/tasks/{id}",
            get(get_task).put(update_task).delete(delete_task),
        )
        .route("/api/tasks/{id}/toggle", patch(toggle_task))
        .fallback(route_not_found)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the HTTP server on `addr` in a background task.
///
/// Returns a oneshot sender that triggers graceful shutdown, and the address
/// actually bound (useful when `addr` asks for port 0).
pub async fn start_server(
    state: AppState,
    addr: SocketAddr,
) -> anyhow::Result<(oneshot::Sender<()>, SocketAddr)> {
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    let bound_addr = listener.local_addr()?;

    info!("TaskFlow API listening on http://{}", bound_addr);

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
                info!("TaskFlow API shutting down");
            })
            .await
        {
            tracing::error!("HTTP server error: {}", e);
        }
    });

    Ok((shutdown_tx, bound_addr))
}
