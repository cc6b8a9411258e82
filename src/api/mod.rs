//! HTTP/JSON surface of the task service.
//!
//! The response types here are the wire contract; the client module
//! deserializes the same structs.

mod handlers;
mod server;

pub use handlers::ApiError;
pub use server::{AppState, build_router, start_server};

use crate::auth::Identity;
use crate::error::FieldError;
use crate::types::Task;
use serde::{Deserialize, Serialize};

/// `{message, task}` returned by get, create, update and toggle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskResponse {
    pub message: String,
    pub task: Task,
}

/// `{message, tasks}` returned by list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskListResponse {
    pub message: String,
    pub tasks: Vec<Task>,
}

/// Bare `{message}`, used by delete, health and most errors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// 400 body listing every violated field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationResponse {
    pub message: String,
    pub errors: Vec<FieldError>,
}

/// `{user}` returned by the identity endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeResponse {
    pub user: Identity,
}
