//! Structured error types for task operations.

use crate::auth::AuthError;
use serde::{Deserialize, Serialize};

/// Where a rejected value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldLocation {
    Body,
    Query,
}

/// A single violated field constraint.
///
/// Wire shape:
/// `{"type": "field", "path": "title", "msg": "...", "location": "body"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    #[serde(rename = "type", default = "field_kind")]
    pub kind: String,
    #[serde(rename = "path")]
    pub field: String,
    #[serde(rename = "msg")]
    pub message: String,
    pub location: FieldLocation,
}

fn field_kind() -> String {
    "field".to_string()
}

impl FieldError {
    pub fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            kind: field_kind(),
            field: field.to_string(),
            message: message.into(),
            location: FieldLocation::Body,
        }
    }

    pub fn in_query(mut self) -> Self {
        self.location = FieldLocation::Query;
        self
    }

    // Convenience constructors

    pub fn title() -> Self {
        Self::new("title", "Title must be between 1 and 100 characters")
    }

    pub fn description() -> Self {
        Self::new("description", "Description cannot exceed 500 characters")
    }

    pub fn due_date() -> Self {
        Self::new("dueDate", "Please provide a valid due date")
    }

    pub fn priority() -> Self {
        Self::new("priority", "Priority must be Low, Medium, or High")
    }

    pub fn status() -> Self {
        Self::new("status", "Status must be Pending, In Progress, or Completed")
    }

    pub fn status_filter() -> Self {
        Self::new(
            "status",
            "Status must be All, Pending, In Progress, or Completed",
        )
        .in_query()
    }

    pub fn sort_by() -> Self {
        Self::new(
            "sortBy",
            "Sort field must be createdAt, dueDate, priority, or title",
        )
        .in_query()
    }

    pub fn sort_order() -> Self {
        Self::new("sortOrder", "Sort order must be asc or desc").in_query()
    }
}

/// Failure of a task operation.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// Every violated constraint, not just the first.
    #[error("validation failed: {}", summarize(.0))]
    Validation(Vec<FieldError>),

    /// The id does not exist or belongs to another user.
    #[error("task not found")]
    NotFound,

    #[error(transparent)]
    Unauthenticated(#[from] AuthError),

    #[error("store error: {0}")]
    Store(#[from] anyhow::Error),
}

impl ServiceError {
    /// Field names cited by a validation failure (empty for other variants).
    pub fn fields(&self) -> Vec<&str> {
        match self {
            ServiceError::Validation(errors) => errors.iter().map(|e| e.field.as_str()).collect(),
            _ => Vec::new(),
        }
    }
}

fn summarize(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| format!("{}: {}", e.field, e.message))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Result type for service operations.
pub type ServiceResult<T> = std::result::Result<T, ServiceError>;
