//! Route handlers and error-to-response mapping.

use super::server::AppState;
use super::{
    MeResponse, MessageResponse, TaskListResponse, TaskResponse, ValidationResponse,
};
use crate::auth::{Caller, Identity};
use crate::error::ServiceError;
use crate::validation::{ListParams, TaskInput};
use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tracing::{debug, error};

/// Error returned by a handler: a service failure tagged with what the handler
/// was doing, or a body or query string that could not be parsed.
#[derive(Debug)]
pub enum ApiError {
    Service {
        source: ServiceError,
        action: &'static str,
    },
    InvalidBody(JsonRejection),
    InvalidQuery(QueryRejection),
}

impl ApiError {
    fn while_(action: &'static str) -> impl FnOnce(ServiceError) -> ApiError {
        move |source| ApiError::Service { source, action }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::InvalidBody(rejection) => {
                debug!(error = %rejection, "Rejected request body");
                (
                    StatusCode::BAD_REQUEST,
                    Json(MessageResponse::new("Invalid request body")),
                )
                    .into_response()
            }
            ApiError::InvalidQuery(rejection) => {
                debug!(error = %rejection, "Rejected query string");
                (
                    StatusCode::BAD_REQUEST,
                    Json(MessageResponse::new("Invalid query string")),
                )
                    .into_response()
            }
            ApiError::Service { source, action } => service_error_response(source, action),
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        service_error_response(self, "processing request")
    }
}

fn service_error_response(err: ServiceError, action: &str) -> Response {
    match err {
        ServiceError::Validation(errors) => (
            StatusCode::BAD_REQUEST,
            Json(ValidationResponse {
                message: "Validation failed".to_string(),
                errors,
            }),
        )
            .into_response(),
        ServiceError::NotFound => (
            StatusCode::NOT_FOUND,
            Json(MessageResponse::new("Task not found")),
        )
            .into_response(),
        ServiceError::Unauthenticated(reason) => (
            StatusCode::UNAUTHORIZED,
            Json(MessageResponse::new(reason.to_string())),
        )
            .into_response(),
        ServiceError::Store(source) => {
            error!(action, error = ?source, "Store failure");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(MessageResponse::new(format!("Server error while {action}"))),
            )
                .into_response()
        }
    }
}

type ApiResult<T> = Result<T, ApiError>;

pub(super) async fn list_tasks(
    State(state): State<AppState>,
    Caller(user): Caller,
    query: Result<Query<ListParams>, QueryRejection>,
) -> ApiResult<Json<TaskListResponse>> {
    let Query(params) = query.map_err(ApiError::InvalidQuery)?;
    let tasks = state
        .service
        .list(&user, &params)
        .map_err(ApiError::while_("fetching tasks"))?;

    Ok(Json(TaskListResponse {
        message: "Tasks retrieved successfully".to_string(),
        tasks,
    }))
}

pub(super) async fn get_task(
    State(state): State<AppState>,
    Caller(user): Caller,
    Path(id): Path<String>,
) -> ApiResult<Json<TaskResponse>> {
    let task = state
        .service
        .get(&user, &id)
        .map_err(ApiError::while_("fetching task"))?;

    Ok(Json(TaskResponse {
        message: "Task retrieved successfully".to_string(),
        task,
    }))
}

pub(super) async fn create_task(
    State(state): State<AppState>,
    Caller(user): Caller,
    body: Result<Json<TaskInput>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<TaskResponse>)> {
    let Json(input) = body.map_err(ApiError::InvalidBody)?;
    let task = state
        .service
        .create(&user, &input)
        .map_err(ApiError::while_("creating task"))?;

    Ok((
        StatusCode::CREATED,
        Json(TaskResponse {
            message: "Task created successfully".to_string(),
            task,
        }),
    ))
}

pub(super) async fn update_task(
    State(state): State<AppState>,
    Caller(user): Caller,
    Path(id): Path<String>,
    body: Result<Json<TaskInput>, JsonRejection>,
) -> ApiResult<Json<TaskResponse>> {
    let Json(input) = body.map_err(ApiError::InvalidBody)?;
    let task = state
        .service
        .update(&user, &id, &input)
        .map_err(ApiError::while_("updating task"))?;

    Ok(Json(TaskResponse {
        message: "Task updated successfully".to_string(),
        task,
    }))
}

pub(super) async fn delete_task(
    State(state): State<AppState>,
    Caller(user): Caller,
    Path(id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    state
        .service
        .delete(&user, &id)
        .map_err(ApiError::while_("deleting task"))?;

    Ok(Json(MessageResponse::new("Task deleted successfully")))
}

pub(super) async fn toggle_task(
    State(state): State<AppState>,
    Caller(user): Caller,
    Path(id): Path<String>,
) -> ApiResult<Json<TaskResponse>> {
    let task = state
        .service
        .toggle_completion(&user, &id)
        .map_err(ApiError::while_("updating task status"))?;

    Ok(Json(TaskResponse {
        message: "Task status updated successfully".to_string(),
        task,
    }))
}

pub(super) async fn current_user(Caller(user): Caller) -> Json<MeResponse> {
    Json(MeResponse {
        user: Identity { id: user },
    })
}

pub(super) async fn health() -> Json<MessageResponse> {
    Json(MessageResponse::new("Server is running!"))
}

pub(super) async fn route_not_found() -> (StatusCode, Json<MessageResponse>) {
    (
        StatusCode::NOT_FOUND,
        Json(MessageResponse::new("Route not found")),
    )
}
