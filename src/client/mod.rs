//! HTTP client for the task API.
//!
//! Credentials travel with each call in a [`RequestContext`]; the client itself
//! holds no authentication state.

mod session;
mod stats;

pub use session::{Session, SessionEvent, SessionState, transition};
pub use stats::TaskStats;

use crate::api::{MeResponse, MessageResponse, TaskListResponse, TaskResponse, ValidationResponse};
use crate::auth::{BEARER_PREFIX, Identity};
use crate::error::FieldError;
use crate::types::Task;
use crate::validation::{ListParams, TaskInput};
use reqwest::{Method, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use std::fmt;
use std::time::Duration;
use tracing::debug;

/// A bearer token.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn token(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}

/// Per-call request context.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub credential: Credential,
}

impl RequestContext {
    pub fn new(credential: Credential) -> Self {
        Self { credential }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("validation failed: {}", describe_fields(.0))]
    Validation(Vec<FieldError>),
    #[error("server returned {status}: {message}")]
    Server { status: u16, message: String },
    #[error("invalid server url {0}")]
    InvalidUrl(String),
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

fn describe_fields(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| format!("{}: {}", e.field, e.message))
        .collect::<Vec<_>>()
        .join("; ")
}

pub type ClientResult<T> = Result<T, ClientError>;

#[derive(Debug, Clone)]
pub struct TaskClient {
    base_url: Url,
    http: reqwest::Client,
}

impl TaskClient {
    /// `base_url` must be an absolute http(s) URL; it may carry a path prefix.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> ClientResult<Self> {
        let raw = base_url.into();
        let base_url = Url::parse(&raw).map_err(|_| ClientError::InvalidUrl(raw.clone()))?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::InvalidUrl(raw));
        }
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { base_url, http })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub async fn list_tasks(
        &self,
        ctx: &RequestContext,
        params: &ListParams,
    ) -> ClientResult<Vec<Task>> {
        let request = self.request(ctx, Method::GET, &["api", "tasks"])?.query(params);
        let body: TaskListResponse = send(request).await?;
        Ok(body.tasks)
    }

    pub async fn get_task(&self, ctx: &RequestContext, id: &str) -> ClientResult<Task> {
        let request = self.request(ctx, Method::GET, &["api", "tasks", id])?;
        let body: TaskResponse = send(request).await?;
        Ok(body.task)
    }

    pub async fn create_task(&self, ctx: &RequestContext, input: &TaskInput) -> ClientResult<Task> {
        let request = self.request(ctx, Method::POST, &["api", "tasks"])?.json(input);
        let body: TaskResponse = send(request).await?;
        Ok(body.task)
    }

    /// Full replacement: fields absent from `input` are reset.
    pub async fn update_task(
        &self,
        ctx: &RequestContext,
        id: &str,
        input: &TaskInput,
    ) -> ClientResult<Task> {
        let request = self.request(ctx, Method::PUT, &["api", "tasks", id])?.json(input);
        let body: TaskResponse = send(request).await?;
        Ok(body.task)
    }

    pub async fn toggle_task(&self, ctx: &RequestContext, id: &str) -> ClientResult<Task> {
        let request = self.request(ctx, Method::PATCH, &["api", "tasks", id, "toggle"])?;
        let body: TaskResponse = send(request).await?;
        Ok(body.task)
    }

    pub async fn delete_task(&self, ctx: &RequestContext, id: &str) -> ClientResult<()> {
        let request = self.request(ctx, Method::DELETE, &["api", "tasks", id])?;
        let _: MessageResponse = send(request).await?;
        Ok(())
    }

    /// Resolve the credential in `ctx` to the identity the server sees.
    pub async fn current_user(&self, ctx: &RequestContext) -> ClientResult<Identity> {
        let request = self.request(ctx, Method::GET, &["api", "auth", "me"])?;
        let body: MeResponse = send(request).await?;
        Ok(body.user)
    }

    /// Append `segments` to the base path. Each segment is percent-encoded, so
    /// an id can never reach a different route.
    fn endpoint(&self, segments: &[&str]) -> ClientResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ClientError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(
        &self,
        ctx: &RequestContext,
        method: Method,
        segments: &[&str],
    ) -> ClientResult<RequestBuilder> {
        let url = self.endpoint(segments)?;
        debug!(%method, %url, "Sending request");
        Ok(self.http.request(method, url).header(
            reqwest::header::AUTHORIZATION,
            format!("{BEARER_PREFIX}{}", ctx.credential.token()),
        ))
    }
}

async fn send<T: DeserializeOwned>(request: RequestBuilder) -> ClientResult<T> {
    let response = request.send().await?;
    if response.status().is_success() {
        return Ok(response.json().await?);
    }
    Err(error_from_response(response).await)
}

async fn error_from_response(response: Response) -> ClientError {
    let status = response.status();
    let body = match response.text().await {
        Ok(body) => body,
        Err(e) => return ClientError::Transport(e),
    };
    classify_error(status, &body)
}

fn classify_error(status: StatusCode, body: &str) -> ClientError {
    if status == StatusCode::BAD_REQUEST
        && let Ok(validation) = serde_json::from_str::<ValidationResponse>(body)
    {
        return ClientError::Validation(validation.errors);
    }

    let message = serde_json::from_str::<MessageResponse>(body)
        .map(|m| m.message)
        .unwrap_or_else(|_| body.to_string());

    match status {
        StatusCode::UNAUTHORIZED => ClientError::Unauthorized(message),
        StatusCode::NOT_FOUND => ClientError::NotFound(message),
        _ => ClientError::Server {
            status: status.as_u16(),
            message,
        },
    }
}
