//! Task query/mutation service.
//!
//! Validates requests and turns them into owner-scoped store calls. Every
//! operation takes the caller explicitly; nothing here can reach a task through
//! anything but the caller's own id.

use crate::db::Database;
use crate::error::{FieldError, ServiceError, ServiceResult};
use crate::types::{Task, UserId};
use crate::validation::{ListParams, TaskInput};
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Clone)]
pub struct TaskService {
    db: Arc<Database>,
}

impl TaskService {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    pub fn list(&self, owner: &UserId, params: &ListParams) -> ServiceResult<Vec<Task>> {
        let filter = rejected(owner, params.validate())?;
        let tasks = self.db.find_tasks(owner, &filter)?;
        debug!(user = %owner, count = tasks.len(), "Listed tasks");
        Ok(tasks)
    }

    pub fn get(&self, owner: &UserId, task_id: &str) -> ServiceResult<Task> {
        self.db
            .find_task(owner, task_id)?
            .ok_or(ServiceError::NotFound)
    }

    pub fn create(&self, owner: &UserId, input: &TaskInput) -> ServiceResult<Task> {
        let fields = rejected(owner, input.validate())?;
        let task = self.db.insert_task(owner, fields)?;
        info!(user = %owner, task_id = %task.id, "Task created");
        Ok(task)
    }

    /// Full replace: fields missing from `input` are cleared or reset to
    /// their defaults, never merged with the stored values.
    pub fn update(&self, owner: &UserId, task_id: &str, input: &TaskInput) -> ServiceResult<Task> {
        let fields = rejected(owner, input.validate())?;
        let task = self
            .db
            .replace_task(owner, task_id, fields)?
            .ok_or(ServiceError::NotFound)?;
        info!(user = %owner, task_id = %task.id, "Task updated");
        Ok(task)
    }

    pub fn toggle_completion(&self, owner: &UserId, task_id: &str) -> ServiceResult<Task> {
        let task = self
            .db
            .toggle_task(owner, task_id)?
            .ok_or(ServiceError::NotFound)?;
        info!(user = %owner, task_id = %task.id, status = %task.status, "Task toggled");
        Ok(task)
    }

    pub fn delete(&self, owner: &UserId, task_id: &str) -> ServiceResult<()> {
        if !self.db.delete_task(owner, task_id)? {
            return Err(ServiceError::NotFound);
        }
        info!(user = %owner, task_id = %task_id, "Task deleted");
        Ok(())
    }
}

fn rejected<T>(owner: &UserId, result: Result<T, Vec<FieldError>>) -> ServiceResult<T> {
    result.map_err(|errors| {
        let err = ServiceError::Validation(errors);
        debug!(user = %owner, fields = ?err.fields(), "Rejected invalid input");
        err
    })
}
