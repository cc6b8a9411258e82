//! Owner-scoped task statements.
//!
//! Each mutation is a single SQL statement, so SQLite's per-statement atomicity
//! is the only consistency guarantee needed.

use super::{Database, from_ms, now_ms};
use crate::types::{Priority, SortField, SortOrder, Task, TaskFields, TaskFilter, TaskStatus, UserId};
use anyhow::Result;
use rusqlite::types::Type;
use rusqlite::{OptionalExtension, Row, params};
use uuid::Uuid;

const TASK_COLUMNS: &str =
    "id, user_id, title, description, due_date, priority, status, created_at, updated_at";

/// Build an ORDER BY clause from the validated sort settings.
/// Ties fall back to the (time-ordered) id in the same direction.
fn build_order_clause(sort_by: SortField, sort_order: SortOrder) -> String {
    let field = match sort_by {
        SortField::CreatedAt => "created_at",
        SortField::DueDate => "due_date",
        SortField::Priority => "CASE priority WHEN 'Low' THEN 0 WHEN 'Medium' THEN 1 ELSE 2 END",
        SortField::Title => "title",
    };

    let order = match sort_order {
        SortOrder::Asc => "ASC",
        SortOrder::Desc => "DESC",
    };

    format!("{field} {order}, id {order}")
}

fn conversion_error(column: usize, value: &str) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        column,
        Type::Text,
        format!("unexpected value '{value}'").into(),
    )
}

pub fn parse_task_row(row: &Row) -> rusqlite::Result<Task> {
    let priority: String = row.get("priority")?;
    let status: String = row.get("status")?;

    Ok(Task {
        id: row.get("id")?,
        owner: UserId::new(row.get::<_, String>("user_id")?),
        title: row.get("title")?,
        description: row.get("description")?,
        due_date: from_ms(row.get("due_date")?)?,
        priority: Priority::parse(&priority).ok_or_else(|| conversion_error(5, &priority))?,
        status: TaskStatus::parse(&status).ok_or_else(|| conversion_error(6, &status))?,
        created_at: from_ms(row.get("created_at")?)?,
        updated_at: from_ms(row.get("updated_at")?)?,
    })
}

fn title_matches(title: &str, needle: &str) -> bool {
    title.to_lowercase().contains(needle)
}

impl Database {
    /// Insert a new task owned by `owner`.
    pub fn insert_task(&self, owner: &UserId, fields: TaskFields) -> Result<Task> {
        let id = Uuid::now_v7().to_string();
        let now = now_ms();

        self.with_conn(|conn| {
            let task = conn.query_row(
                &format!(
                    "INSERT INTO tasks ({TASK_COLUMNS})
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)
                     RETURNING {TASK_COLUMNS}"
                ),
                params![
                    id,
                    owner.as_str(),
                    fields.title,
                    fields.description,
                    fields.due_date.timestamp_millis(),
                    fields.priority.as_str(),
                    fields.status.as_str(),
                    now,
                ],
                parse_task_row,
            )?;
            Ok(task)
        })
    }

    /// Get one task by id, only if `owner` owns it.
    pub fn find_task(&self, owner: &UserId, task_id: &str) -> Result<Option<Task>> {
        self.with_conn(|conn| {
            let task = conn
                .query_row(
                    &format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = ?1 AND user_id = ?2"),
                    params![task_id, owner.as_str()],
                    parse_task_row,
                )
                .optional()?;
            Ok(task)
        })
    }

    /// List the owner's tasks matching the filter, in the requested order.
    pub fn find_tasks(&self, owner: &UserId, filter: &TaskFilter) -> Result<Vec<Task>> {
        self.with_conn(|conn| {
            let mut sql = format!("SELECT {TASK_COLUMNS} FROM tasks WHERE user_id = ?");
            let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> =
                vec![Box::new(owner.as_str().to_string())];

            if let Some(status) = filter.status {
                sql.push_str(" AND status = ?");
                params_vec.push(Box::new(status.as_str()));
            }

            sql.push_str(" ORDER BY ");
            sql.push_str(&build_order_clause(filter.sort_by, filter.sort_order));

            let params_refs: Vec<&dyn rusqlite::ToSql> =
                params_vec.iter().map(|b| b.as_ref()).collect();

            // SQLite's lower() only folds ASCII, so the title search runs here
            let needle = filter.search.as_deref().map(str::to_lowercase);

            let mut stmt = conn.prepare(&sql)?;
            let mut tasks = Vec::new();
            for task in stmt.query_map(params_refs.as_slice(), parse_task_row)? {
                let task = task?;
                if needle.as_deref().is_none_or(|n| title_matches(&task.title, n)) {
                    tasks.push(task);
                }
            }

            Ok(tasks)
        })
    }

    /// Overwrite every editable field of an owned task.
    /// Returns `None` when no task with that id belongs to `owner`.
    pub fn replace_task(
        &self,
        owner: &UserId,
        task_id: &str,
        fields: TaskFields,
    ) -> Result<Option<Task>> {
        let now = now_ms();

        self.with_conn(|conn| {
            let task = conn
                .query_row(
                    &format!(
                        "UPDATE tasks
                         SET title = ?1, description = ?2, due_date = ?3,
                             priority = ?4, status = ?5, updated_at = ?6
                         WHERE id = ?7 AND user_id = ?8
                         RETURNING {TASK_COLUMNS}"
                    ),
                    params![
                        fields.title,
                        fields.description,
                        fields.due_date.timestamp_millis(),
                        fields.priority.as_str(),
                        fields.status.as_str(),
                        now,
                        task_id,
                        owner.as_str(),
                    ],
                    parse_task_row,
                )
                .optional()?;
            Ok(task)
        })
    }

    /// Flip an owned task between Completed and not-Completed.
    pub fn toggle_task(&self, owner: &UserId, task_id: &str) -> Result<Option<Task>> {
        let now = now_ms();

        self.with_conn(|conn| {
            let task = conn
                .query_row(
                    &format!(
                        "UPDATE tasks
                         SET status = CASE status
                                 WHEN 'Completed' THEN 'Pending'
                                 ELSE 'Completed'
                             END,
                             updated_at = ?1
                         WHERE id = ?2 AND user_id = ?3
                         RETURNING {TASK_COLUMNS}"
                    ),
                    params![now, task_id, owner.as_str()],
                    parse_task_row,
                )
                .optional()?;
            Ok(task)
        })
    }

    /// Delete an owned task. Returns whether a row was removed.
    pub fn delete_task(&self, owner: &UserId, task_id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let deleted = conn.execute(
                "DELETE FROM tasks WHERE id = ?1 AND user_id = ?2",
                params![task_id, owner.as_str()],
            )?;
            Ok(deleted > 0)
        })
    }
}
