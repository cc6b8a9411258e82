//! Client subcommands: talk to a running server and print JSON.

use crate::client::{Credential, RequestContext, Session, TaskClient, TaskStats};
use crate::validation::{ListParams, TaskInput};
use anyhow::{Result, anyhow};
use chrono::Utc;
use clap::{Args, Subcommand};
use serde_json::{Value, json};

#[derive(Subcommand, Debug)]
pub enum TaskCommand {
    /// Show the user the token resolves to
    Whoami,

    /// List your tasks
    List(ListArgs),

    /// Show one task
    Show { id: String },

    /// Create a task
    Add(TaskArgs),

    /// Replace every editable field of a task
    ///
    /// Fields not given are reset: description is cleared, priority and
    /// status return to Medium and Pending.
    Edit {
        id: String,
        #[command(flatten)]
        fields: TaskArgs,
    },

    /// Flip a task between Completed and Pending
    Toggle { id: String },

    /// Delete a task
    Delete { id: String },

    /// Dashboard statistics over all your tasks
    Stats,
}

#[derive(Args, Debug, Default)]
pub struct ListArgs {
    /// Pending, In Progress or Completed
    #[arg(long)]
    pub status: Option<String>,

    /// Case-insensitive title substring
    #[arg(long)]
    pub search: Option<String>,

    /// createdAt, dueDate, priority or title
    #[arg(long)]
    pub sort_by: Option<String>,

    /// asc or desc
    #[arg(long)]
    pub order: Option<String>,
}

impl From<ListArgs> for ListParams {
    fn from(args: ListArgs) -> Self {
        ListParams {
            status: args.status,
            search: args.search,
            sort_by: args.sort_by,
            sort_order: args.order,
        }
    }
}

#[derive(Args, Debug)]
pub struct TaskArgs {
    #[arg(long)]
    pub title: String,

    /// Due date: any ISO 8601 date or date-time, UTC unless an offset is given
    #[arg(long)]
    pub due: String,

    #[arg(long)]
    pub description: Option<String>,

    /// Low, Medium or High
    #[arg(long)]
    pub priority: Option<String>,

    /// Pending, In Progress or Completed
    #[arg(long)]
    pub status: Option<String>,
}

impl From<TaskArgs> for TaskInput {
    fn from(args: TaskArgs) -> Self {
        TaskInput {
            title: Some(args.title),
            description: args.description,
            due_date: Some(args.due),
            priority: args.priority,
            status: args.status,
        }
    }
}

/// Run a client subcommand and return the JSON to print.
pub async fn run(
    command: TaskCommand,
    client: &TaskClient,
    token: Option<String>,
) -> Result<Value> {
    let credential = token
        .map(Credential::new)
        .ok_or_else(|| anyhow!("a bearer token is required (--token or TASKFLOW_TOKEN)"))?;

    let ctx = RequestContext::new(credential);
    let output = match command {
        TaskCommand::Whoami => {
            let mut session = Session::new(client.clone());
            let identity = session.login(ctx.credential.clone()).await?;
            json!({ "user": identity })
        }
        TaskCommand::List(args) => {
            let tasks = client.list_tasks(&ctx, &args.into()).await?;
            json!({ "tasks": tasks })
        }
        TaskCommand::Show { id } => json!({ "task": client.get_task(&ctx, &id).await? }),
        TaskCommand::Add(fields) => {
            json!({ "task": client.create_task(&ctx, &fields.into()).await? })
        }
        TaskCommand::Edit { id, fields } => {
            json!({ "task": client.update_task(&ctx, &id, &fields.into()).await? })
        }
        TaskCommand::Toggle { id } => json!({ "task": client.toggle_task(&ctx, &id).await? }),
        TaskCommand::Delete { id } => {
            client.delete_task(&ctx, &id).await?;
            json!({ "deleted": id })
        }
        TaskCommand::Stats => {
            let tasks = client.list_tasks(&ctx, &ListParams::default()).await?;
            serde_json::to_value(TaskStats::from_tasks(&tasks, Utc::now()))?
        }
    };
    Ok(output)
}
