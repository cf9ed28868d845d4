/// Instruction-to-tool-call mapping for the chat surface
///
/// The chat endpoint turns a free-text instruction into **at most one** task
/// operation per turn. This module provides the two halves of that:
///
/// - [`interpret`]: a pure function from an instruction string to a
///   [`ToolCall`]. No I/O, no memory between turns. The matcher is a
///   deliberate keyword mapper; understanding quality is out of scope, and
///   a model-backed interpreter could replace this function without touching
///   the dispatcher.
/// - [`dispatch`]: executes one tool call through the same owner-scoped
///   model methods the REST handlers use. The agent gets no bypass: a task
///   it cannot see through the subject's scope does not exist for it.
///
/// Everything the agent knows across turns lives in the `conversations` /
/// `messages` tables; the process itself holds no dialog state.
use serde::Serialize;
use sqlx::PgPool;
use ticklist_shared::models::task::{CreateTask, Task, TaskFilter, UpdateTask};
use uuid::Uuid;

/// One task operation, the only kind of action a chat turn can take
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "tool", rename_all = "snake_case")]
pub enum ToolCall {
    /// Create a task with the given title
    CreateTask { title: String },

    /// List tasks, optionally filtered by completion
    ListTasks { completed: Option<bool> },

    /// Show one task, referenced by title
    ShowTask { title: String },

    /// Mark a task complete, referenced by title
    CompleteTask { title: String },

    /// Delete a task, referenced by title
    DeleteTask { title: String },
}

/// Result of dispatching a tool call
#[derive(Debug, Clone, Serialize)]
pub struct ToolOutcome {
    /// Assistant reply to store in the transcript and return to the client
    pub reply: String,

    /// Task the call touched, when there was exactly one
    pub task_id: Option<Uuid>,
}

impl ToolOutcome {
    fn text(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
            task_id: None,
        }
    }

    fn for_task(reply: impl Into<String>, task_id: Uuid) -> Self {
        Self {
            reply: reply.into(),
            task_id: Some(task_id),
        }
    }
}

/// Reply used when an instruction doesn't map to any tool
pub const HELP_REPLY: &str =
    "I can manage your to-do list. Try: \"add buy milk\", \"list\", \"list done\", \
     \"show buy milk\", \"complete buy milk\", or \"delete buy milk\".";

/// Maps an instruction to at most one tool call
///
/// Pure and stateless: the same instruction always maps to the same call,
/// regardless of who asks or what was said before.
///
/// # Example
///
/// ```
/// use ticklist_api::agent::{interpret, ToolCall};
///
/// assert_eq!(
///     interpret("add buy milk"),
///     Some(ToolCall::CreateTask { title: "buy milk".to_string() })
/// );
/// assert_eq!(interpret("what is the weather"), None);
/// ```
pub fn interpret(instruction: &str) -> Option<ToolCall> {
    let text = instruction.trim();

    for prefix in ["add ", "create ", "new task "] {
        if let Some(rest) = strip_prefix_ci(text, prefix) {
            let title = rest.trim();
            if title.is_empty() {
                return None;
            }
            return Some(ToolCall::CreateTask {
                title: title.to_string(),
            });
        }
    }

    match text.to_lowercase().as_str() {
        "list" | "list tasks" | "show tasks" | "what do i have" => {
            return Some(ToolCall::ListTasks { completed: None })
        }
        "list done" | "list completed" => {
            return Some(ToolCall::ListTasks {
                completed: Some(true),
            })
        }
        "list open" | "list pending" | "list todo" => {
            return Some(ToolCall::ListTasks {
                completed: Some(false),
            })
        }
        _ => {}
    }

    enum TitleCommand {
        Complete,
        Delete,
        Show,
    }

    for (prefix, command) in [
        ("complete ", TitleCommand::Complete),
        ("finish ", TitleCommand::Complete),
        ("done ", TitleCommand::Complete),
        ("delete ", TitleCommand::Delete),
        ("remove ", TitleCommand::Delete),
        ("show ", TitleCommand::Show),
    ] {
        if let Some(rest) = strip_prefix_ci(text, prefix) {
            let title = rest.trim();
            if title.is_empty() {
                return None;
            }
            let title = title.to_string();
            return Some(match command {
                TitleCommand::Complete => ToolCall::CompleteTask { title },
                TitleCommand::Delete => ToolCall::DeleteTask { title },
                TitleCommand::Show => ToolCall::ShowTask { title },
            });
        }
    }

    None
}

// ASCII-case-insensitive prefix strip that never splits a UTF-8 character.
fn strip_prefix_ci<'a>(text: &'a str, prefix: &str) -> Option<&'a str> {
    let mut idx = 0;
    let mut chars = text.chars();
    for p in prefix.chars() {
        let c = chars.next()?;
        if c.to_ascii_lowercase() != p {
            return None;
        }
        idx += c.len_utf8();
    }
    Some(&text[idx..])
}

/// Executes one tool call on behalf of a subject
///
/// All reads and writes go through the owner-scoped task queries, so the
/// agent can only ever see or touch the subject's own rows.
pub async fn dispatch(
    pool: &PgPool,
    subject: Uuid,
    call: ToolCall,
) -> Result<ToolOutcome, sqlx::Error> {
    match call {
        ToolCall::CreateTask { title } => {
            let task = Task::create(
                pool,
                CreateTask {
                    user_id: subject,
                    title: truncate_title(&title),
                    description: None,
                },
            )
            .await?;

            Ok(ToolOutcome::for_task(
                format!("Added \"{}\" to your list.", task.title),
                task.id,
            ))
        }

        ToolCall::ListTasks { completed } => {
            let tasks = Task::list_for_owner(
                pool,
                subject,
                TaskFilter {
                    completed,
                    ..TaskFilter::default()
                },
            )
            .await?;

            if tasks.is_empty() {
                return Ok(ToolOutcome::text(match completed {
                    Some(true) => "You have no completed tasks.",
                    Some(false) => "You have no open tasks.",
                    None => "Your list is empty.",
                }));
            }

            let lines: Vec<String> = tasks
                .iter()
                .map(|t| {
                    format!(
                        "{} {}",
                        if t.completed { "[x]" } else { "[ ]" },
                        t.title
                    )
                })
                .collect();

            Ok(ToolOutcome::text(lines.join("\n")))
        }

        ToolCall::ShowTask { title } => {
            match Task::find_by_title_for_owner(pool, subject, &title).await? {
                Some(task) => {
                    let status = if task.completed { "done" } else { "open" };
                    let detail = task
                        .description
                        .as_deref()
                        .map(|d| format!(" ({})", d))
                        .unwrap_or_default();
                    Ok(ToolOutcome::for_task(
                        format!("\"{}\" is {}{}.", task.title, status, detail),
                        task.id,
                    ))
                }
                None => Ok(ToolOutcome::text(not_found_reply(&title))),
            }
        }

        ToolCall::CompleteTask { title } => {
            match Task::find_by_title_for_owner(pool, subject, &title).await? {
                Some(task) => {
                    let patch = UpdateTask {
                        completed: Some(true),
                        ..Default::default()
                    };
                    let updated = Task::update_for_owner(pool, task.id, subject, patch).await?;

                    match updated {
                        Some(task) => Ok(ToolOutcome::for_task(
                            format!("Marked \"{}\" as done.", task.title),
                            task.id,
                        )),
                        None => Ok(ToolOutcome::text(not_found_reply(&title))),
                    }
                }
                None => Ok(ToolOutcome::text(not_found_reply(&title))),
            }
        }

        ToolCall::DeleteTask { title } => {
            match Task::find_by_title_for_owner(pool, subject, &title).await? {
                Some(task) => {
                    let deleted = Task::delete_for_owner(pool, task.id, subject).await?;

                    if deleted {
                        Ok(ToolOutcome::for_task(
                            format!("Deleted \"{}\".", task.title),
                            task.id,
                        ))
                    } else {
                        Ok(ToolOutcome::text(not_found_reply(&title)))
                    }
                }
                None => Ok(ToolOutcome::text(not_found_reply(&title))),
            }
        }
    }
}

fn not_found_reply(title: &str) -> String {
    format!("I couldn't find a task called \"{}\".", title)
}

// Titles entered through chat get clipped instead of rejected.
fn truncate_title(title: &str) -> String {
    title
        .chars()
        .take(ticklist_shared::models::task::MAX_TITLE_LENGTH)
        .collect()
}
