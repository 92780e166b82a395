//! Task wire shapes for the TaskFlow API.
//!
//! Defines the server-owned [`Task`] entity, the create/update payloads,
//! and the list-response envelope. The backend assigns every [`TaskId`];
//! the client never fabricates one.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Backend-assigned task identifier.
///
/// Opaque from the client's perspective: it is received from the server,
/// carried around, and sent back on mutations, never invented locally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(i64);

impl TaskId {
    /// Wraps a raw identifier received from the backend.
    #[must_use]
    pub const fn new(raw: i64) -> Self {
        Self(raw)
    }

    /// Returns the raw identifier value.
    #[must_use]
    pub const fn as_i64(&self) -> i64 {
        self.0
    }

    /// Whether this looks like a real backend id.
    ///
    /// The backend never issues non-positive ids, so anything else is a
    /// placeholder that must not reach the wire.
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.0 > 0
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Task priority levels, matching the backend enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    /// Can wait.
    Low,
    /// Default priority.
    Medium,
    /// Should be picked up soon.
    High,
    /// Drop everything.
    Urgent,
}

impl TaskPriority {
    /// Wire value for query parameters.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Urgent => "urgent",
        }
    }
}

impl std::fmt::Display for TaskPriority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TaskPriority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "urgent" => Ok(Self::Urgent),
            other => Err(format!("unknown priority: {other}")),
        }
    }
}

/// Task workflow status, matching the backend enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    /// Not started.
    Todo,
    /// In progress.
    Progress,
    /// Awaiting review.
    Review,
    /// Finished.
    Done,
}

impl TaskStatus {
    /// Wire value for query parameters.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Todo => "todo",
            Self::Progress => "progress",
            Self::Review => "review",
            Self::Done => "done",
        }
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "todo" => Ok(Self::Todo),
            "progress" => Ok(Self::Progress),
            "review" => Ok(Self::Review),
            "done" => Ok(Self::Done),
            other => Err(format!("unknown status: {other}")),
        }
    }
}

/// The user responsible for a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Responsible {
    /// Username of the responsible user.
    pub username: String,
}

/// A server-owned task.
///
/// Identity is the `id` field; every other field is mutable on the backend
/// via the mutation endpoints. The client treats this as a snapshot of the
/// server's truth, refreshed through cache invalidation rather than edited
/// in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Backend-assigned identifier.
    pub id: TaskId,
    /// Task title.
    pub title: String,
    /// Priority level.
    pub priority: TaskPriority,
    /// Workflow status.
    pub status: TaskStatus,
    /// Whether the task has been completed.
    pub is_completed: bool,
    /// Optional due date.
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    /// Optional responsible user.
    #[serde(default)]
    pub responsible: Option<Responsible>,
}

/// Payload for creating a task (the [`Task`] shape minus `id`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTask {
    /// Task title.
    pub title: String,
    /// Priority level.
    pub priority: TaskPriority,
    /// Workflow status.
    pub status: TaskStatus,
    /// Optional due date.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
}

/// Partial update payload for an existing task.
///
/// Only the populated fields are sent; the backend leaves the rest
/// untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskPatch {
    /// New title, if changing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// New priority, if changing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<TaskPriority>,
    /// New status, if changing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    /// New completion flag, if changing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_completed: Option<bool>,
    /// New due date, if changing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
}

impl TaskPatch {
    /// Whether the patch carries no changes at all.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.priority.is_none()
            && self.status.is_none()
            && self.is_completed.is_none()
            && self.due_date.is_none()
    }
}

/// List-endpoint response: either a bare array or a pagination envelope.
///
/// The backend returns `[...]` for unpaginated queries and
/// `{"results": [...]}` once pagination is enabled; the client accepts
/// both without caring which.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum TaskListResponse {
    /// Pagination envelope with a `results` array.
    Envelope {
        /// The page of tasks.
        results: Vec<Task>,
    },
    /// Bare array of tasks.
    Bare(Vec<Task>),
}

impl TaskListResponse {
    /// Unwraps the task list regardless of envelope shape.
    #[must_use]
    pub fn into_tasks(self) -> Vec<Task> {
        match self {
            Self::Envelope { results } => results,
            Self::Bare(tasks) => tasks,
        }
    }
}
