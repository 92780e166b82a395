//! API transport abstraction.
//!
//! Defines the [`Api`] trait the cache and mutation executor are generic
//! over. Concrete implementations:
//! - [`http::HttpApi`] — reqwest-based client for the TaskFlow backend
//! - [`mock::MockApi`] — in-process scripted double for tests

pub mod http;
pub mod mock;

use taskflow_proto::task::{NewTask, Task, TaskId, TaskPatch};
use taskflow_proto::team::TeamId;

use crate::cache::{ResourceKey, ResourceValue};
use crate::error::ApiError;

/// One user intent against one entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationRequest {
    /// Create a task; the backend assigns the id.
    CreateTask(NewTask),
    /// Partially update an existing task.
    UpdateTask {
        /// Id of the task to update.
        id: TaskId,
        /// Fields to change.
        patch: TaskPatch,
    },
    /// Mark an existing task completed without supplying the rest of it.
    CompleteTask {
        /// Id of the task to complete.
        id: TaskId,
    },
    /// Delete an existing task.
    DeleteTask {
        /// Id of the task to delete.
        id: TaskId,
    },
    /// Join a team.
    JoinTeam {
        /// Id of the team to join.
        team: TeamId,
    },
}

impl MutationRequest {
    /// Whether this mutation touches the task-list resources.
    #[must_use]
    pub const fn affects_tasks(&self) -> bool {
        !matches!(self, Self::JoinTeam { .. })
    }
}

/// Result of a successful mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationOutcome {
    /// The created or updated task as the backend now sees it.
    Task(Task),
    /// The task was deleted.
    Deleted,
    /// Joined a team, with the optional server confirmation message.
    Joined {
        /// Server-supplied confirmation, if any.
        detail: Option<String>,
    },
}

impl MutationOutcome {
    /// The returned task, if this outcome carries one.
    #[must_use]
    pub const fn task(&self) -> Option<&Task> {
        match self {
            Self::Task(task) => Some(task),
            _ => None,
        }
    }
}

/// Async backend interface for fetches and mutations.
///
/// Implementations translate resource keys and mutation requests into
/// whatever wire calls they stand for; callers never see transport
/// details, only [`ResourceValue`]s, [`MutationOutcome`]s, and
/// [`ApiError`]s.
pub trait Api: Send + Sync + 'static {
    /// Fetch the current server value for one resource key.
    fn fetch(
        &self,
        key: &ResourceKey,
    ) -> impl std::future::Future<Output = Result<ResourceValue, ApiError>> + Send;

    /// Execute one mutation.
    fn execute(
        &self,
        request: &MutationRequest,
    ) -> impl std::future::Future<Output = Result<MutationOutcome, ApiError>> + Send;
}
