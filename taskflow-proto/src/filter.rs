//! Client-side task list filters.
//!
//! A [`TaskFilter`] is a pure query parameter: never persisted, and part of
//! the cache key for the tasks-list resource. Its parameter projection is
//! the canonical form used both for cache-key derivation and for the HTTP
//! query string, so two filters with the same fields always collide on one
//! cache entry.

use serde::{Deserialize, Serialize};

use crate::task::{TaskPriority, TaskStatus};

/// Optional status/priority filter for the tasks-list query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskFilter {
    /// Only tasks with this status.
    #[serde(default)]
    pub status: Option<TaskStatus>,
    /// Only tasks with this priority.
    #[serde(default)]
    pub priority: Option<TaskPriority>,
}

impl TaskFilter {
    /// A filter that matches everything.
    #[must_use]
    pub const fn all() -> Self {
        Self {
            status: None,
            priority: None,
        }
    }

    /// Projects the populated fields as `(name, value)` parameter pairs.
    ///
    /// The projection is keyed by field name, so parameter order as typed
    /// by a caller never matters downstream.
    #[must_use]
    pub fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(status) = self.status {
            params.push(("status", status.as_str().to_string()));
        }
        if let Some(priority) = self.priority {
            params.push(("priority", priority.as_str().to_string()));
        }
        params
    }
}
