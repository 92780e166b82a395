//! In-process [`Api`] double for tests.
//!
//! Responses are scripted FIFO; every call is counted and logged so tests
//! can assert exactly how many network dispatches a scenario produced.
//! Optional per-call delays let tests stage out-of-order completions.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use parking_lot::Mutex;

use taskflow_proto::task::{Task, TaskId, TaskPriority, TaskStatus};
use taskflow_proto::team::TeamInviteInfo;

use crate::cache::{ResourceKey, ResourceKind, ResourceValue};
use crate::error::ApiError;

use super::{Api, MutationOutcome, MutationRequest};

#[derive(Default)]
struct MockState {
    task_lists: VecDeque<Result<Vec<Task>, ApiError>>,
    invite_info: Option<Result<TeamInviteInfo, ApiError>>,
    mutation_results: VecDeque<Result<MutationOutcome, ApiError>>,
    fetch_delays: VecDeque<Duration>,
    execute_delays: VecDeque<Duration>,
    fetched_keys: Vec<ResourceKey>,
    requests: Vec<MutationRequest>,
    created: i64,
}

/// Scripted API double.
///
/// Unscripted task-list fetches return an empty list; unscripted mutations
/// synthesize a plausible success so most tests only script what they
/// assert on.
#[derive(Default)]
pub struct MockApi {
    state: Mutex<MockState>,
    list_fetches: AtomicUsize,
    invite_fetches: AtomicUsize,
    join_calls: AtomicUsize,
    executes: AtomicUsize,
}

impl MockApi {
    /// Creates an empty mock.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Scripts the invite-info response (cloned for every fetch).
    pub fn set_invite_info(&self, result: Result<TeamInviteInfo, ApiError>) {
        self.state.lock().invite_info = Some(result);
    }

    /// Queues a task-list fetch response.
    pub fn push_task_list(&self, result: Result<Vec<Task>, ApiError>) {
        self.state.lock().task_lists.push_back(result);
    }

    /// Queues a result for the next mutation.
    pub fn push_mutation_result(&self, result: Result<MutationOutcome, ApiError>) {
        self.state.lock().mutation_results.push_back(result);
    }

    /// Queues a delay applied to the next fetch before it completes.
    pub fn push_fetch_delay(&self, delay: Duration) {
        self.state.lock().fetch_delays.push_back(delay);
    }

    /// Queues a delay applied to the next mutation before it completes.
    pub fn push_execute_delay(&self, delay: Duration) {
        self.state.lock().execute_delays.push_back(delay);
    }

    /// Number of task-list fetches dispatched.
    #[must_use]
    pub fn list_fetch_count(&self) -> usize {
        self.list_fetches.load(Ordering::SeqCst)
    }

    /// Number of invite-info fetches dispatched.
    #[must_use]
    pub fn invite_fetch_count(&self) -> usize {
        self.invite_fetches.load(Ordering::SeqCst)
    }

    /// Number of join calls dispatched.
    #[must_use]
    pub fn join_call_count(&self) -> usize {
        self.join_calls.load(Ordering::SeqCst)
    }

    /// Total mutations dispatched.
    #[must_use]
    pub fn execute_count(&self) -> usize {
        self.executes.load(Ordering::SeqCst)
    }

    /// Total fetches dispatched, of any kind.
    #[must_use]
    pub fn fetch_count(&self) -> usize {
        self.list_fetch_count() + self.invite_fetch_count()
    }

    /// Every key fetched so far, in dispatch order.
    #[must_use]
    pub fn fetched_keys(&self) -> Vec<ResourceKey> {
        self.state.lock().fetched_keys.clone()
    }

    /// Every mutation request seen so far, in dispatch order.
    #[must_use]
    pub fn requests(&self) -> Vec<MutationRequest> {
        self.state.lock().requests.clone()
    }

    fn synthesize(request: &MutationRequest, state: &mut MockState) -> MutationOutcome {
        match request {
            MutationRequest::CreateTask(payload) => {
                state.created += 1;
                MutationOutcome::Task(Task {
                    id: TaskId::new(1000 + state.created),
                    title: payload.title.clone(),
                    priority: payload.priority,
                    status: payload.status,
                    is_completed: false,
                    due_date: payload.due_date,
                    responsible: None,
                })
            }
            MutationRequest::UpdateTask { id, patch } => MutationOutcome::Task(Task {
                id: *id,
                title: patch.title.clone().unwrap_or_else(|| "task".to_string()),
                priority: patch.priority.unwrap_or(TaskPriority::Medium),
                status: patch.status.unwrap_or(TaskStatus::Todo),
                is_completed: patch.is_completed.unwrap_or(false),
                due_date: patch.due_date,
                responsible: None,
            }),
            MutationRequest::CompleteTask { id } => MutationOutcome::Task(Task {
                id: *id,
                title: "task".to_string(),
                priority: TaskPriority::Medium,
                status: TaskStatus::Done,
                is_completed: true,
                due_date: None,
                responsible: None,
            }),
            MutationRequest::DeleteTask { .. } => MutationOutcome::Deleted,
            MutationRequest::JoinTeam { .. } => MutationOutcome::Joined { detail: None },
        }
    }
}

impl Api for MockApi {
    async fn fetch(&self, key: &ResourceKey) -> Result<ResourceValue, ApiError> {
        let (delay, result) = {
            let mut state = self.state.lock();
            state.fetched_keys.push(key.clone());
            let delay = state.fetch_delays.pop_front();
            let result = match key.kind() {
                ResourceKind::TaskList => {
                    self.list_fetches.fetch_add(1, Ordering::SeqCst);
                    state
                        .task_lists
                        .pop_front()
                        .unwrap_or_else(|| Ok(Vec::new()))
                        .map(ResourceValue::Tasks)
                }
                ResourceKind::InviteInfo => {
                    self.invite_fetches.fetch_add(1, Ordering::SeqCst);
                    state
                        .invite_info
                        .clone()
                        .unwrap_or_else(|| {
                            Err(ApiError::Guard("no invite info scripted".to_string()))
                        })
                        .map(ResourceValue::Invite)
                }
            };
            (delay, result)
        };

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        result
    }

    async fn execute(&self, request: &MutationRequest) -> Result<MutationOutcome, ApiError> {
        self.executes.fetch_add(1, Ordering::SeqCst);
        if matches!(request, MutationRequest::JoinTeam { .. }) {
            self.join_calls.fetch_add(1, Ordering::SeqCst);
        }

        let (delay, result) = {
            let mut state = self.state.lock();
            state.requests.push(request.clone());
            let delay = state.execute_delays.pop_front();
            let result = state
                .mutation_results
                .pop_front()
                .unwrap_or_else(|| Ok(Self::synthesize(request, &mut state)));
            (delay, result)
        };

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        result
    }
}
