//! Mutation executor.
//!
//! Applies a single create/update/complete/delete/join intent against the
//! backend, reporting pending/success/failure and invalidating the cache
//! keys whose results the mutation may have changed.
//!
//! One executor stands for one logical user action; its pending flag is
//! what keeps a double-click from producing two network calls.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::api::{Api, MutationOutcome, MutationRequest};
use crate::cache::{ResourceCache, ResourceKey, ResourceKind};
use crate::error::ApiError;
use crate::session::Session;

/// Executes one mutation at a time against the backend.
pub struct MutationExecutor<A: Api> {
    api: Arc<A>,
    cache: Arc<ResourceCache<A>>,
    session: Arc<Session>,
    pending: AtomicBool,
}

impl<A: Api> MutationExecutor<A> {
    /// Creates an executor over the given API, cache, and session handles.
    #[must_use]
    pub const fn new(api: Arc<A>, cache: Arc<ResourceCache<A>>, session: Arc<Session>) -> Self {
        Self {
            api,
            cache,
            session,
            pending: AtomicBool::new(false),
        }
    }

    /// Whether a mutation is currently in flight.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::SeqCst)
    }

    /// Dispatches a mutation and awaits its outcome.
    ///
    /// The pending flag is taken synchronously before any await, so a
    /// second call arriving while the first is in flight fails with a
    /// guard error instead of reaching the wire.
    ///
    /// On success the affected cache keys are invalidated: every task-list
    /// key for task mutations (filter membership can change as a side
    /// effect of the mutation itself, so the conservative policy is to
    /// refetch them all), and the team's invite-info key for joins.
    ///
    /// # Errors
    ///
    /// [`ApiError::Guard`] when the session is not authenticated, a local
    /// precondition fails, or a mutation is already pending; otherwise
    /// whatever the transport reports. Failures leave the cache untouched.
    pub async fn mutate_async(
        &self,
        request: MutationRequest,
    ) -> Result<MutationOutcome, ApiError> {
        if !self.session.allows_requests() {
            return Err(ApiError::Guard(
                "cannot mutate before the session is authenticated".to_string(),
            ));
        }
        validate(&request)?;

        if self
            .pending
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            tracing::debug!("duplicate mutation suppressed while pending");
            return Err(ApiError::Guard("a mutation is already pending".to_string()));
        }

        let result = self.api.execute(&request).await;
        self.pending.store(false, Ordering::SeqCst);

        match result {
            Ok(outcome) => {
                self.invalidate_affected(&request);
                Ok(outcome)
            }
            Err(err) => {
                tracing::warn!(error = %err, "mutation failed");
                Err(err)
            }
        }
    }

    /// Fire-and-forget variant: dispatches in a background task.
    ///
    /// Returns `false` without dispatching when a mutation is already
    /// pending. Failures are logged; callers that need the outcome use
    /// [`mutate_async`](Self::mutate_async).
    pub fn mutate(self: &Arc<Self>, request: MutationRequest) -> bool {
        if self.is_pending() {
            tracing::debug!("duplicate mutation suppressed while pending");
            return false;
        }
        let executor = Arc::clone(self);
        tokio::spawn(async move {
            if let Err(err) = executor.mutate_async(request).await {
                tracing::warn!(error = %err, "background mutation failed");
            }
        });
        true
    }

    fn invalidate_affected(&self, request: &MutationRequest) {
        if request.affects_tasks() {
            self.cache.invalidate_kind(ResourceKind::TaskList);
        }
        if let MutationRequest::JoinTeam { team } = request {
            self.cache.invalidate(&ResourceKey::invite_info(*team));
        }
    }
}

/// Local precondition checks; the UI should prevent all of these, but a
/// violation must fail safely rather than silently.
fn validate(request: &MutationRequest) -> Result<(), ApiError> {
    match request {
        MutationRequest::CreateTask(payload) => {
            if payload.title.trim().is_empty() {
                return Err(ApiError::Guard("task title cannot be empty".to_string()));
            }
        }
        MutationRequest::UpdateTask { id, patch } => {
            if !id.is_valid() {
                return Err(ApiError::Guard("missing task id".to_string()));
            }
            if patch.is_empty() {
                return Err(ApiError::Guard("update carries no changes".to_string()));
            }
        }
        MutationRequest::CompleteTask { id } | MutationRequest::DeleteTask { id } => {
            if !id.is_valid() {
                return Err(ApiError::Guard("missing task id".to_string()));
            }
        }
        MutationRequest::JoinTeam { .. } => {}
    }
    Ok(())
}
