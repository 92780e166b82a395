//! Process-wide resource cache.
//!
//! Maps a [`ResourceKey`] to the most recently fetched server value, a
//! loading flag, and an error flag. Reads never block: they return the
//! current snapshot immediately and, when the entry is missing or stale,
//! issue a background fetch whose result lands on a later read.
//!
//! Ordering is by issuance, not completion: every fetch gets an issue
//! number and a response only applies if no later-issued response has
//! applied already. Retired entries (consumer torn down) discard late
//! responses via an epoch counter.

pub mod key;

pub use key::{ResourceKey, ResourceKind};

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use parking_lot::Mutex;
use tokio::sync::Notify;

use taskflow_proto::task::Task;
use taskflow_proto::team::TeamInviteInfo;

use crate::api::Api;
use crate::error::ApiError;
use crate::session::Session;

/// A fetched server value, one variant per resource kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceValue {
    /// A task list.
    Tasks(Vec<Task>),
    /// Invite info for one team.
    Invite(TeamInviteInfo),
}

impl ResourceValue {
    /// The task list, if this value is one.
    #[must_use]
    pub fn as_tasks(&self) -> Option<&[Task]> {
        match self {
            Self::Tasks(tasks) => Some(tasks),
            Self::Invite(_) => None,
        }
    }

    /// The invite info, if this value is one.
    #[must_use]
    pub const fn as_invite(&self) -> Option<&TeamInviteInfo> {
        match self {
            Self::Invite(info) => Some(info),
            Self::Tasks(_) => None,
        }
    }
}

/// Read-only view of one cache entry at one point in time.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    /// Last known server value, if any. Retained while a refetch is in
    /// flight so consumers never flash back to empty.
    pub data: Option<ResourceValue>,
    /// Whether a fetch for this key is currently in flight.
    pub is_loading: bool,
    /// Error recorded by the most recent failed fetch, if any.
    pub error: Option<ApiError>,
}

impl Snapshot {
    /// The empty snapshot returned for gated reads.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            data: None,
            is_loading: false,
            error: None,
        }
    }

    /// Convenience accessor for task-list snapshots.
    #[must_use]
    pub fn tasks(&self) -> Option<&[Task]> {
        self.data.as_ref().and_then(ResourceValue::as_tasks)
    }

    /// Convenience accessor for invite-info snapshots.
    #[must_use]
    pub fn invite(&self) -> Option<&TeamInviteInfo> {
        self.data.as_ref().and_then(ResourceValue::as_invite)
    }
}

#[derive(Debug)]
struct Entry {
    /// Lifetime marker; a retired-then-recreated key gets a new epoch, so
    /// responses issued against the old one are discarded.
    epoch: u64,
    data: Option<ResourceValue>,
    error: Option<ApiError>,
    /// Set on creation and by `invalidate`; cleared when a fetch is issued.
    needs_fetch: bool,
    /// Issue number of the most recently dispatched fetch.
    issued: u64,
    /// Highest issue number whose response has been applied.
    applied: u64,
}

impl Entry {
    const fn new(epoch: u64) -> Self {
        Self {
            epoch,
            data: None,
            error: None,
            needs_fetch: true,
            issued: 0,
            applied: 0,
        }
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            data: self.data.clone(),
            is_loading: self.issued > self.applied,
            error: self.error.clone(),
        }
    }
}

/// Process-wide cache of server resources, shared by all consumers.
///
/// Construct once at application start behind an [`Arc`] and hand the
/// handle to every component; tests build a fresh one per case.
pub struct ResourceCache<A: Api> {
    api: Arc<A>,
    session: Arc<Session>,
    entries: Mutex<HashMap<ResourceKey, Entry>>,
    next_epoch: AtomicU64,
    inflight: AtomicUsize,
    idle: Notify,
}

impl<A: Api> ResourceCache<A> {
    /// Creates a cache over the given API handle, gated by `session`.
    #[must_use]
    pub fn new(api: Arc<A>, session: Arc<Session>) -> Self {
        Self {
            api,
            session,
            entries: Mutex::new(HashMap::new()),
            next_epoch: AtomicU64::new(0),
            inflight: AtomicUsize::new(0),
            idle: Notify::new(),
        }
    }

    /// Returns the current snapshot for `key`, fetching in the background
    /// when no fresh value exists.
    ///
    /// While the session is resolving or unauthenticated this dispatches
    /// nothing and returns the empty snapshot: a gated query is never
    /// started, not started-then-cancelled.
    pub fn read(self: &Arc<Self>, key: &ResourceKey) -> Snapshot {
        if !self.session.allows_requests() {
            return Snapshot::empty();
        }

        let mut entries = self.entries.lock();
        let entry = entries.entry(key.clone()).or_insert_with(|| {
            Entry::new(self.next_epoch.fetch_add(1, Ordering::Relaxed))
        });

        if entry.needs_fetch {
            entry.needs_fetch = false;
            entry.issued += 1;
            let issue = entry.issued;
            let epoch = entry.epoch;
            self.inflight.fetch_add(1, Ordering::SeqCst);
            tracing::debug!(%key, issue, "issuing fetch");

            let cache = Arc::clone(self);
            let api = Arc::clone(&self.api);
            let key = key.clone();
            tokio::spawn(async move {
                let result = api.fetch(&key).await;
                cache.apply_fetch(&key, epoch, issue, result);
            });
        }

        entry.snapshot()
    }

    /// Returns the current snapshot without triggering a fetch.
    #[must_use]
    pub fn peek(&self, key: &ResourceKey) -> Snapshot {
        if !self.session.allows_requests() {
            return Snapshot::empty();
        }
        self.entries
            .lock()
            .get(key)
            .map_or_else(Snapshot::empty, Entry::snapshot)
    }

    /// Marks `key` stale: the next read refetches, but the last known
    /// value stays visible until the refetch lands.
    pub fn invalidate(&self, key: &ResourceKey) {
        if let Some(entry) = self.entries.lock().get_mut(key) {
            entry.needs_fetch = true;
            tracing::debug!(%key, "invalidated");
        }
    }

    /// Marks every cached key of the given kind stale.
    pub fn invalidate_kind(&self, kind: ResourceKind) {
        let mut entries = self.entries.lock();
        let mut count = 0usize;
        for (key, entry) in entries.iter_mut() {
            if key.kind() == kind {
                entry.needs_fetch = true;
                count += 1;
            }
        }
        if count > 0 {
            tracing::debug!(?kind, count, "invalidated by kind");
        }
    }

    /// Drops the entry for `key`.
    ///
    /// Called when the last consumer of a key is torn down. Any in-flight
    /// response for the old entry is discarded on arrival instead of being
    /// applied to state nobody is watching.
    pub fn retire(&self, key: &ResourceKey) {
        if self.entries.lock().remove(key).is_some() {
            tracing::debug!(%key, "retired");
        }
    }

    /// Waits until no fetch is in flight.
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.idle.notified();
            tokio::pin!(notified);
            // Register interest before checking the counter; a fetch that
            // completes between the check and the await would otherwise
            // notify nobody and park this task forever.
            notified.as_mut().enable();
            if self.inflight.load(Ordering::SeqCst) == 0 {
                return;
            }
            notified.await;
        }
    }

    /// Applies a completed fetch, honoring issuance order and epochs.
    fn apply_fetch(
        &self,
        key: &ResourceKey,
        epoch: u64,
        issue: u64,
        result: Result<ResourceValue, ApiError>,
    ) {
        {
            let mut entries = self.entries.lock();
            match entries.get_mut(key) {
                Some(entry) if entry.epoch == epoch && issue > entry.applied => {
                    entry.applied = issue;
                    match result {
                        Ok(value) => {
                            entry.data = Some(value);
                            entry.error = None;
                        }
                        Err(err) => {
                            tracing::warn!(%key, error = %err, "fetch failed");
                            entry.error = Some(err);
                        }
                    }
                }
                Some(_) => {
                    tracing::debug!(%key, issue, "discarding out-of-order response");
                }
                None => {
                    tracing::debug!(%key, issue, "discarding response for retired entry");
                }
            }
        }

        if self.inflight.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.idle.notify_waiters();
        }
    }
}
