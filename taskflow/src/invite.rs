//! Invite reconciliation flow.
//!
//! One [`InviteFlow`] instance covers one visit to one team's invite link.
//! It joins the user automatically once the session is resolved and the
//! invite info confirms they are not yet a member, while guaranteeing that
//! repeated re-evaluation (fresh data arriving, a re-render racing) and a
//! concurrent manual join can never produce more than one request: the
//! attempt flag is set synchronously before the join task is spawned.
//!
//! The flow is a state machine driven by discrete events — session
//! resolved, invite info arrived, join completed — rather than an implicit
//! "re-run on any change" effect, so the single-dispatch guarantee is
//! explicit and testable.

use std::sync::Arc;

use tokio::sync::oneshot;

use taskflow_proto::team::TeamId;

use crate::api::{Api, MutationOutcome, MutationRequest};
use crate::cache::{ResourceCache, ResourceKey};
use crate::error::ApiError;
use crate::mutation::MutationExecutor;
use crate::session::{Session, SessionStatus, login_redirect};

/// Fallback confirmation when the server sends no message of its own.
const DEFAULT_JOINED_MESSAGE: &str = "You have joined the team.";

/// What the invite view should currently show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InviteStage {
    /// Identity still resolving; show a neutral waiting state.
    ResolvingSession,
    /// Not logged in; navigate to the contained login URL.
    LoginRequired(String),
    /// Waiting for invite info.
    LoadingInfo,
    /// The invite-info fetch failed, with the message explaining why.
    /// Invalidate-and-reread recovers; the flow keeps polling the cache.
    InfoFailed(String),
    /// The fetched info says the user is already a member.
    AlreadyMember,
    /// Not a member yet; the join control is offered.
    NotMember,
    /// A join request is in flight.
    Joining,
    /// Joined during this flow instance, with the confirmation message.
    Joined(String),
    /// The last join attempt failed; manual retry stays available.
    JoinFailed(String),
}

/// Snapshot of the flow for presentation collaborators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InviteView {
    /// Current stage.
    pub stage: InviteStage,
    /// Best-known team name: fetched `team_name` once available, before
    /// that the locally supplied placeholder, if any.
    pub team_name: Option<String>,
    /// Whether the manual join control should be offered.
    pub show_join: bool,
}

/// State machine reconciling automatic and manual team joining.
pub struct InviteFlow<A: Api> {
    team: TeamId,
    key: ResourceKey,
    return_path: String,
    placeholder_name: Option<String>,
    session: Arc<Session>,
    cache: Arc<ResourceCache<A>>,
    executor: Arc<MutationExecutor<A>>,
    /// Set synchronously before any join dispatch; never reset, so the
    /// automatic path fires at most once per flow instance.
    attempted: bool,
    joined: bool,
    message: Option<String>,
    join_error: Option<String>,
    join_rx: Option<oneshot::Receiver<Result<MutationOutcome, ApiError>>>,
}

impl<A: Api> InviteFlow<A> {
    /// Creates a flow for one team's invite link.
    ///
    /// `placeholder_name` is the locally supplied team name from the link's
    /// query string, shown until the fetched name supersedes it.
    #[must_use]
    pub fn new(
        team: TeamId,
        placeholder_name: Option<String>,
        api: Arc<A>,
        cache: Arc<ResourceCache<A>>,
        session: Arc<Session>,
    ) -> Self {
        let return_path = placeholder_name.as_ref().map_or_else(
            || format!("/teams/{team}/join"),
            |name| format!("/teams/{team}/join?name={}", urlencoding::encode(name)),
        );
        let executor = Arc::new(MutationExecutor::new(
            api,
            Arc::clone(&cache),
            Arc::clone(&session),
        ));
        Self {
            team,
            key: ResourceKey::invite_info(team),
            return_path,
            placeholder_name,
            session,
            cache,
            executor,
            attempted: false,
            joined: false,
            message: None,
            join_error: None,
            join_rx: None,
        }
    }

    /// Re-evaluates the flow. Safe to call any number of times.
    ///
    /// Applies a completed join result if one is waiting, keeps the invite
    /// info fetch alive, and dispatches the single automatic join attempt
    /// when its preconditions hold.
    pub fn evaluate(&mut self) {
        self.pump();

        match self.session.status() {
            // No side effect of any kind while identity is unknown, and
            // nothing to do once we know there is no user.
            SessionStatus::Resolving | SessionStatus::Anonymous => return,
            SessionStatus::Authenticated => {}
        }

        let snapshot = self.cache.read(&self.key);
        let Some(info) = snapshot.invite() else {
            return;
        };

        if info.is_member || self.joined || self.attempted || self.join_rx.is_some() {
            return;
        }

        // Flag first, dispatch second: this ordering is what collapses a
        // burst of re-evaluations into exactly one request.
        self.attempted = true;
        tracing::info!(team = %self.team, "dispatching automatic join");
        self.dispatch_join();
    }

    /// Manual join action.
    ///
    /// Ignored while identity is unknown, after a local join success, when
    /// the fetched info already says member, or while a join is in flight.
    pub fn request_join(&mut self) {
        self.pump();

        if !self.session.is_authenticated() || self.joined || self.join_rx.is_some() {
            return;
        }
        let snapshot = self.cache.peek(&self.key);
        let Some(info) = snapshot.invite() else {
            return;
        };
        if info.is_member {
            return;
        }

        // A manual join also takes the attempt flag so a later automatic
        // pass cannot double-fire.
        self.attempted = true;
        tracing::info!(team = %self.team, "dispatching manual join");
        self.dispatch_join();
    }

    /// Awaits an in-flight join, applying its result.
    pub async fn settle(&mut self) {
        if let Some(rx) = self.join_rx.take() {
            if let Ok(result) = rx.await {
                self.apply_join_result(result);
            }
        }
    }

    /// Current view for presentation collaborators.
    #[must_use]
    pub fn view(&self) -> InviteView {
        let snapshot = self.cache.peek(&self.key);
        let info = snapshot.invite();

        let team_name = info
            .map(|i| i.team_name.clone())
            .or_else(|| self.placeholder_name.clone());

        let stage = match self.session.status() {
            SessionStatus::Resolving => InviteStage::ResolvingSession,
            SessionStatus::Anonymous => {
                InviteStage::LoginRequired(login_redirect(&self.return_path))
            }
            SessionStatus::Authenticated => {
                if self.joined {
                    InviteStage::Joined(
                        self.message
                            .clone()
                            .unwrap_or_else(|| DEFAULT_JOINED_MESSAGE.to_string()),
                    )
                } else if info.is_some_and(|i| i.is_member) {
                    InviteStage::AlreadyMember
                } else if self.join_rx.is_some() {
                    InviteStage::Joining
                } else if let Some(error) = &self.join_error {
                    InviteStage::JoinFailed(error.clone())
                } else if info.is_none() {
                    match &snapshot.error {
                        Some(error) => InviteStage::InfoFailed(error.message()),
                        None => InviteStage::LoadingInfo,
                    }
                } else {
                    InviteStage::NotMember
                }
            }
        };

        let show_join = matches!(
            stage,
            InviteStage::NotMember | InviteStage::JoinFailed(_)
        );

        InviteView {
            stage,
            team_name,
            show_join,
        }
    }

    /// Applies a finished join result if one is waiting, without blocking.
    fn pump(&mut self) {
        if let Some(rx) = &mut self.join_rx {
            match rx.try_recv() {
                Ok(result) => {
                    self.join_rx = None;
                    self.apply_join_result(result);
                }
                Err(oneshot::error::TryRecvError::Empty) => {}
                Err(oneshot::error::TryRecvError::Closed) => {
                    self.join_rx = None;
                }
            }
        }
    }

    fn dispatch_join(&mut self) {
        let (tx, rx) = oneshot::channel();
        self.join_rx = Some(rx);
        let executor = Arc::clone(&self.executor);
        let team = self.team;
        tokio::spawn(async move {
            let result = executor
                .mutate_async(MutationRequest::JoinTeam { team })
                .await;
            let _ = tx.send(result);
        });
    }

    fn apply_join_result(&mut self, result: Result<MutationOutcome, ApiError>) {
        match result {
            Ok(outcome) => {
                self.joined = true;
                self.join_error = None;
                let detail = match outcome {
                    MutationOutcome::Joined { detail } => detail,
                    _ => None,
                };
                self.message =
                    Some(detail.unwrap_or_else(|| DEFAULT_JOINED_MESSAGE.to_string()));
                tracing::info!(team = %self.team, "join succeeded");
            }
            Err(err) => {
                self.join_error = Some(err.message());
                tracing::warn!(team = %self.team, error = %err, "join failed");
            }
        }
    }
}

impl<A: Api> Drop for InviteFlow<A> {
    fn drop(&mut self) {
        // A late invite-info response must not land on state nobody is
        // watching anymore.
        self.cache.retire(&self.key);
    }
}
