//! Integration tests for the invite reconciliation flow.
//!
//! One flow instance stands for one visit to one invite link. The core
//! guarantee under test: however often the flow is re-evaluated, and
//! however automatic and manual joining interleave, at most one join
//! request ever reaches the wire.
//!
//! Verification command: `cargo test --test invite_flow`

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::sync::Arc;
use std::time::Duration;

use taskflow::api::mock::MockApi;
use taskflow::api::MutationOutcome;
use taskflow::cache::{ResourceCache, ResourceKey};
use taskflow::error::ApiError;
use taskflow::invite::{InviteFlow, InviteStage};
use taskflow::session::Session;
use taskflow_proto::team::{TeamId, TeamInviteInfo};

// =============================================================================
// Test helpers
// =============================================================================

const TEAM: i64 = 42;

fn invite_info(is_member: bool) -> TeamInviteInfo {
    TeamInviteInfo {
        team_name: "Engineering".to_string(),
        team_lead: "alice".to_string(),
        member_count: 7,
        is_member,
    }
}

#[allow(clippy::type_complexity)]
fn setup(
    session: Session,
) -> (
    Arc<MockApi>,
    Arc<ResourceCache<MockApi>>,
    Arc<Session>,
    InviteFlow<MockApi>,
) {
    let api = Arc::new(MockApi::new());
    let session = Arc::new(session);
    let cache = Arc::new(ResourceCache::new(Arc::clone(&api), Arc::clone(&session)));
    let flow = InviteFlow::new(
        TeamId::new(TEAM),
        Some("Eng".to_string()),
        Arc::clone(&api),
        Arc::clone(&cache),
        Arc::clone(&session),
    );
    (api, cache, session, flow)
}

// =============================================================================
// Automatic joining
// =============================================================================

#[tokio::test]
async fn authenticated_non_member_joins_exactly_once() {
    let (api, cache, _session, mut flow) = setup(Session::resolved(true));
    api.set_invite_info(Ok(invite_info(false)));
    api.push_mutation_result(Ok(MutationOutcome::Joined {
        detail: Some("Joined!".to_string()),
    }));

    flow.evaluate();
    cache.wait_idle().await;

    // A burst of re-evaluations (new data, re-renders) collapses into one
    // dispatch.
    for _ in 0..8 {
        flow.evaluate();
    }
    flow.settle().await;

    assert_eq!(api.join_call_count(), 1);
    let view = flow.view();
    assert_eq!(view.stage, InviteStage::Joined("Joined!".to_string()));
    assert!(!view.show_join);

    // Still one dispatch no matter how often the flow runs afterwards.
    for _ in 0..4 {
        flow.evaluate();
    }
    flow.settle().await;
    assert_eq!(api.join_call_count(), 1);
}

#[tokio::test]
async fn join_without_server_detail_uses_the_default_message() {
    let (api, cache, _session, mut flow) = setup(Session::resolved(true));
    api.set_invite_info(Ok(invite_info(false)));
    api.push_mutation_result(Ok(MutationOutcome::Joined { detail: None }));

    flow.evaluate();
    cache.wait_idle().await;
    flow.evaluate();
    flow.settle().await;

    assert_eq!(
        flow.view().stage,
        InviteStage::Joined("You have joined the team.".to_string())
    );
}

#[tokio::test]
async fn existing_member_is_never_joined_again() {
    let (api, cache, _session, mut flow) = setup(Session::resolved(true));
    api.set_invite_info(Ok(invite_info(true)));

    flow.evaluate();
    cache.wait_idle().await;
    for _ in 0..5 {
        flow.evaluate();
    }
    flow.settle().await;

    assert_eq!(api.join_call_count(), 0);
    let view = flow.view();
    assert_eq!(view.stage, InviteStage::AlreadyMember);
    assert!(!view.show_join);
}

#[tokio::test]
async fn join_waits_for_session_resolution() {
    let (api, cache, session, mut flow) = setup(Session::new());
    api.set_invite_info(Ok(invite_info(false)));

    for _ in 0..3 {
        flow.evaluate();
    }
    cache.wait_idle().await;
    assert_eq!(api.fetch_count(), 0);
    assert_eq!(api.join_call_count(), 0);
    assert_eq!(flow.view().stage, InviteStage::ResolvingSession);

    session.resolve(true);
    flow.evaluate();
    cache.wait_idle().await;
    flow.evaluate();
    flow.settle().await;

    assert_eq!(api.invite_fetch_count(), 1);
    assert_eq!(api.join_call_count(), 1);
}

// =============================================================================
// Failure and manual retry
// =============================================================================

#[tokio::test]
async fn failed_join_surfaces_the_field_error_and_stays_manual() {
    let (api, cache, _session, mut flow) = setup(Session::resolved(true));
    api.set_invite_info(Ok(invite_info(false)));
    api.push_mutation_result(Err(ApiError::Api {
        status: 400,
        body: Some(serde_json::json!({"team_id": ["Already requested"]})),
    }));

    flow.evaluate();
    cache.wait_idle().await;
    flow.evaluate();
    flow.settle().await;

    let view = flow.view();
    assert_eq!(
        view.stage,
        InviteStage::JoinFailed("team_id: Already requested".to_string())
    );
    assert!(view.show_join);

    // The automatic path fired its one attempt and never fires again.
    for _ in 0..5 {
        flow.evaluate();
    }
    flow.settle().await;
    assert_eq!(api.join_call_count(), 1);

    // Manual retry goes through and succeeds.
    flow.request_join();
    flow.settle().await;
    assert_eq!(api.join_call_count(), 2);
    assert_eq!(
        flow.view().stage,
        InviteStage::Joined("You have joined the team.".to_string())
    );
}

#[tokio::test]
async fn manual_join_while_in_flight_is_ignored() {
    let (api, cache, _session, mut flow) = setup(Session::resolved(true));
    api.set_invite_info(Ok(invite_info(false)));
    api.push_execute_delay(Duration::from_millis(40));

    flow.evaluate();
    cache.wait_idle().await;
    flow.evaluate();
    assert_eq!(flow.view().stage, InviteStage::Joining);

    flow.request_join();
    flow.evaluate();
    flow.settle().await;

    assert_eq!(api.join_call_count(), 1);
}

// =============================================================================
// Anonymous visitors
// =============================================================================

#[tokio::test]
async fn anonymous_visitor_is_redirected_back_to_the_invite() {
    let (api, cache, _session, mut flow) = setup(Session::resolved(false));

    for _ in 0..3 {
        flow.evaluate();
    }
    cache.wait_idle().await;
    assert_eq!(api.fetch_count(), 0);
    assert_eq!(api.join_call_count(), 0);

    let view = flow.view();
    assert_eq!(
        view.stage,
        InviteStage::LoginRequired("/login?next=%2Fteams%2F42%2Fjoin%3Fname%3DEng".to_string())
    );
    assert!(!view.show_join);
    assert_eq!(view.team_name.as_deref(), Some("Eng"));
}

#[tokio::test]
async fn redirect_omits_the_name_when_the_link_has_none() {
    let api = Arc::new(MockApi::new());
    let session = Arc::new(Session::resolved(false));
    let cache = Arc::new(ResourceCache::new(Arc::clone(&api), Arc::clone(&session)));
    let flow = InviteFlow::new(TeamId::new(7), None, api, cache, session);

    assert_eq!(
        flow.view().stage,
        InviteStage::LoginRequired("/login?next=%2Fteams%2F7%2Fjoin".to_string())
    );
}

// =============================================================================
// Presentation
// =============================================================================

#[tokio::test]
async fn placeholder_name_shows_until_the_fetched_name_supersedes_it() {
    let (api, cache, _session, mut flow) = setup(Session::resolved(true));
    api.set_invite_info(Ok(invite_info(true)));
    api.push_fetch_delay(Duration::from_millis(30));

    flow.evaluate();
    let view = flow.view();
    assert_eq!(view.stage, InviteStage::LoadingInfo);
    assert_eq!(view.team_name.as_deref(), Some("Eng"));

    cache.wait_idle().await;
    let view = flow.view();
    assert_eq!(view.stage, InviteStage::AlreadyMember);
    assert_eq!(view.team_name.as_deref(), Some("Engineering"));
}

#[tokio::test]
async fn failed_info_fetch_surfaces_the_error_and_stays_recoverable() {
    let (api, cache, _session, mut flow) = setup(Session::resolved(true));
    api.set_invite_info(Err(ApiError::Network("down".to_string())));

    flow.evaluate();
    cache.wait_idle().await;
    flow.evaluate();
    flow.settle().await;

    // No info means no automatic join; the view relays the snapshot's
    // fetch error rather than reporting an endless loading state.
    assert_eq!(api.join_call_count(), 0);
    let view = flow.view();
    assert_eq!(view.stage, InviteStage::InfoFailed("down".to_string()));
    assert!(!view.show_join);

    // Recovery: the info arrives after invalidation and the join fires.
    api.set_invite_info(Ok(invite_info(false)));
    cache.invalidate(&ResourceKey::invite_info(TeamId::new(TEAM)));
    flow.evaluate();
    cache.wait_idle().await;
    flow.evaluate();
    flow.settle().await;
    assert_eq!(api.join_call_count(), 1);
}

// =============================================================================
// Teardown
// =============================================================================

#[tokio::test]
async fn dropping_the_flow_discards_its_late_response() {
    let (api, cache, _session, mut flow) = setup(Session::resolved(true));
    api.set_invite_info(Ok(invite_info(false)));
    api.push_fetch_delay(Duration::from_millis(40));

    flow.evaluate();
    drop(flow);
    cache.wait_idle().await;

    let key = ResourceKey::invite_info(TeamId::new(TEAM));
    assert!(cache.peek(&key).data.is_none());
    assert_eq!(api.invite_fetch_count(), 1);
    assert_eq!(api.join_call_count(), 0);
}
