//! Team invite wire shapes.

use serde::{Deserialize, Serialize};

/// Backend-assigned team identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TeamId(i64);

impl TeamId {
    /// Wraps a raw identifier received from the backend (or a URL).
    #[must_use]
    pub const fn new(raw: i64) -> Self {
        Self(raw)
    }

    /// Returns the raw identifier value.
    #[must_use]
    pub const fn as_i64(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for TeamId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Invite-info response for a team, read-only from the client's side.
///
/// `is_member` is the authoritative membership flag: once a fresh fetch is
/// available it overrides any locally recorded "joined" state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamInviteInfo {
    /// Display name of the team.
    pub team_name: String,
    /// Username of the team lead.
    pub team_lead: String,
    /// Current member count.
    pub member_count: u32,
    /// Whether the requesting user is already a member.
    pub is_member: bool,
}

/// Join-endpoint response. The confirmation message is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinResponse {
    /// Server-supplied confirmation message, if any.
    #[serde(default)]
    pub detail: Option<String>,
}
