//! Canonical resource keys.
//!
//! A key identifies one fetchable query: a resource kind plus its
//! normalized parameters. Parameters live in a `BTreeMap`, so two keys
//! built from the same parameters in any order compare (and hash) equal
//! and collide on one cache entry.

use std::collections::BTreeMap;

use taskflow_proto::filter::TaskFilter;
use taskflow_proto::team::TeamId;

/// Parameter name carrying the team id for invite-info keys.
const TEAM_PARAM: &str = "team";

/// The kinds of fetchable resources the cache knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    /// Filtered task list.
    TaskList,
    /// Invite info for one team.
    InviteInfo,
}

/// Canonical identifier for one fetchable query.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceKey {
    kind: ResourceKind,
    params: BTreeMap<String, String>,
}

impl ResourceKey {
    /// Key for the tasks-list query under the given filter.
    #[must_use]
    pub fn task_list(filter: &TaskFilter) -> Self {
        Self::from_params(ResourceKind::TaskList, filter.params())
    }

    /// Key for a team's invite-info query.
    #[must_use]
    pub fn invite_info(team: TeamId) -> Self {
        Self::from_params(ResourceKind::InviteInfo, [(TEAM_PARAM, team.to_string())])
    }

    /// Builds a key from raw parameter pairs.
    ///
    /// Duplicate names keep the last value; insertion order is irrelevant.
    pub fn from_params<N, I>(kind: ResourceKind, params: I) -> Self
    where
        N: Into<String>,
        I: IntoIterator<Item = (N, String)>,
    {
        Self {
            kind,
            params: params
                .into_iter()
                .map(|(name, value)| (name.into(), value))
                .collect(),
        }
    }

    /// The resource kind this key addresses.
    #[must_use]
    pub const fn kind(&self) -> ResourceKind {
        self.kind
    }

    /// Looks up one parameter value.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    /// Iterates the parameters in canonical (name-sorted) order.
    pub fn params(&self) -> impl Iterator<Item = (&str, &str)> {
        self.params
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    /// The team id for invite-info keys, if present and well-formed.
    #[must_use]
    pub fn team(&self) -> Option<TeamId> {
        self.param(TEAM_PARAM)?.parse().ok().map(TeamId::new)
    }
}

impl std::fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.kind {
            ResourceKind::TaskList => write!(f, "tasks")?,
            ResourceKind::InviteInfo => write!(f, "invite-info")?,
        }
        for (name, value) in &self.params {
            write!(f, " {name}={value}")?;
        }
        Ok(())
    }
}
