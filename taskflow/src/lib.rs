//! TaskFlow client — state synchronization against the TaskFlow API.
//!
//! Keeps a local view of server-owned entities (tasks, team memberships,
//! invitations) consistent with the backend: a session gate, a shared
//! resource cache with explicit invalidation, a mutation executor, and the
//! invite reconciliation flow that joins a team exactly once.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod invite;
pub mod mutation;
pub mod session;
