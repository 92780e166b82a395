//! Shared wire-shape definitions for the TaskFlow API client.

pub mod filter;
pub mod task;
pub mod team;
