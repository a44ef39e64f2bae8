//! Client core for the issuedesk issue-tracking platform.
//!
//! - [`session`]: authentication state machine backed by a persisted token
//! - [`gate`]: decides whether a view may render for the current session
//! - [`workflow`]: one issue with its comments and feedback, reloaded after every mutation
//! - [`ai`]: advisory AI suggestions and background re-analysis
//! - [`api`]: the REST gateway those components talk through

pub mod ai;
pub mod api;
pub mod commands;
pub mod config;
pub mod db;
pub mod draft;
pub mod error;
pub mod gate;
pub mod interrupt;
pub mod models;
pub mod session;
pub mod workflow;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{ClientError, Result};
