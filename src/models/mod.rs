//! Data models for the Ops Manager public API.
//!
//! This module contains type definitions for projects, users, automation
//! configurations, hosts, agents and backup configurations, plus the
//! pagination envelope shared by collection endpoints.

mod agent;
mod automation;
mod backup;
mod common;
mod host;
mod project;
mod user;

pub use agent::*;
pub use automation::*;
pub use backup::*;
pub use common::*;
pub use host::*;
pub use project::*;
pub use user::*;
