//! # ccpctl
//!
//! Command-line client for the cluster control plane.
//!
//! Provides commands for:
//! - Logging in and storing the session token
//! - Managing stored defaults (control plane, SSH, vSphere infrastructure)
//! - Creating, scaling and deleting tenant clusters
//! - Looking up providers, subnets and ACI profiles
//! - Installing and removing cluster add-ons
//!
//! # Architecture
//!
//! Defaults live in a JSON file managed by `ccp-config`. A [`Connection`]
//! builds a `ccp-client` session from them, reuses the stored token while it
//! is fresh, and writes a newly issued token back to the file.
//!
//! ```text
//! ┌──────────┐   defaults    ┌─────────────┐    HTTPS     ┌───────────────┐
//! │  ccpctl  │──────────────►│ ccp-client  │─────────────►│ control plane │
//! └──────────┘  ~/.ccpctl.json └─────────────┘ X-Auth-Token └───────────────┘
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cli;
pub mod commands;
pub mod connection;
pub mod error;
pub mod output;

#[cfg(test)]
mod testing;

pub use cli::{Cli, ClusterCommands, Commands, Format};
pub use connection::Connection;
pub use error::CliError;
pub use output::OutputFormat;
