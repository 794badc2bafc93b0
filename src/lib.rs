//! Crate entry point for **cngit**.
//!
//! This library provides the internal implementation for the `cngit` CLI.
//! Each submodule encapsulates one responsibility (config parsing, git
//! operations, snapshot reconciliation, etc.).
//! The `pub use` re-exports make selected commands accessible directly from
//! the crate root.
//!
//! This file is primarily intended for developers hacking on `cngit`.

mod check;
mod clone;
mod config;
mod git;
mod paths;
mod pull;
mod snapshot;

/// Re-export commonly used types and commands so they can be accessed from `cngit::*`.
pub use check::cmd_check;
pub use clone::cmd_clone;
pub use config::Config;
pub use paths::cngit_home;
pub use pull::cmd_pull;
pub use snapshot::{FileNode, GitNode, Snapshot, cmd_apply_snapshot};
