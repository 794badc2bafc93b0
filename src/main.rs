//! # cngit
//!
//! **cngit** is a git helper for custom node repositories: the plugin
//! checkouts of an extensible application.
//!
//! Features:
//! - `cngit clone` clones a node repository into the nodes directory
//! - `cngit check` / `cngit fetch` report whether a node is behind its remote
//! - `cngit pull` updates a node from origin (stashing local edits first)
//! - `cngit apply-snapshot` restores node states from a snapshot manifest
//! - `cngit home` prints the cngit home directory
//!
//! Results are emitted as sentinel lines on stdout (`CUSTOM NODE CHECK:
//! True`, `APPLY SNAPSHOT: False`, ...) so the calling application can
//! parse them; diagnostics go to stderr.
//!
//! This CLI is built with [clap](https://docs.rs/clap).

use anyhow::Result;
use clap::{Parser, Subcommand};
use cngit::{cmd_apply_snapshot, cmd_check, cmd_clone, cmd_pull, cngit_home};
use std::path::PathBuf;

/// Command-line interface definition.
///
/// Parsed using `clap` derive macros.
#[derive(Parser, Debug)]
#[command(
    name = "cngit",
    version,
    about = "cngit - git helper for custom node repositories",
    arg_required_else_help = true
)]
struct Cli {
    #[command(subcommand)]
    cmd: Cmd,
}

/// Available subcommands.
///
/// Each variant corresponds to a subcommand of `cngit`.
#[derive(Subcommand, Debug)]
enum Cmd {
    /// Clone a custom node repository into the nodes directory
    Clone {
        /// Directory that holds custom node checkouts
        nodes_dir: PathBuf,
        /// Repository URL
        url: String,
        /// Commit hash to check out after cloning
        #[arg(long)]
        hash: Option<String>,
    },
    /// Report whether a node repository is behind its remote
    Check {
        /// Path to the node checkout
        path: PathBuf,
    },
    /// Fetch from origin, then report whether the repository is behind
    Fetch {
        /// Path to the node checkout
        path: PathBuf,
    },
    /// Update a node repository from origin
    Pull {
        /// Path to the node checkout
        path: PathBuf,
    },
    /// Restore application and node states from a snapshot manifest
    ApplySnapshot {
        /// Snapshot name (looked up under the snapshots directory) or a
        /// path to a manifest file
        target: String,
        /// Directory that holds custom node checkouts
        #[arg(long)]
        nodes_dir: Option<PathBuf>,
        /// Application repository checkout
        #[arg(long)]
        app_dir: Option<PathBuf>,
    },
    /// Print the cngit home directory
    Home,
}

/// CLI entry point.
///
/// Parses arguments with `clap` and executes the selected subcommand.
fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.cmd {
        Cmd::Clone {
            nodes_dir,
            url,
            hash,
        } => cmd_clone(&nodes_dir, &url, hash.as_deref()),
        Cmd::Check { path } => cmd_check(&path, false),
        Cmd::Fetch { path } => cmd_check(&path, true),
        Cmd::Pull { path } => cmd_pull(&path),
        Cmd::ApplySnapshot {
            target,
            nodes_dir,
            app_dir,
        } => cmd_apply_snapshot(&target, nodes_dir.as_deref(), app_dir.as_deref()),
        Cmd::Home => {
            println!("{}", cngit_home()?.display());
            Ok(())
        }
    }
}
