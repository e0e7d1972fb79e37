use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use clap::{Args, Parser, Subcommand};
use herald_core::{Identity, Scope};

/// Command line options for the herald CLI
#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
pub struct Opts {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub cmd: OptsCmd,
}

/// Options that apply to all commands
#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Directory holding notification snapshots
    #[arg(env = "HERALD_DATA_DIR", long)]
    pub data_dir: Option<PathBuf>,
}

static PROJECT_DIRS: LazyLock<Option<directories::ProjectDirs>> =
    LazyLock::new(|| directories::ProjectDirs::from("org", "Herald", "herald"));

impl GlobalOpts {
    /// `--data-dir`, or the platform cache dir
    pub fn data_dir(&self) -> Option<&Path> {
        self.data_dir
            .as_deref()
            .or_else(|| PROJECT_DIRS.as_ref().map(|dirs| dirs.cache_dir()))
    }
}

#[derive(Debug, Subcommand)]
pub enum OptsCmd {
    /// Inspect and manage cached notification snapshots
    #[command(subcommand)]
    Cache(CacheCmd),
}

/// Which snapshot to operate on
#[derive(Debug, Args)]
pub struct SnapshotOpts {
    /// Account the snapshot belongs to, as `<account_id>@<domain>`
    #[arg(long)]
    pub identity: Identity,

    /// `everything` or `mentions`
    #[arg(long, default_value = "everything")]
    pub scope: Scope,
}

#[derive(Debug, Subcommand)]
pub enum CacheCmd {
    /// Print the cached notifications as JSON
    Show(SnapshotOpts),
    /// Delete the snapshot
    Clear(SnapshotOpts),
    /// Print the path of the snapshot file
    Path(SnapshotOpts),
}
