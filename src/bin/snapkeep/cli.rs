use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use snapkeep::Tier;

/// Local snapshot manager for project state
#[derive(Parser, Debug)]
#[command(name = "snapkeep", version, about = "Tiered local snapshots with retention")]
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Cmd,
}

/// Options shared by every subcommand.
#[derive(Args, Debug, Clone)]
pub struct StoreArgs {
    /// Snapshot store directory (created if missing)
    #[arg(long)]
    pub path: PathBuf,
    /// Live state JSON document (captured from / restored into)
    #[arg(long)]
    pub state: Option<PathBuf>,
    /// JSON config file (camelCase keys); SNAPKEEP_* env vars override it
    #[arg(long)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Cmd {
    /// Capture a manual snapshot of the live state
    Create {
        #[command(flatten)]
        store: StoreArgs,
        /// Required, non-empty
        #[arg(long, short = 'd')]
        description: String,
    },
    /// Capture an auto or safety snapshot right now
    Capture {
        #[command(flatten)]
        store: StoreArgs,
        #[arg(long, default_value = "auto")]
        tier: Tier,
    },
    /// List snapshots, newest first
    List {
        #[command(flatten)]
        store: StoreArgs,
        /// Only this tier (auto|safety|manual|imported)
        #[arg(long)]
        tier: Option<Tier>,
        /// JSON output (array)
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Restore a snapshot into the live state document
    Restore {
        #[command(flatten)]
        store: StoreArgs,
        #[arg(long)]
        key: String,
    },
    /// Delete one snapshot
    Delete {
        #[command(flatten)]
        store: StoreArgs,
        #[arg(long)]
        key: String,
    },
    /// Export a snapshot record verbatim
    ///
    /// Without --out the file lands in the current directory as
    /// snapshot-<tier>-<YYYYMMDD-HHMMSS>.json. --out - writes to stdout.
    Export {
        #[command(flatten)]
        store: StoreArgs,
        #[arg(long)]
        key: String,
        /// Output file or directory, or '-' for stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Import an exported snapshot file (stored under the 'imported' tier)
    Import {
        #[command(flatten)]
        store: StoreArgs,
        #[arg(long)]
        file: PathBuf,
    },
    /// Store summary: counts per tier, total size, last manual backup
    Stats {
        #[command(flatten)]
        store: StoreArgs,
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Integrity scan: missing payloads, malformed records, checksum mismatches, orphans
    Check {
        #[command(flatten)]
        store: StoreArgs,
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Enforce retention caps on every tier (after lowering a cap)
    Cleanup {
        #[command(flatten)]
        store: StoreArgs,
    },
    /// Run the periodic scheduler in the foreground
    ///
    /// Runs for --seconds, or until stdin is closed when --seconds is 0.
    Watch {
        #[command(flatten)]
        store: StoreArgs,
        #[arg(long, default_value_t = 0)]
        seconds: u64,
    },
}
