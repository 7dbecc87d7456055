use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

use salvager::{Notifier, Pager, SalvageConfig};

/// Read-only salvage CLI for SQLite-format databases
#[derive(Parser, Debug)]
#[command(name = "salvager", version, about = "salvager CLI")]
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Cmd,
}

/// Flags shared by every subcommand; env fallbacks come from
/// SalvageConfig::from_env (SALVAGE_WAL_OPTIONAL, SALVAGE_MAX_WAL_FRAME).
#[derive(Args, Debug, Clone)]
pub struct PagerOpts {
    #[arg(long)]
    pub path: PathBuf,
    /// Fixed page size (skips header discovery)
    #[arg(long)]
    pub page_size: Option<u32>,
    /// Fixed reserved-byte count (skips header discovery)
    #[arg(long)]
    pub reserved_bytes: Option<u8>,
    /// Discard a corrupt WAL instead of failing initialization
    #[arg(long, default_value_t = false)]
    pub wal_optional: bool,
    /// Trust at most this many WAL frames
    #[arg(long)]
    pub max_wal_frame: Option<u32>,
}

impl PagerOpts {
    /// Build a pager (not yet initialized) plus its notifier.
    pub fn build(&self) -> (Arc<Notifier>, Pager) {
        let mut cfg = SalvageConfig::from_env();
        if let Some(ps) = self.page_size {
            cfg = cfg.page_size(ps);
        }
        if let Some(rb) = self.reserved_bytes {
            cfg = cfg.reserved_bytes(rb);
        }
        if self.wal_optional {
            cfg = cfg.wal_importance(false);
        }
        if let Some(n) = self.max_wal_frame {
            cfg = cfg.max_wal_frame(n);
        }
        let notifier = Notifier::new();
        let pager = Pager::with_config(&self.path, notifier.clone(), &cfg);
        (notifier, pager)
    }
}

#[derive(Subcommand, Debug)]
pub enum Cmd {
    /// Print geometry, page counts and WAL summary
    ///
    /// Example:
    ///   salvager info --path ./broken.db --json
    Info {
        #[command(flatten)]
        opts: PagerOpts,
        /// JSON output (single object)
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Dump one page, overlay aware (hex to stdout, raw with --out)
    Page {
        #[command(flatten)]
        opts: PagerOpts,
        /// 1-based page number
        #[arg(long)]
        number: u32,
        /// Optional file to write raw page bytes into
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Run pager + WAL diagnostics, printing every published record
    Hint {
        #[command(flatten)]
        opts: PagerOpts,
        /// JSONL output (one record per line)
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}
