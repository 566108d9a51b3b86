//! Failure line purge
//!
//! Failure lines reference jobs by guid. When expired jobs are deleted their
//! failure lines stay behind, so this command removes lines whose job no
//! longer exists. One invocation processes one chunk; a cron entry whittles
//! a large backlog down without holding long transactions.
//!
//! Usage:
//!   purge_orphans --db ./ciboard.db
//!   purge_orphans --chunk-size 500 --debug   (database from CIBOARD_DB)

use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;
use tracing::info;

use ciboard_refdata::{SqliteStore, StoreError};

#[derive(Parser, Debug)]
#[command(name = "purge_orphans")]
#[command(about = "Delete failure lines referencing jobs that were removed")]
struct Args {
    /// Database file; falls back to the CIBOARD_DB environment variable
    #[arg(long)]
    db: Option<PathBuf>,

    /// Maximum failure lines examined per invocation
    #[arg(long, default_value = "100")]
    chunk_size: usize,

    /// Verbose logging
    #[arg(long)]
    debug: bool,
}

fn database_path(args: &Args) -> Option<PathBuf> {
    args.db
        .clone()
        .or_else(|| std::env::var("CIBOARD_DB").ok().map(PathBuf::from))
}

fn run(db: &Path, chunk_size: usize) -> Result<usize, StoreError> {
    let store = SqliteStore::open(db)?;

    let guids = store.orphaned_failure_line_guids(chunk_size)?;
    if guids.is_empty() {
        info!("no orphaned failure lines");
        return Ok(0);
    }

    let removed = store.delete_failure_lines_by_guid(&guids)?;
    info!(
        "removed {} failure lines across {} deleted jobs",
        removed,
        guids.len()
    );
    Ok(removed)
}

fn main() {
    let args = Args::parse();

    let default_filter = if args.debug {
        "ciboard_refdata=debug,purge_orphans=debug"
    } else {
        "ciboard_refdata=info,purge_orphans=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .init();

    let db = match database_path(&args) {
        Some(path) => path,
        None => {
            eprintln!("error: no database given (use --db or set CIBOARD_DB)");
            process::exit(2);
        }
    };

    match run(&db, args.chunk_size) {
        Ok(removed) => println!("purged {} orphaned failure lines", removed),
        Err(err) => {
            eprintln!("error: {}", err);
            process::exit(1);
        }
    }
}
