//! Runtime Configuration
//!
//! Command line flags, each with an environment variable fallback.

use crate::zones::Zone;

use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about = "Patent data lake: PTGRXML ingestion and CPC queries", long_about = None)]
pub struct LakeConfig {
    /// Root directory holding the lake zones.
    #[arg(long, env = "PATENT_LAKE_ROOT", default_value = "datalake", global = true)]
    pub lake_root: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Restore the store from the lake and serve the HTTP API.
    Serve {
        #[arg(long, env = "PATENT_LAKE_BIND", default_value = "127.0.0.1:5000")]
        bind: SocketAddr,
    },
    /// Run one ingest batch over the archives in raw/patents.
    Ingest {
        /// Place processed archives in `archived` instead of `transformed`.
        #[arg(long)]
        historical: bool,
        /// Leave archives in `staging` where they are.
        #[arg(long)]
        no_promote: bool,
    },
    /// Delete a zone's contents and recreate its empty subdirectories.
    Wipe { zone: Zone },
}
