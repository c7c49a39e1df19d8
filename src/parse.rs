use crate::view::{CategoryFilter, SeenFilter};
use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "aviary")]
#[command(about = "A bird catalog server and client for tracking which species you have seen")]
#[command(version = "0.1")]
pub(crate) struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub(crate) enum Command {
    /// Run the catalog API server
    Serve {
        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,

        /// CSV file to seed the catalog from
        #[arg(short, long)]
        seed: Option<PathBuf>,
    },

    /// List birds with their seen status
    List {
        #[command(flatten)]
        remote: RemoteArgs,

        /// Only show birds whose name contains this text
        #[arg(short, long)]
        search: Option<String>,

        #[arg(short, long, value_enum, default_value = "all")]
        category: CategoryFilter,

        #[arg(long, value_enum, default_value = "all")]
        seen: SeenFilter,
    },

    /// Show full details for one or more birds
    Show {
        #[arg(required = true)]
        ids: Vec<u64>,

        #[command(flatten)]
        remote: RemoteArgs,
    },

    /// Flip the seen status of one or more birds
    Toggle {
        #[arg(required = true)]
        ids: Vec<u64>,

        #[command(flatten)]
        remote: RemoteArgs,
    },

    /// Write birds to a CSV file, the seen list unless a selection is given
    Export {
        /// Output CSV filename
        #[arg(short, long, default_value = "seen_birds.csv")]
        output: PathBuf,

        /// Bird IDs to export instead of the seen list
        #[arg(long, value_delimiter = ',')]
        select: Vec<u64>,

        #[command(flatten)]
        remote: RemoteArgs,
    },

    /// Browse the catalog interactively
    Browse {
        #[command(flatten)]
        remote: RemoteArgs,
    },
}

#[derive(ClapArgs)]
pub(crate) struct RemoteArgs {
    /// Base URL of the catalog server
    #[arg(long)]
    pub url: Option<String>,

    /// User whose sightings to read and change
    #[arg(short, long)]
    pub user: Option<u64>,

    /// Base delay between retries in milliseconds
    #[arg(short, long, default_value = "500")]
    pub delay: u64,

    /// Maximum number of retry attempts
    #[arg(short, long, default_value = "3")]
    pub retries: u32,
}
