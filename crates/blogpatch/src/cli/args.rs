//! Command-line argument structures and enums

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "blogpatch")]
#[command(version)]
#[command(about = "Derive and sync incremental edits of a blog draft", long_about = None)]
pub struct Cli {
    /// Use this config file instead of the default location
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log debug output (same as RUST_LOG=debug)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the operations that turn OLD into NEW
    Diff {
        /// Old value (or a file path with --files)
        old: String,

        /// New value (or a file path with --files)
        new: String,

        /// Field the values belong to (title, description, content, link)
        #[arg(short, long, default_value = "content")]
        field: String,

        /// Read OLD and NEW from files
        #[arg(long)]
        files: bool,
    },

    /// Fetch the authoritative draft from the server
    Pull {
        /// Blog to fetch (default: config's blog_id, then the server's choice)
        #[arg(short, long)]
        blog_id: Option<i64>,

        /// Write the draft to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Replace the server's draft with a JSON document
    Push {
        /// JSON file holding the full draft
        file: PathBuf,
    },

    /// Edit one field interactively; every stdin line becomes its new value
    Edit {
        /// Field to edit (title, description, content, link, status)
        #[arg(short, long, default_value = "content")]
        field: String,

        /// Blog to edit (default: config's blog_id)
        #[arg(short, long)]
        blog_id: Option<i64>,
    },

    /// Show or change sync configuration
    Config {
        /// Document API base URL
        #[arg(long)]
        server: Option<String>,

        /// Operation WebSocket base URL
        #[arg(long)]
        ws: Option<String>,

        /// Session token
        #[arg(long)]
        token: Option<String>,

        /// Default blog id
        #[arg(long)]
        blog_id: Option<i64>,

        /// Request timeout in milliseconds
        #[arg(long)]
        timeout_ms: Option<u64>,

        /// Print the resulting configuration
        #[arg(long)]
        show: bool,
    },
}
