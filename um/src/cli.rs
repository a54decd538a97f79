//! CLI command definitions and subcommands

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// um - rate-limited user management client
#[derive(Parser)]
#[command(
    name = "um",
    about = "Create, update and look up users through a rate-limited API client",
    version
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log at DEBUG instead of INFO
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create a user
    Create {
        /// Unique user id
        user_id: String,

        /// Display name
        nickname: String,

        /// Profile image URL
        #[arg(short, long)]
        profile_url: Option<String>,
    },

    /// Update a user's nickname and/or profile URL
    Update {
        user_id: String,

        #[arg(short, long)]
        nickname: Option<String>,

        #[arg(short, long)]
        profile_url: Option<String>,
    },

    /// Get a user by id
    Get { user_id: String },

    /// List users with a given nickname
    List {
        nickname: String,

        /// Pagination token from a previous page
        #[arg(short, long)]
        token: Option<String>,
    },
}
