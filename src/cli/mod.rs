//! CLI module for Newscast.

pub mod commands;
mod output;

pub use output::{Annotation, Output};

use crate::config::EpisodeMode;
use clap::{Parser, Subcommand};

/// Newscast - newsletters in, podcast out
///
/// Fetches a newsletter feed or listing page, cleans the text for speech,
/// narrates new content and republishes a podcast feed.
#[derive(Parser, Debug)]
#[command(name = "newscast")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true, env = "NEWSCAST_CONFIG")]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch, assemble and publish new episodes
    Run {
        /// Override the configured episode mode (separate, compilation, forced_compilation)
        #[arg(short, long)]
        mode: Option<EpisodeMode>,

        /// Override the configured feed or listing URL
        #[arg(long)]
        feed_url: Option<String>,
    },

    /// Rewrite the feed and index page from saved state
    Render,

    /// Remove episodes for a date and/or old processed entries
    Prune {
        /// Remove every episode published on this date (YYYY-MM-DD)
        #[arg(short, long)]
        date: Option<String>,

        /// Forget processed items recorded before this date (YYYY-MM-DD)
        #[arg(long)]
        processed_before: Option<String>,
    },

    /// Check configuration and credentials
    Doctor,
}
