//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Hand browser downloads off to a local download manager.
///
/// Exit codes:
///   0 = manager connected / link delivered / link is a download
///   1 = manager not running / link not delivered / link is not a download
///   2 = fatal error (bad config or arguments)
#[derive(Parser, Debug)]
#[command(name = "download-broker")]
#[command(author, version, about)]
#[command(arg_required_else_help = true)]
pub struct Cli {
    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Manager port on 127.0.0.1 (overrides the config file)
    #[arg(short = 'p', long, global = true, value_parser = clap::value_parser!(u16).range(1..))]
    pub port: Option<u16>,

    /// Config file to use instead of the default location
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Check whether the download manager is running
    Status,

    /// Send a link to the download manager
    Send {
        /// URL of the file to download
        url: String,

        /// Filename to save under (defaults to the last URL path segment)
        #[arg(short, long)]
        filename: Option<String>,
    },

    /// Check whether a link would be treated as a download (no network)
    Classify {
        /// Link URL
        url: String,

        /// Link label
        #[arg(short, long, default_value = "")]
        text: String,

        /// Treat the page as containing an element with a download attribute
        #[arg(long)]
        page_marker: bool,

        /// Treat the link itself as carrying a download attribute
        #[arg(long)]
        element_marker: bool,
    },
}
