use std::path::PathBuf;

use archivebot_core::DEFAULT_BOT_NAME;
use clap::Parser;
use log::LevelFilter;

use crate::logging::LogDestination;

/// Archive hypercores on request from a chat channel.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Port peers replicate with.
    #[arg(short, long, default_value_t = 3282)]
    pub port: u16,

    /// Archive directory; created if missing.
    #[arg(short = 'd', long, default_value = "hypercore-archiver")]
    pub cwd: PathBuf,

    /// Shared channel to answer in. Messaging is off without it.
    #[arg(short, long)]
    pub channel: Option<String>,

    /// Nick the bot answers to.
    #[arg(short, long, default_value = DEFAULT_BOT_NAME)]
    pub name: String,

    /// Messaging server address.
    #[arg(short, long, default_value = "irc.freenode.net")]
    pub server: String,

    /// Announce-only mode: do not join swarms for individual feeds.
    #[arg(short, long)]
    pub announce: bool,

    /// Log debug output.
    #[arg(short, long, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Log errors only.
    #[arg(short, long)]
    pub quiet: bool,

    /// Also write logs to ./archive-bot.log.
    #[arg(long)]
    pub log_file: bool,
}

impl Args {
    pub fn log_level(&self) -> LevelFilter {
        if self.quiet {
            LevelFilter::Error
        } else if self.verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        }
    }

    pub fn log_destination(&self) -> LogDestination {
        if self.log_file {
            LogDestination::Both
        } else {
            LogDestination::Terminal
        }
    }
}
