use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Block distracting websites and apps for the length of a focus session"
)]
pub struct Args {
    /// Path to configuration file (TOML)
    #[arg(long = "config", value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Install the hosts helper and sudoers rule (prompts once)
    Setup,

    /// Remove blocks left in the hosts file by an earlier run
    Sweep,

    /// Block sites and apps until Ctrl-C or the session ends
    Block(BlockArgs),

    /// Emergency unlock: remove every block from the hosts file
    Unlock {
        /// Type UNLOCK to confirm
        #[arg(long = "confirm", value_name = "PHRASE")]
        confirm: String,
    },

    /// Show setup state and the domains currently blocked
    Status,
}

#[derive(clap::Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockArgs {
    /// Domain to redirect to 127.0.0.1 (repeatable, comma separated)
    #[arg(long = "domain", value_delimiter = ',')]
    pub domains: Vec<String>,

    /// App name to force-quit while blocking (case-insensitive substring)
    #[arg(long = "app", value_delimiter = ',')]
    pub apps: Vec<String>,

    /// Add the built-in list of common distractions
    #[arg(long = "defaults")]
    pub defaults: bool,

    /// End the session after this many minutes
    #[arg(long = "minutes", value_name = "N")]
    pub minutes: Option<u64>,
}
