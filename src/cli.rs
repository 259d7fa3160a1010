use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Defaults to `serve`
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP relay
    Serve {
        /// Port to listen on (overrides config file and PORT)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Check that the extraction tool is installed and print its version
    Check,

    /// Fetch metadata for a single URL and print it as JSON
    Info {
        /// Resource locator
        url: String,
    },
}
