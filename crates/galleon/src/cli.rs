use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct GalleonArgs {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the repository server.
    Serve {
        /// Path to the config file.
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Rebuild revision indexes over a filesystem store.
    Reindex {
        /// Store root; defaults to the working directory.
        #[arg(long, default_value = ".")]
        root: PathBuf,
        /// Package coordinate (`name/version/user/channel`) to rebuild;
        /// every package found in the store when omitted.
        package: Option<String>,
    },
}
