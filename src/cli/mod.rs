//! CLI module for pagecap
//!
//! Provides offline commands:
//! - `validate`: Canonicalize, validate and order a step list
//! - `devices`: List device presets and aliases
//! - `schema`: Print the `capture_page` tool definition

use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub mod devices;
pub mod schema;
pub mod validate;

/// pagecap CLI
#[derive(Parser, Debug)]
#[command(name = "pagecap")]
#[command(about = "Capture web pages from loosely-structured step lists")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check a step list without opening the page
    Validate {
        /// Page the steps are meant for
        #[arg(long)]
        url: String,
        /// JSON file with a step array or a full request ("-" reads stdin)
        #[arg(long)]
        steps: Option<PathBuf>,
    },
    /// List device presets and aliases
    Devices {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Print the capture tool definition as JSON
    Schema,
}

/// Run the CLI command
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Some(Commands::Validate { url, steps }) => validate::run(&url, steps.as_deref()).await,
        Some(Commands::Devices { json }) => devices::run(json),
        Some(Commands::Schema) => schema::run(),
        None => {
            let mut cmd = <Cli as clap::CommandFactory>::command();
            cmd.print_help()?;
            println!();
            Ok(())
        }
    }
}
