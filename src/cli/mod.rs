pub mod commands;
pub mod utils;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "studio")]
#[command(about = "Studio CLI - operator tasks for the studio content database")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[arg(long, global = true, help = "Debug logging (unless RUST_LOG is set)")]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Create missing tables and convert legacy gallery storage")]
    Migrate,

    #[command(about = "Write every gallery image to a directory with a manifest.json")]
    ExtractImages {
        #[arg(long, default_value = "public/images", help = "Output directory")]
        out: PathBuf,
    },

    #[command(about = "Create the user if needed and print a session token")]
    Session {
        #[arg(long, help = "User email")]
        email: String,
        #[arg(long, help = "Display name for a new user")]
        name: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);

    match cli.command {
        Commands::Migrate => commands::migrate::handle(output_format).await,
        Commands::ExtractImages { out } => commands::images::handle(&out, output_format).await,
        Commands::Session { email, name } => {
            commands::session::handle(&email, name.as_deref(), output_format).await
        }
    }
}
