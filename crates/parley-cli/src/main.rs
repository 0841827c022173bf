use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod helper;
mod render;

use commands::setup::SessionArgs;

#[derive(Parser)]
#[command(name = "parley")]
#[command(about = "Parley - chat with DeepSeek models from the terminal", long_about = None)]
#[command(version)]
struct Cli {
    /// Log debug output to stderr (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start an interactive conversation
    Chat {
        #[command(flatten)]
        session: SessionArgs,
    },
    /// Send one message and print the reply
    Ask {
        #[command(flatten)]
        session: SessionArgs,

        /// File to attach (repeatable)
        #[arg(short, long = "attach", value_name = "PATH")]
        attachments: Vec<PathBuf>,

        /// Message text
        text: Vec<String>,
    },
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Chat { session } => commands::chat::run(session).await?,
        Commands::Ask {
            session,
            attachments,
            text,
        } => commands::ask::run(session, attachments, text).await?,
    }

    Ok(())
}
