//! culturedrone CLI: the main entry point.
//!
//! Commands:
//! - `chat`: Interactive drone session or single-message mode (default)
//! - `onboard`: Write the default config file
//! - `doctor`: Diagnose configuration and oracle reachability

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "culturedrone",
    about = "culturedrone: command a sarcastic Culture drone in plain language",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Talk to the drone
    Chat {
        /// Send a single command instead of entering interactive mode
        #[arg(short, long)]
        message: Option<String>,
    },

    /// Initialize configuration
    Onboard,

    /// Diagnose configuration and oracle health
    Doctor,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Logs go to stderr; the drone speaks on stdout
    let filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command.unwrap_or(Commands::Chat { message: None }) {
        Commands::Chat { message } => commands::chat::run(message).await?,
        Commands::Onboard => commands::onboard::run().await?,
        Commands::Doctor => commands::doctor::run().await?,
    }

    Ok(())
}
