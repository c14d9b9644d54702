use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(author, version = env!("CARGO_PKG_VERSION"), about = "Dialogue core for a Chinese voice assistant", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive text conversation
    Repl,

    /// Process a single turn and print the response
    Ask {
        /// User text for the turn
        text: String,

        /// Output the resolved turn as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show or clear the persisted dialogue history
    History {
        /// Number of recent turns to show
        #[arg(short, long, default_value_t = 10)]
        limit: usize,

        /// Delete all stored turns
        #[arg(long)]
        clear: bool,

        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Repl => commands::repl::execute(),
        Commands::Ask { text, json } => commands::ask::execute(&text, json),
        Commands::History { limit, clear, json } => commands::history::execute(limit, clear, json),
    }
}
