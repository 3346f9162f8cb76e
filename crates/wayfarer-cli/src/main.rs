//! Wayfarer CLI - travel planning and booking agent.
//!
//! Two commands: `plan` suggests destinations and itineraries, `book` looks
//! up real hotels and flights through SerpAPI. Credentials come from the
//! environment; see `--help` for the variables each provider needs.

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
mod settings;

use settings::{ProviderSettings, SearchSettings};

const DEFAULT_PLAN_MESSAGE: &str = "Plan me a day trip";

const DEFAULT_BOOK_MESSAGE: &str = "Help me book flight tickets and a hotel for the following trip: \
New York JFK Feb 20th 2026 to London Heathrow LHR returning Feb 27th 2026, flying economy. \
I want a stay in a hotel in central London. Please provide costs for the flight and hotel.";

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    provider: ProviderSettings,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Plan a trip; repeat MESSAGE to continue the same conversation
    Plan {
        /// Messages to send, in order, on one thread
        messages: Vec<String>,
    },
    /// Book hotels and flights for a trip
    Book {
        /// The trip to book
        message: Option<String>,

        #[command(flatten)]
        search: SearchSettings,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let client = cli.provider.build_client()?;

    match cli.command {
        Commands::Plan { messages } => {
            let messages = if messages.is_empty() {
                vec![DEFAULT_PLAN_MESSAGE.to_string()]
            } else {
                messages
            };
            commands::plan(client, messages).await
        }
        Commands::Book { message, search } => {
            let search_config = search.to_search_config()?;
            let message = message.unwrap_or_else(|| DEFAULT_BOOK_MESSAGE.to_string());
            commands::book(client, search_config, message).await
        }
    }
}
