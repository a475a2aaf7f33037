//! services/client/src/bin/client.rs

use std::sync::Arc;

use clap::{Parser, Subcommand};
use client_lib::{
    adapters::{FileStore, HttpProgressAdapter},
    config::Config,
    error::ClientError,
};
use reading_library_core::{IdentityResolver, ReadingService};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line client for the online reading library.
#[derive(Parser)]
#[command(name = "client", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Record the page you are on for a book.
    Save {
        book_id: String,
        page: u32,
        /// Total page count of the book, when known.
        #[arg(long)]
        total: Option<u32>,
    },
    /// Show the saved progress for a book.
    Get { book_id: String },
    /// Show all saved progress.
    List,
    /// Remove the saved progress for a book.
    Clear { book_id: String },
    /// Store the user id obtained from authentication.
    Login { user_id: String },
    /// Show the current user id, if any.
    Whoami,
    /// Forget the identity and all locally saved progress.
    Logout,
}

#[tokio::main]
async fn main() -> Result<(), ClientError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Config::from_env()?;
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    // --- 2. Open the Device Store & Build the Adapters ---
    let store = Arc::new(FileStore::open(&config.storage_path)?);
    let remote = Arc::new(HttpProgressAdapter::new(
        reqwest::Client::new(),
        config.api_base_url.clone(),
    ));

    // --- 3. Build the Core Services ---
    let identity = IdentityResolver::new(store.clone(), config.keys.clone());
    let reading = ReadingService::new(store, remote, config.keys.clone());

    // Resolving up front runs the legacy-id migration before any progress
    // operation reads the id slot.
    let user_id = identity.resolve()?;
    match &user_id {
        Some(id) => info!(user_id = %id, "identity resolved"),
        None => info!("no identity; running in guest mode"),
    }

    // --- 4. Run the Requested Command ---
    match cli.command {
        Command::Save {
            book_id,
            page,
            total,
        } => {
            reading.save_progress(&book_id, page, total).await?;
            println!("saved: {} at page {}", book_id, page);
        }
        Command::Get { book_id } => match reading.get_progress(&book_id).await? {
            Some(record) => {
                println!(
                    "{}: page {} ({:.0}%, {:?})",
                    record.book_id, record.current_page, record.progress, record.status
                );
            }
            None => println!("no progress recorded for {}", book_id),
        },
        Command::List => {
            let mut all: Vec<_> = reading.get_all_progress().await?.into_values().collect();
            all.sort_by(|a, b| a.book_id.cmp(&b.book_id));
            if all.is_empty() {
                println!("no progress recorded");
            }
            for record in all {
                println!(
                    "{}: page {} ({:.0}%, {:?})",
                    record.book_id, record.current_page, record.progress, record.status
                );
            }
        }
        Command::Clear { book_id } => {
            reading.clear_progress(&book_id).await?;
            println!("cleared: {}", book_id);
        }
        Command::Login { user_id } => {
            let stored = identity.establish(&user_id)?;
            println!("logged in as {}", stored);
        }
        Command::Whoami => match user_id {
            Some(id) => println!("{}", id),
            None => println!("guest"),
        },
        Command::Logout => {
            identity.logout()?;
            println!("logged out");
        }
    }

    Ok(())
}
