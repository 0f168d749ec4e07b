use anyhow::Context;
use bookshelf_app::bootstrap;
use bookshelf_app::books::BookStore;
use bookshelf_kernel::settings::Settings;
use clap::{Parser, Subcommand};
use serde::Serialize;

#[derive(Debug, Parser)]
#[command(name = "bookshelf", version, about = "Book catalog service and client")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the HTTP service
    Serve,
    /// Work with the catalog directly through the connection pool
    #[command(subcommand)]
    Books(BooksCommand),
}

#[derive(Debug, Subcommand)]
enum BooksCommand {
    /// Print every book
    List,
    /// Insert a book
    Add {
        #[arg(long)]
        title: String,
        #[arg(long)]
        author: String,
    },
    /// Replace title and author of a book
    Update {
        id: i64,
        #[arg(long)]
        title: String,
        #[arg(long)]
        author: String,
    },
    /// Delete a book
    Delete { id: i64 },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let settings = Settings::load().with_context(|| "failed to load bookshelf settings")?;
    bookshelf_telemetry::init(&settings.telemetry)?;

    match cli.command {
        Command::Serve => bootstrap::serve(settings).await,
        Command::Books(command) => run_books(command, &settings).await,
    }
}

async fn run_books(command: BooksCommand, settings: &Settings) -> anyhow::Result<()> {
    tracing::debug!(?command, "running books command");
    let (store, pool) = bootstrap::connect_store(settings).await?;
    let result = execute_books(command, &store).await;
    pool.close().await;
    result
}

async fn execute_books(command: BooksCommand, store: &BookStore) -> anyhow::Result<()> {
    match command {
        BooksCommand::List => print_json(&store.list_all().await?),
        BooksCommand::Add { title, author } => print_json(&store.create(&title, &author).await?),
        BooksCommand::Update { id, title, author } => {
            print_json(&store.update(id, &title, &author).await?)
        }
        BooksCommand::Delete { id } => print_json(&store.delete(id).await?),
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let rendered = serde_json::to_string_pretty(value).context("failed to render result")?;
    println!("{rendered}");
    Ok(())
}
