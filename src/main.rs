//! # Docze CLI (`docze`)
//!
//! The `docze` binary drives the document-aware chat assistant: it manages
//! the SQLite database, ingests documents, and answers questions with
//! context retrieved from conversation history and uploaded files.
//!
//! ## Usage
//!
//! ```bash
//! docze --config ./config/docze.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `docze init` | Create the SQLite database and run schema migrations |
//! | `docze add <files…>` | Ingest PDF/DOCX/TXT files for a user |
//! | `docze remove <name>` | Delete a file and its chunks |
//! | `docze files` | List a user's files |
//! | `docze ask "<question>"` | Answer a question and store the exchange |
//! | `docze context "<question>"` | Show the assembled prompt without answering |
//! | `docze history` | Print stored conversations |
//!
//! Logging goes to stderr and is controlled by `RUST_LOG`, falling back to
//! `[log] level` in the config file.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use docze::{ask, config, documents, history, migrate};

/// Docze: ask questions about your documents, with memory of the conversation.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/docze.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "docze",
    about = "Docze: a document-aware chat assistant",
    version,
    long_about = "Docze stores uploaded documents and chat transcripts with embeddings, \
    resolves pronouns against the latest turn, ranks document chunks by similarity, and \
    assembles a single prompt for the completion model."
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/docze.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema.
    ///
    /// Creates the SQLite database file and the chat_turns, files and
    /// document_chunks tables. Running it again is harmless.
    Init,

    /// Ingest one or more documents (.pdf, .docx, .txt).
    ///
    /// A file with the same name as one the user already has replaces it.
    Add {
        #[arg(long, default_value_t = 1)]
        user: i64,

        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },

    /// Remove a document and all of its chunks.
    Remove {
        #[arg(long, default_value_t = 1)]
        user: i64,

        file_name: String,
    },

    /// List a user's documents.
    Files {
        #[arg(long, default_value_t = 1)]
        user: i64,
    },

    /// Ask a question and store the question and answer in the conversation.
    Ask {
        question: String,

        #[arg(long, default_value_t = 1)]
        user: i64,

        /// Conversation id. Omit to start a new conversation.
        #[arg(long)]
        chat: Option<String>,

        /// Print the answer as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show the context the engine would build for a question.
    ///
    /// Runs retrieval only: no final answer, nothing written.
    Context {
        question: String,

        #[arg(long, default_value_t = 1)]
        user: i64,

        #[arg(long)]
        chat: String,

        /// Number of top document matches (defaults to `[retrieval] top_k`).
        #[arg(long)]
        k: Option<usize>,

        #[arg(long)]
        json: bool,
    },

    /// Print stored conversations.
    History {
        #[arg(long, default_value_t = 1)]
        user: i64,

        /// Only this conversation. Omit for all of them.
        #[arg(long)]
        chat: Option<String>,

        #[arg(long)]
        json: bool,
    },
}

fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;
    init_tracing(&cfg.log.level);

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Database initialized successfully.");
        }
        Commands::Add { user, paths } => {
            documents::run_add(&cfg, user, &paths).await?;
        }
        Commands::Remove { user, file_name } => {
            documents::run_remove(&cfg, user, &file_name).await?;
        }
        Commands::Files { user } => {
            documents::run_files(&cfg, user).await?;
        }
        Commands::Ask {
            question,
            user,
            chat,
            json,
        } => {
            ask::run_ask(&cfg, user, chat, &question, json).await?;
        }
        Commands::Context {
            question,
            user,
            chat,
            k,
            json,
        } => {
            ask::run_context(&cfg, user, &chat, &question, k, json).await?;
        }
        Commands::History { user, chat, json } => {
            history::run_history(&cfg, user, chat.as_deref(), json).await?;
        }
    }

    Ok(())
}
