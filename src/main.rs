//! Archivist CLI - inspect and administer the assistant's memory store

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use archivist::config::{self, ArchivistConfig};
use archivist::storage::backup::default_backup_dir;

#[derive(Parser)]
#[command(name = "archivist")]
#[command(version)]
#[command(about = "Persistent memory and document cache for a personal assistant agent")]
#[command(long_about = r#"
Archivist keeps the assistant's conversation log, facts and cached wiki
pages in one SQLite file, and backs it up on demand.

Example usage:
  archivist log user "hello"
  archivist history --limit 10
  archivist ingest 4151280097 --title "API 101" --file page.html
  archivist search "incident"
  archivist backup
"#)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit machine-readable JSON instead of styled text
    #[arg(long, global = true)]
    json: bool,

    /// Path to the config file (defaults to archivist.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Path to the database file (overrides the config)
    #[arg(short, long, global = true)]
    database: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a starter config file
    Init {
        /// Overwrite an existing config
        #[arg(long)]
        force: bool,
    },

    /// Append a message to the conversation log
    Log {
        /// Role label (user, agent, system)
        role: String,
        /// Message text
        text: String,
    },

    /// Show the most recent messages, oldest first
    History {
        /// Number of messages (defaults to the configured history limit)
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Read and write facts
    Fact {
        #[command(subcommand)]
        action: FactCommand,
    },

    /// Save and look up topic notes
    Note {
        #[command(subcommand)]
        action: NoteCommand,
    },

    /// Store a fetched document from a file
    Ingest {
        /// External identifier of the document
        id: String,

        /// Document title
        #[arg(short, long)]
        title: String,

        /// File holding the document body
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Load every configured page from the pages directory
    Preload {
        /// Directory of exported pages (overrides the config)
        #[arg(long)]
        pages_dir: Option<PathBuf>,

        /// Also inject the knowledge base, failed pages included
        #[arg(long)]
        knowledge: bool,
    },

    /// Search cached documents by substring
    Search {
        /// Text to look for in titles and bodies
        query: String,

        /// Maximum number of results
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Show one cached document
    Show {
        /// External identifier
        id: String,
    },

    /// List cached documents, most recently accessed first
    List,

    /// Remove one cached document
    Delete {
        /// External identifier
        id: String,
    },

    /// Render the cached documents into a knowledge base message
    Knowledge,

    /// Print the prompt the agent would receive for a message
    Context {
        /// The user's message
        message: String,

        /// Conversation messages to include
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Snapshot the store into the backup directory
    Backup {
        /// Backup file name (defaults to backup_<date>_<time>.db)
        #[arg(short, long)]
        name: Option<String>,
    },

    /// List existing backups, newest first
    Backups,

    /// Overwrite the store with a backup
    Restore {
        /// Path to the backup file
        path: PathBuf,
    },

    /// Show statistics about the store
    Stats,

    /// Delete all messages and facts
    Clear {
        /// Delete cached documents instead
        #[arg(long)]
        documents: bool,

        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum FactCommand {
    /// Set a fact, replacing any previous value
    Set { key: String, value: String },
    /// Print a fact's value
    Get { key: String },
    /// List all facts
    List,
}

#[derive(Subcommand)]
enum NoteCommand {
    /// File content under a topic
    Save { topic: String, content: String },
    /// Find notes whose topic or content contains the query
    Search {
        query: String,

        /// Maximum number of results
        #[arg(short, long)]
        limit: Option<usize>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Human,
    Json,
}

impl OutputMode {
    pub fn is_human(&self) -> bool {
        matches!(self, OutputMode::Human)
    }
}

/// Print a JSON success envelope (no-op in human mode)
pub fn emit_success(output_mode: OutputMode, command: &str, data: serde_json::Value) -> anyhow::Result<()> {
    if output_mode.is_human() {
        return Ok(());
    }
    let envelope = serde_json::json!({
        "status": "ok",
        "command": command,
        "data": data,
    });
    println!("{}", serde_json::to_string_pretty(&envelope)?);
    Ok(())
}

/// Config file contents merged with command-line overrides
pub struct Settings {
    pub config: ArchivistConfig,
    pub config_path: PathBuf,
    pub database: PathBuf,
    pub backup_dir: PathBuf,
}

impl Settings {
    fn resolve(cli_config: Option<PathBuf>, cli_database: Option<PathBuf>) -> anyhow::Result<Self> {
        let config_path = cli_config.unwrap_or_else(config::default_config_path);
        let config = config::load_config(Some(&config_path))?.unwrap_or_default();

        let database = cli_database.unwrap_or_else(|| config.database_path());
        let backup_dir = config
            .backup_dir
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(|| default_backup_dir(&database));

        Ok(Self {
            config,
            config_path,
            database,
            backup_dir,
        })
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if std::env::var_os("RUST_LOG").is_some() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let output_mode = if cli.json { OutputMode::Json } else { OutputMode::Human };
    let settings = Settings::resolve(cli.config, cli.database)?;

    match cli.command {
        Commands::Init { force } => commands::run_init(output_mode, &settings, force),
        Commands::Log { role, text } => commands::run_log(output_mode, &settings, &role, &text),
        Commands::History { limit } => {
            let limit = limit.unwrap_or_else(|| settings.config.history_limit());
            commands::run_history(output_mode, &settings, limit)
        }
        Commands::Fact { action } => match action {
            FactCommand::Set { key, value } => commands::run_fact_set(output_mode, &settings, &key, &value),
            FactCommand::Get { key } => commands::run_fact_get(output_mode, &settings, &key),
            FactCommand::List => commands::run_fact_list(output_mode, &settings),
        },
        Commands::Note { action } => match action {
            NoteCommand::Save { topic, content } => commands::run_note_save(output_mode, &settings, &topic, &content),
            NoteCommand::Search { query, limit } => {
                let limit = limit.unwrap_or_else(|| settings.config.search_limit());
                commands::run_note_search(output_mode, &settings, &query, limit)
            }
        },
        Commands::Ingest { id, title, file } => commands::run_ingest(output_mode, &settings, &id, &title, &file),
        Commands::Preload { pages_dir, knowledge } => {
            commands::run_preload(output_mode, &settings, pages_dir, knowledge)
        }
        Commands::Search { query, limit } => {
            let limit = limit.unwrap_or_else(|| settings.config.search_limit());
            commands::run_search(output_mode, &settings, &query, limit)
        }
        Commands::Show { id } => commands::run_show(output_mode, &settings, &id),
        Commands::List => commands::run_list(output_mode, &settings),
        Commands::Delete { id } => commands::run_delete(output_mode, &settings, &id),
        Commands::Knowledge => commands::run_knowledge(output_mode, &settings),
        Commands::Context { message, limit } => {
            let limit = limit.unwrap_or_else(|| settings.config.history_limit());
            commands::run_context(output_mode, &settings, &message, limit)
        }
        Commands::Backup { name } => commands::run_backup(output_mode, &settings, name.as_deref()),
        Commands::Backups => commands::run_backups(output_mode, &settings),
        Commands::Restore { path } => commands::run_restore(output_mode, &settings, &path),
        Commands::Stats => commands::run_stats(output_mode, &settings),
        Commands::Clear { documents, yes } => commands::run_clear(output_mode, &settings, documents, yes),
    }
}
