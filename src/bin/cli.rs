//! AtlasDoc CLI
//!
//! Save and fetch documents in a local durable store.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::process;
use std::time::{SystemTime, UNIX_EPOCH};

use atlasdoc::config::SyncStrategy;
use atlasdoc::{Config, DataStore, Document, DocumentStore};
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

/// AtlasDoc CLI
#[derive(Parser, Debug)]
#[command(name = "atlasdoc-cli")]
#[command(about = "CLI for the AtlasDoc document store")]
#[command(version)]
struct Args {
    /// Data directory
    #[arg(short, long, default_value = "./atlasdoc_data")]
    data_dir: PathBuf,

    /// Column family holding document rows
    #[arg(long, default_value = "d")]
    column_family: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Save one document
    Save {
        /// Table namespace
        #[arg(short, long)]
        table: String,

        /// Document id
        #[arg(short, long)]
        id: String,

        /// Timestamp (defaults to now, in unix millis)
        #[arg(long)]
        timestamp: Option<i64>,

        /// JSON payload
        #[arg(long)]
        data: String,
    },

    /// Save every document in a JSON-lines file as one batch
    Import {
        /// Table namespace
        #[arg(short, long)]
        table: String,

        /// File with one `{"id", "timestamp", "data"}` object per line
        file: PathBuf,
    },

    /// Get a document by id
    Get {
        /// Table namespace
        #[arg(short, long)]
        table: String,

        /// Document id
        id: String,
    },

    /// Get several documents; fails if any is missing
    Mget {
        /// Table namespace
        #[arg(short, long)]
        table: String,

        /// Document ids
        #[arg(required = true)]
        ids: Vec<String>,
    },
}

fn main() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,atlasdoc=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config = Config::builder()
        .data_dir(&args.data_dir)
        .column_family(&args.column_family)
        .log_sync_strategy(SyncStrategy::EveryWrite)
        .build();

    let store = match DocumentStore::open(&config) {
        Ok(store) => store,
        Err(e) => {
            tracing::error!("Failed to open store at {}: {}", args.data_dir.display(), e);
            process::exit(1);
        }
    };

    if let Err(message) = run(&store, args.command) {
        tracing::error!("{}", message);
        process::exit(1);
    }
}

fn run(store: &DocumentStore, command: Commands) -> Result<(), String> {
    match command {
        Commands::Save {
            table,
            id,
            timestamp,
            data,
        } => {
            let data = serde_json::from_str(&data).map_err(|e| format!("Invalid JSON: {}", e))?;
            let document = Document::new(id, timestamp.unwrap_or_else(now_millis), data);
            store.save(&table, &document).map_err(|e| describe(&e))?;
            print_json(&document)
        }
        Commands::Import { table, file } => {
            let documents = read_documents(&file)?;
            store
                .save_all(&table, &documents)
                .map_err(|e| describe(&e))?;
            tracing::info!("Imported {} documents into {}", documents.len(), table);
            Ok(())
        }
        Commands::Get { table, id } => {
            let document = store.get(&table, &id).map_err(|e| describe(&e))?;
            print_json(&document)
        }
        Commands::Mget { table, ids } => {
            let documents = store.get_all(&table, &ids).map_err(|e| describe(&e))?;
            print_json(&documents)
        }
    }
}

fn read_documents(path: &Path) -> Result<Vec<Document>, String> {
    let file = File::open(path).map_err(|e| format!("Cannot open {}: {}", path.display(), e))?;

    let mut documents = Vec::new();
    for (number, line) in BufReader::new(file).lines().enumerate() {
        let line = line.map_err(|e| format!("Cannot read {}: {}", path.display(), e))?;
        if line.trim().is_empty() {
            continue;
        }
        let document: Document = serde_json::from_str(&line)
            .map_err(|e| format!("{}:{}: {}", path.display(), number + 1, e))?;
        documents.push(document);
    }
    Ok(documents)
}

fn describe(error: &atlasdoc::DataStoreError) -> String {
    format!("[{}] {}", error.code(), error)
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), String> {
    let json = serde_json::to_string_pretty(value).map_err(|e| e.to_string())?;
    println!("{}", json);
    Ok(())
}

fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}
