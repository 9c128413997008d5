//! zotero-mirror: command-line host for the Zotero library mirror.
//!
//! Connects to the Zotero local API, loads the configured library and
//! answers lookups from the in-memory mirror. `watch` keeps the mirror live
//! by reading change notifications (one JSON object per line) from stdin.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use impress_zotero::{
    ItemNotification, Mirror, MirrorConfig, MirrorEvent, RegularItem, DEFAULT_SEARCH_LIMIT,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "zotero-mirror")]
#[command(author, version, about = "Local mirror of a Zotero library")]
#[command(propagate_version = true)]
struct Cli {
    /// Config file (default: <config dir>/impress/zotero.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Library to load instead of the configured one
    #[arg(short, long, global = true)]
    library: Option<i64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check that the Zotero local API answers
    Ping,

    /// Full-text search over the library
    Search {
        /// Free-text query
        query: String,

        /// Maximum number of results
        #[arg(short = 'n', long, default_value_t = DEFAULT_SEARCH_LIMIT)]
        limit: usize,
    },

    /// Resolve citekeys to item keys
    Citekey {
        #[arg(required = true, num_args = 1..)]
        citekeys: Vec<String>,
    },

    /// Most recently accessed items
    Recent {
        /// Number of items (0 for all)
        #[arg(short = 'n', long, default_value_t = 20)]
        limit: usize,
    },

    /// List the annotations of an attachment
    Annotations {
        /// Attachment key
        attachment_key: String,
    },

    /// Stay running and apply change notifications read from stdin
    Watch,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "impress_zotero=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = MirrorConfig::load(cli.config.as_deref())?;
    if let Some(library) = cli.library {
        config.library_id = library;
    }
    let library_id = config.library_id;
    let mirror = Mirror::new(config)?;

    if let Commands::Ping = cli.command {
        return cmd_ping(&mirror).await;
    }

    mirror.initialize().await?;

    match cli.command {
        Commands::Ping => {}
        Commands::Search { query, limit } => {
            for hit in mirror.search(library_id, &query, limit)? {
                println!("{:>7.1}  {}  [{}]", hit.score, describe(&hit.item), hit.fields.join(", "));
            }
        }
        Commands::Citekey { citekeys } => {
            let found = mirror.get_item_key_from_citekey(&citekeys, library_id);
            for citekey in &citekeys {
                match found.get(citekey) {
                    Some(key) => println!("{}\t{}", citekey, key),
                    None => println!("{}\t(not found)", citekey),
                }
            }
        }
        Commands::Recent { limit } => {
            for hit in mirror.get_items_of(limit, library_id)? {
                let accessed = hit
                    .item
                    .date_accessed
                    .map(|d| d.format("%Y-%m-%d").to_string())
                    .unwrap_or_else(|| "----------".to_string());
                println!("{}  {}", accessed, describe(&hit.item));
            }
        }
        Commands::Annotations { attachment_key } => {
            let mut annotations = mirror.get_annotations(&attachment_key, library_id).await?;
            annotations.sort_by(|a, b| a.sort_index.cmp(&b.sort_index));
            for annotation in annotations {
                println!(
                    "{} p.{} {}",
                    annotation.key,
                    annotation.page_label.as_deref().unwrap_or("?"),
                    annotation.text.as_deref().unwrap_or_default()
                );
                if let Some(comment) = annotation.comment.as_deref().filter(|c| !c.is_empty()) {
                    println!("    {}", comment);
                }
            }
        }
        Commands::Watch => cmd_watch(&mirror).await?,
    }

    mirror.shutdown().await;
    Ok(())
}

async fn cmd_ping(mirror: &Mirror) -> Result<(), Box<dyn std::error::Error>> {
    let url = mirror.client().base_url();
    if mirror.client().ping().await {
        println!("Zotero local API reachable at {}", url);
        Ok(())
    } else {
        Err(format!("Zotero local API not reachable at {}", url).into())
    }
}

async fn cmd_watch(mirror: &Mirror) -> Result<(), Box<dyn std::error::Error>> {
    let mut events = mirror.subscribe();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            line = lines.next_line() => match line? {
                Some(line) if line.trim().is_empty() => {}
                Some(line) => match serde_json::from_str::<ItemNotification>(&line) {
                    Ok(notification) => mirror.handle_notification(notification),
                    Err(e) => tracing::warn!("Ignoring malformed notification: {}", e),
                },
                None => break,
            },
            event = events.recv() => match event {
                Ok(event @ MirrorEvent::ItemsUpdated { .. }) => {
                    println!("{}", serde_json::to_string(&event)?);
                }
                Ok(_) => {}
                Err(RecvError::Lagged(n)) => tracing::warn!("Missed {} mirror events", n),
                Err(RecvError::Closed) => break,
            },
        }
    }
    Ok(())
}

fn describe(item: &RegularItem) -> String {
    let creators = item
        .creators
        .first()
        .map(|c| c.display_name())
        .unwrap_or_default();
    format!(
        "{}  {}  {}",
        item.citekey.as_deref().unwrap_or(&item.key),
        creators,
        item.title().unwrap_or_default()
    )
}
