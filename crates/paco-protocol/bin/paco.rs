//! PACO command line client.
//!
//! Thin wrapper around the paco-protocol library that parses arguments,
//! initializes logging and prints each response as JSON on stdout.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use paco_cache::ListType;
use paco_protocol::{ClientConfig, PacoClient, ReportFormat, ReportOutcome, ReportRequest};

#[derive(Debug, Parser)]
#[command(name = "paco", about = "Command line client for a PACO server", version)]
struct Cli {
    /// Server base URL
    #[arg(long, env = "PACO_BASE_URL", default_value = "http://localhost:8080")]
    base_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List experiments
    List {
        /// admin, joined or mine
        #[arg(default_value = "admin")]
        list_type: ListType,

        /// Request a single page of the configured size
        #[arg(long)]
        limit: bool,

        #[arg(long)]
        cursor: Option<String>,
    },

    /// Show one experiment
    Get { id: i64 },

    /// Generate a report, waiting for the server job to finish
    Report {
        id: i64,

        /// json, csv or html
        #[arg(long, default_value = "csv")]
        format: ReportFormat,

        /// Restrict to one participant
        #[arg(long)]
        who: Option<String>,

        #[arg(long)]
        anon: bool,

        #[arg(long)]
        photos: bool,
    },

    /// Participant statistics
    Stats {
        id: i64,

        #[arg(long)]
        who: Option<String>,
    },

    /// One page of raw events
    Events {
        id: i64,

        #[arg(long)]
        who: Option<String>,

        #[arg(long)]
        anon: bool,

        #[arg(long)]
        cursor: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = ClientConfig::from_env().with_base_url(cli.base_url);
    let client = PacoClient::new(config).context("failed to create client")?;

    let output = match cli.command {
        Command::List {
            list_type,
            limit,
            cursor,
        } => {
            client
                .experiments()
                .list(list_type, limit, cursor.as_deref())
                .await?
        }
        Command::Get { id } => client.experiments().get(id).await?,
        Command::Report {
            id,
            format,
            who,
            anon,
            photos,
        } => {
            let mut request = ReportRequest::new(id, format)
                .with_anonymized(anon)
                .with_photos(photos);
            request.user = who;

            let outcome = client.data().report(request).await?;
            if let ReportOutcome::Error(message) = &outcome {
                tracing::warn!("Report for experiment {} failed: {}", id, message);
            }
            serde_json::to_value(outcome)?
        }
        Command::Stats { id, who } => {
            let stats = client.data().participant_stats(id, who.as_deref()).await?;
            serde_json::to_value(stats)?
        }
        Command::Events {
            id,
            who,
            anon,
            cursor,
        } => {
            client
                .data()
                .events(id, who.as_deref(), anon, cursor.as_deref())
                .await?
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);

    let stats = client.shutdown();
    tracing::debug!("Cache: {} hits, {} misses", stats.hits, stats.misses);

    Ok(())
}
