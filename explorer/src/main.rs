//! ixtree explorer
//!
//! Fetches transactions over JSON-RPC and prints their reconstructed call
//! tree, token transfers and program logs. In `--watch` mode signatures are
//! read from stdin and each new one supersedes the lookup still in flight.
//! `--account` lists the latest transactions of an address instead.

mod config;
mod render;
mod request;
mod rpc;

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use config::{Config, OutputFormat};
use ixtree::TransactionAnalyzer;
use request::RequestTracker;
use rpc::{FetchError, SnapshotClient};
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    task::JoinHandle,
};
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();

    let config = Config::parse();

    let client = Arc::new(SnapshotClient::new(&config));
    info!("RPC URL: {}", client.url());
    info!("Cluster: {}", config.cluster);
    let analyzer = TransactionAnalyzer::new(config.cluster);

    if let Some(address) = &config.account {
        account_history(&client, config.output, address).await
    } else if config.watch {
        watch(client, analyzer, config.output).await
    } else {
        run_once(&client, analyzer, config.output, &config.signatures).await
    }
}

/// Fetch, analyze and render one signature.
async fn lookup(
    client: &SnapshotClient,
    analyzer: TransactionAnalyzer,
    output: OutputFormat,
    signature: &str,
) -> anyhow::Result<String> {
    let snapshot = client.fetch(signature).await?;
    let analysis = analyzer
        .analyze(&snapshot)
        .with_context(|| format!("failed to reconstruct {signature}"))?;

    match output {
        OutputFormat::Text => Ok(render::render_text(&analysis)),
        OutputFormat::Json => Ok(serde_json::to_string_pretty(&analysis)?),
    }
}

async fn account_history(
    client: &SnapshotClient,
    output: OutputFormat,
    address: &str,
) -> anyhow::Result<()> {
    let entries = client
        .recent_signatures(address)
        .await
        .with_context(|| format!("failed to list transactions of {address}"))?;
    info!("{address}: {} recent transactions", entries.len());

    match output {
        OutputFormat::Text => println!("{}", render::render_account_history(address, &entries)),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&entries)?),
    }
    Ok(())
}

async fn run_once(
    client: &SnapshotClient,
    analyzer: TransactionAnalyzer,
    output: OutputFormat,
    signatures: &[String],
) -> anyhow::Result<()> {
    let mut failures = 0usize;
    for signature in signatures {
        match lookup(client, analyzer, output, signature).await {
            Ok(rendered) => println!("{rendered}"),
            Err(e) => {
                let retryable = e
                    .downcast_ref::<FetchError>()
                    .is_some_and(FetchError::is_retryable);
                if retryable {
                    error!("{signature}: transaction unavailable, try again later: {e:#}");
                } else {
                    error!("{signature}: {e:#}");
                }
                failures += 1;
            }
        }
    }

    if failures > 0 {
        anyhow::bail!("{failures} of {} transactions unavailable", signatures.len());
    }
    Ok(())
}

async fn watch(
    client: Arc<SnapshotClient>,
    analyzer: TransactionAnalyzer,
    output: OutputFormat,
) -> anyhow::Result<()> {
    info!("Watching stdin for signatures (one per line)");

    let tracker = RequestTracker::new();
    let mut in_flight: Option<JoinHandle<()>> = None;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        let signature = line.trim();
        if signature.is_empty() {
            continue;
        }

        let ticket = tracker.issue(signature);
        if let Some(previous) = in_flight.take() {
            if !previous.is_finished() {
                warn!(
                    "Superseding in-flight lookup with {} (request #{})",
                    ticket.signature(),
                    ticket.generation()
                );
            }
            previous.abort();
        }

        let client = Arc::clone(&client);
        let tracker = tracker.clone();
        in_flight = Some(tokio::spawn(async move {
            let result = lookup(&client, analyzer, output, ticket.signature()).await;
            match tracker.accept(&ticket, result) {
                Some(Ok(rendered)) => println!("{rendered}"),
                Some(Err(e)) => error!("{}: {e:#}", ticket.signature()),
                None => {}
            }
        }));
    }

    if let Some(last) = in_flight {
        if let Err(e) = last.await {
            if !e.is_cancelled() {
                error!("Lookup task failed: {e}");
            }
        }
    }
    Ok(())
}
