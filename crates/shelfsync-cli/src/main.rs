mod output;
mod sync;

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "shelfsync-cli")]
#[command(about = "Crawl the product listing API and sync it to the storage table")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Crawl every listing page, write the output file, then upload the records.
    Sync {
        /// Crawl and write the output file without uploading.
        #[arg(long)]
        dry_run: bool,
        /// Output file path; overrides SHELFSYNC_OUTPUT_PATH.
        #[arg(long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        println!("shelfsync-cli: nothing to do; run `shelfsync-cli sync` to crawl and upload");
        return Ok(());
    };

    let config = shelfsync_core::load_app_config().context("failed to load configuration")?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();
    tracing::debug!(?config, "configuration loaded");

    let cancel = CancellationToken::new();
    cancel_on_ctrl_c(cancel.clone());

    match command {
        Commands::Sync { dry_run, output } => {
            let options = sync::SyncOptions { dry_run, output };
            let summary = sync::run_sync(&config, &options, &cancel).await?;
            tracing::info!(
                pages_fetched = summary.pages_fetched,
                records = summary.records_collected,
                crawl_completed = summary.crawl_completed,
                output_written = summary.output_written,
                records_uploaded = summary.upload.as_ref().map_or(0, |r| r.records_uploaded),
                "sync finished"
            );
        }
    }

    Ok(())
}

/// Cancels `token` on the first Ctrl-C. The crawl and upload loops stop at
/// their next page or batch boundary.
fn cancel_on_ctrl_c(token: CancellationToken) {
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::warn!("received Ctrl-C; stopping after the current request");
                token.cancel();
            }
            Err(e) => tracing::error!(error = %e, "failed to listen for Ctrl-C"),
        }
    });
}
