use anyhow::{Context, Result};
use clap::Parser;
use fileingest::{Config, Document, LoadConnector, LocalFileConnector};
use std::io::{BufWriter, Write};
use std::ops::ControlFlow;
use std::path::PathBuf;
use std::time::Instant;

#[derive(Parser, Debug)]
#[command(name = "ingest")]
#[command(about = "Stream text files, zip and tar archives as batches of documents (JSON lines on stdout)")]
struct Args {
    /// Files or archives to ingest, in order
    #[arg(required = true)]
    locations: Vec<PathBuf>,

    /// Documents per batch (overrides config and INDEX_BATCH_SIZE)
    #[arg(short, long)]
    batch_size: Option<usize>,

    /// Comma-separated member extensions to index, e.g. ".txt,.md"
    #[arg(short, long, value_delimiter = ',')]
    extensions: Option<Vec<String>>,

    /// Stop after this many batches
    #[arg(long)]
    max_batches: Option<usize>,

    /// Do not print batches, only log the summary
    #[arg(long)]
    summary_only: bool,
}

fn write_batch(out: &mut impl Write, batch: &[Document]) -> Result<()> {
    serde_json::to_writer(&mut *out, batch)?;
    writeln!(out)?;
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = Config::load()?;

    env_logger::Builder::from_env(
        env_logger::Env::default()
            .filter_or("RUST_LOG", config.logging.log_level.as_str())
    ).init();

    if let Some(batch_size) = args.batch_size {
        config.connector.batch_size = batch_size;
    }
    if let Some(extensions) = args.extensions {
        config.connector.accepted_extensions = extensions;
    }
    config.validate()?;

    log::info!("Starting file ingestion of {} location(s)", args.locations.len());
    log::info!("Batch size: {}", config.connector.batch_size);
    log::info!("Accepted extensions: {}", config.connector.accepted_extensions.join(", "));

    let connector = LocalFileConnector::from_config(args.locations, &config.connector)?;

    let summary_only = args.summary_only;
    let max_batches = args.max_batches;
    let mut out = BufWriter::new(std::io::stdout().lock());
    let mut write_error = None;
    let mut seen = 0usize;

    let start = Instant::now();
    let summary = connector.load_from_state(&mut |batch: Vec<Document>| {
        seen += 1;
        log::info!("Batch {}: {} document(s)", seen, batch.len());

        if !summary_only {
            if let Err(e) = write_batch(&mut out, &batch) {
                write_error = Some(e);
                return ControlFlow::Break(());
            }
        }

        match max_batches {
            Some(max) if seen >= max => ControlFlow::Break(()),
            _ => ControlFlow::Continue(()),
        }
    })?;

    if let Some(e) = write_error {
        return Err(e.context("Failed to write batch to stdout"));
    }
    out.flush().context("Failed to flush stdout")?;

    log::info!("=== Ingestion Complete ===");
    log::info!("Batches: {}", summary.batches);
    log::info!("Documents: {}", summary.documents);
    log::info!("Time: {:?}", start.elapsed());
    if !summary.completed {
        log::info!("Stopped early after {} batch(es)", summary.batches);
    }

    Ok(())
}
