use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;

use deckflow::agents::offline_deck_agents;
use deckflow::executor::TracingObserver;
use deckflow::{DeckPlanner, ExecutionMode, ExecutorResponse, GraphExecutor, GraphPlanner, PipelineConfig};

/// Plan and run the slide-deck pipeline for one goal
#[derive(Debug, Parser)]
#[command(name = "deckflow", version)]
struct Cli {
    /// What the deck is about
    goal: String,

    /// Number of slides (clamped to 1-14)
    #[arg(short, long)]
    slides: Option<i64>,

    /// YAML pipeline configuration
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Run independent nodes concurrently
    #[arg(long)]
    parallel: bool,

    /// Directory for rendered decks
    #[arg(long)]
    out_dir: Option<PathBuf>,

    /// trace, debug, info, warn or error
    #[arg(long, default_value = "info")]
    log_level: tracing::Level,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let subscriber = tracing_subscriber::FmtSubscriber::builder()
        .with_max_level(cli.log_level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set default tracing subscriber")?;

    let config = match &cli.config {
        Some(path) => PipelineConfig::load(path)?,
        None => PipelineConfig::default(),
    };
    let mode = cli.parallel.then_some(ExecutionMode::Parallel);
    let config = config.merge(None, cli.out_dir.clone(), mode)?;

    let graph = DeckPlanner::new(config.default_slides).plan(&cli.goal, cli.slides)?;
    let agents = offline_deck_agents(&config.output_dir)?;
    let mut executor = GraphExecutor::with_config(agents, config.executor.clone())?;
    executor.add_observer(Arc::new(TracingObserver));

    let outcome = executor.run(&graph).await?;
    let response = ExecutorResponse::from_state(&graph, &outcome.state);
    println!("{}", serde_json::to_string_pretty(&response)?);

    if !outcome.report.is_complete() {
        tracing::warn!(unreached = ?outcome.report.unreached, "some nodes did not run");
    }
    Ok(())
}
