//! Command-line runner for conveyor pipelines.
//!
//! `pipeline` runs a staged plan from a JSON file (or the built-in laundry
//! demo plan); `dispatch` runs the token dispatch demo against a small
//! sample text.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};

use conveyor::dispatch::{
    BoxedHandler, DispatchPool, DispatchPoolOptions, FixedCostHandler, PerCharHandler,
    SentinelPredicate, WorkQueue,
};
use conveyor::{Pipeline, PipelineOptions, StageOptions, init_logging};

/// Tokens short enough for the fixed-cost handler; longer ones pay per
/// character.
const TOKEN_LEN_THRESHOLD: usize = 4;

const SAMPLE_TEXT: &str = "Lorem ipsum dolor sit amet consectetur adipiscing \
     elit sed do eiusmod tempor incididunt ut labore et dolore magna aliqua";

#[derive(Parser, Debug)]
#[command(name = "conveyor-run", about = "Run a staged worker-pool pipeline")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a staged pipeline plan to completion.
    Pipeline {
        /// Path to a JSON plan; the built-in wash/dry/iron demo runs if omitted.
        #[arg(long)]
        config: Option<PathBuf>,
        /// Override the plan's work volume.
        #[arg(long)]
        total_items: Option<u64>,
    },
    /// Run the token dispatch demo: classify sample-text tokens by length.
    Dispatch {
        #[arg(long, default_value_t = 4)]
        pool_size: usize,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();

    let args = Args::parse();
    match args.command {
        Command::Pipeline {
            config,
            total_items,
        } => run_pipeline(config, total_items).await,
        Command::Dispatch { pool_size } => run_dispatch(pool_size).await,
    }
}

async fn run_pipeline(config: Option<PathBuf>, total_items: Option<u64>) -> anyhow::Result<()> {
    let mut options = match config {
        Some(path) => {
            let raw = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read plan {}", path.display()))?;
            serde_json::from_str(&raw)
                .with_context(|| format!("failed to parse plan {}", path.display()))?
        }
        None => demo_plan(),
    };

    if let Some(total_items) = total_items {
        options.total_items = total_items;
    }

    let pipeline = Pipeline::new(options)?;
    let report = pipeline.run().await?;

    println!(
        "processed {} items in {}ms",
        report.total_items, report.total_duration_ms
    );
    for stage in &report.stages {
        println!(
            "  {:<12} pool={} processed={}",
            stage.name, stage.pool_size, stage.items_processed
        );
    }

    Ok(())
}

/// The classic laundry exercise: wash, dry, iron.
fn demo_plan() -> PipelineOptions {
    PipelineOptions {
        total_items: 1000,
        stages: vec![
            StageOptions {
                name: "wash".into(),
                work_duration_ms: 8,
                pool_size: 4,
            },
            StageOptions {
                name: "dry".into(),
                work_duration_ms: 4,
                pool_size: 2,
            },
            StageOptions {
                name: "iron".into(),
                work_duration_ms: 2,
                pool_size: 1,
            },
        ],
        poll_interval_ms: 250,
    }
}

async fn run_dispatch(pool_size: usize) -> anyhow::Result<()> {
    let queue = WorkQueue::new();

    let handlers: Vec<BoxedHandler<String>> = vec![
        Box::new(FixedCostHandler::new(
            TOKEN_LEN_THRESHOLD,
            Duration::from_millis(2),
        )),
        Box::new(PerCharHandler::new(
            TOKEN_LEN_THRESHOLD,
            Duration::from_millis(1),
        )),
    ];
    let sentinel: SentinelPredicate<String> = Arc::new(|token: &String| token == "stop");

    let pool = DispatchPool::spawn(
        queue.clone(),
        handlers,
        Some(sentinel),
        DispatchPoolOptions {
            pool_size,
            ..Default::default()
        },
    )?;
    let stats = pool.stats();

    let tokens: Vec<&str> = SAMPLE_TEXT.split_whitespace().collect();
    let token_count = tokens.len() as u64;
    for token in tokens {
        queue.push(token.to_string());
    }

    // Let the pool drain the queue, then stop it with the sentinel.
    while stats.total_dispatched() + stats.unrouted() < token_count {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    queue.push("stop".to_string());
    pool.join().await?;

    println!("dispatched {} tokens", stats.total_dispatched());
    for handler in ["fixed_cost", "per_char"] {
        if let Some(count) = stats.dispatched(handler) {
            println!("  {:<12} handled={}", handler, count);
        }
    }

    Ok(())
}
