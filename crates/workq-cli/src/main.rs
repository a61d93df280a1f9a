//! workq CLI: run the cancellation demo against live workers, or check a
//! config file.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use clap::{Parser, Subcommand};
use tokio::time::{Duration, sleep, timeout};
use tracing_subscriber::EnvFilter;
use workq_core::{QueueId, Work, WorkHandler, WorkQueues, WorkerGroup, WorkqConfig, WorkqError};

const DEMO_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Parser)]
#[command(name = "workq", version, about = "Numbered work queues with cancellation")]
struct Cli {
    /// Registry configuration (defaults are used if the file is missing)
    #[arg(long, global = true, default_value = "workq.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Queue two items, cancel the first, and let the worker run the rest
    Demo {
        /// Queue to use
        #[arg(long, default_value_t = 0)]
        qid: usize,
    },
    /// Validate the configuration file and print the queue layout
    CheckConfig,
}

struct HelloHandler {
    runs: AtomicU32,
}

#[async_trait]
impl WorkHandler for HelloHandler {
    async fn run(&self, arg: &serde_json::Value) -> Result<(), WorkqError> {
        let name = arg["name"]
            .as_str()
            .ok_or_else(|| WorkqError::Other("missing 'name' argument".to_string()))?;
        self.runs.fetch_add(1, Ordering::Relaxed);
        println!("Hello, {name}!");
        Ok(())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let (config, found) = load_config(&cli.config)?;

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();
    if !found {
        tracing::info!(path = %cli.config.display(), "no config file; using defaults");
    }

    match cli.command {
        Command::Demo { qid } => demo(&config, QueueId::new(qid)).await,
        Command::CheckConfig => {
            for (index, queue) in config.queues.iter().enumerate() {
                println!("qid={index} name={}", queue.name);
            }
            Ok(())
        }
    }
}

/// Load the config and report whether the file existed. The log level lives
/// in the config, so the fallback is logged by the caller once tracing is up.
fn load_config(path: &Path) -> anyhow::Result<(WorkqConfig, bool)> {
    let found = path.exists();
    let config = WorkqConfig::load(path)?;
    Ok((config, found))
}

async fn wait_for_runs(handler: &HelloHandler, runs: u32, limit: Duration) -> anyhow::Result<()> {
    timeout(limit, async {
        while handler.runs.load(Ordering::Relaxed) < runs {
            sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .map_err(|_| anyhow::anyhow!("worker did not run {runs} item(s) within {limit:?}"))
}

async fn demo(config: &WorkqConfig, qid: QueueId) -> anyhow::Result<()> {
    let queues = Arc::new(WorkQueues::new(config)?);
    let handler = Arc::new(HelloHandler {
        runs: AtomicU32::new(0),
    });

    // Queue both items before the worker starts so the cancel is deterministic.
    let w1 = Work::new();
    let w2 = Work::new();
    queues.submit(qid, &w1, handler.clone(), serde_json::json!({ "name": "w1" }))?;
    queues.submit(qid, &w2, handler.clone(), serde_json::json!({ "name": "w2" }))?;
    println!("pending: {:?}", queues.pending(qid)?);

    queues.cancel(qid, &w1)?;
    println!("cancelled {}: pending {:?}", w1.id(), queues.pending(qid)?);

    queues.cancel(qid, &w1)?;
    println!("cancelled {} again: pending {:?}", w1.id(), queues.pending(qid)?);

    let group = WorkerGroup::spawn(Arc::clone(&queues));
    let waited = wait_for_runs(&handler, 1, DEMO_TIMEOUT).await;
    group.shutdown_and_join().await;
    waited?;

    let counts = queues.counts(qid)?;
    tracing::info!(%qid, cancelled = counts.cancelled, claimed = counts.claimed, "demo finished");
    println!("counts: {}", serde_json::to_string(&counts)?);
    Ok(())
}
