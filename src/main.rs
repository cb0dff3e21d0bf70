use std::io::{self, Read};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use weft_engine::{AllowlistEnv, Engine, RunOptions, RunStatus};
use weft_flow::FlowDefinition;
use weft_ops::builtin_registry;
use weft_store::{MemoryStore, SqliteStore};

/// Comma-separated list of environment variables exposed to flows as `$env`.
const ENV_ALLOW_VAR: &str = "WEFT_ENV_ALLOW";

/// Weft - a flow execution engine
#[derive(Parser)]
#[command(name = "weft")]
#[command(version, about, long_about = None)]
struct Cli {
  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Execute a flow definition against a payload read from stdin
  Run {
    /// Path to the flow definition (JSON)
    flow_file: PathBuf,

    /// Identity recorded on the execution record
    #[arg(long)]
    triggered_by: Option<String>,

    /// Event name recorded on the trigger context
    #[arg(long)]
    event: Option<String>,

    /// Persist the audit trail to this SQLite file instead of memory
    #[arg(long)]
    db: Option<PathBuf>,
  },

  /// Print the audit trail of a past execution
  Logs {
    /// The SQLite file the execution was recorded in
    #[arg(long)]
    db: PathBuf,

    /// The execution id
    execution_id: String,
  },
}

#[tokio::main]
async fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::from_default_env())
    .with_writer(io::stderr)
    .init();

  let cli = Cli::parse();

  match cli.command {
    Commands::Run {
      flow_file,
      triggered_by,
      event,
      db,
    } => run_flow(flow_file, triggered_by, event, db).await,
    Commands::Logs { db, execution_id } => print_logs(db, execution_id).await,
  }
}

async fn run_flow(
  flow_file: PathBuf,
  triggered_by: Option<String>,
  event: Option<String>,
  db: Option<PathBuf>,
) -> Result<()> {
  let content = tokio::fs::read_to_string(&flow_file)
    .await
    .with_context(|| format!("failed to read flow file: {}", flow_file.display()))?;
  let flow: FlowDefinition = serde_json::from_str(&content)
    .with_context(|| format!("failed to parse flow file: {}", flow_file.display()))?;
  flow.validate().context("invalid flow definition")?;
  let flow_id = flow.id.clone();

  let payload = read_payload_from_stdin()?;

  // Seed the store with the flow, then run against it.
  let engine = match db {
    Some(path) => {
      let store = Arc::new(
        SqliteStore::connect(&path)
          .await
          .with_context(|| format!("failed to open database: {}", path.display()))?,
      );
      store
        .upsert_flow(&flow)
        .await
        .context("failed to store flow definition")?;
      Engine::new(Arc::new(builtin_registry()), store.clone(), store)
    }
    None => {
      let store = Arc::new(MemoryStore::new());
      store.insert_flow(flow);
      Engine::new(Arc::new(builtin_registry()), store.clone(), store)
    }
  };
  let engine = engine.with_env(Arc::new(allowlist_from_env()));

  let options = RunOptions {
    triggered_by,
    event,
  };
  let outcome = engine
    .execute(&flow_id, payload, options)
    .await
    .context("failed to record execution")?;

  println!("{}", serde_json::to_string_pretty(&outcome)?);

  if outcome.status == RunStatus::Failed {
    std::process::exit(1);
  }
  Ok(())
}

async fn print_logs(db: PathBuf, execution_id: String) -> Result<()> {
  use weft_store::LogSink;

  let store = SqliteStore::connect(&db)
    .await
    .with_context(|| format!("failed to open database: {}", db.display()))?;

  let record = store
    .get_execution(&execution_id)
    .await
    .with_context(|| format!("execution '{}' not found", execution_id))?;
  let entries = store
    .list_execution_logs(&execution_id)
    .await
    .context("failed to load execution logs")?;

  let output = serde_json::json!({
    "execution": record,
    "logs": entries,
  });
  println!("{}", serde_json::to_string_pretty(&output)?);

  Ok(())
}

/// Environment variables named in `WEFT_ENV_ALLOW` become the `$env`
/// snapshot. Everything else stays out of flows.
fn allowlist_from_env() -> AllowlistEnv {
  let allow = std::env::var(ENV_ALLOW_VAR)
    .unwrap_or_default()
    .split(',')
    .map(str::trim)
    .filter(|name| !name.is_empty())
    .map(str::to_string)
    .collect::<Vec<_>>();
  AllowlistEnv::new(allow)
}

fn read_payload_from_stdin() -> Result<serde_json::Value> {
  use std::io::IsTerminal;

  if io::stdin().is_terminal() {
    // No stdin pipe, use empty object
    Ok(serde_json::json!({}))
  } else {
    let mut input = String::new();
    io::stdin()
      .read_to_string(&mut input)
      .context("failed to read payload from stdin")?;

    if input.trim().is_empty() {
      Ok(serde_json::json!({}))
    } else {
      serde_json::from_str(&input).context("failed to parse payload JSON from stdin")
    }
  }
}
