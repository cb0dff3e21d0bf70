use std::sync::Arc;

use serde_json::Value;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use weft_engine::{Engine, EngineError, RunOptions};

/// One trigger payload plus its metadata.
#[derive(Debug, Clone)]
pub struct Trigger {
  pub payload: Value,
  pub triggered_by: Option<String>,
  pub event: Option<String>,
}

impl Trigger {
  pub fn new(payload: Value) -> Self {
    Self {
      payload,
      triggered_by: None,
      event: None,
    }
  }
}

/// Errors from the runner boundary.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
  /// The intake channel closed; no more triggers can be submitted.
  #[error("flow runner channel closed")]
  ChannelClosed,
}

/// Executes one flow in response to trigger payloads.
///
/// # Usage
///
/// ```ignore
/// let runner = FlowRunner::new("my-flow", engine);
///
/// // Hand this to webhooks, schedulers, UI handlers, ...
/// let sender = runner.sender();
///
/// let cancel = CancellationToken::new();
/// runner.start(cancel).await;
/// ```
pub struct FlowRunner {
  flow_id: String,
  sender: mpsc::Sender<Trigger>,
  receiver: mpsc::Receiver<Trigger>,
  engine: Arc<Engine>,
}

impl FlowRunner {
  /// Create a runner for a flow with the default intake buffer.
  pub fn new(flow_id: impl Into<String>, engine: Arc<Engine>) -> Self {
    Self::with_buffer_size(flow_id, engine, 100)
  }

  /// Create a runner with a custom intake buffer size.
  pub fn with_buffer_size(
    flow_id: impl Into<String>,
    engine: Arc<Engine>,
    buffer_size: usize,
  ) -> Self {
    let (sender, receiver) = mpsc::channel(buffer_size);
    Self {
      flow_id: flow_id.into(),
      sender,
      receiver,
      engine,
    }
  }

  /// The flow this runner executes.
  pub fn flow_id(&self) -> &str {
    &self.flow_id
  }

  /// Get a sender handle for submitting triggers.
  pub fn sender(&self) -> mpsc::Sender<Trigger> {
    self.sender.clone()
  }

  /// Submit a trigger through the channel.
  pub async fn run(&self, trigger: Trigger) -> Result<(), RunnerError> {
    self
      .sender
      .send(trigger)
      .await
      .map_err(|_| RunnerError::ChannelClosed)
  }

  /// Run the intake loop until the token is cancelled or the channel
  /// closes. Triggers are executed strictly one at a time.
  pub async fn start(mut self, cancel: CancellationToken) {
    info!(flow_id = %self.flow_id, "starting flow runner");

    loop {
      tokio::select! {
        _ = cancel.cancelled() => {
          info!(flow_id = %self.flow_id, "flow runner cancelled");
          break;
        }
        trigger = self.receiver.recv() => {
          match trigger {
            Some(trigger) => self.execute_trigger(trigger).await,
            None => {
              info!(flow_id = %self.flow_id, "flow runner channel closed");
              break;
            }
          }
        }
      }
    }
  }

  async fn execute_trigger(&self, trigger: Trigger) {
    let options = RunOptions {
      triggered_by: trigger.triggered_by,
      event: trigger.event,
    };

    match self
      .engine
      .execute(&self.flow_id, trigger.payload, options)
      .await
    {
      Ok(outcome) => {
        info!(
          flow_id = %self.flow_id,
          execution_id = %outcome.execution_id,
          status = ?outcome.status,
          "flow run finished"
        );
      }
      Err(EngineError::Persistence(e)) => {
        // The run's audit trail is unreliable; keep serving triggers but
        // say so loudly.
        error!(flow_id = %self.flow_id, error = %e, "flow run audit trail failed");
      }
      Err(e) => {
        error!(flow_id = %self.flow_id, error = %e, "flow run failed to start");
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;
  use std::time::Duration;
  use weft_flow::{Connection, FlowDefinition, FlowStatus, Operation, TriggerConfig};
  use weft_ops::builtin_registry;
  use weft_store::{LogSink, MemoryStore};

  fn test_flow() -> FlowDefinition {
    FlowDefinition {
      id: "flow-1".to_string(),
      name: "Test Flow".to_string(),
      status: FlowStatus::Active,
      trigger: TriggerConfig::default(),
      operations: vec![Operation {
        id: "op-1".to_string(),
        operation_key: "note".to_string(),
        operation_type: "transform".to_string(),
        options: json!({ "value": "{{ $trigger.payload }}" }),
        sort_order: 0,
      }],
      connections: vec![Connection {
        id: "c-1".to_string(),
        source_id: "trigger".to_string(),
        target_id: "op-1".to_string(),
        branch: None,
      }],
    }
  }

  fn setup() -> (Arc<MemoryStore>, Arc<Engine>) {
    let store = Arc::new(MemoryStore::new());
    store.insert_flow(test_flow());
    let engine = Arc::new(Engine::new(
      Arc::new(builtin_registry()),
      store.clone(),
      store.clone(),
    ));
    (store, engine)
  }

  #[tokio::test]
  async fn test_runner_creation_and_sender_cloning() {
    let (_store, engine) = setup();
    let runner = FlowRunner::new("flow-1", engine);

    assert_eq!(runner.flow_id(), "flow-1");
    let s1 = runner.sender();
    let s2 = runner.sender();
    assert!(s1.same_channel(&s2));
  }

  #[tokio::test]
  async fn test_trigger_is_executed() {
    let (store, engine) = setup();
    let runner = FlowRunner::new("flow-1", engine);
    let sender = runner.sender();

    let cancel = CancellationToken::new();
    let handle = tokio::spawn(runner.start(cancel.clone()));

    sender
      .send(Trigger::new(json!({ "x": 42 })))
      .await
      .unwrap();

    // Poll the store until the run reaches a terminal state.
    let mut completed = None;
    for _ in 0..100 {
      let executions = store.list_executions("flow-1").await.unwrap();
      if let Some(record) = executions
        .into_iter()
        .find(|r| r.status == weft_store::ExecutionStatus::Completed)
      {
        completed = Some(record);
        break;
      }
      tokio::time::sleep(Duration::from_millis(10)).await;
    }
    let record = completed.expect("run did not complete");
    assert_eq!(
      record.chain.as_ref().unwrap().0["note"],
      json!({ "x": 42 })
    );

    cancel.cancel();
    handle.await.unwrap();
  }
}
