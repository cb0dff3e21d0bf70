//! The execution engine: record lifecycle around the graph walk.

use std::sync::Arc;

use chrono::Utc;
use serde_json::{Value, json};
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use weft_chain::{DataChain, TRIGGER_KEY};
use weft_flow::{FlowDefinition, FlowStatus};
use weft_registry::{OperationRegistry, ServiceScope};
use weft_store::{
  ExecutionLogEntry, ExecutionPatch, ExecutionRecord, ExecutionStatus, FlowStore, Json, LogSink,
  LogStatus,
};

use crate::env::{EnvSource, StaticEnv};
use crate::error::EngineError;
use crate::outcome::{RunOutcome, RunStatus};
use crate::walk::Walk;

/// Options supplied by whatever triggers a run (webhook receiver, event
/// subscriber, manual "run now").
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
  /// Identity recorded under `$accountability.trigger`.
  pub triggered_by: Option<String>,
  /// Event name recorded under `$trigger.event`. Falls back to the flow's
  /// configured trigger event.
  pub event: Option<String>,
}

/// The flow execution engine.
///
/// Holds the registry and the collaborators; all per-run state lives inside
/// [`Engine::execute`], so any number of runs may be in flight concurrently.
pub struct Engine {
  registry: Arc<OperationRegistry>,
  flows: Arc<dyn FlowStore>,
  sink: Arc<dyn LogSink>,
  env: Arc<dyn EnvSource>,
  services: Arc<ServiceScope>,
}

impl Engine {
  pub fn new(
    registry: Arc<OperationRegistry>,
    flows: Arc<dyn FlowStore>,
    sink: Arc<dyn LogSink>,
  ) -> Self {
    Self {
      registry,
      flows,
      sink,
      env: Arc::new(StaticEnv::empty()),
      services: Arc::new(ServiceScope::new()),
    }
  }

  /// Replace the environment-snapshot source placed under `$env`.
  pub fn with_env(mut self, env: Arc<dyn EnvSource>) -> Self {
    self.env = env;
    self
  }

  /// Set the read-only dependency scope handed to every handler.
  pub fn with_services(mut self, services: ServiceScope) -> Self {
    self.services = Arc::new(services);
    self
  }

  /// Execute a flow against a trigger payload.
  ///
  /// Configuration and operation failures finalize the execution record as
  /// failed and come back as `Ok(RunOutcome { status: Failed, .. })`; only
  /// store/sink failures escape as `Err`, so callers can tell "the
  /// automation failed" apart from "the audit trail failed to write".
  #[instrument(name = "flow_execute", skip(self, payload, options), fields(flow_id = %flow_id))]
  pub async fn execute(
    &self,
    flow_id: &str,
    payload: Value,
    options: RunOptions,
  ) -> Result<RunOutcome, EngineError> {
    let execution_id = Uuid::new_v4().to_string();

    match self.load_flow(flow_id).await {
      Ok(flow) => self.run_flow(flow, execution_id, payload, options).await,
      Err(EngineError::Persistence(e)) => Err(EngineError::Persistence(e)),
      Err(rejected) => {
        self
          .record_rejection(&execution_id, flow_id, payload, &options, &rejected)
          .await?;
        warn!(error = %rejected, "run rejected by configuration");
        Ok(RunOutcome {
          execution_id,
          flow_id: flow_id.to_string(),
          status: RunStatus::Failed,
          chain: Value::Null,
          error: Some(rejected.to_error_value()),
        })
      }
    }
  }

  /// Load a flow and check it is runnable.
  async fn load_flow(&self, flow_id: &str) -> Result<FlowDefinition, EngineError> {
    let flow = self
      .flows
      .get_flow_with_details(flow_id)
      .await?
      .ok_or_else(|| EngineError::FlowNotFound(flow_id.to_string()))?;

    if flow.status != FlowStatus::Active {
      return Err(EngineError::FlowNotActive {
        flow_id: flow_id.to_string(),
        status: flow.status,
      });
    }
    flow.validate()?;
    Ok(flow)
  }

  /// Drive one run of a loaded flow to a terminal state.
  async fn run_flow(
    &self,
    flow: FlowDefinition,
    execution_id: String,
    payload: Value,
    options: RunOptions,
  ) -> Result<RunOutcome, EngineError> {
    let event = options.event.clone().or_else(|| flow.trigger.event.clone());
    let trigger = trigger_context(payload, event);
    let accountability = json!({ "trigger": options.triggered_by });
    let env = Value::Object(self.env.snapshot());
    let mut chain = DataChain::new(trigger.clone(), accountability, env);

    self
      .sink
      .create_execution(&ExecutionRecord {
        id: execution_id.clone(),
        flow_id: flow.id.clone(),
        status: ExecutionStatus::Pending,
        trigger: Json(trigger.clone()),
        triggered_by: options.triggered_by.clone(),
        chain: None,
        error: None,
        started_at: Utc::now(),
        finished_at: None,
      })
      .await?;
    self
      .sink
      .update_execution_status(
        &execution_id,
        ExecutionStatus::Running,
        ExecutionPatch::default(),
      )
      .await?;

    // Synthetic audit entry for the trigger itself.
    self
      .sink
      .add_execution_log(&ExecutionLogEntry {
        id: Uuid::new_v4().to_string(),
        execution_id: execution_id.clone(),
        operation_id: None,
        operation_key: TRIGGER_KEY.to_string(),
        status: LogStatus::Success,
        input: None,
        output: Some(Json(trigger)),
        error: None,
        duration_ms: None,
        created_at: Utc::now(),
      })
      .await?;

    info!(execution_id = %execution_id, flow_id = %flow.id, "flow execution started");

    let mut walk = Walk::new(
      &flow,
      self.registry.as_ref(),
      self.sink.as_ref(),
      self.services.as_ref(),
      &execution_id,
      &mut chain,
    );
    let walked = walk.run().await;

    match walked {
      Ok(()) => {
        self
          .sink
          .update_execution_status(
            &execution_id,
            ExecutionStatus::Completed,
            ExecutionPatch {
              chain: Some(chain.snapshot()),
              error: None,
              finished_at: Some(Utc::now()),
            },
          )
          .await?;
        info!(execution_id = %execution_id, flow_id = %flow.id, "flow execution completed");
        Ok(RunOutcome {
          execution_id,
          flow_id: flow.id,
          status: RunStatus::Completed,
          chain: chain.snapshot(),
          error: None,
        })
      }
      Err(EngineError::Persistence(e)) => Err(EngineError::Persistence(e)),
      Err(failure) => {
        let error_value = failure.to_error_value();
        self
          .sink
          .update_execution_status(
            &execution_id,
            ExecutionStatus::Failed,
            ExecutionPatch {
              chain: Some(chain.snapshot()),
              error: Some(error_value.clone()),
              finished_at: Some(Utc::now()),
            },
          )
          .await?;
        error!(
          execution_id = %execution_id,
          flow_id = %flow.id,
          error = %failure,
          "flow execution failed"
        );
        Ok(RunOutcome {
          execution_id,
          flow_id: flow.id,
          status: RunStatus::Failed,
          chain: chain.snapshot(),
          error: Some(error_value),
        })
      }
    }
  }

  /// A run rejected before it started still leaves an auditable record.
  async fn record_rejection(
    &self,
    execution_id: &str,
    flow_id: &str,
    payload: Value,
    options: &RunOptions,
    rejected: &EngineError,
  ) -> Result<(), EngineError> {
    self
      .sink
      .create_execution(&ExecutionRecord {
        id: execution_id.to_string(),
        flow_id: flow_id.to_string(),
        status: ExecutionStatus::Pending,
        trigger: Json(trigger_context(payload, options.event.clone())),
        triggered_by: options.triggered_by.clone(),
        chain: None,
        error: None,
        started_at: Utc::now(),
        finished_at: None,
      })
      .await?;
    self
      .sink
      .update_execution_status(
        execution_id,
        ExecutionStatus::Failed,
        ExecutionPatch {
          chain: None,
          error: Some(rejected.to_error_value()),
          finished_at: Some(Utc::now()),
        },
      )
      .await?;
    Ok(())
  }
}

/// Trigger context as recorded on the chain and the execution record.
fn trigger_context(payload: Value, event: Option<String>) -> Value {
  json!({
    "payload": payload,
    "event": event,
    "timestamp": Utc::now().to_rfc3339(),
  })
}
