//! Depth-first traversal of one flow run.

use std::collections::{HashMap, HashSet};
use std::panic::AssertUnwindSafe;
use std::time::Instant;

use chrono::Utc;
use futures::FutureExt;
use futures::future::BoxFuture;
use serde_json::{Value, json};
use tracing::{error, info};
use uuid::Uuid;

use weft_chain::{DataChain, interpolate};
use weft_flow::{FlowDefinition, Operation};
use weft_registry::{
  CONDITION_TYPE, OperationContext, OperationRegistry, OperationResult, ServiceScope,
};
use weft_store::{ExecutionLogEntry, Json, LogSink, LogStatus};

use crate::error::EngineError;

/// Per-run traversal state. Owns the data chain for the duration of the
/// walk; nothing else touches it until the walk returns.
pub(crate) struct Walk<'r> {
  flow: &'r FlowDefinition,
  registry: &'r OperationRegistry,
  sink: &'r dyn LogSink,
  services: &'r ServiceScope,
  execution_id: &'r str,
  chain: &'r mut DataChain,
  /// Execute-once-per-run set: a diamond's shared node runs on first
  /// arrival only, and cyclic graphs terminate.
  visited: HashSet<String>,
  /// Declaration order, the stable tie-break below equal `sort_order`.
  position: HashMap<String, usize>,
}

impl<'r> Walk<'r> {
  pub(crate) fn new(
    flow: &'r FlowDefinition,
    registry: &'r OperationRegistry,
    sink: &'r dyn LogSink,
    services: &'r ServiceScope,
    execution_id: &'r str,
    chain: &'r mut DataChain,
  ) -> Self {
    let position = flow
      .operations
      .iter()
      .enumerate()
      .map(|(index, op)| (op.id.clone(), index))
      .collect();

    Self {
      flow,
      registry,
      sink,
      services,
      execution_id,
      chain,
      visited: HashSet::new(),
      position,
    }
  }

  /// Walk the graph from the start set. An empty start set is a no-op
  /// completion.
  pub(crate) async fn run(&mut self) -> Result<(), EngineError> {
    let start = self.start_wave();
    self.execute_wave(start).await
  }

  /// Operations reachable by a connection whose source is the trigger
  /// literal.
  fn start_wave(&self) -> Vec<&'r Operation> {
    let targets = self
      .flow
      .start_connections()
      .filter_map(|c| self.flow.operation(&c.target_id))
      .collect();
    self.sort_wave(targets)
  }

  fn sort_wave(&self, mut wave: Vec<&'r Operation>) -> Vec<&'r Operation> {
    wave.sort_by_key(|op| {
      (
        op.sort_order,
        self.position.get(&op.id).copied().unwrap_or(usize::MAX),
      )
    });
    wave
  }

  /// Branching rule: follow every outgoing connection, unless the finished
  /// operation is a condition whose result carries a branch discriminator -
  /// then only connections tagged with the matching branch survive.
  /// Targets absent from the flow are dropped silently.
  fn next_wave(&self, operation: &Operation, result: &OperationResult) -> Vec<&'r Operation> {
    let branch_filter = (operation.operation_type == CONDITION_TYPE)
      .then_some(result.branch)
      .flatten();

    let targets = self
      .flow
      .connections_from(&operation.id)
      .filter(|c| match branch_filter {
        Some(branch) => c.branch == Some(branch),
        None => true,
      })
      .filter_map(|c| self.flow.operation(&c.target_id))
      .collect();
    self.sort_wave(targets)
  }

  /// Execute a wave of sibling operations strictly in order, recursing into
  /// each operation's successors before advancing to the next sibling.
  ///
  /// Boxing makes the recursion a single chained future; one run never
  /// executes anything in parallel.
  fn execute_wave<'s>(
    &'s mut self,
    wave: Vec<&'r Operation>,
  ) -> BoxFuture<'s, Result<(), EngineError>> {
    Box::pin(async move {
      for operation in wave {
        if !self.visited.insert(operation.id.clone()) {
          continue;
        }
        let result = self.run_operation(operation).await?;
        let next = self.next_wave(operation, &result);
        self.execute_wave(next).await?;
      }
      Ok(())
    })
  }

  /// Execute one operation: resolve its handler, interpolate options, log
  /// the `Running`/terminal pair, and update the chain on success.
  async fn run_operation(
    &mut self,
    operation: &'r Operation,
  ) -> Result<OperationResult, EngineError> {
    let handler = self.registry.get(&operation.operation_type).ok_or_else(|| {
      EngineError::UnknownOperationType {
        operation_type: operation.operation_type.clone(),
        operation_key: operation.operation_key.clone(),
      }
    })?;

    let resolved = interpolate(&operation.options, self.chain);

    self
      .sink
      .add_execution_log(&ExecutionLogEntry {
        id: Uuid::new_v4().to_string(),
        execution_id: self.execution_id.to_string(),
        operation_id: Some(operation.id.clone()),
        operation_key: operation.operation_key.clone(),
        status: LogStatus::Running,
        input: Some(Json(resolved.clone())),
        output: None,
        error: None,
        duration_ms: None,
        created_at: Utc::now(),
      })
      .await?;

    info!(
      execution_id = %self.execution_id,
      operation_key = %operation.operation_key,
      operation_type = %operation.operation_type,
      "operation started"
    );

    let started = Instant::now();
    let result = {
      let ctx = OperationContext {
        execution_id: self.execution_id,
        flow_id: &self.flow.id,
        operation_id: &operation.id,
        operation_key: &operation.operation_key,
        chain: self.chain,
        services: self.services,
      };
      // A panicking handler must not unwind past the engine; it fails the
      // run like any other operation failure.
      AssertUnwindSafe(handler.execute(resolved.clone(), &ctx))
        .catch_unwind()
        .await
        .unwrap_or_else(|panic| OperationResult::failure(panic_message(panic.as_ref())))
    };
    let duration_ms = started.elapsed().as_millis() as i64;

    if result.success {
      self
        .chain
        .record(&operation.operation_key, result.data.clone());

      self
        .sink
        .add_execution_log(&ExecutionLogEntry {
          id: Uuid::new_v4().to_string(),
          execution_id: self.execution_id.to_string(),
          operation_id: Some(operation.id.clone()),
          operation_key: operation.operation_key.clone(),
          status: LogStatus::Success,
          input: Some(Json(resolved)),
          output: Some(Json(result.data.clone())),
          error: None,
          duration_ms: Some(duration_ms),
          created_at: Utc::now(),
        })
        .await?;

      info!(
        execution_id = %self.execution_id,
        operation_key = %operation.operation_key,
        duration_ms,
        "operation succeeded"
      );
      Ok(result)
    } else {
      let message = result
        .error
        .clone()
        .unwrap_or_else(|| "operation handler reported failure".to_string());
      let detail = result.error_detail.clone().unwrap_or(Value::Null);

      self
        .sink
        .add_execution_log(&ExecutionLogEntry {
          id: Uuid::new_v4().to_string(),
          execution_id: self.execution_id.to_string(),
          operation_id: Some(operation.id.clone()),
          operation_key: operation.operation_key.clone(),
          status: LogStatus::Failure,
          input: Some(Json(resolved)),
          output: None,
          error: Some(Json(json!({ "message": message, "detail": detail }))),
          duration_ms: Some(duration_ms),
          created_at: Utc::now(),
        })
        .await?;

      error!(
        execution_id = %self.execution_id,
        operation_key = %operation.operation_key,
        error = %message,
        duration_ms,
        "operation failed"
      );
      Err(EngineError::OperationFailed {
        operation_key: operation.operation_key.clone(),
        message,
        detail: result.error_detail,
      })
    }
  }
}

/// Message carried by a handler panic, best effort.
fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
  let message = panic
    .downcast_ref::<&str>()
    .map(|s| s.to_string())
    .or_else(|| panic.downcast_ref::<String>().cloned())
    .unwrap_or_else(|| "unknown panic".to_string());
  format!("operation handler panicked: {message}")
}
