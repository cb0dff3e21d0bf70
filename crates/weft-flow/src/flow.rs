use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::connection::Connection;
use crate::error::FlowError;
use crate::operation::Operation;

/// Lifecycle status of a flow definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowStatus {
  Active,
  Inactive,
  Draft,
}

/// Trigger configuration attached to a flow.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TriggerConfig {
  /// Event name the flow listens for (webhook route, event bus topic, ...).
  /// Opaque to the engine; recorded under `$trigger.event`.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub event: Option<String>,
}

/// A complete flow definition: trigger configuration, operations, and the
/// directed edges between them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowDefinition {
  pub id: String,
  pub name: String,
  pub status: FlowStatus,
  #[serde(default)]
  pub trigger: TriggerConfig,
  pub operations: Vec<Operation>,
  pub connections: Vec<Connection>,
}

impl FlowDefinition {
  /// Look up an operation by id.
  pub fn operation(&self, operation_id: &str) -> Option<&Operation> {
    self.operations.iter().find(|op| op.id == operation_id)
  }

  /// Connections that originate at the trigger.
  pub fn start_connections(&self) -> impl Iterator<Item = &Connection> {
    self.connections.iter().filter(|c| c.from_trigger())
  }

  /// Connections that originate at the given operation.
  pub fn connections_from<'a>(
    &'a self,
    operation_id: &'a str,
  ) -> impl Iterator<Item = &'a Connection> {
    self
      .connections
      .iter()
      .filter(move |c| c.source_id == operation_id)
  }

  /// Check the structural rules that must hold before the flow is runnable.
  ///
  /// Operation keys become data-chain keys, so they must be non-empty, unique
  /// within the flow, and outside the reserved `$` namespace. Connections to
  /// ids that do not exist are allowed here; traversal drops them silently.
  pub fn validate(&self) -> Result<(), FlowError> {
    let mut seen = HashSet::new();
    for op in &self.operations {
      if op.operation_key.is_empty() {
        return Err(FlowError::EmptyOperationKey(op.id.clone()));
      }
      if op.operation_key.starts_with('$') {
        return Err(FlowError::ReservedOperationKey(op.operation_key.clone()));
      }
      if !seen.insert(op.operation_key.as_str()) {
        return Err(FlowError::DuplicateOperationKey(op.operation_key.clone()));
      }
    }

    for connection in &self.connections {
      if connection.target_id == crate::TRIGGER_SOURCE {
        return Err(FlowError::TriggerAsTarget(connection.id.clone()));
      }
    }

    Ok(())
  }
}
