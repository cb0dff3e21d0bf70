use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use sqlx::types::Json;

use weft_flow::FlowDefinition;

use crate::types::{ExecutionLogEntry, ExecutionPatch, ExecutionRecord, ExecutionStatus};
use crate::{FlowStore, LogSink, StoreError};

/// In-memory store implementing both collaborator traits.
///
/// Backs tests and ad-hoc CLI runs. Locks are held only for the duration of
/// a map access, never across an await point.
#[derive(Default)]
pub struct MemoryStore {
  flows: Mutex<HashMap<String, FlowDefinition>>,
  executions: Mutex<HashMap<String, ExecutionRecord>>,
  logs: Mutex<Vec<ExecutionLogEntry>>,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }

  /// Seed a flow definition.
  pub fn insert_flow(&self, flow: FlowDefinition) {
    let mut flows = self.flows.lock().unwrap_or_else(|e| e.into_inner());
    flows.insert(flow.id.clone(), flow);
  }
}

#[async_trait]
impl FlowStore for MemoryStore {
  async fn get_flow_with_details(
    &self,
    flow_id: &str,
  ) -> Result<Option<FlowDefinition>, StoreError> {
    let flows = self.flows.lock().unwrap_or_else(|e| e.into_inner());
    Ok(flows.get(flow_id).cloned())
  }
}

#[async_trait]
impl LogSink for MemoryStore {
  async fn create_execution(&self, record: &ExecutionRecord) -> Result<(), StoreError> {
    let mut executions = self.executions.lock().unwrap_or_else(|e| e.into_inner());
    executions.insert(record.id.clone(), record.clone());
    Ok(())
  }

  async fn update_execution_status(
    &self,
    execution_id: &str,
    status: ExecutionStatus,
    patch: ExecutionPatch,
  ) -> Result<(), StoreError> {
    let mut executions = self.executions.lock().unwrap_or_else(|e| e.into_inner());
    let record = executions
      .get_mut(execution_id)
      .ok_or_else(|| StoreError::NotFound(format!("execution '{execution_id}'")))?;

    record.status = status;
    if let Some(chain) = patch.chain {
      record.chain = Some(Json(chain));
    }
    if let Some(error) = patch.error {
      record.error = Some(Json(error));
    }
    if patch.finished_at.is_some() {
      record.finished_at = patch.finished_at;
    }
    Ok(())
  }

  async fn add_execution_log(&self, entry: &ExecutionLogEntry) -> Result<(), StoreError> {
    let mut logs = self.logs.lock().unwrap_or_else(|e| e.into_inner());
    logs.push(entry.clone());
    Ok(())
  }

  async fn get_execution(&self, execution_id: &str) -> Result<ExecutionRecord, StoreError> {
    let executions = self.executions.lock().unwrap_or_else(|e| e.into_inner());
    executions
      .get(execution_id)
      .cloned()
      .ok_or_else(|| StoreError::NotFound(format!("execution '{execution_id}'")))
  }

  async fn list_executions(&self, flow_id: &str) -> Result<Vec<ExecutionRecord>, StoreError> {
    let executions = self.executions.lock().unwrap_or_else(|e| e.into_inner());
    let mut records: Vec<_> = executions
      .values()
      .filter(|r| r.flow_id == flow_id)
      .cloned()
      .collect();
    records.sort_by(|a, b| b.started_at.cmp(&a.started_at));
    Ok(records)
  }

  async fn list_execution_logs(
    &self,
    execution_id: &str,
  ) -> Result<Vec<ExecutionLogEntry>, StoreError> {
    let logs = self.logs.lock().unwrap_or_else(|e| e.into_inner());
    Ok(
      logs
        .iter()
        .filter(|entry| entry.execution_id == execution_id)
        .cloned()
        .collect(),
    )
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::Utc;
  use serde_json::json;
  use weft_flow::{FlowStatus, TriggerConfig};

  fn record(id: &str) -> ExecutionRecord {
    ExecutionRecord {
      id: id.to_string(),
      flow_id: "flow-1".to_string(),
      status: ExecutionStatus::Pending,
      trigger: Json(json!({"payload": {}})),
      triggered_by: None,
      chain: None,
      error: None,
      started_at: Utc::now(),
      finished_at: None,
    }
  }

  #[tokio::test]
  async fn test_flow_round_trip() {
    let store = MemoryStore::new();
    store.insert_flow(FlowDefinition {
      id: "flow-1".to_string(),
      name: "Test".to_string(),
      status: FlowStatus::Active,
      trigger: TriggerConfig::default(),
      operations: vec![],
      connections: vec![],
    });

    assert!(
      store
        .get_flow_with_details("flow-1")
        .await
        .unwrap()
        .is_some()
    );
    assert!(
      store
        .get_flow_with_details("missing")
        .await
        .unwrap()
        .is_none()
    );
  }

  #[tokio::test]
  async fn test_execution_lifecycle() {
    let store = MemoryStore::new();
    store.create_execution(&record("exec-1")).await.unwrap();

    store
      .update_execution_status(
        "exec-1",
        ExecutionStatus::Completed,
        ExecutionPatch {
          chain: Some(json!({"$last": 1})),
          error: None,
          finished_at: Some(Utc::now()),
        },
      )
      .await
      .unwrap();

    let stored = store.get_execution("exec-1").await.unwrap();
    assert_eq!(stored.status, ExecutionStatus::Completed);
    assert_eq!(stored.chain, Some(Json(json!({"$last": 1}))));
    assert!(stored.finished_at.is_some());
  }

  #[tokio::test]
  async fn test_logs_keep_append_order() {
    let store = MemoryStore::new();
    for (i, status) in [crate::LogStatus::Running, crate::LogStatus::Success]
      .into_iter()
      .enumerate()
    {
      store
        .add_execution_log(&ExecutionLogEntry {
          id: format!("log-{i}"),
          execution_id: "exec-1".to_string(),
          operation_id: Some("op-1".to_string()),
          operation_key: "greet".to_string(),
          status,
          input: None,
          output: None,
          error: None,
          duration_ms: None,
          created_at: Utc::now(),
        })
        .await
        .unwrap();
    }

    let logs = store.list_execution_logs("exec-1").await.unwrap();
    assert_eq!(logs.len(), 2);
    assert_eq!(logs[0].status, crate::LogStatus::Running);
    assert_eq!(logs[1].status, crate::LogStatus::Success);
  }
}
