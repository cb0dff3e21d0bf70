//! Weft Store
//!
//! Storage traits and implementations for flow definitions and execution
//! audit records.
//!
//! Two collaborator traits are consumed by the engine:
//! - [`FlowStore`] hands out flow definitions with operations and
//!   connections attached.
//! - [`LogSink`] receives step-level and run-level status transitions. The
//!   engine awaits every sink call before proceeding, so log ordering always
//!   matches execution ordering.
//!
//! [`MemoryStore`] backs tests and ad-hoc runs; [`SqliteStore`] persists to
//! SQLite via sqlx.

mod memory;
mod sqlite;
mod types;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use types::{
  ExecutionLogEntry, ExecutionPatch, ExecutionRecord, ExecutionStatus, LogStatus,
};

// Audit payload columns are stored as JSON.
pub use sqlx::types::Json;

use async_trait::async_trait;

use weft_flow::FlowDefinition;

/// Error type for storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
  /// The requested record was not found.
  #[error("not found: {0}")]
  NotFound(String),

  /// A database error occurred.
  #[error("database error: {0}")]
  Database(#[from] sqlx::Error),

  /// A stored payload could not be (de)serialized.
  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

/// Hands out flow definitions to the engine.
#[async_trait]
pub trait FlowStore: Send + Sync {
  /// Load a flow with its operations and connections attached.
  ///
  /// `Ok(None)` means the flow does not exist; `Err` is reserved for storage
  /// failures.
  async fn get_flow_with_details(&self, flow_id: &str)
  -> Result<Option<FlowDefinition>, StoreError>;
}

/// Receives the execution audit trail.
#[async_trait]
pub trait LogSink: Send + Sync {
  /// Create a new execution record.
  async fn create_execution(&self, record: &ExecutionRecord) -> Result<(), StoreError>;

  /// Transition an execution's status, applying the terminal patch if any.
  async fn update_execution_status(
    &self,
    execution_id: &str,
    status: ExecutionStatus,
    patch: ExecutionPatch,
  ) -> Result<(), StoreError>;

  /// Append a step-level log entry.
  async fn add_execution_log(&self, entry: &ExecutionLogEntry) -> Result<(), StoreError>;

  /// Read back an execution record.
  async fn get_execution(&self, execution_id: &str) -> Result<ExecutionRecord, StoreError>;

  /// List a flow's executions, most recent first.
  async fn list_executions(&self, flow_id: &str) -> Result<Vec<ExecutionRecord>, StoreError>;

  /// Read back the log entries of an execution, in append order.
  async fn list_execution_logs(
    &self,
    execution_id: &str,
  ) -> Result<Vec<ExecutionLogEntry>, StoreError>;
}
