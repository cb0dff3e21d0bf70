use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use sqlx::types::Json;

/// Status of a flow execution.
///
/// `Pending → Running → {Completed | Failed}`; each terminal state is
/// reached at most once. A run rejected by configuration before it starts
/// short-circuits `Pending → Failed` without passing through `Running`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum ExecutionStatus {
  Pending,
  Running,
  Completed,
  Failed,
}

/// Status of one step-level log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum LogStatus {
  Running,
  Success,
  Failure,
}

/// One run of a flow against one trigger payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct ExecutionRecord {
  pub id: String,
  pub flow_id: String,
  pub status: ExecutionStatus,
  /// Trigger context as recorded on the chain: payload, event, timestamp.
  pub trigger: Json<Value>,
  pub triggered_by: Option<String>,
  /// Final data chain snapshot, set at finalization.
  pub chain: Option<Json<Value>>,
  /// Error detail, set when the run fails.
  pub error: Option<Json<Value>>,
  pub started_at: DateTime<Utc>,
  pub finished_at: Option<DateTime<Utc>>,
}

/// One step-level audit entry.
///
/// Every operation invocation produces exactly one `Running` entry followed
/// by exactly one terminal entry. The synthetic trigger entry (no
/// `operation_id`) is a single `Success` entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct ExecutionLogEntry {
  pub id: String,
  pub execution_id: String,
  /// Absent for the synthetic trigger entry.
  pub operation_id: Option<String>,
  pub operation_key: String,
  pub status: LogStatus,
  /// Interpolated options the handler was invoked with.
  pub input: Option<Json<Value>>,
  pub output: Option<Json<Value>>,
  /// `{ "message": ..., "detail": ... }` for failure entries.
  pub error: Option<Json<Value>>,
  pub duration_ms: Option<i64>,
  pub created_at: DateTime<Utc>,
}

/// Fields applied alongside a status transition.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExecutionPatch {
  pub chain: Option<Value>,
  pub error: Option<Value>,
  pub finished_at: Option<DateTime<Utc>>,
}
