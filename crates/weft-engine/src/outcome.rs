use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Terminal status of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
  Completed,
  Failed,
}

/// Structured result of one run, returned to every caller regardless of how
/// the run went.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunOutcome {
  pub execution_id: String,
  pub flow_id: String,
  pub status: RunStatus,
  /// Final data chain snapshot.
  pub chain: Value,
  /// Present iff `status` is `Failed`:
  /// `{ "kind": "configuration" | "operation", "message", "detail" }`.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub error: Option<Value>,
}

impl RunOutcome {
  pub fn is_completed(&self) -> bool {
    self.status == RunStatus::Completed
  }
}
