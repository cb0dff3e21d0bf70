use serde::{Deserialize, Serialize};

/// One configured step in a flow.
///
/// The `operation_key` doubles as the data-chain key the step's output is
/// recorded under; the `operation_type` selects a handler from the operation
/// registry at execution time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operation {
  pub id: String,
  pub operation_key: String,
  pub operation_type: String,
  /// Arbitrary handler configuration. String leaves may embed `{{ path }}`
  /// expressions that are resolved against the data chain before execution.
  #[serde(default)]
  pub options: serde_json::Value,
  /// Tie-break ordering among siblings sharing a predecessor (ascending).
  #[serde(default)]
  pub sort_order: i32,
}
