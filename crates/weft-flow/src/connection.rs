use serde::{Deserialize, Serialize};

/// Literal `source_id` marking an edge that originates at the trigger rather
/// than at an operation.
pub const TRIGGER_SOURCE: &str = "trigger";

/// Branch discriminator carried by condition results and connection tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Branch {
  Success,
  Failure,
}

/// A directed edge between two operations, or from the trigger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Connection {
  pub id: String,
  /// An operation id, or the [`TRIGGER_SOURCE`] literal.
  pub source_id: String,
  pub target_id: String,
  /// Optional branch tag. Only consulted when the source operation is a
  /// condition whose result carries a branch discriminator.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub branch: Option<Branch>,
}

impl Connection {
  /// Whether this edge originates at the trigger.
  pub fn from_trigger(&self) -> bool {
    self.source_id == TRIGGER_SOURCE
  }
}
