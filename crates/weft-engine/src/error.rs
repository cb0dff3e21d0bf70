use serde_json::Value;
use thiserror::Error;

use weft_flow::{FlowError, FlowStatus};
use weft_store::StoreError;

/// Errors raised while executing a flow.
///
/// Everything except `Persistence` is converted into a failed
/// [`RunOutcome`](crate::RunOutcome) at the engine boundary.
#[derive(Debug, Error)]
pub enum EngineError {
  /// The flow does not exist in the flow store.
  #[error("flow '{0}' not found")]
  FlowNotFound(String),

  /// The flow exists but is not active.
  #[error("flow '{flow_id}' is not active (status {status:?})")]
  FlowNotActive { flow_id: String, status: FlowStatus },

  /// The flow definition violates a structural rule.
  #[error("invalid flow definition: {0}")]
  InvalidFlow(#[from] FlowError),

  /// No handler is registered for an operation's type tag.
  #[error("unknown operation type '{operation_type}' for operation '{operation_key}'")]
  UnknownOperationType {
    operation_type: String,
    operation_key: String,
  },

  /// A handler reported failure.
  #[error("operation '{operation_key}' failed: {message}")]
  OperationFailed {
    operation_key: String,
    message: String,
    detail: Option<Value>,
  },

  /// The log sink or flow store failed; the audit trail is unreliable.
  #[error("execution audit write failed: {0}")]
  Persistence(#[from] StoreError),
}

impl EngineError {
  /// Configuration errors cover everything wrong with the flow itself, as
  /// opposed to a step failing at runtime.
  pub fn is_configuration(&self) -> bool {
    !matches!(
      self,
      EngineError::OperationFailed { .. } | EngineError::Persistence(_)
    )
  }

  /// Structured form recorded on the failed execution record.
  pub(crate) fn to_error_value(&self) -> Value {
    let kind = if self.is_configuration() {
      "configuration"
    } else {
      "operation"
    };
    let detail = match self {
      EngineError::OperationFailed { detail, .. } => detail.clone().unwrap_or(Value::Null),
      _ => Value::Null,
    };
    serde_json::json!({
      "kind": kind,
      "message": self.to_string(),
      "detail": detail,
    })
  }
}
