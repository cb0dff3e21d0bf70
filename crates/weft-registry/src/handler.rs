use async_trait::async_trait;
use serde_json::{Value, json};

use weft_chain::DataChain;
use weft_flow::Branch;

use crate::scope::ServiceScope;

/// Reserved operation type whose results drive branch filtering during
/// traversal.
pub const CONDITION_TYPE: &str = "condition";

/// Per-invocation context handed to a handler.
///
/// The chain and the service scope are shared read-only; a handler must not
/// mutate state outside its own domain.
pub struct OperationContext<'a> {
  pub execution_id: &'a str,
  pub flow_id: &'a str,
  pub operation_id: &'a str,
  pub operation_key: &'a str,
  /// The run's data chain at invocation time.
  pub chain: &'a DataChain,
  /// Read-only dependency scope shared by every handler of the run.
  pub services: &'a ServiceScope,
}

/// Outcome reported by a handler invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct OperationResult {
  pub success: bool,
  /// Recorded under the operation key on success.
  pub data: Value,
  pub error: Option<String>,
  pub error_detail: Option<Value>,
  /// Branch discriminator; only consulted for condition operations.
  pub branch: Option<Branch>,
}

impl OperationResult {
  /// A successful result carrying output data.
  pub fn success(data: Value) -> Self {
    Self {
      success: true,
      data,
      error: None,
      error_detail: None,
      branch: None,
    }
  }

  /// A failed result with a message. Fails the whole run.
  pub fn failure(error: impl Into<String>) -> Self {
    Self {
      success: false,
      data: Value::Null,
      error: Some(error.into()),
      error_detail: None,
      branch: None,
    }
  }

  /// Attach structured error detail.
  pub fn with_detail(mut self, detail: Value) -> Self {
    self.error_detail = Some(detail);
    self
  }

  /// Attach a branch discriminator.
  pub fn with_branch(mut self, branch: Branch) -> Self {
    self.branch = Some(branch);
    self
  }
}

/// The pluggable implementation behind an operation type.
///
/// Handlers are registered once, before any run starts, by an external
/// catalog. The engine treats them as opaque capabilities: it resolves one by
/// type tag, hands it interpolated options and a context, and acts on the
/// returned [`OperationResult`]. Retries and timeouts, if any, are the
/// handler's own business.
#[async_trait]
pub trait OperationHandler: Send + Sync {
  /// Type tag this handler registers under.
  fn operation_type(&self) -> &str;

  /// JSON schema describing the handler's options. Advisory; consumed by
  /// authoring UIs, not by the engine.
  fn options_schema(&self) -> Value {
    json!({ "type": "object" })
  }

  /// Execute with fully interpolated options.
  async fn execute(&self, options: Value, ctx: &OperationContext<'_>) -> OperationResult;
}
