use async_trait::async_trait;
use chrono::Utc;
use serde_json::{Value, json};
use tracing::info;

use weft_chain::to_text;
use weft_registry::{OperationContext, OperationHandler, OperationResult};

/// Writes a message to the host log and records what was logged.
///
/// Options: `{ "message": <any> }`. The message arrives already
/// interpolated; non-string values are rendered the same way embedded
/// template expressions are.
pub struct LogOperation;

#[async_trait]
impl OperationHandler for LogOperation {
  fn operation_type(&self) -> &str {
    "log"
  }

  fn options_schema(&self) -> Value {
    json!({
      "type": "object",
      "properties": {
        "message": {}
      },
      "required": ["message"]
    })
  }

  async fn execute(&self, options: Value, ctx: &OperationContext<'_>) -> OperationResult {
    let message = options.get("message").map(to_text).unwrap_or_default();

    info!(
      execution_id = %ctx.execution_id,
      flow_id = %ctx.flow_id,
      operation_key = %ctx.operation_key,
      message = %message,
      "flow log"
    );

    OperationResult::success(json!({
      "logged": message,
      "timestamp": Utc::now().to_rfc3339(),
    }))
  }
}
