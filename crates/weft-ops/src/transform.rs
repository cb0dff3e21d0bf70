use async_trait::async_trait;
use serde_json::{Value, json};

use weft_registry::{OperationContext, OperationHandler, OperationResult};

/// Shapes data for downstream steps.
///
/// Options: `{ "value": <any> }`. Interpolation has already resolved any
/// template expressions, so the handler just forwards the value as its
/// output.
pub struct TransformOperation;

#[async_trait]
impl OperationHandler for TransformOperation {
  fn operation_type(&self) -> &str {
    "transform"
  }

  fn options_schema(&self) -> Value {
    json!({
      "type": "object",
      "properties": {
        "value": {}
      },
      "required": ["value"]
    })
  }

  async fn execute(&self, options: Value, _ctx: &OperationContext<'_>) -> OperationResult {
    let value = options.get("value").cloned().unwrap_or(Value::Null);
    OperationResult::success(value)
  }
}
