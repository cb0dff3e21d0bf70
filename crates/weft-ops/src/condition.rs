use async_trait::async_trait;
use serde_json::{Value, json};

use weft_flow::Branch;
use weft_registry::{CONDITION_TYPE, OperationContext, OperationHandler, OperationResult};

/// Routes the walk down the success or failure branch.
///
/// Options: `{ "when": <any> }`, judged by JSON truthiness after
/// interpolation. An unmatched condition selects the failure branch; it
/// does not fail the run.
pub struct ConditionOperation;

/// JSON truthiness: false, null, 0, empty string/array/object are false.
fn truthy(value: &Value) -> bool {
  match value {
    Value::Null => false,
    Value::Bool(b) => *b,
    Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
    Value::String(s) => !s.is_empty(),
    Value::Array(a) => !a.is_empty(),
    Value::Object(o) => !o.is_empty(),
  }
}

#[async_trait]
impl OperationHandler for ConditionOperation {
  fn operation_type(&self) -> &str {
    CONDITION_TYPE
  }

  fn options_schema(&self) -> Value {
    json!({
      "type": "object",
      "properties": {
        "when": {}
      },
      "required": ["when"]
    })
  }

  async fn execute(&self, options: Value, _ctx: &OperationContext<'_>) -> OperationResult {
    let matched = options.get("when").is_some_and(truthy);
    let branch = if matched {
      Branch::Success
    } else {
      Branch::Failure
    };

    OperationResult::success(json!({ "matched": matched })).with_branch(branch)
  }
}
