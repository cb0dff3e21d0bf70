use serde_json::{Map, Value};

/// Trigger context: payload, event name, timestamp.
pub const TRIGGER_KEY: &str = "$trigger";
/// Who or what triggered the run.
pub const ACCOUNTABILITY_KEY: &str = "$accountability";
/// Allow-listed snapshot of environment values.
pub const ENV_KEY: &str = "$env";
/// Output of the most recently completed operation.
pub const LAST_KEY: &str = "$last";

/// The mutable context threaded through one flow execution.
///
/// Writes are last-write-wins. Keys starting with `$` are reserved for the
/// engine; flow validation guarantees no operation key collides with them.
#[derive(Debug, Clone, PartialEq)]
pub struct DataChain {
  values: Map<String, Value>,
}

impl DataChain {
  /// Build the initial chain for a run.
  pub fn new(trigger: Value, accountability: Value, env: Value) -> Self {
    let mut values = Map::new();
    values.insert(TRIGGER_KEY.to_string(), trigger);
    values.insert(ACCOUNTABILITY_KEY.to_string(), accountability);
    values.insert(ENV_KEY.to_string(), env);
    values.insert(LAST_KEY.to_string(), Value::Null);
    Self { values }
  }

  /// Get a value by chain key.
  pub fn get(&self, key: &str) -> Option<&Value> {
    self.values.get(key)
  }

  /// Output of the most recently completed operation.
  pub fn last(&self) -> &Value {
    self.values.get(LAST_KEY).unwrap_or(&Value::Null)
  }

  /// Record an operation's output under its key and update `$last`.
  pub fn record(&mut self, operation_key: &str, data: Value) {
    self.values.insert(operation_key.to_string(), data.clone());
    self.values.insert(LAST_KEY.to_string(), data);
  }

  /// Snapshot the chain as a JSON object (persisted on finalization).
  pub fn snapshot(&self) -> Value {
    Value::Object(self.values.clone())
  }

  /// Whether a key belongs to the reserved `$` namespace.
  pub fn is_reserved(key: &str) -> bool {
    key.starts_with('$')
  }
}
