use std::collections::HashMap;

use serde_json::Value;

/// Read-only, string-keyed values shared by all handlers of one run
/// (service endpoints, credentials references, feature toggles).
///
/// Built by the host next to the registry; the engine passes it through
/// untouched.
#[derive(Debug, Clone, Default)]
pub struct ServiceScope {
  values: HashMap<String, Value>,
}

impl ServiceScope {
  pub fn new() -> Self {
    Self::default()
  }

  /// Builder-style insert.
  pub fn with(mut self, key: impl Into<String>, value: Value) -> Self {
    self.values.insert(key.into(), value);
    self
  }

  pub fn get(&self, key: &str) -> Option<&Value> {
    self.values.get(key)
  }
}
