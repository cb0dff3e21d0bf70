use serde_json::{Map, Value};

/// Provides the allow-listed snapshot of environment values placed under
/// `$env` at the start of every run. The engine treats the snapshot as
/// opaque input.
pub trait EnvSource: Send + Sync {
  fn snapshot(&self) -> Map<String, Value>;
}

/// A fixed snapshot, for tests and hosts that assemble the mapping
/// themselves.
#[derive(Debug, Clone, Default)]
pub struct StaticEnv {
  values: Map<String, Value>,
}

impl StaticEnv {
  pub fn new(values: Map<String, Value>) -> Self {
    Self { values }
  }

  pub fn empty() -> Self {
    Self::default()
  }
}

impl EnvSource for StaticEnv {
  fn snapshot(&self) -> Map<String, Value> {
    self.values.clone()
  }
}

/// An allow-listed view of the process environment. Variables not on the
/// list never reach a flow.
#[derive(Debug, Clone)]
pub struct AllowlistEnv {
  allow: Vec<String>,
}

impl AllowlistEnv {
  pub fn new(allow: impl IntoIterator<Item = String>) -> Self {
    Self {
      allow: allow.into_iter().collect(),
    }
  }
}

impl EnvSource for AllowlistEnv {
  fn snapshot(&self) -> Map<String, Value> {
    self
      .allow
      .iter()
      .filter_map(|key| {
        std::env::var(key)
          .ok()
          .map(|value| (key.clone(), Value::String(value)))
      })
      .collect()
  }
}
