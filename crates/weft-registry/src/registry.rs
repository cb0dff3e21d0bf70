use std::collections::HashMap;
use std::sync::Arc;

use crate::handler::OperationHandler;

/// Maps operation type tags to handler implementations.
///
/// Registration happens once at startup; lookups during a run are read-only.
/// Registering a second handler under the same tag replaces the first.
#[derive(Default)]
pub struct OperationRegistry {
  handlers: HashMap<String, Arc<dyn OperationHandler>>,
}

impl OperationRegistry {
  pub fn new() -> Self {
    Self::default()
  }

  /// Register a handler under its own type tag.
  pub fn register(&mut self, handler: Arc<dyn OperationHandler>) {
    self
      .handlers
      .insert(handler.operation_type().to_string(), handler);
  }

  /// Resolve a handler by type tag.
  pub fn get(&self, operation_type: &str) -> Option<Arc<dyn OperationHandler>> {
    self.handlers.get(operation_type).cloned()
  }

  pub fn contains(&self, operation_type: &str) -> bool {
    self.handlers.contains_key(operation_type)
  }

  /// Registered type tags, unordered.
  pub fn types(&self) -> Vec<&str> {
    self.handlers.keys().map(String::as_str).collect()
  }
}
