//! Weft Ops
//!
//! A small builtin handler catalog: enough to run real flows from the CLI
//! and exercise the engine end to end. The full catalog of operation types
//! (http calls, mail, ...) is expected to live outside this workspace and
//! register through the same [`weft_registry::OperationHandler`] contract.

mod condition;
mod log;
mod transform;

pub use condition::ConditionOperation;
pub use log::LogOperation;
pub use transform::TransformOperation;

use std::sync::Arc;

use weft_registry::OperationRegistry;

/// Registry pre-loaded with the builtin handlers.
pub fn builtin_registry() -> OperationRegistry {
  let mut registry = OperationRegistry::new();
  registry.register(Arc::new(LogOperation));
  registry.register(Arc::new(ConditionOperation));
  registry.register(Arc::new(TransformOperation));
  registry
}
