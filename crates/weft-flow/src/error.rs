use thiserror::Error;

/// Structural errors in a flow definition.
#[derive(Debug, Error)]
pub enum FlowError {
  /// Two operations share the same operation key.
  #[error("duplicate operation key '{0}'")]
  DuplicateOperationKey(String),

  /// An operation key collides with the reserved `$` namespace.
  #[error("operation key '{0}' collides with the reserved '$' namespace")]
  ReservedOperationKey(String),

  /// An operation has no key at all.
  #[error("operation '{0}' has an empty operation key")]
  EmptyOperationKey(String),

  /// A connection uses the trigger literal as its target.
  #[error("connection '{0}' targets the trigger")]
  TriggerAsTarget(String),
}
