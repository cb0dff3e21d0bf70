//! Weft Registry
//!
//! This crate defines the contract between the execution engine and the
//! pluggable operation handlers behind each operation type, plus the registry
//! that maps type tags to handlers.
//!
//! The registry is an explicit object, built once by the host before any run
//! starts and passed into the engine by reference. The engine has no
//! compile-time knowledge of concrete handlers; it only sees
//! [`OperationHandler`].

mod handler;
mod registry;
mod scope;

pub use handler::{CONDITION_TYPE, OperationContext, OperationHandler, OperationResult};
pub use registry::OperationRegistry;
pub use scope::ServiceScope;
