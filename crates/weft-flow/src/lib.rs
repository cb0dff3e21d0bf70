//! Weft Flow
//!
//! This crate provides the flow definition data model: a flow is a set of
//! typed operations connected by directed edges, plus the trigger
//! configuration that starts it.
//!
//! A `FlowDefinition` is immutable input to the execution engine. It is owned
//! by whatever flow store loaded it; the engine never mutates it. Structural
//! rules that must hold before a flow is runnable (unique operation keys, no
//! collision with the reserved `$` namespace) live in
//! [`FlowDefinition::validate`].

mod connection;
mod error;
mod flow;
mod operation;

pub use connection::{Branch, Connection, TRIGGER_SOURCE};
pub use error::FlowError;
pub use flow::{FlowDefinition, FlowStatus, TriggerConfig};
pub use operation::Operation;
