//! Weft Engine
//!
//! The graph walker: executes a flow definition against a trigger payload,
//! threading the data chain between operations, branching on condition
//! results, and emitting a full audit trail to the log sink.
//!
//! # Execution model
//!
//! One run is single-threaded and cooperative: sibling operations and
//! branches are deliberately serialized (depth-first, `sort_order`
//! ascending) so the data chain stays consistent without locks. Handler and
//! sink calls are the suspension points where other concurrently scheduled
//! runs may make progress; each run owns its own chain and execution record,
//! so isolation between runs is structural.
//!
//! # Failure model
//!
//! Fail-fast: the first operation failure aborts the run before any pending
//! sibling executes. Configuration failures (missing or inactive flow,
//! unknown operation type) and operation failures both finalize the
//! execution record as failed and come back as a structured
//! [`RunOutcome`]; only audit-trail write failures escape
//! [`Engine::execute`] as an error.

mod engine;
mod env;
mod error;
mod outcome;
mod walk;

pub use engine::{Engine, RunOptions};
pub use env::{AllowlistEnv, EnvSource, StaticEnv};
pub use error::EngineError;
pub use outcome::{RunOutcome, RunStatus};
