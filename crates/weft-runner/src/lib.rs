//! Weft Runner
//!
//! A channel-based trigger loop for one flow: webhook receivers, schedulers,
//! or a manual "run now" action push [`Trigger`]s into the sender; the loop
//! executes them through the engine one at a time.
//!
//! The cancellation token gates only the intake loop. An in-flight run
//! always proceeds to a terminal state; the engine itself has no mid-run
//! cancellation.

mod runner;

pub use runner::{FlowRunner, RunnerError, Trigger};
