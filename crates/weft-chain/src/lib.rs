//! Weft Chain
//!
//! The data chain is the shared, keyed context threaded through one flow
//! execution: every operation's last output is recorded under its operation
//! key, next to the reserved `$`-prefixed system keys (`$trigger`,
//! `$accountability`, `$env`, `$last`).
//!
//! The interpolator resolves `{{ path }}` expressions in operation options
//! against the chain before a handler runs. A string that is exactly one
//! expression keeps the resolved value's native type; expressions embedded in
//! longer text are rendered to text.

mod chain;
mod interpolate;
mod path;

pub use chain::{ACCOUNTABILITY_KEY, DataChain, ENV_KEY, LAST_KEY, TRIGGER_KEY};
pub use interpolate::{interpolate, to_text};
