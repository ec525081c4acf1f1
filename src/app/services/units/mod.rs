//! Unit handling: canonical-key registry and column-name inference

pub mod inference;
pub mod registry;

pub use inference::infer_units;
pub use registry::{UnitEntry, UnitRegistry};
