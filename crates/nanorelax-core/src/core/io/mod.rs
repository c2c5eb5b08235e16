//! Provides input/output for structure files and simulation telemetry.
//!
//! Structure formats implement the [`traits::StructureFile`] trait so callers
//! can read and write them through a single interface. Per-step telemetry is
//! exported as CSV.

pub mod telemetry;
pub mod toml_structure;
pub mod traits;
