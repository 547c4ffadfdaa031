//! Infrastructure adapters.

pub mod telemetry;
pub mod upstream;
