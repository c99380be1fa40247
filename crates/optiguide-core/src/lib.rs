pub mod aggregate;
pub mod artifacts;
pub mod config;
pub mod error;
pub mod loader;
pub mod pipeline;
pub mod schema;
pub mod sets;

pub use aggregate::{DemandKey, ParameterMappings};
pub use artifacts::{read_artifacts, write_artifacts, ArtifactPaths};
pub use config::{PrepConfig, TableKind};
pub use error::{PrepError, Result};
pub use pipeline::{prepare, run, PrepSummary, PreparedData};
pub use sets::OptimizationSets;

#[cfg(test)]
mod tests;
