use serde::Serialize;
use tracing::info;

use crate::aggregate::{compute_parameters, ParameterMappings};
use crate::artifacts::{write_artifacts, ArtifactPaths};
use crate::config::PrepConfig;
use crate::error::Result;
use crate::loader::{load_sources, SourceFingerprint, SourceTables};
use crate::schema::{require_columns, required_columns};
use crate::sets::{extract_sets, OptimizationSets};

/// Everything derived from one set of inputs, before anything is written.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedData {
    pub sets: OptimizationSets,
    pub parameters: ParameterMappings,
    pub sources: Vec<SourceFingerprint>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PrepSummary {
    pub sources: Vec<SourceFingerprint>,
    pub products: usize,
    pub warehouses: usize,
    pub markets: usize,
    pub ship_modes: usize,
    pub profit_entries: usize,
    pub inventory_cost_entries: usize,
    pub fulfillment_time_entries: usize,
    pub demand_entries: usize,
    pub artifacts: ArtifactPaths,
}

/// Loads, normalizes and aggregates the inputs named by `config`.
pub fn prepare(config: &PrepConfig) -> Result<PreparedData> {
    info!(data_dir = %config.data_dir.display(), "loading source data");
    let tables = load_sources(config)?;
    validate_schemas(&tables)?;

    info!("defining optimization sets");
    let sets = extract_sets(&tables.orders)?;

    info!("calculating parameter mappings");
    let parameters = compute_parameters(&tables)?;

    Ok(PreparedData {
        sets,
        parameters,
        sources: tables.fingerprints(),
    })
}

/// Full run: [`prepare`] then write both artifacts. Nothing is written unless
/// every earlier stage succeeded.
pub fn run(config: &PrepConfig) -> Result<PrepSummary> {
    let prepared = prepare(config)?;

    info!(output_dir = %config.output_dir.display(), "saving sets and parameters");
    let artifacts = write_artifacts(
        &config.output_dir,
        &prepared.sets,
        &prepared.parameters,
        &prepared.sources,
    )?;

    let PreparedData {
        sets,
        parameters,
        sources,
    } = prepared;

    Ok(PrepSummary {
        sources,
        products: sets.products.len(),
        warehouses: sets.warehouses.len(),
        markets: sets.markets.len(),
        ship_modes: sets.ship_modes.len(),
        profit_entries: parameters.profit_per_product.len(),
        inventory_cost_entries: parameters.inventory_cost.len(),
        fulfillment_time_entries: parameters.fulfillment_time.len(),
        demand_entries: parameters.historical_demand.len(),
        artifacts,
    })
}

fn validate_schemas(tables: &SourceTables) -> Result<()> {
    for table in [&tables.orders, &tables.inventory, &tables.fulfillment] {
        require_columns(&table.df, table.kind, required_columns(table.kind))?;
    }
    Ok(())
}
