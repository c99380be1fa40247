use std::collections::BTreeSet;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use comfy_table::Table;
use optiguide_core::artifacts::{ParametersArtifact, SetsArtifact};
use optiguide_core::{read_artifacts, run, PrepConfig, PrepError};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "OptiGuide optimization input preparation", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build the optimization sets and parameter mappings from the source CSVs
    Prepare(PrepareArgs),
    /// Print the contents of previously written artifacts
    Show(ShowArgs),
}

#[derive(Args, Debug)]
struct PrepareArgs {
    /// Directory holding orders_and_shipments.csv, inventory.csv and fulfillment.csv
    #[arg(long, env = "OPTIGUIDE_DATA_DIR")]
    data_dir: PathBuf,
    /// Orders/shipments CSV (defaults to <data-dir>/orders_and_shipments.csv)
    #[arg(long)]
    orders: Option<PathBuf>,
    /// Inventory CSV (defaults to <data-dir>/inventory.csv)
    #[arg(long)]
    inventory: Option<PathBuf>,
    /// Fulfillment CSV (defaults to <data-dir>/fulfillment.csv)
    #[arg(long)]
    fulfillment: Option<PathBuf>,
    /// Where to write the artifacts (defaults to <data-dir>/processed)
    #[arg(long, env = "OPTIGUIDE_OUTPUT_DIR")]
    output_dir: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct ShowArgs {
    /// Directory holding the artifacts (takes precedence over --data-dir)
    #[arg(long, env = "OPTIGUIDE_OUTPUT_DIR")]
    output_dir: Option<PathBuf>,
    /// Data directory whose processed/ folder holds the artifacts
    #[arg(long, env = "OPTIGUIDE_DATA_DIR")]
    data_dir: Option<PathBuf>,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Prepare(args) => handle_prepare(args),
        Command::Show(args) => handle_show(args),
    }
}

fn handle_prepare(args: PrepareArgs) -> Result<()> {
    let mut config = PrepConfig::from_data_dir(&args.data_dir);
    if let Some(path) = args.orders {
        config = config.with_orders_path(path);
    }
    if let Some(path) = args.inventory {
        config = config.with_inventory_path(path);
    }
    if let Some(path) = args.fulfillment {
        config = config.with_fulfillment_path(path);
    }
    if let Some(dir) = args.output_dir {
        config = config.with_output_dir(dir);
    }

    let summary = match run(&config) {
        Ok(summary) => summary,
        Err(err @ PrepError::MissingFile { .. }) => {
            return Err(err).with_context(|| {
                format!(
                    "confirm the CSV files are in {}",
                    config.data_dir.display()
                )
            });
        }
        Err(err) => return Err(err).context("data preparation failed"),
    };

    info!(
        products = summary.products,
        warehouses = summary.warehouses,
        markets = summary.markets,
        ship_modes = summary.ship_modes,
        profit = summary.profit_entries,
        inventory_cost = summary.inventory_cost_entries,
        fulfillment_time = summary.fulfillment_time_entries,
        demand = summary.demand_entries,
        sets_path = %summary.artifacts.sets.display(),
        parameters_path = %summary.artifacts.parameters.display(),
        "data preparation complete"
    );
    Ok(())
}

fn handle_show(args: ShowArgs) -> Result<()> {
    let output_dir = match (args.output_dir, args.data_dir) {
        (Some(dir), _) => dir,
        (None, Some(data_dir)) => PrepConfig::from_data_dir(data_dir).output_dir,
        (None, None) => anyhow::bail!("pass --output-dir or --data-dir (or set OPTIGUIDE_DATA_DIR)"),
    };

    let (sets, parameters) = read_artifacts(&output_dir)
        .with_context(|| format!("failed to read artifacts from {}", output_dir.display()))?;

    print!("{}", render_artifacts(&sets, &parameters));
    Ok(())
}

/// Renders both artifacts as text tables: sources, sets, per-product
/// parameters and demand.
fn render_artifacts(sets: &SetsArtifact, parameters: &ParametersArtifact) -> String {
    let mut out = format!("Generated at {}\n", sets.generated_at);

    let mut sources = Table::new();
    sources.set_header(vec!["Table", "Path", "Rows", "BLAKE3"]);
    for source in &sets.sources {
        sources.add_row(vec![
            source.table.to_string(),
            source.path.clone(),
            source.rows.to_string(),
            source.file_hash.clone(),
        ]);
    }
    out.push_str(&format!("{sources}\n"));

    let mut set_table = Table::new();
    set_table.set_header(vec!["Set", "Size", "Members"]);
    let set_rows: [(&str, &BTreeSet<String>); 4] = [
        ("P_PRODUCTS", &sets.sets.products),
        ("W_WAREHOUSES", &sets.sets.warehouses),
        ("M_MARKETS", &sets.sets.markets),
        ("T_SHIP_MODES", &sets.sets.ship_modes),
    ];
    for (name, members) in set_rows {
        set_table.add_row(vec![
            name.to_string(),
            members.len().to_string(),
            members.iter().cloned().collect::<Vec<_>>().join(", "),
        ]);
    }
    out.push_str(&format!("{set_table}\n"));

    let params = &parameters.parameters;
    let mut product_table = Table::new();
    product_table.set_header(vec![
        "Product",
        "D_PROFIT_PER_PRODUCT",
        "D_INVENTORY_COST",
        "D_FULFILLMENT_TIME",
    ]);
    let products: BTreeSet<&String> = params
        .profit_per_product
        .keys()
        .chain(params.inventory_cost.keys())
        .chain(params.fulfillment_time.keys())
        .collect();
    for product in products {
        product_table.add_row(vec![
            product.clone(),
            format_value(params.profit_per_product.get(product)),
            format_value(params.inventory_cost.get(product)),
            format_value(params.fulfillment_time.get(product)),
        ]);
    }
    out.push_str(&format!("{product_table}\n"));

    let mut demand_table = Table::new();
    demand_table.set_header(vec!["Product", "Market", "D_HISTORICAL_DEMAND"]);
    for (key, value) in &params.historical_demand {
        demand_table.add_row(vec![
            key.product.clone(),
            key.market.clone(),
            value.to_string(),
        ]);
    }
    out.push_str(&format!("{demand_table}\n"));

    out
}

fn format_value(value: Option<&f64>) -> String {
    value.map(f64::to_string).unwrap_or_else(|| "-".to_string())
}
