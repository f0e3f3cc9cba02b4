// What-If Pricing CLI
// Loads a baseline, applies a selection and adjustments, prints both comparisons
//
// Usage:
//   whatif run --year 2017 --product-level product-id --product FUR-CH-10002024 --list-price-pct 10
//   whatif run --discount-cap 20 --margin-floor 30 --save price_review
//   whatif run --baseline Scenario_2026-03-14_09-26-53.csv --json
//   whatif options sub-category --year 2017
//   whatif list
//   whatif generate --rows 2000 --seed 42

mod generate;
mod report;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use whatif_engine::config::SimConfig;
use whatif_engine::store::{CsvScenarioStore, ScenarioStore};
use whatif_engine::{
    Adjustment, Dimension, DiscountChange, GeographyLevel, LevelFilter, MarginChange, ProductLevel,
    Selection, SimulationRequest, ValueChange, WhatIfSimulation,
};

// ─── CLI Parsing ────────────────────────────────────────────────────────────

#[derive(Debug, Parser)]
#[command(name = "whatif", version, about = "What-if pricing simulator")]
struct Cli {
    /// TOML configuration file
    #[arg(long, short, global = true, env = "WHATIF_CONFIG")]
    config: Option<PathBuf>,

    /// Override the configured log level
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Simulate adjustments on a selection and compare against the baseline
    Run(RunArgs),
    /// List saved scenarios
    List,
    /// List the values available for one selector
    Options {
        #[arg(value_enum)]
        dimension: DimensionArg,
        #[command(flatten)]
        filter: FilterArgs,
        /// Baseline file in the data directory (defaults to the configured one)
        #[arg(long)]
        baseline: Option<String>,
    },
    /// Write a synthetic baseline into the data directory
    Generate {
        #[arg(long, default_value_t = 1000)]
        rows: usize,
        #[arg(long, default_value_t = 0)]
        seed: u64,
        /// Output file name (defaults to the configured baseline file)
        #[arg(long)]
        out: Option<String>,
    },
}

#[derive(Debug, Args)]
struct FilterArgs {
    #[arg(long)]
    year: Option<i32>,
    #[arg(long)]
    month: Option<u32>,
    #[arg(long, value_enum, requires = "product")]
    product_level: Option<ProductLevelArg>,
    #[arg(long, requires = "product_level")]
    product: Option<String>,
    #[arg(long, value_enum, requires = "geo")]
    geo_level: Option<GeoLevelArg>,
    #[arg(long, requires = "geo_level")]
    geo: Option<String>,
}

#[derive(Debug, Args)]
struct RunArgs {
    #[command(flatten)]
    filter: FilterArgs,

    /// Baseline file in the data directory (defaults to the configured one)
    #[arg(long)]
    baseline: Option<String>,

    /// List price change in percent
    #[arg(long, allow_hyphen_values = true, conflicts_with = "list_price")]
    list_price_pct: Option<f64>,
    /// Absolute list price (single product only)
    #[arg(long)]
    list_price: Option<f64>,

    /// Set every discount to this percent
    #[arg(long, conflicts_with = "discount_cap")]
    discount: Option<f64>,
    /// Lower discounts above this percent
    #[arg(long)]
    discount_cap: Option<f64>,

    /// COGS change in percent
    #[arg(long, allow_hyphen_values = true, conflicts_with = "cogs")]
    cogs_pct: Option<f64>,
    /// Absolute unit COGS (single product only)
    #[arg(long)]
    cogs: Option<f64>,

    /// Set every gross margin to this percent
    #[arg(long, conflicts_with = "margin_floor")]
    margin: Option<f64>,
    /// Raise gross margins below this percent
    #[arg(long)]
    margin_floor: Option<f64>,

    /// Save the full simulated dataset under this name
    #[arg(long)]
    save: Option<String>,

    /// Print the outcome as JSON instead of tables
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum DimensionArg {
    Year,
    Month,
    Category,
    SubCategory,
    ProductId,
    Region,
    State,
    City,
    PostalCode,
}

impl From<DimensionArg> for Dimension {
    fn from(d: DimensionArg) -> Self {
        match d {
            DimensionArg::Year => Dimension::OrderYear,
            DimensionArg::Month => Dimension::OrderMonth,
            DimensionArg::Category => Dimension::Category,
            DimensionArg::SubCategory => Dimension::SubCategory,
            DimensionArg::ProductId => Dimension::ProductId,
            DimensionArg::Region => Dimension::Region,
            DimensionArg::State => Dimension::State,
            DimensionArg::City => Dimension::City,
            DimensionArg::PostalCode => Dimension::PostalCode,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ProductLevelArg {
    Category,
    SubCategory,
    ProductId,
}

impl From<ProductLevelArg> for ProductLevel {
    fn from(l: ProductLevelArg) -> Self {
        match l {
            ProductLevelArg::Category => ProductLevel::Category,
            ProductLevelArg::SubCategory => ProductLevel::SubCategory,
            ProductLevelArg::ProductId => ProductLevel::ProductId,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum GeoLevelArg {
    Region,
    State,
    City,
    PostalCode,
}

impl From<GeoLevelArg> for GeographyLevel {
    fn from(l: GeoLevelArg) -> Self {
        match l {
            GeoLevelArg::Region => GeographyLevel::Region,
            GeoLevelArg::State => GeographyLevel::State,
            GeoLevelArg::City => GeographyLevel::City,
            GeoLevelArg::PostalCode => GeographyLevel::PostalCode,
        }
    }
}

impl FilterArgs {
    fn selection(&self) -> Selection {
        Selection {
            year: self.year,
            month: self.month,
            product: self
                .product_level
                .zip(self.product.clone())
                .map(|(level, value)| LevelFilter::new(ProductLevel::from(level), value)),
            geography: self
                .geo_level
                .zip(self.geo.clone())
                .map(|(level, value)| LevelFilter::new(GeographyLevel::from(level), value)),
        }
    }
}

impl RunArgs {
    fn adjustments(&self) -> Vec<Adjustment> {
        let mut out = Vec::new();
        if let Some(p) = self.list_price_pct {
            out.push(Adjustment::ListPrice(ValueChange::IncreasePct(p)));
        }
        if let Some(v) = self.list_price {
            out.push(Adjustment::ListPrice(ValueChange::Target(v)));
        }
        if let Some(p) = self.discount {
            out.push(Adjustment::Discount(DiscountChange::Target(p)));
        }
        if let Some(p) = self.discount_cap {
            out.push(Adjustment::Discount(DiscountChange::Cap(p)));
        }
        if let Some(p) = self.cogs_pct {
            out.push(Adjustment::Cogs(ValueChange::IncreasePct(p)));
        }
        if let Some(v) = self.cogs {
            out.push(Adjustment::Cogs(ValueChange::Target(v)));
        }
        if let Some(p) = self.margin {
            out.push(Adjustment::GrossMargin(MarginChange::Target(p)));
        }
        if let Some(p) = self.margin_floor {
            out.push(Adjustment::GrossMargin(MarginChange::Floor(p)));
        }
        out
    }
}

// ─── Main ───────────────────────────────────────────────────────────────────

fn init_tracing(log_level: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = SimConfig::load(cli.config.as_deref()).context("loading configuration")?;
    if let Some(level) = &cli.log_level {
        config.log_level = level.parse()?;
    }
    init_tracing(config.log_level.as_filter_str());

    tracing::debug!(
        data_dir = %config.data_dir.display(),
        baseline = %config.baseline_file,
        log_level = %config.log_level,
        "configuration loaded"
    );

    let mut store = CsvScenarioStore::new(&config.data_dir, &config.registry_file);

    match cli.command {
        Command::Run(args) => run(&config, &mut store, &args),
        Command::List => {
            let names = store.list().context("reading scenario registry")?;
            if names.is_empty() {
                println!("  No saved scenarios in {}", store.dir().display());
            }
            for name in names {
                println!("  {name}");
            }
            Ok(())
        }
        Command::Options { dimension, filter, baseline } => {
            let file = baseline.as_deref().unwrap_or(&config.baseline_file);
            let rows = store.load_file(file).with_context(|| format!("loading {file}"))?;
            let scoped = filter.selection().apply(&rows);
            for value in whatif_engine::selection::options(&scoped, dimension.into()) {
                println!("  {value}");
            }
            Ok(())
        }
        Command::Generate { rows, seed, out } => {
            let file = out.unwrap_or_else(|| config.baseline_file.clone());
            let path = config.data_dir.join(&file);
            std::fs::create_dir_all(&config.data_dir)
                .with_context(|| format!("creating {}", config.data_dir.display()))?;
            let set = generate::synthetic_baseline(rows, seed);
            let handle = std::fs::File::create(&path)
                .with_context(|| format!("creating {}", path.display()))?;
            whatif_engine::store::write_rows(&set, handle)?;
            println!("  Wrote {} rows to {} (seed {seed})", set.len(), path.display());
            Ok(())
        }
    }
}

fn run(config: &SimConfig, store: &mut CsvScenarioStore, args: &RunArgs) -> Result<()> {
    let file = args.baseline.as_deref().unwrap_or(&config.baseline_file);
    let baseline = store.load_file(file).with_context(|| format!("loading baseline {file}"))?;
    if baseline.is_empty() {
        bail!("baseline {file} has no rows");
    }

    let request = SimulationRequest {
        selection: args.filter.selection(),
        adjustments: args.adjustments(),
    };
    let sim = WhatIfSimulation::new(baseline).with_labels(config.labels());
    let outcome = sim.run(&request)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report::JsonOutcome::from(&outcome))?);
    } else {
        report::print_outcome(&request, &outcome);
    }

    if let Some(name) = &args.save {
        let stored = store
            .save(&outcome.simulated_total, name)
            .with_context(|| format!("saving scenario {name}"))?;
        println!("\n  Scenario '{stored}' saved successfully!");
    }
    Ok(())
}
