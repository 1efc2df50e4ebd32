//! NEX-GDDP CMIP5 exporter.
//!
//! Connects to Earth Engine and exports one product for one scenario,
//! variable and model over a bounding box:
//! - `annual`: a CSV of yearly regional means
//! - `cumulative`: one GeoTIFF per year with a band per day
//!
//! Download links are printed to stdout. Drive exports print the operation
//! name and return without waiting for the task.

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use cmip5_common::time::parse_date;
use cmip5_common::{Geometry, Scenario};
use cmip5_scenario::{DispatchOutcome, ScenarioConfig, Session};
use ee_client::{EarthEngineClient, EeConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Product {
    /// Regional mean per year
    Annual,
    /// Daily bands stacked per year
    Cumulative,
}

#[derive(Parser, Debug)]
#[command(name = "cmip5-export")]
#[command(about = "Export NEX-GDDP CMIP5 annual series and cumulative images")]
struct Args {
    /// Scenario: historical, rcp45 or rcp85
    #[arg(long, env = "CMIP5_SCENARIO", default_value = "historical")]
    scenario: String,

    /// Variable: pr, tasmin or tasmax
    #[arg(long, env = "CMIP5_VARIABLE")]
    variable: String,

    /// Model identifier, e.g. ACCESS1-0
    #[arg(long, env = "CMIP5_MODEL")]
    model: String,

    /// Bounding box as xmin,ymin,xmax,ymax
    #[arg(long, env = "CMIP5_BBOX", allow_hyphen_values = true)]
    bbox: String,

    /// Download mode: URL or drive
    #[arg(long, env = "CMIP5_DOWNLOAD", default_value = "drive")]
    download: String,

    /// First day (YYYY-MM-DD); defaults to the scenario's window
    #[arg(long)]
    start: Option<String>,

    /// Day after the last one (YYYY-MM-DD); defaults to the scenario's window
    #[arg(long)]
    end: Option<String>,

    /// Drive folder for exports
    #[arg(long, env = "CMIP5_FOLDER", default_value = "CMIP5")]
    folder: String,

    /// Product to export
    #[arg(long, value_enum, default_value = "annual")]
    product: Product,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn report(outcome: &DispatchOutcome) {
    match outcome {
        DispatchOutcome::DownloadUrl(url) => println!("{}", url),
        DispatchOutcome::ExportTask(task) => println!("{}\t{}", task.name, task.description),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment from .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Initialize tracing
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_writer(std::io::stderr)
        .json()
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let scenario: Scenario = args.scenario.parse()?;
    let geometry = Geometry::from_bbox_string(&args.bbox)?;

    let mut builder =
        ScenarioConfig::builder(scenario, args.variable.as_str(), args.model.as_str(), geometry)
            .download(args.download.as_str())
            .folder(args.folder.as_str());
    if let Some(start) = &args.start {
        builder = builder.start(parse_date(start)?);
    }
    if let Some(end) = &args.end {
        builder = builder.end(parse_date(end)?);
    }
    let config = builder.build()?;

    let ee_config = EeConfig::from_env()?;
    info!(
        api_url = %ee_config.api_url,
        project = %ee_config.project,
        "Connecting to Earth Engine"
    );
    let client = EarthEngineClient::new(ee_config)?;
    let session = Session::connect(client)
        .await
        .context("Earth Engine session could not be established")?;

    info!(
        scenario = %config.scenario(),
        variable = %config.variable(),
        model = %config.model(),
        product = ?args.product,
        "Starting export"
    );

    match args.product {
        Product::Annual => {
            let outcome = config.compute_annual_series(&session).await?;
            report(&outcome);
        }
        Product::Cumulative => {
            let products = config.compute_cumulative_images(&session).await?;
            for product in &products {
                report(&product.outcome);
            }
            info!(years = products.len(), "Cumulative images dispatched");
        }
    }

    Ok(())
}
