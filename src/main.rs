use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use tabdist::{DistanceSchema, Engine, Registries};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

/// Pairwise distances between tabular records
#[derive(Parser, Debug)]
#[command(name = "tabdist")]
#[command(about = "Pairwise dissimilarity for heterogeneous tabular records", long_about = None)]
struct Args {
    /// JSON array of rows; each row holds one scalar or null per column
    #[arg(short, long)]
    records: PathBuf,

    /// JSON distance schema
    #[arg(short, long)]
    schema: PathBuf,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let log_level = match args.log_level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting tabdist v{}", env!("CARGO_PKG_VERSION"));

    let schema_json = std::fs::read_to_string(&args.schema)
        .with_context(|| format!("reading schema {:?}", args.schema))?;
    let schema = DistanceSchema::from_json(&schema_json).context("parsing schema")?;

    let records_json = std::fs::read_to_string(&args.records)
        .with_context(|| format!("reading records {:?}", args.records))?;
    let source = schema
        .records_from_json(&records_json)
        .context("loading records")?;
    info!("Loaded {} records of {} columns", source.len(), schema.width());

    let mut engine = Engine::build(&schema, source, &Registries::standard()).context("building engine")?;
    let matrix = engine.pairwise().context("computing distances")?;

    println!("{}", serde_json::to_string(&matrix)?);
    Ok(())
}
