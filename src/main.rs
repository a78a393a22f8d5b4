use anyhow::Context;
use clap::{Args as ClapArgs, Parser, Subcommand};
use fertirag::{FertilizerService, PipelineConfig, RecordFields};
use serde::Serialize;
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

/// Fertilizer recommendation with retrieved guidance
#[derive(Parser, Debug)]
#[command(name = "fertirag")]
#[command(about = "Fertilizer recommendation with retrieved guidance", long_about = None)]
struct Args {
    /// JSON pipeline configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Artifact directory, overriding the configuration
    #[arg(short, long)]
    artifact_dir: Option<PathBuf>,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Ingest the dataset and documents, train, and publish artifacts
    Train {
        #[arg(long)]
        dataset: PathBuf,
        #[arg(long)]
        documents: PathBuf,
    },
    /// Predict the fertilizer for one observation
    Predict(FieldArgs),
    /// Retrieve the guidance passage for a fertilizer
    Retrieve {
        #[arg(long)]
        label: String,
    },
    /// Predict, then retrieve guidance for the prediction
    Recommend(FieldArgs),
}

#[derive(ClapArgs, Debug)]
struct FieldArgs {
    #[arg(long, allow_negative_numbers = true)]
    temperature: f64,
    #[arg(long)]
    humidity: f64,
    #[arg(long)]
    moisture: f64,
    #[arg(long)]
    soil_type: String,
    #[arg(long)]
    crop_type: String,
    #[arg(long)]
    nitrogen: f64,
    #[arg(long)]
    potassium: f64,
    #[arg(long)]
    phosphorous: f64,
}

impl From<FieldArgs> for RecordFields {
    fn from(args: FieldArgs) -> Self {
        RecordFields {
            temperature: args.temperature,
            humidity: args.humidity,
            moisture: args.moisture,
            soil_type: args.soil_type,
            crop_type: args.crop_type,
            nitrogen: args.nitrogen,
            potassium: args.potassium,
            phosphorous: args.phosphorous,
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
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

    let mut config = match &args.config {
        Some(path) => PipelineConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => PipelineConfig::default(),
    };
    if let Some(dir) = args.artifact_dir {
        config = config.with_artifact_dir(dir);
    }

    info!("Starting fertirag v{}", env!("CARGO_PKG_VERSION"));
    info!("Artifact directory: {:?}", config.artifact_dir);

    let service = FertilizerService::new(config)?;
    match args.command {
        Command::Train { dataset, documents } => {
            let outcome = service.train(&dataset, &documents)?;
            print_json(&outcome)?;
        }
        Command::Predict(fields) => print_json(&service.predict(&fields.into())?)?,
        Command::Retrieve { label } => print_json(&service.retrieve(&label)?)?,
        Command::Recommend(fields) => print_json(&service.recommend(&fields.into())?)?,
    }
    Ok(())
}
