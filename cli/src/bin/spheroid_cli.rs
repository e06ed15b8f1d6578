use clap::{Parser, Subcommand};
use cli::{load_config, schema_json, write_config, SegmenterSource};
use color_eyre::eyre::{eyre, Result};
use spheroid::{io::BarChartRenderer, stages, GeometryPipeline, PipelineConfig, StageReport};
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::{self, EnvFilter};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Pipeline configuration file (.toml or .json)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert 16-bit TIFF acquisitions into 8-bit RGB PNGs
    Export {
        /// Directory containing .tif/.tiff files
        #[arg(short, long)]
        input: PathBuf,
        /// Directory for the `<stem>_processed.png` files
        #[arg(short, long)]
        output: PathBuf,
        /// Log format, color type, size and sample range of each input first
        #[arg(long)]
        inspect: bool,
    },
    /// Segment images and measure area, perimeter and circularity
    Measure {
        /// Manifest written by the segmentation model
        #[arg(long, conflicts_with = "command", required_unless_present = "command")]
        manifest: Option<PathBuf>,
        /// Segmentation program that writes a manifest
        #[arg(long)]
        command: Option<PathBuf>,
        /// Extra arguments passed to the segmentation program
        #[arg(long = "arg", requires = "command", allow_hyphen_values = true)]
        args: Vec<String>,
        /// Images given to the model
        #[arg(short, long)]
        images: PathBuf,
        /// Output directory; results land in `<output>/inferenceSeg`
        #[arg(short, long)]
        output: PathBuf,
        /// Full-resolution originals (defaults to the images directory)
        #[arg(long)]
        originals: Option<PathBuf>,
    },
    /// Paste each object onto the background color
    Composite {
        /// Raw images
        #[arg(long)]
        raw: PathBuf,
        /// Binary masks; composites are written to `<masks>/RawMasks`
        #[arg(long)]
        masks: PathBuf,
    },
    /// Score the darkness of every composite in a folder
    Score {
        /// Folder of composites; results land in `<folder>/output`
        #[arg(short, long)]
        folder: PathBuf,
    },
    /// Print the configuration JSON schema
    Schema,
    /// Write the default configuration to a file
    Init {
        /// Destination (.toml or .json)
        #[arg(short, long, default_value = "spheroid.toml")]
        output: PathBuf,
    },
}

fn main() -> Result<()> {
    color_eyre::install()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info"))
        )
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Export { input, output, inspect } => {
            if inspect {
                stages::inspect_directory(&input)?;
            }
            finish(&stages::export_directory(&input, &output)?);
        }
        Commands::Measure {
            manifest,
            command,
            args,
            images,
            output,
            originals,
        } => {
            let source = SegmenterSource::from_args(manifest, command, args)
                .ok_or_else(|| eyre!("Either --manifest or --command is required"))?;
            let originals = originals
                .or_else(|| config.segmentation.originals_dir.clone())
                .unwrap_or_else(|| images.clone());

            let result = stages::run_segmentation(
                source.build().as_ref(),
                &images,
                &originals,
                &output,
                &config.segmentation,
                &GeometryPipeline::default(),
            )?;
            info!("Metrics written to {:?}", result.csv_path);
            finish(&result.report);
        }
        Commands::Composite { raw, masks } => {
            finish(&stages::composite_directory(&raw, &masks, &config)?);
        }
        Commands::Score { folder } => {
            let result = stages::score_directory(&folder, &config, &BarChartRenderer::default())?;
            info!("Average intensities written to {:?}", result.csv_path);
            finish(&result.report);
        }
        Commands::Schema => {
            println!("{}", schema_json()?);
        }
        Commands::Init { output } => {
            write_config(&PipelineConfig::default(), &output)?;
            info!("Default configuration written to {:?}", output);
        }
    }

    Ok(())
}

fn finish(report: &StageReport) {
    if !report.is_clean() {
        warn!(
            "{} finished with {} failed image(s); see the log above",
            report.stage,
            report.failures.len()
        );
    }
}
