//! PlantVillage Dataset Preparation CLI
//!
//! Command-line entry point for preparing the PlantVillage plant disease
//! dataset: splitting raw data into train/test trees, loading the training
//! tree into a normalized tensor, and persisting the label encoder for
//! later inference runs.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing::info;

use plantvillage_prep::dataset::{
    load_dataset, scan_class_counts, split_dataset, DecodeErrorPolicy, LabelEncoder, LoaderConfig,
    SplitConfig,
};
use plantvillage_prep::utils::logging::{init_logging, LogConfig, LogLevel};
use plantvillage_prep::{IMAGES_PER_CLASS, IMAGE_SIZE, TRAIN_RATIO};

/// PlantVillage Dataset Preparation
///
/// Splits the raw PlantVillage dataset into train/test trees and loads the
/// training tree into tensors ready for an external training backend.
#[derive(Parser, Debug)]
#[command(name = "plantvillage_prep")]
#[command(version)]
#[command(about = "Dataset preparation for plant disease classification", long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, default_value = "false")]
    verbose: bool,

    /// Only log errors
    #[arg(short, long, default_value = "false", conflicts_with = "verbose")]
    quiet: bool,

    /// Minimum log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Split a raw per-class image tree into train/test trees
    Split {
        /// Directory containing one subdirectory per class
        #[arg(short, long, default_value = "raw_data")]
        source_dir: PathBuf,

        /// Destination root; train/ and test/ are created under it
        #[arg(short, long, default_value = "PlantVillage")]
        output_dir: PathBuf,

        /// Fraction of each class assigned to the training subset
        #[arg(short, long, default_value_t = TRAIN_RATIO)]
        train_ratio: f64,

        /// Random seed for a reproducible split (omit for a fresh one)
        #[arg(long)]
        seed: Option<u64>,

        /// Write a JSON manifest of the split next to the output trees
        #[arg(long, default_value = "false")]
        manifest: bool,
    },

    /// Load the training tree, fit the label encoder, and report totals
    Load {
        /// Training directory (one subdirectory per class)
        #[arg(short, long, default_value = "PlantVillage/train")]
        data_dir: PathBuf,

        /// Square resolution images are resized to
        #[arg(long, default_value_t = IMAGE_SIZE)]
        image_size: u32,

        /// Maximum number of images loaded per class
        #[arg(long, default_value_t = IMAGES_PER_CLASS)]
        images_per_class: usize,

        /// Where to persist the fitted label encoder
        #[arg(long, default_value = "plant_disease_labels.json")]
        encoder_out: PathBuf,

        /// Fail on the first undecodable image instead of skipping it
        #[arg(long, default_value = "false")]
        abort_on_decode_error: bool,
    },

    /// Show per-class image counts without decoding anything
    Inspect {
        /// Dataset directory (one subdirectory per class)
        #[arg(short, long, default_value = "PlantVillage/train")]
        data_dir: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_config = if cli.verbose {
        LogConfig::verbose()
    } else if cli.quiet {
        LogConfig::quiet()
    } else {
        LogConfig {
            level: LogLevel::from_str(&cli.log_level),
            ..LogConfig::default()
        }
    };
    init_logging(&log_config).map_err(|e| anyhow::anyhow!(e))?;

    match cli.command {
        Commands::Split {
            source_dir,
            output_dir,
            train_ratio,
            seed,
            manifest,
        } => {
            let config = SplitConfig { train_ratio, seed };
            let summary = split_dataset(&source_dir, &output_dir, &config)?;

            println!("{}", summary);
            if !summary.failed_classes().is_empty() {
                println!(
                    "{} {} class(es) did not complete; see the summary above",
                    "warning:".yellow().bold(),
                    summary.failed_classes().len()
                );
            }
            if manifest {
                let path = output_dir.join("split_summary.json");
                summary.save(&path)?;
                info!("Split manifest written to {}", path.display());
            }
            println!(
                "{} organized into {} and {}",
                "Dataset".green().bold(),
                output_dir.join("train").display(),
                output_dir.join("test").display()
            );
        }

        Commands::Load {
            data_dir,
            image_size,
            images_per_class,
            encoder_out,
            abort_on_decode_error,
        } => {
            let config = LoaderConfig {
                image_size,
                images_per_class,
                decode_error_policy: if abort_on_decode_error {
                    DecodeErrorPolicy::Abort
                } else {
                    DecodeErrorPolicy::Skip
                },
                ..LoaderConfig::default()
            };

            let dataset = load_dataset(&data_dir, config)?;
            let encoder = LabelEncoder::fit(&dataset.labels);
            let targets = encoder.transform(&dataset.labels)?;
            encoder.save(&encoder_out)?;

            println!();
            println!("{}", "Dataset loaded".green().bold());
            println!("  Total images:   {}", dataset.len());
            println!("  Total classes:  {}", encoder.num_classes());
            println!("  Image tensor:   {:?}", dataset.images.shape());
            println!("  Target matrix:  {:?}", targets.shape());
            println!("  Encoder saved:  {}", encoder_out.display());
        }

        Commands::Inspect { data_dir } => {
            let counts = scan_class_counts(&data_dir)?;
            let total: usize = counts.iter().map(|(_, n)| n).sum();

            println!("{}", "Dataset contents".green().bold());
            for (class_name, count) in &counts {
                let bar_len = if total > 0 { count * 40 / total } else { 0 };
                println!("  {:45} {:5} {}", class_name, count, "█".repeat(bar_len));
            }
            println!("  {} images across {} classes", total, counts.len());
        }
    }

    Ok(())
}
