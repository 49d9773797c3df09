//! gbtrain CLI
//!
//! Trains a gradient boosted regression tree ensemble from a CSV dataset and
//! writes the model with its blake3 hash.

use anyhow::{Context, Result};
use clap::Parser;
use gbtrain_trainer::{Dataset, GbdtTrainer, TrainingParams};
use std::path::PathBuf;
use tracing::{debug, info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "gbtrain")]
#[command(author = "gbtrain Contributors")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Exact-greedy gradient boosted regression tree trainer", long_about = None)]
struct Args {
    /// Input CSV dataset path (last column is the label)
    #[arg(short, long)]
    input: PathBuf,

    /// Output directory for model and hash
    #[arg(short, long, default_value = "models/gbtrain")]
    output: PathBuf,

    /// TOML file with training parameters
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of boosting trees
    #[arg(long)]
    trees: Option<usize>,

    /// Maximum tree depth
    #[arg(long)]
    max_depth: Option<usize>,

    /// L2 regularization on leaf weights
    #[arg(long)]
    lambda: Option<f64>,

    /// Minimum split gain
    #[arg(long)]
    gamma: Option<f64>,

    /// Shrinkage applied to every tree
    #[arg(long)]
    learning_rate: Option<f64>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    /// Config file (or defaults) with command line overrides applied
    fn training_params(&self) -> Result<TrainingParams> {
        let mut params = match &self.config {
            Some(path) => TrainingParams::from_toml_file(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => TrainingParams::default(),
        };

        if let Some(trees) = self.trees {
            params.max_trees = trees;
        }
        if let Some(max_depth) = self.max_depth {
            params.max_depth = max_depth;
        }
        if let Some(lambda) = self.lambda {
            params.lambda = lambda;
        }
        if let Some(gamma) = self.gamma {
            params.gamma = gamma;
        }
        if let Some(learning_rate) = self.learning_rate {
            params.learning_rate = learning_rate;
        }

        params.validate().context("Invalid training parameters")?;
        Ok(params)
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Setup logging
    let log_level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    info!("gbtrain v{}", env!("CARGO_PKG_VERSION"));

    let params = args.training_params()?;

    info!("Loading dataset from: {}", args.input.display());
    let dataset = Dataset::from_csv(&args.input).context("Failed to load dataset")?;
    info!(
        "Loaded {} samples with {} features",
        dataset.len(),
        dataset.feature_count
    );

    info!("Feature statistics:");
    for (i, (min, max)) in dataset.feature_stats().iter().enumerate() {
        info!("  Feature {}: min={}, max={}", i, min, max);
    }

    info!("Training configuration:");
    info!("  Trees: {}", params.max_trees);
    info!("  Max depth: {}", params.max_depth);
    info!("  Lambda: {}", params.lambda);
    info!("  Gamma: {}", params.gamma);
    info!("  Learning rate: {}", params.learning_rate);

    info!("Starting training...");
    let trainer = GbdtTrainer::new(params)?;
    let outcome = trainer.train(&dataset)?;

    for (i, tree) in outcome.ensemble.trees.iter().enumerate() {
        debug!("Tree {}:\n{}", i + 1, tree);
    }

    info!("Training complete!");
    info!("  Trees: {}", outcome.ensemble.num_trees());
    if let Some(last) = outcome.history.last() {
        info!("  Train loss: {:.6}", last.train_loss);
        info!("  Train MSE: {:.6}", last.train_mse);
    }

    std::fs::create_dir_all(&args.output).context("Failed to create output directory")?;

    let model_path = args.output.join("model.json");
    info!("Saving model to: {}", model_path.display());
    outcome
        .ensemble
        .save_json(&model_path)
        .context("Failed to write model file")?;

    let hash_hex = outcome.ensemble.hash_hex().context("Failed to hash model")?;
    let hash_path = args.output.join("model.hash");
    info!("Saving hash to: {}", hash_path.display());
    std::fs::write(&hash_path, &hash_hex).context("Failed to write hash file")?;

    info!("Training completed successfully");
    info!("  Model: {}", model_path.display());
    info!("  Hash: {} ({})", hash_path.display(), hash_hex);

    Ok(())
}
