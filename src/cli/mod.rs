// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Entry point for all user interaction, parsed with `clap`.
// All pipeline work is delegated to Layer 2 (application).
//
// Three commands are supported:
//   1. `train`      featurize, partition, train, evaluate
//   2. `featurize`  dump window feature vectors to CSV
//   3. `catalog`    show classes, tolerance bands and strides
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{CatalogArgs, Commands, FeaturizeArgs, TrainArgs};

use crate::application::catalog_file::load_catalog_spec;
use crate::data::windower::StridePolicy;
use crate::domain::volume_class::{Catalog, CatalogSpec};

#[derive(Parser, Debug)]
#[command(
    name = "fill-volume",
    version = "0.1.0",
    about = "Predict container fill volume from windowed signal readings."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Route the subcommand to its use case; never computes itself.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args)     => run_train(args),
            Commands::Featurize(args) => run_featurize(args),
            Commands::Catalog(args)   => run_catalog(args),
        }
    }
}

fn run_train(args: TrainArgs) -> Result<()> {
    use crate::application::train_use_case::TrainUseCase;

    tracing::info!("Starting training on signals in: {}", args.data);
    let summary = TrainUseCase::new(args.into()).execute()?;

    println!(
        "\nSamples: {} train / {} validation / {} test",
        summary.train_count, summary.val_count, summary.test_count
    );
    println!(
        "Epochs:  {} (best {}{})",
        summary.history.epochs.len(),
        summary.history.best_epoch,
        if summary.history.stopped_early { ", stopped early" } else { "" }
    );
    if let Some(best) = summary.history.best() {
        println!("Best monitored loss: {:.6} at lr {:e}", best.monitored_loss(), best.learning_rate);
    }
    println!("\n{:<10} {:>6} {:>10} {:>10} {:>10} {:>8}", "class", "n", "mse", "rmse", "mae", "mape%");
    for (class, m) in summary.report.iter() {
        let mape = m.mape.map_or_else(|| "-".to_string(), |v| format!("{v:.2}"));
        println!(
            "{:<10} {:>6} {:>10.4} {:>10.4} {:>10.4} {:>8}",
            class, m.sample_count, m.mse, m.rmse, m.mae, mape
        );
    }
    println!("\nArtifacts written to {}", summary.output_dir.display());
    Ok(())
}

fn run_featurize(args: FeaturizeArgs) -> Result<()> {
    use crate::application::featurize_use_case::FeaturizeUseCase;

    let output = args.output.clone();
    let rows = FeaturizeUseCase::new(args.into()).execute()?;
    println!("Wrote {rows} feature rows to {output}");
    Ok(())
}

fn run_catalog(args: CatalogArgs) -> Result<()> {
    let spec = load_catalog_spec(args.catalog.as_deref(), &CatalogSpec::default())?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&spec)?);
        return Ok(());
    }

    let catalog = Catalog::from_spec(&spec)?;
    let strides = StridePolicy::default();
    println!("{:<10} {:>8} {:>7} {:>16} {:>7}", "class", "nominal", "weight", "band", "stride");
    for class in catalog.classes() {
        let (lo, hi) = class.band();
        println!(
            "{:<10} {:>8} {:>7} {:>16} {:>7}",
            class.name,
            class.nominal_volume,
            class.weight,
            format!("[{lo}, {hi}]"),
            strides.stride_for(class, args.window_size),
        );
    }
    Ok(())
}
