// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Three subcommands: `train`, `featurize`, `catalog`.
//
// clap's derive macros generate --help text, missing-argument
// errors and string → number conversion.
//
// Reference: Rust Book §12 (Building a CLI Program)

use clap::{Args, Subcommand, ValueEnum};

use crate::application::featurize_use_case::FeaturizeConfig;
use crate::application::train_use_case::TrainConfig;
use crate::data::splitter::{PartitionConfig, PartitionStrategy};
use crate::ml::loss::WeightedLoss;
use crate::ml::schedule::ScheduleConfig;
use crate::ml::trainer::RegressorConfig;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Featurize, train, evaluate and write the run artifacts
    Train(TrainArgs),

    /// Write every window's feature vector to CSV
    Featurize(FeaturizeArgs),

    /// Show the class catalog with bands and strides
    Catalog(CatalogArgs),
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitMode {
    /// Fixed validation count per class, then a per-class test split
    FixedCount,
    /// Global class-stratified test split, then a random validation split
    Stratified,
}

/// All arguments for the `train` command.
#[derive(Args, Debug)]
pub struct TrainArgs {
    /// CSV file with one column of readings per class
    #[arg(long, default_value = "data/signals.csv")]
    pub data: String,

    /// Directory for config, metrics, report and predictions
    #[arg(long, default_value = "runs/latest")]
    pub output_dir: String,

    /// JSON catalog file (defaults to the built-in five classes)
    #[arg(long)]
    pub catalog: Option<String>,

    /// Readings per window (at least 6)
    #[arg(long, default_value_t = 30)]
    pub window_size: usize,

    #[arg(long, value_enum, default_value_t = SplitMode::FixedCount)]
    pub split: SplitMode,

    /// Validation samples per class (fixed-count split)
    #[arg(long, default_value_t = 20)]
    pub val_per_class: usize,

    /// Share of train that becomes validation (stratified split)
    #[arg(long, default_value_t = 0.2)]
    pub val_fraction: f64,

    /// Share of each class held out for testing
    #[arg(long, default_value_t = 0.2)]
    pub test_fraction: f64,

    #[arg(long, default_value_t = 300)]
    pub epochs: usize,

    #[arg(long, default_value_t = 32)]
    pub batch_size: usize,

    #[arg(long, default_value_t = 1e-3)]
    pub lr: f64,

    /// Floor for plateau learning-rate reductions
    #[arg(long, default_value_t = 1e-6)]
    pub min_lr: f64,

    /// Epochs without improvement before stopping
    #[arg(long, default_value_t = 20)]
    pub patience: usize,

    /// Epochs without improvement before reducing the learning rate
    #[arg(long, default_value_t = 10)]
    pub lr_patience: usize,

    #[arg(long, default_value_t = 0.2)]
    pub lr_factor: f64,

    /// Hidden layer widths, comma separated
    #[arg(long, value_delimiter = ',', default_value = "128,64,32")]
    pub hidden: Vec<usize>,

    #[arg(long, default_value_t = 0.2)]
    pub dropout: f64,

    /// Normalised targets below this get the extra loss multiplier
    #[arg(long, default_value_t = 0.3)]
    pub small_target_threshold: f64,

    #[arg(long, default_value_t = 2.0)]
    pub small_target_multiplier: f64,

    /// Seeds partitioning, batch shuffling and weight initialisation
    #[arg(long, default_value_t = 42)]
    pub seed: u64,
}

/// Convert CLI TrainArgs into the application-layer TrainConfig.
/// The application layer never sees clap types.
impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        let strategy = match a.split {
            SplitMode::FixedCount => PartitionStrategy::FixedCountPerClass { per_class: a.val_per_class },
            SplitMode::Stratified => PartitionStrategy::GlobalStratified { validation_fraction: a.val_fraction },
        };
        TrainConfig {
            data_path:    a.data,
            output_dir:   a.output_dir,
            catalog_path: a.catalog,
            window_size:  a.window_size,
            partition:    PartitionConfig {
                strategy,
                test_fraction: a.test_fraction,
                ..PartitionConfig::default()
            },
            loss: WeightedLoss {
                small_target_threshold:  a.small_target_threshold,
                small_target_multiplier: a.small_target_multiplier,
            },
            schedule: ScheduleConfig {
                max_epochs:              a.epochs,
                learning_rate:           a.lr,
                early_stopping_patience: a.patience,
                lr_patience:             a.lr_patience,
                lr_factor:               a.lr_factor,
                min_lr:                  a.min_lr,
            },
            regressor: RegressorConfig {
                hidden:     a.hidden,
                dropout:    a.dropout,
                batch_size: a.batch_size,
                ..RegressorConfig::default()
            },
            ..TrainConfig::default()
        }
        .with_seed(a.seed)
    }
}

/// All arguments for the `featurize` command
#[derive(Args, Debug)]
pub struct FeaturizeArgs {
    #[arg(long, default_value = "data/signals.csv")]
    pub data: String,

    /// Output CSV path
    #[arg(long, default_value = "features.csv")]
    pub output: String,

    #[arg(long)]
    pub catalog: Option<String>,

    #[arg(long, default_value_t = 30)]
    pub window_size: usize,
}

impl From<FeaturizeArgs> for FeaturizeConfig {
    fn from(a: FeaturizeArgs) -> Self {
        FeaturizeConfig {
            data_path:    a.data,
            output_path:  a.output,
            catalog_path: a.catalog,
            window_size:  a.window_size,
            ..FeaturizeConfig::default()
        }
    }
}

/// All arguments for the `catalog` command
#[derive(Args, Debug)]
pub struct CatalogArgs {
    #[arg(long)]
    pub catalog: Option<String>,

    /// Window size used to show each class's stride
    #[arg(long, default_value_t = 30)]
    pub window_size: usize,

    /// Print the catalog as JSON (a starting point for --catalog files)
    #[arg(long)]
    pub json: bool,
}
