// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the two subcommands: `train` and `evaluate`
// and all their configurable flags.
//
// Domain enums (LabelKind, SplitStrategy, Accelerator)
// implement FromStr, so clap parses them directly.

use clap::{Args, Subcommand};
use std::path::PathBuf;

use crate::application::train_use_case::TrainConfig;
use crate::domain::task::{Accelerator, LabelKind, SplitStrategy};

/// The two top-level subcommands available to the user
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train a 1D CNN / ResNet on a preprocessed .npz dataset
    Train(TrainArgs),

    /// Re-run the test split against a saved checkpoint
    Evaluate(EvaluateArgs),
}

/// All arguments for the `train` command.
#[derive(Args, Debug)]
pub struct TrainArgs {
    /// Path to preprocessed .npz dataset
    #[arg(long, default_value = "ml/processed/dataset.npz")]
    pub data: PathBuf,

    /// Which label to classify: env or node
    #[arg(long, default_value = "env")]
    pub task: LabelKind,

    /// Architecture: cnn or resnet
    #[arg(long, default_value = "cnn")]
    pub model: String,

    /// Split strategy: random or group_holdout
    #[arg(long, default_value = "random")]
    pub split: SplitStrategy,

    /// Group key for group_holdout split (defaults to the other label kind)
    #[arg(long)]
    pub group_key: Option<LabelKind>,

    /// Holdout label name or index for group_holdout split
    #[arg(long)]
    pub holdout: Option<String>,

    #[arg(long, default_value_t = 0.75)]
    pub train_frac: f64,

    #[arg(long, default_value_t = 0.1)]
    pub val_frac: f64,

    #[arg(long, default_value_t = 64)]
    pub batch_size: usize,

    #[arg(long, default_value_t = 20)]
    pub epochs: usize,

    /// Adam step size
    #[arg(long, default_value_t = 1e-3)]
    pub lr: f64,

    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Data loader worker threads (0 = load on the training thread)
    #[arg(long, default_value_t = 0)]
    pub num_workers: usize,

    /// Compute backend: auto, cpu or gpu
    #[arg(long, default_value = "auto")]
    pub accelerator: Accelerator,

    /// Run test after training
    #[arg(long)]
    pub test: bool,

    /// Width of the first convolution; later stages double it
    #[arg(long, default_value_t = 32)]
    pub base_channels: usize,

    /// Residual blocks per ResNet stage, e.g. 2,2,2
    #[arg(long, default_value = "2,2,2", value_parser = parse_layers)]
    pub layers: [usize; 3],

    /// Directory to save checkpoints, hyperparameters and metrics
    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: PathBuf,
}

/// Parse "a,b,c" into three positive block counts
fn parse_layers(s: &str) -> Result<[usize; 3], String> {
    let parts: Vec<usize> = s
        .split(',')
        .map(|p| p.trim().parse::<usize>().map_err(|e| format!("'{p}': {e}")))
        .collect::<Result<_, _>>()?;

    match parts.as_slice() {
        &[a, b, c] if a > 0 && b > 0 && c > 0 => Ok([a, b, c]),
        _ => Err(format!("expected three positive integers like 2,2,2, got '{s}'")),
    }
}

/// Convert CLI TrainArgs into the application-layer TrainConfig.
/// The application layer never sees clap types.
impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        // Grouped splits hold out the label kind we are NOT classifying
        let group_key = match (a.split, a.group_key) {
            (SplitStrategy::GroupHoldout, None) => Some(a.task.other()),
            (_, key) => key,
        };

        TrainConfig {
            data_path:      a.data,
            checkpoint_dir: a.checkpoint_dir,
            task:           a.task,
            arch:           a.model,
            split:          a.split,
            group_key,
            holdout:        a.holdout,
            train_frac:     a.train_frac,
            val_frac:       a.val_frac,
            batch_size:     a.batch_size,
            epochs:         a.epochs,
            lr:             a.lr,
            seed:           a.seed,
            num_workers:    a.num_workers,
            accelerator:    a.accelerator,
            test:           a.test,
            base_channels:  a.base_channels,
            layers:         a.layers,
        }
    }
}

/// All arguments for the `evaluate` command
#[derive(Args, Debug)]
pub struct EvaluateArgs {
    /// Directory where the training run saved its checkpoints
    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: PathBuf,

    /// Dataset path, if it moved since training
    #[arg(long)]
    pub data: Option<PathBuf>,

    /// Compute backend override: auto, cpu or gpu
    #[arg(long)]
    pub accelerator: Option<Accelerator>,
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use clap::Parser;

    fn train_config(args: &[&str]) -> TrainConfig {
        let mut argv = vec!["ts-classifier", "train"];
        argv.extend_from_slice(args);
        match Cli::parse_from(argv).command {
            Commands::Train(a) => a.into(),
            other => panic!("expected train, got {other:?}"),
        }
    }

    #[test]
    fn test_defaults() {
        let cfg = train_config(&[]);
        assert_eq!(cfg.task, LabelKind::Env);
        assert_eq!(cfg.arch, "cnn");
        assert_eq!(cfg.split, SplitStrategy::Random);
        assert_eq!(cfg.group_key, None);
        assert_eq!(cfg.batch_size, 64);
        assert_eq!(cfg.layers, [2, 2, 2]);
        assert_eq!(cfg.accelerator, Accelerator::Auto);
        assert!(!cfg.test);
    }

    #[test]
    fn test_group_key_defaults_to_other_label_kind() {
        let cfg = train_config(&["--split", "group_holdout"]);
        assert_eq!(cfg.group_key, Some(LabelKind::Node));

        let cfg = train_config(&["--split", "group_holdout", "--task", "node"]);
        assert_eq!(cfg.group_key, Some(LabelKind::Env));

        let cfg = train_config(&["--split", "group_holdout", "--group-key", "env"]);
        assert_eq!(cfg.group_key, Some(LabelKind::Env));
    }

    #[test]
    fn test_unknown_model_name_reaches_the_application_layer() {
        // Architecture validation belongs to the classifier, not clap
        let cfg = train_config(&["--model", "lstm"]);
        assert_eq!(cfg.arch, "lstm");
    }

    #[test]
    fn test_parse_layers() {
        assert_eq!(parse_layers("1,2,3"), Ok([1, 2, 3]));
        assert_eq!(parse_layers(" 3, 3 ,3"), Ok([3, 3, 3]));
        assert!(parse_layers("2,2").is_err());
        assert!(parse_layers("0,2,2").is_err());
        assert!(parse_layers("a,b,c").is_err());
    }

    #[test]
    fn test_bad_split_is_rejected_by_clap() {
        let res = Cli::try_parse_from(["ts-classifier", "train", "--split", "kfold"]);
        assert!(res.is_err());
    }
}
