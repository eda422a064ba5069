// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates the full training pipeline in order:
//
//   Step 1: Validate the architecture name  (Layer 5 - ml)
//   Step 2: Load and split the dataset      (Layer 4 - data)
//   Step 3: Derive model hyperparameters    (Layer 5 - ml)
//   Step 4: Clear old weights, save config  (Layer 6 - infra)
//   Step 5: Run fit (and optionally test)   (Layer 5 - ml)
//
// Reference: Burn Book §5 (Training)

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::data::module::{DataConfig, TimeSeriesDataModule};
use crate::domain::task::{Accelerator, LabelKind, SplitStrategy};
use crate::infra::checkpoint::CheckpointManager;
use crate::ml::{
    classifier::{Arch, ClassifierConfig},
    trainer::{run_training, RunDatasets},
};

// ─── Training Configuration ──────────────────────────────────────────────────
// Everything a training run needs. Saved as train_config.json
// so `evaluate` can rebuild the same split later.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainConfig {
    pub data_path:      PathBuf,
    pub checkpoint_dir: PathBuf,
    pub task:           LabelKind,
    pub arch:           String,
    pub split:          SplitStrategy,
    pub group_key:      Option<LabelKind>,
    pub holdout:        Option<String>,
    pub train_frac:     f64,
    pub val_frac:       f64,
    pub batch_size:     usize,
    pub epochs:         usize,
    pub lr:             f64,
    pub seed:           u64,
    pub num_workers:    usize,
    pub accelerator:    Accelerator,
    pub test:           bool,
    pub base_channels:  usize,
    pub layers:         [usize; 3],
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            data_path:      PathBuf::from("ml/processed/dataset.npz"),
            checkpoint_dir: PathBuf::from("checkpoints"),
            task:           LabelKind::Env,
            arch:           "cnn".to_string(),
            split:          SplitStrategy::Random,
            group_key:      None,
            holdout:        None,
            train_frac:     0.75,
            val_frac:       0.1,
            batch_size:     64,
            epochs:         20,
            lr:             1e-3,
            seed:           42,
            num_workers:    0,
            accelerator:    Accelerator::Auto,
            test:           false,
            base_channels:  32,
            layers:         [2, 2, 2],
        }
    }
}

impl TrainConfig {
    /// The data-module part of this configuration
    pub fn data_config(&self) -> DataConfig {
        DataConfig {
            data_path:   self.data_path.clone(),
            task:        self.task,
            split:       self.split,
            train_frac:  self.train_frac,
            val_frac:    self.val_frac,
            group_key:   self.group_key,
            holdout:     self.holdout.clone(),
            seed:        self.seed,
        }
    }

    /// Classifier hyperparameters for a dataset with the given
    /// input channels and class count.
    pub fn classifier_config(&self, in_channels: usize, num_classes: usize) -> ClassifierConfig {
        ClassifierConfig::new(in_channels, num_classes)
            .with_arch(self.arch.clone())
            .with_learning_rate(self.lr)
            .with_base_channels(self.base_channels)
            .with_layers(self.layers)
    }
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
pub struct TrainUseCase {
    config: TrainConfig,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    /// Execute the full training pipeline end to end
    pub fn execute(&self) -> Result<()> {
        let cfg = &self.config;

        // ── Step 1: Reject unknown architectures before touching data ─────────
        let arch: Arch = cfg.arch.parse().context("Invalid model configuration")?;
        tracing::info!("Training a {} classifier on task '{}'", arch, cfg.task);

        // ── Step 2: Load + split ──────────────────────────────────────────────
        let mut dm = TimeSeriesDataModule::new(cfg.data_config());
        dm.setup()?;

        // ── Step 3: Hyperparameters from the data dimensions ──────────────────
        let hparams = cfg.classifier_config(dm.input_channels(), dm.num_classes());
        tracing::info!(
            "Input channels: {}, classes: {}",
            hparams.in_channels, hparams.num_classes,
        );

        // ── Step 4: Persist what is needed to reproduce the run ───────────────
        let ckpt_manager = CheckpointManager::new(&cfg.checkpoint_dir)?;
        let stale = ckpt_manager.clear_models()?;
        if stale > 0 {
            tracing::warn!("Removed {} checkpoints from a previous run", stale);
        }
        ckpt_manager.save_run_config(cfg)?;
        ckpt_manager.save_hparams(&hparams)?;

        // ── Step 5: Fit (+ test) ──────────────────────────────────────────────
        let (train, val, test) = dm.into_datasets()?;
        tracing::info!("Train class counts: {:?}", train.class_counts(hparams.num_classes));
        run_training(cfg, &hparams, RunDatasets { train, val, test }, &ckpt_manager)?;

        Ok(())
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_arch_fails_before_loading_data() {
        let cfg = TrainConfig {
            arch:      "lstm".to_string(),
            data_path: PathBuf::from("does/not/exist.npz"),
            ..TrainConfig::default()
        };

        let err = TrainUseCase::new(cfg).execute().unwrap_err();
        assert!(format!("{err:#}").contains("arch must be 'cnn' or 'resnet'"));
    }

    #[test]
    fn test_classifier_config_carries_run_settings() {
        let cfg = TrainConfig {
            arch:          "resnet".to_string(),
            lr:            5e-4,
            base_channels: 16,
            layers:        [1, 1, 1],
            ..TrainConfig::default()
        };

        let hparams = cfg.classifier_config(3, 6);
        assert_eq!(hparams.in_channels, 3);
        assert_eq!(hparams.num_classes, 6);
        assert_eq!(hparams.arch, "resnet");
        assert_eq!(hparams.learning_rate, 5e-4);
        assert_eq!(hparams.base_channels, 16);
        assert_eq!(hparams.layers, [1, 1, 1]);
    }
}
