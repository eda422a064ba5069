// ============================================================
// Layer 6 — Checkpoint Manager
// ============================================================
// Saves and restores model weights using Burn's CompactRecorder.
//
// What gets saved:
//   1. Model weights (.mpk.gz file) — all learned parameters
//   2. latest_epoch.json            — which epoch was last saved
//   3. hparams.json                 — ClassifierConfig the model
//                                     was built from
//   4. train_config.json            — the run configuration, so
//                                     `evaluate` can rebuild the
//                                     exact same data split
//
// Weights alone are not enough to reload a model: Burn needs
// an identically shaped module to load the record into, and
// only hparams.json says which architecture and widths that is.
//
// File naming convention:
//   checkpoints/
//     model_epoch_1.mpk.gz   ← weights after epoch 1
//     model_epoch_2.mpk.gz   ← weights after epoch 2
//     ...
//     latest_epoch.json
//     hparams.json
//     train_config.json
//     metrics.csv            ← written by MetricsLogger
//
// Reference: Burn Book §5 (Records and Checkpointing)

use anyhow::{Context, Result};
use burn::{
    prelude::*,
    record::{CompactRecorder, Recorder},
};
use serde::{de::DeserializeOwned, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::ml::classifier::{ClassifierConfig, TimeSeriesClassifier};

const HPARAMS_FILE:      &str = "hparams.json";
const TRAIN_CONFIG_FILE: &str = "train_config.json";
const LATEST_EPOCH_FILE: &str = "latest_epoch.json";

/// Manages saving and loading of model checkpoints.
/// All files are stored in the configured directory.
pub struct CheckpointManager {
    dir: PathBuf,
}

impl CheckpointManager {
    /// Create a new CheckpointManager, creating the directory
    /// if it doesn't already exist.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Cannot create checkpoint directory '{}'", dir.display()))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Save model weights for a given epoch to
    /// {dir}/model_epoch_{epoch}.mpk.gz and move the latest pointer.
    pub fn save_model<B: Backend>(
        &self,
        model: &TimeSeriesClassifier<B>,
        epoch: usize,
    ) -> Result<()> {
        // Recorder adds the extension
        let path = self.dir.join(format!("model_epoch_{epoch}"));

        CompactRecorder::new()
            .record(model.clone().into_record(), path.clone())
            .with_context(|| {
                format!("Failed to save checkpoint to '{}'", path.display())
            })?;

        let latest_path = self.dir.join(LATEST_EPOCH_FILE);
        fs::write(&latest_path, serde_json::to_string(&epoch)?)
            .with_context(|| format!("Failed to write {LATEST_EPOCH_FILE}"))?;

        tracing::debug!("Saved checkpoint: epoch {}", epoch);
        Ok(())
    }

    /// Load the latest saved weights into `model`.
    ///
    /// The model must have the architecture the checkpoint was
    /// saved from (build it from `load_hparams()`).
    pub fn load_model<B: Backend>(
        &self,
        model:  TimeSeriesClassifier<B>,
        device: &B::Device,
    ) -> Result<TimeSeriesClassifier<B>> {
        let epoch = self.latest_epoch()?;
        let path  = self.dir.join(format!("model_epoch_{epoch}"));

        tracing::info!("Loading checkpoint from epoch {}", epoch);

        let record = CompactRecorder::new()
            .load(path.clone(), device)
            .with_context(|| {
                format!("Cannot load checkpoint '{}'. Have you trained the model first?",
                    path.display())
            })?;

        Ok(model.load_record(record))
    }

    /// Remove the epoch weights and latest-epoch pointer left by an
    /// earlier run in this directory. Returns how many weight files
    /// were deleted.
    pub fn clear_models(&self) -> Result<usize> {
        let mut removed = 0;
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            let is_weights = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with("model_epoch_"));
            if is_weights {
                fs::remove_file(&path)
                    .with_context(|| format!("Cannot remove stale checkpoint '{}'", path.display()))?;
                removed += 1;
            }
        }

        let latest = self.dir.join(LATEST_EPOCH_FILE);
        if latest.exists() {
            fs::remove_file(&latest)?;
        }
        Ok(removed)
    }

    /// Persist the classifier hyperparameters.
    pub fn save_hparams(&self, hparams: &ClassifierConfig) -> Result<()> {
        self.write_json(HPARAMS_FILE, hparams)
    }

    pub fn load_hparams(&self) -> Result<ClassifierConfig> {
        self.read_json(HPARAMS_FILE)
    }

    /// Persist the run configuration (data split, loop settings).
    pub fn save_run_config<T: Serialize>(&self, cfg: &T) -> Result<()> {
        self.write_json(TRAIN_CONFIG_FILE, cfg)
    }

    pub fn load_run_config<T: DeserializeOwned>(&self) -> Result<T> {
        self.read_json(TRAIN_CONFIG_FILE)
    }

    /// Read latest_epoch.json and return the epoch number.
    /// Returns an error if training hasn't been run yet.
    pub fn latest_epoch(&self) -> Result<usize> {
        let path = self.dir.join(LATEST_EPOCH_FILE);

        let s = fs::read_to_string(&path)
            .with_context(|| {
                format!("Cannot find '{}'. Have you run 'train' first?", path.display())
            })?;

        Ok(serde_json::from_str::<usize>(&s)?)
    }

    fn write_json<T: Serialize + ?Sized>(&self, name: &str, value: &T) -> Result<()> {
        let path = self.dir.join(name);
        let json = serde_json::to_string_pretty(value)?;

        fs::write(&path, json)
            .with_context(|| format!("Cannot write '{}'", path.display()))?;

        tracing::debug!("Saved '{}'", path.display());
        Ok(())
    }

    fn read_json<T: DeserializeOwned>(&self, name: &str) -> Result<T> {
        let path = self.dir.join(name);

        let json = fs::read_to_string(&path)
            .with_context(|| {
                format!(
                    "Cannot read '{}'. Make sure you have run 'train' before 'evaluate'.",
                    path.display()
                )
            })?;

        serde_json::from_str(&json)
            .with_context(|| format!("Malformed '{}'", path.display()))
    }
}
