// ============================================================
// Layer 2 — EvaluateUseCase
// ============================================================
// Re-test a finished run:
//   1. Read train_config.json from the checkpoint directory
//   2. Rebuild the same data split (same seed, same strategy)
//   3. Rebuild the classifier from hparams.json, load weights
//   4. Run the test loop on the test split

use anyhow::Result;
use std::path::PathBuf;

use crate::application::train_use_case::TrainConfig;
use crate::data::module::TimeSeriesDataModule;
use crate::domain::task::Accelerator;
use crate::infra::checkpoint::CheckpointManager;
use crate::ml::trainer::{run_evaluation, EvalSummary};

pub struct EvaluateUseCase {
    checkpoint_dir: PathBuf,
    /// Overrides the dataset path stored with the run
    data_path:      Option<PathBuf>,
    accelerator:    Option<Accelerator>,
}

impl EvaluateUseCase {
    pub fn new(
        checkpoint_dir: impl Into<PathBuf>,
        data_path:      Option<PathBuf>,
        accelerator:    Option<Accelerator>,
    ) -> Self {
        Self { checkpoint_dir: checkpoint_dir.into(), data_path, accelerator }
    }

    pub fn execute(&self) -> Result<EvalSummary> {
        let ckpt_manager = CheckpointManager::new(&self.checkpoint_dir)?;
        let mut cfg: TrainConfig = ckpt_manager.load_run_config()?;
        if let Some(path) = &self.data_path {
            cfg.data_path = path.clone();
        }
        let accelerator = self.accelerator.unwrap_or(cfg.accelerator);

        let mut dm = TimeSeriesDataModule::new(cfg.data_config());
        dm.setup()?;
        let (_, _, test) = dm.into_datasets()?;

        tracing::info!("Evaluating checkpoint in '{}'", self.checkpoint_dir.display());
        run_evaluation(accelerator, cfg.batch_size, cfg.num_workers, test, &ckpt_manager)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::train_use_case::TrainUseCase;
    use ndarray::{Array, Array1};
    use ndarray_npy::NpzWriter;
    use std::{fs::File, path::Path};

    fn write_dataset(path: &Path, n: usize) {
        // env class 1 is shifted up so a short run learns something
        let x = Array::from_shape_fn((n, 2, 32), |(i, c, t)| {
            ((t + c) as f32 * 0.3).sin() + (i % 2) as f32 * 2.0
        });
        let env  = Array1::from_iter((0..n).map(|i| (i % 2) as i64));
        let node = Array1::from_iter((0..n).map(|i| (i % 4) as i64));

        let mut npz = NpzWriter::new(File::create(path).unwrap());
        npz.add_array("X", &x).unwrap();
        npz.add_array("y_env", &env).unwrap();
        npz.add_array("y_node", &node).unwrap();
        npz.finish().unwrap();
    }

    #[test]
    fn test_evaluate_reuses_the_saved_run() {
        let dir       = tempfile::tempdir().unwrap();
        let data_path = dir.path().join("dataset.npz");
        let ckpt_dir  = dir.path().join("checkpoints");
        write_dataset(&data_path, 16);

        let cfg = TrainConfig {
            data_path:      data_path.clone(),
            checkpoint_dir: ckpt_dir.clone(),
            epochs:         1,
            batch_size:     4,
            base_channels:  4,
            accelerator:    Accelerator::Cpu,
            ..TrainConfig::default()
        };
        TrainUseCase::new(cfg).execute().unwrap();

        let summary = EvaluateUseCase::new(&ckpt_dir, None, None).execute().unwrap();

        // 16 samples: round(12) train, round(1.6) val, the rest test
        assert_eq!(summary.samples, 2);
        assert!(summary.loss.is_finite());
        assert!((0.0..=1.0).contains(&summary.accuracy));
    }

    #[test]
    fn test_evaluate_without_a_run_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = EvaluateUseCase::new(dir.path(), None, Some(Accelerator::Cpu)).execute();
        assert!(result.is_err());
    }
}
