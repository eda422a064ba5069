// ============================================================
// Layer 6 — Metrics
// ============================================================
// Two pieces:
//
//   MetricRecorder — in-memory sink the classifier's step
//                    functions write into ("train_loss",
//                    "val_acc", ...). Keeps a batch-size
//                    weighted running mean per name, so the
//                    epoch summary is the mean over samples,
//                    not over batches.
//
//   MetricsLogger  — starts a fresh CSV per run and appends
//                    one row per epoch.
//
// Output file: checkpoints/metrics.csv
//
// Example CSV output:
//   epoch,train_loss,train_acc,val_loss,val_acc
//   1,1.093211,0.412000,1.021877,0.455000
//   2,0.871004,0.602500,0.912330,0.561000
//
// Reference: Rust Book §8 (HashMap/BTreeMap), §12 (I/O)

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    fs::{self, OpenOptions},
    io::Write,
    path::PathBuf,
};

// ─── MetricRecorder ───────────────────────────────────────────────────────────
#[derive(Debug, Clone, Copy, Default)]
struct RunningMetric {
    weighted_sum: f64,
    weight:       f64,
}

/// Named scalar metrics logged by training / validation / test steps.
#[derive(Debug, Clone, Default)]
pub struct MetricRecorder {
    metrics: BTreeMap<String, RunningMetric>,
}

impl MetricRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `value` for `name`, weighted by the number of
    /// samples it was computed over.
    pub fn log(&mut self, name: &str, value: f64, batch_size: usize) {
        let entry  = self.metrics.entry(name.to_string()).or_default();
        let weight = batch_size as f64;
        entry.weighted_sum += value * weight;
        entry.weight       += weight;
    }

    /// Sample-weighted mean of everything logged since the last reset
    pub fn mean(&self, name: &str) -> Option<f64> {
        self.metrics
            .get(name)
            .filter(|m| m.weight > 0.0)
            .map(|m| m.weighted_sum / m.weight)
    }

    #[cfg(test)]
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.metrics.keys().map(String::as_str)
    }

    /// Forget all values (start of a new epoch)
    pub fn reset(&mut self) {
        self.metrics.clear();
    }
}

// ─── EpochMetrics ─────────────────────────────────────────────────────────────
/// One row of metrics data for a single training epoch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpochMetrics {
    /// The epoch number (starts at 1)
    pub epoch: usize,

    /// Mean cross-entropy over all training samples
    pub train_loss: f64,

    /// Fraction of training samples classified correctly
    pub train_acc: f64,

    /// Mean cross-entropy on the validation set.
    /// NaN when the validation split is empty
    pub val_loss: f64,

    pub val_acc: f64,
}

impl EpochMetrics {
    /// Summarise an epoch from the recorder's running means
    pub fn from_recorder(epoch: usize, rec: &MetricRecorder) -> Self {
        let get = |name: &str| rec.mean(name).unwrap_or(f64::NAN);
        Self {
            epoch,
            train_loss: get("train_loss"),
            train_acc:  get("train_acc"),
            val_loss:   get("val_loss"),
            val_acc:    get("val_acc"),
        }
    }

    /// Returns true if this epoch improved over the previous best val_loss
    pub fn is_improvement(&self, best_val_loss: f64) -> bool {
        self.val_loss < best_val_loss
    }
}

// ─── MetricsLogger ────────────────────────────────────────────────────────────
/// Logs epoch metrics to a CSV file for later analysis.
pub struct MetricsLogger {
    csv_path: PathBuf,
}

impl MetricsLogger {
    /// Start the metrics CSV for a new run.
    /// Any rows from an earlier run in the same directory are dropped.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;

        let csv_path = dir.join("metrics.csv");

        let mut f = fs::File::create(&csv_path)?;
        writeln!(f, "epoch,train_loss,train_acc,val_loss,val_acc")?;
        tracing::debug!("Created metrics CSV: '{}'", csv_path.display());

        Ok(Self { csv_path })
    }

    /// Append one epoch's metrics as a new row in the CSV.
    pub fn log(&self, m: &EpochMetrics) -> Result<()> {
        let mut f = OpenOptions::new()
            .append(true)
            .open(&self.csv_path)?;

        writeln!(
            f,
            "{},{:.6},{:.6},{:.6},{:.6}",
            m.epoch,
            m.train_loss,
            m.train_acc,
            m.val_loss,
            m.val_acc,
        )?;

        tracing::debug!(
            "Logged epoch {} metrics: train_loss={:.4}, val_loss={:.4}",
            m.epoch,
            m.train_loss,
            m.val_loss,
        );

        Ok(())
    }

    #[cfg(test)]
    pub fn csv_path(&self) -> &PathBuf {
        &self.csv_path
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weighted_mean_counts_samples_not_batches() {
        let mut rec = MetricRecorder::new();
        rec.log("val_acc", 1.0, 3);
        rec.log("val_acc", 0.0, 1);

        assert_eq!(rec.mean("val_acc"), Some(0.75));
        assert_eq!(rec.mean("val_loss"), None);
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut rec = MetricRecorder::new();
        rec.log("train_loss", 0.5, 8);
        rec.reset();
        assert!(rec.names().next().is_none());
    }

    #[test]
    fn test_epoch_summary_and_improvement() {
        let mut rec = MetricRecorder::new();
        rec.log("train_loss", 2.5, 4);
        rec.log("train_acc",  0.5, 4);
        rec.log("val_loss",   2.3, 2);
        rec.log("val_acc",    0.5, 2);

        let m = EpochMetrics::from_recorder(2, &rec);
        assert_eq!(m.train_loss, 2.5);
        assert!(m.is_improvement(3.0));
        assert!(!m.is_improvement(2.0));
    }

    #[test]
    fn test_csv_rows_are_appended_after_header() {
        let dir    = tempfile::tempdir().unwrap();
        let logger = MetricsLogger::new(dir.path()).unwrap();
        let m = EpochMetrics { epoch: 1, train_loss: 1.0, train_acc: 0.25, val_loss: 0.5, val_acc: 0.75 };
        logger.log(&m).unwrap();

        let csv = fs::read_to_string(logger.csv_path()).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "epoch,train_loss,train_acc,val_loss,val_acc");
        assert_eq!(lines[1], "1,1.000000,0.250000,0.500000,0.750000");
    }

    #[test]
    fn test_new_run_starts_a_fresh_csv() {
        let dir = tempfile::tempdir().unwrap();
        let m = EpochMetrics { epoch: 1, train_loss: 1.0, train_acc: 0.5, val_loss: 1.0, val_acc: 0.5 };
        MetricsLogger::new(dir.path()).unwrap().log(&m).unwrap();
        MetricsLogger::new(dir.path()).unwrap().log(&m).unwrap();

        let logger = MetricsLogger::new(dir.path()).unwrap();
        let csv = fs::read_to_string(logger.csv_path()).unwrap();
        assert_eq!(csv.lines().count(), 1);
    }
}
