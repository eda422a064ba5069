// ============================================================
// Layer 4 — Time-Series Data Module
// ============================================================
// Bundles loading and splitting behind one object so the
// application layer only asks for:
//
//   - the three datasets (train / val / test)
//   - input_channels  → classifier in_channels
//   - num_classes     → classifier num_classes
//
// `setup()` is separate from `new()` so a module can be built
// from config cheaply and only touch the disk when needed.

use anyhow::{Context, Result};
use rand::{rngs::StdRng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::data::{
    dataset::SeriesDataset,
    loader::NpzLoader,
    splitter::{group_holdout_split, random_split, resolve_holdout, SplitIndices},
    DataError,
};
use crate::domain::task::{LabelKind, SplitStrategy};
use crate::domain::traits::{LabelledCorpus, SeriesSource};

/// Everything needed to reproduce one data split.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    pub data_path:   PathBuf,
    pub task:        LabelKind,
    pub split:       SplitStrategy,
    pub train_frac:  f64,
    pub val_frac:    f64,
    /// Only used by the group-holdout split
    pub group_key:   Option<LabelKind>,
    pub holdout:     Option<String>,
    pub seed:        u64,
}

/// The three datasets produced by `setup()`
struct Splits {
    train: SeriesDataset,
    val:   SeriesDataset,
    test:  SeriesDataset,
}

pub struct TimeSeriesDataModule {
    config:         DataConfig,
    splits:         Option<Splits>,
    input_channels: usize,
    num_classes:    usize,
}

impl TimeSeriesDataModule {
    pub fn new(config: DataConfig) -> Self {
        Self { config, splits: None, input_channels: 0, num_classes: 0 }
    }

    /// Load the corpus from `data_path` and build all splits.
    pub fn setup(&mut self) -> Result<()> {
        let loader = NpzLoader::new(&self.config.data_path);
        let corpus = loader.load()
            .with_context(|| format!("Failed to load '{}'", self.config.data_path.display()))?;
        self.setup_from(&corpus)
    }

    /// Build the splits from an already loaded corpus.
    pub fn setup_from<C: LabelledCorpus>(&mut self, corpus: &C) -> Result<()> {
        let cfg    = &self.config;
        let labels = corpus.labels(cfg.task);
        let mut rng = StdRng::seed_from_u64(cfg.seed);

        let indices = match cfg.split {
            SplitStrategy::Random => {
                random_split(corpus.len(), cfg.train_frac, cfg.val_frac, &mut rng)
            }
            SplitStrategy::GroupHoldout => {
                let key     = cfg.group_key.unwrap_or_else(|| cfg.task.other());
                let groups  = corpus.labels(key);
                let holdout = resolve_holdout(
                    cfg.holdout.as_deref(),
                    corpus.label_names(key),
                    groups,
                )?;
                tracing::info!("Holding out {} group {} as the test set", key, holdout);
                group_holdout_split(groups, holdout, cfg.train_frac, cfg.val_frac, &mut rng)
            }
        };

        if indices.train.is_empty() {
            return Err(DataError::EmptySplit(format!(
                "{} split of {} samples", cfg.split, corpus.len()
            )).into());
        }
        log_split(&indices);

        self.input_channels = corpus.channels();
        self.num_classes    = class_count(labels, corpus.label_names(cfg.task));
        self.splits = Some(Splits {
            train: SeriesDataset::from_indices(corpus, labels, &indices.train),
            val:   SeriesDataset::from_indices(corpus, labels, &indices.val),
            test:  SeriesDataset::from_indices(corpus, labels, &indices.test),
        });
        Ok(())
    }

    pub fn input_channels(&self) -> usize { self.input_channels }

    pub fn num_classes(&self) -> usize { self.num_classes }

    /// Take the datasets out of the module (train, val, test).
    /// Fails if `setup()` has not run.
    pub fn into_datasets(self) -> Result<(SeriesDataset, SeriesDataset, SeriesDataset)> {
        let splits = self.splits
            .ok_or_else(|| anyhow::anyhow!("data module used before setup()"))?;
        Ok((splits.train, splits.val, splits.test))
    }
}

/// One class per label index seen, or per known name if more.
fn class_count(labels: &[usize], names: Option<&[String]>) -> usize {
    let seen = labels.iter().copied().max().map_or(0, |m| m + 1);
    seen.max(names.map_or(0, |n| n.len()))
}

fn log_split(indices: &SplitIndices) {
    tracing::info!(
        "Split: {} train, {} validation, {} test",
        indices.train.len(),
        indices.val.len(),
        indices.test.len(),
    );
}
