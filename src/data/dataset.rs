use burn::data::dataset::Dataset;
use serde::{Deserialize, Serialize};

use crate::domain::traits::LabelledCorpus;

/// One labelled multichannel window.
/// `values` is channel-major: all steps of channel 0, then channel 1, ...
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeriesSample {
    pub values:   Vec<f32>,
    pub channels: usize,
    pub length:   usize,
    pub label:    usize,
}

pub struct SeriesDataset {
    samples: Vec<SeriesSample>,
}

impl SeriesDataset {
    #[cfg(test)]
    pub fn new(samples: Vec<SeriesSample>) -> Self { Self { samples } }

    /// Materialise the series at `indices`, labelled by `labels`.
    pub fn from_indices<C: LabelledCorpus>(corpus: &C, labels: &[usize], indices: &[usize]) -> Self {
        let samples = indices
            .iter()
            .map(|&i| SeriesSample {
                values:   corpus.series(i),
                channels: corpus.channels(),
                length:   corpus.length(),
                label:    labels[i],
            })
            .collect();
        Self { samples }
    }

    /// Number of samples per class, indexed by label
    pub fn class_counts(&self, num_classes: usize) -> Vec<usize> {
        let mut counts = vec![0; num_classes];
        for s in &self.samples {
            if let Some(c) = counts.get_mut(s.label) {
                *c += 1;
            }
        }
        counts
    }
}

impl Dataset<SeriesSample> for SeriesDataset {
    fn get(&self, index: usize) -> Option<SeriesSample> {
        self.samples.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.samples.len()
    }
}
