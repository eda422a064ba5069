// ============================================================
// Layer 4 — Series Batcher
// ============================================================
// Implements Burn's Batcher trait to convert a Vec<SeriesSample>
// into device tensors.
//
// How batching works here:
//   Input:  Vec of N SeriesSamples, each C channels × T steps
//   Output: SeriesBatch with inputs [N, C, T] and targets [N]
//
//   Every sample is already channel-major, so concatenating
//   the value vectors and reshaping to [N, C, T] lays the
//   batch out exactly as Conv1d expects it.
//
// Reference: Burn Book §4 (Batcher)

use burn::{
    data::dataloader::batcher::Batcher,
    prelude::*,
};

use crate::data::dataset::SeriesSample;

// ─── SeriesBatch ──────────────────────────────────────────────────────────────
/// A batch of labelled series ready for the model forward pass.
#[derive(Debug, Clone)]
pub struct SeriesBatch<B: Backend> {
    /// Signal windows — shape: [batch_size, channels, length]
    pub inputs: Tensor<B, 3>,

    /// Class indices — shape: [batch_size]
    pub targets: Tensor<B, 1, Int>,
}

// ─── SeriesBatcher ────────────────────────────────────────────────────────────
/// Holds the target device so tensors are created on the right GPU/CPU.
#[derive(Clone, Debug)]
pub struct SeriesBatcher<B: Backend> {
    pub device: B::Device,
}

impl<B: Backend> SeriesBatcher<B> {
    pub fn new(device: B::Device) -> Self {
        Self { device }
    }
}

impl<B: Backend> Batcher<SeriesSample, SeriesBatch<B>> for SeriesBatcher<B> {
    fn batch(&self, items: Vec<SeriesSample>) -> SeriesBatch<B> {
        let batch_size = items.len();
        // All windows share one shape (they come from a single X array)
        let channels = items[0].channels;
        let length   = items[0].length;

        let values: Vec<f32> = items
            .iter()
            .flat_map(|s| s.values.iter().copied())
            .collect();

        let labels: Vec<i32> = items
            .iter()
            .map(|s| s.label as i32)
            .collect();

        let inputs = Tensor::<B, 1>::from_floats(values.as_slice(), &self.device)
            .reshape([batch_size, channels, length]);

        let targets = Tensor::<B, 1, Int>::from_ints(labels.as_slice(), &self.device);

        SeriesBatch { inputs, targets }
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray<f32>;

    #[test]
    fn test_batch_shapes_and_layout() {
        let device  = Default::default();
        let batcher = SeriesBatcher::<TestBackend>::new(device);
        let items = vec![
            SeriesSample { values: vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0], channels: 2, length: 3, label: 1 },
            SeriesSample { values: vec![6.0, 7.0, 8.0, 9.0, 10.0, 11.0], channels: 2, length: 3, label: 0 },
        ];

        let batch = batcher.batch(items);
        assert_eq!(batch.inputs.dims(), [2, 2, 3]);
        assert_eq!(batch.targets.dims(), [2]);

        // Second sample, second channel, last step
        let v: f32 = batch.inputs
            .slice([1..2, 1..2, 2..3])
            .into_scalar()
            .elem::<f32>();
        assert_eq!(v, 11.0);

        let labels: Vec<i64> = batch.targets.into_data().convert::<i64>().to_vec().unwrap();
        assert_eq!(labels, vec![1, 0]);
    }
}
