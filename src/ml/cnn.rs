// ============================================================
// Layer 5 — CNN1D
// ============================================================
// Plain convolutional classifier:
//
//   conv(k7, s2) → BN → ReLU → maxpool(2)      base
//   conv(k5)     → BN → ReLU → maxpool(2)      base × 2
//   conv(k3)     → BN → ReLU                   base × 4
//   adaptive avg pool → linear → logits
//
// Convolutions carry no bias; batch norm supplies the shift.

use burn::{
    nn::{
        conv::{Conv1d, Conv1dConfig},
        pool::{AdaptiveAvgPool1d, AdaptiveAvgPool1dConfig, MaxPool1d, MaxPool1dConfig},
        BatchNorm, BatchNormConfig,
        Linear, LinearConfig,
        PaddingConfig1d,
    },
    prelude::*,
    tensor::activation::relu,
};

#[derive(Config, Debug)]
pub struct Cnn1dConfig {
    pub in_channels: usize,
    pub num_classes: usize,
    #[config(default = 32)]
    pub base_channels: usize,
}

impl Cnn1dConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> Cnn1d<B> {
        let b = self.base_channels;
        let stages = vec![
            ConvStage::new(self.in_channels, b, 7, 2, 3, device),
            ConvStage::new(b, b * 2, 5, 1, 2, device),
            ConvStage::new(b * 2, b * 4, 3, 1, 1, device),
        ];
        Cnn1d {
            stages,
            pool: MaxPool1dConfig::new(2).with_stride(2).init(),
            global_pool: AdaptiveAvgPool1dConfig::new(1).init(),
            fc: LinearConfig::new(b * 4, self.num_classes).init(device),
        }
    }
}

/// conv → batch norm → ReLU
#[derive(Module, Debug)]
pub struct ConvStage<B: Backend> {
    pub conv: Conv1d<B>,
    pub bn:   BatchNorm<B, 1>,
}

impl<B: Backend> ConvStage<B> {
    pub fn new(
        in_channels:  usize,
        out_channels: usize,
        kernel:       usize,
        stride:       usize,
        padding:      usize,
        device:       &B::Device,
    ) -> Self {
        let conv = Conv1dConfig::new(in_channels, out_channels, kernel)
            .with_stride(stride)
            .with_padding(PaddingConfig1d::Explicit(padding))
            .with_bias(false)
            .init(device);
        let bn = BatchNormConfig::new(out_channels).init(device);
        Self { conv, bn }
    }

    pub fn forward(&self, x: Tensor<B, 3>) -> Tensor<B, 3> {
        relu(self.bn.forward(self.conv.forward(x)))
    }
}

#[derive(Module, Debug)]
pub struct Cnn1d<B: Backend> {
    pub stages:      Vec<ConvStage<B>>,
    pub pool:        MaxPool1d,
    pub global_pool: AdaptiveAvgPool1d,
    pub fc:          Linear<B>,
}

impl<B: Backend> Cnn1d<B> {
    /// x: [batch, in_channels, length] → logits: [batch, num_classes]
    pub fn forward(&self, x: Tensor<B, 3>) -> Tensor<B, 2> {
        let last = self.stages.len() - 1;
        let mut x = x;
        for (i, stage) in self.stages.iter().enumerate() {
            x = stage.forward(x);
            // No pooling after the last stage; global pooling follows
            if i < last {
                x = self.pool.forward(x);
            }
        }
        let x = self.global_pool.forward(x); // [batch, channels, 1]
        let x = x.flatten::<2>(1, 2);        // [batch, channels]
        self.fc.forward(x)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray<f32>;

    #[test]
    fn test_forward_shape_matches_classes() {
        let device = Default::default();
        let model: Cnn1d<TestBackend> = Cnn1dConfig::new(3, 5).init(&device);

        let input  = Tensor::<TestBackend, 3>::random([8, 3, 256], burn::tensor::Distribution::Default, &device);
        let output = model.forward(input);

        assert_eq!(output.dims(), [8, 5]);
    }

    #[test]
    fn test_forward_with_custom_width_and_single_sample() {
        let device = Default::default();
        let model: Cnn1d<TestBackend> = Cnn1dConfig::new(1, 2)
            .with_base_channels(8)
            .init(&device);

        let output = model.forward(Tensor::<TestBackend, 3>::ones([1, 1, 64], &device));

        assert_eq!(output.dims(), [1, 2]);
        assert_eq!(model.fc.weight.dims(), [32, 2]);
    }

    #[test]
    fn test_channel_width_doubles_per_stage() {
        let device = Default::default();
        let model: Cnn1d<TestBackend> = Cnn1dConfig::new(4, 3).with_base_channels(16).init(&device);

        let widths: Vec<usize> = model.stages.iter()
            .map(|s| s.conv.weight.dims()[0])
            .collect();
        assert_eq!(widths, vec![16, 32, 64]);
    }
}
