// ============================================================
// Layer 5 — ResNet1D
// ============================================================
// Residual network for 1D signals (He et al. 2016, adapted to
// Conv1d):
//
//   stem:   conv(k7, s2) → BN → ReLU → maxpool(k3, s2, p1)
//   stage1: blocks[0] × BasicBlock1D(base   → base,   s1)
//   stage2: blocks[1] × BasicBlock1D(base   → base×2, s2)
//   stage3: blocks[2] × BasicBlock1D(base×2 → base×4, s2)
//   adaptive avg pool → linear → logits
//
// Only the first block of a stage changes stride or width;
// the rest keep the shape so their shortcut is the identity.
//
// Reference: He et al. (2016) Deep Residual Learning

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

use crate::ml::cnn::ConvStage;

// ─── BasicBlock1D ─────────────────────────────────────────────────────────────
#[derive(Config, Debug)]
pub struct BasicBlock1dConfig {
    pub in_channels:  usize,
    pub out_channels: usize,
    #[config(default = 1)]
    pub stride: usize,
}

impl BasicBlock1dConfig {
    /// True when the input cannot be added to the output as-is
    pub fn needs_projection(&self) -> bool {
        self.stride != 1 || self.in_channels != self.out_channels
    }

    pub fn init<B: Backend>(&self, device: &B::Device) -> BasicBlock1d<B> {
        let conv1 = conv3(self.in_channels, self.out_channels, self.stride, device);
        let conv2 = conv3(self.out_channels, self.out_channels, 1, device);

        // Decided once here; forward never re-checks shapes
        let downsample = self.needs_projection().then(|| Projection {
            conv: Conv1dConfig::new(self.in_channels, self.out_channels, 1)
                .with_stride(self.stride)
                .with_bias(false)
                .init(device),
            bn: BatchNormConfig::new(self.out_channels).init(device),
        });

        BasicBlock1d {
            conv1,
            bn1: BatchNormConfig::new(self.out_channels).init(device),
            conv2,
            bn2: BatchNormConfig::new(self.out_channels).init(device),
            downsample,
        }
    }
}

fn conv3<B: Backend>(in_ch: usize, out_ch: usize, stride: usize, device: &B::Device) -> Conv1d<B> {
    Conv1dConfig::new(in_ch, out_ch, 3)
        .with_stride(stride)
        .with_padding(PaddingConfig1d::Explicit(1))
        .with_bias(false)
        .init(device)
}

/// 1×1 conv + BN used on the shortcut when shape or stride changes
#[derive(Module, Debug)]
pub struct Projection<B: Backend> {
    pub conv: Conv1d<B>,
    pub bn:   BatchNorm<B, 1>,
}

impl<B: Backend> Projection<B> {
    pub fn forward(&self, x: Tensor<B, 3>) -> Tensor<B, 3> {
        self.bn.forward(self.conv.forward(x))
    }
}

#[derive(Module, Debug)]
pub struct BasicBlock1d<B: Backend> {
    pub conv1: Conv1d<B>,
    pub bn1:   BatchNorm<B, 1>,
    pub conv2: Conv1d<B>,
    pub bn2:   BatchNorm<B, 1>,
    /// None = identity shortcut
    pub downsample: Option<Projection<B>>,
}

impl<B: Backend> BasicBlock1d<B> {
    /// x: [batch, in_channels, L] → [batch, out_channels, ceil(L / stride)]
    pub fn forward(&self, x: Tensor<B, 3>) -> Tensor<B, 3> {
        let identity = match &self.downsample {
            Some(proj) => proj.forward(x.clone()),
            None       => x.clone(),
        };
        let out = relu(self.bn1.forward(self.conv1.forward(x)));
        let out = self.bn2.forward(self.conv2.forward(out));
        relu(out + identity)
    }
}

// ─── ResNet1D ─────────────────────────────────────────────────────────────────
#[derive(Config, Debug)]
pub struct ResNet1dConfig {
    pub in_channels: usize,
    pub num_classes: usize,
    /// Residual blocks per stage
    #[config(default = "[2, 2, 2]")]
    pub layers: [usize; 3],
    #[config(default = 32)]
    pub base_channels: usize,
}

impl ResNet1dConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> ResNet1d<B> {
        let b = self.base_channels;
        let stem = ConvStage::new(self.in_channels, b, 7, 2, 3, device);
        let stem_pool = MaxPool1dConfig::new(3)
            .with_stride(2)
            .with_padding(PaddingConfig1d::Explicit(1))
            .init();

        let stages = vec![
            make_stage(b, b, self.layers[0], 1, device),
            make_stage(b, b * 2, self.layers[1], 2, device),
            make_stage(b * 2, b * 4, self.layers[2], 2, device),
        ];

        ResNet1d {
            stem,
            stem_pool,
            stages,
            global_pool: AdaptiveAvgPool1dConfig::new(1).init(),
            fc: LinearConfig::new(b * 4, self.num_classes).init(device),
        }
    }
}

/// First block carries the stride / widening, the rest keep shape.
/// A stage always has at least one block.
fn make_stage<B: Backend>(
    in_ch:  usize,
    out_ch: usize,
    blocks: usize,
    stride: usize,
    device: &B::Device,
) -> Vec<BasicBlock1d<B>> {
    let mut stage = vec![BasicBlock1dConfig::new(in_ch, out_ch).with_stride(stride).init(device)];
    for _ in 1..blocks {
        stage.push(BasicBlock1dConfig::new(out_ch, out_ch).init(device));
    }
    stage
}

#[derive(Module, Debug)]
pub struct ResNet1d<B: Backend> {
    pub stem:        ConvStage<B>,
    pub stem_pool:   MaxPool1d,
    pub stages:      Vec<Vec<BasicBlock1d<B>>>,
    pub global_pool: AdaptiveAvgPool1d,
    pub fc:          Linear<B>,
}

impl<B: Backend> ResNet1d<B> {
    /// x: [batch, in_channels, length] → logits: [batch, num_classes]
    pub fn forward(&self, x: Tensor<B, 3>) -> Tensor<B, 2> {
        let mut x = self.stem_pool.forward(self.stem.forward(x));
        for block in self.stages.iter().flatten() {
            x = block.forward(x);
        }
        let x = self.global_pool.forward(x).flatten::<2>(1, 2);
        self.fc.forward(x)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray<f32>;

    fn input(shape: [usize; 3]) -> Tensor<TestBackend, 3> {
        Tensor::random(shape, burn::tensor::Distribution::Default, &Default::default())
    }

    #[test]
    fn test_identity_block_keeps_shape() {
        let device = Default::default();
        let block: BasicBlock1d<TestBackend> = BasicBlock1dConfig::new(16, 16).init(&device);

        assert!(block.downsample.is_none());
        assert_eq!(block.forward(input([2, 16, 50])).dims(), [2, 16, 50]);
    }

    #[test]
    fn test_strided_block_halves_length_rounding_up() {
        let device = Default::default();
        let block: BasicBlock1d<TestBackend> = BasicBlock1dConfig::new(8, 8)
            .with_stride(2)
            .init(&device);

        assert!(block.downsample.is_some());
        // ceil(51 / 2) = 26
        assert_eq!(block.forward(input([3, 8, 51])).dims(), [3, 8, 26]);
        assert_eq!(block.forward(input([3, 8, 50])).dims(), [3, 8, 25]);
    }

    #[test]
    fn test_widening_block_projects_shortcut() {
        let device = Default::default();
        let config = BasicBlock1dConfig::new(8, 24);
        assert!(config.needs_projection());

        let block: BasicBlock1d<TestBackend> = config.init(&device);
        assert_eq!(block.forward(input([1, 8, 10])).dims(), [1, 24, 10]);
    }

    #[test]
    fn test_forward_shape_matches_classes() {
        let device = Default::default();
        let model: ResNet1d<TestBackend> = ResNet1dConfig::new(3, 5).init(&device);
        assert_eq!(model.forward(input([8, 3, 256])).dims(), [8, 5]);
    }

    #[test]
    fn test_depth_does_not_change_output_shape() {
        let device = Default::default();
        let shallow: ResNet1d<TestBackend> = ResNet1dConfig::new(2, 4)
            .with_layers([1, 1, 1])
            .with_base_channels(8)
            .init(&device);
        let deep: ResNet1d<TestBackend> = ResNet1dConfig::new(2, 4)
            .with_layers([3, 3, 3])
            .with_base_channels(8)
            .init(&device);

        let depths = |net: &ResNet1d<TestBackend>| -> Vec<usize> {
            net.stages.iter().map(Vec::len).collect()
        };
        assert_eq!(depths(&shallow), vec![1, 1, 1]);
        assert_eq!(depths(&deep),    vec![3, 3, 3]);

        let x = input([4, 2, 128]);
        assert_eq!(shallow.forward(x.clone()).dims(), deep.forward(x).dims());
    }

    #[test]
    fn test_only_first_block_of_later_stages_projects() {
        let device = Default::default();
        let model: ResNet1d<TestBackend> = ResNet1dConfig::new(1, 2)
            .with_base_channels(4)
            .init(&device);

        let projected: Vec<Vec<bool>> = model.stages.iter()
            .map(|stage| stage.iter().map(|b| b.downsample.is_some()).collect())
            .collect();
        assert_eq!(projected, vec![
            vec![false, false],
            vec![true,  false],
            vec![true,  false],
        ]);
    }
}
