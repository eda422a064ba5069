// ============================================================
// Layer 5 — TimeSeriesClassifier
// ============================================================
// One training contract over either backbone:
//
//   forward            → logits [batch, num_classes]
//   training_step      → loss for backward(), logs train_*
//   validation_step    → loss for reporting,  logs val_*
//   test_step          → loss for reporting,  logs test_*
//   configure_optimizers → Adam at the configured rate
//
// The hyperparameters the classifier was built from travel
// with it (`hparams()`) and are written next to the weights,
// so a checkpoint can always be rebuilt into the same model.

use burn::{
    module::Ignored,
    nn::loss::CrossEntropyLossConfig,
    optim::{AdamConfig, Optimizer},
    prelude::*,
    tensor::backend::AutodiffBackend,
};
use std::{fmt, str::FromStr};

use crate::data::batcher::SeriesBatch;
use crate::infra::metrics::MetricRecorder;
use crate::ml::{
    cnn::{Cnn1d, Cnn1dConfig},
    error::ModelError,
    resnet::{ResNet1d, ResNet1dConfig},
};

// ─── Arch ─────────────────────────────────────────────────────────────────────
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arch {
    Cnn,
    ResNet,
}

impl FromStr for Arch {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cnn"    => Ok(Arch::Cnn),
            "resnet" => Ok(Arch::ResNet),
            other    => Err(ModelError::UnknownArch(other.to_string())),
        }
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arch::Cnn    => f.write_str("cnn"),
            Arch::ResNet => f.write_str("resnet"),
        }
    }
}

// ─── Hyperparameters ──────────────────────────────────────────────────────────
// NOTE: #[derive(Config)] already generates Clone and Serialize/Deserialize.
#[derive(Config, Debug)]
pub struct ClassifierConfig {
    pub in_channels: usize,
    pub num_classes: usize,
    #[config(default = "String::from(\"cnn\")")]
    pub arch: String,
    #[config(default = 1e-3)]
    pub learning_rate: f64,
    #[config(default = 32)]
    pub base_channels: usize,
    /// Residual blocks per stage (ResNet only)
    #[config(default = "[2, 2, 2]")]
    pub layers: [usize; 3],
}

impl ClassifierConfig {
    /// Build the classifier. Fails on an unknown `arch` before
    /// any parameter is allocated.
    pub fn init<B: Backend>(&self, device: &B::Device) -> Result<TimeSeriesClassifier<B>, ModelError> {
        let backbone = match self.arch.parse::<Arch>()? {
            Arch::Cnn => Backbone::Cnn(
                Cnn1dConfig::new(self.in_channels, self.num_classes)
                    .with_base_channels(self.base_channels)
                    .init(device),
            ),
            Arch::ResNet => Backbone::ResNet(
                ResNet1dConfig::new(self.in_channels, self.num_classes)
                    .with_layers(self.layers)
                    .with_base_channels(self.base_channels)
                    .init(device),
            ),
        };
        Ok(TimeSeriesClassifier { backbone, hparams: Ignored(self.clone()) })
    }
}

// ─── Model ────────────────────────────────────────────────────────────────────
#[derive(Module, Debug)]
pub enum Backbone<B: Backend> {
    Cnn(Cnn1d<B>),
    ResNet(ResNet1d<B>),
}

impl<B: Backend> Backbone<B> {
    pub fn forward(&self, x: Tensor<B, 3>) -> Tensor<B, 2> {
        match self {
            Backbone::Cnn(net)    => net.forward(x),
            Backbone::ResNet(net) => net.forward(x),
        }
    }
}

#[derive(Module, Debug)]
pub struct TimeSeriesClassifier<B: Backend> {
    pub backbone: Backbone<B>,
    hparams:      Ignored<ClassifierConfig>,
}

/// Which loop a step runs in; decides the metric name prefix
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Train,
    Val,
    Test,
}

impl Phase {
    pub fn prefix(self) -> &'static str {
        match self {
            Phase::Train => "train",
            Phase::Val   => "val",
            Phase::Test  => "test",
        }
    }
}

/// Loss tensor plus the scalar metrics derived from one batch
pub struct StepOutput<B: Backend> {
    pub loss:       Tensor<B, 1>,
    pub accuracy:   f64,
    pub batch_size: usize,
}

/// Cross-entropy loss and arg-max accuracy of `logits` against `targets`.
pub fn classification_step<B: Backend>(
    logits:  Tensor<B, 2>,
    targets: Tensor<B, 1, Int>,
) -> StepOutput<B> {
    let batch_size = targets.dims()[0];
    let ce = CrossEntropyLossConfig::new().init(&logits.device());
    let loss = ce.forward(logits.clone(), targets.clone());

    // argmax(1) returns shape [batch, 1] — flatten to [batch]
    let correct: i64 = logits
        .argmax(1)
        .flatten::<1>(0, 1)
        .equal(targets)
        .int()
        .sum()
        .into_scalar()
        .elem::<i64>();
    let accuracy = correct as f64 / batch_size.max(1) as f64;

    StepOutput { loss, accuracy, batch_size }
}

impl<B: Backend> TimeSeriesClassifier<B> {
    /// inputs: [batch, in_channels, length] → logits: [batch, num_classes]
    pub fn forward(&self, inputs: Tensor<B, 3>) -> Tensor<B, 2> {
        self.backbone.forward(inputs)
    }

    pub fn hparams(&self) -> &ClassifierConfig {
        &self.hparams.0
    }

    pub fn training_step(&self, batch: SeriesBatch<B>, log: &mut MetricRecorder) -> Tensor<B, 1> {
        self.shared_step(batch, Phase::Train, log)
    }

    pub fn validation_step(&self, batch: SeriesBatch<B>, log: &mut MetricRecorder) -> Tensor<B, 1> {
        self.shared_step(batch, Phase::Val, log)
    }

    pub fn test_step(&self, batch: SeriesBatch<B>, log: &mut MetricRecorder) -> Tensor<B, 1> {
        self.shared_step(batch, Phase::Test, log)
    }

    fn shared_step(&self, batch: SeriesBatch<B>, phase: Phase, log: &mut MetricRecorder) -> Tensor<B, 1> {
        let logits = self.forward(batch.inputs);
        let out    = classification_step(logits, batch.targets);

        let loss_val: f64 = out.loss.clone().into_scalar().elem::<f64>();
        log.log(&format!("{}_loss", phase.prefix()), loss_val, out.batch_size);
        log.log(&format!("{}_acc", phase.prefix()), out.accuracy, out.batch_size);

        out.loss
    }
}

impl<B: AutodiffBackend> TimeSeriesClassifier<B> {
    /// Adam over every parameter, paired with the step size to
    /// pass to `Optimizer::step`.
    //  m = β1*m + (1-β1)*g ; v = β2*v + (1-β2)*g² ; θ -= lr * m / (√v + ε)
    pub fn configure_optimizers(&self) -> (impl Optimizer<Self, B>, f64) {
        let optim = AdamConfig::new().with_epsilon(1e-8).init::<B, Self>();
        (optim, self.hparams().learning_rate)
    }
}
