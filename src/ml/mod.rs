// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// All network and training-loop code lives here.
//
//   cnn.rs        — plain three-stage 1D CNN backbone
//   resnet.rs     — BasicBlock1D and the three-stage ResNet1D
//   classifier.rs — TimeSeriesClassifier: backbone selection,
//                   train/val/test steps, Adam configuration
//   trainer.rs    — epoch loop, backend dispatch, test pass
//   error.rs      — model configuration errors
//
// Reference: Burn Book §3 (Building Blocks)
//            Burn Book §5 (Training)
//            He et al. (2016) Deep Residual Learning

/// Plain convolutional backbone
pub mod cnn;

/// Residual backbone
pub mod resnet;

/// Classification wrapper around either backbone
pub mod classifier;

/// Training loop with validation and checkpointing
pub mod trainer;

pub mod error;
