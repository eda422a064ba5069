// ============================================================
// Layer 5 — Training Loop
// ============================================================
// fit + test using Burn's DataLoader and the classifier's
// step functions.
//
// Backend notes:
//   - Training runs on an Autodiff backend B for gradients
//   - model.valid() returns the model on B::InnerBackend with
//     batch norm switched to its running statistics
//   - Validation / test batchers therefore use B::InnerBackend
//
// Reference: Burn Book §5, Kingma & Ba (2015) Adam

use anyhow::Result;
use burn::{
    backend::{ndarray::NdArrayDevice, wgpu::WgpuDevice, Autodiff, NdArray, Wgpu},
    data::{dataloader::DataLoaderBuilder, dataset::Dataset},
    module::AutodiffModule,
    optim::{GradientsParams, Optimizer},
    prelude::*,
    tensor::backend::AutodiffBackend,
};
use std::panic::{self, catch_unwind, AssertUnwindSafe};

use crate::application::train_use_case::TrainConfig;
use crate::data::{batcher::SeriesBatcher, dataset::SeriesDataset};
use crate::domain::task::Accelerator;
use crate::infra::{
    checkpoint::CheckpointManager,
    metrics::{EpochMetrics, MetricRecorder, MetricsLogger},
};
use crate::ml::classifier::{ClassifierConfig, TimeSeriesClassifier};

type CpuBackend = NdArray<f32>;
type GpuBackend = Wgpu;

/// Train / validation / test datasets for one run
pub struct RunDatasets {
    pub train: SeriesDataset,
    pub val:   SeriesDataset,
    pub test:  SeriesDataset,
}

/// Mean loss / accuracy over an evaluation pass
#[derive(Debug, Clone, Copy)]
pub struct EvalSummary {
    pub loss:     f64,
    pub accuracy: f64,
    pub samples:  usize,
}

/// Turn the requested accelerator into the one that will run.
///
/// `auto` falls back to the CPU when `gpu_available` says no
/// wgpu adapter answers; an explicit `gpu` request fails instead.
/// The result is never `Auto`.
pub fn resolve_accelerator(
    requested:     Accelerator,
    gpu_available: impl FnOnce() -> bool,
) -> Result<Accelerator> {
    if requested == Accelerator::Cpu {
        return Ok(Accelerator::Cpu);
    }
    if gpu_available() {
        return Ok(Accelerator::Gpu);
    }
    if requested == Accelerator::Gpu {
        anyhow::bail!("No wgpu adapter available. Rerun with --accelerator cpu");
    }
    tracing::warn!("No wgpu adapter available, falling back to CPU");
    Ok(Accelerator::Cpu)
}

/// Run one tiny kernel on the default wgpu device.
/// cubecl panics when no adapter exists; the panic is caught
/// and its message silenced.
pub fn wgpu_available() -> bool {
    let hook = panic::take_hook();
    panic::set_hook(Box::new(|_| {}));
    let ok = catch_unwind(AssertUnwindSafe(|| {
        let device = WgpuDevice::default();
        Tensor::<GpuBackend, 1>::ones([1], &device).sum().into_scalar()
    }))
    .is_ok();
    panic::set_hook(hook);
    ok
}

/// Pick the backend from the accelerator setting and train.
pub fn run_training(
    cfg:          &TrainConfig,
    hparams:      &ClassifierConfig,
    datasets:     RunDatasets,
    ckpt_manager: &CheckpointManager,
) -> Result<()> {
    match resolve_accelerator(cfg.accelerator, wgpu_available)? {
        Accelerator::Gpu => {
            let device = WgpuDevice::default();
            tracing::info!("Using WGPU device: {:?}", device);
            train_loop::<Autodiff<GpuBackend>>(cfg, hparams, datasets, ckpt_manager, device)
        }
        Accelerator::Cpu | Accelerator::Auto => {
            let device = NdArrayDevice::default();
            tracing::info!("Using CPU device: {:?}", device);
            train_loop::<Autodiff<CpuBackend>>(cfg, hparams, datasets, ckpt_manager, device)
        }
    }
}

/// Pick the backend, rebuild the model from the checkpoint and test it.
pub fn run_evaluation(
    accelerator:  Accelerator,
    batch_size:   usize,
    num_workers:  usize,
    dataset:      SeriesDataset,
    ckpt_manager: &CheckpointManager,
) -> Result<EvalSummary> {
    match resolve_accelerator(accelerator, wgpu_available)? {
        Accelerator::Gpu => evaluate_checkpoint::<GpuBackend>(
            batch_size, num_workers, dataset, ckpt_manager, WgpuDevice::default(),
        ),
        Accelerator::Cpu | Accelerator::Auto => evaluate_checkpoint::<CpuBackend>(
            batch_size, num_workers, dataset, ckpt_manager, NdArrayDevice::default(),
        ),
    }
}

fn evaluate_checkpoint<B: Backend>(
    batch_size:   usize,
    num_workers:  usize,
    dataset:      SeriesDataset,
    ckpt_manager: &CheckpointManager,
    device:       B::Device,
) -> Result<EvalSummary> {
    let hparams = ckpt_manager.load_hparams()?;
    let model   = hparams.init::<B>(&device)?;
    let model   = ckpt_manager.load_model(model, &device)?;
    test(&model, dataset, batch_size, num_workers, &device)
}

fn train_loop<B: AutodiffBackend>(
    cfg:          &TrainConfig,
    hparams:      &ClassifierConfig,
    datasets:     RunDatasets,
    ckpt_manager: &CheckpointManager,
    device:       B::Device,
) -> Result<()> {
    B::seed(cfg.seed);

    // ── Build model ───────────────────────────────────────────────────────────
    let model: TimeSeriesClassifier<B> = hparams.init(&device)?;
    tracing::info!(
        "Model ready: arch={}, base_channels={}, {} parameters",
        hparams.arch, hparams.base_channels, model.num_params(),
    );

    let metrics_log = MetricsLogger::new(ckpt_manager.dir())?;
    let model = fit(model, cfg, datasets.train, datasets.val, ckpt_manager, &metrics_log, &device)?;

    if cfg.test {
        let summary = test(&model.valid(), datasets.test, cfg.batch_size, cfg.num_workers, &device)?;
        println!(
            "Test | test_loss={:.4} | test_acc={:.1}% | samples={}",
            summary.loss, summary.accuracy * 100.0, summary.samples,
        );
    }

    tracing::info!("Training complete!");
    Ok(())
}

/// Run the epoch loop and return the trained model.
pub fn fit<B: AutodiffBackend>(
    mut model:     TimeSeriesClassifier<B>,
    cfg:           &TrainConfig,
    train_dataset: SeriesDataset,
    val_dataset:   SeriesDataset,
    ckpt_manager:  &CheckpointManager,
    metrics_log:   &MetricsLogger,
    device:        &B::Device,
) -> Result<TimeSeriesClassifier<B>> {
    let (mut optim, lr) = model.configure_optimizers();

    // ── Training data loader (AutodiffBackend) ────────────────────────────────
    let mut train_builder = DataLoaderBuilder::new(SeriesBatcher::<B>::new(device.clone()))
        .batch_size(cfg.batch_size)
        .shuffle(cfg.seed);
    if cfg.num_workers > 0 {
        train_builder = train_builder.num_workers(cfg.num_workers);
    }
    let train_loader = train_builder.build(train_dataset);

    // ── Validation data loader (InnerBackend — no autodiff overhead) ──────────
    let mut val_builder = DataLoaderBuilder::new(SeriesBatcher::<B::InnerBackend>::new(device.clone()))
        .batch_size(cfg.batch_size);
    if cfg.num_workers > 0 {
        val_builder = val_builder.num_workers(cfg.num_workers);
    }
    let val_loader = val_builder.build(val_dataset);

    let mut log = MetricRecorder::new();
    let mut best_val_loss = f64::INFINITY;

    for epoch in 1..=cfg.epochs {
        log.reset();

        // ── Training phase ────────────────────────────────────────────────────
        for batch in train_loader.iter() {
            let loss  = model.training_step(batch, &mut log);
            let grads = GradientsParams::from_grads(loss.backward(), &model);
            model = optim.step(lr, model, grads);
        }

        // ── Validation phase ──────────────────────────────────────────────────
        let model_valid = model.valid();
        for batch in val_loader.iter() {
            model_valid.validation_step(batch, &mut log);
        }

        let summary = EpochMetrics::from_recorder(epoch, &log);
        println!(
            "Epoch {:>3}/{} | train_loss={:.4} | train_acc={:.1}% | val_loss={:.4} | val_acc={:.1}%",
            epoch, cfg.epochs, summary.train_loss, summary.train_acc * 100.0,
            summary.val_loss, summary.val_acc * 100.0,
        );
        if summary.is_improvement(best_val_loss) {
            best_val_loss = summary.val_loss;
            tracing::info!("New best val_loss={:.4} at epoch {}", best_val_loss, epoch);
        }

        metrics_log.log(&summary)?;
        ckpt_manager.save_model(&model, epoch)?;
        tracing::info!("Checkpoint saved for epoch {}", epoch);
    }

    Ok(model)
}

/// Run `test_step` over `dataset` and return sample-weighted means.
pub fn test<B: Backend>(
    model:       &TimeSeriesClassifier<B>,
    dataset:     SeriesDataset,
    batch_size:  usize,
    num_workers: usize,
    device:      &B::Device,
) -> Result<EvalSummary> {
    let samples = dataset.len();
    if samples == 0 {
        anyhow::bail!("test split is empty");
    }

    let mut builder = DataLoaderBuilder::new(SeriesBatcher::<B>::new(device.clone()))
        .batch_size(batch_size);
    if num_workers > 0 {
        builder = builder.num_workers(num_workers);
    }
    let loader = builder.build(dataset);

    let mut log = MetricRecorder::new();
    for batch in loader.iter() {
        model.test_step(batch, &mut log);
    }

    Ok(EvalSummary {
        loss:     log.mean("test_loss").unwrap_or(f64::NAN),
        accuracy: log.mean("test_acc").unwrap_or(0.0),
        samples,
    })
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::dataset::SeriesSample;

    type TestBackend = Autodiff<CpuBackend>;

    fn dataset(n: usize) -> SeriesDataset {
        // Class 1 windows are shifted up so the task is learnable
        let samples = (0..n)
            .map(|i| {
                let label = i % 2;
                let values = (0..2 * 32)
                    .map(|t| (t as f32 * 0.3).sin() + label as f32 * 2.0)
                    .collect();
                SeriesSample { values, channels: 2, length: 32, label }
            })
            .collect();
        SeriesDataset::new(samples)
    }

    fn config(epochs: usize) -> TrainConfig {
        TrainConfig {
            epochs,
            batch_size: 4,
            ..TrainConfig::default()
        }
    }

    #[test]
    fn test_fit_writes_checkpoint_and_metrics_per_epoch() {
        let device  = NdArrayDevice::default();
        let dir     = tempfile::tempdir().unwrap();
        let ckpt    = CheckpointManager::new(dir.path()).unwrap();
        let metrics = MetricsLogger::new(dir.path()).unwrap();
        let model   = ClassifierConfig::new(2, 2)
            .with_base_channels(4)
            .init::<TestBackend>(&device)
            .unwrap();

        fit(model, &config(2), dataset(8), dataset(4), &ckpt, &metrics, &device).unwrap();

        assert_eq!(ckpt.latest_epoch().unwrap(), 2);
        let csv = std::fs::read_to_string(metrics.csv_path()).unwrap();
        assert_eq!(csv.lines().count(), 3);
    }

    #[test]
    fn test_evaluation_reports_bounded_accuracy() {
        let device = NdArrayDevice::default();
        let model  = ClassifierConfig::new(2, 2)
            .with_arch("resnet".to_string())
            .with_layers([1, 1, 1])
            .with_base_channels(4)
            .init::<CpuBackend>(&device)
            .unwrap();

        let summary = test(&model, dataset(6), 4, 0, &device).unwrap();
        assert_eq!(summary.samples, 6);
        assert!((0.0..=1.0).contains(&summary.accuracy));
        assert!(summary.loss.is_finite());
    }

    #[test]
    fn test_auto_falls_back_to_cpu_without_adapter() {
        let resolved = resolve_accelerator(Accelerator::Auto, || false).unwrap();
        assert_eq!(resolved, Accelerator::Cpu);

        let resolved = resolve_accelerator(Accelerator::Auto, || true).unwrap();
        assert_eq!(resolved, Accelerator::Gpu);
    }

    #[test]
    fn test_explicit_gpu_without_adapter_is_an_error() {
        assert!(resolve_accelerator(Accelerator::Gpu, || false).is_err());
        assert_eq!(resolve_accelerator(Accelerator::Gpu, || true).unwrap(), Accelerator::Gpu);
    }

    #[test]
    fn test_cpu_request_never_touches_wgpu() {
        let resolved = resolve_accelerator(Accelerator::Cpu, || unreachable!()).unwrap();
        assert_eq!(resolved, Accelerator::Cpu);
    }

    #[test]
    fn test_wgpu_availability_check_returns_instead_of_panicking() {
        // Either answer is fine; the host decides
        let _ = wgpu_available();
    }

    #[test]
    fn test_reloaded_checkpoint_scores_like_the_trained_model() {
        let device  = NdArrayDevice::default();
        let dir     = tempfile::tempdir().unwrap();
        let ckpt    = CheckpointManager::new(dir.path()).unwrap();
        let metrics = MetricsLogger::new(dir.path()).unwrap();
        let hparams = ClassifierConfig::new(2, 2)
            .with_arch("resnet".to_string())
            .with_layers([1, 1, 1])
            .with_base_channels(4);
        ckpt.save_hparams(&hparams).unwrap();

        // Weights are saved from the autodiff backend and loaded into the plain one
        let model = hparams.init::<TestBackend>(&device).unwrap();
        let model = fit(model, &config(1), dataset(8), dataset(4), &ckpt, &metrics, &device).unwrap();

        let direct   = test(&model.valid(), dataset(6), 4, 0, &device).unwrap();
        let reloaded = run_evaluation(Accelerator::Cpu, 4, 0, dataset(6), &ckpt).unwrap();

        assert_eq!(reloaded.samples, direct.samples);
        // Checkpoints hold half-precision weights
        assert!((reloaded.loss - direct.loss).abs() < 1e-2);
        assert!((reloaded.accuracy - direct.accuracy).abs() <= 1.0 / 6.0 + 1e-9);
    }

    #[test]
    fn test_empty_test_split_is_an_error() {
        let device = NdArrayDevice::default();
        let model  = ClassifierConfig::new(2, 2)
            .with_base_channels(4)
            .init::<CpuBackend>(&device)
            .unwrap();
        assert!(test(&model, SeriesDataset::new(Vec::new()), 4, 0, &device).is_err());
    }
}
