// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Entry point for all user interaction, built on clap.
// All workflow logic is delegated to Layer 2 (application).
//
// Two commands are supported:
//   1. `train`    — fits a classifier, optionally tests it
//   2. `evaluate` — reloads a run's checkpoint and tests it

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, EvaluateArgs, TrainArgs};

#[derive(Parser, Debug)]
#[command(
    name = "ts-classifier",
    version,
    about = "Train 1D CNN/ResNet on preprocessed time-series."
)]
pub struct Cli {
    /// The subcommand to run (train or evaluate)
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Dispatch to the matching use case.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args)    => run_train(args),
            Commands::Evaluate(args) => run_evaluate(args),
        }
    }
}

fn run_train(args: TrainArgs) -> Result<()> {
    use crate::application::train_use_case::TrainUseCase;

    tracing::info!("Starting training on dataset: {}", args.data.display());

    let use_case = TrainUseCase::new(args.into());
    use_case.execute()?;

    println!("Training complete. Checkpoint saved.");
    Ok(())
}

fn run_evaluate(args: EvaluateArgs) -> Result<()> {
    use crate::application::evaluate_use_case::EvaluateUseCase;

    let use_case = EvaluateUseCase::new(args.checkpoint_dir, args.data, args.accelerator);
    let summary  = use_case.execute()?;

    println!(
        "\nTest | test_loss={:.4} | test_acc={:.1}% | samples={}",
        summary.loss, summary.accuracy * 100.0, summary.samples,
    );
    Ok(())
}
