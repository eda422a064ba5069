// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Cross-cutting concerns shared by the other layers:
//
//   checkpoint.rs — Saving and loading model weights with
//                   Burn's CompactRecorder, plus the run's
//                   hyperparameters and TrainConfig as JSON
//                   so `evaluate` can rebuild the model.
//
//   metrics.rs    — Per-step metric accumulation and the
//                   epoch-level metrics.csv writer.
//
// Reference: Rust Book §7 (Modules)
//            Rust Book §9 (Error Handling with anyhow)

pub mod checkpoint;
pub mod metrics;
