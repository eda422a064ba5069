// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// This layer orchestrates all the other layers to accomplish
// a specific goal (training or re-evaluating a run).
//
// Rules for this layer:
//   - No model or tensor code here
//   - No argument parsing here (that's Layer 1)
//   - Only workflow coordination

// The training workflow
pub mod train_use_case;

// Re-test a saved checkpoint
pub mod evaluate_use_case;
