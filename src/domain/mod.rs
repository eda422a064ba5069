// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Pure Rust types and traits that define the core concepts of
// the system: which label a run classifies by, how the data is
// split, which backend runs it, and what a series source is.
//
// Rules for this layer:
//   - NO Burn framework types allowed here
//   - NO file I/O
//   - Only plain Rust structs, enums, and traits
//
// Reference: Rust Book §5 (Structs), §6 (Enums), §10 (Traits)

// Label kinds, split strategies and accelerator selection
pub mod task;

// Core abstractions (traits) that other layers implement
pub mod traits;
