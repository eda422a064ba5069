// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The application layer only needs "something that yields
// labelled multichannel series". The .npz loader in Layer 4 is
// the one implementation today; a CSV capture reader for raw
// sensor logs could implement the same trait later.
//
// Reference: Rust Book §10 (Traits: Defining Shared Behaviour)

use anyhow::Result;

use crate::domain::task::LabelKind;

// ─── SeriesSource ─────────────────────────────────────────────────────────────
/// Any component that can load a labelled time-series corpus.
pub trait SeriesSource {
    /// The in-memory corpus type this source produces
    type Corpus: LabelledCorpus;

    /// Load the full corpus from this source.
    fn load(&self) -> Result<Self::Corpus>;
}

// ─── LabelledCorpus ───────────────────────────────────────────────────────────
/// Read access to a loaded corpus of `N` series, each shaped
/// `[channels, length]`, carrying one label per `LabelKind`.
pub trait LabelledCorpus {
    /// Number of series in the corpus
    fn len(&self) -> usize;

    /// Number of signal channels per series
    fn channels(&self) -> usize;

    /// Number of time steps per series
    fn length(&self) -> usize;

    /// The label vector for `kind`, one entry per series
    fn labels(&self, kind: LabelKind) -> &[usize];

    /// Human readable label names for `kind`, when known
    fn label_names(&self, kind: LabelKind) -> Option<&[String]>;

    /// Flattened `[channels * length]` values of series `index`
    fn series(&self, index: usize) -> Vec<f32>;
}
