// ============================================================
// Layer 4 — Dataset Loader (.npz)
// ============================================================
// Loads the preprocessed time-series corpus written by the
// preprocessing step with numpy.savez.
//
// Expected arrays inside the archive:
//   X       float32  [N, channels, length]   the signal windows
//   y_env   int64    [N]                      environment label
//   y_node  int64    [N]                      node label
//
// Label names are optional. numpy string arrays cannot be read
// by ndarray-npy, so names live in a JSON sidecar next to the
// archive, e.g. dataset.npz → dataset.labels.json:
//   { "env": ["office", "outdoor"], "node": ["n1", "n2", "n3"] }
//
// Reference: ndarray-npy crate documentation
//            Rust Book §9 (Error Handling)

use anyhow::{Context, Result};
use ndarray::{Array1, Array3, Axis};
use ndarray_npy::NpzReader;
use serde::{Deserialize, Serialize};
use std::{
    fs::{self, File},
    path::{Path, PathBuf},
};

use crate::data::DataError;
use crate::domain::task::LabelKind;
use crate::domain::traits::{LabelledCorpus, SeriesSource};

/// Names of the arrays inside the archive
const X_KEY:      &str = "X";
const ENV_KEY:    &str = "y_env";
const NODE_KEY:   &str = "y_node";

/// Optional label-name sidecar contents
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LabelNames {
    #[serde(default)]
    pub env:  Option<Vec<String>>,
    #[serde(default)]
    pub node: Option<Vec<String>>,
}

/// A fully loaded corpus held in memory.
#[derive(Debug, Clone)]
pub struct RawSeries {
    /// Signal windows — shape [N, channels, length]
    pub x:     Array3<f32>,
    pub env:   Vec<usize>,
    pub node:  Vec<usize>,
    pub names: LabelNames,
}

impl RawSeries {
    /// Build a corpus from arrays, checking that every label
    /// vector has one entry per series.
    pub fn new(
        x:     Array3<f32>,
        env:   Vec<usize>,
        node:  Vec<usize>,
        names: LabelNames,
    ) -> Result<Self, DataError> {
        let n = x.len_of(Axis(0));
        for (name, labels) in [(ENV_KEY, &env), (NODE_KEY, &node)] {
            if labels.len() != n {
                return Err(DataError::LengthMismatch {
                    name:     name.to_string(),
                    expected: n,
                    found:    labels.len(),
                });
            }
        }
        Ok(Self { x, env, node, names })
    }
}

impl LabelledCorpus for RawSeries {
    fn len(&self) -> usize {
        self.x.len_of(Axis(0))
    }

    fn channels(&self) -> usize {
        self.x.len_of(Axis(1))
    }

    fn length(&self) -> usize {
        self.x.len_of(Axis(2))
    }

    fn labels(&self, kind: LabelKind) -> &[usize] {
        match kind {
            LabelKind::Env  => &self.env,
            LabelKind::Node => &self.node,
        }
    }

    fn label_names(&self, kind: LabelKind) -> Option<&[String]> {
        match kind {
            LabelKind::Env  => self.names.env.as_deref(),
            LabelKind::Node => self.names.node.as_deref(),
        }
    }

    fn series(&self, index: usize) -> Vec<f32> {
        // index_axis yields a [channels, length] view; iter() walks
        // it in logical (row-major) order regardless of memory layout
        self.x.index_axis(Axis(0), index).iter().copied().collect()
    }
}

/// Loads a `.npz` corpus from disk.
/// Implements the SeriesSource trait from Layer 3.
pub struct NpzLoader {
    path: PathBuf,
}

impl NpzLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the label-name sidecar for this archive
    pub fn sidecar_path(&self) -> PathBuf {
        self.path.with_extension("labels.json")
    }

    fn read_labels(&self, npz: &mut NpzReader<File>, name: &str) -> Result<Vec<usize>> {
        let raw: Array1<i64> = npz.by_name(name).map_err(|e| DataError::MissingArray {
            path:   self.path.display().to_string(),
            name:   name.to_string(),
            reason: e.to_string(),
        })?;

        raw.iter()
            .map(|&v| {
                usize::try_from(v).map_err(|_| {
                    DataError::NegativeLabel { name: name.to_string(), value: v }.into()
                })
            })
            .collect()
    }

    fn read_names(&self) -> Result<LabelNames> {
        let path = self.sidecar_path();
        if !path.exists() {
            return Ok(LabelNames::default());
        }
        let json = fs::read_to_string(&path)
            .with_context(|| format!("Cannot read label names from '{}'", path.display()))?;
        let names = serde_json::from_str(&json)
            .with_context(|| format!("Malformed label names in '{}'", path.display()))?;
        tracing::debug!("Loaded label names from '{}'", path.display());
        Ok(names)
    }
}

impl SeriesSource for NpzLoader {
    type Corpus = RawSeries;

    fn load(&self) -> Result<RawSeries> {
        let file = File::open(&self.path)
            .with_context(|| format!("Cannot open dataset '{}'", self.path.display()))?;
        let mut npz = NpzReader::new(file)
            .with_context(|| format!("'{}' is not a valid .npz archive", self.path.display()))?;

        let x: Array3<f32> = npz.by_name(X_KEY).map_err(|e| DataError::MissingArray {
            path:   self.path.display().to_string(),
            name:   X_KEY.to_string(),
            reason: e.to_string(),
        })?;
        let env  = self.read_labels(&mut npz, ENV_KEY)?;
        let node = self.read_labels(&mut npz, NODE_KEY)?;
        let names = self.read_names()?;

        let corpus = RawSeries::new(x, env, node, names)?;
        tracing::info!(
            "Loaded {} series ({} channels x {} steps) from '{}'",
            corpus.len(),
            corpus.channels(),
            corpus.length(),
            display_name(&self.path),
        );
        Ok(corpus)
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("unknown")
        .to_string()
}
