// ============================================================
// Layer 3 — Task and Run Option Types
// ============================================================
// Plain enums describing WHAT a training run is about:
//
//   LabelKind     — which label vector a sample is classified by.
//                   The dataset carries two: the environment the
//                   sensor was placed in, and the node (device)
//                   that recorded it.
//
//   SplitStrategy — how samples are divided into train/val/test
//
//   Accelerator   — which compute backend the trainer should use
//
// All three parse from the lowercase strings used on the
// command line, so clap can fill them in via FromStr.
//
// Reference: Rust Book §6 (Enums), §10 (Traits: FromStr, Display)

use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

// ─── LabelKind ────────────────────────────────────────────────────────────────
/// One of the two label vectors stored in the dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LabelKind {
    /// Environment the recording was taken in
    Env,
    /// Sensor node that produced the recording
    Node,
}

impl LabelKind {
    /// The label kind that is NOT this one.
    ///
    /// Used to default the group key of a group-holdout split:
    /// when classifying environments we hold out a whole node,
    /// and vice versa.
    pub fn other(self) -> Self {
        match self {
            LabelKind::Env  => LabelKind::Node,
            LabelKind::Node => LabelKind::Env,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LabelKind::Env  => "env",
            LabelKind::Node => "node",
        }
    }
}

impl fmt::Display for LabelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LabelKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "env"  => Ok(LabelKind::Env),
            "node" => Ok(LabelKind::Node),
            other  => Err(format!("unknown label kind '{other}' (expected 'env' or 'node')")),
        }
    }
}

// ─── SplitStrategy ────────────────────────────────────────────────────────────
/// How the dataset is partitioned into train / validation / test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitStrategy {
    /// Shuffle individual samples, then cut by fraction
    Random,
    /// Withhold every sample of one group as the test set
    GroupHoldout,
}

impl fmt::Display for SplitStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SplitStrategy::Random       => f.write_str("random"),
            SplitStrategy::GroupHoldout => f.write_str("group_holdout"),
        }
    }
}

impl FromStr for SplitStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "random"        => Ok(SplitStrategy::Random),
            "group_holdout" => Ok(SplitStrategy::GroupHoldout),
            other => Err(format!(
                "unknown split '{other}' (expected 'random' or 'group_holdout')"
            )),
        }
    }
}

// ─── Accelerator ──────────────────────────────────────────────────────────────
/// Compute backend selection.
/// `Auto` uses the GPU (WGPU) backend when an adapter is present
/// and the CPU (NdArray) backend otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Accelerator {
    Auto,
    Cpu,
    Gpu,
}

impl fmt::Display for Accelerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Accelerator::Auto => f.write_str("auto"),
            Accelerator::Cpu  => f.write_str("cpu"),
            Accelerator::Gpu  => f.write_str("gpu"),
        }
    }
}

impl FromStr for Accelerator {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "auto"          => Ok(Accelerator::Auto),
            "cpu"           => Ok(Accelerator::Cpu),
            "gpu" | "wgpu"  => Ok(Accelerator::Gpu),
            other => Err(format!(
                "unknown accelerator '{other}' (expected 'auto', 'cpu' or 'gpu')"
            )),
        }
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_other_label_kind() {
        assert_eq!(LabelKind::Env.other(),  LabelKind::Node);
        assert_eq!(LabelKind::Node.other(), LabelKind::Env);
    }

    #[test]
    fn test_parse_cli_strings() {
        assert_eq!("node".parse::<LabelKind>().unwrap(), LabelKind::Node);
        assert_eq!(
            "group_holdout".parse::<SplitStrategy>().unwrap(),
            SplitStrategy::GroupHoldout
        );
        assert_eq!("wgpu".parse::<Accelerator>().unwrap(), Accelerator::Gpu);
        assert!("room".parse::<LabelKind>().is_err());
        assert!("kfold".parse::<SplitStrategy>().is_err());
    }

    #[test]
    fn test_display_round_trips_through_from_str() {
        for split in [SplitStrategy::Random, SplitStrategy::GroupHoldout] {
            assert_eq!(split.to_string().parse::<SplitStrategy>().unwrap(), split);
        }
    }
}
