// ============================================================
// Layer 4 — Train/Validation/Test Splitter
// ============================================================
// Two ways to partition the corpus:
//
//   random         — shuffle every sample index, then cut by
//                    fraction: [train | val | test]
//
//   group_holdout  — every sample of ONE group (e.g. one sensor
//                    node) becomes the test set; the remaining
//                    groups are shuffled into train / val.
//                    This measures how well a model transfers
//                    to a node or environment it never saw.
//
// All shuffles take an explicit RNG so a seed reproduces the
// same split between `train` and `evaluate`.
//
// Uses Fisher-Yates shuffle via rand::seq::SliceRandom.
//
// Reference: rand crate documentation

use rand::{seq::SliceRandom, Rng};

use crate::data::DataError;

/// Sample indices for each of the three phases.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SplitIndices {
    pub train: Vec<usize>,
    pub val:   Vec<usize>,
    pub test:  Vec<usize>,
}

/// Shuffle `samples` and split into (train, validation).
///
/// The first `round(len * train_fraction)` shuffled items are
/// training samples, the rest validation.
pub fn split_train_val<T, R: Rng + ?Sized>(
    mut samples:    Vec<T>,
    train_fraction: f64,
    rng:            &mut R,
) -> (Vec<T>, Vec<T>) {
    samples.shuffle(rng);

    let total    = samples.len();
    let split_at = ((total as f64) * train_fraction).round() as usize;
    // Clamp to valid range to avoid panics on tiny datasets
    let split_at = split_at.min(total);

    let val = samples.split_off(split_at);

    tracing::debug!(
        "Dataset split: {} training, {} validation ({}% / {}%)",
        samples.len(),
        val.len(),
        (samples.len() * 100) / total.max(1),
        (val.len()     * 100) / total.max(1),
    );

    (samples, val)
}

/// Shuffle all `n` indices and cut into train / val / test.
/// Whatever remains after the train and val fractions is test.
pub fn random_split<R: Rng + ?Sized>(
    n:          usize,
    train_frac: f64,
    val_frac:   f64,
    rng:        &mut R,
) -> SplitIndices {
    let mut indices: Vec<usize> = (0..n).collect();
    indices.shuffle(rng);

    let n_train = (((n as f64) * train_frac).round() as usize).min(n);
    let n_val   = (((n as f64) * val_frac).round() as usize).min(n - n_train);

    let test  = indices.split_off(n_train + n_val);
    let val   = indices.split_off(n_train);

    SplitIndices { train: indices, val, test }
}

/// Hold out every index whose group equals `holdout` as test;
/// split the rest into train / val keeping the train:val ratio
/// of `train_frac : val_frac`.
pub fn group_holdout_split<R: Rng + ?Sized>(
    groups:     &[usize],
    holdout:    usize,
    train_frac: f64,
    val_frac:   f64,
    rng:        &mut R,
) -> SplitIndices {
    let (test, rest): (Vec<usize>, Vec<usize>) =
        (0..groups.len()).partition(|&i| groups[i] == holdout);

    let denom = train_frac + val_frac;
    let train_share = if denom > 0.0 { train_frac / denom } else { 1.0 };
    let (train, val) = split_train_val(rest, train_share, rng);

    SplitIndices { train, val, test }
}

/// Resolve the `--holdout` value to a group index.
///
/// Accepts a label name (when names are known) or an integer
/// index. With no value, the highest group index present is
/// held out.
pub fn resolve_holdout(
    value:  Option<&str>,
    names:  Option<&[String]>,
    groups: &[usize],
) -> Result<usize, DataError> {
    let present = |g: usize| groups.contains(&g);

    let Some(value) = value else {
        let last = groups.iter().copied().max()
            .ok_or_else(|| DataError::EmptySplit("corpus has no samples".to_string()))?;
        tracing::warn!("No holdout group given, holding out group {}", last);
        return Ok(last);
    };

    if let Some(idx) = names.and_then(|n| n.iter().position(|name| name == value)) {
        return Ok(idx);
    }

    match value.parse::<usize>() {
        Ok(idx) if present(idx) => Ok(idx),
        _ => Err(DataError::UnknownHoldout(value.to_string())),
    }
}
