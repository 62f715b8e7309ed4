//! Train/test split.

use crate::dataset::RegressionDataset;
use crate::error::{PanelError, Result};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

/// Default share of rows used for training.
pub const DEFAULT_TRAIN_FRACTION: f64 = 0.8;

/// How rows are assigned to the training part.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SplitStrategy {
    /// Earliest periods train, latest periods test
    #[default]
    Chronological,
    /// Rows drawn at random with a fixed seed
    Random {
        /// RNG seed
        seed: u64,
    },
}

/// Number of training rows for `n` observations.
///
/// `ceil(n * fraction)`, clamped so both parts keep at least one row.
pub fn train_size(n: usize, fraction: f64) -> Result<usize> {
    if !(fraction > 0.0 && fraction < 1.0) {
        return Err(PanelError::InvalidFraction(fraction));
    }
    if n < 2 {
        return Err(PanelError::InvalidDataset(format!(
            "cannot split {n} rows into train and test"
        )));
    }
    let size = (n as f64 * fraction).ceil() as usize;
    Ok(size.clamp(1, n - 1))
}

/// Split a dataset into `(train, test)`.
///
/// Both parts keep the chronological order of their rows, whatever the
/// strategy, so test periods plot in order.
pub fn split(
    dataset: &RegressionDataset,
    train_fraction: f64,
    strategy: SplitStrategy,
) -> Result<(RegressionDataset, RegressionDataset)> {
    let n = dataset.len();
    let k = train_size(n, train_fraction)?;

    let mut indices: Vec<usize> = (0..n).collect();
    if let SplitStrategy::Random { seed } = strategy {
        let mut rng = StdRng::seed_from_u64(seed);
        indices.shuffle(&mut rng);
    }

    let (train, test) = indices.split_at_mut(k);
    train.sort_unstable();
    test.sort_unstable();

    Ok((dataset.select_rows(train), dataset.select_rows(test)))
}
