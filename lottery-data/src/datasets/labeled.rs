use lottery_core::{LotteryError, Result};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

/// Number of examples selected by `fraction` of `n`, rounded up.
pub(crate) fn count_for_fraction(n: usize, fraction: f64) -> usize {
    ((n as f64 * fraction).ceil() as usize).min(n)
}

/// A permutation of `0..n` drawn from a seeded generator.
pub(crate) fn permutation(n: usize, seed: u64) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..n).collect();
    indices.shuffle(&mut StdRng::seed_from_u64(seed));
    indices
}

/// Examples paired index by index with integer labels.
///
/// Every operation keeps `examples.len() == labels.len()` and the pairing
/// of `examples[i]` with `labels[i]`.
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledDataset<E> {
    examples: Vec<E>,
    labels: Vec<usize>,
    subsampled: bool,
}

impl<E> LabeledDataset<E> {
    /// # Errors
    ///
    /// Returns `LengthMismatch` if `examples` and `labels` differ in length.
    pub fn new(examples: Vec<E>, labels: Vec<usize>) -> Result<Self> {
        if examples.len() != labels.len() {
            return Err(LotteryError::LengthMismatch {
                examples: examples.len(),
                labels: labels.len(),
            });
        }
        Ok(Self {
            examples,
            labels,
            subsampled: false,
        })
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn examples(&self) -> &[E] {
        &self.examples
    }

    /// Mutable access to the examples. The slice cannot change length, so
    /// the pairing with the labels is kept.
    pub fn examples_mut(&mut self) -> &mut [E] {
        &mut self.examples
    }

    pub fn labels(&self) -> &[usize] {
        &self.labels
    }

    /// The example at `index` together with its label.
    pub fn example(&self, index: usize) -> Result<(&E, usize)> {
        match (self.examples.get(index), self.labels.get(index)) {
            (Some(example), Some(&label)) => Ok((example, label)),
            _ => Err(LotteryError::IndexOutOfBounds {
                index,
                len: self.len(),
            }),
        }
    }

    /// Replaces every label at once.
    pub fn set_labels(&mut self, labels: Vec<usize>) -> Result<()> {
        if labels.len() != self.examples.len() {
            return Err(LotteryError::LengthMismatch {
                examples: self.examples.len(),
                labels: labels.len(),
            });
        }
        self.labels = labels;
        Ok(())
    }

    /// Replaces `ceil(len * fraction)` labels with classes drawn uniformly
    /// from `0..num_classes`.
    ///
    /// The new labels come from a generator seeded with `seed`, the positions
    /// from a permutation seeded with `seed + 1`.
    pub fn randomize_labels(&mut self, seed: u64, fraction: f64, num_classes: usize) -> Result<()> {
        if !(0.0..=1.0).contains(&fraction) {
            return Err(LotteryError::invalid_hparam(
                "random_labels_fraction",
                format!("{} is outside [0, 1]", fraction),
            ));
        }
        let count = count_for_fraction(self.len(), fraction);
        if count == 0 {
            return Ok(());
        }
        if num_classes == 0 {
            return Err(LotteryError::invalid_hparam(
                "random_labels_fraction",
                "dataset declares no classes",
            ));
        }
        let mut label_rng = StdRng::seed_from_u64(seed);
        let randomized: Vec<usize> = (0..count)
            .map(|_| label_rng.gen_range(0..num_classes))
            .collect();
        let positions = permutation(self.len(), seed.wrapping_add(1));
        for (&position, label) in positions.iter().zip(randomized) {
            self.labels[position] = label;
        }
        Ok(())
    }

    /// Keeps `ceil(len * fraction)` examples chosen by a permutation seeded
    /// with `seed + 1`, or the remaining ones when `inverse` is set.
    ///
    /// The same seed and fraction with `inverse` false and true partition the
    /// dataset. Retained examples keep their relative order.
    ///
    /// # Errors
    ///
    /// `AlreadySubsampled` on a second call, `InvalidHparam` for a fraction
    /// outside `(0, 1]`.
    pub fn subsample(&mut self, seed: u64, fraction: f64, inverse: bool) -> Result<()> {
        if self.subsampled {
            return Err(LotteryError::AlreadySubsampled);
        }
        if !(fraction > 0.0 && fraction <= 1.0) {
            return Err(LotteryError::invalid_hparam(
                "subsample_fraction",
                format!("{} is outside (0, 1]", fraction),
            ));
        }
        let count = count_for_fraction(self.len(), fraction);
        let order = permutation(self.len(), seed.wrapping_add(1));
        let selected = if inverse {
            &order[count..]
        } else {
            &order[..count]
        };
        let mut keep = vec![false; self.len()];
        for &index in selected {
            keep[index] = true;
        }
        self.retain_indices(&keep);
        self.subsampled = true;
        Ok(())
    }

    /// Keeps only the examples for which `predicate` returns true.
    pub fn retain<F>(&mut self, predicate: F)
    where
        F: Fn(&E) -> bool,
    {
        let keep: Vec<bool> = self.examples.iter().map(predicate).collect();
        self.retain_indices(&keep);
    }

    fn retain_indices(&mut self, keep: &[bool]) {
        let examples = std::mem::take(&mut self.examples);
        let labels = std::mem::take(&mut self.labels);
        let (examples, labels): (Vec<E>, Vec<usize>) = examples
            .into_iter()
            .zip(labels)
            .zip(keep.iter())
            .filter(|(_, keep)| **keep)
            .map(|(pair, _)| pair)
            .unzip();
        self.examples = examples;
        self.labels = labels;
    }
}

#[cfg(test)]
#[path = "labeled_test.rs"]
mod tests;
