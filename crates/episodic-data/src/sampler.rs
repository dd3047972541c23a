// Sampler — ordered index sequences over a Dataset
//
// `BalancedIndexSampler` draws the same number of items from every class of
// a class-contiguous dataset (class j at `[j * N, (j + 1) * N)`), which is
// how `EpisodeSpec` lays out its support and query items.

use rand::seq::{index, SliceRandom};
use rand::RngCore;

use episodic_core::{Error, Result};

/// Produces the order in which a loader reads dataset indices.
pub trait Sampler: Send + Sync {
    /// One full draw of indices. Each call is a fresh draw when the sampler
    /// is randomised.
    fn indices(&self, rng: &mut dyn RngCore) -> Vec<usize>;

    /// Number of indices every draw returns.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Draws `num_per_class` items from each of `num_classes` equal-size blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BalancedIndexSampler {
    num_per_class: usize,
    num_classes: usize,
    pool_size_per_class: usize,
    shuffle: bool,
}

impl BalancedIndexSampler {
    /// # Errors
    /// [`Error::SampleSize`] if `num_per_class > pool_size_per_class`; a block
    /// cannot give more distinct items than it holds.
    pub fn new(
        num_per_class: usize,
        num_classes: usize,
        pool_size_per_class: usize,
        shuffle: bool,
    ) -> Result<Self> {
        if num_per_class > pool_size_per_class {
            return Err(Error::SampleSize {
                requested: num_per_class,
                available: pool_size_per_class,
            });
        }
        Ok(Self {
            num_per_class,
            num_classes,
            pool_size_per_class,
            shuffle,
        })
    }

    pub fn num_per_class(&self) -> usize {
        self.num_per_class
    }

    pub fn num_classes(&self) -> usize {
        self.num_classes
    }

    pub fn pool_size_per_class(&self) -> usize {
        self.pool_size_per_class
    }

    pub fn shuffle(&self) -> bool {
        self.shuffle
    }

    /// `num_classes × num_per_class`, whether or not the draw is shuffled.
    pub fn len(&self) -> usize {
        self.num_classes * self.num_per_class
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Draw one index sequence.
    ///
    /// Unshuffled, the result is fixed: the first `num_per_class` offsets of
    /// every block, blocks in class order. Shuffled, each block contributes
    /// the prefix of a random permutation and the concatenation is shuffled
    /// again.
    pub fn generate<R: RngCore + ?Sized>(&self, rng: &mut R) -> Vec<usize> {
        let n = self.pool_size_per_class;
        let mut batch = Vec::with_capacity(self.len());
        for class in 0..self.num_classes {
            let base = class * n;
            if self.shuffle {
                batch.extend(
                    index::sample(rng, n, self.num_per_class)
                        .into_iter()
                        .map(|offset| base + offset),
                );
            } else {
                batch.extend(base..base + self.num_per_class);
            }
        }
        if self.shuffle {
            batch.shuffle(rng);
        }
        batch
    }
}

impl Sampler for BalancedIndexSampler {
    fn indices(&self, rng: &mut dyn RngCore) -> Vec<usize> {
        self.generate(rng)
    }

    fn len(&self) -> usize {
        BalancedIndexSampler::len(self)
    }
}
