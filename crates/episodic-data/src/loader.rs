// EpisodeLoader — one class-balanced batch per episode split
//
// Binds together:
//   - an `EpisodeDataset` over the train or test split,
//   - a `BalancedIndexSampler` sized from that split (`train_k` or `test_k`
//     items per class),
//   - the preprocessing pipeline `Rotate(angle) → Normalize(mean, std)`.
//
// A loader yields exactly one batch of `num_per_class × num_classes`
// samples, ordered as the sampler drew them. Build a new loader (or call
// `load_batch` again) for another draw.
//
// USAGE:
//
//   let episode = Arc::new(EpisodeSpec::build(pool, 5, 1, 19, &mut rng)?);
//   let support = EpisodeLoader::new(episode.clone(), EpisodeLoaderConfig::default())?;
//   let query = EpisodeLoader::new(
//       episode,
//       EpisodeLoaderConfig::default().split(Split::Test).num_per_class(19),
//   )?;
//   let batch = support.load_batch(&mut rng)?;

use std::sync::Arc;

use rand::RngCore;
use rayon::prelude::*;

use episodic_core::Result;

use crate::dataset::{Dataset, Sample};
use crate::episode::{EpisodeSpec, Split};
use crate::episode_dataset::EpisodeDataset;
use crate::image_loader::{GrayscaleLoader, ImageLoader, DEFAULT_IMAGE_SIZE};
use crate::sampler::{BalancedIndexSampler, Sampler};
use crate::transform::Compose;

/// Mean pixel intensity of the glyph images after scaling to [0, 1].
pub const GLYPH_MEAN: f64 = 0.92206;
/// Pixel standard deviation of the glyph images after scaling to [0, 1].
pub const GLYPH_STD: f64 = 0.08426;

/// Configuration for the EpisodeLoader.
#[derive(Debug, Clone)]
pub struct EpisodeLoaderConfig {
    /// Samples drawn from every class.
    pub num_per_class: usize,
    /// Which split of the episode to read.
    pub split: Split,
    /// Randomise which items each class contributes and the batch order.
    pub shuffle: bool,
    /// Counter-clockwise rotation in degrees applied to every image.
    pub rotation: f64,
    /// Side length images are resized to.
    pub image_size: u32,
    /// Normalization mean.
    pub mean: f64,
    /// Normalization standard deviation.
    pub std: f64,
    /// Number of parallel decode workers (0 = sequential).
    pub num_workers: usize,
}

impl Default for EpisodeLoaderConfig {
    fn default() -> Self {
        Self {
            num_per_class: 1,
            split: Split::Train,
            shuffle: true,
            rotation: 0.0,
            image_size: DEFAULT_IMAGE_SIZE,
            mean: GLYPH_MEAN,
            std: GLYPH_STD,
            num_workers: 0,
        }
    }
}

impl EpisodeLoaderConfig {
    pub fn num_per_class(mut self, n: usize) -> Self {
        self.num_per_class = n;
        self
    }

    pub fn split(mut self, s: Split) -> Self {
        self.split = s;
        self
    }

    pub fn shuffle(mut self, s: bool) -> Self {
        self.shuffle = s;
        self
    }

    pub fn rotation(mut self, degrees: f64) -> Self {
        self.rotation = degrees;
        self
    }

    pub fn image_size(mut self, size: u32) -> Self {
        self.image_size = size;
        self
    }

    pub fn normalize(mut self, mean: f64, std: f64) -> Self {
        self.mean = mean;
        self.std = std;
        self
    }

    pub fn num_workers(mut self, n: usize) -> Self {
        self.num_workers = n;
        self
    }
}

/// One collated batch.
#[derive(Debug, Clone, PartialEq)]
pub struct EpisodeBatch {
    /// Pixels of every sample, concatenated in batch order.
    pub images: Vec<f64>,
    /// `[batch, C, H, W]`.
    pub image_shape: [usize; 4],
    /// Label of every sample, in batch order.
    pub labels: Vec<usize>,
    /// Dataset index of every sample, in batch order.
    pub indices: Vec<usize>,
}

impl EpisodeBatch {
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Pixels of sample `i`.
    pub fn image(&self, i: usize) -> &[f64] {
        let per = self.image_shape[1] * self.image_shape[2] * self.image_shape[3];
        &self.images[i * per..(i + 1) * per]
    }
}

/// Produces the single class-balanced batch of one episode split.
pub struct EpisodeLoader {
    dataset: EpisodeDataset,
    sampler: BalancedIndexSampler,
    num_workers: usize,
}

impl EpisodeLoader {
    /// Loader decoding with the `image` crate at `config.image_size`.
    ///
    /// # Errors
    /// [`episodic_core::Error::SampleSize`] if `num_per_class` exceeds the
    /// split's items per class.
    pub fn new(episode: Arc<EpisodeSpec>, config: EpisodeLoaderConfig) -> Result<Self> {
        let loader = Arc::new(GrayscaleLoader::square(config.image_size));
        Self::with_image_loader(episode, config, loader)
    }

    /// Loader decoding through a caller-supplied `ImageLoader`.
    pub fn with_image_loader(
        episode: Arc<EpisodeSpec>,
        config: EpisodeLoaderConfig,
        loader: Arc<dyn ImageLoader>,
    ) -> Result<Self> {
        let sampler = BalancedIndexSampler::new(
            config.num_per_class,
            episode.num_classes(),
            episode.per_class(config.split),
            config.shuffle,
        )?;
        let pipeline = Compose::episode_pipeline(config.rotation, config.mean, config.std);
        let dataset = EpisodeDataset::with_loader(episode, config.split, loader)
            .with_transform(Box::new(pipeline));
        Ok(Self {
            dataset,
            sampler,
            num_workers: config.num_workers,
        })
    }

    /// Shorthand taking the loader arguments positionally.
    pub fn for_split(
        episode: Arc<EpisodeSpec>,
        split: Split,
        num_per_class: usize,
        shuffle: bool,
        rotation: f64,
    ) -> Result<Self> {
        let config = EpisodeLoaderConfig::default()
            .split(split)
            .num_per_class(num_per_class)
            .shuffle(shuffle)
            .rotation(rotation);
        Self::new(episode, config)
    }

    pub fn dataset(&self) -> &EpisodeDataset {
        &self.dataset
    }

    pub fn sampler(&self) -> &BalancedIndexSampler {
        &self.sampler
    }

    /// Samples per batch: `num_per_class × num_classes`.
    pub fn batch_size(&self) -> usize {
        self.sampler.len()
    }

    /// Always 1: the whole sampler draw is delivered as a single batch.
    pub fn num_batches(&self) -> usize {
        1
    }

    /// Fetch samples in the given order, optionally in parallel via rayon.
    fn fetch_samples(&self, indices: &[usize]) -> Result<Vec<Sample>> {
        if self.num_workers > 0 && indices.len() > 1 {
            indices.par_iter().map(|&i| self.dataset.get(i)).collect()
        } else {
            indices.iter().map(|&i| self.dataset.get(i)).collect()
        }
    }

    /// Draw indices from the sampler and load them as one batch.
    pub fn load_batch(&self, rng: &mut dyn RngCore) -> Result<EpisodeBatch> {
        let indices = self.sampler.indices(rng);
        let samples = self.fetch_samples(&indices)?;

        let shape = self.dataset.feature_shape();
        let (c, h, w) = (shape[0], shape[1], shape[2]);
        let mut images = Vec::with_capacity(samples.len() * c * h * w);
        let mut labels = Vec::with_capacity(samples.len());
        for s in samples {
            images.extend_from_slice(&s.features);
            labels.push(s.label);
        }

        tracing::trace!(
            split = self.dataset.split().as_str(),
            batch = labels.len(),
            "loaded episode batch"
        );

        Ok(EpisodeBatch {
            images,
            image_shape: [labels.len(), c, h, w],
            labels,
            indices,
        })
    }

    /// Iterate over the loader's batches. Yields exactly one.
    pub fn iter<'l, 'r>(&'l self, rng: &'r mut dyn RngCore) -> BatchIterator<'l, 'r> {
        BatchIterator {
            loader: self,
            rng,
            done: false,
        }
    }
}

/// Iterator returned by [`EpisodeLoader::iter`].
pub struct BatchIterator<'l, 'r> {
    loader: &'l EpisodeLoader,
    rng: &'r mut dyn RngCore,
    done: bool,
}

impl Iterator for BatchIterator<'_, '_> {
    type Item = Result<EpisodeBatch>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        self.done = true;
        Some(self.loader.load_batch(&mut *self.rng))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = usize::from(!self.done);
        (n, Some(n))
    }
}
