// EpisodeDataset — one split of an episode viewed as a Dataset
//
// Index i maps to (decoded image of items[i], items[i].label). Decoding goes
// through an `ImageLoader`; an optional `Transform` runs on the decoded
// sample and an optional target transform on the label.

use std::sync::Arc;

use episodic_core::{Error, Result};

use crate::dataset::{Dataset, Sample};
use crate::episode::{EpisodeItem, EpisodeSpec, Split};
use crate::image_loader::{GrayscaleLoader, ImageLoader};
use crate::transform::Transform;

/// Maps an episode label to the label handed to the training loop.
pub type TargetTransform = Box<dyn Fn(usize) -> usize + Send + Sync>;

/// Read-only view over the support (`Train`) or query (`Test`) items of an
/// episode.
pub struct EpisodeDataset {
    episode: Arc<EpisodeSpec>,
    split: Split,
    loader: Arc<dyn ImageLoader>,
    transform: Option<Box<dyn Transform>>,
    target_transform: Option<TargetTransform>,
    feature_shape: Vec<usize>,
    name: String,
}

impl EpisodeDataset {
    /// View `split` of `episode`, decoding with the default 28×28 grayscale loader.
    pub fn new(episode: Arc<EpisodeSpec>, split: Split) -> Self {
        Self::with_loader(episode, split, Arc::new(GrayscaleLoader::default()))
    }

    /// View `split` of `episode`, decoding with `loader`.
    pub fn with_loader(episode: Arc<EpisodeSpec>, split: Split, loader: Arc<dyn ImageLoader>) -> Self {
        let feature_shape = loader.output_shape().to_vec();
        let name = format!("episode-{}", split.as_str());
        Self {
            episode,
            split,
            loader,
            transform: None,
            target_transform: None,
            feature_shape,
            name,
        }
    }

    /// Transform applied to every decoded sample.
    pub fn with_transform(mut self, t: Box<dyn Transform>) -> Self {
        self.transform = Some(t);
        self
    }

    /// Function applied to every label.
    pub fn with_target_transform<F>(mut self, f: F) -> Self
    where
        F: Fn(usize) -> usize + Send + Sync + 'static,
    {
        self.target_transform = Some(Box::new(f));
        self
    }

    pub fn split(&self) -> Split {
        self.split
    }

    pub fn episode(&self) -> &EpisodeSpec {
        &self.episode
    }

    pub fn items(&self) -> &[EpisodeItem] {
        self.episode.items(self.split)
    }

    /// Label of item `index` after the target transform, without decoding.
    pub fn label(&self, index: usize) -> Result<usize> {
        let item = self.item(index)?;
        Ok(self.map_label(item.label))
    }

    fn item(&self, index: usize) -> Result<&EpisodeItem> {
        let items = self.items();
        items.get(index).ok_or(Error::IndexOutOfRange {
            index,
            len: items.len(),
        })
    }

    fn map_label(&self, label: usize) -> usize {
        match &self.target_transform {
            Some(f) => f(label),
            None => label,
        }
    }
}

impl Dataset for EpisodeDataset {
    fn len(&self) -> usize {
        self.items().len()
    }

    fn get(&self, index: usize) -> Result<Sample> {
        let item = self.item(index)?;
        let features = self.loader.load(&item.path)?;
        let sample = Sample {
            features,
            feature_shape: self.feature_shape.clone(),
            label: self.map_label(item.label),
        };
        Ok(match &self.transform {
            Some(t) => t.apply(sample),
            None => sample,
        })
    }

    fn feature_shape(&self) -> &[usize] {
        &self.feature_shape
    }

    fn name(&self) -> &str {
        &self.name
    }
}
