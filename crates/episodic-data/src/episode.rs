// EpisodeSpec — one sampled C-way K-shot task
//
// Building an episode:
//   1. draw `num_classes` distinct folders from the pool (no replacement);
//   2. label each folder by its draw position, 0..num_classes;
//   3. permute each folder's images and cut the permutation into `train_k`
//      support items followed by `test_k` query items (the rest is unused);
//   4. concatenate the per-class blocks in label order.
//
// Both item lists are therefore class-contiguous with fixed block sizes:
// class j occupies `[j * k, (j + 1) * k)`. `BalancedIndexSampler` relies on
// that layout.
//
// Construction is all-or-nothing. A folder with fewer than
// `train_k + test_k` images fails the whole episode with
// `InsufficientSamples`; classes are never padded or truncated.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use rand::seq::{index, SliceRandom};
use rand::Rng;
use serde::{Deserialize, Serialize};

use episodic_core::{Error, Result};

use crate::catalog::{CharacterFolder, FolderKey};

/// Which half of an episode to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Split {
    /// Support set: `train_k` items per class.
    Train,
    /// Query set: `test_k` items per class.
    Test,
}

impl Split {
    pub fn as_str(&self) -> &'static str {
        match self {
            Split::Train => "train",
            Split::Test => "test",
        }
    }
}

/// One image of an episode with its episode-local label.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EpisodeItem {
    pub path: PathBuf,
    pub label: usize,
}

/// A sampled few-shot task.
///
/// Not persisted: build one per training step or evaluation run and drop it
/// afterwards.
#[derive(Debug, Clone)]
pub struct EpisodeSpec {
    num_classes: usize,
    train_k: usize,
    test_k: usize,
    selected: Vec<CharacterFolder>,
    labels: HashMap<FolderKey, usize>,
    train_items: Vec<EpisodeItem>,
    test_items: Vec<EpisodeItem>,
}

impl EpisodeSpec {
    /// Sample a `num_classes`-way episode from `pool`.
    ///
    /// The generator is only advanced, never stored. Building episodes from
    /// several threads needs one generator per thread
    /// (see [`episodic_core::rng::fork`]).
    ///
    /// # Errors
    /// - [`Error::Config`] if `num_classes == 0`
    /// - [`Error::EmptyPool`] if the pool has fewer than `num_classes` folders
    /// - [`Error::InsufficientSamples`] if a selected folder holds fewer than
    ///   `train_k + test_k` images
    /// - [`Error::Io`] if a folder cannot be listed
    pub fn build<R: Rng + ?Sized>(
        pool: &[CharacterFolder],
        num_classes: usize,
        train_k: usize,
        test_k: usize,
        rng: &mut R,
    ) -> Result<Self> {
        if num_classes == 0 {
            return Err(Error::config("an episode needs at least one class"));
        }
        if pool.len() < num_classes {
            return Err(Error::EmptyPool {
                requested: num_classes,
                available: pool.len(),
            });
        }

        let selected: Vec<CharacterFolder> = index::sample(rng, pool.len(), num_classes)
            .into_iter()
            .map(|i| pool[i].clone())
            .collect();

        let required = train_k + test_k;
        let mut labels = HashMap::with_capacity(num_classes);
        let mut train_items = Vec::with_capacity(num_classes * train_k);
        let mut test_items = Vec::with_capacity(num_classes * test_k);

        for (label, folder) in selected.iter().enumerate() {
            labels.insert(folder.key(), label);

            let mut files = folder.image_files()?;
            if files.len() < required {
                return Err(Error::InsufficientSamples {
                    folder: folder.path().to_path_buf(),
                    available: files.len(),
                    required,
                });
            }
            files.shuffle(rng);

            let item = |path: &PathBuf| EpisodeItem {
                path: path.clone(),
                label,
            };
            train_items.extend(files[..train_k].iter().map(item));
            test_items.extend(files[train_k..required].iter().map(item));
        }

        tracing::debug!(
            num_classes,
            train_k,
            test_k,
            train = train_items.len(),
            test = test_items.len(),
            "built episode"
        );

        Ok(Self {
            num_classes,
            train_k,
            test_k,
            selected,
            labels,
            train_items,
            test_items,
        })
    }

    pub fn num_classes(&self) -> usize {
        self.num_classes
    }

    pub fn train_k(&self) -> usize {
        self.train_k
    }

    pub fn test_k(&self) -> usize {
        self.test_k
    }

    /// Items per class in `split` (the block size of the class-contiguous layout).
    pub fn per_class(&self, split: Split) -> usize {
        match split {
            Split::Train => self.train_k,
            Split::Test => self.test_k,
        }
    }

    /// The selected folders, in label order.
    pub fn selected(&self) -> &[CharacterFolder] {
        &self.selected
    }

    pub fn train_items(&self) -> &[EpisodeItem] {
        &self.train_items
    }

    pub fn test_items(&self) -> &[EpisodeItem] {
        &self.test_items
    }

    pub fn items(&self, split: Split) -> &[EpisodeItem] {
        match split {
            Split::Train => &self.train_items,
            Split::Test => &self.test_items,
        }
    }

    /// Label assigned to `folder`, or `None` if it was not selected.
    pub fn label_of(&self, folder: &CharacterFolder) -> Option<usize> {
        self.label_of_key(folder.key())
    }

    pub fn label_of_key(&self, key: FolderKey) -> Option<usize> {
        self.labels.get(&key).copied()
    }

    /// The folder carrying `label`.
    pub fn folder_for(&self, label: usize) -> Option<&CharacterFolder> {
        self.selected.get(label)
    }

    /// Whether `path` was drawn into `split`.
    pub fn contains(&self, split: Split, path: &Path) -> bool {
        self.items(split).iter().any(|it| it.path == path)
    }
}
