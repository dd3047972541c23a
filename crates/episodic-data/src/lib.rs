//! # episodic-data
//!
//! Few-shot episode generation over a `root/<family>/<character>/<image>` tree.
//!
//! This crate provides:
//! - [`FolderCatalog`] — discovers character folders and splits them into a
//!   meta-train and a meta-val pool with a seeded shuffle
//! - [`EpisodeSpec`] — one C-way, K-shot task: selected folders, relabelling,
//!   disjoint support (`Train`) and query (`Test`) items
//! - [`EpisodeDataset`] — one split of an episode as a [`Dataset`]
//! - [`BalancedIndexSampler`] — class-balanced index draws over
//!   class-contiguous datasets
//! - [`EpisodeLoader`] — a single collated batch per episode split
//!   (grayscale resize, rotation, normalization)
//!   - [`stats`] — pool summaries and up-front feasibility checks
//!   - [`ExperimentConfig`] — JSON experiment description
//!
//! Every random operation takes the generator explicitly; see
//! [`episodic_core::rng`].

pub mod catalog;
pub mod config;
pub mod dataset;
pub mod episode;
pub mod episode_dataset;
pub mod image_loader;
pub mod loader;
pub mod sampler;
pub mod stats;
pub mod transform;

pub use catalog::{CatalogConfig, CharacterFolder, FolderCatalog, FolderKey, PoolKind};
pub use config::{EpisodeShape, ExperimentConfig, PreprocessConfig};
pub use dataset::{Dataset, Sample};
pub use episode::{EpisodeItem, EpisodeSpec, Split};
pub use episode_dataset::EpisodeDataset;
pub use image_loader::{GrayscaleLoader, ImageLoader};
pub use loader::{EpisodeBatch, EpisodeLoader, EpisodeLoaderConfig};
pub use sampler::{BalancedIndexSampler, Sampler};
pub use stats::{summarize_pool, validate_pool, PoolReport, PoolSummary};
pub use transform::{Compose, Normalize, Rotate, Transform};
