//! Experiment configuration.
//!
//! Everything the pipeline needs can be passed as plain values; this module
//! only gathers them into one serde-friendly struct so an experiment can be
//! described by a JSON file. Missing fields fall back to the defaults.
//!
//! ```json
//! {
//!   "root": "data/omniglot_resized",
//!   "catalog": { "num_train": 1200, "seed": 1 },
//!   "episode": { "num_classes": 5, "train_k": 1, "test_k": 19 },
//!   "preprocess": { "image_size": 28, "mean": 0.92206, "std": 0.08426 }
//! }
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use episodic_core::{Error, Result};

use crate::catalog::CatalogConfig;
use crate::episode::Split;
use crate::image_loader::DEFAULT_IMAGE_SIZE;
use crate::loader::{EpisodeLoaderConfig, GLYPH_MEAN, GLYPH_STD};

/// C-way, K-shot shape of the episodes to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EpisodeShape {
    pub num_classes: usize,
    pub train_k: usize,
    pub test_k: usize,
}

impl Default for EpisodeShape {
    fn default() -> Self {
        Self {
            num_classes: 5,
            train_k: 1,
            test_k: 19,
        }
    }
}

impl EpisodeShape {
    /// Images every selected folder must hold.
    pub fn required_per_class(&self) -> usize {
        self.train_k + self.test_k
    }

    pub fn per_class(&self, split: Split) -> usize {
        match split {
            Split::Train => self.train_k,
            Split::Test => self.test_k,
        }
    }
}

/// Image preprocessing parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprocessConfig {
    pub image_size: u32,
    pub rotation: f64,
    pub mean: f64,
    pub std: f64,
    pub num_workers: usize,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            image_size: DEFAULT_IMAGE_SIZE,
            rotation: 0.0,
            mean: GLYPH_MEAN,
            std: GLYPH_STD,
            num_workers: 0,
        }
    }
}

/// Full description of an episode-generation experiment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperimentConfig {
    pub root: PathBuf,
    pub catalog: CatalogConfig,
    pub episode: EpisodeShape,
    pub preprocess: PreprocessConfig,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("data/omniglot_resized"),
            catalog: CatalogConfig::default(),
            episode: EpisodeShape::default(),
            preprocess: PreprocessConfig::default(),
        }
    }
}

impl ExperimentConfig {
    pub fn from_json_str(s: &str) -> Result<Self> {
        let cfg: Self = serde_json::from_str(s).map_err(|e| Error::config(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        Self::from_json_str(&raw)
    }

    /// Reject values no episode could be built from.
    pub fn validate(&self) -> Result<()> {
        if self.episode.num_classes == 0 {
            return Err(Error::config("episode.num_classes must be at least 1"));
        }
        if self.preprocess.image_size == 0 {
            return Err(Error::config("preprocess.image_size must be at least 1"));
        }
        if !(self.preprocess.std > 0.0) {
            return Err(Error::config(format!(
                "preprocess.std must be positive, got {}",
                self.preprocess.std
            )));
        }
        Ok(())
    }

    /// Loader configuration reading every item of `split` once per class.
    pub fn loader_config(&self, split: Split, shuffle: bool) -> EpisodeLoaderConfig {
        EpisodeLoaderConfig::default()
            .split(split)
            .num_per_class(self.episode.per_class(split))
            .shuffle(shuffle)
            .rotation(self.preprocess.rotation)
            .image_size(self.preprocess.image_size)
            .normalize(self.preprocess.mean, self.preprocess.std)
            .num_workers(self.preprocess.num_workers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_glyph_setup() {
        let cfg = ExperimentConfig::default();
        assert_eq!(cfg.catalog.num_train, 1200);
        assert_eq!(cfg.catalog.seed, 1);
        assert_eq!(cfg.episode.required_per_class(), 20);
        assert_eq!(cfg.preprocess.image_size, 28);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let cfg = ExperimentConfig::from_json_str(
            r#"{ "root": "/data/glyphs", "episode": { "num_classes": 20 } }"#,
        )
        .unwrap();
        assert_eq!(cfg.root, PathBuf::from("/data/glyphs"));
        assert_eq!(cfg.episode.num_classes, 20);
        assert_eq!(cfg.episode.train_k, 1);
        assert_eq!(cfg.catalog, CatalogConfig::default());
    }

    #[test]
    fn invalid_values_rejected() {
        let err = ExperimentConfig::from_json_str(r#"{ "episode": { "num_classes": 0 } }"#)
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        let err = ExperimentConfig::from_json_str(r#"{ "preprocess": { "std": 0.0 } }"#)
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        let err = ExperimentConfig::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn loader_config_uses_split_size() {
        let mut cfg = ExperimentConfig::default();
        cfg.preprocess.rotation = 90.0;
        let lc = cfg.loader_config(Split::Test, false);
        assert_eq!(lc.num_per_class, 19);
        assert_eq!(lc.split, Split::Test);
        assert!(!lc.shuffle);
        assert_eq!(lc.rotation, 90.0);
    }

    #[test]
    fn reads_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("experiment.json");
        std::fs::write(&path, r#"{ "catalog": { "num_train": 30 } }"#).unwrap();
        let cfg = ExperimentConfig::from_json_file(&path).unwrap();
        assert_eq!(cfg.catalog.num_train, 30);
        assert_eq!(cfg.catalog.seed, 1);

        let err = ExperimentConfig::from_json_file(dir.path().join("missing.json")).unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }
}
