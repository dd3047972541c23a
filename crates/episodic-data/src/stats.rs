//! Pool statistics and up-front episode feasibility checks.
//!
//! `EpisodeSpec::build` fails when it happens to select a folder that cannot
//! supply `train_k + test_k` images. Checking a pool once before training
//! turns that into a configuration error instead of a mid-run failure.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use episodic_core::Result;

use crate::catalog::{CharacterFolder, FolderKey};

/// Image counts across a pool of character folders.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolSummary {
    pub folders: usize,
    pub total_images: usize,
    pub min_images: usize,
    pub max_images: usize,
}

impl PoolSummary {
    pub fn mean_images(&self) -> f64 {
        if self.folders == 0 {
            0.0
        } else {
            self.total_images as f64 / self.folders as f64
        }
    }
}

/// A folder that holds fewer images than an episode needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShortFolder {
    pub key: FolderKey,
    pub path: PathBuf,
    pub images: usize,
}

/// Result of [`validate_pool`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolReport {
    pub summary: PoolSummary,
    pub required: usize,
    pub short: Vec<ShortFolder>,
}

impl PoolReport {
    /// Whether every folder can host an episode of the checked shape.
    pub fn is_ok(&self) -> bool {
        self.short.is_empty()
    }
}

/// Count the images of every folder in `pool`.
pub fn summarize_pool(pool: &[CharacterFolder]) -> Result<PoolSummary> {
    let counts = pool
        .iter()
        .map(|f| f.image_files().map(|files| files.len()))
        .collect::<Result<Vec<_>>>()?;
    Ok(summary_from_counts(&counts))
}

fn summary_from_counts(counts: &[usize]) -> PoolSummary {
    PoolSummary {
        folders: counts.len(),
        total_images: counts.iter().sum(),
        min_images: counts.iter().copied().min().unwrap_or(0),
        max_images: counts.iter().copied().max().unwrap_or(0),
    }
}

/// Check that every folder in `pool` holds at least `required` images
/// (`train_k + test_k` for the episodes you intend to build).
pub fn validate_pool(pool: &[CharacterFolder], required: usize) -> Result<PoolReport> {
    let mut counts = Vec::with_capacity(pool.len());
    let mut short = Vec::new();
    for folder in pool {
        let images = folder.image_files()?.len();
        counts.push(images);
        if images < required {
            short.push(ShortFolder {
                key: folder.key(),
                path: folder.path().to_path_buf(),
                images,
            });
        }
    }

    if !short.is_empty() {
        tracing::warn!(
            short = short.len(),
            folders = pool.len(),
            required,
            "some character folders cannot supply a full episode"
        );
    }

    Ok(PoolReport {
        summary: summary_from_counts(&counts),
        required,
        short,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn make_pool(counts: &[usize]) -> (tempfile::TempDir, Vec<CharacterFolder>) {
        let dir = tempfile::tempdir().unwrap();
        let mut pool = Vec::new();
        for (c, &n) in counts.iter().enumerate() {
            let d = dir.path().join("family").join(format!("character{c:02}"));
            fs::create_dir_all(&d).unwrap();
            for i in 0..n {
                fs::write(d.join(format!("{i}.png")), b"").unwrap();
            }
            pool.push(CharacterFolder::new(FolderKey(c as u32), d));
        }
        (dir, pool)
    }

    #[test]
    fn summary_counts() {
        let (_dir, pool) = make_pool(&[20, 18, 20, 2]);
        let s = summarize_pool(&pool).unwrap();
        assert_eq!(s.folders, 4);
        assert_eq!(s.total_images, 60);
        assert_eq!(s.min_images, 2);
        assert_eq!(s.max_images, 20);
        assert!((s.mean_images() - 15.0).abs() < 1e-12);
    }

    #[test]
    fn empty_pool_summary() {
        let s = summarize_pool(&[]).unwrap();
        assert_eq!(s, PoolSummary::default());
        assert_eq!(s.mean_images(), 0.0);
    }

    #[test]
    fn validate_lists_short_folders() {
        let (_dir, pool) = make_pool(&[20, 5, 20, 19]);
        let report = validate_pool(&pool, 20).unwrap();
        assert!(!report.is_ok());
        let keys: Vec<_> = report.short.iter().map(|s| s.key).collect();
        assert_eq!(keys, vec![FolderKey(1), FolderKey(3)]);
        assert_eq!(report.short[0].images, 5);

        assert!(validate_pool(&pool, 5).unwrap().is_ok());
    }

    #[test]
    fn report_serializes() {
        let (_dir, pool) = make_pool(&[3]);
        let report = validate_pool(&pool, 4).unwrap();
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["required"], 4);
        assert_eq!(json["summary"]["folders"], 1);
        assert_eq!(json["short"][0]["images"], 3);
    }
}
