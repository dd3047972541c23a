// FolderCatalog — discover character folders and split them into pools
//
// Expects a two-level class hierarchy:
//
//   root/
//     Alphabet_of_the_Magi/        <- family
//       character01/               <- character (one class)
//         0709_01.png
//         ...
//     Greek/
//       ...
//
// Every character folder under every family is one class. Discovery
// flattens them, shuffles once with a seeded generator, and cuts the list at
// `num_train`: the prefix is the meta-train pool, the suffix the meta-val pool.
//
// Directory listings are sorted by name before the shuffle, so the result
// depends only on the directory contents and the seed, never on the order
// the filesystem happens to enumerate entries in.

use std::fmt;
use std::path::{Path, PathBuf};

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use episodic_core::{rng, Error, Result};

use crate::image_loader::is_image;

/// Number of character folders in the meta-train pool by default.
pub const DEFAULT_NUM_TRAIN: usize = 1200;

/// Stable identifier of a character folder.
///
/// The key is the folder's position in the sorted discovery listing, so it is
/// the same for every process that scans the same directory snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FolderKey(pub u32);

impl fmt::Display for FolderKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One class: a character directory holding that character's images.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CharacterFolder {
    key: FolderKey,
    family: String,
    character: String,
    path: PathBuf,
}

impl CharacterFolder {
    /// Create a folder record directly (useful for pools built by hand).
    pub fn new(key: FolderKey, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let character = file_name(&path);
        let family = path.parent().map(file_name).unwrap_or_default();
        Self {
            key,
            family,
            character,
            path,
        }
    }

    pub fn key(&self) -> FolderKey {
        self.key
    }

    /// Name of the family (alphabet) directory.
    pub fn family(&self) -> &str {
        &self.family
    }

    /// Name of the character directory.
    pub fn character(&self) -> &str {
        &self.character
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Image files directly inside this folder, sorted by path.
    pub fn image_files(&self) -> Result<Vec<PathBuf>> {
        let entries = std::fs::read_dir(&self.path).map_err(|e| Error::io(&self.path, e))?;
        let mut files = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| Error::io(&self.path, e))?;
            let path = entry.path();
            if path.is_file() && is_image(&path) {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Which of the two pools to draw episodes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PoolKind {
    MetaTrain,
    MetaVal,
}

/// Configuration for [`FolderCatalog::discover`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Size of the meta-train pool; the remaining folders form the meta-val pool.
    pub num_train: usize,
    /// Seed for the one-off shuffle of the flattened folder list.
    pub seed: u64,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            num_train: DEFAULT_NUM_TRAIN,
            seed: rng::DEFAULT_SEED,
        }
    }
}

impl CatalogConfig {
    pub fn num_train(mut self, n: usize) -> Self {
        self.num_train = n;
        self
    }

    pub fn seed(mut self, s: u64) -> Self {
        self.seed = s;
        self
    }
}

/// The discovered class folders, split into meta-train and meta-val pools.
#[derive(Debug, Clone)]
pub struct FolderCatalog {
    root: PathBuf,
    train: Vec<CharacterFolder>,
    val: Vec<CharacterFolder>,
}

impl FolderCatalog {
    /// Scan `root` and split with a generator seeded from `config.seed`.
    pub fn discover<P: AsRef<Path>>(root: P, config: &CatalogConfig) -> Result<Self> {
        let mut rng = rng::seeded(config.seed);
        Self::discover_with_rng(root, config.num_train, &mut rng)
    }

    /// Scan `root` and split using the caller's generator.
    pub fn discover_with_rng<P, R>(root: P, num_train: usize, rng: &mut R) -> Result<Self>
    where
        P: AsRef<Path>,
        R: Rng + ?Sized,
    {
        let root = root.as_ref().to_path_buf();
        let folders = scan_character_folders(&root)?;
        let catalog = Self::from_folders(root, folders, num_train, rng)?;

        if catalog.val.is_empty() {
            tracing::warn!(
                root = %catalog.root.display(),
                num_train,
                "every character folder went to the meta-train pool; meta-val pool is empty"
            );
        }
        tracing::debug!(
            root = %catalog.root.display(),
            train = catalog.train.len(),
            val = catalog.val.len(),
            "discovered character folders"
        );

        Ok(catalog)
    }

    /// Build a catalog from folders that are already known, without touching
    /// the filesystem. The list is shuffled and split exactly as in `discover`.
    pub fn from_folders<R: Rng + ?Sized>(
        root: impl Into<PathBuf>,
        mut folders: Vec<CharacterFolder>,
        num_train: usize,
        rng: &mut R,
    ) -> Result<Self> {
        if folders.len() < num_train {
            return Err(Error::EmptyPool {
                requested: num_train,
                available: folders.len(),
            });
        }
        folders.shuffle(rng);
        let val = folders.split_off(num_train);
        Ok(Self {
            root: root.into(),
            train: folders,
            val,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn train_pool(&self) -> &[CharacterFolder] {
        &self.train
    }

    pub fn val_pool(&self) -> &[CharacterFolder] {
        &self.val
    }

    pub fn pool(&self, kind: PoolKind) -> &[CharacterFolder] {
        match kind {
            PoolKind::MetaTrain => &self.train,
            PoolKind::MetaVal => &self.val,
        }
    }

    /// Total number of character folders in both pools.
    pub fn len(&self) -> usize {
        self.train.len() + self.val.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Consume the catalog, returning `(train_pool, val_pool)`.
    pub fn into_pools(self) -> (Vec<CharacterFolder>, Vec<CharacterFolder>) {
        (self.train, self.val)
    }
}

/// Sorted subdirectories of `dir`.
fn sorted_subdirs(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(dir).map_err(|e| Error::io(dir, e))?;
    let mut dirs = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| Error::io(dir, e))?;
        let path = entry.path();
        if path.is_dir() {
            dirs.push(path);
        }
    }
    dirs.sort();
    Ok(dirs)
}

/// Flatten `root/<family>/<character>` into keyed folder records.
fn scan_character_folders(root: &Path) -> Result<Vec<CharacterFolder>> {
    if !root.exists() {
        return Err(Error::NotFound {
            path: root.to_path_buf(),
            reason: "path does not exist".to_string(),
        });
    }
    if !root.is_dir() {
        return Err(Error::NotFound {
            path: root.to_path_buf(),
            reason: "not a directory".to_string(),
        });
    }

    let families = sorted_subdirs(root)?;
    if families.is_empty() {
        return Err(Error::NotFound {
            path: root.to_path_buf(),
            reason: "no family directories".to_string(),
        });
    }

    let mut folders = Vec::new();
    for family in &families {
        for character in sorted_subdirs(family)? {
            let key = FolderKey(folders.len() as u32);
            folders.push(CharacterFolder::new(key, character));
        }
    }
    Ok(folders)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::fs;

    /// `families` families × `chars` characters, each with one empty .png.
    fn make_tree(families: usize, chars: usize) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        for f in 0..families {
            for c in 0..chars {
                let d = dir
                    .path()
                    .join(format!("family{f:02}"))
                    .join(format!("character{c:02}"));
                fs::create_dir_all(&d).unwrap();
                fs::write(d.join("0001_01.png"), b"").unwrap();
            }
        }
        dir
    }

    #[test]
    fn split_sizes_and_disjointness() {
        let tree = make_tree(4, 5);
        let cat = FolderCatalog::discover(tree.path(), &CatalogConfig::default().num_train(12))
            .unwrap();
        assert_eq!(cat.train_pool().len(), 12);
        assert_eq!(cat.val_pool().len(), 8);
        assert_eq!(cat.len(), 20);

        let train: HashSet<_> = cat.train_pool().iter().map(|f| f.key()).collect();
        let val: HashSet<_> = cat.val_pool().iter().map(|f| f.key()).collect();
        assert!(train.is_disjoint(&val));
        assert_eq!(train.union(&val).count(), 20);
    }

    #[test]
    fn discovery_is_reproducible() {
        let tree = make_tree(3, 4);
        let cfg = CatalogConfig::default().num_train(7);
        let a = FolderCatalog::discover(tree.path(), &cfg).unwrap();
        let b = FolderCatalog::discover(tree.path(), &cfg).unwrap();
        assert_eq!(a.train_pool(), b.train_pool());
        assert_eq!(a.val_pool(), b.val_pool());
    }

    #[test]
    fn non_directories_are_skipped() {
        let tree = make_tree(2, 2);
        fs::write(tree.path().join("README.txt"), b"families").unwrap();
        fs::write(tree.path().join("family00").join("index.csv"), b"x").unwrap();
        let cat =
            FolderCatalog::discover(tree.path(), &CatalogConfig::default().num_train(2)).unwrap();
        assert_eq!(cat.len(), 4);
        for f in cat.train_pool().iter().chain(cat.val_pool()) {
            assert!(f.family().starts_with("family"));
            assert!(f.character().starts_with("character"));
        }
    }

    #[test]
    fn missing_root_is_not_found() {
        let tree = make_tree(1, 1);
        let err = FolderCatalog::discover(tree.path().join("nope"), &CatalogConfig::default())
            .unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
    }

    #[test]
    fn root_without_families_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("loose.png"), b"").unwrap();
        let err = FolderCatalog::discover(dir.path(), &CatalogConfig::default()).unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
    }

    #[test]
    fn too_few_folders_is_empty_pool() {
        let tree = make_tree(2, 2);
        let err = FolderCatalog::discover(tree.path(), &CatalogConfig::default()).unwrap_err();
        assert!(matches!(
            err,
            Error::EmptyPool {
                requested: DEFAULT_NUM_TRAIN,
                available: 4
            }
        ));
    }

    #[test]
    fn exact_num_train_leaves_val_empty() {
        let tree = make_tree(2, 3);
        let cat =
            FolderCatalog::discover(tree.path(), &CatalogConfig::default().num_train(6)).unwrap();
        assert_eq!(cat.train_pool().len(), 6);
        assert!(cat.val_pool().is_empty());
    }

    #[test]
    fn image_files_are_filtered_and_sorted() {
        let dir = tempfile::tempdir().unwrap();
        let ch = dir.path().join("Greek").join("character03");
        fs::create_dir_all(&ch).unwrap();
        for name in ["b.png", "a.png", "Thumbs.db", "c.JPG"] {
            fs::write(ch.join(name), b"").unwrap();
        }
        fs::create_dir(ch.join("nested.png")).unwrap();

        let folder = CharacterFolder::new(FolderKey(0), &ch);
        assert_eq!(folder.family(), "Greek");
        assert_eq!(folder.character(), "character03");
        let names: Vec<_> = folder
            .image_files()
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.png", "b.png", "c.JPG"]);
    }
}
