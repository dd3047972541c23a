// Dataset trait — unified interface for any indexed sample source

use episodic_core::Result;

/// A single sample: a decoded image and its episode label.
///
/// Pixels are stored flattened in `[C, H, W]` layout so they can be stacked
/// into a batch without reshaping.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    /// Pixel values (flattened).
    pub features: Vec<f64>,
    /// Shape of the feature array, e.g. `[1, 28, 28]` for a grayscale glyph.
    pub feature_shape: Vec<usize>,
    /// Dense class label within the episode (`0..num_classes`).
    pub label: usize,
}

impl Sample {
    /// `(channels, height, width)` if the sample is an image, `None` otherwise.
    pub fn chw(&self) -> Option<(usize, usize, usize)> {
        match self.feature_shape.as_slice() {
            &[c, h, w] => Some((c, h, w)),
            _ => None,
        }
    }
}

/// A dataset is an indexed collection of samples.
///
/// Implementations must be `Send + Sync` so the loader can decode from
/// several threads when parallel fetching is enabled.
pub trait Dataset: Send + Sync {
    /// Total number of samples in the dataset.
    fn len(&self) -> usize;

    /// Whether the dataset is empty.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Retrieve the sample at position `index`.
    ///
    /// Decoding failures and out-of-range indices are returned as errors,
    /// never replaced with placeholder data.
    fn get(&self, index: usize) -> Result<Sample>;

    /// The shape of a single feature sample (without batch dim).
    fn feature_shape(&self) -> &[usize];

    /// Optional human-readable name.
    fn name(&self) -> &str {
        "dataset"
    }
}
