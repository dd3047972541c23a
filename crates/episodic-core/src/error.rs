use std::path::PathBuf;

/// All errors that can occur while building and loading episodes.
///
/// Catalog discovery, episode construction, sampler construction, and image
/// decoding all report through this one enum, so a training loop only needs
/// a single error type to decide whether to skip or abort an episode.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The dataset root is missing, is not a directory, or holds no families.
    #[error("dataset root not usable: {}: {reason}", path.display())]
    NotFound { path: PathBuf, reason: String },

    /// A pool holds fewer class folders than were asked for.
    #[error("folder pool too small: requested {requested}, only {available} available")]
    EmptyPool { requested: usize, available: usize },

    /// A selected class folder cannot supply `train_k + test_k` distinct files.
    #[error(
        "class folder {} has {available} images, episode needs {required}",
        folder.display()
    )]
    InsufficientSamples {
        folder: PathBuf,
        available: usize,
        required: usize,
    },

    /// More samples per class were requested than a class block holds.
    #[error("cannot draw {requested} samples per class without replacement from {available}")]
    SampleSize { requested: usize, available: usize },

    /// The image codec rejected a file. The codec's own error is kept as source.
    #[error("failed to decode {}: {source}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Filesystem failure while listing or reading.
    #[error("io error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Index past the end of a dataset.
    #[error("index {index} out of range for dataset of length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    /// Invalid parameters or an unreadable config file.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Generic message for cases not covered above.
    #[error("{0}")]
    Msg(String),
}

impl Error {
    /// Create an error from any string message.
    pub fn msg(s: impl Into<String>) -> Self {
        Error::Msg(s.into())
    }

    /// Create a configuration error from any string message.
    pub fn config(s: impl Into<String>) -> Self {
        Error::Config(s.into())
    }

    /// Wrap an `io::Error` with the path it happened at.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}

/// Convenience Result type used throughout episodic.
pub type Result<T> = std::result::Result<T, Error>;

/// Macro for early return with a formatted error message.
/// Usage: `bail!("something went wrong: {}", detail)`
#[macro_export]
macro_rules! bail {
    ($($arg:tt)*) => {
        return Err($crate::Error::Msg(format!($($arg)*)))
    };
}
