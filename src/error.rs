use thiserror::Error;

/// Boxed error raised by a caller-supplied function.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors returned by the clustering algorithms and value functions in this crate.
#[derive(Debug, Error)]
pub enum Error {
    /// A cluster suggestion was requested for a cluster without members.
    #[error("cluster is empty")]
    EmptyCluster,

    /// Frequency counts must be positive.
    #[error("invalid count {count}: must be at least 1")]
    InvalidCount {
        /// The rejected count.
        count: usize,
    },

    /// Invalid parameter value.
    #[error("invalid parameter {name}: {message}")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Human-readable explanation.
        message: &'static str,
    },

    /// The worker pool for parallel key computation could not be built.
    #[error("thread pool: {0}")]
    ThreadPool(String),

    /// Error raised by a key function, tokenizer, or similarity function.
    #[error(transparent)]
    Function(BoxError),
}

impl Error {
    /// Wrap an arbitrary error raised inside a value function.
    pub fn function<E>(err: E) -> Self
    where
        E: Into<BoxError>,
    {
        Self::Function(err.into())
    }
}

/// Result type used by this crate.
pub type Result<T> = std::result::Result<T, Error>;
