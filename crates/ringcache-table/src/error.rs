use thiserror::Error;

/// Validation failures at table construction time.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    #[error("bucket count {0} must be a power of two (bucket index is computed by masking)")]
    BucketCountNotPowerOfTwo(usize),
    #[error("bucket count must be nonzero")]
    ZeroBuckets,
}
