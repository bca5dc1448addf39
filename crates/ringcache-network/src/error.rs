use ringcache_protocol::DecodeError;
use thiserror::Error;

/// Failures surfaced from a single connection's poll loop.
/// These are always per-session: the worker logs and tears the one
/// connection down without affecting any other session sharing its
/// thread or the cache table.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("protocol error: {0}")]
    Protocol(#[from] DecodeError),
}
