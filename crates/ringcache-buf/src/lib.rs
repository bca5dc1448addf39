//! Zero-copy buffer-chain abstraction.
//!
//! A [`Chain`] represents a TCP receive stream (or a message sliced out of
//! one) as an ordered sequence of [`Segment`]s. Each segment is a cursor
//! window (`start..end`) over a `bytes::Bytes` allocation that may be shared
//! with other segments — cloning a segment or splitting a chain bumps a
//! refcount, it never copies payload bytes. This lets a cached SET request
//! be replayed as a GET response without touching the original bytes.

mod chain;
mod segment;

pub use chain::Chain;
pub use segment::Segment;
