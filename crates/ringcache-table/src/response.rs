use std::sync::Arc;

use arc_swap::ArcSwap;
use ringcache_buf::Chain;
use ringcache_protocol::{RequestHeader, cached_response_view};

/// Per-entry cached body, atomically swappable.
///
/// A `Chain` isn't `Copy`, which rules out a seqlock-style version-counter
/// cell over an `UnsafeCell` — `arc_swap::ArcSwap` gives the same
/// lock-free publish/load semantics for a non-`Copy` payload instead.
pub struct GetResponse {
    binary_response: ArcSwap<Chain>,
}

impl GetResponse {
    /// Builds the cached `<0000, key, value>` view from the SET message
    /// that produced it.
    pub fn new(message: &Chain, header: &RequestHeader) -> Self {
        let view = cached_response_view(message, header);
        Self { binary_response: ArcSwap::new(Arc::new(view)) }
    }

    /// Atomically loads the stored reference and returns an independent,
    /// refcounted clone. Its lifetime does not depend on any later `swap`.
    pub fn binary(&self) -> Arc<Chain> {
        self.binary_response.load_full()
    }

    /// Atomically replaces the stored chain, returning the displaced one.
    ///
    /// Retiring the displaced reference needs no explicit grace period: a
    /// reader's `binary()` call clones the `Arc` before returning, so the
    /// old chain's storage stays alive for as long as any such clone is
    /// outstanding, however late the caller drops the `Arc` this function
    /// hands back. An in-flight reader that observed the old pointer but
    /// hasn't cloned out of it yet can never be torn by a concurrent swap.
    pub fn swap(&self, new: Chain) -> Arc<Chain> {
        self.binary_response.swap(Arc::new(new))
    }
}
