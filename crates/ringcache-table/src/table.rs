use std::hash::{BuildHasher, Hasher};
use std::sync::Arc;

use ahash::RandomState;
use arc_swap::ArcSwapOption;
use bytes::Bytes;
use ringcache_buf::Chain;
use ringcache_protocol::RequestHeader;
use spin::Mutex;

use tracing::debug;

use crate::error::ConfigError;
use crate::response::GetResponse;

/// One bucket-chain link. Readers walk `next` lock-free; only a writer
/// holding `Table::write_lock` ever publishes a new node or unlinks one.
struct Node {
    key: Bytes,
    response: GetResponse,
    next: ArcSwapOption<Node>,
}

/// A found entry, handed back by [`Table::find`]. Callers need both the
/// key's length (to know whether to echo it back on a GETK hit) and the
/// `GetResponse` to clone the current cached body out of.
pub struct Entry {
    pub keylen: usize,
    pub response: Arc<Node>,
}

impl Entry {
    pub fn binary(&self) -> Arc<Chain> {
        self.response.response.binary()
    }
}

/// Concurrent keyed cache table with RCU-style read semantics.
///
/// Lookups never take a lock: each bucket head is an `ArcSwapOption`, and
/// walking `next` pointers only ever clones `Arc`s that are already kept
/// alive by whoever is holding them. Mutations (insert, clear) serialize
/// on a single `spin::Mutex` guarding the whole table — a known
/// contention point, accepted in exchange for simplicity; per-bucket
/// locks would be a reasonable future optimization.
pub struct Table {
    buckets: Vec<ArcSwapOption<Node>>,
    write_lock: Mutex<()>,
    mask: usize,
    hasher: RandomState,
}

impl Table {
    pub fn new(num_buckets: usize) -> Result<Table, ConfigError> {
        if num_buckets == 0 {
            return Err(ConfigError::ZeroBuckets);
        }
        if !num_buckets.is_power_of_two() {
            return Err(ConfigError::BucketCountNotPowerOfTwo(num_buckets));
        }
        let mut buckets = Vec::with_capacity(num_buckets);
        buckets.resize_with(num_buckets, ArcSwapOption::empty);
        Ok(Table { buckets, write_lock: Mutex::new(()), mask: num_buckets - 1, hasher: RandomState::new() })
    }

    fn bucket_index(&self, key: &[u8]) -> usize {
        let mut h = self.hasher.build_hasher();
        h.write(key);
        (h.finish() as usize) & self.mask
    }

    fn find_in_bucket(&self, idx: usize, key: &[u8]) -> Option<Arc<Node>> {
        let mut cur = self.buckets[idx].load_full();
        while let Some(node) = cur {
            if node.key.as_ref() == key {
                return Some(node);
            }
            cur = node.next.load_full();
        }
        None
    }

    /// Lock-free lookup.
    pub fn find(&self, key: &[u8]) -> Option<Entry> {
        let idx = self.bucket_index(key);
        self.find_in_bucket(idx, key).map(|node| Entry { keylen: node.key.len(), response: node })
    }

    /// Insert-or-update for SET/SETQ. Double-check pattern: an optimistic
    /// lock-free `find` first, and only on a miss do we take the write
    /// lock and re-check before allocating a node — concurrent SETs
    /// racing the same new key still converge on a single node, the
    /// losers falling through to the swap path below.
    pub fn set(&self, key: Bytes, message: &Chain, header: &RequestHeader) {
        if let Some(node) = self.find_in_bucket(self.bucket_index(&key), &key) {
            node.response.swap(ringcache_protocol::cached_response_view(message, header));
            return;
        }

        let guard = self.write_lock.lock();
        let idx = self.bucket_index(&key);
        if let Some(node) = self.find_in_bucket(idx, &key) {
            drop(guard);
            node.response.swap(ringcache_protocol::cached_response_view(message, header));
            return;
        }

        let head = self.buckets[idx].load_full();
        let node =
            Arc::new(Node { key, response: GetResponse::new(message, header), next: ArcSwapOption::from(head) });
        self.buckets[idx].store(Some(node));
    }

    /// FLUSH: drop every entry. Readers already holding a `GetResponse`
    /// clone, or mid-traversal of a bucket chain when `clear` runs,
    /// observe no torn state — they are walking `Arc`s they already own.
    pub fn clear(&self) {
        let _guard = self.write_lock.lock();
        for bucket in &self.buckets {
            bucket.store(None);
        }
        debug!(buckets = self.buckets.len(), "table flushed");
    }

    pub fn num_buckets(&self) -> usize {
        self.buckets.len()
    }
}
