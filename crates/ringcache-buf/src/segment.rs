use bytes::Bytes;

/// One node of a [`crate::Chain`]: a cursor window `start..end` over a
/// `Bytes` allocation.
///
/// The allocation (`storage`) may be shared with other segments — cloning a
/// segment (via [`Segment::split_to`] or `Clone`) bumps `Bytes`'s internal
/// refcount, it never copies the underlying payload. Keeping `storage`
/// separate from the live `start..end` window (rather than re-slicing
/// destructively) is what lets [`Segment::retreat`] widen the window back
/// out after an [`Segment::advance`] without needing the original bytes
/// back from anywhere else.
#[derive(Clone)]
pub struct Segment {
    storage: Bytes,
    start: usize,
    end: usize,
}

impl Segment {
    /// Wraps a freshly-read buffer as a single segment spanning its whole
    /// length.
    pub fn from_bytes(storage: Bytes) -> Self {
        let end = storage.len();
        Self { storage, start: 0, end }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.storage[self.start..self.end]
    }

    /// The live window as an owning `Bytes` view — `Bytes::slice` bumps the
    /// shared allocation's refcount rather than copying, so this is as
    /// zero-copy as [`Segment::split_to`]. Used by the TCP transport to
    /// queue outbound bytes without detaching them from the chain first.
    #[inline]
    pub fn as_bytes(&self) -> Bytes {
        self.storage.slice(self.start..self.end)
    }

    /// Moves the read cursor forward by `n` bytes, shrinking the live
    /// window. `n` must not exceed `self.len()` — out-of-bounds advance is a
    /// programming error and panics.
    #[inline]
    pub fn advance(&mut self, n: usize) {
        assert!(n <= self.len(), "advance({n}) past segment end (len={})", self.len());
        self.start += n;
    }

    /// Moves the read cursor backward by `n` bytes, widening the live
    /// window back toward the start of the underlying storage. `n` must not
    /// exceed the number of bytes already consumed from the front.
    #[inline]
    pub fn retreat(&mut self, n: usize) {
        assert!(n <= self.start, "retreat({n}) before segment storage start");
        self.start -= n;
    }

    /// Shrinks the live window by `n` bytes from the tail.
    #[inline]
    pub fn trim_end(&mut self, n: usize) {
        assert!(n <= self.len(), "trim_end({n}) exceeds segment len ({})", self.len());
        self.end -= n;
    }

    /// Splits off the first `at` bytes of the live window as a new segment
    /// sharing this one's storage (a refcount bump, not a copy), and
    /// advances `self` past them.
    pub fn split_to(&mut self, at: usize) -> Segment {
        assert!(at <= self.len(), "split_to({at}) exceeds segment len ({})", self.len());
        let prefix = Segment { storage: self.storage.clone(), start: self.start, end: self.start + at };
        self.start += at;
        prefix
    }
}

impl std::fmt::Debug for Segment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Segment").field("len", &self.len()).finish()
    }
}
