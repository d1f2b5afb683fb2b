//! ChainMap: bucket table of chains with load-factor driven growth.

use core::fmt;
use core::slice;

use crate::chain::{Arena, Chain, ChainIter};
use crate::digest::{Digest, Fnv1a};
use crate::error::{DecodeError, Error, Result};

/// Growth is triggered before an insert once `len >= capacity * MAX_LOAD_FACTOR`.
pub const MAX_LOAD_FACTOR: f64 = 0.75;

/// Bucket count used by `ChainMap::default()`.
pub const DEFAULT_CAPACITY: usize = 16;

// Upper bound on arena slots reserved up front while decoding; the header's
// entry count is untrusted.
const DECODE_PREALLOC_LIMIT: usize = 1 << 16;

/// Separate-chaining map from `String` keys to `i32` values.
///
/// Every entry with key `k` lives in the chain at
/// `digest(k) % capacity`. The map doubles its bucket count before an insert
/// whenever the load factor has already reached [`MAX_LOAD_FACTOR`]; it never
/// shrinks.
///
/// Single writer: the map has no internal locking. Share it across threads
/// only behind a `Mutex` or similar.
#[derive(Clone)]
pub struct ChainMap<D = Fnv1a> {
    digest: D,
    buckets: Vec<Chain>,
    arena: Arena, // owns every node of every chain
}

impl ChainMap<Fnv1a> {
    /// Create an empty map with `capacity` buckets. A capacity of zero is
    /// raised to one.
    pub fn new(capacity: usize) -> Self {
        Self::with_digest(capacity, Fnv1a)
    }
}

impl Default for ChainMap<Fnv1a> {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[inline]
fn bucket_index<D: Digest>(digest: &D, key: &str, capacity: usize) -> usize {
    digest.digest(key.as_bytes()) as usize % capacity
}

impl<D: Digest> ChainMap<D> {
    pub fn with_digest(capacity: usize, digest: D) -> Self {
        Self {
            digest,
            buckets: vec![Chain::new(); capacity.max(1)],
            arena: Arena::with_key(),
        }
    }

    /// Empty table for the decoders: exact capacity, bounded preallocation.
    pub(crate) fn for_decode(capacity: usize, digest: D, expected_len: usize) -> Self {
        Self {
            digest,
            buckets: vec![Chain::new(); capacity.max(1)],
            arena: Arena::with_capacity_and_key(expected_len.min(DECODE_PREALLOC_LIMIT)),
        }
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    /// Number of buckets.
    pub fn capacity(&self) -> usize {
        self.buckets.len()
    }

    pub fn load_factor(&self) -> f64 {
        self.len() as f64 / self.capacity() as f64
    }

    pub fn digest(&self) -> &D {
        &self.digest
    }

    fn bucket_of(&self, key: &str) -> usize {
        bucket_index(&self.digest, key, self.buckets.len())
    }

    fn should_grow(&self) -> bool {
        self.len() as f64 >= self.capacity() as f64 * MAX_LOAD_FACTOR
    }

    /// Insert or overwrite. Returns the previous value when `key` was present.
    ///
    /// The growth check runs first, so even an overwrite may double the
    /// table when it is already at the threshold.
    pub fn insert(&mut self, key: impl Into<String>, value: i32) -> Option<i32> {
        if self.should_grow() {
            self.grow();
        }
        let key = key.into();
        let idx = self.bucket_of(&key);
        let chain = &mut self.buckets[idx];
        if let Some(k) = chain.find(&self.arena, &key) {
            return Some(core::mem::replace(&mut self.arena[k].value, value));
        }
        chain.push_front(&mut self.arena, key, value);
        None
    }

    /// Double the bucket count and relink every node into its new chain.
    fn grow(&mut self) {
        let new_capacity = self.buckets.len() * 2;
        log::trace!(
            "growing chain map from {} to {} buckets ({} entries)",
            self.buckets.len(),
            new_capacity,
            self.len()
        );
        let mut buckets = vec![Chain::new(); new_capacity];
        for chain in core::mem::take(&mut self.buckets) {
            let mut cursor = chain.head();
            while let Some(node) = cursor {
                cursor = Chain::next(&self.arena, node);
                let idx = bucket_index(&self.digest, &self.arena[node].key, new_capacity);
                buckets[idx].link_front(&mut self.arena, node);
            }
        }
        self.buckets = buckets;
    }

    /// Remove `key`, returning its value. Absent keys are a no-op.
    pub fn remove(&mut self, key: &str) -> Option<i32> {
        let idx = self.bucket_of(key);
        self.buckets[idx]
            .unlink(&mut self.arena, key)
            .map(|node| node.value)
    }

    /// Value for `key`, or [`Error::KeyNotFound`].
    pub fn find(&self, key: &str) -> Result<i32> {
        self.get(key).ok_or(Error::KeyNotFound)
    }

    pub fn get(&self, key: &str) -> Option<i32> {
        let idx = self.bucket_of(key);
        self.buckets[idx]
            .find(&self.arena, key)
            .map(|k| self.arena[k].value)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut i32> {
        let idx = self.bucket_of(key);
        let k = self.buckets[idx].find(&self.arena, key)?;
        self.arena.get_mut(k).map(|node| &mut node.value)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        let idx = self.bucket_of(key);
        self.buckets[idx].find(&self.arena, key).is_some()
    }

    /// Entries in bucket order, then chain order. The order is an artifact of
    /// the digest and capacity and must not be relied upon.
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            arena: &self.arena,
            buckets: self.buckets.iter(),
            chain: None,
            remaining: self.len(),
        }
    }

    pub fn keys(&self) -> Keys<'_> {
        Keys { inner: self.iter() }
    }

    pub fn all_keys(&self) -> Vec<String> {
        self.keys().map(str::to_owned).collect()
    }

    /// Every key concatenated without separators, in iteration order.
    pub fn keys_concat(&self) -> String {
        self.keys().collect()
    }

    /// Decoder path: append to the tail of the key's chain without the growth
    /// check, so a decoded stream re-encodes in its original order.
    pub(crate) fn place(&mut self, key: String, value: i32) -> core::result::Result<(), DecodeError> {
        let idx = self.bucket_of(&key);
        let chain = &mut self.buckets[idx];
        if chain.find(&self.arena, &key).is_some() {
            return Err(DecodeError::DuplicateKey(key));
        }
        chain.push_back(&mut self.arena, key, value);
        Ok(())
    }

    /// Panics if any structural invariant is broken.
    #[cfg(test)]
    pub(crate) fn assert_invariants(&self) {
        assert!(!self.buckets.is_empty(), "capacity must stay positive");
        let mut seen = std::collections::HashSet::new();
        let mut total = 0;
        for (i, chain) in self.buckets.iter().enumerate() {
            total += chain.len(&self.arena);
            for node in chain.iter(&self.arena) {
                assert_eq!(self.bucket_of(&node.key), i, "{:?} in wrong bucket", node.key);
                assert!(seen.insert(node.key.clone()), "duplicate key {:?}", node.key);
            }
        }
        assert_eq!(total, self.len(), "chain lengths must sum to len");
    }
}

impl<D: Digest> fmt::Display for ChainMap<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, chain) in self.buckets.iter().enumerate() {
            write!(f, "[{i}]:")?;
            for (n, node) in chain.iter(&self.arena).enumerate() {
                let sep = if n == 0 { " " } else { ", " };
                write!(f, "{sep}{} -> {}", node.key, node.value)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

impl<D: Digest> fmt::Debug for ChainMap<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K: Into<String>, D: Digest> Extend<(K, i32)> for ChainMap<D> {
    fn extend<T: IntoIterator<Item = (K, i32)>>(&mut self, iter: T) {
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}

impl<'a, D: Digest> IntoIterator for &'a ChainMap<D> {
    type Item = (&'a str, i32);
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over `(key, value)` pairs of a `ChainMap`.
pub struct Iter<'a> {
    arena: &'a Arena,
    buckets: slice::Iter<'a, Chain>,
    chain: Option<ChainIter<'a>>,
    remaining: usize,
}

impl<'a> Iterator for Iter<'a> {
    type Item = (&'a str, i32);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(node) = self.chain.as_mut().and_then(Iterator::next) {
                self.remaining -= 1;
                return Some((node.key.as_str(), node.value));
            }
            let chain = self.buckets.next()?;
            self.chain = Some(chain.iter(self.arena));
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for Iter<'_> {}

/// Iterator over the keys of a `ChainMap`.
pub struct Keys<'a> {
    inner: Iter<'a>,
}

impl<'a> Iterator for Keys<'a> {
    type Item = &'a str;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(k, _)| k)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for Keys<'_> {}
