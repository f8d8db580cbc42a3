//! The one failure mode of insertion.

use std::error;
use std::fmt;

/// Returned by [`ArrowTable::insert`](crate::ArrowTable::insert) when the
/// table has no free slot to place a new entry into.
///
/// The table is left byte-for-byte unchanged, and the key and value the
/// caller passed in are handed straight back rather than dropped.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Full<K, V> {
    pub key: K,
    pub value: V,
}

impl<K, V> Full<K, V> {
    pub(crate) fn new(key: K, value: V) -> Self {
        Full { key, value }
    }

    /// Split back into the key and value that failed to insert.
    pub fn into_inner(self) -> (K, V) {
        (self.key, self.value)
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for Full<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Full")
            .field("key", &self.key)
            .field("value", &self.value)
            .finish()
    }
}

impl<K, V> fmt::Display for Full<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "arrow table is full, no free slot to insert into")
    }
}

impl<K: fmt::Debug, V: fmt::Debug> error::Error for Full<K, V> {}
