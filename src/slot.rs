//! A single cell of the table's backing array.

/// One cell of the fixed-size storage array.
///
/// Unlike the classic open-addressing `Bucket` (which distinguishes `Empty`
/// from `Removed` to keep probe sequences intact under tombstoning), this
/// table never tombstones: delete always repairs the arrow so that a slot is
/// either occupied or genuinely free. There is no `Removed` state.
#[derive(Clone, Debug)]
pub enum Slot<K, V> {
    /// Never written, or emptied by a delete.
    Empty,
    /// Holds a live key-value pair, plus the key's cached hash.
    Occupied {
        key: K,
        hash: u64,
        value: V,
    },
}

impl<K, V> Slot<K, V> {
    #[inline]
    pub fn is_empty(&self) -> bool {
        matches!(self, Slot::Empty)
    }

    #[inline]
    pub fn is_occupied(&self) -> bool {
        matches!(self, Slot::Occupied { .. })
    }

    /// Does this slot hold `key` (checked by cached hash first, then `Eq`)?
    #[inline]
    pub fn matches(&self, hash: u64, key: &K) -> bool
    where
        K: PartialEq,
    {
        match self {
            Slot::Occupied { hash: h, key: k, .. } => *h == hash && k == key,
            Slot::Empty => false,
        }
    }

    #[inline]
    pub fn key(&self) -> Option<&K> {
        match self {
            Slot::Occupied { key, .. } => Some(key),
            Slot::Empty => None,
        }
    }

    #[inline]
    pub fn value(&self) -> Option<&V> {
        match self {
            Slot::Occupied { value, .. } => Some(value),
            Slot::Empty => None,
        }
    }

    #[inline]
    pub fn value_mut(&mut self) -> Option<&mut V> {
        match self {
            Slot::Occupied { value, .. } => Some(value),
            Slot::Empty => None,
        }
    }

    #[inline]
    pub fn hash(&self) -> Option<u64> {
        match self {
            Slot::Occupied { hash, .. } => Some(*hash),
            Slot::Empty => None,
        }
    }

    /// Replace this slot with `Empty`, returning whatever it held.
    #[inline]
    pub fn take(&mut self) -> Slot<K, V> {
        std::mem::replace(self, Slot::Empty)
    }
}

impl<K, V> Default for Slot<K, V> {
    fn default() -> Self {
        Slot::Empty
    }
}
