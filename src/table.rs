//! The fixed-capacity arrow table itself.

use std::collections::hash_map::RandomState;
use std::fmt;
use std::hash::{BuildHasher, Hash, Hasher};

use slog::{o, trace, Discard, Logger};

use crate::arrow::Arrow;
use crate::error::Full;
use crate::slot::Slot;

/// A fixed-capacity open-addressed hash table that tracks, per home bucket,
/// the contiguous window of slots currently holding that bucket's keys.
///
/// Unlike `std::collections::HashMap`, `ArrowTable` never resizes: capacity
/// is fixed at construction, and [`insert`](ArrowTable::insert) into a full
/// table returns the key and value back to the caller instead of growing.
pub struct ArrowTable<K, V, S = RandomState> {
    slots: Vec<Slot<K, V>>,
    arrows: Vec<Arrow>,
    capacity: usize,
    len: usize,
    hash_builder: S,
    log: Logger,
}

impl<K, V> ArrowTable<K, V, RandomState> {
    /// Create a table with the given fixed capacity, using the standard
    /// library's default (randomized) hasher.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is `0`.
    pub fn new(capacity: usize) -> Self {
        Self::with_capacity_and_hasher(capacity, RandomState::new(), discard_logger())
    }

    /// Like [`new`](Self::new), but with structured logging of the
    /// displacement cascade and delete's forward repair wired to `logger`.
    pub fn with_logger(capacity: usize, logger: Logger) -> Self {
        Self::with_capacity_and_hasher(capacity, RandomState::new(), logger)
    }
}

impl<K, V, S: BuildHasher> ArrowTable<K, V, S> {
    /// Create a table with the given fixed capacity and a caller-supplied
    /// [`BuildHasher`], for keys that need deterministic or specialized
    /// hashing (the same use case `HashMap::with_hasher` serves).
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is `0`.
    pub fn with_hasher(capacity: usize, hash_builder: S) -> Self {
        Self::with_capacity_and_hasher(capacity, hash_builder, discard_logger())
    }

    /// Create a table with an explicit capacity, hasher, and logger.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is `0`.
    pub fn with_capacity_and_hasher(capacity: usize, hash_builder: S, logger: Logger) -> Self {
        assert!(capacity > 0, "ArrowTable capacity must be non-zero");
        ArrowTable {
            slots: (0..capacity).map(|_| Slot::Empty).collect(),
            arrows: vec![Arrow::EMPTY; capacity],
            capacity,
            len: 0,
            hash_builder,
            log: logger,
        }
    }

    /// The fixed capacity this table was constructed with.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// The number of key-value pairs currently stored.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Empty the table, in `O(capacity)`.
    pub fn clear(&mut self) {
        for slot in &mut self.slots {
            *slot = Slot::Empty;
        }
        for arrow in &mut self.arrows {
            *arrow = Arrow::EMPTY;
        }
        self.len = 0;
    }

    /// The `(start, end)` offset window currently stored for home bucket
    /// `home`. Exposed for introspection and testing; `search` and `insert`
    /// consult it internally and never need to go through this accessor.
    ///
    /// # Panics
    ///
    /// Panics if `home >= self.capacity()`.
    pub fn arrow(&self, home: usize) -> Arrow {
        self.arrows[home]
    }

    /// Iterate over the occupied entries, in underlying slot order.
    ///
    /// No ordering is guaranteed beyond "some order over the occupied
    /// slots"; in particular this is not insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.slots.iter().filter_map(|slot| match slot {
            Slot::Occupied { key, value, .. } => Some((key, value)),
            Slot::Empty => None,
        })
    }

    #[inline]
    fn hash_of(&self, key: &K) -> u64
    where
        K: Hash,
    {
        let mut hasher = self.hash_builder.build_hasher();
        key.hash(&mut hasher);
        hasher.finish()
    }

    /// The home bucket of a hash: `hash mod capacity`.
    #[inline]
    fn home(&self, hash: u64) -> usize {
        (hash % self.capacity as u64) as usize
    }

    /// The absolute slot index `offset` slots past `home`, wrapping.
    #[inline]
    fn wrap(&self, home: usize, offset: u32) -> usize {
        (home + offset as usize) % self.capacity
    }
}

impl<K: Hash + Eq, V, S: BuildHasher> ArrowTable<K, V, S> {
    /// Look up `key`, returning a reference to its value if present.
    pub fn get(&self, key: &K) -> Option<&V> {
        let idx = self.find(key)?;
        self.slots[idx].value()
    }

    /// Look up `key`, returning a mutable reference to its value if present.
    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        let idx = self.find(key)?;
        self.slots[idx].value_mut()
    }

    /// Does the table contain `key`?
    pub fn contains_key(&self, key: &K) -> bool {
        self.find(key).is_some()
    }

    /// The home bucket `key` maps to: `hash(key) mod capacity()`. Exposed
    /// for introspection and testing.
    pub fn home_of(&self, key: &K) -> usize {
        self.home(self.hash_of(key))
    }

    /// Scan `key`'s home window for a matching slot, returning its absolute
    /// index. This is the one piece of logic `get`, `get_mut`, `contains_key`,
    /// the update fast path of `insert`, and `remove` all share: visit only
    /// the home bucket's window, never the whole table.
    fn find(&self, key: &K) -> Option<usize> {
        let hash = self.hash_of(key);
        let home = self.home(hash);
        let arrow = self.arrows[home];
        for offset in arrow.start..arrow.end {
            let idx = self.wrap(home, offset);
            if self.slots[idx].matches(hash, key) {
                return Some(idx);
            }
        }
        None
    }

    /// Insert `key -> value`.
    ///
    /// If `key` is already present, its value is overwritten in place (the
    /// arrows are untouched) and the old value is returned. This succeeds
    /// even when the table is at capacity, since it consumes no new slot.
    ///
    /// If `key` is new and the table has no free slot, the table is left
    /// unchanged and `Err(Full { key, value })` hands the payload back.
    pub fn insert(&mut self, key: K, value: V) -> Result<Option<V>, Full<K, V>> {
        let hash = self.hash_of(&key);
        let home = self.home(hash);

        // Update fast path: scanning for a match never needs a free slot,
        // so this runs even when `len == capacity`.
        if !self.arrows[home].is_empty() {
            let arrow = self.arrows[home];
            for offset in arrow.start..arrow.end {
                let idx = self.wrap(home, offset);
                if self.slots[idx].matches(hash, &key) {
                    let old = self.slots[idx]
                        .value_mut()
                        .expect("slot matched by `matches` is occupied");
                    return Ok(Some(std::mem::replace(old, value)));
                }
            }
        }

        if self.len == self.capacity {
            return Err(Full::new(key, value));
        }
        self.len += 1;

        // New-entry placement, with an iterative displacement cascade in
        // place of the naturally tail-recursive version: each loop
        // iteration either places the carried entry into a free slot
        // (returning), or displaces an incumbent and carries *that*
        // incumbent onward instead.
        let mut carry_home = home;
        let mut carry_hash = hash;
        let mut carry_key = key;
        let mut carry_value = value;

        for _ in 0..=self.capacity {
            if self.arrows[carry_home].is_empty() {
                // No window to append to yet: probe slot by slot. A
                // passed-over occupied slot may be mid-window for some
                // other bucket, not that bucket's own home offset — only
                // when the probed offset is itself a non-empty home do we
                // know exactly where its first element sits, and can jump
                // there directly instead of visiting the rest of its window.
                let mut placed = false;
                for offset in 0..=self.capacity as u32 {
                    let idx = self.wrap(carry_home, offset);
                    if self.slots[idx].is_empty() {
                        self.slots[idx] = Slot::Occupied {
                            key: carry_key,
                            hash: carry_hash,
                            value: carry_value,
                        };
                        self.arrows[carry_home] = Arrow { start: offset, end: offset + 1 };
                        trace!(self.log, "placed entry"; "home" => carry_home, "slot" => idx);
                        placed = true;
                        break;
                    }

                    let probe = self.arrows[idx];
                    if probe.is_empty() {
                        continue;
                    }

                    let jump = probe.start;
                    let place_idx = self.wrap(idx, jump);
                    let incumbent = self.slots[place_idx].take();
                    self.slots[place_idx] = Slot::Occupied {
                        key: carry_key,
                        hash: carry_hash,
                        value: carry_value,
                    };
                    self.arrows[carry_home] = Arrow { start: offset + jump, end: offset + jump + 1 };
                    self.arrows[idx].start += 1;
                    trace!(self.log, "displacing incumbent (bootstrap jump)";
                        "from_home" => idx, "into_home" => carry_home, "slot" => place_idx);

                    let (incumbent_key, incumbent_hash, incumbent_value) = match incumbent {
                        Slot::Occupied { key, hash, value } => (key, hash, value),
                        Slot::Empty => unreachable!("just checked this slot was occupied"),
                    };
                    debug_assert_eq!(
                        self.home(incumbent_hash),
                        idx,
                        "a non-empty bucket's own window always starts with one of its own keys"
                    );
                    carry_home = idx;
                    carry_hash = incumbent_hash;
                    carry_key = incumbent_key;
                    carry_value = incumbent_value;
                    break;
                }
                if placed {
                    return Ok(None);
                }
                // Otherwise carry_* was updated to the displaced incumbent;
                // fall through to the next outer iteration.
                continue;
            }

            // Fast path: the home bucket already owns a contiguous window,
            // so the new entry always goes just past its far end.
            let arrow = self.arrows[carry_home];
            let place_idx = self.wrap(carry_home, arrow.end);

            if self.slots[place_idx].is_empty() {
                self.slots[place_idx] = Slot::Occupied {
                    key: carry_key,
                    hash: carry_hash,
                    value: carry_value,
                };
                self.arrows[carry_home].end += 1;
                trace!(self.log, "placed entry"; "home" => carry_home, "slot" => place_idx);
                return Ok(None);
            }

            let incumbent = self.slots[place_idx].take();
            self.slots[place_idx] = Slot::Occupied {
                key: carry_key,
                hash: carry_hash,
                value: carry_value,
            };
            self.arrows[carry_home].end += 1;

            let (incumbent_key, incumbent_hash, incumbent_value) = match incumbent {
                Slot::Occupied { key, hash, value } => (key, hash, value),
                Slot::Empty => unreachable!("just checked this slot was occupied"),
            };
            let incumbent_home = self.home(incumbent_hash);
            debug_assert_ne!(
                incumbent_home, carry_home,
                "an incumbent sharing carry_home would have matched the update fast path"
            );

            // The slot just past home's own window belongs to at most one
            // other bucket, and the slot before it is already home's own,
            // so any occupant here is necessarily at its own window's
            // leading edge. Removing it slides that window forward by one;
            // it is re-placed at the window's trailing edge below.
            self.arrows[incumbent_home].start += 1;
            trace!(self.log, "displacing incumbent";
                "from_home" => incumbent_home, "into_home" => carry_home, "slot" => place_idx);

            carry_home = incumbent_home;
            carry_hash = incumbent_hash;
            carry_key = incumbent_key;
            carry_value = incumbent_value;
        }

        unreachable!(
            "displacement cascade exceeded capacity; len < capacity was checked above \
             so a free slot must exist"
        );
    }

    /// Remove `key`, returning its value if it was present. Removing a
    /// missing key is a no-op and returns `None`.
    pub fn remove(&mut self, key: &K) -> Option<V> {
        let hash = self.hash_of(key);
        let home = self.home(hash);
        let arrow = self.arrows[home];
        let mut i = None;
        for offset in arrow.start..arrow.end {
            let idx = self.wrap(home, offset);
            if self.slots[idx].matches(hash, key) {
                i = Some(idx);
                break;
            }
        }
        let i = i?;

        // Step 2: hole creation. The hole migrates to the window's last
        // slot so the window only ever shrinks from its far end. If the
        // deleted key was already at the last slot, there is nothing to
        // migrate — just clear it.
        let arrow = self.arrows[home];
        let last = self.wrap(home, arrow.end - 1);
        let removed = if arrow.len() > 1 && i != last {
            let moved = self.slots[last].take();
            std::mem::replace(&mut self.slots[i], moved)
        } else {
            self.slots[i].take()
        };
        if last != i {
            self.slots[last] = Slot::Empty;
        }
        self.arrows[home].end -= 1;

        let value = match removed {
            Slot::Occupied { value, .. } => value,
            Slot::Empty => unreachable!("`find` only returns indices of occupied slots"),
        };

        // Step 3: forward repair. Walk later physical slots, sliding each
        // non-empty bucket's window backward by one as long as doing so is
        // both possible (non-empty successor slot) and legal (the bucket
        // isn't already anchored at its own home). A slot occupied by some
        // earlier bucket's mid-window has an empty arrow of its own here;
        // there is nothing to slide, so the walk continues past it.
        for offset in 1..self.capacity as u32 {
            let idx = self.wrap(home, offset);
            if self.slots[idx].is_empty() {
                break;
            }
            let idx_arrow = self.arrows[idx];
            if idx_arrow.is_empty() {
                continue;
            }
            if idx_arrow.start == 0 {
                break;
            }

            let vacated = self.wrap(idx, idx_arrow.start - 1);
            let donor = self.wrap(idx, idx_arrow.end - 1);
            let moved = self.slots[donor].take();
            self.slots[vacated] = moved;
            self.arrows[idx].start -= 1;
            self.arrows[idx].end -= 1;
            trace!(self.log, "forward repair slid bucket"; "bucket" => idx);
        }

        self.len -= 1;
        Some(value)
    }

    /// Validate invariants I1-I3 (I4, contiguity, is structural: a window is
    /// always represented as one contiguous `(start, end)` range, so there is
    /// nothing separate to check for it). `O(capacity)`; intended for tests,
    /// not hot-path use.
    #[doc(hidden)]
    pub fn debug_assert_invariants(&self) {
        let occupied = self.slots.iter().filter(|s| s.is_occupied()).count();
        assert_eq!(occupied, self.len, "I1: len does not match occupied slot count");

        let mut covered = vec![false; self.capacity];
        for home in 0..self.capacity {
            let arrow = self.arrows[home];
            if arrow.is_empty() {
                continue;
            }
            for offset in arrow.start..arrow.end {
                let idx = self.wrap(home, offset);
                let slot = &self.slots[idx];
                assert!(slot.is_occupied(), "I2: slot in {home}'s window is not occupied");
                let hash = slot.hash().expect("just asserted occupied");
                assert_eq!(self.home(hash), home, "I2: slot's home bucket does not match window owner");
                assert!(!covered[idx], "I3: slot {idx} covered by more than one window");
                covered[idx] = true;
            }
        }
        for (idx, slot) in self.slots.iter().enumerate() {
            if slot.is_occupied() {
                assert!(covered[idx], "I3: occupied slot {idx} is not covered by any window");
            }
        }
    }
}

impl<K: fmt::Debug, V: fmt::Debug, S> fmt::Debug for ArrowTable<K, V, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.slots.iter().filter_map(|slot| match slot {
                Slot::Occupied { key, value, .. } => Some((key, value)),
                Slot::Empty => None,
            }))
            .finish()
    }
}

fn discard_logger() -> Logger {
    Logger::root(Discard, o!())
}
