//! A fixed-capacity, open-addressed hash table whose home buckets track the
//! contiguous run ("arrow") of slots currently holding their keys.
//!
//! Ordinary linear probing makes lookup cost proportional to however far a
//! key's probe sequence happens to wander. This table instead remembers,
//! per home bucket, the exact `(start, end)` offset window its keys
//! currently occupy, so a lookup never visits more slots than the bucket
//! actually has entries in.
//!
//! ```
//! use arrow_table::ArrowTable;
//!
//! let mut table = ArrowTable::new(16);
//! assert_eq!(table.insert("a", 1), Ok(None));
//! assert_eq!(table.insert("a", 2), Ok(Some(1)));
//! assert_eq!(table.get(&"a"), Some(&2));
//! assert_eq!(table.remove(&"a"), Some(2));
//! assert_eq!(table.get(&"a"), None);
//! ```
//!
//! The table never resizes: capacity is fixed at construction, and
//! [`insert`](ArrowTable::insert) into a full table returns the key and
//! value back to the caller rather than growing. There is no concurrency
//! support and no tombstoning — callers needing either should wrap the
//! table externally (a `Mutex<ArrowTable<K, V>>`, say).

mod arrow;
mod error;
mod slot;
mod table;

pub use arrow::Arrow;
pub use error::Full;
pub use table::ArrowTable;
