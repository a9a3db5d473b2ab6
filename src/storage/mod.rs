/*!
 * Typed in-memory stores.
 *
 * One map per entity type, all owned by a single `Db` so tests (and future
 * multi-instance setups) get fresh state without process restarts. Strings
 * and hashes sit in sharded concurrent maps; the pointer-heavy structures
 * live behind one mutex each.
 */

pub mod bitmap;
pub mod bloom;
pub mod cuckoo;
pub mod list;
pub mod skiplist;

pub use bitmap::{BitMap, MAX_BIT_POSITION};
pub use bloom::{BloomFilter, DEFAULT_BLOOM_CAPACITY};
pub use cuckoo::{CuckooConfig, CuckooFilter};
pub use list::DoublyList;
pub use skiplist::SortedSet;

use ahash::RandomState;
use dashmap::DashMap;
use hashbrown::HashMap;
use parking_lot::Mutex;
use std::time::Instant;

/// A stored string value with its optional absolute expiry.
pub struct StringEntry {
    pub content: Vec<u8>,
    pub expires_at: Option<Instant>,
}

type KeyedMap<V> = HashMap<Vec<u8>, V>;

/// All global stores. Keys are binary-safe and not namespaced across types.
pub struct Db {
    pub strings: DashMap<Vec<u8>, StringEntry, RandomState>,
    pub hashes: DashMap<Vec<u8>, KeyedMap<Vec<u8>>, RandomState>,
    pub lists: Mutex<KeyedMap<DoublyList>>,
    pub zsets: Mutex<KeyedMap<SortedSet>>,
    pub bitmaps: Mutex<KeyedMap<BitMap>>,
    pub blooms: Mutex<KeyedMap<BloomFilter>>,
    pub cuckoos: Mutex<KeyedMap<CuckooFilter>>,
}

impl Default for Db {
    fn default() -> Self {
        Self::new()
    }
}

impl Db {
    pub fn new() -> Self {
        Self {
            strings: DashMap::with_hasher(RandomState::new()),
            hashes: DashMap::with_hasher(RandomState::new()),
            lists: Mutex::new(HashMap::new()),
            zsets: Mutex::new(HashMap::new()),
            bitmaps: Mutex::new(HashMap::new()),
            blooms: Mutex::new(HashMap::new()),
            cuckoos: Mutex::new(HashMap::new()),
        }
    }

    /// Remove `key` from every store it occupies, counting one per store hit.
    ///
    /// Locks are taken one store at a time, always in this order; anything
    /// extending deletion to a new store must slot into the same sequence.
    pub fn delete_everywhere(&self, key: &[u8]) -> i64 {
        let mut count = 0i64;
        if self.strings.remove(key).is_some() {
            count += 1;
        }
        if self.hashes.remove(key).is_some() {
            count += 1;
        }
        if self.lists.lock().remove(key).is_some() {
            count += 1;
        }
        if self.zsets.lock().remove(key).is_some() {
            count += 1;
        }
        if self.bitmaps.lock().remove(key).is_some() {
            count += 1;
        }
        if self.blooms.lock().remove(key).is_some() {
            count += 1;
        }
        if self.cuckoos.lock().remove(key).is_some() {
            count += 1;
        }
        count
    }
}
