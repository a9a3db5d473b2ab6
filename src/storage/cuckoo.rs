/*!
 * Cuckoo filter: bucketed fingerprints with displacement insertion.
 *
 * Each item maps to two candidate buckets; when both are full, a random
 * resident fingerprint is kicked to its own alternate bucket, up to
 * `max_kicks` times. Supports deletion, unlike the Bloom filter.
 */

use rand::Rng;
use xxhash_rust::xxh32::xxh32;

use super::bloom::fnv1a_32;

/// Multiplier that spreads the fingerprint before the XOR partner-bucket
/// derivation (the murmur finalizer constant).
const ALT_MULTIPLIER: u32 = 0x5bd1_e995;

/// Fingerprint value 0 marks an empty slot, so a real zero hash gets this
/// alias instead.
const ZERO_FP_ALIAS: u32 = 1;

#[derive(Clone, Copy, Debug)]
pub struct CuckooConfig {
    pub capacity: usize,
    pub bucket_size: usize,
    pub max_kicks: usize,
}

impl Default for CuckooConfig {
    fn default() -> Self {
        Self {
            capacity: 1_000_000,
            bucket_size: 6,
            max_kicks: 700,
        }
    }
}

pub struct CuckooFilter {
    /// `num_buckets * bucket_size` fingerprints, bucket-major.
    slots: Vec<u32>,
    num_buckets: usize,
    bucket_size: usize,
    max_kicks: usize,
    size: usize,
    capacity: usize,
}

impl CuckooFilter {
    pub fn new(config: CuckooConfig) -> Self {
        let bucket_size = config.bucket_size.max(1);
        let num_buckets = (config.capacity / bucket_size).max(1).next_power_of_two();
        Self {
            slots: vec![0; num_buckets * bucket_size],
            num_buckets,
            bucket_size,
            max_kicks: config.max_kicks,
            size: 0,
            capacity: config.capacity,
        }
    }

    pub fn len(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Insert an item. False means the filter refused it: either the item
    /// count reached capacity or displacement ran out of kicks.
    pub fn add(&mut self, item: &[u8]) -> bool {
        if self.size >= self.capacity {
            return false;
        }
        let mut fp = fingerprint(item);
        let i1 = self.bucket_of(item);
        let i2 = self.alternate(i1, fp);
        if self.insert_into_bucket(i1, fp) || self.insert_into_bucket(i2, fp) {
            self.size += 1;
            return true;
        }

        // Both candidates full: kick residents along the displacement chain.
        let mut rng = rand::thread_rng();
        let mut i = i1;
        for _ in 0..self.max_kicks {
            let j = rng.gen_range(0..self.bucket_size);
            std::mem::swap(&mut fp, &mut self.slots[i * self.bucket_size + j]);
            i = self.alternate(i, fp);
            if self.insert_into_bucket(i, fp) {
                self.size += 1;
                return true;
            }
        }
        false
    }

    pub fn contains(&self, item: &[u8]) -> bool {
        let fp = fingerprint(item);
        let i1 = self.bucket_of(item);
        let i2 = self.alternate(i1, fp);
        self.bucket(i1).contains(&fp) || self.bucket(i2).contains(&fp)
    }

    /// Clear the first matching slot in either candidate bucket.
    pub fn remove(&mut self, item: &[u8]) -> bool {
        let fp = fingerprint(item);
        let i1 = self.bucket_of(item);
        let i2 = self.alternate(i1, fp);
        if self.delete_from_bucket(i1, fp) || self.delete_from_bucket(i2, fp) {
            self.size -= 1;
            return true;
        }
        false
    }

    fn bucket(&self, i: usize) -> &[u32] {
        &self.slots[i * self.bucket_size..(i + 1) * self.bucket_size]
    }

    fn bucket_of(&self, item: &[u8]) -> usize {
        xxh32(item, 0) as usize & (self.num_buckets - 1)
    }

    /// Partner bucket. Because `num_buckets` is a power of two this is an
    /// involution: `alternate(alternate(i, fp), fp) == i`.
    fn alternate(&self, i: usize, fp: u32) -> usize {
        (i ^ fp.wrapping_mul(ALT_MULTIPLIER) as usize) & (self.num_buckets - 1)
    }

    fn insert_into_bucket(&mut self, i: usize, fp: u32) -> bool {
        let base = i * self.bucket_size;
        for j in 0..self.bucket_size {
            if self.slots[base + j] == 0 {
                self.slots[base + j] = fp;
                return true;
            }
        }
        false
    }

    fn delete_from_bucket(&mut self, i: usize, fp: u32) -> bool {
        let base = i * self.bucket_size;
        for j in 0..self.bucket_size {
            if self.slots[base + j] == fp {
                self.slots[base + j] = 0;
                return true;
            }
        }
        false
    }
}

fn fingerprint(item: &[u8]) -> u32 {
    match fnv1a_32(item) {
        0 => ZERO_FP_ALIAS,
        fp => fp,
    }
}
