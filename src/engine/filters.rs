//! Bloom and Cuckoo filter commands.

use super::{invalid_arg, parse_int, wrong_args};
use crate::protocol::Frame;
use crate::storage::{BloomFilter, CuckooConfig, CuckooFilter, Db, DEFAULT_BLOOM_CAPACITY};

fn key_exists() -> Frame {
    Frame::Error("ERR key already exists".into())
}

fn capacity_error() -> Frame {
    Frame::Error("ERR capacity must be an integer".into())
}

//
// Bloom filter
//

pub(crate) fn bf_reserve(db: &Db, args: &[Vec<u8>]) -> Frame {
    if args.len() != 2 {
        return wrong_args("bf.reserve");
    }
    let mut blooms = db.blooms.lock();
    if blooms.contains_key(args[0].as_slice()) {
        return key_exists();
    }
    let capacity = match parse_int::<usize>(&args[1]) {
        Some(c) if c > 0 => c,
        _ => return capacity_error(),
    };
    blooms.insert(args[0].clone(), BloomFilter::new(capacity));
    Frame::Simple("OK".into())
}

pub(crate) fn bf_add(db: &Db, args: &[Vec<u8>]) -> Frame {
    if args.len() != 2 {
        return wrong_args("bf.add");
    }
    let mut blooms = db.blooms.lock();
    let filter = blooms
        .entry(args[0].clone())
        .or_insert_with(|| BloomFilter::new(DEFAULT_BLOOM_CAPACITY));
    Frame::Integer(filter.add(&args[1]) as i64)
}

pub(crate) fn bf_exists(db: &Db, args: &[Vec<u8>]) -> Frame {
    if args.len() != 2 {
        return wrong_args("bf.exists");
    }
    let blooms = db.blooms.lock();
    let hit = blooms
        .get(args[0].as_slice())
        .map_or(false, |filter| filter.contains(&args[1]));
    Frame::Integer(hit as i64)
}

fn add_items(filter: &mut BloomFilter, items: &[Vec<u8>]) -> Frame {
    Frame::Array(
        items
            .iter()
            .map(|item| Frame::Integer(filter.add(item) as i64))
            .collect(),
    )
}

pub(crate) fn bf_madd(db: &Db, args: &[Vec<u8>]) -> Frame {
    if args.len() < 2 {
        return wrong_args("bf.madd");
    }
    let mut blooms = db.blooms.lock();
    let filter = blooms
        .entry(args[0].clone())
        .or_insert_with(|| BloomFilter::new(DEFAULT_BLOOM_CAPACITY));
    add_items(filter, &args[1..])
}

pub(crate) fn bf_mexists(db: &Db, args: &[Vec<u8>]) -> Frame {
    if args.len() < 2 {
        return wrong_args("bf.mexists");
    }
    let blooms = db.blooms.lock();
    let items = &args[1..];
    match blooms.get(args[0].as_slice()) {
        Some(filter) => Frame::Array(
            items
                .iter()
                .map(|item| Frame::Integer(filter.contains(item) as i64))
                .collect(),
        ),
        None => Frame::Array(items.iter().map(|_| Frame::Integer(0)).collect()),
    }
}

/// `BF.INSERT key [NOCREATE] [CAPACITY n] ITEMS item...`
///
/// Option parsing is lenient: an unknown option, NOCREATE against a missing
/// filter, or an absent ITEMS terminator all reply with an empty array.
pub(crate) fn bf_insert(db: &Db, args: &[Vec<u8>]) -> Frame {
    if args.len() < 2 {
        return wrong_args("bf.insert");
    }
    let mut nocreate = false;
    let mut capacity = None;
    let mut items_start = None;
    let mut i = 1;
    while i < args.len() {
        match args[i].to_ascii_uppercase().as_slice() {
            b"NOCREATE" => {
                nocreate = true;
                i += 1;
            }
            b"CAPACITY" => {
                let Some(raw) = args.get(i + 1) else {
                    return Frame::Array(Vec::new());
                };
                match parse_int::<usize>(raw) {
                    Some(c) if c > 0 => capacity = Some(c),
                    _ => return capacity_error(),
                }
                i += 2;
            }
            b"ITEMS" => {
                items_start = Some(i + 1);
                break;
            }
            _ => return Frame::Array(Vec::new()),
        }
    }
    let Some(start) = items_start else {
        return Frame::Array(Vec::new());
    };

    let mut blooms = db.blooms.lock();
    if !blooms.contains_key(args[0].as_slice()) {
        if nocreate {
            return Frame::Array(Vec::new());
        }
        blooms.insert(
            args[0].clone(),
            BloomFilter::new(capacity.unwrap_or(DEFAULT_BLOOM_CAPACITY)),
        );
    }
    let Some(filter) = blooms.get_mut(args[0].as_slice()) else {
        return Frame::Array(Vec::new());
    };
    add_items(filter, &args[start..])
}

//
// Cuckoo filter
//

pub(crate) fn cf_create(db: &Db, args: &[Vec<u8>]) -> Frame {
    if args.len() != 1 {
        return wrong_args("cf.create");
    }
    let mut cuckoos = db.cuckoos.lock();
    if cuckoos.contains_key(args[0].as_slice()) {
        return key_exists();
    }
    cuckoos.insert(args[0].clone(), CuckooFilter::new(CuckooConfig::default()));
    Frame::Simple("OK".into())
}

/// `CF.RESERVE key capacity [BUCKETSIZE n] [MAXITERATIONS n]`
pub(crate) fn cf_reserve(db: &Db, args: &[Vec<u8>]) -> Frame {
    if args.len() < 2 || args.len() % 2 != 0 {
        return wrong_args("cf.reserve");
    }
    let capacity = match parse_int::<usize>(&args[1]) {
        Some(c) if c > 0 => c,
        _ => return capacity_error(),
    };
    let mut bucket_size = None;
    let mut max_kicks = None;
    let mut i = 2;
    while i + 1 < args.len() {
        let value = match parse_int::<usize>(&args[i + 1]) {
            Some(v) if v > 0 => v,
            _ => return invalid_arg("option value", "cf.reserve"),
        };
        match args[i].to_ascii_uppercase().as_slice() {
            b"BUCKETSIZE" => bucket_size = Some(value),
            b"MAXITERATIONS" => max_kicks = Some(value),
            _ => return invalid_arg("option", "cf.reserve"),
        }
        i += 2;
    }
    let defaults = CuckooConfig::default();
    let config = CuckooConfig {
        capacity,
        bucket_size: bucket_size.unwrap_or(defaults.bucket_size),
        max_kicks: max_kicks.unwrap_or(defaults.max_kicks),
    };

    let mut cuckoos = db.cuckoos.lock();
    if cuckoos.contains_key(args[0].as_slice()) {
        return key_exists();
    }
    cuckoos.insert(args[0].clone(), CuckooFilter::new(config));
    Frame::Simple("OK".into())
}

pub(crate) fn cf_add(db: &Db, args: &[Vec<u8>]) -> Frame {
    if args.len() != 2 {
        return wrong_args("cf.add");
    }
    let mut cuckoos = db.cuckoos.lock();
    let filter = cuckoos
        .entry(args[0].clone())
        .or_insert_with(|| CuckooFilter::new(CuckooConfig::default()));
    if filter.add(&args[1]) {
        Frame::Integer(1)
    } else {
        Frame::Error("ERR filter is full".into())
    }
}

pub(crate) fn cf_contains(db: &Db, args: &[Vec<u8>]) -> Frame {
    if args.len() != 2 {
        return wrong_args("cf.contains");
    }
    let cuckoos = db.cuckoos.lock();
    let hit = cuckoos
        .get(args[0].as_slice())
        .map_or(false, |filter| filter.contains(&args[1]));
    Frame::Integer(hit as i64)
}

pub(crate) fn cf_remove(db: &Db, args: &[Vec<u8>]) -> Frame {
    if args.len() != 2 {
        return wrong_args("cf.remove");
    }
    let mut cuckoos = db.cuckoos.lock();
    let Some(filter) = cuckoos.get_mut(args[0].as_slice()) else {
        return Frame::Error("ERR filter does not exist".into());
    };
    Frame::Integer(filter.remove(&args[1]) as i64)
}
