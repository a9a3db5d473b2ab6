//! PING, the string store and its expiry model, and cross-store DEL.

use super::{invalid_arg, parse_int, wrong_args};
use crate::protocol::Frame;
use crate::storage::{Db, StringEntry};
use dashmap::mapref::entry::Entry;
use std::time::{Duration, Instant};

pub(crate) fn ping(_db: &Db, args: &[Vec<u8>]) -> Frame {
    match args.first() {
        None => Frame::Simple("PONG".into()),
        Some(msg) => Frame::Simple(String::from_utf8_lossy(msg).into_owned()),
    }
}

/// `SET key value [EX seconds | PX milliseconds]`
pub(crate) fn set(db: &Db, args: &[Vec<u8>]) -> Frame {
    if args.len() < 2 {
        return wrong_args("set");
    }
    let now = Instant::now();
    let mut expires_at = None;
    let mut i = 2;
    while i + 1 < args.len() {
        match args[i].to_ascii_uppercase().as_slice() {
            b"EX" => match parse_int::<i64>(&args[i + 1]) {
                Some(secs) => expires_at = Some(deadline(now, secs.saturating_mul(1000))),
                None => return invalid_arg("EX", "set"),
            },
            b"PX" => match parse_int::<i64>(&args[i + 1]) {
                Some(ms) => expires_at = Some(deadline(now, ms)),
                None => return invalid_arg("PX", "set"),
            },
            _ => {}
        }
        i += 2;
    }
    db.strings.insert(
        args[0].clone(),
        StringEntry {
            content: args[1].clone(),
            expires_at,
        },
    );
    Frame::Simple("OK".into())
}

/// `GET key`, evicting the entry lazily when its expiry has passed.
pub(crate) fn get(db: &Db, args: &[Vec<u8>]) -> Frame {
    if args.len() != 1 {
        return wrong_args("get");
    }
    // The entry API keeps lookup and eviction under one shard acquisition.
    match db.strings.entry(args[0].clone()) {
        Entry::Occupied(entry) => {
            if let Some(at) = entry.get().expires_at {
                if Instant::now() > at {
                    entry.remove();
                    return Frame::Null;
                }
            }
            Frame::Bulk(entry.get().content.clone())
        }
        Entry::Vacant(_) => Frame::Null,
    }
}

enum ExpireFlag {
    Nx,
    Xx,
    Gt,
    Lt,
}

/// `EXPIRE key seconds [NX|XX|GT|LT]`: integer 1 when the expiry was
/// applied, 0 otherwise (including a missing key).
pub(crate) fn expire(db: &Db, args: &[Vec<u8>]) -> Frame {
    if !(2..=3).contains(&args.len()) {
        return wrong_args("expire");
    }
    let Some(seconds) = parse_int::<i64>(&args[1]) else {
        return Frame::Error("ERR value is not an integer or out of range".into());
    };
    let flag = match args.get(2) {
        None => None,
        Some(raw) => match raw.to_ascii_uppercase().as_slice() {
            b"NX" => Some(ExpireFlag::Nx),
            b"XX" => Some(ExpireFlag::Xx),
            b"GT" => Some(ExpireFlag::Gt),
            b"LT" => Some(ExpireFlag::Lt),
            _ => return invalid_arg("flag", "expire"),
        },
    };

    let Some(mut entry) = db.strings.get_mut(args[0].as_slice()) else {
        return Frame::Integer(0);
    };
    let new_expiry = deadline(Instant::now(), seconds.saturating_mul(1000));
    let apply = match flag {
        None => true,
        Some(ExpireFlag::Nx) => entry.expires_at.is_none(),
        Some(ExpireFlag::Xx) => entry.expires_at.is_some(),
        // GT/LT also apply when the key has no expiry at all.
        Some(ExpireFlag::Gt) => entry.expires_at.map_or(true, |cur| new_expiry > cur),
        Some(ExpireFlag::Lt) => entry.expires_at.map_or(true, |cur| new_expiry < cur),
    };
    if apply {
        entry.expires_at = Some(new_expiry);
        Frame::Integer(1)
    } else {
        Frame::Integer(0)
    }
}

/// `DEL k1 k2 ...`: sweeps every store; a key present in several stores
/// counts once per store.
pub(crate) fn del(db: &Db, args: &[Vec<u8>]) -> Frame {
    if args.is_empty() {
        return wrong_args("del");
    }
    let mut count = 0i64;
    for key in args {
        count += db.delete_everywhere(key);
    }
    Frame::Integer(count)
}

/// Absolute instant `ms` milliseconds from `now`. Non-positive offsets clamp
/// to `now`, which reads as already expired on the next strictly-later GET.
fn deadline(now: Instant, ms: i64) -> Instant {
    if ms > 0 {
        now + Duration::from_millis(ms as u64)
    } else {
        now
    }
}
