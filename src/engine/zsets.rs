//! Sorted-set commands over the skip list.

use super::{parse_int, wrong_args};
use crate::protocol::Frame;
use crate::storage::{Db, SortedSet};

fn members_frame(members: Vec<Vec<u8>>) -> Frame {
    Frame::Array(members.into_iter().map(Frame::Bulk).collect())
}

fn no_such_set() -> Frame {
    Frame::Error("ERR sorted set does not exist".into())
}

fn no_such_member() -> Frame {
    Frame::Error("ERR member does not exist in sorted set".into())
}

/// `ZADD key (score member)+`: replies with the number of members that did
/// not exist before.
pub(crate) fn zadd(db: &Db, args: &[Vec<u8>]) -> Frame {
    if args.len() < 3 || args.len() % 2 != 1 {
        return wrong_args("zadd");
    }
    // Validate every score up front so the set mutates all-or-nothing.
    let mut pairs = Vec::with_capacity(args.len() / 2);
    for chunk in args[1..].chunks(2) {
        let Some(score) = parse_int::<i64>(&chunk[0]) else {
            return Frame::Error("ERR invalid score value for 'zadd' command".into());
        };
        pairs.push((score, &chunk[1]));
    }
    let mut zsets = db.zsets.lock();
    let set = zsets.entry(args[0].clone()).or_default();
    let mut added = 0i64;
    for (score, member) in pairs {
        if set.add_or_update(member, score) {
            added += 1;
        }
    }
    Frame::Integer(added)
}

pub(crate) fn zrem(db: &Db, args: &[Vec<u8>]) -> Frame {
    if args.len() < 2 {
        return wrong_args("zrem");
    }
    let mut zsets = db.zsets.lock();
    let Some(set) = zsets.get_mut(args[0].as_slice()) else {
        return Frame::Integer(0);
    };
    let mut removed = 0i64;
    for member in &args[1..] {
        if set.remove(member) {
            removed += 1;
        }
    }
    Frame::Integer(removed)
}

/// `ZRANGE key start end`: 1-based ranks, negatives from the tail; an
/// inverted range comes back reversed.
pub(crate) fn zrange(db: &Db, args: &[Vec<u8>]) -> Frame {
    if args.len() != 3 {
        return wrong_args("zrange");
    }
    let (Some(start), Some(end)) = (parse_int::<i64>(&args[1]), parse_int::<i64>(&args[2]))
    else {
        return Frame::Error("ERR invalid range values for 'zrange' command".into());
    };
    let zsets = db.zsets.lock();
    let Some(set) = zsets.get(args[0].as_slice()) else {
        return Frame::Array(Vec::new());
    };
    members_frame(set.range_by_rank(start, end))
}

/// `ZUPDATE key member score`: errors when the set or member is absent.
pub(crate) fn zupdate(db: &Db, args: &[Vec<u8>]) -> Frame {
    if args.len() != 3 {
        return wrong_args("zupdate");
    }
    let Some(score) = parse_int::<i64>(&args[2]) else {
        return Frame::Error("ERR invalid score value for 'zupdate' command".into());
    };
    let mut zsets = db.zsets.lock();
    let Some(set) = zsets.get_mut(args[0].as_slice()) else {
        return no_such_set();
    };
    if !set.contains(&args[1]) {
        return no_such_member();
    }
    set.add_or_update(&args[1], score);
    Frame::Simple("OK".into())
}

pub(crate) fn ztopk(db: &Db, args: &[Vec<u8>]) -> Frame {
    if args.len() != 2 {
        return wrong_args("ztopk");
    }
    let k = match parse_int::<i64>(&args[1]) {
        Some(k) if k > 0 => k,
        _ => return Frame::Error("ERR invalid value for K".into()),
    };
    let zsets = db.zsets.lock();
    let Some(set) = zsets.get(args[0].as_slice()) else {
        return Frame::Array(Vec::new());
    };
    members_frame(set.range_by_rank(0, k))
}

pub(crate) fn zranktop(db: &Db, args: &[Vec<u8>]) -> Frame {
    rank(db, args, "zranktop", SortedSet::rank_from_head)
}

pub(crate) fn zrankbottom(db: &Db, args: &[Vec<u8>]) -> Frame {
    rank(db, args, "zrankbottom", SortedSet::rank_from_tail)
}

fn rank(
    db: &Db,
    args: &[Vec<u8>],
    cmd: &str,
    direction: fn(&SortedSet, &[u8]) -> Option<u64>,
) -> Frame {
    if args.len() != 2 {
        return wrong_args(cmd);
    }
    let zsets = db.zsets.lock();
    let Some(set) = zsets.get(args[0].as_slice()) else {
        return no_such_set();
    };
    match direction(set, &args[1]) {
        Some(rank) => Frame::Integer(rank as i64),
        None => no_such_member(),
    }
}
