//! List store commands, including the blocking left pop.

use super::{invalid_arg, parse_int, wrong_args};
use crate::protocol::Frame;
use crate::storage::{Db, DoublyList};
use std::time::{Duration, Instant};

/// How often a blocked BLPOP rescans its keys.
const BLPOP_POLL_INTERVAL: Duration = Duration::from_millis(50);

pub(crate) fn lpush(db: &Db, args: &[Vec<u8>]) -> Frame {
    push(db, args, "lpush", DoublyList::push_front)
}

pub(crate) fn rpush(db: &Db, args: &[Vec<u8>]) -> Frame {
    push(db, args, "rpush", DoublyList::push_back)
}

fn push(
    db: &Db,
    args: &[Vec<u8>],
    cmd: &str,
    op: fn(&mut DoublyList, Vec<u8>) -> usize,
) -> Frame {
    if args.len() < 2 {
        return wrong_args(cmd);
    }
    let mut lists = db.lists.lock();
    let list = lists.entry(args[0].clone()).or_default();
    let mut len = list.len();
    for value in &args[1..] {
        len = op(list, value.clone());
    }
    Frame::Integer(len as i64)
}

pub(crate) fn lpop(db: &Db, args: &[Vec<u8>]) -> Frame {
    pop(db, args, "lpop", DoublyList::pop_front)
}

pub(crate) fn rpop(db: &Db, args: &[Vec<u8>]) -> Frame {
    pop(db, args, "rpop", DoublyList::pop_back)
}

fn pop(
    db: &Db,
    args: &[Vec<u8>],
    cmd: &str,
    op: fn(&mut DoublyList) -> Option<Vec<u8>>,
) -> Frame {
    if args.is_empty() || args.len() > 2 {
        return wrong_args(cmd);
    }
    let count = match args.get(1) {
        None => 1usize,
        Some(raw) => match parse_int::<i64>(raw) {
            Some(n) if n > 0 => n as usize,
            _ => return invalid_arg("count", cmd),
        },
    };
    let mut lists = db.lists.lock();
    let Some(list) = lists.get_mut(args[0].as_slice()) else {
        return Frame::Null;
    };
    if list.is_empty() {
        return Frame::Null;
    }
    let mut popped = Vec::with_capacity(count.min(list.len()));
    for _ in 0..count {
        match op(list) {
            Some(value) => popped.push(value),
            None => break,
        }
    }
    // A lone value goes back as a bulk string, several as an array.
    if popped.len() == 1 {
        Frame::Bulk(popped.swap_remove(0))
    } else {
        Frame::Array(popped.into_iter().map(Frame::Bulk).collect())
    }
}

pub(crate) fn llen(db: &Db, args: &[Vec<u8>]) -> Frame {
    if args.len() != 1 {
        return wrong_args("llen");
    }
    let lists = db.lists.lock();
    let len = lists.get(args[0].as_slice()).map_or(0, DoublyList::len);
    Frame::Integer(len as i64)
}

pub(crate) fn lrange(db: &Db, args: &[Vec<u8>]) -> Frame {
    if args.len() != 3 {
        return wrong_args("lrange");
    }
    let (Some(start), Some(stop)) = (parse_int::<i64>(&args[1]), parse_int::<i64>(&args[2]))
    else {
        return invalid_arg("range", "lrange");
    };
    let lists = db.lists.lock();
    let Some(list) = lists.get(args[0].as_slice()) else {
        return Frame::Array(Vec::new());
    };
    Frame::Array(list.range(start, stop).into_iter().map(Frame::Bulk).collect())
}

/// `BLPOP k1..kn timeout`: poll the named lists in order until one yields a
/// value or the deadline passes. The store lock is never held across a
/// sleep, and a timeout of 0 means a single non-blocking scan.
pub(crate) fn blpop(db: &Db, args: &[Vec<u8>]) -> Frame {
    if args.len() < 2 {
        return wrong_args("blpop");
    }
    let keys = &args[..args.len() - 1];
    let timeout = match parse_int::<i64>(&args[args.len() - 1]) {
        Some(t) if t >= 0 => t,
        _ => return invalid_arg("timeout", "blpop"),
    };
    let deadline = Instant::now() + Duration::from_secs(timeout as u64);
    loop {
        {
            let mut lists = db.lists.lock();
            for key in keys {
                if let Some(value) = lists
                    .get_mut(key.as_slice())
                    .and_then(DoublyList::pop_front)
                {
                    return Frame::Array(vec![Frame::Bulk(key.clone()), Frame::Bulk(value)]);
                }
            }
        }
        if timeout == 0 || Instant::now() >= deadline {
            return Frame::Null;
        }
        std::thread::sleep(BLPOP_POLL_INTERVAL);
    }
}
