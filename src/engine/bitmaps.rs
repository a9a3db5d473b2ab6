//! Bitmap commands.

use super::{invalid_arg, parse_int, wrong_args};
use crate::protocol::Frame;
use crate::storage::{BitMap, Db, MAX_BIT_POSITION};

fn parse_position(raw: &[u8], cmd: &str) -> Result<u64, Frame> {
    let Some(pos) = parse_int::<u64>(raw) else {
        return Err(invalid_arg("position", cmd));
    };
    if pos > MAX_BIT_POSITION {
        return Err(Frame::Error(
            "ERR position exceeds maximum allowed value".into(),
        ));
    }
    Ok(pos)
}

pub(crate) fn setbit(db: &Db, args: &[Vec<u8>]) -> Frame {
    if args.len() != 3 {
        return wrong_args("setbit");
    }
    let pos = match parse_position(&args[1], "setbit") {
        Ok(pos) => pos,
        Err(e) => return e,
    };
    let value = match parse_int::<u8>(&args[2]) {
        Some(v @ (0 | 1)) => v == 1,
        _ => return invalid_arg("value", "setbit"),
    };
    db.bitmaps
        .lock()
        .entry(args[0].clone())
        .or_default()
        .set_bit(pos, value);
    // Always 1, regardless of the previous bit value.
    Frame::Integer(1)
}

pub(crate) fn getbit(db: &Db, args: &[Vec<u8>]) -> Frame {
    if args.len() != 2 {
        return wrong_args("getbit");
    }
    let pos = match parse_position(&args[1], "getbit") {
        Ok(pos) => pos,
        Err(e) => return e,
    };
    let bitmaps = db.bitmaps.lock();
    let set = bitmaps
        .get(args[0].as_slice())
        .map_or(false, |bm| bm.get_bit(pos));
    Frame::Integer(set as i64)
}

pub(crate) fn bitcount(db: &Db, args: &[Vec<u8>]) -> Frame {
    if args.len() != 1 {
        return wrong_args("bitcount");
    }
    let bitmaps = db.bitmaps.lock();
    let count = bitmaps.get(args[0].as_slice()).map_or(0, BitMap::popcount);
    Frame::Integer(count as i64)
}
