//! Hash store commands.

use super::wrong_args;
use crate::protocol::Frame;
use crate::storage::Db;

pub(crate) fn hset(db: &Db, args: &[Vec<u8>]) -> Frame {
    if args.len() != 3 {
        return wrong_args("hset");
    }
    db.hashes
        .entry(args[0].clone())
        .or_default()
        .insert(args[1].clone(), args[2].clone());
    Frame::Simple("OK".into())
}

pub(crate) fn hget(db: &Db, args: &[Vec<u8>]) -> Frame {
    if args.len() != 2 {
        return wrong_args("hget");
    }
    let value = db
        .hashes
        .get(args[0].as_slice())
        .and_then(|hash| hash.get(args[1].as_slice()).cloned());
    match value {
        Some(value) => Frame::Bulk(value),
        None => Frame::Null,
    }
}

pub(crate) fn hgetall(db: &Db, args: &[Vec<u8>]) -> Frame {
    if args.len() != 1 {
        return wrong_args("hgetall");
    }
    match db.hashes.get(args[0].as_slice()) {
        Some(hash) => {
            let mut items = Vec::with_capacity(hash.len() * 2);
            for (field, value) in hash.iter() {
                items.push(Frame::Bulk(field.clone()));
                items.push(Frame::Bulk(value.clone()));
            }
            Frame::Array(items)
        }
        None => Frame::Null,
    }
}
