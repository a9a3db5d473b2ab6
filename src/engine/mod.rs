/*!
 * Command dispatch and the AOF gate.
 *
 * The dispatcher owns the command table, decides which requests get logged
 * (and in what form), and hands the rest of the work to per-family handlers.
 * Replay routes through the same handlers with logging disabled, so a log is
 * re-applied exactly as it was produced.
 */

mod bitmaps;
mod filters;
mod hashes;
mod lists;
mod strings;
mod zsets;

use crate::aof::{self, Aof};
use crate::protocol::{encode_request, Frame};
use crate::storage::Db;
use log::warn;
use std::path::Path;

type Handler = fn(&Db, &[Vec<u8>]) -> Frame;

/// The server core: all stores plus the optional durability log.
pub struct Engine {
    pub db: Db,
    aof: Option<Aof>,
}

impl Engine {
    pub fn new(aof: Option<Aof>) -> Self {
        Self { db: Db::new(), aof }
    }

    /// Execute one client request and return the encoded reply.
    pub fn exec(&self, request: &[Vec<u8>]) -> Vec<u8> {
        self.dispatch(request, true).encode()
    }

    /// Re-apply a replayed record, bypassing the log.
    pub fn apply(&self, request: &[Vec<u8>]) {
        let _ = self.dispatch(request, false);
    }

    /// Rebuild state from the log at `path`. Runs before the server accepts
    /// connections, so no lock contention exists yet.
    pub fn replay(&self, path: &Path) -> anyhow::Result<usize> {
        aof::replay(path, |frame| {
            if let Some(request) = frame.as_request() {
                self.apply(&request);
            }
        })
    }

    fn dispatch(&self, request: &[Vec<u8>], log_writes: bool) -> Frame {
        let Some(name) = request.first() else {
            return Frame::Error("ERR empty request".into());
        };
        let cmd = name.to_ascii_uppercase();
        let args = &request[1..];

        // Connection handshake no-ops some clients send on connect.
        if cmd == b"COMMAND" || cmd == b"RETRY" {
            return Frame::Simple(String::new());
        }

        match cmd.as_slice() {
            // EXPIRE and DEL are logged after the fact, and only when they
            // changed something; their record form depends on the outcome.
            b"EXPIRE" => {
                let reply = strings::expire(&self.db, args);
                if log_writes && reply == Frame::Integer(1) {
                    let flag = args.get(2).map(|f| f.as_slice());
                    self.append(&aof::emit_expire(&args[0], &args[1], flag));
                }
                reply
            }
            b"DEL" => {
                let reply = strings::del(&self.db, args);
                if log_writes && matches!(reply, Frame::Integer(n) if n > 0) {
                    self.append(&aof::emit_del(args));
                }
                reply
            }
            _ => match lookup(&cmd) {
                Some(handler) => {
                    if log_writes && is_write(&cmd) && arity_ok(&cmd, args.len()) {
                        self.append(&encode_request(request));
                    }
                    handler(&self.db, args)
                }
                None => {
                    warn!("unknown command {}", String::from_utf8_lossy(&cmd));
                    Frame::Simple(String::new())
                }
            },
        }
    }

    fn append(&self, record: &[u8]) {
        if let Some(aof) = &self.aof {
            aof.append(record);
        }
    }
}

/// True for commands that may park the calling thread (the connection server
/// moves these off the worker pool).
pub fn is_blocking(request: &[Vec<u8>]) -> bool {
    request
        .first()
        .is_some_and(|name| name.eq_ignore_ascii_case(b"BLPOP"))
}

fn lookup(cmd: &[u8]) -> Option<Handler> {
    Some(match cmd {
        b"PING" => strings::ping,
        b"SET" => strings::set,
        b"GET" => strings::get,
        b"HSET" => hashes::hset,
        b"HGET" => hashes::hget,
        b"HGETALL" => hashes::hgetall,
        b"LPUSH" => lists::lpush,
        b"RPUSH" => lists::rpush,
        b"LPOP" => lists::lpop,
        b"RPOP" => lists::rpop,
        b"LLEN" => lists::llen,
        b"LRANGE" => lists::lrange,
        b"BLPOP" => lists::blpop,
        b"ZADD" => zsets::zadd,
        b"ZREM" => zsets::zrem,
        b"ZRANGE" => zsets::zrange,
        b"ZUPDATE" => zsets::zupdate,
        b"ZTOPK" => zsets::ztopk,
        b"ZRANKTOP" => zsets::zranktop,
        b"ZRANKBOTTOM" => zsets::zrankbottom,
        b"SETBIT" => bitmaps::setbit,
        b"GETBIT" => bitmaps::getbit,
        b"BITCOUNT" => bitmaps::bitcount,
        b"BF.RESERVE" => filters::bf_reserve,
        b"BF.ADD" => filters::bf_add,
        b"BF.EXISTS" => filters::bf_exists,
        b"BF.MADD" => filters::bf_madd,
        b"BF.MEXISTS" => filters::bf_mexists,
        b"BF.INSERT" => filters::bf_insert,
        b"CF.CREATE" => filters::cf_create,
        b"CF.RESERVE" => filters::cf_reserve,
        b"CF.ADD" => filters::cf_add,
        b"CF.CONTAINS" => filters::cf_contains,
        b"CF.REMOVE" => filters::cf_remove,
        _ => return None,
    })
}

/// Commands whose requests are appended to the AOF verbatim, before the
/// handler runs.
fn is_write(cmd: &[u8]) -> bool {
    matches!(
        cmd,
        b"SET"
            | b"HSET"
            | b"LPUSH"
            | b"RPUSH"
            | b"SETBIT"
            | b"ZADD"
            | b"ZREM"
            | b"ZUPDATE"
            | b"BF.ADD"
            | b"BF.MADD"
            | b"BF.INSERT"
            | b"BF.RESERVE"
            | b"CF.ADD"
            | b"CF.REMOVE"
            | b"CF.CREATE"
            | b"CF.RESERVE"
    )
}

/// Arity gate applied before a write-set request is appended. Handlers
/// re-validate and produce the client-facing error.
fn arity_ok(cmd: &[u8], argc: usize) -> bool {
    match cmd {
        b"SET" | b"LPUSH" | b"RPUSH" | b"ZREM" | b"BF.MADD" | b"BF.INSERT" | b"CF.RESERVE" => {
            argc >= 2
        }
        b"HSET" | b"SETBIT" | b"ZUPDATE" => argc == 3,
        b"ZADD" => argc >= 3 && argc % 2 == 1,
        b"BF.ADD" | b"BF.RESERVE" | b"CF.ADD" | b"CF.REMOVE" => argc == 2,
        b"CF.CREATE" => argc == 1,
        _ => false,
    }
}

pub(crate) fn wrong_args(cmd: &str) -> Frame {
    Frame::Error(format!("ERR wrong number of arguments for '{cmd}' command"))
}

pub(crate) fn invalid_arg(what: &str, cmd: &str) -> Frame {
    Frame::Error(format!("ERR invalid {what} argument for '{cmd}' command"))
}

pub(crate) fn parse_int<T: std::str::FromStr>(raw: &[u8]) -> Option<T> {
    std::str::from_utf8(raw).ok()?.parse().ok()
}
