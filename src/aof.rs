/*!
 * Append-only file persistence.
 *
 * Every logged command is one RESP array of bulk strings, byte-identical to
 * the request that produced it (plus the synthetic EXPIRE/DEL records the
 * dispatcher emits). Appends are serialized by an internal lock so concurrent
 * handlers can never interleave bytes. On restart the file is decoded frame
 * by frame and re-applied; a damaged tail is logged and skipped, never fatal.
 */

use crate::protocol::{encode_request, Frame, FrameError};
use anyhow::{Context, Result};
use log::{error, warn};
use parking_lot::Mutex;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::time::{Duration, Instant};

/// How eagerly appended records reach the disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsyncPolicy {
    /// Leave flushing entirely to the OS.
    No,
    /// flush + sync_data after every append.
    Always,
    /// flush + sync_data at most once per second (the default).
    EverySec,
}

impl FsyncPolicy {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "no" => Some(Self::No),
            "always" => Some(Self::Always),
            "everysec" => Some(Self::EverySec),
            _ => None,
        }
    }
}

struct AofFile {
    file: File,
    last_sync: Instant,
}

/// Handle to the append-only file.
pub struct Aof {
    inner: Mutex<AofFile>,
    policy: FsyncPolicy,
}

impl Aof {
    /// Open (creating if absent) the log at `path` in append mode.
    pub fn open(path: &Path, policy: FsyncPolicy) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("open aof {}", path.display()))?;
        Ok(Self {
            inner: Mutex::new(AofFile {
                file,
                last_sync: Instant::now(),
            }),
            policy,
        })
    }

    /// Append one encoded record.
    ///
    /// Failures degrade durability silently: they are logged and the client's
    /// request still succeeds.
    pub fn append(&self, record: &[u8]) {
        let mut inner = self.inner.lock();
        if let Err(e) = inner.file.write_all(record) {
            error!("aof append failed: {e}");
            return;
        }
        match self.policy {
            FsyncPolicy::No => {}
            FsyncPolicy::Always => {
                let _ = inner.file.flush();
                let _ = inner.file.sync_data();
            }
            FsyncPolicy::EverySec => {
                if inner.last_sync.elapsed() >= Duration::from_millis(1000) {
                    let _ = inner.file.flush();
                    let _ = inner.file.sync_data();
                    inner.last_sync = Instant::now();
                }
            }
        }
    }

    /// Force buffered records to disk.
    pub fn flush(&self) {
        let mut inner = self.inner.lock();
        let _ = inner.file.flush();
        let _ = inner.file.sync_data();
        inner.last_sync = Instant::now();
    }
}

/// Decode the log at `path` start to EOF, invoking `on_frame` per record.
///
/// Returns the number of records handed over. A missing file is an empty
/// log; an undecodable or truncated record ends the scan with a warning and
/// the cleanly parsed prefix stands.
pub fn replay(path: &Path, mut on_frame: impl FnMut(&Frame)) -> Result<usize> {
    let data = match std::fs::read(path) {
        Ok(data) => data,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(e).with_context(|| format!("read aof {}", path.display())),
    };

    let mut offset = 0usize;
    let mut replayed = 0usize;
    while offset < data.len() {
        match Frame::parse(&data[offset..]) {
            Ok((consumed, frame)) => {
                on_frame(&frame);
                offset += consumed;
                replayed += 1;
            }
            Err(FrameError::Incomplete) => {
                warn!(
                    "aof: truncated record at byte {offset}, keeping {replayed} replayed records"
                );
                break;
            }
            Err(e) => {
                warn!("aof: damaged record at byte {offset} ({e}), keeping {replayed} replayed records");
                break;
            }
        }
    }
    Ok(replayed)
}

//
// Record emitters
//
// Synthetic records for the two commands whose log form depends on the
// handler's outcome. Everything else is appended as the original request.
//

/// `EXPIRE key seconds [flag]`, written only after the handler returned 1.
pub fn emit_expire(key: &[u8], seconds: &[u8], flag: Option<&[u8]>) -> Vec<u8> {
    let mut args = vec![b"EXPIRE".to_vec(), key.to_vec(), seconds.to_vec()];
    if let Some(flag) = flag {
        args.push(flag.to_vec());
    }
    encode_request(&args)
}

/// `DEL k1 k2 ...`, written only after at least one key was deleted.
pub fn emit_del(keys: &[Vec<u8>]) -> Vec<u8> {
    let mut args = Vec::with_capacity(1 + keys.len());
    args.push(b"DEL".to_vec());
    args.extend(keys.iter().cloned());
    encode_request(&args)
}
