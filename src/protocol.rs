/*!
 * RESP wire protocol: framing, request parsing and response encoding.
 *
 * Client requests arrive as RESP arrays of bulk strings and are decoded by the
 * streaming `parse_request`/`parse_requests` pair, which tolerates partial
 * buffers (pipelined input included). AOF replay uses the full recursive
 * `Frame::parse` decoder, since logged records are read back as arbitrary
 * frames. Every frame encodes into a single contiguous buffer.
 */

use bytes::{Buf, BytesMut};

/// One decoded RESP frame.
///
/// Bulk payloads are opaque bytes; nothing in the codec assumes UTF-8.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// Simple string (`+OK\r\n`)
    Simple(String),
    /// Error (`-ERR ...\r\n`)
    Error(String),
    /// Integer (`:42\r\n`)
    Integer(i64),
    /// Bulk string (`$3\r\nfoo\r\n`)
    Bulk(Vec<u8>),
    /// Null bulk string (`$-1\r\n`)
    Null,
    /// Array of frames (`*2\r\n...`)
    Array(Vec<Frame>),
    /// Null array (`*-1\r\n`)
    NullArray,
}

/// Decode failure, split so callers can tell a short buffer from garbage.
///
/// `Incomplete` means "read more bytes and try again"; `Protocol` means the
/// stream is unrecoverable at this offset.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error("incomplete frame")]
    Incomplete,
    #[error("protocol error: {0}")]
    Protocol(String),
}

/// A client request: the payloads of an array of bulk strings.
pub type Request = Vec<Vec<u8>>;

/// Parse a single client request from the front of `data`.
///
/// Returns the number of bytes consumed together with the bulk payloads.
/// `Err(FrameError::Incomplete)` asks the caller to wait for more input;
/// `Err(FrameError::Protocol)` means the connection is talking garbage.
pub fn parse_request(data: &[u8]) -> Result<(usize, Request), FrameError> {
    if data.is_empty() {
        return Err(FrameError::Incomplete);
    }
    if data[0] != b'*' {
        return Err(FrameError::Protocol(format!(
            "expected array, got {:#04x}",
            data[0]
        )));
    }

    let (mut cursor, n) = read_decimal_line(&data[1..]).map(|(i, n)| (1 + i, n))?;
    if n <= 0 {
        return Err(FrameError::Protocol("empty request array".into()));
    }

    let mut items: Request = Vec::with_capacity(n as usize);
    for _ in 0..n {
        if cursor >= data.len() {
            return Err(FrameError::Incomplete);
        }
        if data[cursor] != b'$' {
            return Err(FrameError::Protocol("expected bulk string".into()));
        }
        let (i, len) = read_decimal_line(&data[cursor + 1..])?;
        cursor += 1 + i;
        if len < 0 {
            return Err(FrameError::Protocol("negative bulk length".into()));
        }
        // payload + trailing \r\n
        let need = len as usize + 2;
        if cursor + need > data.len() {
            return Err(FrameError::Incomplete);
        }
        items.push(data[cursor..cursor + len as usize].to_vec());
        cursor += need;
    }

    Ok((cursor, items))
}

/// Drain every complete request from `buf`, leaving any partial tail in place.
pub fn parse_requests(buf: &mut BytesMut, out: &mut Vec<Request>) -> Result<(), FrameError> {
    loop {
        match parse_request(&buf[..]) {
            Ok((consumed, request)) => {
                buf.advance(consumed);
                out.push(request);
            }
            Err(FrameError::Incomplete) => return Ok(()),
            Err(e) => return Err(e),
        }
    }
}

/// Read a decimal integer terminated by `\r\n`, returning bytes consumed.
fn read_decimal_line(s: &[u8]) -> Result<(usize, i64), FrameError> {
    let mut i = 0;
    while i + 1 < s.len() && !(s[i] == b'\r' && s[i + 1] == b'\n') {
        i += 1;
    }
    if i + 1 >= s.len() {
        return Err(FrameError::Incomplete);
    }
    let num = std::str::from_utf8(&s[..i])
        .ok()
        .and_then(|x| x.parse::<i64>().ok())
        .ok_or_else(|| FrameError::Protocol("invalid length line".into()))?;
    Ok((i + 2, num))
}

impl Frame {
    /// Decode one frame of any kind from the front of `data`.
    ///
    /// Used by AOF replay, where arrays may in principle nest. Returns bytes
    /// consumed; `Incomplete` marks a truncated tail.
    pub fn parse(data: &[u8]) -> Result<(usize, Frame), FrameError> {
        if data.is_empty() {
            return Err(FrameError::Incomplete);
        }
        let (i, line) = read_line(&data[1..])?;
        let consumed = 1 + i;
        match data[0] {
            b'+' => Ok((consumed, Frame::Simple(lossy(line)))),
            b'-' => Ok((consumed, Frame::Error(lossy(line)))),
            b':' => {
                let n = parse_ascii_i64(line)?;
                Ok((consumed, Frame::Integer(n)))
            }
            b'$' => {
                let len = parse_ascii_i64(line)?;
                if len == -1 {
                    return Ok((consumed, Frame::Null));
                }
                if len < 0 {
                    return Err(FrameError::Protocol("negative bulk length".into()));
                }
                let need = len as usize + 2;
                if consumed + need > data.len() {
                    return Err(FrameError::Incomplete);
                }
                let payload = data[consumed..consumed + len as usize].to_vec();
                Ok((consumed + need, Frame::Bulk(payload)))
            }
            b'*' => {
                let count = parse_ascii_i64(line)?;
                if count == -1 {
                    return Ok((consumed, Frame::NullArray));
                }
                if count < 0 {
                    return Err(FrameError::Protocol("negative array length".into()));
                }
                let mut cursor = consumed;
                let mut items = Vec::with_capacity(count as usize);
                for _ in 0..count {
                    let (n, item) = Frame::parse(&data[cursor..])?;
                    cursor += n;
                    items.push(item);
                }
                Ok((cursor, Frame::Array(items)))
            }
            other => Err(FrameError::Protocol(format!(
                "unknown frame marker {other:#04x}"
            ))),
        }
    }

    /// Encode this frame into one contiguous buffer.
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(16);
        self.write_to(&mut out);
        out
    }

    fn write_to(&self, out: &mut Vec<u8>) {
        match self {
            Frame::Simple(s) => {
                out.push(b'+');
                out.extend_from_slice(s.as_bytes());
                out.extend_from_slice(b"\r\n");
            }
            Frame::Error(s) => {
                out.push(b'-');
                out.extend_from_slice(s.as_bytes());
                out.extend_from_slice(b"\r\n");
            }
            Frame::Integer(n) => {
                out.push(b':');
                out.extend_from_slice(n.to_string().as_bytes());
                out.extend_from_slice(b"\r\n");
            }
            Frame::Bulk(b) => {
                out.push(b'$');
                out.extend_from_slice(b.len().to_string().as_bytes());
                out.extend_from_slice(b"\r\n");
                out.extend_from_slice(b);
                out.extend_from_slice(b"\r\n");
            }
            Frame::Null => out.extend_from_slice(b"$-1\r\n"),
            Frame::Array(items) => {
                out.push(b'*');
                out.extend_from_slice(items.len().to_string().as_bytes());
                out.extend_from_slice(b"\r\n");
                for item in items {
                    item.write_to(out);
                }
            }
            Frame::NullArray => out.extend_from_slice(b"*-1\r\n"),
        }
    }

    /// Reinterpret an array-of-bulks frame as a client request.
    ///
    /// Replay uses this to turn logged records back into dispatchable
    /// requests; anything else in the log is skipped.
    pub fn as_request(&self) -> Option<Request> {
        let Frame::Array(items) = self else {
            return None;
        };
        if items.is_empty() {
            return None;
        }
        let mut request = Vec::with_capacity(items.len());
        for item in items {
            match item {
                Frame::Bulk(b) => request.push(b.clone()),
                _ => return None,
            }
        }
        Some(request)
    }
}

fn read_line(s: &[u8]) -> Result<(usize, &[u8]), FrameError> {
    let mut i = 0;
    while i + 1 < s.len() && !(s[i] == b'\r' && s[i + 1] == b'\n') {
        i += 1;
    }
    if i + 1 >= s.len() {
        return Err(FrameError::Incomplete);
    }
    Ok((i + 2, &s[..i]))
}

fn parse_ascii_i64(line: &[u8]) -> Result<i64, FrameError> {
    std::str::from_utf8(line)
        .ok()
        .and_then(|x| x.parse::<i64>().ok())
        .ok_or_else(|| FrameError::Protocol("invalid integer line".into()))
}

fn lossy(b: &[u8]) -> String {
    String::from_utf8_lossy(b).into_owned()
}

/// Encode a request as a RESP array of bulk strings.
///
/// This is the byte-exact form appended to the AOF.
pub fn encode_request(args: &[Vec<u8>]) -> Vec<u8> {
    let mut out = Vec::with_capacity(16 + args.iter().map(|a| a.len() + 16).sum::<usize>());
    out.push(b'*');
    out.extend_from_slice(args.len().to_string().as_bytes());
    out.extend_from_slice(b"\r\n");
    for arg in args {
        out.push(b'$');
        out.extend_from_slice(arg.len().to_string().as_bytes());
        out.extend_from_slice(b"\r\n");
        out.extend_from_slice(arg);
        out.extend_from_slice(b"\r\n");
    }
    out
}
