/*!
 * Network layer and event loop.
 *
 * A mio poll loop owns the listener and every client socket. Parsed requests
 * fan out to worker threads over per-worker channels; a connection always
 * hashes to the same worker, which keeps its commands in arrival order.
 * Replies come back through a shared channel drained on waker notifications.
 * Blocking commands leave the pool for a dedicated wait thread so a parked
 * BLPOP can never starve command execution.
 */

use crate::engine::{is_blocking, Engine};
use crate::protocol::{parse_requests, Frame, Request};
use anyhow::Result;
use bytes::BytesMut;
use crossbeam::channel::{bounded, Receiver, Sender, TryRecvError};
use log::{debug, info, warn};
use mio::net::{TcpListener, TcpStream};
use mio::{Events, Interest, Poll, Token, Waker};
use rustc_hash::FxHashMap;
use socket2::{Domain, Socket, Type};
use std::io::{Read, Write};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

/// Size of the per-read scratch buffer.
const READ_BUF: usize = 4096;

/// Build the listener through socket2 so SO_REUSEADDR is set before bind.
pub fn bind_listener(addr: SocketAddr) -> Result<TcpListener> {
    let socket = Socket::new(
        Domain::for_address(addr),
        Type::STREAM,
        Some(socket2::Protocol::TCP),
    )?;
    socket.set_reuse_address(true)?;
    socket.set_nonblocking(true)?;
    socket.bind(&addr.into())?;
    socket.listen(1024)?;
    Ok(TcpListener::from_std(socket.into()))
}

/// Accept loop plus per-connection read/dispatch/write handling.
///
/// Blocks for the life of the process.
pub fn run_server(addr: SocketAddr, engine: Engine) -> Result<()> {
    let mut poll = Poll::new()?;
    let mut events = Events::with_capacity(1024);
    let mut listener = bind_listener(addr)?;
    const LISTENER: Token = Token(0);
    const WAKER_TOKEN: Token = Token(usize::MAX - 1);

    poll.registry()
        .register(&mut listener, LISTENER, Interest::READABLE)?;

    let engine = Arc::new(engine);
    let waker = Arc::new(Waker::new(poll.registry(), WAKER_TOKEN)?);
    let (tx_resp, rx_resp): (Sender<(usize, Vec<u8>)>, Receiver<(usize, Vec<u8>)>) = bounded(1024);

    // One task queue per worker, indexed by connection token.
    let workers = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4);
    let mut tx_tasks: Vec<Sender<(usize, Request)>> = Vec::with_capacity(workers);
    for _ in 0..workers {
        let (tx_task, rx_task) = bounded::<(usize, Request)>(1024);
        tx_tasks.push(tx_task);
        let engine = Arc::clone(&engine);
        let tx_resp = tx_resp.clone();
        let waker = Arc::clone(&waker);
        std::thread::spawn(move || worker_loop(rx_task, engine, tx_resp, waker));
    }

    // token -> (socket, read buffer, write buffer)
    let mut clients: FxHashMap<usize, (TcpStream, BytesMut, BytesMut)> = FxHashMap::default();
    let mut next_token: usize = 1;

    info!("listening on {addr}");

    loop {
        poll.poll(&mut events, Some(Duration::from_millis(200)))?;

        for ev in events.iter() {
            match ev.token() {
                LISTENER => loop {
                    match listener.accept() {
                        Ok((mut sock, peer)) => {
                            sock.set_nodelay(true).ok();
                            let token = next_token;
                            next_token += 1;
                            poll.registry().register(
                                &mut sock,
                                Token(token),
                                Interest::READABLE | Interest::WRITABLE,
                            )?;
                            debug!("client {peer} connected as #{token}");
                            clients.insert(
                                token,
                                (sock, BytesMut::with_capacity(READ_BUF), BytesMut::new()),
                            );
                        }
                        Err(ref e) if would_block(e) => break,
                        Err(e) => {
                            warn!("accept error: {e}");
                            break;
                        }
                    }
                },

                // A worker finished; drain everything it queued.
                WAKER_TOKEN => loop {
                    match rx_resp.try_recv() {
                        Ok((token, reply)) => {
                            let mut dead = false;
                            if let Some((sock, _rbuf, wbuf)) = clients.get_mut(&token) {
                                wbuf.extend_from_slice(&reply);
                                dead = !flush(sock, wbuf);
                            }
                            if dead && clients.remove(&token).is_some() {
                                debug!("client #{token} disconnected");
                            }
                        }
                        Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
                    }
                },

                Token(token) => {
                    let mut should_remove = false;
                    if let Some((sock, rbuf, wbuf)) = clients.get_mut(&token) {
                        if ev.is_readable() {
                            let mut tmp = [0u8; READ_BUF];
                            loop {
                                match sock.read(&mut tmp) {
                                    Ok(0) => {
                                        should_remove = true;
                                        break;
                                    }
                                    Ok(n) => rbuf.extend_from_slice(&tmp[..n]),
                                    Err(ref e) if would_block(e) => break,
                                    Err(_) => {
                                        should_remove = true;
                                        break;
                                    }
                                }
                            }

                            if !should_remove {
                                let mut requests = Vec::new();
                                match parse_requests(rbuf, &mut requests) {
                                    Ok(()) => {
                                        for request in requests {
                                            if tx_tasks[token % workers]
                                                .try_send((token, request))
                                                .is_err()
                                            {
                                                wbuf.extend_from_slice(b"-ERR server busy\r\n");
                                            }
                                        }
                                    }
                                    Err(e) => {
                                        // Garbage poisons the whole stream: reply
                                        // once, then drop the connection.
                                        let reply = Frame::Error(format!("ERR {e}"));
                                        wbuf.extend_from_slice(&reply.encode());
                                        should_remove = true;
                                    }
                                }
                                if !wbuf.is_empty() && !flush(sock, wbuf) {
                                    should_remove = true;
                                }
                            }
                        }

                        if !should_remove && ev.is_writable() && !wbuf.is_empty() && !flush(sock, wbuf) {
                            should_remove = true;
                        }
                    }

                    if should_remove && clients.remove(&token).is_some() {
                        debug!("client #{token} disconnected");
                    }
                }
            }
        }
    }
}

fn worker_loop(
    rx_task: Receiver<(usize, Request)>,
    engine: Arc<Engine>,
    tx_resp: Sender<(usize, Vec<u8>)>,
    waker: Arc<Waker>,
) {
    while let Ok((token, request)) = rx_task.recv() {
        if is_blocking(&request) {
            // Park the wait on its own thread; the pool stays available.
            let engine = Arc::clone(&engine);
            let tx_resp = tx_resp.clone();
            let waker = Arc::clone(&waker);
            std::thread::spawn(move || {
                let reply = engine.exec(&request);
                if tx_resp.send((token, reply)).is_ok() {
                    let _ = waker.wake();
                }
            });
            continue;
        }
        let reply = engine.exec(&request);
        if tx_resp.send((token, reply)).is_ok() {
            let _ = waker.wake();
        }
    }
}

/// Write as much of `wbuf` as the socket accepts right now.
/// Returns false when the connection is beyond saving.
fn flush(sock: &mut TcpStream, wbuf: &mut BytesMut) -> bool {
    while !wbuf.is_empty() {
        match sock.write(&wbuf[..]) {
            Ok(0) => return false,
            Ok(n) => {
                let _ = wbuf.split_to(n);
            }
            Err(ref e) if would_block(e) => return true,
            Err(_) => return false,
        }
    }
    true
}

#[inline]
fn would_block(e: &std::io::Error) -> bool {
    matches!(
        e.kind(),
        std::io::ErrorKind::WouldBlock | std::io::ErrorKind::Interrupted
    )
}
