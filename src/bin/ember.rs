/*!
 * Ember server entry point.
 *
 * Boot order: logging, configuration from the environment, AOF open, replay,
 * then the accept loop. Replay finishes before the first connection is
 * accepted, so reconstruction never races live traffic.
 *
 * Configuration:
 *   EMBER_ADDR   listen address (default 0.0.0.0:6379)
 *   EMBER_AOF    append-only file path (default database.aof)
 *   EMBER_FSYNC  durability mode: no | always | everysec (default everysec)
 *   RUST_LOG     log filter, e.g. RUST_LOG=debug
 */

use anyhow::{Context, Result};
use ember::*;
use log::info;
use std::net::ToSocketAddrs;
use std::path::Path;

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

fn main() -> Result<()> {
    env_logger::init();

    let addr = std::env::var("EMBER_ADDR").unwrap_or_else(|_| DEFAULT_ADDR.to_string());
    let addr = addr
        .to_socket_addrs()?
        .next()
        .context("unusable listen address")?;
    let aof_path = std::env::var("EMBER_AOF").unwrap_or_else(|_| DEFAULT_AOF_PATH.to_string());
    let policy = std::env::var("EMBER_FSYNC")
        .ok()
        .and_then(|name| FsyncPolicy::from_name(&name))
        .unwrap_or(FsyncPolicy::EverySec);

    let aof = Aof::open(Path::new(&aof_path), policy)?;
    let engine = Engine::new(Some(aof));

    let replayed = engine.replay(Path::new(&aof_path))?;
    if replayed > 0 {
        info!("replayed {replayed} records from {aof_path}");
    }

    println!("ember listening on {addr}");
    net::run_server(addr, engine)
}
