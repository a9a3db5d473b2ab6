// Core modules for the Ember key-value server
pub mod protocol; // RESP frames: request parser + encoders
pub mod storage; // typed stores: strings, hashes, lists, zsets, bitmaps, filters
pub mod aof; // append-only file writer + replay
pub mod engine; // command dispatch + AOF gating
pub mod net; // listener + event loop + worker pool

// Re-export the public surface for easier access
pub use aof::*;
pub use engine::*;
pub use net::*;
pub use protocol::*;
pub use storage::*;

/// Default listen address - Redis-compatible port 6379
pub const DEFAULT_ADDR: &str = "0.0.0.0:6379";

/// Default append-only file path
pub const DEFAULT_AOF_PATH: &str = "database.aof";
