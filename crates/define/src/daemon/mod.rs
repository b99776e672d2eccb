//! Lookup daemon and its one-shot client.
//!
//! The daemon is a Unix domain socket server holding the shared resolver,
//! so repeated lookups are served from a warm memory tier.
//!
//! # Protocol
//!
//! ```text
//! client ──connect──► $XDG_RUNTIME_DIR/define.sock
//!        ──"word"───►  (one raw write, then close; no framing, no reply)
//!
//! daemon: read ≤ 4096 bytes within 900ms ─► pick word ─► validate ─► dedupe
//!         ─► resolve ─► notify
//! ```
//!
//! When no daemon answers, the client resolves in-process against the same
//! persisted store.

pub mod client;
pub mod server;

pub use client::{OneShot, oneshot_config, send_word};
pub use server::Daemon;

use define_core::dedupe;
use define_core::paths;
use std::path::PathBuf;
use std::time::Duration;

/// Daemon configuration.
#[derive(Debug, Clone)]
pub struct DaemonConfig {
    /// Socket the daemon listens on
    pub socket: PathBuf,
    /// Deadline for reading a request after accepting it
    pub read_timeout: Duration,
    /// Largest request read from a connection, in bytes
    pub max_request_bytes: usize,
    /// Interval between dirty checks of the persisted tier
    pub flush_interval: Duration,
    /// Window during which repeated requests for a word are dropped
    pub dedupe_window: Duration,
    /// How long shutdown waits for in-flight requests before the final flush
    pub drain_timeout: Duration,
}

impl DaemonConfig {
    /// Defaults listening on `socket`
    #[must_use]
    pub fn new(socket: impl Into<PathBuf>) -> Self {
        Self {
            socket: socket.into(),
            read_timeout: Duration::from_millis(900),
            max_request_bytes: 4096,
            flush_interval: Duration::from_secs(2),
            dedupe_window: dedupe::DEFAULT_WINDOW,
            drain_timeout: Duration::from_secs(10),
        }
    }

    /// Defaults listening on the per-user runtime socket.
    pub fn from_env() -> define_core::Result<Self> {
        Ok(Self::new(paths::socket_path()?))
    }
}
