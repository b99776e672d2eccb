//! One-shot client.
//!
//! Hands the word to a running daemon when one answers quickly, otherwise
//! resolves it in this process.

use super::server::flush_now;
use crate::notify::Notifier;
use define_core::{Resolution, Resolver, ResolverConfig};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::net::UnixStream;
use tokio::time::timeout;
use tracing::debug;

/// How long the client waits for the daemon to accept.
pub const CONNECT_TIMEOUT: Duration = Duration::from_millis(80);

/// Memory tier capacity for an in-process lookup.
pub const ONESHOT_MEMORY_CAPACITY: usize = 64;

/// Memory tier lifetime for an in-process lookup, in minutes.
pub const ONESHOT_MEMORY_TTL_MINUTES: i64 = 10;

/// Resolver settings for a short-lived in-process lookup.
#[must_use]
pub fn oneshot_config(base: ResolverConfig) -> ResolverConfig {
    ResolverConfig {
        memory_capacity: ONESHOT_MEMORY_CAPACITY,
        memory_ttl: chrono::Duration::minutes(ONESHOT_MEMORY_TTL_MINUTES),
        ..base
    }
}

/// Write `word` to the daemon at `socket`.
///
/// Returns `false` when no daemon accepted the connection in time, in which
/// case the caller should resolve locally.
pub async fn send_word(socket: &Path, word: &str, connect_timeout: Duration) -> bool {
    if !socket.exists() {
        return false;
    }

    let mut stream = match timeout(connect_timeout, UnixStream::connect(socket)).await {
        Ok(Ok(stream)) => stream,
        Ok(Err(e)) => {
            debug!(socket = %socket.display(), error = %e, "Daemon not reachable");
            return false;
        }
        Err(_) => {
            debug!(socket = %socket.display(), "Daemon connect timed out");
            return false;
        }
    };

    // Fire and forget: the daemon has accepted, so a failed write is not retried locally
    if let Err(e) = stream.write_all(word.as_bytes()).await {
        debug!(error = %e, "Failed to send word to daemon");
    }
    if let Err(e) = stream.shutdown().await {
        debug!(error = %e, "Failed to close daemon connection");
    }
    true
}

/// In-process lookup used when no daemon is running.
pub struct OneShot {
    resolver: Arc<Resolver>,
    notifier: Arc<dyn Notifier>,
}

impl OneShot {
    /// Lookup through `resolver`, presenting results with `notifier`
    #[must_use]
    pub fn new(resolver: Arc<Resolver>, notifier: Arc<dyn Notifier>) -> Self {
        Self { resolver, notifier }
    }

    /// Resolve `word`, persist the store before presenting the result, and notify.
    pub async fn run(&self, word: &str) -> Resolution {
        let resolution = self.resolver.resolve(word).await;
        flush_now(self.resolver.store()).await;
        self.notifier.notify(&resolution).await;
        resolution
    }
}
