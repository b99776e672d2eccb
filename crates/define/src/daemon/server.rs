//! Daemon server implementation.
//!
//! One task is spawned per accepted connection; a background task flushes
//! the persisted tier whenever it is dirty.

use super::DaemonConfig;
use crate::notify::Notifier;
use define_core::word::normalize_key;
use define_core::{DedupeGuard, Error, PersistedStore, Resolver, Result, pick_word, valid_word};
use std::io;
use std::path::Path;
use std::sync::Arc;
use tokio::io::AsyncReadExt;
use tokio::net::{UnixListener, UnixStream};
use tokio::time::{Instant, MissedTickBehavior, timeout, timeout_at};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn};

/// State shared by every connection handler.
struct DaemonContext {
    config: DaemonConfig,
    resolver: Arc<Resolver>,
    dedupe: DedupeGuard,
    notifier: Arc<dyn Notifier>,
}

/// Lookup daemon.
pub struct Daemon {
    ctx: Arc<DaemonContext>,
    shutdown: CancellationToken,
    handlers: TaskTracker,
}

impl Daemon {
    /// Create a daemon serving lookups through `resolver`.
    #[must_use]
    pub fn new(config: DaemonConfig, resolver: Arc<Resolver>, notifier: Arc<dyn Notifier>) -> Self {
        let dedupe = DedupeGuard::new(config.dedupe_window);
        Self {
            ctx: Arc::new(DaemonContext {
                config,
                resolver,
                dedupe,
                notifier,
            }),
            shutdown: CancellationToken::new(),
            handlers: TaskTracker::new(),
        }
    }

    /// Socket this daemon listens on
    #[must_use]
    pub fn socket(&self) -> &Path {
        &self.ctx.config.socket
    }

    /// Token that stops [`run`](Self::run) when cancelled
    #[must_use]
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Signal the daemon to shut down.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    /// Bind the socket and serve until shut down.
    ///
    /// # Errors
    ///
    /// Fails only if the socket cannot be bound.
    pub async fn run(&self) -> Result<()> {
        let listener = self.bind().await?;
        self.serve(listener).await;
        Ok(())
    }

    /// Create the socket's directory, replace a stale socket, bind, and
    /// restrict the socket to its owner.
    pub async fn bind(&self) -> Result<UnixListener> {
        let socket = self.socket();

        if let Some(parent) = socket.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| Error::io(e, parent, "create_dir_all"))?;
        }

        match tokio::fs::remove_file(socket).await {
            Ok(()) => debug!(socket = %socket.display(), "Removed stale socket"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => debug!(socket = %socket.display(), error = %e, "Could not remove stale socket"),
        }

        let listener = UnixListener::bind(socket).map_err(|e| Error::io(e, socket, "bind"))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if let Err(e) =
                tokio::fs::set_permissions(socket, std::fs::Permissions::from_mode(0o600)).await
            {
                warn!(socket = %socket.display(), error = %e, "Failed to restrict socket permissions");
            }
        }

        Ok(listener)
    }

    /// Accept connections on `listener` until shut down, then drain in-flight
    /// requests, flush and clean up.
    pub async fn serve(&self, listener: UnixListener) {
        info!(socket = %self.socket().display(), "define daemon listening");

        let flush_token = self.shutdown.child_token();
        let flusher = tokio::spawn(flush_loop(
            Arc::clone(self.ctx.resolver.store()),
            self.ctx.config.flush_interval,
            flush_token.clone(),
        ));

        loop {
            tokio::select! {
                result = listener.accept() => {
                    match result {
                        Ok((stream, _)) => self.handle_connection(stream),
                        Err(e) => warn!(error = %e, "Failed to accept connection"),
                    }
                }

                () = self.shutdown.cancelled() => {
                    info!("Shutdown signal received");
                    break;
                }
            }
        }

        drop(listener);
        self.drain().await;
        flush_token.cancel();
        if let Err(e) = flusher.await {
            debug!(error = %e, "Flush task ended abnormally");
        }
        flush_now(self.ctx.resolver.store()).await;
        self.cleanup().await;
    }

    fn handle_connection(&self, stream: UnixStream) {
        let ctx = Arc::clone(&self.ctx);
        self.handlers.spawn(async move {
            handle_request(&ctx, stream).await;
        });
    }

    /// Wait for accepted requests so their results reach the final flush.
    async fn drain(&self) {
        self.handlers.close();
        if !self.handlers.is_empty() {
            debug!(pending = self.handlers.len(), "Waiting for in-flight requests");
        }
        if timeout(self.ctx.config.drain_timeout, self.handlers.wait())
            .await
            .is_err()
        {
            warn!(
                pending = self.handlers.len(),
                "In-flight requests still running at shutdown"
            );
        }
    }

    async fn cleanup(&self) {
        if let Err(e) = tokio::fs::remove_file(self.socket()).await
            && e.kind() != io::ErrorKind::NotFound
        {
            debug!(error = %e, "Failed to remove socket");
        }
        info!("define daemon shutdown complete");
    }
}

async fn handle_request(ctx: &DaemonContext, mut stream: UnixStream) {
    let raw = match read_request(
        &mut stream,
        ctx.config.max_request_bytes,
        Instant::now() + ctx.config.read_timeout,
    )
    .await
    {
        Ok(raw) => raw,
        Err(e) => {
            debug!(error = %e, "Failed to read request");
            return;
        }
    };
    drop(stream);

    let word = pick_word(&raw);
    if !valid_word(&word) {
        debug!(bytes = raw.len(), "Dropping invalid request");
        return;
    }

    let key = normalize_key(&word);
    if !ctx.dedupe.allow(&key) {
        debug!(key = %key, "Suppressed duplicate request");
        return;
    }

    let resolution = ctx.resolver.resolve(&word).await;
    ctx.notifier.notify(&resolution).await;
}

/// Read until EOF, `max` bytes, or `deadline`, whichever comes first.
///
/// Hitting the deadline keeps whatever arrived before it.
async fn read_request(stream: &mut UnixStream, max: usize, deadline: Instant) -> io::Result<String> {
    let mut buf = vec![0u8; max];
    let mut filled = 0;

    while filled < max {
        match timeout_at(deadline, stream.read(&mut buf[filled..])).await {
            Ok(Ok(0)) | Err(_) => break,
            Ok(Ok(n)) => filled += n,
            Ok(Err(e)) => return Err(e),
        }
    }

    Ok(String::from_utf8_lossy(&buf[..filled]).into_owned())
}

async fn flush_loop(store: Arc<PersistedStore>, interval: std::time::Duration, token: CancellationToken) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = ticker.tick() => flush_now(&store).await,
            () = token.cancelled() => break,
        }
    }
}

/// Flush `store` off the async workers if it is dirty.
pub(crate) async fn flush_now(store: &Arc<PersistedStore>) {
    if !store.is_dirty() {
        return;
    }
    let store = Arc::clone(store);
    // Write failures are logged by the store and retried on the next tick
    if let Err(e) = tokio::task::spawn_blocking(move || store.flush()).await {
        warn!(error = %e, "Flush task panicked");
    }
}
