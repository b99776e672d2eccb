//! End-to-end daemon tests over a real Unix socket.

use async_trait::async_trait;
use define::daemon::client::CONNECT_TIMEOUT;
use define::daemon::{Daemon, DaemonConfig, OneShot, oneshot_config, send_word};
use define::notify::Notifier;
use define_core::cache::store::read_snapshot;
use define_core::{
    DefinitionProvider, Error, PersistedStore, ProviderChain, Resolution, Resolver, ResolverConfig,
    Result, SourceKind,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::timeout;

struct StubProvider {
    calls: AtomicUsize,
    delay: Duration,
}

impl StubProvider {
    fn new() -> Arc<Self> {
        Self::slow(Duration::ZERO)
    }

    fn slow(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            delay,
        })
    }
}

#[async_trait]
impl DefinitionProvider for StubProvider {
    fn name(&self) -> &'static str {
        "stub"
    }

    fn source_kind(&self) -> SourceKind {
        SourceKind::Online
    }

    fn timeout(&self) -> Duration {
        Duration::from_millis(500)
    }

    async fn lookup(&self, word: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        match word {
            "legend" => Ok("A story of old.".to_string()),
            "myth" => Ok("A traditional tale.".to_string()),
            _ => Err(Error::provider("stub", "unknown word")),
        }
    }
}

/// Forwards every notification to the test.
struct RecordingNotifier {
    tx: mpsc::UnboundedSender<Resolution>,
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, resolution: &Resolution) {
        let _ = self.tx.send(resolution.clone());
    }
}

struct Harness {
    tmp: TempDir,
    socket: PathBuf,
    provider: Arc<StubProvider>,
    notifications: mpsc::UnboundedReceiver<Resolution>,
    daemon: Arc<Daemon>,
    task: JoinHandle<Result<()>>,
}

impl Harness {
    async fn start() -> Self {
        Self::start_with(StubProvider::new()).await
    }

    async fn start_with(provider: Arc<StubProvider>) -> Self {
        let tmp = TempDir::new().unwrap();
        let socket = tmp.path().join("run").join("define.sock");
        let resolver = resolver(tmp.path(), Arc::clone(&provider), ResolverConfig::default());

        let (tx, notifications) = mpsc::unbounded_channel();
        let config = DaemonConfig {
            flush_interval: Duration::from_millis(50),
            ..DaemonConfig::new(&socket)
        };
        let daemon = Arc::new(Daemon::new(config, resolver, Arc::new(RecordingNotifier { tx })));

        let runner = Arc::clone(&daemon);
        let task = tokio::spawn(async move { runner.run().await });
        wait_for_socket(&socket).await;

        Self {
            tmp,
            socket,
            provider,
            notifications,
            daemon,
            task,
        }
    }

    async fn send(&self, payload: &str) {
        assert!(send_word(&self.socket, payload, Duration::from_secs(1)).await);
    }

    async fn next(&mut self) -> Option<Resolution> {
        timeout(Duration::from_secs(2), self.notifications.recv())
            .await
            .ok()
            .flatten()
    }

    async fn quiet(&mut self) -> bool {
        timeout(Duration::from_millis(300), self.notifications.recv())
            .await
            .is_err()
    }

    fn cache_file(&self) -> PathBuf {
        self.tmp.path().join("cache.json")
    }
}

fn resolver(dir: &Path, provider: Arc<StubProvider>, config: ResolverConfig) -> Arc<Resolver> {
    let store = Arc::new(PersistedStore::open(dir.join("cache.json")));
    let config = ResolverConfig {
        last_file: Some(dir.join("last.txt")),
        ..config
    };
    let chain = ProviderChain::new(vec![provider]);
    Arc::new(Resolver::new(config, chain, store).unwrap())
}

async fn wait_for_socket(socket: &Path) {
    for _ in 0..100 {
        if socket.exists() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("daemon never bound {}", socket.display());
}

#[tokio::test]
async fn test_daemon_resolves_and_notifies() {
    let mut h = Harness::start().await;

    h.send("  \"Legends,\"  ").await;
    let resolution = h.next().await.expect("no notification");

    assert_eq!(resolution.word, "Legends");
    assert_eq!(resolution.used_lemma.as_deref(), Some("legend"));
    assert!(resolution.title.contains("Legends → Legend"));
    assert_eq!(resolution.full, "A story of old.");
}

#[tokio::test]
async fn test_duplicate_triggers_are_suppressed() {
    let mut h = Harness::start().await;

    h.send("myth").await;
    h.send("MYTH").await;

    assert!(h.next().await.is_some());
    assert!(h.quiet().await, "second trigger inside the window must be dropped");

    tokio::time::sleep(Duration::from_millis(300)).await;
    h.send("myth").await;
    let again = h.next().await.expect("trigger after the window must resolve");
    assert!(again.from_cache());
    assert_eq!(h.provider.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_invalid_requests_are_dropped() {
    let mut h = Harness::start().await;

    h.send("").await;
    h.send("@@@").await;
    h.send(&"a".repeat(80)).await;

    assert!(h.quiet().await);
    assert_eq!(h.provider.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_concurrent_clients_are_all_served() {
    let mut h = Harness::start().await;

    let words = ["legend", "myth", "zzqx"];
    let sends = words.map(|word| {
        let socket = h.socket.clone();
        tokio::spawn(async move { send_word(&socket, word, Duration::from_secs(1)).await })
    });
    for send in sends {
        assert!(send.await.unwrap());
    }

    let mut seen = Vec::new();
    for _ in 0..words.len() {
        seen.push(h.next().await.expect("missing notification").key);
    }
    seen.sort();
    assert_eq!(seen, vec!["legend", "myth", "zzqx"]);
}

#[tokio::test]
async fn test_store_is_flushed_in_background() {
    let mut h = Harness::start().await;

    h.send("legend").await;
    h.next().await.expect("no notification");

    let cache_file = h.cache_file();
    let mut flushed = false;
    for _ in 0..40 {
        if let Ok(snapshot) = read_snapshot(&cache_file)
            && snapshot.contains_key("legend")
        {
            flushed = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(25)).await;
    }
    assert!(flushed, "dirty store was not flushed");
    assert_eq!(
        std::fs::read_to_string(h.tmp.path().join("last.txt")).unwrap(),
        "A story of old."
    );
}

#[tokio::test]
async fn test_shutdown_flushes_and_removes_socket() {
    let mut h = Harness::start().await;

    h.send("myth").await;
    h.next().await.expect("no notification");

    h.daemon.shutdown();
    timeout(Duration::from_secs(2), &mut h.task)
        .await
        .expect("daemon did not stop")
        .unwrap()
        .unwrap();

    assert!(!h.socket.exists());
    assert!(read_snapshot(&h.cache_file()).unwrap().contains_key("myth"));
    assert!(!send_word(&h.socket, "myth", CONNECT_TIMEOUT).await);
}

#[tokio::test]
async fn test_shutdown_waits_for_in_flight_requests() {
    let mut h = Harness::start_with(StubProvider::slow(Duration::from_millis(300))).await;

    h.send("legend").await;
    tokio::time::sleep(Duration::from_millis(50)).await;
    h.daemon.shutdown();
    timeout(Duration::from_secs(5), &mut h.task)
        .await
        .expect("daemon did not stop")
        .unwrap()
        .unwrap();

    // Persisted by the final flush, before run() returned
    let snapshot = read_snapshot(&h.cache_file()).unwrap();
    assert_eq!(snapshot["legend"].full, "A story of old.");
    assert!(h.next().await.is_some());
}

#[cfg(unix)]
#[tokio::test]
async fn test_socket_is_owner_only() {
    use std::os::unix::fs::PermissionsExt;

    let h = Harness::start().await;
    // Permissions are applied right after bind
    tokio::time::sleep(Duration::from_millis(50)).await;

    let mode = std::fs::metadata(&h.socket).unwrap().permissions().mode();
    assert_eq!(mode & 0o777, 0o600);
}

#[tokio::test]
async fn test_bind_failure_is_reported() {
    let tmp = TempDir::new().unwrap();
    // A regular file where the socket's directory should be
    let blocker = tmp.path().join("not-a-dir");
    std::fs::write(&blocker, b"").unwrap();

    let provider = StubProvider::new();
    let resolver = resolver(tmp.path(), provider, ResolverConfig::default());
    let (tx, _rx) = mpsc::unbounded_channel();
    let daemon = Daemon::new(
        DaemonConfig::new(blocker.join("define.sock")),
        resolver,
        Arc::new(RecordingNotifier { tx }),
    );

    assert!(daemon.run().await.is_err());
}

#[tokio::test]
async fn test_oneshot_resolves_flushes_and_notifies() {
    let tmp = TempDir::new().unwrap();
    let provider = StubProvider::new();
    let resolver = resolver(
        tmp.path(),
        Arc::clone(&provider),
        oneshot_config(ResolverConfig::default()),
    );
    let (tx, mut rx) = mpsc::unbounded_channel();

    let resolution = OneShot::new(resolver, Arc::new(RecordingNotifier { tx }))
        .run("legend")
        .await;

    assert_eq!(resolution.source_kind, SourceKind::Online);
    assert_eq!(rx.recv().await.unwrap(), resolution);
    let snapshot = read_snapshot(&tmp.path().join("cache.json")).unwrap();
    assert_eq!(snapshot["legend"].full, "A story of old.");

    // A second process reuses the persisted result
    let second = resolver_for_second_process(tmp.path(), &provider);
    assert!(second.resolve("legend").await.from_cache());
    assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
}

fn resolver_for_second_process(dir: &Path, provider: &Arc<StubProvider>) -> Arc<Resolver> {
    resolver(
        dir,
        Arc::clone(provider),
        oneshot_config(ResolverConfig::default()),
    )
}
