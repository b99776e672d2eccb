//! define CLI
//!
//! With a word (or the current selection) it hands the lookup to the daemon
//! if one is running, and resolves in-process otherwise.

// The panic hook and pre-tracing failures write to stderr directly
#![allow(clippy::print_stderr)]

use define::cli::{self, Cli, EXIT_FAILURE, EXIT_OK};
use define::daemon::{self, Daemon, DaemonConfig, OneShot, oneshot_config};
use define::notify::{DesktopNotifier, FullViewer, LogNotifier, Notifier};
use define::selection::SelectionSource;
use define::tracing::init_tracing;
use define_core::{
    PersistedStore, ProviderChain, Resolver, ResolverConfig, paths, pick_word, valid_word,
};
use std::sync::Arc;
use tracing::{debug, error, info};

fn main() {
    std::panic::set_hook(Box::new(|panic_info| {
        eprintln!("Application panicked: {panic_info}");
        eprintln!("Internal error occurred. Run with RUST_LOG=debug for more information.");
    }));

    let cli = cli::parse();

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Fatal error: Failed to create tokio runtime: {e}");
            std::process::exit(EXIT_FAILURE);
        }
    };

    let exit_code = rt.block_on(run(cli));
    std::process::exit(exit_code);
}

async fn run(cli: Cli) -> i32 {
    if let Err(e) = init_tracing(cli.tracing_config()) {
        eprintln!("{e:?}");
    }

    match dispatch(cli).await {
        Ok(()) => EXIT_OK,
        Err(e) => {
            error!(error = %e, "define failed");
            eprintln!("{e:?}");
            EXIT_FAILURE
        }
    }
}

async fn dispatch(cli: Cli) -> miette::Result<()> {
    if cli.full {
        show_last().await;
        return Ok(());
    }

    let notifier: Arc<dyn Notifier> = if cli.no_notify {
        Arc::new(LogNotifier)
    } else {
        Arc::new(DesktopNotifier::default())
    };

    if cli.daemon {
        return run_daemon(&cli, notifier).await;
    }

    run_client(&cli, notifier).await
}

fn build_resolver(cli: &Cli, config: ResolverConfig) -> miette::Result<Arc<Resolver>> {
    let store = Arc::new(PersistedStore::open(paths::cache_file()?));
    let chain = ProviderChain::from_config(&cli.provider_config())?;
    debug!(providers = ?chain.names(), "Provider chain ready");

    let config = ResolverConfig {
        use_cache_reads: !cli.force_online,
        last_file: Some(paths::last_file()?),
        ..config
    };
    Ok(Arc::new(Resolver::new(config, chain, store)?))
}

async fn run_daemon(cli: &Cli, notifier: Arc<dyn Notifier>) -> miette::Result<()> {
    let resolver = build_resolver(cli, ResolverConfig::default())?;
    let daemon = Daemon::new(DaemonConfig::from_env()?, resolver, notifier);

    let token = daemon.shutdown_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupted");
            token.cancel();
        }
    });

    daemon.run().await?;
    Ok(())
}

async fn run_client(cli: &Cli, notifier: Arc<dyn Notifier>) -> miette::Result<()> {
    let raw = match cli.input() {
        Some(input) => input,
        None => SelectionSource::default().capture().await.unwrap_or_default(),
    };

    let word = pick_word(&raw);
    if !valid_word(&word) {
        debug!(bytes = raw.len(), "Nothing to define");
        return Ok(());
    }

    let socket = paths::socket_path()?;
    if daemon::send_word(&socket, &word, daemon::client::CONNECT_TIMEOUT).await {
        debug!(word = %word, "Handed to daemon");
        return Ok(());
    }

    let resolver = build_resolver(cli, oneshot_config(ResolverConfig::default()))?;
    OneShot::new(resolver, notifier).run(&word).await;
    Ok(())
}

async fn show_last() {
    match paths::last_file() {
        Ok(path) => match tokio::fs::read_to_string(&path).await {
            Ok(text) => FullViewer::default().show(&text).await,
            Err(e) => debug!(path = %path.display(), error = %e, "No recent definition"),
        },
        Err(e) => debug!(error = %e, "No cache directory"),
    }
}
