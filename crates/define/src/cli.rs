use crate::tracing::{Level, LogLevel, TracingConfig, TracingFormat};
use clap::Parser;
use define_core::ProviderConfig;

/// Exit code for a successful run, including silently dropped input
pub const EXIT_OK: i32 = 0;
/// Exit code for fatal startup failures such as an unbindable socket
pub const EXIT_FAILURE: i32 = 1;

/// Command-line interface for define.
#[derive(Parser, Debug, Clone)]
#[command(name = "define")]
#[command(about = "Show the definition of a word, or of the current selection, as a notification")]
#[command(long_about = None)]
#[command(version)]
pub struct Cli {
    /// Words to look up; only the first word is used. Reads the selection when omitted.
    #[arg(value_name = "WORD")]
    pub words: Vec<String>,

    /// Run the lookup daemon.
    #[arg(long, help = "Run the lookup daemon on the per-user socket")]
    pub daemon: bool,

    /// Show the most recent definition in the full-text viewer.
    #[arg(long, help = "Open the full text of the most recent definition")]
    pub full: bool,

    /// Skip the local `dict` backend.
    #[arg(long, help = "Do not fall back to the offline dictionary")]
    pub no_offline: bool,

    /// Ignore cached definitions.
    #[arg(long, help = "Ignore cached definitions and query providers again")]
    pub force_online: bool,

    /// Shorthand for `--level debug`.
    #[arg(long, help = "Enable debug logging")]
    pub debug: bool,

    /// Logging verbosity level.
    #[arg(
        short = 'L',
        long,
        env = "DEFINE_LOG_LEVEL",
        help = "Set logging level",
        default_value = "warn",
        value_enum
    )]
    pub level: LogLevel,

    /// Log output format.
    #[arg(
        long,
        env = "DEFINE_LOG_FORMAT",
        help = "Log output format",
        default_value = "compact",
        value_enum
    )]
    pub log_format: TracingFormat,

    /// Log results instead of raising desktop notifications.
    #[arg(long, help = "Log definitions instead of showing notifications")]
    pub no_notify: bool,
}

impl Cli {
    /// Level after applying `--debug`
    #[must_use]
    pub fn effective_level(&self) -> Level {
        if self.debug {
            Level::DEBUG
        } else {
            self.level.into()
        }
    }

    /// Tracing settings derived from the logging flags
    #[must_use]
    pub fn tracing_config(&self) -> TracingConfig {
        TracingConfig {
            format: self.log_format,
            level: self.effective_level(),
            filter: None,
        }
    }

    /// Word arguments joined back into one input string, if any were given
    #[must_use]
    pub fn input(&self) -> Option<String> {
        (!self.words.is_empty()).then(|| self.words.join(" "))
    }

    /// Provider settings with the offline backend toggled by `--no-offline`
    #[must_use]
    pub fn provider_config(&self) -> ProviderConfig {
        ProviderConfig {
            offline: !self.no_offline,
            ..ProviderConfig::default()
        }
    }
}

/// Parse the process arguments.
#[must_use]
pub fn parse() -> Cli {
    Cli::parse()
}
