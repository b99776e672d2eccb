//! Notification and full-text display.
//!
//! Results are handed to a [`Notifier`]. The desktop implementation shells
//! out to `notify-send` and, when the user clicks the "Open full" action,
//! shows the untruncated text with `zenity`.

use async_trait::async_trait;
use define_core::Resolution;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, info};

/// Application name reported to the notification server.
pub const APP_NAME: &str = "define";

/// Action keys that open the full view.
const OPEN_ACTIONS: &[&str] = &["default", "full"];

/// How long a notification waits for an action before giving up.
pub const ACTION_WAIT: Duration = Duration::from_secs(10 * 60);

/// Receives every resolved definition.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Present `resolution` to the user.
    ///
    /// Implementations swallow their own failures; a missing display
    /// surface never affects resolution.
    async fn notify(&self, resolution: &Resolution);
}

/// Emits results through `tracing`, for headless use.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, resolution: &Resolution) {
        info!(
            word = %resolution.word,
            source = %resolution.source_kind,
            title = %resolution.title,
            body = %resolution.body,
            "Definition"
        );
    }
}

/// Desktop notifications through `notify-send`, with a click-to-open full view.
#[derive(Debug, Clone)]
pub struct DesktopNotifier {
    program: PathBuf,
    viewer: FullViewer,
    action_wait: Duration,
}

impl Default for DesktopNotifier {
    fn default() -> Self {
        Self {
            program: PathBuf::from("notify-send"),
            viewer: FullViewer::default(),
            action_wait: ACTION_WAIT,
        }
    }
}

impl DesktopNotifier {
    /// Use `program` instead of `notify-send`
    #[must_use]
    pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = program.into();
        self
    }

    /// Use `viewer` for the full view
    #[must_use]
    pub fn with_viewer(mut self, viewer: FullViewer) -> Self {
        self.viewer = viewer;
        self
    }

    /// Stop waiting for an action after `wait`
    #[must_use]
    pub fn with_action_wait(mut self, wait: Duration) -> Self {
        self.action_wait = wait;
        self
    }

    fn command(&self, resolution: &Resolution) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.arg(format!("--app-name={APP_NAME}"))
            .arg("--action=default=Open full")
            .arg("--action=full=Open full")
            .arg("--wait")
            .arg(&resolution.title)
            .arg(&resolution.body)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true);
        cmd
    }
}

impl DesktopNotifier {
    /// Post the notification and wait for its action in a detached task.
    ///
    /// Returns once `notify-send` is running; `None` if it could not be started.
    pub fn post(&self, resolution: &Resolution) -> Option<JoinHandle<()>> {
        let child = match self.command(resolution).spawn() {
            Ok(child) => child,
            Err(e) => {
                debug!(program = %self.program.display(), error = %e, "Notification failed");
                return None;
            }
        };

        let viewer = self.viewer.clone();
        let action_wait = self.action_wait;
        let word = resolution.word.clone();
        let full = resolution.full.clone();
        Some(tokio::spawn(async move {
            // Dropping the child on expiry kills notify-send
            let output = match timeout(action_wait, child.wait_with_output()).await {
                Ok(Ok(output)) => output,
                Ok(Err(e)) => {
                    debug!(word = %word, error = %e, "Notification wait failed");
                    return;
                }
                Err(_) => {
                    debug!(word = %word, "Notification action wait expired");
                    return;
                }
            };

            let action = String::from_utf8_lossy(&output.stdout);
            if OPEN_ACTIONS.contains(&action.trim()) {
                debug!(word = %word, "Opening full view");
                viewer.show(&full).await;
            }
        }))
    }
}

#[async_trait]
impl Notifier for DesktopNotifier {
    async fn notify(&self, resolution: &Resolution) {
        drop(self.post(resolution));
    }
}

/// Displays long text, falling back to stdout when no viewer is available.
#[derive(Debug, Clone)]
pub struct FullViewer {
    program: PathBuf,
}

impl Default for FullViewer {
    fn default() -> Self {
        Self {
            program: PathBuf::from("zenity"),
        }
    }
}

impl FullViewer {
    /// Viewer invoking `program` with zenity's `--text-info` arguments
    #[must_use]
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Show `text`, blocking until the viewer closes.
    pub async fn show(&self, text: &str) {
        if let Err(e) = self.show_in_viewer(text).await {
            debug!(program = %self.program.display(), error = %e, "Viewer unavailable, writing to stdout");
            let mut stdout = tokio::io::stdout();
            let written = async {
                stdout.write_all(text.as_bytes()).await?;
                stdout.write_all(b"\n").await?;
                stdout.flush().await
            };
            if let Err(e) = written.await {
                debug!(error = %e, "Failed to write full text");
            }
        }
    }

    async fn show_in_viewer(&self, text: &str) -> std::io::Result<()> {
        let mut child = Command::new(&self.program)
            .args([
                "--text-info",
                "--width=760",
                "--height=560",
                "--title=define",
                "--no-markup",
            ])
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(text.as_bytes()).await?;
        }
        child.wait().await?;
        Ok(())
    }
}
