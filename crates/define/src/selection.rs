//! Wayland selection capture via `wl-paste`.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::debug;

/// Deadline for each `wl-paste` invocation.
pub const CAPTURE_TIMEOUT: Duration = Duration::from_millis(180);

/// Reads the primary selection, then the clipboard.
#[derive(Debug, Clone)]
pub struct SelectionSource {
    program: PathBuf,
    timeout: Duration,
}

impl Default for SelectionSource {
    fn default() -> Self {
        Self::new("wl-paste", CAPTURE_TIMEOUT)
    }
}

impl SelectionSource {
    /// Source invoking `program` with `wl-paste` arguments
    #[must_use]
    pub fn new(program: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            timeout,
        }
    }

    /// First non-blank text from the primary selection or the clipboard.
    pub async fn capture(&self) -> Option<String> {
        for args in [&["-p", "--no-newline"][..], &["--no-newline"][..]] {
            if let Some(text) = run_capture(&self.program, args, self.timeout).await {
                return Some(text);
            }
        }
        None
    }
}

async fn run_capture(program: &Path, args: &[&str], deadline: Duration) -> Option<String> {
    let mut cmd = Command::new(program);
    cmd.args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .kill_on_drop(true);

    let output = match timeout(deadline, cmd.output()).await {
        Ok(Ok(output)) => output,
        Ok(Err(e)) => {
            debug!(program = %program.display(), error = %e, "Selection capture failed");
            return None;
        }
        Err(_) => {
            debug!(program = %program.display(), ?args, "Selection capture timed out");
            return None;
        }
    };

    let text = String::from_utf8_lossy(&output.stdout).trim().to_string();
    (!text.is_empty()).then_some(text)
}
