//! Centralized path management for define data.
//!
//! | Platform | Cache Dir | Runtime Dir |
//! |----------|-----------|-------------|
//! | **Linux** | `~/.cache/define` (XDG_CACHE_HOME) | `/run/user/$UID` (XDG_RUNTIME_DIR) |
//! | **macOS** | `~/Library/Caches/define` | `$TMPDIR` |
//!
//! All functions support environment variable overrides for testing:
//! - `DEFINE_CACHE_DIR` - Override cache directory
//! - `DEFINE_RUNTIME_DIR` - Override runtime directory
//! - `DEFINE_SOCKET` - Override the daemon socket path

use crate::{Error, Result};
use std::path::PathBuf;

/// Socket file name inside the runtime directory.
pub const SOCKET_NAME: &str = "define.sock";

/// Get the cache directory holding the persisted cache and last-resolution artifact.
///
/// Resolution order:
/// 1. `DEFINE_CACHE_DIR` environment variable
/// 2. Platform cache directory + `/define`
///
/// # Errors
///
/// Returns an error if the cache directory cannot be determined.
pub fn cache_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("DEFINE_CACHE_DIR")
        && !dir.is_empty()
    {
        return Ok(PathBuf::from(dir));
    }

    let base = dirs::cache_dir()
        .ok_or_else(|| Error::configuration("Could not determine cache directory"))?;

    Ok(base.join("define"))
}

/// Get the runtime directory for the daemon socket.
///
/// Resolution order:
/// 1. `DEFINE_RUNTIME_DIR` environment variable
/// 2. Platform runtime directory (or temp directory as fallback)
pub fn runtime_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("DEFINE_RUNTIME_DIR")
        && !dir.is_empty()
    {
        return Ok(PathBuf::from(dir));
    }

    Ok(dirs::runtime_dir().unwrap_or_else(std::env::temp_dir))
}

/// Path to the persisted definition cache.
pub fn cache_file() -> Result<PathBuf> {
    Ok(cache_dir()?.join("cache.json"))
}

/// Path to the single-slot artifact holding the most recent full definition.
pub fn last_file() -> Result<PathBuf> {
    Ok(cache_dir()?.join("last.txt"))
}

/// Path to the daemon socket.
///
/// `DEFINE_SOCKET` takes precedence over the runtime directory.
pub fn socket_path() -> Result<PathBuf> {
    if let Ok(socket) = std::env::var("DEFINE_SOCKET")
        && !socket.is_empty()
    {
        return Ok(PathBuf::from(socket));
    }

    Ok(runtime_dir()?.join(SOCKET_NAME))
}
