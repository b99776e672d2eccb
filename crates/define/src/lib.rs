//! define: show the definition of the selected word as a notification
//!
//! The resolution engine lives in `define-core`; this crate wires it to the
//! command line, the per-user lookup daemon, and the desktop.
//!
//! - [`cli`] parses flags
//! - [`daemon`] serves lookups over a Unix socket, or resolves once in-process
//! - [`notify`] presents results and the full-text view
//! - [`selection`] captures the word under the cursor on Wayland

/// Command-line interface
pub mod cli;
pub mod daemon;
pub mod notify;
pub mod selection;
/// Tracing initialisation
pub mod tracing;
