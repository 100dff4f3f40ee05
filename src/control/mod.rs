//! Capability-style abstraction over the external control plane.
//!
//! The core pipeline never shells out directly; it talks to a
//! [`ControlPlaneClient`], so tests can substitute a deterministic fake while
//! production uses the subprocess-backed [`AsteriskClient`].

pub mod asterisk;

pub use asterisk::AsteriskClient;

use std::fmt;

use async_trait::async_trait;

use crate::HostMetrics;

/// Result type alias for control-plane operations
pub type ControlResult<T> = Result<T, ControlError>;

/// Errors that can occur while talking to the control plane
#[derive(Debug)]
pub enum ControlError {
    /// The control command ran but exited non-zero
    CommandFailed {
        status: Option<i32>,
        output: String,
    },

    /// The control plane's configuration file could not be read
    ConfigUnreadable(String),

    /// I/O error (spawning the control binary, etc.)
    IoError(std::io::Error),
}

impl fmt::Display for ControlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControlError::CommandFailed { status, output } => match status {
                Some(code) => write!(f, "control command exited with {}: {}", code, output),
                None => write!(f, "control command terminated by signal: {}", output),
            },
            ControlError::ConfigUnreadable(msg) => {
                write!(f, "control plane configuration unreadable: {}", msg)
            }
            ControlError::IoError(err) => write!(f, "I/O error: {}", err),
        }
    }
}

impl std::error::Error for ControlError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ControlError::IoError(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ControlError {
    fn from(err: std::io::Error) -> Self {
        ControlError::IoError(err)
    }
}

/// Client for the external control plane's command interface.
///
/// Two separate update calls exist on purpose: the alert payload is
/// service-controlled free text of unpredictable size and must not be able to
/// corrupt or truncate the fixed-format metrics command.
#[async_trait]
pub trait ControlPlaneClient: Send + Sync {
    /// Whether the node is declared in the control plane's configuration.
    async fn node_exists(&self, node: &str) -> ControlResult<bool>;

    /// Set all metric variables for a node in one atomic command.
    async fn set_metrics(&self, node: &str, metrics: &HostMetrics) -> ControlResult<()>;

    /// Deliver the rendered alert string exactly as given.
    async fn set_alert(&self, node: &str, text: &str) -> ControlResult<()>;
}
