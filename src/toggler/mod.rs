//! NotificationToggler trait — the one-shot side effect that turns
//! notifications off and back on.

pub mod script;

use std::future::Future;
use std::path::PathBuf;

pub use script::ScriptToggler;

/// Toggle side-effect error. Transient by contract.
#[derive(Debug, thiserror::Error)]
pub enum ToggleError {
    /// The interpreter could not be started.
    #[error("failed to spawn {interpreter}: {source}")]
    Spawn {
        interpreter: String,
        #[source]
        source: std::io::Error,
    },
    /// The script ran and exited non-zero.
    #[error("{} exited with {status}: {stderr}", .script.display())]
    ScriptFailed {
        script: PathBuf,
        status: String,
        stderr: String,
    },
}

/// Enables or disables desktop notifications.
///
/// Calling it twice with the same value must be safe.
pub trait NotificationToggler: Send + Sync {
    fn set_notifications(&self, enable: bool) -> impl Future<Output = Result<(), ToggleError>> + Send;
}
