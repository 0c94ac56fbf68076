//! WindowObserver trait — answers "which application is frontmost?".
//!
//! Platform adapters implement [`WindowObserver::frontmost_app`]; the
//! tracker only ever asks [`WindowObserver::is_frontmost`]. Errors are
//! transient by contract: the tracker logs them and skips the tick.

pub mod osascript;
pub mod x11;

use std::future::Future;
use std::time::Duration;

pub use osascript::OsascriptObserver;
pub use x11::X11Observer;

/// Shortest deadline given to a single frontmost query.
const MIN_TIMEOUT: Duration = Duration::from_secs(1);

/// Frontmost-application query error.
#[derive(Debug, thiserror::Error)]
pub enum ObserverError {
    /// The query helper could not be started.
    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: &'static str,
        #[source]
        source: std::io::Error,
    },
    /// The query helper ran but reported failure.
    #[error("frontmost query exited with {status}: {stderr}")]
    QueryFailed { status: String, stderr: String },
    /// The query did not answer within its deadline.
    #[error("frontmost query timed out after {0:?}")]
    Timeout(Duration),
    /// X11 connection or protocol error.
    #[error("X11: {0}")]
    X11(String),
}

/// Available observer backends, selectable from the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ObserverKind {
    /// macOS System Events via `osascript` (bundle identifiers).
    Osascript,
    /// X11 `_NET_ACTIVE_WINDOW` + `WM_CLASS` (window classes).
    X11,
}

impl Default for ObserverKind {
    fn default() -> Self {
        if cfg!(target_os = "macos") {
            Self::Osascript
        } else {
            Self::X11
        }
    }
}

/// Reports the identifier of the frontmost application.
pub trait WindowObserver: Send + Sync {
    /// Identifier of the frontmost application, or `None` if nothing
    /// holds focus.
    fn frontmost_app(&self) -> impl Future<Output = Result<Option<String>, ObserverError>> + Send;

    /// Whether `app` is the frontmost application. Exact match.
    fn is_frontmost(&self, app: &str) -> impl Future<Output = Result<bool, ObserverError>> + Send {
        async move { Ok(self.frontmost_app().await?.as_deref() == Some(app)) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(Option<&'static str>);

    impl WindowObserver for Fixed {
        async fn frontmost_app(&self) -> Result<Option<String>, ObserverError> {
            Ok(self.0.map(String::from))
        }
    }

    #[tokio::test]
    async fn is_frontmost_exact_match() {
        let observer = Fixed(Some("com.microsoft.VSCode"));
        assert!(observer.is_frontmost("com.microsoft.VSCode").await.unwrap());
        assert!(!observer.is_frontmost("com.microsoft.vscode").await.unwrap());
        assert!(!observer.is_frontmost("com.microsoft").await.unwrap());
    }

    #[tokio::test]
    async fn is_frontmost_nothing_focused() {
        let observer = Fixed(None);
        assert!(!observer.is_frontmost("Code").await.unwrap());
    }
}
