//! macOS observer — asks System Events for the frontmost bundle id.

use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;

use super::{MIN_TIMEOUT, ObserverError, WindowObserver};

const OSASCRIPT: &str = "osascript";

const FRONTMOST_QUERY: &str = r#"tell application "System Events" to get bundle identifier of application processes whose frontmost is true"#;

/// Frontmost-application observer backed by `osascript`.
pub struct OsascriptObserver {
    timeout: Duration,
}

impl OsascriptObserver {
    /// Create an observer whose queries give up after `timeout`
    /// (clamped to at least one second).
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout: timeout.max(MIN_TIMEOUT),
        }
    }
}

impl WindowObserver for OsascriptObserver {
    async fn frontmost_app(&self) -> Result<Option<String>, ObserverError> {
        let child = Command::new(OSASCRIPT)
            .args(["-e", FRONTMOST_QUERY])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| ObserverError::Spawn {
                program: OSASCRIPT,
                source,
            })?;

        // Dropping the future on timeout kills the child.
        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| ObserverError::Timeout(self.timeout))?
            .map_err(|source| ObserverError::Spawn {
                program: OSASCRIPT,
                source,
            })?;

        if !output.status.success() {
            return Err(ObserverError::QueryFailed {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(parse_bundle_id(&String::from_utf8_lossy(&output.stdout)))
    }
}

/// Extract the bundle id from the query's stdout.
///
/// AppleScript prints lists as `a, b`; only the first entry is used.
/// `missing value` is what System Events reports for processes without
/// a bundle.
fn parse_bundle_id(stdout: &str) -> Option<String> {
    let first = stdout.trim().split(", ").next()?.trim();
    if first.is_empty() || first == "missing value" {
        None
    } else {
        Some(first.to_string())
    }
}
