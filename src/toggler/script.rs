//! Script toggler — runs a notification script through an interpreter.
//!
//! Two scripts live side by side in the scripts directory:
//! `enableFocus.scpt` switches the OS Focus mode on (notifications
//! suppressed) and `disableFocus.scpt` switches it off again. Each call
//! spawns `<interpreter> <script>` and waits for it to exit.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::process::Command;

use super::{NotificationToggler, ToggleError};

/// Script that turns Focus mode on, silencing notifications.
pub const SUPPRESS_SCRIPT: &str = "enableFocus.scpt";
/// Script that turns Focus mode off, restoring notifications.
pub const RESTORE_SCRIPT: &str = "disableFocus.scpt";

/// Toggler that shells out to a pair of scripts.
#[derive(Debug, Clone)]
pub struct ScriptToggler {
    interpreter: String,
    suppress_script: PathBuf,
    restore_script: PathBuf,
}

impl ScriptToggler {
    /// Toggler using the standard script names inside `scripts_dir`.
    pub fn from_dir(interpreter: impl Into<String>, scripts_dir: &Path) -> Self {
        Self::new(
            interpreter,
            scripts_dir.join(SUPPRESS_SCRIPT),
            scripts_dir.join(RESTORE_SCRIPT),
        )
    }

    pub fn new(
        interpreter: impl Into<String>,
        suppress_script: PathBuf,
        restore_script: PathBuf,
    ) -> Self {
        Self {
            interpreter: interpreter.into(),
            suppress_script,
            restore_script,
        }
    }

    /// Scripts that do not exist on disk.
    pub fn missing_scripts(&self) -> Vec<&Path> {
        [self.suppress_script.as_path(), self.restore_script.as_path()]
            .into_iter()
            .filter(|script| !script.exists())
            .collect()
    }

    /// Script to run for the requested notification state.
    fn script_for(&self, enable: bool) -> &Path {
        if enable {
            &self.restore_script
        } else {
            &self.suppress_script
        }
    }
}

impl NotificationToggler for ScriptToggler {
    async fn set_notifications(&self, enable: bool) -> Result<(), ToggleError> {
        let script = self.script_for(enable);

        let output = Command::new(&self.interpreter)
            .arg(script)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|source| ToggleError::Spawn {
                interpreter: self.interpreter.clone(),
                source,
            })?;

        if output.status.success() {
            tracing::debug!(script = %script.display(), enable, "notification script succeeded");
            Ok(())
        } else {
            Err(ToggleError::ScriptFailed {
                script: script.to_path_buf(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            })
        }
    }
}
