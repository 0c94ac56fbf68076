//! Service descriptors — launchd plist and systemd user unit.
//!
//! Pure templating: the descriptor starts `<binary> run [--focus-app ID]`
//! at login. Everything else the daemon needs comes from its
//! environment.

use std::path::{Path, PathBuf};

/// launchd job label.
pub const LAUNCHD_LABEL: &str = "com.auto-focus";

const LAUNCHD_STDOUT: &str = "/tmp/auto-focus.out";
const LAUNCHD_STDERR: &str = "/tmp/auto-focus.err";

/// Service descriptor generation error.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("cannot determine daemon binary path: {0}")]
    CurrentExe(#[source] std::io::Error),
    #[error("failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Descriptor formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ServiceKind {
    /// macOS launchd agent (`~/Library/LaunchAgents`).
    Launchd,
    /// systemd user unit (`~/.config/systemd/user`).
    Systemd,
}

impl Default for ServiceKind {
    fn default() -> Self {
        if cfg!(target_os = "macos") {
            Self::Launchd
        } else {
            Self::Systemd
        }
    }
}

impl ServiceKind {
    /// File name written when no output path is given.
    pub fn default_file_name(self) -> &'static str {
        match self {
            Self::Launchd => "com.auto-focus.plist",
            Self::Systemd => "auto-focus.service",
        }
    }
}

/// What the descriptor launches.
#[derive(Debug, Clone)]
pub struct ServiceSpec {
    pub binary: PathBuf,
    pub focus_app: Option<String>,
}

impl ServiceSpec {
    /// Spec for the currently running executable.
    pub fn current_exe(focus_app: Option<String>) -> Result<Self, ServiceError> {
        let binary = std::env::current_exe().map_err(ServiceError::CurrentExe)?;
        Ok(Self { binary, focus_app })
    }

    /// Program and arguments, in order.
    fn program_arguments(&self) -> Vec<String> {
        let mut args = vec![self.binary.display().to_string(), "run".to_string()];
        if let Some(app) = &self.focus_app {
            args.push("--focus-app".to_string());
            args.push(app.clone());
        }
        args
    }

    pub fn render(&self, kind: ServiceKind) -> String {
        match kind {
            ServiceKind::Launchd => self.render_launchd(),
            ServiceKind::Systemd => self.render_systemd(),
        }
    }

    fn render_launchd(&self) -> String {
        let arguments: String = self
            .program_arguments()
            .iter()
            .map(|arg| format!("\t\t<string>{}</string>\n", xml_escape(arg)))
            .collect();

        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE plist PUBLIC "-//Apple//DTD PLIST 1.0//EN" "http://www.apple.com/DTDs/PropertyList-1.0.dtd">
<plist version="1.0">
<dict>
	<key>Label</key>
	<string>{LAUNCHD_LABEL}</string>
	<key>ProgramArguments</key>
	<array>
{arguments}	</array>
	<key>RunAtLoad</key>
	<true/>
	<key>StandardOutPath</key>
	<string>{LAUNCHD_STDOUT}</string>
	<key>StandardErrorPath</key>
	<string>{LAUNCHD_STDERR}</string>
</dict>
</plist>
"#
        )
    }

    fn render_systemd(&self) -> String {
        let exec_start = self
            .program_arguments()
            .iter()
            .map(|arg| systemd_quote(arg))
            .collect::<Vec<_>>()
            .join(" ");

        format!(
            "[Unit]\n\
             Description=Suppress notifications while the focus application is frontmost\n\
             \n\
             [Service]\n\
             ExecStart={exec_start}\n\
             Restart=on-failure\n\
             \n\
             [Install]\n\
             WantedBy=default.target\n"
        )
    }

    /// Render and write the descriptor to `path`.
    pub fn write(&self, kind: ServiceKind, path: &Path) -> Result<(), ServiceError> {
        std::fs::write(path, self.render(kind)).map_err(|source| ServiceError::Write {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::info!(path = %path.display(), ?kind, "service descriptor written");
        Ok(())
    }
}

fn xml_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

/// Quote an `ExecStart` word if it contains whitespace or quotes.
fn systemd_quote(s: &str) -> String {
    if s.is_empty() || s.chars().any(|c| c.is_whitespace() || c == '"' || c == '\\') {
        format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\""))
    } else {
        s.to_string()
    }
}
