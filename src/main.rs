//! autofocusd — silences notifications while you stay in your editor.
//!
//! `run` polls the frontmost application and, once the focus app has
//! been in front long enough, runs the notification scripts. `service`
//! writes a launchd/systemd descriptor that starts `run` at login.

mod config;
mod observer;
mod service;
mod status;
mod toggler;
mod tracker;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use crate::config::{ConfigError, TrackerConfig};
use crate::observer::{ObserverError, ObserverKind, OsascriptObserver, WindowObserver, X11Observer};
use crate::service::{ServiceError, ServiceKind, ServiceSpec};
use crate::status::WatchStatus;
use crate::toggler::{NotificationToggler, ScriptToggler};
use crate::tracker::FocusTracker;

#[derive(Parser, Debug)]
#[command(name = "autofocusd", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Track the focus application and toggle notifications.
    Run(RunArgs),
    /// Generate a service descriptor that starts the daemon at login.
    Service(ServiceArgs),
}

#[derive(Args, Debug)]
struct RunArgs {
    /// Focus application identifier (bundle id on macOS, WM_CLASS class on X11).
    #[arg(long, env = "AUTO_FOCUS_APP")]
    focus_app: String,

    /// Seconds between frontmost-application checks.
    #[arg(
        long,
        env = "AUTO_FOCUS_CHECK_INTERVAL",
        default_value_t = 1,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    check_interval: u64,

    /// Minutes of continuous focus before notifications are suppressed.
    #[arg(
        long,
        env = "AUTO_FOCUS_FOCUS_TIME",
        default_value_t = 12,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    focus_time: u64,

    /// Log the running focus timer.
    #[arg(long, env = "AUTO_FOCUS_SHOW_TIMER")]
    show_timer: bool,

    /// Directory holding enableFocus.scpt and disableFocus.scpt.
    #[arg(long, env = "AUTO_FOCUS_SCRIPTS_DIR", default_value = ".")]
    scripts_dir: PathBuf,

    /// Program that runs the notification scripts.
    #[arg(long, env = "AUTO_FOCUS_INTERPRETER", default_value = "osascript")]
    interpreter: String,

    /// How the frontmost application is detected.
    #[arg(long, env = "AUTO_FOCUS_OBSERVER", value_enum, default_value_t)]
    observer: ObserverKind,
}

#[derive(Args, Debug)]
struct ServiceArgs {
    /// Descriptor format.
    #[arg(long, value_enum, default_value_t)]
    kind: ServiceKind,

    /// Daemon binary to launch. Defaults to this executable.
    #[arg(long)]
    binary: Option<PathBuf>,

    /// Focus application passed to `run`.
    #[arg(long)]
    focus_app: Option<String>,

    /// Output path. Defaults to the conventional file name in the
    /// current directory.
    #[arg(long, short)]
    output: Option<PathBuf>,
}

/// Fatal startup error.
#[derive(Debug, thiserror::Error)]
enum Error {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("observer unavailable: {0}")]
    Observer(#[from] ObserverError),
    #[error(transparent)]
    Service(#[from] ServiceError),
}

#[tokio::main]
async fn main() -> ExitCode {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("autofocusd=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Command::Run(args) => run(args).await,
        Command::Service(args) => generate_service(args),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "autofocusd failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: RunArgs) -> Result<(), Error> {
    let config = TrackerConfig::from_cli_units(
        args.focus_app,
        args.check_interval,
        args.focus_time,
        args.show_timer,
    )?;

    let toggler = ScriptToggler::from_dir(args.interpreter, &args.scripts_dir);
    for script in toggler.missing_scripts() {
        tracing::warn!(script = %script.display(), "notification script not found");
    }

    match args.observer {
        ObserverKind::Osascript => {
            let observer = OsascriptObserver::new(config.poll_interval());
            track(observer, toggler, config).await;
        }
        ObserverKind::X11 => {
            let observer = X11Observer::connect(None, config.poll_interval())?;
            track(observer, toggler, config).await;
        }
    }

    Ok(())
}

/// Run the tracker until SIGINT/SIGTERM.
async fn track<O, T>(observer: O, toggler: T, config: TrackerConfig)
where
    O: WindowObserver,
    T: NotificationToggler,
{
    let cancel = CancellationToken::new();
    let display_enabled = config.display_enabled();
    let mut tracker = FocusTracker::new(observer, toggler, config);

    let presenter = if display_enabled {
        let (sink, rx) = WatchStatus::channel();
        tracker = tracker.with_status(sink);
        Some(tokio::spawn(status::present(rx, cancel.clone())))
    } else {
        None
    };

    let signals = tokio::spawn({
        let cancel = cancel.clone();
        async move {
            shutdown_signal().await;
            tracing::info!("shutdown requested");
            cancel.cancel();
        }
    });

    tracker.run(cancel).await;

    signals.abort();
    if let Some(presenter) = presenter {
        if let Err(e) = presenter.await {
            tracing::debug!(error = %e, "status presenter ended abnormally");
        }
    }
}

/// Resolve on SIGINT or (on Unix) SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "failed to listen for SIGINT");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}

fn generate_service(args: ServiceArgs) -> Result<(), Error> {
    let spec = match args.binary {
        Some(binary) => ServiceSpec {
            binary,
            focus_app: args.focus_app,
        },
        None => ServiceSpec::current_exe(args.focus_app)?,
    };

    let output = args
        .output
        .unwrap_or_else(|| PathBuf::from(args.kind.default_file_name()));
    spec.write(args.kind, &output)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::{Mutex, PoisonError};

    use super::*;

    /// Serializes tests that read or write the `AUTO_FOCUS_*` variables.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    fn parse<const N: usize>(args: [&str; N]) -> Result<Cli, clap::Error> {
        let _env = ENV_LOCK.lock().unwrap_or_else(PoisonError::into_inner);
        Cli::try_parse_from(args)
    }

    #[test]
    fn cli_is_well_formed() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn run_defaults() {
        let cli = parse(["autofocusd", "run", "--focus-app", "Code"]).unwrap();
        let Command::Run(args) = cli.command else {
            panic!("expected run");
        };
        assert_eq!(args.focus_app, "Code");
        assert_eq!(args.check_interval, 1);
        assert_eq!(args.focus_time, 12);
        assert!(!args.show_timer);
        assert_eq!(args.interpreter, "osascript");
        assert_eq!(args.scripts_dir, PathBuf::from("."));
    }

    #[test]
    fn run_rejects_zero_interval() {
        let result = parse([
            "autofocusd",
            "run",
            "--focus-app",
            "Code",
            "--check-interval",
            "0",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn run_rejects_non_numeric_focus_time() {
        let result = parse([
            "autofocusd",
            "run",
            "--focus-app",
            "Code",
            "--focus-time",
            "soon",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn run_parses_observer_kind() {
        let cli = parse([
            "autofocusd",
            "run",
            "--focus-app",
            "Code",
            "--observer",
            "x11",
            "--show-timer",
        ])
        .unwrap();
        let Command::Run(args) = cli.command else {
            panic!("expected run");
        };
        assert_eq!(args.observer, ObserverKind::X11);
        assert!(args.show_timer);
    }

    #[test]
    fn service_writes_descriptor() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("auto-focus.service");
        let cli = parse([
            "autofocusd",
            "service",
            "--kind",
            "systemd",
            "--binary",
            "/usr/local/bin/autofocusd",
            "--output",
            output.to_str().unwrap(),
        ])
        .unwrap();
        let Command::Service(args) = cli.command else {
            panic!("expected service");
        };

        generate_service(args).unwrap();

        let unit = std::fs::read_to_string(&output).unwrap();
        assert!(unit.contains("ExecStart=/usr/local/bin/autofocusd run\n"));
    }

    #[test]
    fn run_falls_back_to_env() {
        let _env = ENV_LOCK.lock().unwrap_or_else(PoisonError::into_inner);
        // SAFETY: every test that parses the CLI holds ENV_LOCK.
        unsafe {
            std::env::set_var("AUTO_FOCUS_APP", "com.microsoft.VSCode");
            std::env::set_var("AUTO_FOCUS_CHECK_INTERVAL", "5");
        }

        let from_env = Cli::try_parse_from(["autofocusd", "run"]);
        let flag_wins = Cli::try_parse_from(["autofocusd", "run", "--check-interval", "2"]);

        // SAFETY: as above.
        unsafe {
            std::env::remove_var("AUTO_FOCUS_APP");
            std::env::remove_var("AUTO_FOCUS_CHECK_INTERVAL");
        }

        let Command::Run(args) = from_env.unwrap().command else {
            panic!("expected run");
        };
        assert_eq!(args.focus_app, "com.microsoft.VSCode");
        assert_eq!(args.check_interval, 5);
        assert_eq!(args.focus_time, 12);

        let Command::Run(args) = flag_wins.unwrap().command else {
            panic!("expected run");
        };
        assert_eq!(args.focus_app, "com.microsoft.VSCode");
        assert_eq!(args.check_interval, 2);
    }
}
