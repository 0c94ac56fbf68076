//! Tracker configuration — validated timing parameters.
//!
//! Built once at startup from CLI flags or their environment fallbacks.
//! Anything that would leave the tracker with undefined timing is a
//! [`ConfigError`] and stops the process before the loop starts.

use std::time::Duration;

/// Configuration error. Always fatal at startup.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("focus application identifier must not be empty")]
    EmptyFocusApp,
    #[error("focus application identifier {0:?} has leading or trailing whitespace")]
    PaddedFocusApp(String),
    #[error("poll interval must be greater than zero")]
    ZeroPollInterval,
    #[error("focus threshold must be greater than zero")]
    ZeroThreshold,
    #[error("focus threshold ({threshold:?}) is shorter than the poll interval ({interval:?})")]
    ThresholdBelowInterval {
        threshold: Duration,
        interval: Duration,
    },
}

/// Immutable tracker configuration.
#[derive(Debug, Clone)]
pub struct TrackerConfig {
    focus_app: String,
    poll_interval: Duration,
    focus_threshold: Duration,
    display_enabled: bool,
}

impl TrackerConfig {
    pub fn new(
        focus_app: impl Into<String>,
        poll_interval: Duration,
        focus_threshold: Duration,
        display_enabled: bool,
    ) -> Result<Self, ConfigError> {
        let focus_app = focus_app.into();
        if focus_app.trim().is_empty() {
            return Err(ConfigError::EmptyFocusApp);
        }
        // Compared verbatim against the observer's trimmed output.
        if focus_app.trim() != focus_app {
            return Err(ConfigError::PaddedFocusApp(focus_app));
        }
        if poll_interval.is_zero() {
            return Err(ConfigError::ZeroPollInterval);
        }
        if focus_threshold.is_zero() {
            return Err(ConfigError::ZeroThreshold);
        }
        if focus_threshold < poll_interval {
            return Err(ConfigError::ThresholdBelowInterval {
                threshold: focus_threshold,
                interval: poll_interval,
            });
        }

        Ok(Self {
            focus_app,
            poll_interval,
            focus_threshold,
            display_enabled,
        })
    }

    /// Build from the CLI units: interval in seconds, threshold in minutes.
    pub fn from_cli_units(
        focus_app: impl Into<String>,
        interval_secs: u64,
        threshold_mins: u64,
        display_enabled: bool,
    ) -> Result<Self, ConfigError> {
        Self::new(
            focus_app,
            Duration::from_secs(interval_secs),
            Duration::from_secs(threshold_mins.saturating_mul(60)),
            display_enabled,
        )
    }

    pub fn focus_app(&self) -> &str {
        &self.focus_app
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    pub fn focus_threshold(&self) -> Duration {
        self.focus_threshold
    }

    pub fn display_enabled(&self) -> bool {
        self.display_enabled
    }
}
