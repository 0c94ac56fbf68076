//! Focus tracker — the polling loop and the suppression state machine.
//!
//! Each tick samples the observer once and applies exactly one
//! [`Transition`]:
//!
//! ```text
//! INACTIVE  --(frontmost)-->  ACTIVE(0)
//! ACTIVE(e) --(frontmost)-->  ACTIVE(e + interval), suppress once e >= threshold
//! ACTIVE(e) --(!frontmost)--> INACTIVE, restore if suppressed
//! INACTIVE  --(!frontmost)--> INACTIVE
//! ```
//!
//! The suppression latch is only set by a successful disable and only
//! cleared by a successful re-enable, so a failed toggle is retried on
//! the next tick that qualifies for it.

mod state;

pub use state::{TrackerState, Transition};

use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::config::TrackerConfig;
use crate::observer::WindowObserver;
use crate::status::StatusSink;
use crate::toggler::NotificationToggler;

/// Drives the observer, owns [`TrackerState`], and calls the toggler.
pub struct FocusTracker<O, T> {
    observer: O,
    toggler: T,
    config: TrackerConfig,
    status: Option<Box<dyn StatusSink>>,
    state: TrackerState,
    /// Correlation id of the current focus session.
    session: Option<Uuid>,
}

impl<O, T> FocusTracker<O, T>
where
    O: WindowObserver,
    T: NotificationToggler,
{
    pub fn new(observer: O, toggler: T, config: TrackerConfig) -> Self {
        Self {
            observer,
            toggler,
            config,
            status: None,
            state: TrackerState::default(),
            session: None,
        }
    }

    /// Push elapsed focus to `sink` after every successful tick.
    pub fn with_status(mut self, sink: impl StatusSink + 'static) -> Self {
        self.status = Some(Box::new(sink));
        self
    }

    #[cfg(test)]
    pub fn state(&self) -> &TrackerState {
        &self.state
    }

    /// Poll until `cancel` fires, then restore notifications if this
    /// run left them suppressed.
    ///
    /// Calls already in flight when cancellation arrives run to
    /// completion; only the inter-tick sleep is interrupted.
    pub async fn run(mut self, cancel: CancellationToken) {
        tracing::info!(
            app = %self.config.focus_app(),
            interval = ?self.config.poll_interval(),
            threshold = ?self.config.focus_threshold(),
            "focus tracker started"
        );

        while !cancel.is_cancelled() {
            self.tick().await;

            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(self.config.poll_interval()) => {}
            }
        }

        if self.state.notifications_suppressed() {
            tracing::info!("restoring notifications before shutdown");
            self.restore().await;
        }

        tracing::info!(
            active = self.state.is_focus_app_active(),
            suppressed = self.state.notifications_suppressed(),
            "focus tracker stopped"
        );
    }

    /// Sample the observer once and apply the resulting transition.
    ///
    /// Returns `None` when the query failed; the state is untouched and
    /// the status sink is not updated.
    pub async fn tick(&mut self) -> Option<Transition> {
        let frontmost = match self.observer.is_frontmost(self.config.focus_app()).await {
            Ok(frontmost) => frontmost,
            Err(e) => {
                tracing::warn!(error = %e, "failed to query frontmost application");
                return None;
            }
        };

        let transition = self.state.classify(frontmost);
        match transition {
            Transition::RemainInactive => {}
            Transition::BecomeActive => {
                self.state.begin_session();
                let session = Uuid::new_v4();
                self.session = Some(session);
                tracing::info!(%session, app = %self.config.focus_app(), "focus session started");
            }
            Transition::RemainActive => {
                let elapsed = self.state.advance(self.config.poll_interval());
                tracing::debug!(?elapsed, "focus session continues");

                if self.state.should_suppress(self.config.focus_threshold()) {
                    self.suppress().await;
                }
            }
            Transition::BecomeInactive => {
                if self.state.notifications_suppressed() {
                    self.restore().await;
                }

                if let Some(session) = self.session.take() {
                    tracing::info!(
                        %session,
                        elapsed = ?self.state.elapsed(),
                        "focus session ended"
                    );
                }
                self.state.end_session();
            }
        }

        if let Some(status) = &self.status {
            status.update(self.state.elapsed());
        }

        Some(transition)
    }

    async fn suppress(&mut self) {
        match self.toggler.set_notifications(false).await {
            Ok(()) => {
                self.state.set_suppressed(true);
                tracing::info!(
                    session = ?self.session,
                    elapsed = ?self.state.elapsed(),
                    "notifications suppressed"
                );
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to suppress notifications, will retry");
            }
        }
    }

    async fn restore(&mut self) {
        match self.toggler.set_notifications(true).await {
            Ok(()) => {
                self.state.set_suppressed(false);
                tracing::info!(session = ?self.session, "notifications restored");
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to restore notifications, will retry");
            }
        }
    }
}
