//! Tracker state — the focus session and the suppression latch.

use std::time::Duration;

/// What a single successful sample does to the tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Focus app not frontmost and no session to close.
    RemainInactive,
    /// Focus app came to the front; a new session starts at zero.
    BecomeActive,
    /// Focus app still frontmost; the session accrues one interval.
    RemainActive,
    /// Focus app left the front, or a suppression latch is still set
    /// from a session that already ended.
    BecomeInactive,
}

/// Mutable tracker state. Owned by the tracker loop alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackerState {
    focus_app_active: bool,
    elapsed: Duration,
    notifications_suppressed: bool,
}

impl TrackerState {
    pub fn classify(&self, frontmost: bool) -> Transition {
        match (frontmost, self.focus_app_active) {
            (true, false) => Transition::BecomeActive,
            (true, true) => Transition::RemainActive,
            (false, _) if self.focus_app_active || self.notifications_suppressed => {
                Transition::BecomeInactive
            }
            (false, _) => Transition::RemainInactive,
        }
    }

    pub fn is_focus_app_active(&self) -> bool {
        self.focus_app_active
    }

    /// Continuous focus in the current session. Zero outside a session.
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn notifications_suppressed(&self) -> bool {
        self.notifications_suppressed
    }

    /// Whether this session has earned suppression and does not have it.
    pub fn should_suppress(&self, threshold: Duration) -> bool {
        self.focus_app_active && !self.notifications_suppressed && self.elapsed >= threshold
    }

    pub(super) fn begin_session(&mut self) {
        self.focus_app_active = true;
        self.elapsed = Duration::ZERO;
    }

    pub(super) fn advance(&mut self, interval: Duration) -> Duration {
        self.elapsed += interval;
        self.elapsed
    }

    /// Close the session. The latch is left alone; it only clears on a
    /// successful re-enable.
    pub(super) fn end_session(&mut self) {
        self.focus_app_active = false;
        self.elapsed = Duration::ZERO;
    }

    pub(super) fn set_suppressed(&mut self, suppressed: bool) {
        self.notifications_suppressed = suppressed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECOND: Duration = Duration::from_secs(1);

    #[test]
    fn starts_inactive_and_unsuppressed() {
        let state = TrackerState::default();
        assert!(!state.is_focus_app_active());
        assert_eq!(state.elapsed(), Duration::ZERO);
        assert!(!state.notifications_suppressed());
    }

    #[test]
    fn classify_all_transitions() {
        let mut state = TrackerState::default();
        assert_eq!(state.classify(false), Transition::RemainInactive);
        assert_eq!(state.classify(true), Transition::BecomeActive);

        state.begin_session();
        assert_eq!(state.classify(true), Transition::RemainActive);
        assert_eq!(state.classify(false), Transition::BecomeInactive);
    }

    #[test]
    fn stuck_latch_classifies_as_become_inactive() {
        let mut state = TrackerState::default();
        state.set_suppressed(true);
        assert_eq!(state.classify(false), Transition::BecomeInactive);
        assert_eq!(state.classify(true), Transition::BecomeActive);
    }

    #[test]
    fn begin_session_resets_elapsed() {
        let mut state = TrackerState::default();
        state.begin_session();
        state.advance(SECOND);
        state.begin_session();
        assert_eq!(state.elapsed(), Duration::ZERO);
    }

    #[test]
    fn end_session_keeps_latch() {
        let mut state = TrackerState::default();
        state.begin_session();
        state.advance(SECOND);
        state.set_suppressed(true);
        state.end_session();

        assert!(!state.is_focus_app_active());
        assert_eq!(state.elapsed(), Duration::ZERO);
        assert!(state.notifications_suppressed());
    }

    #[test]
    fn should_suppress_at_threshold() {
        let threshold = Duration::from_secs(2);
        let mut state = TrackerState::default();
        state.begin_session();
        assert!(!state.should_suppress(threshold));
        state.advance(SECOND);
        assert!(!state.should_suppress(threshold));
        state.advance(SECOND);
        assert!(state.should_suppress(threshold));

        state.set_suppressed(true);
        assert!(!state.should_suppress(threshold));
    }
}
