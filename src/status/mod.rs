//! Status display — elapsed-focus snapshots pushed out of the tracker.
//!
//! The tracker pushes through [`StatusSink`]; a presenter task on the
//! other end of a `watch` channel renders the snapshot. Nothing flows
//! back into the tracker.

use std::time::Duration;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

/// Receives the current elapsed focus time once per tick.
///
/// Best-effort: implementations must not block and cannot fail.
pub trait StatusSink: Send {
    fn update(&self, elapsed: Duration);
}

/// [`StatusSink`] backed by a `tokio::sync::watch` channel.
///
/// Only the latest snapshot is kept; a slow presenter simply skips
/// intermediate values.
pub struct WatchStatus {
    tx: watch::Sender<Duration>,
}

impl WatchStatus {
    /// Create the sink and the receiver a presenter reads from.
    pub fn channel() -> (Self, watch::Receiver<Duration>) {
        let (tx, rx) = watch::channel(Duration::ZERO);
        (Self { tx }, rx)
    }
}

impl StatusSink for WatchStatus {
    fn update(&self, elapsed: Duration) {
        // Unlike `send`, this succeeds with no receivers left.
        self.tx.send_replace(elapsed);
    }
}

/// Render elapsed focus as `Current Timer: MM:SS`.
///
/// Minutes are total minutes and are not wrapped at the hour.
pub fn format_timer(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    format!("Current Timer: {:02}:{:02}", secs / 60, secs % 60)
}

/// Log the rendered timer whenever it changes, until cancelled or the
/// tracker drops its sink.
pub async fn present(mut rx: watch::Receiver<Duration>, cancel: CancellationToken) {
    let mut last = String::new();

    loop {
        let title = format_timer(*rx.borrow_and_update());
        if title != last {
            tracing::info!(target: "autofocusd::status", "{title}");
            last = title;
        }

        tokio::select! {
            _ = cancel.cancelled() => break,
            changed = rx.changed() => {
                if changed.is_err() {
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_zero() {
        assert_eq!(format_timer(Duration::ZERO), "Current Timer: 00:00");
    }

    #[test]
    fn format_minutes_and_seconds() {
        assert_eq!(
            format_timer(Duration::from_secs(12 * 60 + 34)),
            "Current Timer: 12:34"
        );
    }

    #[test]
    fn format_past_the_hour() {
        assert_eq!(
            format_timer(Duration::from_secs(75 * 60 + 5)),
            "Current Timer: 75:05"
        );
    }

    #[test]
    fn format_drops_subsecond() {
        assert_eq!(
            format_timer(Duration::from_millis(59_999)),
            "Current Timer: 00:59"
        );
    }

    #[test]
    fn watch_status_keeps_latest() {
        let (sink, rx) = WatchStatus::channel();
        sink.update(Duration::from_secs(1));
        sink.update(Duration::from_secs(2));
        assert_eq!(*rx.borrow(), Duration::from_secs(2));
    }

    #[test]
    fn watch_status_without_receiver_does_not_fail() {
        let (sink, rx) = WatchStatus::channel();
        drop(rx);
        sink.update(Duration::from_secs(5));
    }

    #[tokio::test]
    async fn presenter_stops_when_sink_dropped() {
        let (sink, rx) = WatchStatus::channel();
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(present(rx, cancel));

        sink.update(Duration::from_secs(3));
        drop(sink);

        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("presenter should exit")
            .unwrap();
    }

    #[tokio::test]
    async fn presenter_stops_on_cancel() {
        let (_sink, rx) = WatchStatus::channel();
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(present(rx, cancel.clone()));

        cancel.cancel();

        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("presenter should exit")
            .unwrap();
    }
}
