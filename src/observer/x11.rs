//! X11 observer — active window class via EWMH properties.
//!
//! Wraps `x11rb::rust_connection::RustConnection`. The frontmost
//! application is identified by the class part of the active window's
//! `WM_CLASS` (e.g. `Code`, `firefox`).
//!
//! x11rb replies block, so each query runs on the blocking pool under a
//! deadline. A failed or timed-out query drops the connection; the next
//! query reconnects.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use x11rb::connection::Connection;
use x11rb::protocol::xproto::{self, Atom, AtomEnum, Window};
use x11rb::rust_connection::RustConnection;

use super::{MIN_TIMEOUT, ObserverError, WindowObserver};

/// Longest `WM_CLASS` value read, in 32-bit units.
const WM_CLASS_MAX_LEN: u32 = 256;

/// An open display plus the atoms the query needs.
struct Display {
    conn: RustConnection,
    root: Window,
    net_active_window: Atom,
}

impl Display {
    fn connect(name: Option<&str>) -> Result<Self, ObserverError> {
        let (conn, screen_num) = RustConnection::connect(name)
            .map_err(|e| ObserverError::X11(format!("connect failed: {e}")))?;

        let root = conn.setup().roots[screen_num].root;

        let net_active_window = xproto::intern_atom(&conn, false, b"_NET_ACTIVE_WINDOW")
            .map_err(|e| ObserverError::X11(format!("intern_atom: {e}")))?
            .reply()
            .map_err(|e| ObserverError::X11(format!("intern_atom reply: {e}")))?
            .atom;

        Ok(Self {
            conn,
            root,
            net_active_window,
        })
    }

    fn frontmost_app(&self) -> Result<Option<String>, ObserverError> {
        match self.active_window()? {
            Some(window) => self.window_class(window),
            None => Ok(None),
        }
    }

    /// Read `_NET_ACTIVE_WINDOW` on the root window.
    ///
    /// Returns `None` when the property is missing or zero (no window
    /// has focus).
    fn active_window(&self) -> Result<Option<Window>, ObserverError> {
        let reply = xproto::get_property(
            &self.conn,
            false,
            self.root,
            self.net_active_window,
            AtomEnum::WINDOW,
            0,
            1,
        )
        .map_err(|e| ObserverError::X11(format!("get_property _NET_ACTIVE_WINDOW: {e}")))?
        .reply()
        .map_err(|e| ObserverError::X11(format!("get_property reply: {e}")))?;

        if reply.format != 32 || reply.value.len() < 4 {
            return Ok(None);
        }

        let window = u32::from_ne_bytes([
            reply.value[0],
            reply.value[1],
            reply.value[2],
            reply.value[3],
        ]);

        Ok((window != 0).then_some(window))
    }

    /// Read `WM_CLASS` of `window` and return its class part.
    fn window_class(&self, window: Window) -> Result<Option<String>, ObserverError> {
        let reply = xproto::get_property(
            &self.conn,
            false,
            window,
            AtomEnum::WM_CLASS,
            AtomEnum::STRING,
            0,
            WM_CLASS_MAX_LEN,
        )
        .map_err(|e| ObserverError::X11(format!("get_property WM_CLASS: {e}")))?
        .reply()
        .map_err(|e| ObserverError::X11(format!("get_property reply: {e}")))?;

        if reply.format != 8 {
            return Ok(None);
        }

        Ok(parse_wm_class(&reply.value))
    }
}

/// Frontmost-application observer backed by an X11 connection.
pub struct X11Observer {
    /// Display name; `None` means `$DISPLAY`.
    name: Option<String>,
    timeout: Duration,
    display: Mutex<Option<Arc<Display>>>,
}

impl X11Observer {
    /// Observer for display `name` that connects on its first query.
    /// Queries give up after `timeout` (clamped to at least one second).
    pub fn new(name: Option<String>, timeout: Duration) -> Self {
        Self {
            name,
            timeout: timeout.max(MIN_TIMEOUT),
            display: Mutex::new(None),
        }
    }

    /// Connect now, so an unreachable display fails at startup.
    pub fn connect(name: Option<String>, timeout: Duration) -> Result<Self, ObserverError> {
        let observer = Self::new(name, timeout);
        let display = Display::connect(observer.name.as_deref())?;
        observer.store(Some(Arc::new(display)));
        Ok(observer)
    }

    fn cached(&self) -> Option<Arc<Display>> {
        self.display
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn store(&self, display: Option<Arc<Display>>) {
        *self.display.lock().unwrap_or_else(PoisonError::into_inner) = display;
    }
}

impl WindowObserver for X11Observer {
    async fn frontmost_app(&self) -> Result<Option<String>, ObserverError> {
        let cached = self.cached();
        let name = self.name.clone();

        let query = tokio::task::spawn_blocking(
            move || -> Result<(Arc<Display>, Option<String>), ObserverError> {
                let display = match cached {
                    Some(display) => display,
                    None => {
                        tracing::debug!(display = ?name, "connecting to X11 display");
                        Arc::new(Display::connect(name.as_deref())?)
                    }
                };
                let app = display.frontmost_app()?;
                Ok((display, app))
            },
        );

        let result = match tokio::time::timeout(self.timeout, query).await {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => Err(ObserverError::X11(format!("query task failed: {e}"))),
            Err(_) => Err(ObserverError::Timeout(self.timeout)),
        };

        match result {
            Ok((display, app)) => {
                self.store(Some(display));
                Ok(app)
            }
            Err(e) => {
                self.store(None);
                Err(e)
            }
        }
    }
}

/// Split a `WM_CLASS` value (`instance\0class\0`) and return the class.
///
/// Falls back to the instance name when the class is absent.
fn parse_wm_class(value: &[u8]) -> Option<String> {
    let mut parts = value
        .split(|&b| b == 0)
        .filter(|part| !part.is_empty())
        .map(|part| String::from_utf8_lossy(part).into_owned());

    let instance = parts.next()?;
    Some(parts.next().unwrap_or(instance))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A display number no X server listens on.
    const NO_SUCH_DISPLAY: &str = ":4242";

    #[test]
    fn wm_class_returns_class_part() {
        assert_eq!(parse_wm_class(b"code\0Code\0"), Some("Code".into()));
    }

    #[test]
    fn wm_class_without_trailing_nul() {
        assert_eq!(
            parse_wm_class(b"Navigator\0firefox"),
            Some("firefox".into())
        );
    }

    #[test]
    fn wm_class_instance_only() {
        assert_eq!(parse_wm_class(b"xterm\0"), Some("xterm".into()));
    }

    #[test]
    fn wm_class_empty() {
        assert_eq!(parse_wm_class(b""), None);
        assert_eq!(parse_wm_class(b"\0\0"), None);
    }

    #[test]
    fn timeout_is_clamped() {
        let observer = X11Observer::new(None, Duration::from_millis(10));
        assert_eq!(observer.timeout, MIN_TIMEOUT);
    }

    #[test]
    fn connect_to_missing_display_fails() {
        let result = X11Observer::connect(Some(NO_SUCH_DISPLAY.into()), MIN_TIMEOUT);
        assert!(matches!(result, Err(ObserverError::X11(_))));
    }

    #[tokio::test]
    async fn failed_query_leaves_no_connection_and_retries() {
        let observer = X11Observer::new(Some(NO_SUCH_DISPLAY.into()), MIN_TIMEOUT);

        for _ in 0..2 {
            let result = observer.frontmost_app().await;
            assert!(matches!(result, Err(ObserverError::X11(_))));
            assert!(observer.cached().is_none());
        }
    }
}
