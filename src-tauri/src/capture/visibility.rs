//! Hides every app window for the duration of a capture.
//!
//! A [`CaptureSession`] snapshots each top-level window's visibility, hides
//! the visible ones, and puts every window back to its snapshotted flag
//! when restored or dropped. Windows that were hidden before stay hidden.

use std::future::Future;
use std::time::Duration;

/// The slice of a window the coordinator needs.
pub trait TopLevelWindow {
    fn label(&self) -> String;
    fn is_visible(&self) -> Result<bool, VisibilityError>;
    fn set_visible(&self, visible: bool) -> Result<(), VisibilityError>;
    fn focus(&self) -> Result<(), VisibilityError>;
}

/// Enumerates the app's top-level windows.
pub trait WindowHost {
    type Window: TopLevelWindow;

    fn top_level_windows(&self) -> Vec<Self::Window>;
}

/// Windows hidden for one capture, with their prior visibility.
pub struct CaptureSession<W: TopLevelWindow> {
    snapshot: Vec<(W, bool)>,
    restored: bool,
}

impl<W: TopLevelWindow> CaptureSession<W> {
    /// Snapshot visibility and hide every currently-visible window.
    ///
    /// A window whose visibility cannot be read is left untouched.
    pub fn hide_all(windows: Vec<W>) -> Self {
        let mut snapshot = Vec::with_capacity(windows.len());

        for window in windows {
            let was_visible = match window.is_visible() {
                Ok(v) => v,
                Err(e) => {
                    log::warn!("[CAPTURE] Skipping window: {}", e);
                    continue;
                }
            };
            if was_visible {
                if let Err(e) = window.set_visible(false) {
                    log::warn!("[CAPTURE] {}", e);
                }
            }
            snapshot.push((window, was_visible));
        }

        log::debug!(
            "[CAPTURE] Hid {} of {} window(s)",
            snapshot.iter().filter(|(_, v)| *v).count(),
            snapshot.len()
        );

        Self {
            snapshot,
            restored: false,
        }
    }

    /// Put every window back to its snapshotted visibility.
    ///
    /// All windows are attempted even if some fail; the failures are
    /// reported together.
    pub fn restore(mut self) -> Result<(), VisibilityError> {
        self.restore_all()
    }

    fn restore_all(&mut self) -> Result<(), VisibilityError> {
        self.restored = true;

        let mut failed = Vec::new();
        for (window, was_visible) in &self.snapshot {
            if let Err(e) = window.set_visible(*was_visible) {
                log::error!("[CAPTURE] {}", e);
                failed.push(window.label());
            }
        }

        if failed.is_empty() {
            Ok(())
        } else {
            Err(VisibilityError::Restore(failed))
        }
    }
}

impl<W: TopLevelWindow> Drop for CaptureSession<W> {
    fn drop(&mut self) {
        if !self.restored {
            log::warn!("[CAPTURE] Session dropped before restore, restoring now");
            if let Err(e) = self.restore_all() {
                log::error!("[CAPTURE] {}", e);
            }
        }
    }
}

/// Run `action` with every app window hidden.
///
/// Waits `settle` after hiding so the compositor repaints without the app's
/// own chrome. That delay is a race-avoidance heuristic, not a guarantee.
/// Visibility is restored after `action` completes or fails, and also if
/// this future is dropped or `action` panics. Restoration failures are
/// logged; the action's result is returned regardless.
pub async fn with_hidden_windows<H, F, Fut, T>(host: &H, settle: Duration, action: F) -> T
where
    H: WindowHost,
    F: FnOnce() -> Fut,
    Fut: Future<Output = T>,
{
    let session = CaptureSession::hide_all(host.top_level_windows());

    if !settle.is_zero() {
        tokio::time::sleep(settle).await;
    }

    let result = action().await;

    if let Err(e) = session.restore() {
        log::error!("[CAPTURE] Capture finished but {}", e);
    }

    result
}

#[derive(Debug, thiserror::Error)]
pub enum VisibilityError {
    #[error("Failed to read visibility of window '{label}': {message}")]
    Query { label: String, message: String },

    #[error("Failed to change visibility of window '{label}': {message}")]
    Toggle { label: String, message: String },

    #[error("Failed to focus window '{label}': {message}")]
    Focus { label: String, message: String },

    #[error("visibility could not be restored for window(s): {}", .0.join(", "))]
    Restore(Vec<String>),
}

#[cfg(test)]
pub(crate) mod fake {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Debug, Clone)]
    pub struct FakeWindow {
        pub label: &'static str,
        pub visible: Rc<RefCell<bool>>,
        pub focused: Rc<RefCell<bool>>,
        pub fail_restore: bool,
        hidden_once: Rc<RefCell<bool>>,
    }

    impl FakeWindow {
        pub fn new(label: &'static str, visible: bool) -> Self {
            Self {
                label,
                visible: Rc::new(RefCell::new(visible)),
                focused: Rc::new(RefCell::new(false)),
                fail_restore: false,
                hidden_once: Rc::new(RefCell::new(false)),
            }
        }

        pub fn is_shown(&self) -> bool {
            *self.visible.borrow()
        }
    }

    impl TopLevelWindow for FakeWindow {
        fn label(&self) -> String {
            self.label.to_string()
        }

        fn is_visible(&self) -> Result<bool, VisibilityError> {
            Ok(*self.visible.borrow())
        }

        fn set_visible(&self, visible: bool) -> Result<(), VisibilityError> {
            if visible && self.fail_restore && *self.hidden_once.borrow() {
                return Err(VisibilityError::Toggle {
                    label: self.label(),
                    message: "window server went away".into(),
                });
            }
            if !visible {
                *self.hidden_once.borrow_mut() = true;
            }
            *self.visible.borrow_mut() = visible;
            Ok(())
        }

        fn focus(&self) -> Result<(), VisibilityError> {
            *self.focused.borrow_mut() = true;
            Ok(())
        }
    }

    pub struct FakeHost(pub Vec<FakeWindow>);

    impl WindowHost for FakeHost {
        type Window = FakeWindow;

        fn top_level_windows(&self) -> Vec<FakeWindow> {
            self.0.clone()
        }
    }
}
