//! Global hotkey that shows or hides the main window.

use tauri::{AppHandle, Manager};
use tauri_plugin_global_shortcut::{GlobalShortcutExt, Shortcut, ShortcutState};

use crate::capture::{TopLevelWindow, VisibilityError};
use crate::MAIN_WINDOW_LABEL;

/// Hide a visible window; show and focus a hidden one.
///
/// Returns the window's new visibility.
pub fn toggle<W: TopLevelWindow>(window: &W) -> Result<bool, VisibilityError> {
    if window.is_visible()? {
        window.set_visible(false)?;
        Ok(false)
    } else {
        window.set_visible(true)?;
        window.focus()?;
        Ok(true)
    }
}

pub fn toggle_main_window(app: &AppHandle) {
    let Some(window) = app.get_webview_window(MAIN_WINDOW_LABEL) else {
        log::warn!("[HOTKEY] Main window is gone, nothing to toggle");
        return;
    };
    match toggle(&window) {
        Ok(visible) => log::info!("[HOTKEY] Main window {}", if visible { "shown" } else { "hidden" }),
        Err(e) => log::error!("[HOTKEY] {}", e),
    }
}

/// Register `accelerator` (e.g. `CommandOrControl+Shift+Space`) to toggle
/// the main window on key press.
pub fn register_toggle(app: &AppHandle, accelerator: &str) -> Result<(), Box<dyn std::error::Error>> {
    let shortcut: Shortcut = accelerator
        .parse()
        .map_err(|e| format!("Invalid hotkey {:?}: {}", accelerator, e))?;

    app.global_shortcut()
        .on_shortcut(shortcut, |app, _shortcut, event| {
            if event.state() == ShortcutState::Pressed {
                toggle_main_window(app);
            }
        })?;

    log::info!("[HOTKEY] Registered {}", accelerator);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::visibility::fake::FakeWindow;

    #[test]
    fn hides_visible_window() {
        let w = FakeWindow::new("main", true);
        assert!(!toggle(&w).unwrap());
        assert!(!w.is_shown());
        assert!(!*w.focused.borrow());
    }

    #[test]
    fn shows_and_focuses_hidden_window() {
        let w = FakeWindow::new("main", false);
        assert!(toggle(&w).unwrap());
        assert!(w.is_shown());
        assert!(*w.focused.borrow());
    }
}
