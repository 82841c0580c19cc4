//! Screen Ask: Tauri application entry point.
//!
//! This is the app shell that wires together:
//! - Screen capture with the app's windows hidden (capture/)
//! - The `/ask` backend client and its SSE decoder (backend/)
//! - The annotation overlay window (overlay/)
//! - The conversation and its query cycle (conversation/)
//! - Global hotkey and system tray for showing the main window

pub mod backend;
pub mod capture;
mod commands;
pub mod config;
pub mod conversation;
pub mod hotkey;
pub mod overlay;
mod tray;

use backend::BackendClient;
use config::AppConfig;
use conversation::Conversation;
use overlay::{AppOverlay, OverlayController, TauriOverlaySurface, OVERLAY_LABEL};
use tauri::{Manager, WindowEvent};

pub const MAIN_WINDOW_LABEL: &str = "main";

/// Entry point, called by the Tauri runtime.
#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    env_logger::init();

    let config = AppConfig::from_env().unwrap_or_else(|e| {
        log::error!("[CONFIG] {}, falling back to defaults", e);
        AppConfig::default()
    });
    let client = BackendClient::new(&config.backend_url, config.request_timeout)
        .expect("Failed to build HTTP client");

    log::info!("Backend: {}", client.endpoint("ask"));

    tauri::Builder::default()
        .plugin(tauri_plugin_global_shortcut::Builder::new().build())
        .manage(client)
        .manage(Conversation::new())
        .manage(config)
        .invoke_handler(tauri::generate_handler![
            commands::submit_question,
            commands::get_conversation,
            commands::capture_screenshot,
            commands::show_overlay,
            commands::hide_overlay,
            commands::close_overlay,
            commands::overlay_input,
            commands::overlay_ready,
            commands::backend_health,
        ])
        .setup(|app| {
            log::info!("Screen Ask starting up");

            let config = app.state::<AppConfig>().inner().clone();
            let surface = TauriOverlaySurface::new(app.handle().clone());
            let overlay: AppOverlay = OverlayController::new(surface, config.overlay_delivery_delay);
            app.manage(overlay);

            tray::setup_tray(app.handle())?;

            // A bad or already-taken hotkey should not keep the app from starting.
            if let Err(e) = hotkey::register_toggle(app.handle(), &config.hotkey) {
                log::error!("[HOTKEY] {}", e);
            }

            log::info!("Ready, press {} to ask about the screen", config.hotkey);
            Ok(())
        })
        .on_window_event(|window, event| match (window.label(), event) {
            (MAIN_WINDOW_LABEL, WindowEvent::CloseRequested { api, .. }) => {
                // Keep the conversation alive; the hotkey brings it back.
                api.prevent_close();
                if let Err(e) = window.hide() {
                    log::error!("Failed to hide main window: {}", e);
                }
            }
            (OVERLAY_LABEL, WindowEvent::Destroyed) => {
                let app = window.app_handle().clone();
                tauri::async_runtime::spawn(async move {
                    app.state::<AppOverlay>().mark_destroyed().await;
                });
            }
            _ => {}
        })
        .run(tauri::generate_context!())
        .expect("Error running Screen Ask");
}
