//! Build script for Screen Ask.
//!
//! Only the Tauri build step is needed: it validates `tauri.conf.json`,
//! embeds the capability files and generates the context consumed by
//! `tauri::generate_context!()`. Capture and overlay code are pure Rust,
//! so there is no platform-specific bridge to compile.

fn main() {
    println!("cargo:rerun-if-changed=tauri.conf.json");
    println!("cargo:rerun-if-changed=capabilities");

    tauri_build::build();
}
