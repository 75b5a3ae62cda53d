// In src/main.rs

// Declare modules
pub mod app;
pub mod config;
pub mod geometry;
pub mod keys;
pub mod platform;
pub mod window;

use crate::{app::App, config::CONFIG, window::ViewerWindow};

// Logging
use log::{error, info};

/// Main entry point for `pixview`.
fn main() {
    // Initialize the logger. Default filter is "info" if RUST_LOG is not set.
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_micros()
        .init();

    info!("Starting pixview...");
    let config = &*CONFIG;

    // A missing display or background colour leaves nothing to show.
    let window = match ViewerWindow::open(config) {
        Ok(window) => window,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("pixview: {}", e.root_cause());
            std::process::exit(1);
        }
    };

    if let Err(e) = App::new(window, config.keybindings.clone()).run() {
        error!("Error in event loop: {:#}. Exiting.", e);
        std::process::exit(1);
    }
    info!("pixview exited successfully.");
}
