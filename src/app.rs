// src/app.rs
//! Drives the viewer window from its event stream: redraw on resize,
//! toggle fullscreen and quit on key bindings, and honour close requests.

use crate::config::KeybindingsConfig;
use crate::keys::{self, Action};
use crate::platform::backends::DisplayBackend;
use crate::window::{ViewerWindow, WindowEvent};
use anyhow::{Context, Result};

/// What the loop should do after an event.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum AppStatus {
    Running,
    /// A quit binding or a close request was received.
    Shutdown,
}

pub struct App<B: DisplayBackend> {
    window: ViewerWindow<B>,
    keybindings: KeybindingsConfig,
}

impl<B: DisplayBackend> App<B> {
    pub fn new(window: ViewerWindow<B>, keybindings: KeybindingsConfig) -> Self {
        App {
            window,
            keybindings,
        }
    }

    /// Paints the initial background.
    pub fn start(&mut self) -> Result<()> {
        self.redraw().context("Initial redraw failed")
    }

    fn redraw(&mut self) -> Result<()> {
        self.window.clear()?;
        self.window.present();
        Ok(())
    }

    /// Waits for one event and handles it.
    pub fn process_event(&mut self) -> Result<AppStatus> {
        match self.window.next_event()? {
            WindowEvent::Configure(ev) => {
                if self.window.configure(&ev) {
                    log::debug!("App: window size changed, redrawing.");
                    self.redraw()?;
                }
                Ok(AppStatus::Running)
            }
            WindowEvent::Key(key) => match keys::action_for(&key, &self.keybindings) {
                Some(Action::ToggleFullscreen) => {
                    self.window.toggle_fullscreen()?;
                    self.redraw()?;
                    Ok(AppStatus::Running)
                }
                Some(Action::Quit) => {
                    log::info!("App: quit key pressed.");
                    Ok(AppStatus::Shutdown)
                }
                None => Ok(AppStatus::Running),
            },
            WindowEvent::CloseRequested => {
                log::info!("App: window manager requested close.");
                Ok(AppStatus::Shutdown)
            }
            WindowEvent::Other => Ok(AppStatus::Running),
        }
    }

    /// Runs until shutdown, then closes the window. The window is closed on
    /// the error path too.
    pub fn run(mut self) -> Result<()> {
        let result = self.start().and_then(|_| loop {
            match self.process_event() {
                Ok(AppStatus::Running) => {}
                Ok(AppStatus::Shutdown) => break Ok(()),
                Err(e) => break Err(e),
            }
        });
        self.window.close();
        result
    }

    pub fn window(&self) -> &ViewerWindow<B> {
        &self.window
    }
}
