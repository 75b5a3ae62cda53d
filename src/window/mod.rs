// src/window/mod.rs

//! The viewer's top-level window.
//!
//! `ViewerWindow` owns the display backend (and through it the display
//! connection), the native window, its graphics context and the
//! screen-sized backing pixmap. It exists only between `open` and `close`:
//! a caller that may not have a window yet holds an `Option<ViewerWindow>`.
//!
//! ```text
//!   open ──► Open ◄──toggle_fullscreen──► Fullscreen
//!              │                             │
//!              └──────────── close ──────────┘──► (consumed)
//! ```

use crate::config::{Config, APP_NAME};
use crate::geometry::{Geometry, ScreenInfo};
use crate::keys::KeyPress;
use crate::platform::backends::x11::XlibBackend;
use crate::platform::backends::{
    Atom, BackendEvent, ClientMessage, DisplayBackend, EventMask, GcId, Pixel, PixmapId,
    WindowId,
};

use anyhow::{Context, Result};
use log::{debug, error, info, trace, warn};


pub use crate::platform::backends::ConfigureEvent;

/// Typed root causes for window setup failures.
///
/// These travel inside `anyhow::Error`; use `downcast_ref` to inspect them.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WindowError {
    /// The X display could not be opened.
    #[error("could not open display{}", display_suffix(.name))]
    DisplayUnavailable { name: Option<String> },
    /// The named colour could not be allocated.
    #[error("could not allocate color: {0}")]
    ColorAllocation(String),
    /// The server refused to create the window.
    #[error("could not create window")]
    WindowCreation,
    /// The server refused to create the backing pixmap.
    #[error("could not create {width}x{height} pixmap")]
    PixmapCreation { width: u32, height: u32 },
    /// The title contains a NUL byte and cannot be passed to the server.
    #[error("window title contains a NUL byte")]
    InvalidTitle,
}

fn display_suffix(name: &Option<String>) -> String {
    match name {
        Some(name) => format!(" {}", name),
        None => " (check the DISPLAY environment variable)".to_string(),
    }
}

/// Which of the two open states the window is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowState {
    Open,
    Fullscreen,
}

/// `_NET_WM_STATE` action codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i64)]
pub enum WmStateAction {
    Remove = 0,
    Add = 1,
}

/// Events the application loop cares about, filtered to this window.
#[derive(Debug, Clone, PartialEq)]
pub enum WindowEvent {
    Configure(ConfigureEvent),
    Key(KeyPress),
    /// The window manager asked the window to close (`WM_DELETE_WINDOW`).
    CloseRequested,
    Other,
}

/// Atoms interned once at `open`.
#[derive(Debug, Clone, Copy, Default)]
struct WmAtoms {
    wm_protocols: Atom,
    wm_delete_window: Atom,
    net_wm_state: Atom,
    net_wm_state_fullscreen: Atom,
    net_wm_state_above: Atom,
}

impl WmAtoms {
    fn intern<B: DisplayBackend>(backend: &mut B) -> Result<Self> {
        Ok(WmAtoms {
            wm_protocols: backend.intern_atom("WM_PROTOCOLS")?,
            wm_delete_window: backend.intern_atom("WM_DELETE_WINDOW")?,
            net_wm_state: backend.intern_atom("_NET_WM_STATE")?,
            net_wm_state_fullscreen: backend.intern_atom("_NET_WM_STATE_FULLSCREEN")?,
            net_wm_state_above: backend.intern_atom("_NET_WM_STATE_ABOVE")?,
        })
    }
}

/// The top-level image viewer window and the display environment it owns.
#[derive(Debug)]
pub struct ViewerWindow<B: DisplayBackend> {
    backend: B,
    screen: ScreenInfo,
    id: WindowId,
    gc: GcId,
    geometry: Geometry,
    background: Pixel,
    fullscreen: bool,
    pixmap: Option<PixmapId>,
    atoms: WmAtoms,
    closed: bool,
}

impl ViewerWindow<XlibBackend> {
    /// Connects to the X display named in the configuration and opens the
    /// window on it.
    pub fn open(config: &Config) -> Result<Self> {
        let backend = XlibBackend::connect(config.window.display.as_deref())
            .context("Failed to connect to the X server")?;
        Self::open_with(backend, config)
    }
}

impl<B: DisplayBackend> ViewerWindow<B> {
    /// Opens the window on an already connected backend.
    ///
    /// The requested size is clamped to the screen and the window is
    /// centred. StructureNotify and KeyPress are selected, the title and
    /// class hint are set, and the window is mapped and flushed.
    ///
    /// # Errors
    ///
    /// `WindowError::ColorAllocation` if the background colour cannot be
    /// allocated and `WindowError::WindowCreation` if the server refuses
    /// the window. A failing class hint is only logged.
    pub fn open_with(mut backend: B, config: &Config) -> Result<Self> {
        let screen = backend.screen();
        info!(
            "Opening window on screen {} ({}x{}, depth {})",
            screen.number, screen.width, screen.height, screen.depth
        );

        let background = backend
            .alloc_named_color(&config.appearance.background)
            .context("Failed to allocate the background colour")?;

        let atoms = WmAtoms::intern(&mut backend)?;

        let geometry = Geometry::centered(&screen, config.window.width, config.window.height);
        let id = backend
            .create_window(&geometry)
            .context("Failed to create the viewer window")?;
        backend.select_input(id, EventMask::STRUCTURE_NOTIFY | EventMask::KEY_PRESS);

        let gc = match backend.create_gc(id) {
            Ok(gc) => gc,
            Err(e) => {
                backend.destroy_window(id);
                return Err(e.context("Failed to create the graphics context"));
            }
        };

        let mut window = ViewerWindow {
            backend,
            screen,
            id,
            gc,
            geometry,
            background,
            fullscreen: false,
            pixmap: None,
            atoms,
            closed: false,
        };

        window.set_title(Some(&config.window.title))?;

        if let Err(e) =
            window
                .backend
                .set_class_hint(id, &config.window.res_name, &config.window.res_class)
        {
            // Best effort: the window works without WM_CLASS.
            warn!("Could not set class hint on window {}: {:#}", id, e);
        }

        if window.atoms.wm_delete_window != 0 {
            if let Err(e) = window
                .backend
                .set_wm_protocols(id, &[window.atoms.wm_delete_window])
            {
                warn!("Could not register WM_DELETE_WINDOW: {:#}", e);
            }
        }

        window.backend.map_window(id);
        window.backend.flush();
        info!(
            "Window {} opened at {}x{}+{}+{}",
            id, geometry.width, geometry.height, geometry.x, geometry.y
        );
        Ok(window)
    }

    /// Destroys the window and closes the display connection.
    pub fn close(mut self) {
        self.teardown();
    }

    fn teardown(&mut self) {
        if self.closed {
            return;
        }
        info!("Closing window {}", self.id);
        if let Some(pixmap) = self.pixmap.take() {
            self.backend.free_pixmap(pixmap);
        }
        self.backend.free_gc(self.gc);
        self.backend.destroy_window(self.id);
        self.backend.flush();
        self.backend.disconnect();
        self.closed = true;
    }

    /// Sets window title and icon name. `None` or an empty string selects
    /// the application name.
    pub fn set_title(&mut self, title: Option<&str>) -> Result<()> {
        let title = match title {
            Some(t) if !t.is_empty() => t,
            _ => APP_NAME,
        };
        trace!("Setting title of window {} to '{}'", self.id, title);
        self.backend
            .set_title(self.id, title)
            .with_context(|| format!("Failed to set window title to '{}'", title))?;
        self.backend.flush();
        Ok(())
    }

    /// Applies a ConfigureNotify to the stored geometry.
    ///
    /// Returns true if the width or height changed, meaning drawing
    /// resources sized to the window need to be rebuilt.
    pub fn configure(&mut self, event: &ConfigureEvent) -> bool {
        let new = event.geometry();
        let changed = self.geometry.size_differs(&new);
        if changed {
            debug!(
                "Window {} resized from {}x{} to {}x{}",
                self.id, self.geometry.width, self.geometry.height, new.width, new.height
            );
        }
        self.geometry = new;
        changed
    }

    /// Flips the fullscreen flag and asks the window manager to follow.
    ///
    /// Sends `_NET_WM_STATE` with `[action, FULLSCREEN, ABOVE, 0]` to the
    /// root window, `action` being add when entering and remove when leaving.
    ///
    /// The local flag only changes once the request has been sent.
    pub fn toggle_fullscreen(&mut self) -> Result<()> {
        let fullscreen = !self.fullscreen;
        let action = if fullscreen {
            WmStateAction::Add
        } else {
            WmStateAction::Remove
        };
        info!(
            "Window {} fullscreen -> {} ({:?})",
            self.id, fullscreen, action
        );
        let message = ClientMessage {
            window: self.id,
            message_type: self.atoms.net_wm_state,
            data: [
                action as i64,
                self.atoms.net_wm_state_fullscreen as i64,
                self.atoms.net_wm_state_above as i64,
                0,
                0,
            ],
        };
        self.backend
            .send_to_root(&message)
            .context("Failed to send _NET_WM_STATE request")?;
        self.fullscreen = fullscreen;
        self.backend.flush();
        Ok(())
    }

    /// Replaces the backing pixmap with a fresh screen-sized one filled
    /// with the background: black in fullscreen, the configured colour
    /// otherwise.
    pub fn clear(&mut self) -> Result<()> {
        if let Some(old) = self.pixmap.take() {
            trace!("Freeing previous pixmap {}", old);
            self.backend.free_pixmap(old);
        }
        let (width, height) = (self.screen.width, self.screen.height);
        let pixmap = self
            .backend
            .create_pixmap(self.id, width, height, self.screen.depth)
            .context("Failed to allocate the backing pixmap")?;
        self.pixmap = Some(pixmap);

        let fill = if self.fullscreen {
            self.backend.black_pixel()
        } else {
            self.background
        };
        self.backend.set_foreground(self.gc, fill);
        self.backend.fill_rectangle(pixmap, self.gc, width, height);
        debug!("Pixmap {} cleared to pixel 0x{:06x}", pixmap, fill);
        Ok(())
    }

    /// Installs the backing pixmap as the window background and repaints.
    pub fn present(&mut self) {
        match self.pixmap {
            Some(pixmap) => self.backend.set_background_pixmap(self.id, pixmap),
            None => debug!("present: window {} has no pixmap yet", self.id),
        }
        self.backend.clear_window(self.id);
        self.backend.flush();
    }

    /// Blocks until the next event and filters it to this window.
    pub fn next_event(&mut self) -> Result<WindowEvent> {
        let event = self.backend.next_event()?;
        Ok(self.filter_event(event))
    }

    fn filter_event(&self, event: BackendEvent) -> WindowEvent {
        match event {
            BackendEvent::Configure(ev) if ev.window == self.id => WindowEvent::Configure(ev),
            BackendEvent::Key { window, key } if window == self.id => WindowEvent::Key(key),
            BackendEvent::ClientMessage(cm)
                if cm.window == self.id
                    && cm.message_type == self.atoms.wm_protocols
                    && self.atoms.wm_delete_window != 0
                    && cm.data[0] as Atom == self.atoms.wm_delete_window =>
            {
                WindowEvent::CloseRequested
            }
            other => {
                trace!("Ignoring event {:?} for window {}", other, self.id);
                WindowEvent::Other
            }
        }
    }

    // --- Getter methods ---

    #[inline]
    pub fn id(&self) -> WindowId {
        self.id
    }

    #[inline]
    pub fn geometry(&self) -> Geometry {
        self.geometry
    }

    #[inline]
    pub fn screen(&self) -> ScreenInfo {
        self.screen
    }

    #[inline]
    pub fn is_fullscreen(&self) -> bool {
        self.fullscreen
    }

    #[inline]
    pub fn state(&self) -> WindowState {
        if self.fullscreen {
            WindowState::Fullscreen
        } else {
            WindowState::Open
        }
    }

    #[inline]
    pub fn background_pixel(&self) -> Pixel {
        self.background
    }

    #[inline]
    pub fn pixmap(&self) -> Option<PixmapId> {
        self.pixmap
    }
}

impl<B: DisplayBackend> Drop for ViewerWindow<B> {
    fn drop(&mut self) {
        if !self.closed {
            error!(
                "Window (ID: {}) dropped without close(); tearing down now.",
                self.id
            );
            self.teardown();
        }
    }
}
