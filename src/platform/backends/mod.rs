// src/platform/backends/mod.rs

//! Defines the `DisplayBackend` trait and the plain-data types that cross it.
//!
//! A backend exposes the handful of window-system primitives the viewer
//! window is built from: window and pixmap creation, event selection,
//! atoms and client messages, graphics-context fills and background
//! installation. All policy (geometry, fullscreen colour, pixmap
//! replacement) lives in `crate::window`, so the Xlib backend stays a thin
//! translation layer and the mock backend can record every request.

use crate::geometry::{Geometry, ScreenInfo};
pub use crate::keys::{KeyPress, KeySymbol, Modifiers};
use anyhow::Result;
use bitflags::bitflags;

#[cfg(test)]
pub mod mock;
pub mod x11;

/// Server-assigned identifier of a window.
pub type WindowId = u64;
/// Server-assigned identifier of a pixmap.
pub type PixmapId = u64;
/// Interned atom. `0` means the atom does not exist.
pub type Atom = u64;
/// Colour value in the screen's visual.
pub type Pixel = u64;

/// Handle to a graphics context held by a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GcId(pub usize);

bitflags! {
    /// Event classes a client can select on a window.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct EventMask: u32 {
        const KEY_PRESS = 1 << 0;
        const STRUCTURE_NOTIFY = 1 << 2;
        const SUBSTRUCTURE_NOTIFY = 1 << 3;
        const SUBSTRUCTURE_REDIRECT = 1 << 4;
    }
}

/// Payload of a ConfigureNotify: the window's new position, size and
/// border width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfigureEvent {
    pub window: WindowId,
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
    pub border_width: u32,
}

impl ConfigureEvent {
    #[inline]
    pub fn geometry(&self) -> Geometry {
        Geometry {
            x: self.x,
            y: self.y,
            width: self.width,
            height: self.height,
            border_width: self.border_width,
        }
    }
}

/// A 32-bit format client message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientMessage {
    pub window: WindowId,
    pub message_type: Atom,
    pub data: [i64; 5],
}

/// Events read from the backend, before the window filters them.
#[derive(Debug, Clone, PartialEq)]
pub enum BackendEvent {
    Configure(ConfigureEvent),
    Key { window: WindowId, key: KeyPress },
    ClientMessage(ClientMessage),
    /// Any event the viewer does not act on.
    Other { event_type: i32 },
}

/// Minimal window-system interface used by `ViewerWindow`.
///
/// The connection itself is the implementor: it is opened by the
/// implementation's constructor and closed by [`DisplayBackend::disconnect`]
/// or on drop.
pub trait DisplayBackend {
    /// Geometry and depth of the default screen.
    fn screen(&self) -> ScreenInfo;

    /// Allocates a named colour (`"black"`, `"#888888"`, ...) in the default
    /// colormap and returns its pixel value.
    fn alloc_named_color(&mut self, name: &str) -> Result<Pixel>;

    /// Black pixel of the default screen.
    fn black_pixel(&self) -> Pixel;

    /// Creates an input-output child of the root window.
    fn create_window(&mut self, geometry: &Geometry) -> Result<WindowId>;

    fn select_input(&mut self, window: WindowId, mask: EventMask);

    fn create_gc(&mut self, window: WindowId) -> Result<GcId>;

    fn free_gc(&mut self, gc: GcId);

    /// Sets the window name and icon name.
    fn set_title(&mut self, window: WindowId, title: &str) -> Result<()>;

    /// Sets the WM_CLASS hint.
    fn set_class_hint(&mut self, window: WindowId, res_name: &str, res_class: &str) -> Result<()>;

    /// Looks up (creating if needed) the atom for `name`.
    fn intern_atom(&mut self, name: &str) -> Result<Atom>;

    fn set_wm_protocols(&mut self, window: WindowId, protocols: &[Atom]) -> Result<()>;

    fn map_window(&mut self, window: WindowId);

    fn flush(&mut self);

    /// Sends `message` to the root window, where the window manager picks
    /// it up.
    fn send_to_root(&mut self, message: &ClientMessage) -> Result<()>;

    fn create_pixmap(
        &mut self,
        window: WindowId,
        width: u32,
        height: u32,
        depth: u32,
    ) -> Result<PixmapId>;

    fn free_pixmap(&mut self, pixmap: PixmapId);

    fn set_foreground(&mut self, gc: GcId, pixel: Pixel);

    fn fill_rectangle(&mut self, pixmap: PixmapId, gc: GcId, width: u32, height: u32);

    fn set_background_pixmap(&mut self, window: WindowId, pixmap: PixmapId);

    /// Repaints the whole window with its background.
    fn clear_window(&mut self, window: WindowId);

    fn destroy_window(&mut self, window: WindowId);

    /// Blocks until the next event arrives.
    fn next_event(&mut self) -> Result<BackendEvent>;

    /// Closes the display connection. Idempotent.
    fn disconnect(&mut self);
}
