// src/platform/backends/x11/mod.rs

//! Xlib implementation of `DisplayBackend`.
//!
//! `XlibBackend` ties together the submodules:
//! - `connection`: opens and closes the display and discovers the screen.
//! - `graphics`: graphics contexts, colours, pixmaps and fills.
//! - `event`: reads X events and translates them into `BackendEvent`s.
//!
//! Window-level requests (create, title, class hint, protocols, map,
//! client messages, background) are issued directly from here.

pub mod connection;
pub mod event;
pub mod graphics;

use crate::geometry::{Geometry, ScreenInfo};
use crate::platform::backends::{
    Atom, BackendEvent, ClientMessage, DisplayBackend, EventMask, GcId, Pixel, PixmapId,
    WindowId,
};
use crate::window::WindowError;

use anyhow::{anyhow, Context, Result};
use connection::Connection;
use graphics::SafeGc;
use log::{debug, info, trace, warn};
use std::collections::HashMap;
use std::ffi::CString;
use std::mem;

use libc::{c_char, c_int, c_long, c_uint};
use x11::xlib;

/// Display backend talking to an X server through Xlib.
///
/// Graphics contexts are declared before the connection so they are freed
/// while the display is still open.
#[derive(Debug)]
pub struct XlibBackend {
    gcs: HashMap<usize, SafeGc>,
    next_gc: usize,
    connection: Connection,
}

impl XlibBackend {
    /// Connects to `display_name`, or to `$DISPLAY` when `None`.
    pub fn connect(display_name: Option<&str>) -> Result<Self> {
        let connection = Connection::open(display_name)?;
        Ok(Self {
            gcs: HashMap::new(),
            next_gc: 0,
            connection,
        })
    }

    fn display(&self) -> *mut xlib::Display {
        self.connection.display()
    }

    fn gc(&self, gc: GcId) -> Option<&SafeGc> {
        let found = self.gcs.get(&gc.0);
        if found.is_none() {
            warn!("Unknown graphics context {:?}", gc);
        }
        found
    }
}

fn xlib_event_mask(mask: EventMask) -> c_long {
    let mut out: c_long = 0;
    if mask.contains(EventMask::KEY_PRESS) {
        out |= xlib::KeyPressMask;
    }
    if mask.contains(EventMask::STRUCTURE_NOTIFY) {
        out |= xlib::StructureNotifyMask;
    }
    if mask.contains(EventMask::SUBSTRUCTURE_NOTIFY) {
        out |= xlib::SubstructureNotifyMask;
    }
    if mask.contains(EventMask::SUBSTRUCTURE_REDIRECT) {
        out |= xlib::SubstructureRedirectMask;
    }
    out
}

impl DisplayBackend for XlibBackend {
    fn screen(&self) -> ScreenInfo {
        self.connection.screen()
    }

    fn alloc_named_color(&mut self, name: &str) -> Result<Pixel> {
        graphics::alloc_named_color(&self.connection, name)
    }

    fn black_pixel(&self) -> Pixel {
        graphics::black_pixel(&self.connection)
    }

    fn create_window(&mut self, geometry: &Geometry) -> Result<WindowId> {
        let screen = self.connection.screen();
        debug!(
            "Creating X11 window {}x{}+{}+{}",
            geometry.width, geometry.height, geometry.x, geometry.y
        );
        // SAFETY: the display is open; no attributes are passed.
        let window_id = unsafe {
            xlib::XCreateWindow(
                self.display(),
                self.connection.root_window(),
                geometry.x as c_int,
                geometry.y as c_int,
                geometry.width as c_uint,
                geometry.height as c_uint,
                geometry.border_width as c_uint,
                screen.depth as c_int,
                xlib::InputOutput as c_uint,
                self.connection.visual(),
                0,
                std::ptr::null_mut(),
            )
        };
        if window_id == 0 {
            return Err(WindowError::WindowCreation.into());
        }
        debug!("X window created (ID: {})", window_id);
        Ok(window_id as WindowId)
    }

    fn select_input(&mut self, window: WindowId, mask: EventMask) {
        trace!("Selecting {:?} on window {}", mask, window);
        // SAFETY: the display is open.
        unsafe { xlib::XSelectInput(self.display(), window as xlib::Window, xlib_event_mask(mask)) };
    }

    fn create_gc(&mut self, window: WindowId) -> Result<GcId> {
        let gc = SafeGc::create(&self.connection, window)?;
        let id = self.next_gc;
        self.next_gc += 1;
        self.gcs.insert(id, gc);
        Ok(GcId(id))
    }

    fn free_gc(&mut self, gc: GcId) {
        // SafeGc's Drop frees it on the server.
        if self.gcs.remove(&gc.0).is_none() {
            warn!("free_gc: unknown graphics context {:?}", gc);
        }
    }

    fn set_title(&mut self, window: WindowId, title: &str) -> Result<()> {
        let title_c = CString::new(title).map_err(|_| WindowError::InvalidTitle)?;
        let display = self.display();
        // SAFETY: the display is open and `title_c` outlives every call.
        unsafe {
            xlib::XStoreName(display, window as xlib::Window, title_c.as_ptr() as *mut c_char);
            xlib::XSetIconName(display, window as xlib::Window, title_c.as_ptr() as *mut c_char);
        }

        // _NET_WM_NAME carries the UTF-8 title for EWMH window managers.
        let net_wm_name = self.intern_atom("_NET_WM_NAME")?;
        let utf8_string = self.intern_atom("UTF8_STRING")?;
        if net_wm_name != 0 && utf8_string != 0 {
            // SAFETY: as above.
            unsafe {
                xlib::XChangeProperty(
                    display,
                    window as xlib::Window,
                    net_wm_name as xlib::Atom,
                    utf8_string as xlib::Atom,
                    8,
                    xlib::PropModeReplace,
                    title_c.as_ptr() as *const u8,
                    title_c.as_bytes().len() as c_int,
                );
            }
        } else {
            debug!("_NET_WM_NAME or UTF8_STRING unavailable; title set via XStoreName only.");
        }
        Ok(())
    }

    fn set_class_hint(&mut self, window: WindowId, res_name: &str, res_class: &str) -> Result<()> {
        let name_c = CString::new(res_name).context("res_name contains an interior NUL byte")?;
        let class_c = CString::new(res_class).context("res_class contains an interior NUL byte")?;
        // SAFETY: XAllocClassHint returns a zeroed struct or null; the strings
        // outlive XSetClassHint, which copies them to the server.
        unsafe {
            let hint = xlib::XAllocClassHint();
            if hint.is_null() {
                return Err(anyhow!("XAllocClassHint failed"));
            }
            (*hint).res_name = name_c.as_ptr() as *mut c_char;
            (*hint).res_class = class_c.as_ptr() as *mut c_char;
            xlib::XSetClassHint(self.display(), window as xlib::Window, hint);
            xlib::XFree(hint as *mut libc::c_void);
        }
        Ok(())
    }

    fn intern_atom(&mut self, name: &str) -> Result<Atom> {
        let name_c = CString::new(name).context("Atom name contains an interior NUL byte")?;
        // SAFETY: the display is open.
        let atom = unsafe { xlib::XInternAtom(self.display(), name_c.as_ptr(), xlib::False) };
        trace!("Interned atom {} = {}", name, atom);
        Ok(atom as Atom)
    }

    fn set_wm_protocols(&mut self, window: WindowId, protocols: &[Atom]) -> Result<()> {
        let mut atoms: Vec<xlib::Atom> = protocols.iter().map(|&a| a as xlib::Atom).collect();
        // SAFETY: `atoms` is valid for `len` elements during the call.
        let status = unsafe {
            xlib::XSetWMProtocols(
                self.display(),
                window as xlib::Window,
                atoms.as_mut_ptr(),
                atoms.len() as c_int,
            )
        };
        if status == 0 {
            return Err(anyhow!("XSetWMProtocols failed for window {}", window));
        }
        Ok(())
    }

    fn map_window(&mut self, window: WindowId) {
        info!("Mapping window ID: {}", window);
        // SAFETY: the display is open.
        unsafe { xlib::XMapWindow(self.display(), window as xlib::Window) };
    }

    fn flush(&mut self) {
        // SAFETY: the display is open.
        unsafe { xlib::XFlush(self.display()) };
    }

    fn send_to_root(&mut self, message: &ClientMessage) -> Result<()> {
        // SAFETY: zeroed XEvent is valid; only the client message arm is
        // written. The display is open.
        let status = unsafe {
            let mut ev: xlib::XEvent = mem::zeroed();
            let cm = &mut ev.client_message;
            cm.type_ = xlib::ClientMessage;
            cm.window = message.window as xlib::Window;
            cm.message_type = message.message_type as xlib::Atom;
            cm.format = 32;
            for (i, &value) in message.data.iter().enumerate() {
                cm.data.set_long(i, value as c_long);
            }
            xlib::XSendEvent(
                self.display(),
                self.connection.root_window(),
                xlib::False,
                xlib::SubstructureNotifyMask | xlib::SubstructureRedirectMask,
                &mut ev,
            )
        };
        if status == 0 {
            return Err(anyhow!(
                "XSendEvent failed for client message type {}",
                message.message_type
            ));
        }
        Ok(())
    }

    fn create_pixmap(
        &mut self,
        window: WindowId,
        width: u32,
        height: u32,
        depth: u32,
    ) -> Result<PixmapId> {
        graphics::create_pixmap(&self.connection, window, width, height, depth)
    }

    fn free_pixmap(&mut self, pixmap: PixmapId) {
        graphics::free_pixmap(&self.connection, pixmap);
    }

    fn set_foreground(&mut self, gc: GcId, pixel: Pixel) {
        if let Some(gc) = self.gc(gc) {
            gc.set_foreground(pixel);
        }
    }

    fn fill_rectangle(&mut self, pixmap: PixmapId, gc: GcId, width: u32, height: u32) {
        if let Some(gc) = self.gc(gc) {
            graphics::fill_rectangle(&self.connection, pixmap, gc, width, height);
        }
    }

    fn set_background_pixmap(&mut self, window: WindowId, pixmap: PixmapId) {
        // SAFETY: the display is open.
        unsafe {
            xlib::XSetWindowBackgroundPixmap(
                self.display(),
                window as xlib::Window,
                pixmap as xlib::Pixmap,
            )
        };
    }

    fn clear_window(&mut self, window: WindowId) {
        // SAFETY: the display is open.
        unsafe { xlib::XClearWindow(self.display(), window as xlib::Window) };
    }

    fn destroy_window(&mut self, window: WindowId) {
        info!("Destroying X11 window (ID: {}).", window);
        // SAFETY: the display is open.
        unsafe { xlib::XDestroyWindow(self.display(), window as xlib::Window) };
    }

    fn next_event(&mut self) -> Result<BackendEvent> {
        if self.connection.is_closed() {
            return Err(anyhow!("next_event called on a closed display"));
        }
        Ok(event::next_event(&self.connection))
    }

    fn disconnect(&mut self) {
        if self.connection.is_closed() {
            debug!("disconnect: display already closed.");
            return;
        }
        self.gcs.clear();
        self.connection.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn event_mask_translation() {
        assert_eq!(xlib_event_mask(EventMask::empty()), 0);
        assert_eq!(
            xlib_event_mask(EventMask::STRUCTURE_NOTIFY | EventMask::KEY_PRESS),
            xlib::StructureNotifyMask | xlib::KeyPressMask
        );
        assert_eq!(
            xlib_event_mask(EventMask::SUBSTRUCTURE_NOTIFY | EventMask::SUBSTRUCTURE_REDIRECT),
            xlib::SubstructureNotifyMask | xlib::SubstructureRedirectMask
        );
    }
}
