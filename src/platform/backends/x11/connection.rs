// src/platform/backends/x11/connection.rs
#![allow(non_snake_case)] // Allow non-snake case for X11 types

use crate::geometry::ScreenInfo;
use crate::window::WindowError;

use anyhow::{anyhow, Result};
use log::{debug, info, warn};
use std::ffi::CString;
use std::ptr;

// X11 library imports
use libc::c_int;
use x11::xlib;

/// Owns an X11 Display pointer and closes it on drop.
#[derive(Debug)]
struct ManagedDisplay {
    ptr: *mut xlib::Display,
}

impl ManagedDisplay {
    /// Opens a connection to `name`, or to `$DISPLAY` when `name` is `None`.
    fn open(name: Option<&str>) -> Result<Self> {
        let name_c = name
            .map(CString::new)
            .transpose()
            .map_err(|_| anyhow!("Display name contains an interior NUL byte"))?;
        let name_ptr = name_c.as_ref().map_or(ptr::null(), |c| c.as_ptr());

        // SAFETY: `name_ptr` is null or points into `name_c`, which outlives the call.
        let display_ptr = unsafe { xlib::XOpenDisplay(name_ptr) };
        if display_ptr.is_null() {
            return Err(WindowError::DisplayUnavailable {
                name: name.map(str::to_string),
            }
            .into());
        }
        debug!("X display opened: {:p}", display_ptr);
        Ok(Self { ptr: display_ptr })
    }

    #[inline]
    fn raw(&self) -> *mut xlib::Display {
        self.ptr
    }

    /// Closes the display if it is still open. Idempotent.
    fn close(&mut self) {
        if self.ptr.is_null() {
            return;
        }
        info!("Closing X11 display connection: {:p}", self.ptr);
        // SAFETY: `ptr` came from XOpenDisplay and has not been closed yet.
        let status = unsafe { xlib::XCloseDisplay(self.ptr) };
        if status != 0 {
            warn!(
                "XCloseDisplay returned non-zero status: {}. Display may not have closed cleanly.",
                status
            );
        }
        self.ptr = ptr::null_mut();
    }
}

impl Drop for ManagedDisplay {
    fn drop(&mut self) {
        self.close();
    }
}

/// The display environment: connection plus the default screen's
/// number, size, depth, visual and colormap.
///
/// Everything is discovered once at connection time.
#[derive(Debug)]
pub struct Connection {
    managed_display: ManagedDisplay,
    screen: ScreenInfo,
    colormap: xlib::Colormap,
    visual: *mut xlib::Visual,
}

impl Connection {
    /// Establishes a connection to the X server.
    ///
    /// # Errors
    ///
    /// Returns `WindowError::DisplayUnavailable` if the display cannot be
    /// opened, and a plain error if the screen has no default visual.
    pub fn open(display_name: Option<&str>) -> Result<Self> {
        info!(
            "Establishing X11 server connection to {}.",
            display_name.unwrap_or("$DISPLAY")
        );
        let managed_display = ManagedDisplay::open(display_name)?;
        let display = managed_display.raw();

        // SAFETY: `display` is a valid, open display for all calls below.
        let (number, width, height, depth, colormap, visual) = unsafe {
            let number = xlib::XDefaultScreen(display);
            (
                number,
                xlib::XDisplayWidth(display, number),
                xlib::XDisplayHeight(display, number),
                xlib::XDefaultDepth(display, number),
                xlib::XDefaultColormap(display, number),
                xlib::XDefaultVisual(display, number),
            )
        };
        if visual.is_null() {
            // ManagedDisplay's Drop closes the display.
            return Err(anyhow!("Failed to get default visual for screen {}.", number));
        }

        let screen = ScreenInfo {
            number,
            width: width.max(0) as u32,
            height: height.max(0) as u32,
            depth: depth.max(0) as u32,
        };
        debug!(
            "Screen {}: {}x{}, depth {}, colormap {}, visual {:p}",
            screen.number, screen.width, screen.height, screen.depth, colormap, visual
        );

        info!("X11 server connection established successfully.");
        Ok(Connection {
            managed_display,
            screen,
            colormap,
            visual,
        })
    }

    /// Closes the connection. Later calls are no-ops.
    pub fn close(&mut self) {
        self.managed_display.close();
    }

    /// Returns true once `close` has run.
    #[inline]
    pub fn is_closed(&self) -> bool {
        self.managed_display.raw().is_null()
    }

    /// Returns the raw display pointer.
    ///
    /// The pointer is null after `close`; callers must check `is_closed`
    /// before handing it to Xlib.
    #[inline]
    pub fn display(&self) -> *mut xlib::Display {
        self.managed_display.raw()
    }

    #[inline]
    pub fn screen(&self) -> ScreenInfo {
        self.screen
    }

    #[inline]
    pub fn screen_number(&self) -> c_int {
        self.screen.number
    }

    #[inline]
    pub fn colormap(&self) -> xlib::Colormap {
        self.colormap
    }

    #[inline]
    pub fn visual(&self) -> *mut xlib::Visual {
        self.visual
    }

    /// Root window of the default screen.
    pub fn root_window(&self) -> xlib::Window {
        // SAFETY: only called while the display is open.
        unsafe { xlib::XRootWindow(self.display(), self.screen.number) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    fn closed_connection() -> Connection {
        Connection {
            managed_display: ManagedDisplay {
                ptr: ptr::null_mut(),
            },
            screen: ScreenInfo {
                number: 0,
                width: 0,
                height: 0,
                depth: 0,
            },
            colormap: 0,
            visual: ptr::null_mut(),
        }
    }

    #[test]
    fn close_on_closed_connection_is_noop() {
        let mut conn = closed_connection();
        assert!(conn.is_closed());
        conn.close();
        conn.close();
        assert!(conn.is_closed());
    }

    #[test]
    fn display_name_with_nul_is_rejected() {
        let err = Connection::open(Some("bad\0name")).unwrap_err();
        assert!(err.downcast_ref::<WindowError>().is_none());
        assert!(err.to_string().contains("NUL"));
    }
}
