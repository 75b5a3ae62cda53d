// src/platform/backends/x11/graphics.rs
#![allow(non_snake_case)] // Allow non-snake case for X11 types

use super::connection::Connection;
use crate::platform::backends::{PixmapId, Pixel, WindowId};
use crate::window::WindowError;

use anyhow::{anyhow, Context, Result};
use log::{debug, trace, warn};
use std::ffi::CString;
use std::mem;
use std::ptr;

use libc::{c_int, c_uint};
use x11::xlib;

// --- RAII Wrappers for X11 Resources ---

/// Wraps an X11 `GC` (Graphics Context) to ensure it's freed via `XFreeGC` on drop.
///
/// A `SafeGc` must be dropped before the display it was created on is
/// closed; `XlibBackend` drops its GCs in `disconnect` for that reason.
#[derive(Debug)]
pub(super) struct SafeGc {
    gc: xlib::GC,
    display: *mut xlib::Display,
}

impl SafeGc {
    /// Creates a graphics context with default values for `drawable`.
    pub(super) fn create(connection: &Connection, drawable: WindowId) -> Result<Self> {
        let display = connection.display();
        // SAFETY: the display is open and `drawable` is a window on it.
        let gc = unsafe { xlib::XCreateGC(display, drawable as xlib::Drawable, 0, ptr::null_mut()) };
        if gc.is_null() {
            return Err(anyhow!("XCreateGC failed for drawable {}", drawable));
        }
        trace!("Created GC {:p} for drawable {}", gc, drawable);
        Ok(Self { gc, display })
    }

    #[inline]
    pub(super) fn raw(&self) -> xlib::GC {
        self.gc
    }

    /// Sets the foreground pixel used by fill requests.
    pub(super) fn set_foreground(&self, pixel: Pixel) {
        // SAFETY: `gc` and `display` are valid while self is alive.
        unsafe {
            let mut values: xlib::XGCValues = mem::zeroed();
            values.foreground = pixel as libc::c_ulong;
            xlib::XChangeGC(self.display, self.gc, xlib::GCForeground as libc::c_ulong, &mut values);
        }
    }
}

impl Drop for SafeGc {
    fn drop(&mut self) {
        if self.gc.is_null() {
            return;
        }
        if self.display.is_null() {
            warn!(
                "SafeGc::drop called with a null display pointer. Cannot free GC: {:p}.",
                self.gc
            );
            return;
        }
        trace!("Freeing GC via SafeGc drop: {:p}", self.gc);
        unsafe { xlib::XFreeGC(self.display, self.gc) };
        self.gc = ptr::null_mut();
    }
}

// --- Colours ---

/// Allocates a named colour in the default colormap.
///
/// # Errors
///
/// `WindowError::ColorAllocation` if the server does not know the name or
/// the colormap is full.
pub(super) fn alloc_named_color(connection: &Connection, name: &str) -> Result<Pixel> {
    let name_c = CString::new(name).context("Colour name contains an interior NUL byte")?;
    // SAFETY: zeroed XColor is a valid out-parameter; the display is open.
    let (status, color) = unsafe {
        let mut screen_def: xlib::XColor = mem::zeroed();
        let mut exact_def: xlib::XColor = mem::zeroed();
        let status = xlib::XAllocNamedColor(
            connection.display(),
            connection.colormap(),
            name_c.as_ptr(),
            &mut screen_def,
            &mut exact_def,
        );
        (status, screen_def)
    };
    if status == 0 {
        return Err(WindowError::ColorAllocation(name.to_string()).into());
    }
    debug!("Allocated colour '{}' as pixel 0x{:06x}", name, color.pixel);
    Ok(color.pixel as Pixel)
}

pub(super) fn black_pixel(connection: &Connection) -> Pixel {
    // SAFETY: the display is open.
    unsafe { xlib::XBlackPixel(connection.display(), connection.screen_number()) as Pixel }
}

// --- Pixmaps ---

pub(super) fn create_pixmap(
    connection: &Connection,
    window: WindowId,
    width: u32,
    height: u32,
    depth: u32,
) -> Result<PixmapId> {
    // SAFETY: the display is open and `window` is a drawable on it.
    let pixmap = unsafe {
        xlib::XCreatePixmap(
            connection.display(),
            window as xlib::Drawable,
            width as c_uint,
            height as c_uint,
            depth as c_uint,
        )
    };
    if pixmap == 0 {
        return Err(WindowError::PixmapCreation { width, height }.into());
    }
    trace!("Created pixmap {} ({}x{}, depth {})", pixmap, width, height, depth);
    Ok(pixmap as PixmapId)
}

pub(super) fn free_pixmap(connection: &Connection, pixmap: PixmapId) {
    trace!("Freeing pixmap {}", pixmap);
    // SAFETY: the display is open and `pixmap` was created on it.
    unsafe { xlib::XFreePixmap(connection.display(), pixmap as xlib::Pixmap) };
}

/// Fills a `width` x `height` rectangle at the origin of `pixmap`.
pub(super) fn fill_rectangle(
    connection: &Connection,
    pixmap: PixmapId,
    gc: &SafeGc,
    width: u32,
    height: u32,
) {
    // SAFETY: the display is open; `pixmap` and `gc` belong to it.
    unsafe {
        xlib::XFillRectangle(
            connection.display(),
            pixmap as xlib::Drawable,
            gc.raw(),
            0 as c_int,
            0 as c_int,
            width as c_uint,
            height as c_uint,
        );
    }
}
