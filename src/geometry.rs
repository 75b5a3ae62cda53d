// src/geometry.rs

//! Screen and window geometry shared by the window layer and the backends.

use serde::{Deserialize, Serialize};

/// Properties of the default screen, discovered once when the display
/// connection is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreenInfo {
    /// Screen number on the display (usually 0).
    pub number: i32,
    /// Screen width in pixels.
    pub width: u32,
    /// Screen height in pixels.
    pub height: u32,
    /// Default colour depth in bits per pixel.
    pub depth: u32,
}

/// Position and size of a top-level window, in root window coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Geometry {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
    pub border_width: u32,
}

impl Geometry {
    /// Computes the initial geometry for a window of the requested size.
    ///
    /// The size is clamped to the screen and the window is centred on it.
    /// Zero-sized requests are raised to one pixel, since X rejects
    /// zero-sized windows.
    pub fn centered(screen: &ScreenInfo, requested_width: u32, requested_height: u32) -> Self {
        // The 1px floor wins over the screen bound on a 0x0 screen.
        let width = requested_width.clamp(1, screen.width.max(1));
        let height = requested_height.clamp(1, screen.height.max(1));
        Geometry {
            x: (screen.width.saturating_sub(width) / 2) as i32,
            y: (screen.height.saturating_sub(height) / 2) as i32,
            width,
            height,
            border_width: 0,
        }
    }

    /// Returns true if `other` has a different width or height.
    #[inline]
    pub fn size_differs(&self, other: &Geometry) -> bool {
        self.width != other.width || self.height != other.height
    }
}
