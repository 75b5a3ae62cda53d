// src/platform/mod.rs
//
// Window-system backends behind the `DisplayBackend` trait.

pub mod backends;

pub use backends::x11::XlibBackend;
pub use backends::{BackendEvent, DisplayBackend};
