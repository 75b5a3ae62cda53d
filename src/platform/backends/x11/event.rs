// src/platform/backends/x11/event.rs
#![allow(non_snake_case)] // Allow non-snake case for X11 types

use super::connection::Connection;
use crate::keys::{KeyPress, KeySymbol, Modifiers};
use crate::platform::backends::{Atom, BackendEvent, ClientMessage, ConfigureEvent, WindowId};

use log::trace;
use std::mem;
use std::ptr;

use libc::{c_char, c_int, c_uint};
use x11::{keysym, xlib};

/// Buffer size for text obtained from `XLookupString`.
const KEY_TEXT_BUFFER_SIZE: usize = 32;

/// Blocks in `XNextEvent` and translates the result.
pub(super) fn next_event(connection: &Connection) -> BackendEvent {
    // SAFETY: zeroed XEvent is a valid out-parameter; the display is open.
    let mut xevent: xlib::XEvent = unsafe { mem::zeroed() };
    unsafe { xlib::XNextEvent(connection.display(), &mut xevent) };
    translate(&mut xevent)
}

fn translate(xevent: &mut xlib::XEvent) -> BackendEvent {
    let event_type = xevent.get_type();
    match event_type {
        xlib::ConfigureNotify => {
            // SAFETY: the type tag says this union holds an XConfigureEvent.
            let ev = unsafe { xevent.configure };
            trace!(
                "XEvent: ConfigureNotify {}x{}+{}+{} bw {} on window {}",
                ev.width, ev.height, ev.x, ev.y, ev.border_width, ev.window
            );
            BackendEvent::Configure(ConfigureEvent {
                window: ev.window as WindowId,
                x: ev.x,
                y: ev.y,
                width: ev.width.max(0) as u32,
                height: ev.height.max(0) as u32,
                border_width: ev.border_width.max(0) as u32,
            })
        }
        xlib::KeyPress => {
            // SAFETY: the type tag says this union holds an XKeyEvent.
            let key_event = unsafe { &mut xevent.key };
            let mut x_keysym: xlib::KeySym = 0;
            let mut key_text_buffer = [0u8; KEY_TEXT_BUFFER_SIZE];
            // SAFETY: buffer and keysym pointers are valid for the call; no
            // compose status is requested.
            let count = unsafe {
                xlib::XLookupString(
                    key_event,
                    key_text_buffer.as_mut_ptr() as *mut c_char,
                    key_text_buffer.len() as c_int,
                    &mut x_keysym,
                    ptr::null_mut(),
                )
            };
            let text = if count > 0 {
                String::from_utf8_lossy(&key_text_buffer[..count as usize]).into_owned()
            } else {
                String::new()
            };
            let key = KeyPress {
                symbol: keysym_to_symbol(x_keysym, &text),
                modifiers: modifiers_from_state(key_event.state),
            };
            trace!(
                "XEvent: KeyPress (keysym: {:X}, text: '{}') -> {:?} on window {}",
                x_keysym,
                text,
                key,
                key_event.window
            );
            BackendEvent::Key {
                window: key_event.window as WindowId,
                key,
            }
        }
        xlib::ClientMessage => {
            // SAFETY: the type tag says this union holds an XClientMessageEvent.
            let cm = unsafe { xevent.client_message };
            let mut data = [0i64; 5];
            for (i, slot) in data.iter_mut().enumerate() {
                *slot = cm.data.get_long(i) as i64;
            }
            trace!(
                "XEvent: ClientMessage type {} on window {}",
                cm.message_type,
                cm.window
            );
            BackendEvent::ClientMessage(ClientMessage {
                window: cm.window as WindowId,
                message_type: cm.message_type as Atom,
                data,
            })
        }
        other => {
            trace!("XEvent: unhandled type {}", other);
            BackendEvent::Other { event_type: other }
        }
    }
}

fn modifiers_from_state(state: c_uint) -> Modifiers {
    let mut modifiers = Modifiers::empty();
    if (state & xlib::ShiftMask) != 0 {
        modifiers.insert(Modifiers::SHIFT);
    }
    if (state & xlib::ControlMask) != 0 {
        modifiers.insert(Modifiers::CONTROL);
    }
    if (state & xlib::Mod1Mask) != 0 {
        modifiers.insert(Modifiers::ALT);
    }
    if (state & xlib::Mod4Mask) != 0 {
        modifiers.insert(Modifiers::SUPER);
    }
    modifiers
}

/// Maps a keysym and its `XLookupString` text to a `KeySymbol`.
///
/// Named keys are matched on the keysym first, because `XLookupString`
/// also yields control characters for Escape and Return.
fn keysym_to_symbol(keysym_val: xlib::KeySym, text: &str) -> KeySymbol {
    if keysym_val <= u32::MAX as xlib::KeySym {
        match keysym_val as u32 {
            keysym::XK_Escape => return KeySymbol::Escape,
            keysym::XK_Return | keysym::XK_KP_Enter => return KeySymbol::Return,
            keysym::XK_F11 => return KeySymbol::F11,
            _ => {}
        }
    }

    let mut chars = text.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        if c != '\u{FFFD}' && !c.is_control() {
            return KeySymbol::Char(c);
        }
    }

    match u32::try_from(keysym_val) {
        Ok(0) => KeySymbol::Unknown,
        Ok(raw) => KeySymbol::Other(raw),
        Err(_) => KeySymbol::Unknown,
    }
}
