// src/keys.rs

use bitflags::bitflags;
use log::trace;
use serde::{Deserialize, Serialize};

use crate::config::{KeyCombination, KeybindingsConfig};

bitflags! {
    /// Represents a keyboard modifier.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct Modifiers: u8 {
        const SHIFT = 1 << 0;
        const CONTROL = 1 << 1;
        const ALT = 1 << 2;
        const SUPER = 1 << 3;
    }
}

/// A key symbol as reported by the backend.
///
/// Printable keys arrive as `Char`; the few named keys the viewer binds by
/// default get their own variants and everything else is carried as the raw
/// keysym.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum KeySymbol {
    Char(char),
    Escape,
    Return,
    F11,
    Other(u32),
    #[default]
    Unknown,
}

/// A single key press delivered to the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyPress {
    pub symbol: KeySymbol,
    pub modifiers: Modifiers,
}

/// Something a key binding can ask the viewer to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    ToggleFullscreen,
    Quit,
}

fn matches(bindings: &[KeyCombination], key: &KeyPress) -> bool {
    bindings
        .iter()
        .any(|b| b.symbol == key.symbol && b.modifiers == key.modifiers)
}

/// Maps a key press to an action using the configured bindings.
///
/// Quit bindings are checked first, so a key bound to both quits.
pub fn action_for(key: &KeyPress, bindings: &KeybindingsConfig) -> Option<Action> {
    let action = if matches(&bindings.quit, key) {
        Some(Action::Quit)
    } else if matches(&bindings.toggle_fullscreen, key) {
        Some(Action::ToggleFullscreen)
    } else {
        None
    };
    trace!("Key {:?} mapped to {:?}", key, action);
    action
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    fn press(symbol: KeySymbol) -> KeyPress {
        KeyPress {
            symbol,
            modifiers: Modifiers::empty(),
        }
    }

    #[test]
    fn default_bindings() {
        let bindings = KeybindingsConfig::default();
        assert_eq!(
            action_for(&press(KeySymbol::Char('f')), &bindings),
            Some(Action::ToggleFullscreen)
        );
        assert_eq!(
            action_for(&press(KeySymbol::F11), &bindings),
            Some(Action::ToggleFullscreen)
        );
        assert_eq!(
            action_for(&press(KeySymbol::Char('q')), &bindings),
            Some(Action::Quit)
        );
        assert_eq!(
            action_for(&press(KeySymbol::Escape), &bindings),
            Some(Action::Quit)
        );
        assert_eq!(action_for(&press(KeySymbol::Char('x')), &bindings), None);
    }

    #[test]
    fn modifiers_must_match_exactly() {
        let bindings = KeybindingsConfig::default();
        let ctrl_f = KeyPress {
            symbol: KeySymbol::Char('f'),
            modifiers: Modifiers::CONTROL,
        };
        assert_eq!(action_for(&ctrl_f, &bindings), None);
    }

    #[test]
    fn quit_wins_over_fullscreen() {
        let combo = KeyCombination {
            symbol: KeySymbol::Return,
            modifiers: Modifiers::empty(),
        };
        let bindings = KeybindingsConfig {
            quit: vec![combo.clone()],
            toggle_fullscreen: vec![combo],
        };
        assert_eq!(
            action_for(&press(KeySymbol::Return), &bindings),
            Some(Action::Quit)
        );
    }

    #[test]
    fn empty_bindings_map_nothing() {
        let bindings = KeybindingsConfig {
            quit: Vec::new(),
            toggle_fullscreen: Vec::new(),
        };
        assert_eq!(action_for(&press(KeySymbol::Char('q')), &bindings), None);
    }
}
