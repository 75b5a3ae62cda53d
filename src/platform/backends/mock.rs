// src/platform/backends/mock.rs

//! In-memory backend that records every request, for tests.

use super::{
    Atom, BackendEvent, ClientMessage, DisplayBackend, EventMask, GcId, Pixel, PixmapId,
    WindowId,
};
use crate::geometry::{Geometry, ScreenInfo};
use crate::window::WindowError;
use anyhow::{anyhow, Result};
use std::cell::RefCell;
use std::collections::{BTreeSet, HashMap, VecDeque};
use std::rc::Rc;

pub const MOCK_BLACK: Pixel = 0x000000;

/// Everything the mock has been asked to do. Shared through `Rc` so a test
/// can still inspect it after the window (and the backend) is dropped.
#[derive(Debug, Default)]
pub struct MockState {
    pub screen: Option<ScreenInfo>,
    pub fail_color: bool,
    pub fail_window: bool,
    pub fail_class_hint: bool,
    pub fail_send: bool,
    next_id: u64,

    pub created_windows: Vec<(WindowId, Geometry)>,
    pub destroyed_windows: Vec<WindowId>,
    pub selected_inputs: Vec<(WindowId, EventMask)>,
    pub mapped: Vec<WindowId>,
    pub flushes: usize,

    pub live_gcs: BTreeSet<usize>,
    pub gc_foreground: HashMap<usize, Pixel>,

    pub titles: Vec<(WindowId, String)>,
    pub class_hints: Vec<(WindowId, String, String)>,
    pub protocols: Vec<(WindowId, Vec<Atom>)>,
    pub atoms: HashMap<String, Atom>,
    pub sent: Vec<ClientMessage>,

    pub created_pixmaps: Vec<(PixmapId, u32, u32, u32)>,
    pub freed_pixmaps: Vec<PixmapId>,
    pub live_pixmaps: BTreeSet<PixmapId>,
    pub fills: Vec<(PixmapId, Pixel, u32, u32)>,
    pub backgrounds: Vec<(WindowId, PixmapId)>,
    pub cleared: Vec<WindowId>,

    pub events: VecDeque<BackendEvent>,
    pub disconnected: bool,
}

impl MockState {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        // Keep ids recognisable and away from 0 (None).
        0x100 + self.next_id
    }

    /// Name of an interned atom, for asserting on client messages.
    pub fn atom_name(&self, atom: Atom) -> Option<&str> {
        self.atoms
            .iter()
            .find(|(_, a)| **a == atom)
            .map(|(name, _)| name.as_str())
    }

    pub fn last_title(&self) -> Option<&str> {
        self.titles.last().map(|(_, t)| t.as_str())
    }
}

#[derive(Debug)]
pub struct MockBackend {
    state: Rc<RefCell<MockState>>,
}

impl MockBackend {
    pub fn new(screen_width: u32, screen_height: u32) -> Self {
        let state = MockState {
            screen: Some(ScreenInfo {
                number: 0,
                width: screen_width,
                height: screen_height,
                depth: 24,
            }),
            ..MockState::default()
        };
        Self {
            state: Rc::new(RefCell::new(state)),
        }
    }

    pub fn state(&self) -> Rc<RefCell<MockState>> {
        Rc::clone(&self.state)
    }

    pub fn push_event(&self, event: BackendEvent) {
        self.state.borrow_mut().events.push_back(event);
    }
}

/// Parses `#rrggbb`; any other name maps to a fixed grey so tests can tell
/// it apart from black.
fn mock_pixel(name: &str) -> Pixel {
    name.strip_prefix('#')
        .filter(|hex| hex.len() == 6)
        .and_then(|hex| u64::from_str_radix(hex, 16).ok())
        .unwrap_or(0x808080)
}

impl DisplayBackend for MockBackend {
    fn screen(&self) -> ScreenInfo {
        self.state
            .borrow()
            .screen
            .unwrap_or(ScreenInfo {
                number: 0,
                width: 1920,
                height: 1080,
                depth: 24,
            })
    }

    fn alloc_named_color(&mut self, name: &str) -> Result<Pixel> {
        if self.state.borrow().fail_color {
            return Err(WindowError::ColorAllocation(name.to_string()).into());
        }
        Ok(mock_pixel(name))
    }

    fn black_pixel(&self) -> Pixel {
        MOCK_BLACK
    }

    fn create_window(&mut self, geometry: &Geometry) -> Result<WindowId> {
        let mut st = self.state.borrow_mut();
        if st.fail_window {
            return Err(WindowError::WindowCreation.into());
        }
        let id = st.next_id();
        st.created_windows.push((id, *geometry));
        Ok(id)
    }

    fn select_input(&mut self, window: WindowId, mask: EventMask) {
        self.state.borrow_mut().selected_inputs.push((window, mask));
    }

    fn create_gc(&mut self, _window: WindowId) -> Result<GcId> {
        let mut st = self.state.borrow_mut();
        let id = st.next_id() as usize;
        st.live_gcs.insert(id);
        Ok(GcId(id))
    }

    fn free_gc(&mut self, gc: GcId) {
        self.state.borrow_mut().live_gcs.remove(&gc.0);
    }

    fn set_title(&mut self, window: WindowId, title: &str) -> Result<()> {
        if title.contains('\0') {
            return Err(WindowError::InvalidTitle.into());
        }
        self.state
            .borrow_mut()
            .titles
            .push((window, title.to_string()));
        Ok(())
    }

    fn set_class_hint(&mut self, window: WindowId, res_name: &str, res_class: &str) -> Result<()> {
        let mut st = self.state.borrow_mut();
        if st.fail_class_hint {
            return Err(anyhow!("mock: class hint allocation failed"));
        }
        st.class_hints
            .push((window, res_name.to_string(), res_class.to_string()));
        Ok(())
    }

    fn intern_atom(&mut self, name: &str) -> Result<Atom> {
        let mut st = self.state.borrow_mut();
        if let Some(&atom) = st.atoms.get(name) {
            return Ok(atom);
        }
        let atom = st.next_id();
        st.atoms.insert(name.to_string(), atom);
        Ok(atom)
    }

    fn set_wm_protocols(&mut self, window: WindowId, protocols: &[Atom]) -> Result<()> {
        self.state
            .borrow_mut()
            .protocols
            .push((window, protocols.to_vec()));
        Ok(())
    }

    fn map_window(&mut self, window: WindowId) {
        self.state.borrow_mut().mapped.push(window);
    }

    fn flush(&mut self) {
        self.state.borrow_mut().flushes += 1;
    }

    fn send_to_root(&mut self, message: &ClientMessage) -> Result<()> {
        let mut st = self.state.borrow_mut();
        if st.fail_send {
            return Err(anyhow!("mock: XSendEvent failed"));
        }
        st.sent.push(*message);
        Ok(())
    }

    fn create_pixmap(
        &mut self,
        _window: WindowId,
        width: u32,
        height: u32,
        depth: u32,
    ) -> Result<PixmapId> {
        let mut st = self.state.borrow_mut();
        let id = st.next_id();
        st.created_pixmaps.push((id, width, height, depth));
        st.live_pixmaps.insert(id);
        Ok(id)
    }

    fn free_pixmap(&mut self, pixmap: PixmapId) {
        let mut st = self.state.borrow_mut();
        st.freed_pixmaps.push(pixmap);
        st.live_pixmaps.remove(&pixmap);
    }

    fn set_foreground(&mut self, gc: GcId, pixel: Pixel) {
        self.state.borrow_mut().gc_foreground.insert(gc.0, pixel);
    }

    fn fill_rectangle(&mut self, pixmap: PixmapId, gc: GcId, width: u32, height: u32) {
        let mut st = self.state.borrow_mut();
        let fg = st.gc_foreground.get(&gc.0).copied().unwrap_or(MOCK_BLACK);
        st.fills.push((pixmap, fg, width, height));
    }

    fn set_background_pixmap(&mut self, window: WindowId, pixmap: PixmapId) {
        self.state.borrow_mut().backgrounds.push((window, pixmap));
    }

    fn clear_window(&mut self, window: WindowId) {
        self.state.borrow_mut().cleared.push(window);
    }

    fn destroy_window(&mut self, window: WindowId) {
        self.state.borrow_mut().destroyed_windows.push(window);
    }

    fn next_event(&mut self) -> Result<BackendEvent> {
        self.state
            .borrow_mut()
            .events
            .pop_front()
            .ok_or_else(|| anyhow!("mock: event queue exhausted"))
    }

    fn disconnect(&mut self) {
        self.state.borrow_mut().disconnected = true;
    }
}
