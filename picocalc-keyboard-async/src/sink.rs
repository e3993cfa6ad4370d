//! Where decoded events are reported.

use crate::keymap::KeyCode;

/// Pointer buttons reported while mouse mode is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Left,
    Right,
}

/// Host-side event sink.
///
/// Mirrors the shape of the host input layer: discrete key transitions, a
/// raw-scancode notification for diagnostic and macro layers, relative
/// two-axis pointer motion, and pointer buttons. The decoder follows all
/// notifications of one poll cycle with exactly one [`EventSink::sync`].
pub trait EventSink {
    /// A key went down (`pressed`) or up.
    fn key(&mut self, code: KeyCode, pressed: bool);

    /// A mapped scancode was observed, before key dispatch.
    fn scancode(&mut self, scancode: u8);

    /// Relative pointer motion along one or both axes.
    fn relative_motion(&mut self, dx: i32, dy: i32);

    /// A pointer button went down (`pressed`) or up.
    fn button(&mut self, button: PointerButton, pressed: bool);

    /// Ends the current poll cycle's batch.
    fn sync(&mut self);
}
