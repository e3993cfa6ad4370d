//! Wire format of the key-event queue.

/// Key life-cycle state reported in the first byte of a queue slot.
///
/// The values come from the keyboard firmware. Only `Pressed`, `Hold` and
/// `Released` produce output; an `Idle` first byte marks an empty slot and
/// ends a drain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyState {
    Idle = 0,
    Pressed = 1,
    Hold = 2,
    Released = 3,
    LongHold = 4,
}

impl KeyState {
    /// Decodes a wire state byte.
    ///
    /// Bytes outside the five defined states come from firmware this
    /// driver does not know about and yield `None`; the wire format cannot
    /// be renegotiated, so such slots are dropped rather than treated as
    /// an error.
    pub const fn from_wire(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(Self::Idle),
            1 => Some(Self::Pressed),
            2 => Some(Self::Hold),
            3 => Some(Self::Released),
            4 => Some(Self::LongHold),
            _ => None,
        }
    }
}

/// One slot drained from the key-event queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawEvent {
    /// Life-cycle state of the key.
    pub state: KeyState,
    /// Raw firmware scancode, not a host keycode.
    pub scancode: u8,
}
