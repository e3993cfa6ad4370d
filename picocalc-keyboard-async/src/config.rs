//! Startup configuration of the decoder.
//!
//! `Default` reproduces the behavior of the stock device exactly; every
//! tunable the stock driver stack hardcodes is a field here.

use embassy_time::Duration;

/// Scancodes reinterpreted while mouse mode is active.
#[derive(Debug, Clone, Copy)]
pub struct MouseKeys {
    pub up: u8,
    pub down: u8,
    pub left: u8,
    pub right: u8,
    /// Scancode acting as the left pointer button.
    pub left_button: u8,
    /// Scancode acting as the right pointer button.
    pub right_button: u8,
}

impl Default for MouseKeys {
    fn default() -> Self {
        // The bracket-to-button assignment is crossed on the stock
        // device: ']' is the left button, '[' the right one.
        Self {
            up: 0xB5,
            down: 0xB6,
            left: 0xB4,
            right: 0xB7,
            left_button: b']',
            right_button: b'[',
        }
    }
}

/// Time-based acceleration of the emulated pointer.
///
/// While a press run is at most `threshold` old, each poll cycle moves
/// the pointer by `step_slow` per held direction; up to three times the
/// threshold, by `step_mid`; beyond that, by `step_fast`.
#[derive(Debug, Clone, Copy)]
pub struct VelocityRamp {
    pub threshold: Duration,
    pub step_slow: u8,
    pub step_mid: u8,
    pub step_fast: u8,
}

impl Default for VelocityRamp {
    fn default() -> Self {
        Self {
            threshold: Duration::from_millis(150),
            step_slow: 1,
            step_mid: 2,
            step_fast: 4,
        }
    }
}

impl VelocityRamp {
    /// Step size for a press run of age `elapsed`.
    pub fn step(&self, elapsed: Duration) -> i32 {
        if elapsed <= self.threshold {
            self.step_slow as i32
        } else if elapsed <= self.threshold * 3 {
            self.step_mid as i32
        } else {
            self.step_fast as i32
        }
    }
}

/// Startup configuration of the keyboard decoder.
#[derive(Debug, Clone, Copy)]
pub struct KeyboardConfig {
    /// Scancode whose `Pressed` edge toggles mouse mode (right shift on
    /// the stock firmware). Always consumed, in either mode.
    pub toggle_scancode: u8,
    pub mouse_keys: MouseKeys,
    pub ramp: VelocityRamp,
    /// Cadence of the poll task.
    pub poll_period: Duration,
}

impl Default for KeyboardConfig {
    fn default() -> Self {
        Self {
            toggle_scancode: 0xA3,
            mouse_keys: MouseKeys::default(),
            ramp: VelocityRamp::default(),
            poll_period: Duration::from_hz(128),
        }
    }
}
