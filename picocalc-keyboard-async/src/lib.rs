//! An asynchronous, `no_std` event decoder for the PicoCalc's I2C
//! keyboard.
//!
//! The PicoCalc's keyboard matrix is scanned by a separate
//! microcontroller that queues key transitions in a FIFO register. This
//! crate polls that queue at a fixed cadence (128 Hz on the stock
//! device) and maps raw firmware scancodes to logical keys. While mouse
//! mode is active (toggled with right shift), the arrow and bracket keys
//! are reinterpreted as relative pointer motion and buttons, with a
//! time-based velocity ramp.
//!
//! The driver is written against two seams: the register transport
//! ([`picocalc_regmap_async::regmap::RegisterMap`]) and the host event
//! sink ([`sink::EventSink`]). Anything implementing those two can drive
//! it, which is also how the test suite runs without hardware.
//!
//! # Usage
//!
//! ```no_run
//! use picocalc_keyboard_async::config::KeyboardConfig;
//! use picocalc_keyboard_async::keyboard::KeyboardController;
//! use picocalc_keyboard_async::keymap::KeyCode;
//! use picocalc_keyboard_async::sink::{EventSink, PointerButton};
//! use picocalc_regmap_async::regmap::I2cRegisterMap;
//! use picocalc_regmap_async::regs;
//!
//! struct LogSink;
//!
//! impl EventSink for LogSink {
//!     fn key(&mut self, code: KeyCode, pressed: bool) {
//!         log::info!("key {code:?} {}", if pressed { "down" } else { "up" });
//!     }
//!     fn scancode(&mut self, _scancode: u8) {}
//!     fn relative_motion(&mut self, dx: i32, dy: i32) {
//!         log::info!("pointer moved by ({dx}, {dy})");
//!     }
//!     fn button(&mut self, button: PointerButton, pressed: bool) {
//!         log::info!("button {button:?} {}", if pressed { "down" } else { "up" });
//!     }
//!     fn sync(&mut self) {}
//! }
//!
//! // Spawn this from the executor with the board's keyboard I2C bus.
//! async fn keyboard_task<I2C>(i2c: I2C) -> !
//! where
//!     I2C: embedded_hal_async::i2c::I2c,
//! {
//!     let regmap = I2cRegisterMap::new(i2c, regs::DEFAULT_ADDRESS);
//!     KeyboardController::new(regmap, LogSink, KeyboardConfig::default())
//!         .run()
//!         .await
//! }
//! ```

#![no_std]

pub mod config;
pub mod event;
pub mod keyboard;
pub mod keymap;
pub mod sink;
