//! Asynchronous register-map transport for the PicoCalc keyboard
//! microcontroller.
//!
//! The PicoCalc's STM32 keyboard controller exposes one 8-bit register file
//! over I2C, shared by several logical peripherals (keyboard FIFO,
//! backlight, battery). This crate provides the [`regmap::RegisterMap`]
//! transport trait those drivers are written against, an
//! [`regmap::I2cRegisterMap`] implementation for any
//! `embedded-hal-async` I2C bus, and a [`shared::SharedRegisterMap`] for
//! handing the same register file to multiple sibling drivers.

#![no_std]

extern crate alloc;

pub mod regmap;
pub mod regs;
pub mod shared;
