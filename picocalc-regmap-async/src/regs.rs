//! Register address file of the keyboard microcontroller.
//!
//! One flat 8-bit register file serves every logical peripheral on the
//! MCU; the keyboard, backlight and battery drivers all share these
//! addresses.

/// Firmware type (official or custom firmware).
pub const REG_TYP: u8 = 0x00;
/// Firmware version.
pub const REG_VER: u8 = 0x01;
/// Configuration.
pub const REG_CFG: u8 = 0x02;
/// Interrupt status.
pub const REG_INT: u8 = 0x03;
/// Key status.
pub const REG_KEY: u8 = 0x04;
/// Display backlight.
pub const REG_BKL: u8 = 0x05;
/// Debounce configuration.
pub const REG_DEB: u8 = 0x06;
/// Matrix poll frequency configuration.
pub const REG_FRQ: u8 = 0x07;
/// Reset.
pub const REG_RST: u8 = 0x08;
/// Key-event FIFO.
pub const REG_FIF: u8 = 0x09;
/// Keyboard backlight.
pub const REG_BK2: u8 = 0x0A;
/// Battery level.
pub const REG_BAT: u8 = 0x0B;
/// C64 key matrix.
pub const REG_C64_MTX: u8 = 0x0C;
/// Joystick IO bits.
pub const REG_C64_JS: u8 = 0x0D;
/// Power off.
pub const REG_OFF: u8 = 0x0E;

/// The most significant bit of the address byte must be set when writing
/// a register and left clear when reading.
pub const WRITE_MASK: u8 = 1 << 7;

/// I2C address the keyboard microcontroller answers on.
pub const DEFAULT_ADDRESS: u8 = 0x1F;
