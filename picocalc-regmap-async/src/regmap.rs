//! The register transport trait and its I2C implementation.

use embedded_hal_async::i2c::{I2c, SevenBitAddress};

use crate::regs::WRITE_MASK;

/// Register-addressed transport to the keyboard microcontroller.
///
/// Addresses and values are 8 bits wide. Callers treat each operation as
/// atomic and non-reentrant; an implementation that is shared between
/// drivers must serialize concurrent callers itself (see
/// [`crate::shared::SharedRegisterMap`]).
#[allow(async_fn_in_trait)]
pub trait RegisterMap {
    type Error: core::fmt::Debug;

    /// Reads a single register.
    async fn read_u8(&mut self, reg: u8) -> Result<u8, Self::Error>;

    /// Reads two bytes from `reg` in one bus transaction.
    async fn read_pair(&mut self, reg: u8) -> Result<[u8; 2], Self::Error>;

    /// Writes a single register.
    async fn write_u8(&mut self, reg: u8, value: u8) -> Result<(), Self::Error>;
}

/// [`RegisterMap`] over an `embedded-hal-async` I2C bus.
///
/// Applies the microcontroller's wire convention: a write is addressed
/// with the most significant bit of the register byte set, a read with
/// the register byte unmodified.
pub struct I2cRegisterMap<
    I2cType: I2c<SevenBitAddress, Error = ErrorType>,
    ErrorType: embedded_hal_async::i2c::Error,
> {
    i2c: I2cType,
    address: u8,
}

impl<
        I2cType: I2c<SevenBitAddress, Error = ErrorType>,
        ErrorType: embedded_hal_async::i2c::Error,
    > I2cRegisterMap<I2cType, ErrorType>
{
    /// Creates a new `I2cRegisterMap`.
    ///
    /// # Arguments
    ///
    /// * `i2c` - An I2C peripheral that implements `embedded-hal-async::i2c::I2c`.
    /// * `address` - The device address, [`crate::regs::DEFAULT_ADDRESS`] on
    ///   stock hardware.
    pub fn new(i2c: I2cType, address: u8) -> Self {
        Self { i2c, address }
    }
}

impl<
        I2cType: I2c<SevenBitAddress, Error = ErrorType>,
        ErrorType: embedded_hal_async::i2c::Error,
    > RegisterMap for I2cRegisterMap<I2cType, ErrorType>
{
    type Error = ErrorType;

    async fn read_u8(&mut self, reg: u8) -> Result<u8, Self::Error> {
        let mut buf = [0u8; 1];
        self.i2c.write_read(self.address, &[reg], &mut buf).await?;
        Ok(buf[0])
    }

    async fn read_pair(&mut self, reg: u8) -> Result<[u8; 2], Self::Error> {
        let mut buf = [0u8; 2];
        self.i2c.write_read(self.address, &[reg], &mut buf).await?;
        Ok(buf)
    }

    async fn write_u8(&mut self, reg: u8, value: u8) -> Result<(), Self::Error> {
        self.i2c.write(self.address, &[reg | WRITE_MASK, value]).await
    }
}
