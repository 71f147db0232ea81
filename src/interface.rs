//! Register access over I2C or SPI.

use embedded_hal::{
    i2c,
    spi::{self, Operation},
};

/// I2C address of the sensor, selected by the SDO pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Address {
    /// SDO tied to GND.
    #[default]
    Primary,
    /// SDO tied to VDDIO.
    Secondary,
    Custom(u8),
}

impl From<Address> for u8 {
    fn from(address: Address) -> Self {
        match address {
            Address::Primary => 0x76,
            Address::Secondary => 0x77,
            Address::Custom(addr) => addr,
        }
    }
}

/// Byte-addressed register access to the sensor.
pub trait Interface {
    type Error;

    /// Reads `buf.len()` consecutive registers starting at `reg`.
    ///
    /// Returns the number of bytes actually transferred. Anything short of
    /// `buf.len()` is treated as a failed read by the driver.
    fn read_register(&mut self, reg: u8, buf: &mut [u8]) -> Result<usize, Self::Error>;

    /// Writes a single register.
    fn write_register(&mut self, reg: u8, value: u8) -> Result<(), Self::Error>;
}

/// I2C transport.
#[derive(Debug)]
pub struct I2cInterface<I2C> {
    i2c: I2C,
    address: u8,
}

impl<I2C> I2cInterface<I2C>
where
    I2C: i2c::I2c,
{
    pub fn new(i2c: I2C, address: Address) -> Self {
        Self {
            i2c,
            address: address.into(),
        }
    }

    /// Releases the I2C bus.
    pub fn release(self) -> I2C {
        self.i2c
    }
}

impl<I2C> Interface for I2cInterface<I2C>
where
    I2C: i2c::I2c,
{
    type Error = I2C::Error;

    fn read_register(&mut self, reg: u8, buf: &mut [u8]) -> Result<usize, Self::Error> {
        self.i2c.write_read(self.address, &[reg], buf)?;
        Ok(buf.len())
    }

    fn write_register(&mut self, reg: u8, value: u8) -> Result<(), Self::Error> {
        self.i2c.write(self.address, &[reg, value])
    }
}

/// 4-wire SPI transport.
///
/// Bit 7 of the register address selects read (1) or write (0).
#[derive(Debug)]
pub struct SpiInterface<SPI> {
    spi: SPI,
}

const SPI_READ: u8 = 0x80;

impl<SPI> SpiInterface<SPI>
where
    SPI: spi::SpiDevice,
{
    pub fn new(spi: SPI) -> Self {
        Self { spi }
    }

    /// Releases the SPI device.
    pub fn release(self) -> SPI {
        self.spi
    }
}

impl<SPI> Interface for SpiInterface<SPI>
where
    SPI: spi::SpiDevice,
{
    type Error = SPI::Error;

    fn read_register(&mut self, reg: u8, buf: &mut [u8]) -> Result<usize, Self::Error> {
        self.spi
            .transaction(&mut [Operation::Write(&[reg | SPI_READ]), Operation::Read(buf)])?;
        Ok(buf.len())
    }

    fn write_register(&mut self, reg: u8, value: u8) -> Result<(), Self::Error> {
        self.spi.write(&[reg & !SPI_READ, value])
    }
}
