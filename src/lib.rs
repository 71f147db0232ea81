#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

//! # BME280 / BMP280 Environmental Sensor Driver
//!
//! A `no_std` driver for the Bosch BME280 (temperature, pressure, humidity)
//! and its humidity-less sibling BMP280, on top of `embedded-hal` 1.0.
//!
//! ## Features
//! - **I2C and SPI**: both buses sit behind the [`Interface`] trait.
//! - **Bit-exact compensation**: the vendor fixed-point formulas, with the
//!   fine temperature passed explicitly from temperature to pressure and humidity.
//! - **Derived quantities**: altitude, sea-level pressure and dew point.
//! - **Optional logging** through `defmt` or `log`.
//!
//! ## Lifecycle
//! `Uninitialized → Identified → CalibrationLoaded → Configured → Ready`.
//! Any bus failure during bring-up reverts the driver to `Uninitialized`.
//!
//! ```ignore
//! let mut bme = Bme280::new_i2c(i2c, Address::Primary, Settings::default());
//! bme.initialize()?;
//! let reading = bme.read_all(TempUnit::Celsius, PresUnit::HPa)?;
//! let dew = derived::dew_point(reading.temperature, reading.humidity, TempUnit::Celsius);
//! ```

#[cfg(all(feature = "std", not(test)))]
extern crate std;

#[cfg(feature = "defmt")]
macro_rules! trace {
    ($($arg:tt)*) => { defmt::trace!($($arg)*) };
}

#[cfg(all(feature = "log", not(feature = "defmt")))]
macro_rules! trace {
    ($($arg:tt)*) => { log::trace!($($arg)*) };
}

#[cfg(not(any(feature = "log", feature = "defmt")))]
macro_rules! trace {
    ($($arg:tt)*) => {};
}

#[cfg(feature = "defmt")]
macro_rules! debug {
    ($($arg:tt)*) => { defmt::debug!($($arg)*) };
}

#[cfg(all(feature = "log", not(feature = "defmt")))]
macro_rules! debug {
    ($($arg:tt)*) => { log::debug!($($arg)*) };
}

#[cfg(not(any(feature = "log", feature = "defmt")))]
macro_rules! debug {
    ($($arg:tt)*) => {};
}

#[cfg(feature = "defmt")]
macro_rules! warn {
    ($($arg:tt)*) => { defmt::warn!($($arg)*) };
}

#[cfg(all(feature = "log", not(feature = "defmt")))]
macro_rules! warn {
    ($($arg:tt)*) => { log::warn!($($arg)*) };
}

#[cfg(not(any(feature = "log", feature = "defmt")))]
macro_rules! warn {
    ($($arg:tt)*) => {};
}

pub mod calc;
pub mod calib;
pub mod derived;
mod interface;
pub mod sample;
mod settings;
#[cfg(feature = "std")]
mod std_error;
pub mod units;

pub use calib::CalibrationTable;
pub use interface::{Address, I2cInterface, Interface, SpiInterface};
pub use sample::RawSample;
pub use settings::{layout, Filter, Mode, Oversampling, Settings, SettingsBuilder, Standby};
pub use units::{LengthUnit, PresUnit, TempUnit};

use calib::calib_mem;
use embedded_hal::{delay::DelayNs, i2c, spi};
use sample::raw_data_mem;

/// Register addresses outside the trim and data blocks.
mod regs {
    pub const ID: u8 = 0xD0;
    pub const RESET: u8 = 0xE0;
    pub const CTRL_HUM: u8 = 0xF2;
    pub const CTRL_MEAS: u8 = 0xF4;
    pub const CONFIG: u8 = 0xF5;

    pub const RESET_COMMAND: u8 = 0xB6;
    /// Start-up time after a soft reset.
    pub const RESET_DELAY_MS: u32 = 2;
}

/// Chip ID of the BME280.
pub const CHIP_ID_BME280: u8 = 0x60;
/// Chip ID of the BMP280.
pub const CHIP_ID_BMP280: u8 = 0x58;

/// Error types for the driver.
pub mod error {
    use core::fmt;

    /// Errors that can occur during communication or compensation.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    pub enum Bme280Error<E> {
        /// The ID register holds an unknown value (or nothing answered).
        DeviceNotFound(u8),
        /// A bus read failed.
        BusError(E),
        /// A bus read returned fewer bytes than requested.
        PartialTransfer { expected: usize, actual: usize },
        /// The trim table could not be read completely.
        CalibrationReadError,
        /// Writing a control register failed.
        WriteError(E),
        /// The pressure compensation divisor is zero.
        MathDegenerate,
        /// Sampling was requested before a successful `initialize`.
        NotReady,
    }

    impl<E: fmt::Debug> fmt::Display for Bme280Error<E> {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            match self {
                Self::DeviceNotFound(id) => write!(f, "no BME280/BMP280 found (chip id {id:#04x})"),
                Self::BusError(e) => write!(f, "bus error: {e:?}"),
                Self::PartialTransfer { expected, actual } => {
                    write!(f, "short read: {actual} of {expected} bytes")
                }
                Self::CalibrationReadError => write!(f, "failed to read calibration data"),
                Self::WriteError(e) => write!(f, "register write failed: {e:?}"),
                Self::MathDegenerate => write!(f, "pressure compensation divisor is zero"),
                Self::NotReady => write!(f, "sensor not initialized"),
            }
        }
    }

    /// Result type alias for driver operations.
    pub type Result<T, E> = core::result::Result<T, Bme280Error<E>>;
}

use error::Bme280Error;

/// Chip variant, told apart by the ID register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ChipKind {
    /// Temperature, pressure and humidity.
    Bme280,
    /// Temperature and pressure only.
    Bmp280,
}

impl ChipKind {
    /// Maps a chip ID to a known variant.
    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            CHIP_ID_BME280 => Some(ChipKind::Bme280),
            CHIP_ID_BMP280 => Some(ChipKind::Bmp280),
            _ => None,
        }
    }

    pub fn has_humidity(&self) -> bool {
        matches!(self, ChipKind::Bme280)
    }
}

/// Bring-up progress of the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DeviceState {
    #[default]
    Uninitialized,
    Identified,
    CalibrationLoaded,
    Configured,
    Ready,
}

/// Compensated values of one sample.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Reading {
    pub pressure: f32,
    pub temperature: f32,
    /// `NaN` on a BMP280.
    pub humidity: f32,
}

impl Reading {
    /// Returned in place of a reading when the bus fails.
    pub const NAN: Reading = Reading {
        pressure: f32::NAN,
        temperature: f32::NAN,
        humidity: f32::NAN,
    };

    /// Returns `true` if any of the three values is `NaN`.
    pub fn has_nan(&self) -> bool {
        self.pressure.is_nan() || self.temperature.is_nan() || self.humidity.is_nan()
    }
}

/// The main driver structure.
///
/// Owns the bus interface exclusively. All calls block until the bus
/// transaction has completed.
#[derive(Debug)]
pub struct Bme280<IFACE> {
    iface: IFACE,
    settings: Settings,
    calib: Option<CalibrationTable>,
    chip: Option<ChipKind>,
    has_humidity: bool,
    state: DeviceState,
}

impl<I2C> Bme280<I2cInterface<I2C>>
where
    I2C: i2c::I2c,
{
    /// Creates a driver on an I2C bus. Does not talk to the sensor yet.
    pub fn new_i2c(i2c: I2C, address: Address, settings: Settings) -> Self {
        Self::with_interface(I2cInterface::new(i2c, address), settings)
    }
}

impl<SPI> Bme280<SpiInterface<SPI>>
where
    SPI: spi::SpiDevice,
{
    /// Creates a driver on a 4-wire SPI device. Does not talk to the sensor yet.
    pub fn new_spi(spi: SPI, settings: Settings) -> Self {
        Self::with_interface(SpiInterface::new(spi), settings)
    }
}

impl<IFACE, E> Bme280<IFACE>
where
    IFACE: Interface<Error = E>,
{
    /// Creates a driver on any register interface, in the `Uninitialized` state.
    pub fn with_interface(iface: IFACE, settings: Settings) -> Self {
        Bme280 {
            iface,
            settings,
            calib: None,
            chip: None,
            has_humidity: false,
            state: DeviceState::Uninitialized,
        }
    }

    /// Brings the sensor up: identification, calibration load, settings write.
    ///
    /// On failure the driver is left `Uninitialized` with no calibration cached.
    pub fn initialize(&mut self) -> error::Result<(), E> {
        self.identify()?;
        self.load_calibration()?;
        self.apply_settings(self.settings)?;
        self.state = DeviceState::Ready;
        debug!("sensor ready");
        Ok(())
    }

    /// Reads the ID register and records which variant is attached.
    pub fn identify(&mut self) -> error::Result<ChipKind, E> {
        self.has_humidity = false;
        self.chip = None;

        let mut id = [0u8; 1];
        if let Err(e) = self.read_exact(regs::ID, &mut id) {
            warn!("reading chip id failed");
            self.revert();
            return Err(e);
        }

        match ChipKind::from_id(id[0]) {
            Some(kind) => {
                debug!("chip id {:#x}", id[0]);
                self.has_humidity = kind.has_humidity();
                self.chip = Some(kind);
                self.state = DeviceState::Identified;
                Ok(kind)
            }
            None => {
                warn!("unknown chip id {:#x}", id[0]);
                self.revert();
                Err(Bme280Error::DeviceNotFound(id[0]))
            }
        }
    }

    /// Reads and decodes the factory trim table.
    ///
    /// The table is only kept if all four blocks were read in full.
    pub fn load_calibration(&mut self) -> error::Result<CalibrationTable, E> {
        let mut buffer = [0u8; calib_mem::TOTAL_SIZE];
        let mut ord = 0;

        for (&addr, &size) in calib_mem::ADDR.iter().zip(calib_mem::SIZES.iter()) {
            match self.iface.read_register(addr, &mut buffer[ord..ord + size]) {
                Ok(n) if n == size => ord += n,
                _ => {
                    warn!("calibration block {:#x} could not be read", addr);
                    self.revert();
                    return Err(Bme280Error::CalibrationReadError);
                }
            }
        }

        if ord != calib_mem::TOTAL_SIZE {
            self.revert();
            return Err(Bme280Error::CalibrationReadError);
        }

        let table = CalibrationTable::from_bytes(&buffer);
        self.calib = Some(table);
        self.state = DeviceState::CalibrationLoaded;
        Ok(table)
    }

    /// Stores `settings` and writes them to the control registers.
    ///
    /// Writes `ctrl_hum`, `ctrl_meas`, `config` in that order; `ctrl_hum` only
    /// takes effect after the following `ctrl_meas` write. Registers written
    /// before a failing write are not rolled back.
    pub fn apply_settings(&mut self, settings: Settings) -> error::Result<(), E> {
        self.settings = settings;

        if let Err(e) = self.write_settings() {
            warn!("writing settings failed");
            self.revert();
            return Err(e);
        }

        debug!(
            "settings written: mode={} standby={}us",
            settings.mode as u8,
            settings.standby.as_micros()
        );
        if self.state == DeviceState::CalibrationLoaded {
            self.state = DeviceState::Configured;
        }
        Ok(())
    }

    /// Reads the raw ADC values of one conversion.
    ///
    /// In forced mode the settings are written again first, which starts a
    /// new conversion. A failure here leaves the driver `Ready`, so the call
    /// can simply be repeated.
    pub fn sample(&mut self) -> error::Result<RawSample, E> {
        if self.state != DeviceState::Ready {
            return Err(Bme280Error::NotReady);
        }

        if self.settings.mode == Mode::Forced {
            trace!("re-arming forced mode");
            self.write_settings()?;
        }

        let mut buffer = [0u8; raw_data_mem::SIZE];
        self.read_exact(raw_data_mem::ADDR, &mut buffer)?;
        Ok(RawSample::new(buffer))
    }

    /// Samples once and compensates all channels in the requested units.
    ///
    /// Pressure is `NaN` if its compensation degenerates; humidity is `NaN`
    /// on a BMP280. On error, [`Reading::NAN`] is the value to report.
    pub fn read_all(
        &mut self,
        temp_unit: TempUnit,
        pres_unit: PresUnit,
    ) -> error::Result<Reading, E> {
        let (sample, calib) = self.sample_with_calibration()?;
        let (pressure, temperature, humidity) =
            calc::compensate_sample(&sample, &calib, temp_unit, pres_unit);

        Ok(Reading {
            pressure,
            temperature,
            humidity: if self.has_humidity { humidity } else { f32::NAN },
        })
    }

    /// Like [`Self::read_all`] in °C and Pa, but a degenerate pressure
    /// compensation is an error instead of `NaN`.
    pub fn measure(&mut self) -> error::Result<Reading, E> {
        let (sample, calib) = self.sample_with_calibration()?;
        let (centi, t_fine) = calc::temperature_centi(sample.temperature(), &calib);
        let pressure = calc::pressure_q24_8(sample.pressure(), t_fine, &calib)
            .ok_or(Bme280Error::MathDegenerate)?;
        let humidity = if self.has_humidity {
            calc::humidity_q22_10(sample.humidity(), t_fine, &calib) as f32 / 1024.0
        } else {
            f32::NAN
        };

        Ok(Reading {
            pressure: pressure as f32 / 256.0,
            temperature: centi as f32 / 100.0,
            humidity,
        })
    }

    /// Temperature in `unit`, or `NaN` if the read fails.
    pub fn temperature(&mut self, unit: TempUnit) -> f32 {
        self.read_all(unit, PresUnit::Pa)
            .unwrap_or(Reading::NAN)
            .temperature
    }

    /// Pressure in `unit`, or `NaN` if the read fails.
    pub fn pressure(&mut self, unit: PresUnit) -> f32 {
        self.read_all(TempUnit::Celsius, unit)
            .unwrap_or(Reading::NAN)
            .pressure
    }

    /// Relative humidity in %, or `NaN` if the read fails or the chip has no humidity sensor.
    pub fn humidity(&mut self) -> f32 {
        self.read_all(TempUnit::Celsius, PresUnit::Pa)
            .unwrap_or(Reading::NAN)
            .humidity
    }

    /// Performs a soft reset. The sensor needs `initialize` again afterwards.
    pub fn reset(&mut self, delay: &mut impl DelayNs) -> error::Result<(), E> {
        self.revert();
        self.iface
            .write_register(regs::RESET, regs::RESET_COMMAND)
            .map_err(Bme280Error::WriteError)?;
        delay.delay_ms(regs::RESET_DELAY_MS);
        Ok(())
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn state(&self) -> DeviceState {
        self.state
    }

    /// Variant found by the last successful `identify`.
    pub fn chip_kind(&self) -> Option<ChipKind> {
        self.chip
    }

    pub fn has_humidity(&self) -> bool {
        self.has_humidity
    }

    pub fn calibration(&self) -> Option<&CalibrationTable> {
        self.calib.as_ref()
    }

    /// Destroys the driver and returns the bus interface.
    pub fn release(self) -> IFACE {
        self.iface
    }

    fn sample_with_calibration(&mut self) -> error::Result<(RawSample, CalibrationTable), E> {
        let sample = self.sample()?;
        let calib = self.calib.ok_or(Bme280Error::NotReady)?;
        Ok((sample, calib))
    }

    /// Writes the stored settings without touching the device state.
    fn write_settings(&mut self) -> error::Result<(), E> {
        let [ctrl_hum, ctrl_meas, config] = self.settings.registers();
        self.iface
            .write_register(regs::CTRL_HUM, ctrl_hum)
            .and_then(|_| self.iface.write_register(regs::CTRL_MEAS, ctrl_meas))
            .and_then(|_| self.iface.write_register(regs::CONFIG, config))
            .map_err(Bme280Error::WriteError)?;
        trace!(
            "ctrl_hum={:#x} ctrl_meas={:#x} config={:#x}",
            ctrl_hum,
            ctrl_meas,
            config
        );
        Ok(())
    }

    /// Fills `buf` from `reg`, treating a short transfer as an error.
    fn read_exact(&mut self, reg: u8, buf: &mut [u8]) -> error::Result<(), E> {
        let actual = self
            .iface
            .read_register(reg, buf)
            .map_err(Bme280Error::BusError)?;
        if actual != buf.len() {
            return Err(Bme280Error::PartialTransfer {
                expected: buf.len(),
                actual,
            });
        }
        Ok(())
    }

    /// Drops everything learned from the device.
    fn revert(&mut self) {
        self.calib = None;
        self.state = DeviceState::Uninitialized;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calib::tests::REFERENCE_TRIM;
    use crate::sample::tests::REFERENCE_BURST;

    #[derive(Debug, Clone, Copy, PartialEq)]
    struct FakeError;

    /// Register file with fault injection.
    struct FakeBus {
        regs: [u8; 256],
        fail_read: Option<u8>,
        short_read: Option<u8>,
        fail_write: Option<u8>,
        writes: Vec<(u8, u8)>,
    }

    impl FakeBus {
        fn new(chip_id: u8) -> Self {
            let mut regs = [0u8; 256];
            regs[regs::ID as usize] = chip_id;
            let mut ord = 0;
            for (&addr, &size) in calib_mem::ADDR.iter().zip(calib_mem::SIZES.iter()) {
                let start = addr as usize;
                regs[start..start + size].copy_from_slice(&REFERENCE_TRIM[ord..ord + size]);
                ord += size;
            }
            let start = raw_data_mem::ADDR as usize;
            regs[start..start + raw_data_mem::SIZE].copy_from_slice(&REFERENCE_BURST);
            FakeBus {
                regs,
                fail_read: None,
                short_read: None,
                fail_write: None,
                writes: Vec::new(),
            }
        }
    }

    impl Interface for FakeBus {
        type Error = FakeError;

        fn read_register(&mut self, reg: u8, buf: &mut [u8]) -> Result<usize, FakeError> {
            if self.fail_read == Some(reg) {
                return Err(FakeError);
            }
            let len = if self.short_read == Some(reg) {
                buf.len() - 1
            } else {
                buf.len()
            };
            let start = reg as usize;
            buf[..len].copy_from_slice(&self.regs[start..start + len]);
            Ok(len)
        }

        fn write_register(&mut self, reg: u8, value: u8) -> Result<(), FakeError> {
            if self.fail_write == Some(reg) {
                return Err(FakeError);
            }
            self.regs[reg as usize] = value;
            self.writes.push((reg, value));
            Ok(())
        }
    }

    fn driver(bus: FakeBus) -> Bme280<FakeBus> {
        Bme280::with_interface(bus, Settings::default())
    }

    #[test]
    fn initialize_reaches_ready() {
        let mut bme = driver(FakeBus::new(CHIP_ID_BME280));
        assert_eq!(bme.state(), DeviceState::Uninitialized);

        bme.initialize().unwrap();
        assert_eq!(bme.state(), DeviceState::Ready);
        assert_eq!(bme.chip_kind(), Some(ChipKind::Bme280));
        assert!(bme.has_humidity());
        assert_eq!(
            bme.calibration(),
            Some(&CalibrationTable::from(REFERENCE_TRIM))
        );
        assert_eq!(
            bme.release().writes,
            vec![(0xF2, 0x01), (0xF4, 0x25), (0xF5, 0xA0)]
        );
    }

    #[test]
    fn steps_advance_the_state() {
        let mut bme = driver(FakeBus::new(CHIP_ID_BME280));
        bme.identify().unwrap();
        assert_eq!(bme.state(), DeviceState::Identified);
        bme.load_calibration().unwrap();
        assert_eq!(bme.state(), DeviceState::CalibrationLoaded);
        bme.apply_settings(Settings::default()).unwrap();
        assert_eq!(bme.state(), DeviceState::Configured);
    }

    #[test]
    fn unknown_chip_is_not_found() {
        let mut bme = driver(FakeBus::new(0x61));
        assert_eq!(bme.initialize(), Err(Bme280Error::DeviceNotFound(0x61)));
        assert_eq!(bme.state(), DeviceState::Uninitialized);
        assert_eq!(bme.chip_kind(), None);
        assert!(bme.release().writes.is_empty());
    }

    #[test]
    fn bmp280_clears_humidity_flag() {
        let mut bme = driver(FakeBus::new(CHIP_ID_BME280));
        assert_eq!(bme.identify(), Ok(ChipKind::Bme280));
        assert!(bme.has_humidity());

        bme.iface.regs[regs::ID as usize] = CHIP_ID_BMP280;
        assert_eq!(bme.identify(), Ok(ChipKind::Bmp280));
        assert!(!bme.has_humidity());
    }

    #[test]
    fn failed_id_read_clears_humidity_flag() {
        let mut bus = FakeBus::new(CHIP_ID_BME280);
        bus.fail_read = Some(regs::ID);
        let mut bme = driver(bus);
        bme.has_humidity = true;

        assert_eq!(bme.identify(), Err(Bme280Error::BusError(FakeError)));
        assert!(!bme.has_humidity());
        assert_eq!(bme.state(), DeviceState::Uninitialized);
    }

    #[test]
    fn short_calibration_read_fails_initialize() {
        let mut bus = FakeBus::new(CHIP_ID_BME280);
        bus.short_read = Some(0xE1);
        let mut bme = driver(bus);

        assert_eq!(bme.initialize(), Err(Bme280Error::CalibrationReadError));
        assert_eq!(bme.state(), DeviceState::Uninitialized);
        assert_eq!(bme.calibration(), None);
        assert!(bme.release().writes.is_empty());
    }

    #[test]
    fn failed_calibration_read_drops_previous_table() {
        let mut bme = driver(FakeBus::new(CHIP_ID_BME280));
        bme.initialize().unwrap();
        assert!(bme.calibration().is_some());

        bme.iface.fail_read = Some(0x8E);
        assert_eq!(bme.initialize(), Err(Bme280Error::CalibrationReadError));
        assert_eq!(bme.calibration(), None);
        assert_eq!(bme.state(), DeviceState::Uninitialized);
    }

    #[test]
    fn partial_settings_write_is_not_rolled_back() {
        let mut bus = FakeBus::new(CHIP_ID_BME280);
        bus.fail_write = Some(regs::CONFIG);
        let mut bme = driver(bus);

        assert_eq!(bme.initialize(), Err(Bme280Error::WriteError(FakeError)));
        assert_eq!(bme.state(), DeviceState::Uninitialized);
        assert_eq!(bme.release().writes, vec![(0xF2, 0x01), (0xF4, 0x25)]);
    }

    #[test]
    fn sample_requires_initialize() {
        let mut bme = driver(FakeBus::new(CHIP_ID_BME280));
        assert_eq!(bme.sample(), Err(Bme280Error::NotReady));
        assert!(bme.temperature(TempUnit::Celsius).is_nan());
    }

    #[test]
    fn forced_mode_rearms_before_each_sample() {
        let mut bme = driver(FakeBus::new(CHIP_ID_BME280));
        bme.initialize().unwrap();

        bme.sample().unwrap();
        bme.sample().unwrap();
        // 3 writes from initialize, 3 per sample
        assert_eq!(bme.release().writes.len(), 9);
    }

    #[test]
    fn failed_rearm_can_be_retried() {
        let mut bme = driver(FakeBus::new(CHIP_ID_BME280));
        bme.initialize().unwrap();

        bme.iface.fail_write = Some(regs::CTRL_HUM);
        assert_eq!(bme.sample(), Err(Bme280Error::WriteError(FakeError)));
        assert_eq!(bme.state(), DeviceState::Ready);
        assert!(bme.calibration().is_some());

        bme.iface.fail_write = None;
        assert_eq!(bme.sample(), Ok(RawSample::new(REFERENCE_BURST)));
        let r = bme.read_all(TempUnit::Celsius, PresUnit::HPa).unwrap();
        assert!((r.temperature - 25.08).abs() < 0.01);
    }

    #[test]
    fn normal_mode_does_not_rearm() {
        let settings = SettingsBuilder::new().mode(Mode::Normal).build();
        let mut bme = Bme280::with_interface(FakeBus::new(CHIP_ID_BME280), settings);
        bme.initialize().unwrap();

        let sample = bme.sample().unwrap();
        assert_eq!(sample, RawSample::new(REFERENCE_BURST));
        assert_eq!(bme.release().writes.len(), 3);
    }

    #[test]
    fn short_burst_is_a_bus_failure() {
        let mut bus = FakeBus::new(CHIP_ID_BME280);
        bus.short_read = Some(raw_data_mem::ADDR);
        let mut bme = driver(bus);
        bme.initialize().unwrap();

        assert_eq!(
            bme.sample(),
            Err(Bme280Error::PartialTransfer {
                expected: 8,
                actual: 7
            })
        );
        assert_eq!(bme.state(), DeviceState::Ready);
    }

    #[test]
    fn read_all_reference_values() {
        let mut bme = driver(FakeBus::new(CHIP_ID_BME280));
        bme.initialize().unwrap();

        let r = bme.read_all(TempUnit::Celsius, PresUnit::HPa).unwrap();
        assert!((r.temperature - 25.08).abs() < 0.01);
        assert!((r.pressure - 1006.53).abs() < 0.01);
        assert!((r.humidity - 54.997).abs() < 0.01);

        let r = bme.read_all(TempUnit::Fahrenheit, PresUnit::Pa).unwrap();
        assert!((r.temperature - 77.144).abs() < 0.01);
        assert!((r.pressure - 100_653.27).abs() < 0.1);
    }

    #[test]
    fn read_all_failure_reports_nan() {
        let mut bus = FakeBus::new(CHIP_ID_BME280);
        bus.fail_read = Some(raw_data_mem::ADDR);
        let mut bme = driver(bus);
        bme.initialize().unwrap();

        let result = bme.read_all(TempUnit::Celsius, PresUnit::HPa);
        assert_eq!(result, Err(Bme280Error::BusError(FakeError)));
        assert!(result.unwrap_or(Reading::NAN).has_nan());
        assert!(bme.pressure(PresUnit::HPa).is_nan());
        assert!(bme.humidity().is_nan());
    }

    #[test]
    fn bmp280_reports_no_humidity() {
        let mut bme = driver(FakeBus::new(CHIP_ID_BMP280));
        bme.initialize().unwrap();

        let r = bme.read_all(TempUnit::Celsius, PresUnit::Pa).unwrap();
        assert!((r.temperature - 25.08).abs() < 0.01);
        assert!(r.humidity.is_nan());
        assert!(bme.humidity().is_nan());
    }

    #[test]
    fn measure_reports_degenerate_pressure() {
        let mut bus = FakeBus::new(CHIP_ID_BME280);
        // P1 = 0 zeroes the divisor
        bus.regs[0x8E] = 0;
        bus.regs[0x8F] = 0;
        let mut bme = driver(bus);
        bme.initialize().unwrap();

        assert_eq!(bme.measure(), Err(Bme280Error::MathDegenerate));
        let r = bme.read_all(TempUnit::Celsius, PresUnit::Pa).unwrap();
        assert!(r.pressure.is_nan());
        assert!((r.temperature - 25.08).abs() < 0.01);
    }

    #[test]
    fn measure_in_native_units() {
        let mut bme = driver(FakeBus::new(CHIP_ID_BME280));
        bme.initialize().unwrap();

        let r = bme.measure().unwrap();
        assert_eq!(r.temperature, 25.08);
        assert!((r.pressure - 100_653.27).abs() < 0.1);
        assert_eq!(r.humidity, 56_317.0 / 1024.0);
    }

    #[test]
    fn apply_settings_is_written_immediately() {
        let mut bme = driver(FakeBus::new(CHIP_ID_BME280));
        bme.initialize().unwrap();

        let settings = SettingsBuilder::new()
            .mode(Mode::Normal)
            .temp_oversampling(Oversampling::X2)
            .pres_oversampling(Oversampling::X16)
            .hum_oversampling(Oversampling::X4)
            .filter(Filter::X4)
            .standby(Standby::Millis125)
            .build();
        bme.apply_settings(settings).unwrap();

        assert_eq!(bme.settings(), &settings);
        assert_eq!(bme.state(), DeviceState::Ready);
        let writes = bme.release().writes;
        assert_eq!(
            &writes[3..],
            &[(0xF2, 0b011), (0xF4, 0b010_101_11), (0xF5, 0b010_010_00)]
        );
    }

    #[test]
    fn reset_reverts_state() {
        struct NoDelay;
        impl DelayNs for NoDelay {
            fn delay_ns(&mut self, _ns: u32) {}
        }

        let mut bme = driver(FakeBus::new(CHIP_ID_BME280));
        bme.initialize().unwrap();
        bme.reset(&mut NoDelay).unwrap();

        assert_eq!(bme.state(), DeviceState::Uninitialized);
        assert_eq!(bme.calibration(), None);
        assert_eq!(bme.release().writes.last(), Some(&(0xE0, 0xB6)));
    }

    #[test]
    fn error_display() {
        let e: Bme280Error<FakeError> = Bme280Error::DeviceNotFound(0x61);
        assert_eq!(e.to_string(), "no BME280/BMP280 found (chip id 0x61)");
        let e: Bme280Error<FakeError> = Bme280Error::BusError(FakeError);
        assert_eq!(e.to_string(), "bus error: FakeError");
    }

    mod i2c_bus {
        use super::*;
        use embedded_hal_mock::eh1::i2c::{Mock as I2cMock, Transaction};

        const ADDR: u8 = 0x76;

        fn settings_writes() -> [Transaction; 3] {
            [
                Transaction::write(ADDR, vec![0xF2, 0x01]),
                Transaction::write(ADDR, vec![0xF4, 0x25]),
                Transaction::write(ADDR, vec![0xF5, 0xA0]),
            ]
        }

        #[test]
        fn end_to_end_reference_reading() {
            let mut expectations = vec![
                Transaction::write_read(ADDR, vec![0xD0], vec![CHIP_ID_BME280]),
                Transaction::write_read(ADDR, vec![0x88], REFERENCE_TRIM[0..6].to_vec()),
                Transaction::write_read(ADDR, vec![0x8E], REFERENCE_TRIM[6..24].to_vec()),
                Transaction::write_read(ADDR, vec![0xA1], REFERENCE_TRIM[24..25].to_vec()),
                Transaction::write_read(ADDR, vec![0xE1], REFERENCE_TRIM[25..32].to_vec()),
            ];
            expectations.extend(settings_writes());
            expectations.extend(settings_writes());
            expectations.push(Transaction::write_read(
                ADDR,
                vec![0xF7],
                REFERENCE_BURST.to_vec(),
            ));

            let mut bme = Bme280::new_i2c(
                I2cMock::new(&expectations),
                Address::Primary,
                Settings::default(),
            );
            bme.initialize().unwrap();
            let r = bme.read_all(TempUnit::Celsius, PresUnit::HPa).unwrap();

            assert!((r.temperature - 25.08).abs() < 0.01);
            assert!((r.pressure - 1006.53).abs() < 0.01);
            assert!((r.humidity - 54.997).abs() < 0.01);

            bme.release().release().done();
        }

        #[test]
        fn absent_device() {
            let expectations = [Transaction::write_read(ADDR, vec![0xD0], vec![0x00])
                .with_error(embedded_hal::i2c::ErrorKind::NoAcknowledge(
                    embedded_hal::i2c::NoAcknowledgeSource::Address,
                ))];

            let mut bme = Bme280::new_i2c(
                I2cMock::new(&expectations),
                Address::Primary,
                Settings::default(),
            );
            assert!(matches!(
                bme.initialize(),
                Err(Bme280Error::BusError(_))
            ));
            assert_eq!(bme.state(), DeviceState::Uninitialized);

            bme.release().release().done();
        }
    }

    mod spi_bus {
        use super::*;
        use embedded_hal_mock::eh1::spi::{Mock as SpiMock, Transaction};

        fn read(reg: u8, data: &[u8]) -> [Transaction<u8>; 4] {
            [
                Transaction::transaction_start(),
                Transaction::write_vec(vec![reg | 0x80]),
                Transaction::read_vec(data.to_vec()),
                Transaction::transaction_end(),
            ]
        }

        fn write(reg: u8, value: u8) -> [Transaction<u8>; 3] {
            [
                Transaction::transaction_start(),
                Transaction::write_vec(vec![reg & 0x7F, value]),
                Transaction::transaction_end(),
            ]
        }

        fn settings_writes() -> Vec<Transaction<u8>> {
            let mut t = Vec::new();
            t.extend(write(0xF2, 0x01));
            t.extend(write(0xF4, 0x25));
            t.extend(write(0xF5, 0xA0));
            t
        }

        #[test]
        fn end_to_end_reference_reading() {
            let mut expectations = Vec::new();
            expectations.extend(read(0xD0, &[CHIP_ID_BME280]));
            expectations.extend(read(0x88, &REFERENCE_TRIM[0..6]));
            expectations.extend(read(0x8E, &REFERENCE_TRIM[6..24]));
            expectations.extend(read(0xA1, &REFERENCE_TRIM[24..25]));
            expectations.extend(read(0xE1, &REFERENCE_TRIM[25..32]));
            expectations.extend(settings_writes());
            expectations.extend(settings_writes());
            expectations.extend(read(0xF7, &REFERENCE_BURST));

            let mut bme = Bme280::new_spi(SpiMock::new(&expectations), Settings::default());
            bme.initialize().unwrap();
            assert_eq!(bme.chip_kind(), Some(ChipKind::Bme280));
            let r = bme.read_all(TempUnit::Celsius, PresUnit::HPa).unwrap();

            assert!((r.temperature - 25.08).abs() < 0.01);
            assert!((r.pressure - 1006.53).abs() < 0.01);
            assert!((r.humidity - 54.997).abs() < 0.01);

            bme.release().release().done();
        }
    }
}
