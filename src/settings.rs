/// Bit positions of the fields packed into the three control registers.
///
/// `ctrl_hum` (0xF2): `[2:0]` humidity oversampling.
/// `ctrl_meas` (0xF4): `[7:5]` temperature oversampling, `[4:2]` pressure oversampling, `[1:0]` mode.
/// `config` (0xF5): `[7:5]` standby time, `[4:2]` filter, `[0]` 3-wire SPI enable.
pub mod layout {
    pub const OSRS_H_SHIFT: u8 = 0;
    pub const OSRS_H_MASK: u8 = 0b111;

    pub const OSRS_T_SHIFT: u8 = 5;
    pub const OSRS_P_SHIFT: u8 = 2;
    pub const OSRS_MASK: u8 = 0b111;
    pub const MODE_SHIFT: u8 = 0;
    pub const MODE_MASK: u8 = 0b11;

    pub const STANDBY_SHIFT: u8 = 5;
    pub const STANDBY_MASK: u8 = 0b111;
    pub const FILTER_SHIFT: u8 = 2;
    pub const FILTER_MASK: u8 = 0b111;
    pub const SPI3W_EN_BIT: u8 = 0;

    /// Places `value` into the field described by `shift` and `mask`.
    pub const fn field(value: u8, shift: u8, mask: u8) -> u8 {
        (value & mask) << shift
    }
}

/// Power mode of the sensor.
///
/// `Forced` runs exactly one measurement cycle per write of `ctrl_meas`
/// and then drops back to `Sleep`; the driver re-arms it before every sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Mode {
    Sleep = 0b00,
    #[default]
    Forced = 0b01,
    Normal = 0b11,
}

/// Oversampling for temperature, pressure and humidity.
///
/// Higher rates reduce noise at the cost of a longer conversion time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Oversampling {
    /// Channel disabled. The sensor reports `0x80000` (or `0x8000` for humidity).
    Skip = 0,
    #[default]
    X1 = 1,
    X2 = 2,
    X4 = 3,
    X8 = 4,
    X16 = 5,
}

impl Oversampling {
    /// Creates an instance from a raw register field. Reserved codes map to `X16`.
    pub fn from_u8(value: u8) -> Self {
        match value {
            0 => Oversampling::Skip,
            1 => Oversampling::X1,
            2 => Oversampling::X2,
            3 => Oversampling::X4,
            4 => Oversampling::X8,
            _ => Oversampling::X16,
        }
    }
}

/// IIR filter coefficient applied to temperature and pressure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Filter {
    #[default]
    Off = 0,
    X2 = 1,
    X4 = 2,
    X8 = 3,
    X16 = 4,
}

/// Inactive time between two measurements in `Normal` mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Standby {
    Micros500 = 0,
    Micros62500 = 1,
    Millis125 = 2,
    Millis250 = 3,
    Millis500 = 4,
    #[default]
    Millis1000 = 5,
    Millis10 = 6,
    Millis20 = 7,
}

impl Standby {
    /// Standby duration in microseconds.
    pub fn as_micros(&self) -> u32 {
        match self {
            Standby::Micros500 => 500,
            Standby::Micros62500 => 62_500,
            Standby::Millis125 => 125_000,
            Standby::Millis250 => 250_000,
            Standby::Millis500 => 500_000,
            Standby::Millis1000 => 1_000_000,
            Standby::Millis10 => 10_000,
            Standby::Millis20 => 20_000,
        }
    }
}

/// Complete sampling configuration of the sensor.
///
/// A `Settings` value is only a snapshot. It takes effect once it has been
/// written to the device with [`crate::Bme280::apply_settings`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Settings {
    pub mode: Mode,
    pub temp_osr: Oversampling,
    pub pres_osr: Oversampling,
    pub hum_osr: Oversampling,
    pub filter: Filter,
    pub standby: Standby,
    /// Enables the 3-wire SPI interface (`config[0]`).
    pub spi3w_enable: bool,
}

impl Settings {
    /// Value for the `ctrl_hum` register (0xF2).
    pub fn ctrl_hum(&self) -> u8 {
        layout::field(
            self.hum_osr as u8,
            layout::OSRS_H_SHIFT,
            layout::OSRS_H_MASK,
        )
    }

    /// Value for the `ctrl_meas` register (0xF4).
    pub fn ctrl_meas(&self) -> u8 {
        layout::field(self.temp_osr as u8, layout::OSRS_T_SHIFT, layout::OSRS_MASK)
            | layout::field(self.pres_osr as u8, layout::OSRS_P_SHIFT, layout::OSRS_MASK)
            | layout::field(self.mode as u8, layout::MODE_SHIFT, layout::MODE_MASK)
    }

    /// Value for the `config` register (0xF5).
    ///
    /// The bus flag is OR'd in as the low bit, independent of the other fields.
    pub fn config(&self) -> u8 {
        layout::field(
            self.standby as u8,
            layout::STANDBY_SHIFT,
            layout::STANDBY_MASK,
        ) | layout::field(self.filter as u8, layout::FILTER_SHIFT, layout::FILTER_MASK)
            | ((self.spi3w_enable as u8) << layout::SPI3W_EN_BIT)
    }

    /// The three control register values in write order: `ctrl_hum`, `ctrl_meas`, `config`.
    pub fn registers(&self) -> [u8; 3] {
        [self.ctrl_hum(), self.ctrl_meas(), self.config()]
    }

    /// Returns `true` if all three channels are set to `Skip`.
    pub fn is_all_skipped(&self) -> bool {
        self.temp_osr == Oversampling::Skip
            && self.pres_osr == Oversampling::Skip
            && self.hum_osr == Oversampling::Skip
    }
}

/// Builder for a [`Settings`] value, starting from the defaults.
#[derive(Default)]
pub struct SettingsBuilder {
    settings: Settings,
}

impl SettingsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(mut self, mode: Mode) -> Self {
        self.settings.mode = mode;
        self
    }

    pub fn temp_oversampling(mut self, os: Oversampling) -> Self {
        self.settings.temp_osr = os;
        self
    }

    pub fn pres_oversampling(mut self, os: Oversampling) -> Self {
        self.settings.pres_osr = os;
        self
    }

    pub fn hum_oversampling(mut self, os: Oversampling) -> Self {
        self.settings.hum_osr = os;
        self
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.settings.filter = filter;
        self
    }

    pub fn standby(mut self, standby: Standby) -> Self {
        self.settings.standby = standby;
        self
    }

    /// Sets the 3-wire SPI enable bit.
    pub fn spi3w_enable(mut self, enable: bool) -> Self {
        self.settings.spi3w_enable = enable;
        self
    }

    pub fn build(self) -> Settings {
        self.settings
    }
}
