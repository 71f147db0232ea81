//! Unit selectors for the float outputs of the driver.

/// Pascal per inch of mercury.
pub const PA_PER_INHG: f32 = 3386.375_3;
/// Pascal per standard atmosphere.
pub const PA_PER_ATM: f32 = 101_324.997_7;
/// Pascal per torr.
pub const PA_PER_TORR: f32 = 133.322_37;
/// Pascal per pound-force per square inch.
pub const PA_PER_PSI: f32 = 6894.744_8;
/// Meters per foot.
pub const METERS_PER_FOOT: f32 = 0.3048;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TempUnit {
    #[default]
    Celsius,
    Fahrenheit,
}

impl TempUnit {
    /// Converts a value in degrees Celsius into this unit.
    pub fn convert_celsius(self, celsius: f32) -> f32 {
        match self {
            TempUnit::Celsius => celsius,
            TempUnit::Fahrenheit => celsius * 9.0 / 5.0 + 32.0,
        }
    }

    /// Converts a value in this unit into degrees Celsius.
    pub fn to_celsius(self, value: f32) -> f32 {
        match self {
            TempUnit::Celsius => value,
            TempUnit::Fahrenheit => (value - 32.0) * 5.0 / 9.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PresUnit {
    /// Native unit of the compensation output.
    #[default]
    Pa,
    HPa,
    InHg,
    Atm,
    Bar,
    Torr,
    Psi,
}

impl PresUnit {
    /// Number of pascal in one unit.
    pub fn pascals(self) -> f32 {
        match self {
            PresUnit::Pa => 1.0,
            PresUnit::HPa => 100.0,
            PresUnit::InHg => PA_PER_INHG,
            PresUnit::Atm => PA_PER_ATM,
            PresUnit::Bar => 100_000.0,
            PresUnit::Torr => PA_PER_TORR,
            PresUnit::Psi => PA_PER_PSI,
        }
    }

    /// Converts a value in pascal into this unit.
    pub fn convert_pa(self, pa: f32) -> f32 {
        match self {
            PresUnit::Pa => pa,
            _ => pa / self.pascals(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LengthUnit {
    #[default]
    Meters,
    Feet,
}
