//! Atmospheric quantities derived from compensated readings.
//!
//! Pressures are in Pa and temperatures in °C unless a unit is passed.

use crate::units::{LengthUnit, TempUnit, METERS_PER_FOOT, PA_PER_INHG};
use libm::{logf, powf};

/// Standard sea-level pressure in Pa.
pub const SEA_LEVEL_PA: f32 = 101_325.0;

/// Temperature lapse rate of the standard atmosphere in K/m.
const LAPSE_RATE: f32 = 0.0065;
/// Exponent of the barometric formula.
const BAROMETRIC_EXPONENT: f32 = 5.257;
const KELVIN_OFFSET: f32 = 273.15;

/// Magnus coefficients (Alduchov & Eskridge).
const MAGNUS_A: f32 = 17.625;
const MAGNUS_B: f32 = 243.04;

/// Altitude above the level where the pressure equals `sea_level_pressure`.
///
/// Linear approximation of 1000 m per inHg of pressure difference, good for
/// the lower atmosphere only. Returns `NaN` if either pressure is `NaN`.
pub fn altitude(pressure: f32, sea_level_pressure: f32, unit: LengthUnit) -> f32 {
    if pressure.is_nan() || sea_level_pressure.is_nan() {
        return f32::NAN;
    }

    let meters = 1000.0 * (sea_level_pressure - pressure) / PA_PER_INHG;
    match unit {
        LengthUnit::Meters => meters,
        LengthUnit::Feet => meters / METERS_PER_FOOT,
    }
}

/// `(1 - L·h / (T + L·h + 273.15))^5.257`, the station to sea-level pressure ratio.
fn barometric_ratio(altitude_m: f32, temp_c: f32) -> f32 {
    let lh = LAPSE_RATE * altitude_m;
    powf(1.0 - lh / (temp_c + lh + KELVIN_OFFSET), BAROMETRIC_EXPONENT)
}

/// Station pressure at `altitude_m` for a given sea-level pressure.
///
/// Inverse of [`equivalent_sea_level_pressure`] for the same altitude and temperature.
pub fn sea_level_altitude(altitude_m: f32, temp_c: f32, sea_level_pressure: f32) -> f32 {
    sea_level_pressure * barometric_ratio(altitude_m, temp_c)
}

/// Pressure reduced to sea level from a station pressure measured at `altitude_m`.
pub fn equivalent_sea_level_pressure(altitude_m: f32, temp_c: f32, pressure: f32) -> f32 {
    pressure / barometric_ratio(altitude_m, temp_c)
}

/// Dew point by the Magnus formula, in the unit of `temp`.
///
/// Returns `NaN` if either input is `NaN`.
pub fn dew_point(temp: f32, humidity: f32, unit: TempUnit) -> f32 {
    if temp.is_nan() || humidity.is_nan() {
        return f32::NAN;
    }

    let celsius = unit.to_celsius(temp);
    let gamma = logf(humidity / 100.0) + (MAGNUS_A * celsius) / (MAGNUS_B + celsius);
    let dew_c = MAGNUS_B * gamma / (MAGNUS_A - gamma);

    unit.convert_celsius(dew_c)
}
