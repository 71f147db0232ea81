//! Fixed-point compensation of the raw ADC values (Bosch BME280 datasheet, section 4.2.3).
//!
//! Temperature has to be compensated first: it yields the [`TFine`] value that
//! the pressure and humidity formulas take as input. `TFine` can only be
//! produced by [`temperature_centi`], so a pressure or humidity value can never
//! be computed without a temperature of the same sample.

use crate::calib::CalibrationTable;
use crate::sample::RawSample;
use crate::units::{PresUnit, TempUnit};

/// Upper clamp of the humidity accumulator, 100 %RH in Q22.10 shifted by 12.
pub const HUMIDITY_MAX: i64 = 419_430_400;

/// Fine temperature produced by temperature compensation.
///
/// Carries the temperature dependency into pressure and humidity compensation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TFine(i32);

impl TFine {
    pub fn value(&self) -> i32 {
        self.0
    }
}

/// Compensated temperature in 1/100 °C together with the fine temperature.
///
/// A return value of `2508` represents 25.08 °C.
pub fn temperature_centi(temp_adc: u32, calib: &CalibrationTable) -> (i32, TFine) {
    let adc = temp_adc as i64;
    let t1 = calib.dig_t1 as i64;
    let t2 = calib.dig_t2 as i64;
    let t3 = calib.dig_t3 as i64;

    let var1 = (((adc >> 3) - (t1 << 1)) * t2) >> 11;
    let var2 = (((((adc >> 4) - t1) * ((adc >> 4) - t1)) >> 12) * t3) >> 14;
    let t_fine = (var1 + var2) as i32;

    (((t_fine * 5) + 128) >> 8, TFine(t_fine))
}

/// Compensated pressure in Pa as unsigned Q24.8.
///
/// A return value of `24674867` represents 24674867 / 256 = 96386.2 Pa.
/// Returns `None` when the calibration makes the divisor zero.
pub fn pressure_q24_8(press_adc: u32, t_fine: TFine, calib: &CalibrationTable) -> Option<u32> {
    let [p1, p2, p3, p4, p5, p6, p7, p8, p9] = calib.pressure().map(i64::from);

    let mut var1 = t_fine.0 as i64 - 128_000;
    let mut var2 = var1 * var1 * p6;
    var2 += (var1 * p5) << 17;
    var2 += p4 << 35;
    var1 = ((var1 * var1 * p3) >> 8) + ((var1 * p2) << 12);
    var1 = ((1i64 << 47) + var1).wrapping_mul(p1) >> 33;

    if var1 == 0 {
        return None;
    }

    let mut p = 1_048_576 - press_adc as i64;
    p = ((p << 31).wrapping_sub(var2))
        .wrapping_mul(3125)
        .wrapping_div(var1);
    var1 = p9.wrapping_mul(p >> 13).wrapping_mul(p >> 13) >> 25;
    var2 = p8.wrapping_mul(p) >> 19;
    p = (p.wrapping_add(var1).wrapping_add(var2) >> 8) + (p7 << 4);

    Some(p as u32)
}

/// Compensated relative humidity as unsigned Q22.10.
///
/// A return value of `47445` represents 47445 / 1024 = 46.333 %RH.
/// The result is clamped to 0..=100 %RH.
pub fn humidity_q22_10(hum_adc: u16, t_fine: TFine, calib: &CalibrationTable) -> u32 {
    let [h1, h2, h3, h4, h5, h6] = calib.humidity().map(i64::from);
    let adc = hum_adc as i64;

    let mut var1 = t_fine.0 as i64 - 76_800;
    var1 = ((((adc << 14) - (h4 << 20) - (h5 * var1)) + 16_384) >> 15)
        * (((((((var1 * h6) >> 10) * (((var1 * h3) >> 11) + 32_768)) >> 10) + 2_097_152) * h2
            + 8_192)
            >> 14);
    var1 = var1.wrapping_sub(
        ((((var1 >> 15).wrapping_mul(var1 >> 15)) >> 7).wrapping_mul(h1)) >> 4,
    );
    let var1 = var1.clamp(0, HUMIDITY_MAX);

    (var1 >> 12) as u32
}

/// Temperature in the requested unit and the fine temperature for the same sample.
pub fn compensate_temperature(
    temp_adc: u32,
    calib: &CalibrationTable,
    unit: TempUnit,
) -> (f32, TFine) {
    let (centi, t_fine) = temperature_centi(temp_adc, calib);
    (unit.convert_celsius(centi as f32 / 100.0), t_fine)
}

/// Pressure in the requested unit, or `NaN` if the divisor degenerates.
pub fn compensate_pressure(
    press_adc: u32,
    t_fine: TFine,
    calib: &CalibrationTable,
    unit: PresUnit,
) -> f32 {
    match pressure_q24_8(press_adc, t_fine, calib) {
        Some(q) => unit.convert_pa(q as f32 / 256.0),
        None => f32::NAN,
    }
}

/// Relative humidity in percent.
pub fn compensate_humidity(hum_adc: u16, t_fine: TFine, calib: &CalibrationTable) -> f32 {
    humidity_q22_10(hum_adc, t_fine, calib) as f32 / 1024.0
}

/// Compensates all three channels of one sample, temperature first.
///
/// Returns `(pressure, temperature, humidity)`.
pub fn compensate_sample(
    sample: &RawSample,
    calib: &CalibrationTable,
    temp_unit: TempUnit,
    pres_unit: PresUnit,
) -> (f32, f32, f32) {
    let (temp, t_fine) = compensate_temperature(sample.temperature(), calib, temp_unit);
    let pres = compensate_pressure(sample.pressure(), t_fine, calib, pres_unit);
    let hum = compensate_humidity(sample.humidity(), t_fine, calib);
    (pres, temp, hum)
}
