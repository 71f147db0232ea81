/// Memory address and size of the burst measurement registers (0xF7..0xFE).
pub mod raw_data_mem {
    pub const ADDR: u8 = 0xF7;
    pub const SIZE: usize = 8;

    /// Offsets of the three fields within the burst.
    pub const PRESS_OFFSET: usize = 0;
    pub const TEMP_OFFSET: usize = 3;
    pub const HUM_OFFSET: usize = 6;
}

/// Raw ADC output read in one burst, so that all three values belong to
/// the same conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RawSample {
    bytes: [u8; raw_data_mem::SIZE],
}

/// A 20-bit value stored top-aligned over `msb`, `lsb` and `xlsb[7:4]`.
fn adc20(b: &[u8]) -> u32 {
    ((b[0] as u32) << 12) | ((b[1] as u32) << 4) | ((b[2] as u32) >> 4)
}

impl RawSample {
    pub fn new(bytes: [u8; raw_data_mem::SIZE]) -> Self {
        Self { bytes }
    }

    /// Raw 20-bit pressure.
    pub fn pressure(&self) -> u32 {
        adc20(&self.bytes[raw_data_mem::PRESS_OFFSET..])
    }

    /// Raw 20-bit temperature.
    pub fn temperature(&self) -> u32 {
        adc20(&self.bytes[raw_data_mem::TEMP_OFFSET..])
    }

    /// Raw 16-bit humidity.
    pub fn humidity(&self) -> u16 {
        u16::from_be_bytes([
            self.bytes[raw_data_mem::HUM_OFFSET],
            self.bytes[raw_data_mem::HUM_OFFSET + 1],
        ])
    }
}
