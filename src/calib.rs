/// Register blocks holding the factory trim table, in read order.
///
/// The four blocks are concatenated into one 32-byte buffer:
/// `[0..6]` temperature, `[6..24]` pressure, `[24]` H1, `[25..32]` H2..H6.
pub mod calib_mem {
    pub const ADDR: [u8; 4] = [0x88, 0x8E, 0xA1, 0xE1];
    pub const SIZES: [usize; 4] = [6, 18, 1, 7];
    pub const TOTAL_SIZE: usize = 6 + 18 + 1 + 7;
}

/// Factory-fused compensation coefficients.
///
/// Unique to every chip. A table only exists once all [`calib_mem::TOTAL_SIZE`]
/// bytes have been read; there is no partially decoded state.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CalibrationTable {
    pub dig_t1: u16,
    pub dig_t2: i16,
    pub dig_t3: i16,
    pub dig_p1: u16,
    pub dig_p2: i16,
    pub dig_p3: i16,
    pub dig_p4: i16,
    pub dig_p5: i16,
    pub dig_p6: i16,
    pub dig_p7: i16,
    pub dig_p8: i16,
    pub dig_p9: i16,
    pub dig_h1: u8,
    pub dig_h2: i16,
    pub dig_h3: u8,
    pub dig_h4: i16,
    pub dig_h5: i16,
    pub dig_h6: i8,
}

impl CalibrationTable {
    /// Decodes the concatenated trim blocks.
    pub fn from_bytes(buf: &[u8; calib_mem::TOTAL_SIZE]) -> Self {
        // H4 and H5 are 12-bit values sharing the nibbles of 0xE5.
        // Their MSB registers (0xE4, 0xE6) are sign-extended.
        let h4 = ((buf[28] as i8 as i16) << 4) | (buf[29] & 0x0F) as i16;
        let h5 = ((buf[30] as i8 as i16) << 4) | (buf[29] >> 4) as i16;

        CalibrationTable {
            dig_t1: u16::from_le_bytes([buf[0], buf[1]]),
            dig_t2: i16::from_le_bytes([buf[2], buf[3]]),
            dig_t3: i16::from_le_bytes([buf[4], buf[5]]),
            dig_p1: u16::from_le_bytes([buf[6], buf[7]]),
            dig_p2: i16::from_le_bytes([buf[8], buf[9]]),
            dig_p3: i16::from_le_bytes([buf[10], buf[11]]),
            dig_p4: i16::from_le_bytes([buf[12], buf[13]]),
            dig_p5: i16::from_le_bytes([buf[14], buf[15]]),
            dig_p6: i16::from_le_bytes([buf[16], buf[17]]),
            dig_p7: i16::from_le_bytes([buf[18], buf[19]]),
            dig_p8: i16::from_le_bytes([buf[20], buf[21]]),
            dig_p9: i16::from_le_bytes([buf[22], buf[23]]),
            dig_h1: buf[24],
            dig_h2: i16::from_le_bytes([buf[25], buf[26]]),
            dig_h3: buf[27],
            dig_h4: h4,
            dig_h5: h5,
            dig_h6: buf[31] as i8,
        }
    }

    /// Temperature coefficients `(T1, T2, T3)`.
    pub fn temperature(&self) -> (u16, i16, i16) {
        (self.dig_t1, self.dig_t2, self.dig_t3)
    }

    /// Pressure coefficients `P1..P9`, with `P1` widened for uniform access.
    pub fn pressure(&self) -> [i32; 9] {
        [
            self.dig_p1 as i32,
            self.dig_p2 as i32,
            self.dig_p3 as i32,
            self.dig_p4 as i32,
            self.dig_p5 as i32,
            self.dig_p6 as i32,
            self.dig_p7 as i32,
            self.dig_p8 as i32,
            self.dig_p9 as i32,
        ]
    }

    /// Humidity coefficients `H1..H6`.
    pub fn humidity(&self) -> [i32; 6] {
        [
            self.dig_h1 as i32,
            self.dig_h2 as i32,
            self.dig_h3 as i32,
            self.dig_h4 as i32,
            self.dig_h5 as i32,
            self.dig_h6 as i32,
        ]
    }
}

impl From<[u8; calib_mem::TOTAL_SIZE]> for CalibrationTable {
    fn from(buf: [u8; calib_mem::TOTAL_SIZE]) -> Self {
        Self::from_bytes(&buf)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Trim bytes of the datasheet example (T, P) plus a typical humidity set.
    pub(crate) const REFERENCE_TRIM: [u8; calib_mem::TOTAL_SIZE] = [
        0x70, 0x6B, 0x43, 0x67, 0x18, 0xFC, // T1..T3
        0x7D, 0x8E, 0x43, 0xD6, 0xD0, 0x0B, 0x27, 0x0B, 0x8C, 0x00, 0xF9, 0xFF, // P1..P6
        0x8C, 0x3C, 0xF8, 0xC6, 0x70, 0x17, // P7..P9
        0x4B, // H1
        0x6A, 0x01, 0x00, 0x13, 0x29, 0x03, 0x1E, // H2..H6
    ];

    #[test]
    fn decodes_reference_table() {
        let c = CalibrationTable::from(REFERENCE_TRIM);
        assert_eq!(c.temperature(), (27504, 26435, -1000));
        assert_eq!(
            c.pressure(),
            [36477, -10685, 3024, 2855, 140, -7, 15500, -14600, 6000]
        );
        assert_eq!(c.humidity(), [75, 362, 0, 313, 50, 30]);
    }

    #[test]
    fn block_sizes_add_up() {
        assert_eq!(calib_mem::SIZES.iter().sum::<usize>(), calib_mem::TOTAL_SIZE);
        assert_eq!(calib_mem::TOTAL_SIZE, 32);
    }

    #[test]
    fn humidity_nibbles_are_sign_extended() {
        let mut buf = [0u8; calib_mem::TOTAL_SIZE];
        buf[28] = 0xFF; // H4 [11:4]
        buf[29] = 0xA5; // H5 [3:0] = 0xA, H4 [3:0] = 0x5
        buf[30] = 0x80; // H5 [11:4]
        buf[31] = 0xF6;
        let c = CalibrationTable::from_bytes(&buf);
        assert_eq!(c.dig_h4, -16 | 0x5);
        assert_eq!(c.dig_h5, -2048 | 0xA);
        assert_eq!(c.dig_h6, -10);
    }
}
