//! BME280 factory trimming coefficients

/// Bytes in the first calibration block, starting at 0x88
pub const BLOCK_1_LEN: usize = 26;

/// Bytes in the second calibration block, starting at 0xE1
pub const BLOCK_2_LEN: usize = 7;

/// The 18 trimming coefficients burned into each BME280.
///
/// Read once during initialization and never modified afterwards.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CalibrationSet {
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

impl CalibrationSet {
    /// Decode both calibration blocks.
    ///
    /// `dig_h4` and `dig_h5` are 12-bit signed values sharing the nibbles
    /// of register 0xE5; the high byte of each carries the sign.
    pub fn from_registers(block_1: &[u8; BLOCK_1_LEN], block_2: &[u8; BLOCK_2_LEN]) -> Self {
        let unsigned = |i: usize| u16::from_le_bytes([block_1[i], block_1[i + 1]]);
        let signed = |i: usize| i16::from_le_bytes([block_1[i], block_1[i + 1]]);

        Self {
            dig_t1: unsigned(0),
            dig_t2: signed(2),
            dig_t3: signed(4),
            dig_p1: unsigned(6),
            dig_p2: signed(8),
            dig_p3: signed(10),
            dig_p4: signed(12),
            dig_p5: signed(14),
            dig_p6: signed(16),
            dig_p7: signed(18),
            dig_p8: signed(20),
            dig_p9: signed(22),
            // 0xA0 is reserved
            dig_h1: block_1[25],
            dig_h2: i16::from_le_bytes([block_2[0], block_2[1]]),
            dig_h3: block_2[2],
            dig_h4: (i16::from(block_2[3] as i8) << 4) | i16::from(block_2[4] & 0x0F),
            dig_h5: (i16::from(block_2[5] as i8) << 4) | i16::from(block_2[4] >> 4),
            dig_h6: block_2[6] as i8,
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Register image of a real part, shared with the compensation tests
    pub(crate) const BLOCK_1: [u8; BLOCK_1_LEN] = [
        0x70, 0x6B, // T1 = 27504
        0x43, 0x67, // T2 = 26435
        0x18, 0xFC, // T3 = -1000
        0x7D, 0x8E, // P1 = 36477
        0x43, 0xD6, // P2 = -10685
        0xD0, 0x0B, // P3 = 3024
        0x27, 0x0B, // P4 = 2855
        0x8C, 0x00, // P5 = 140
        0xF9, 0xFF, // P6 = -7
        0x8C, 0x3C, // P7 = 15500
        0xF8, 0xC6, // P8 = -14600
        0x70, 0x17, // P9 = 6000
        0x00, // reserved
        0x4B, // H1 = 75
    ];

    pub(crate) const BLOCK_2: [u8; BLOCK_2_LEN] = [
        0x6A, 0x01, // H2 = 362
        0x00, // H3 = 0
        0x13, 0x29, 0x03, // H4 = 313, H5 = 50
        0x1E, // H6 = 30
    ];

    pub(crate) fn reference() -> CalibrationSet {
        CalibrationSet {
            dig_t1: 27504,
            dig_t2: 26435,
            dig_t3: -1000,
            dig_p1: 36477,
            dig_p2: -10685,
            dig_p3: 3024,
            dig_p4: 2855,
            dig_p5: 140,
            dig_p6: -7,
            dig_p7: 15500,
            dig_p8: -14600,
            dig_p9: 6000,
            dig_h1: 75,
            dig_h2: 362,
            dig_h3: 0,
            dig_h4: 313,
            dig_h5: 50,
            dig_h6: 30,
        }
    }

    #[test]
    fn decodes_register_image() {
        assert_eq!(CalibrationSet::from_registers(&BLOCK_1, &BLOCK_2), reference());
    }

    #[test]
    fn nibble_packed_humidity_terms_keep_their_sign() {
        let mut block_2 = BLOCK_2;
        block_2[3] = 0xFF;
        block_2[4] = 0x8F;
        block_2[5] = 0xFE;

        let calibration = CalibrationSet::from_registers(&BLOCK_1, &block_2);
        assert_eq!(calibration.dig_h4, -1);
        assert_eq!(calibration.dig_h5, -24);
    }

    #[test]
    fn h6_is_signed() {
        let mut block_2 = BLOCK_2;
        block_2[6] = 0x80;
        assert_eq!(CalibrationSet::from_registers(&BLOCK_1, &block_2).dig_h6, -128);
    }
}
