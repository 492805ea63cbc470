//! Fixed-point BME280 compensation
//!
//! Integer pipeline from the Bosch datasheet. All intermediate arithmetic is
//! two's-complement wrapping with arithmetic right shifts, so the results are
//! bit-identical to the reference implementation on every target.

use core::num::Wrapping;

use super::calibration::CalibrationSet;

/// Humidity intermediate ceiling before the final shift (100 %RH)
pub const HUMIDITY_CEILING: i32 = 0x1900_0000;

/// Largest humidity output, 100 %RH in Q22.10
pub const MAX_HUMIDITY: u32 = (HUMIDITY_CEILING >> 12) as u32;

/// Uncompensated ADC counts from one measurement burst
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RawSample {
    /// 20-bit pressure count
    pub pressure: i32,
    /// 20-bit temperature count
    pub temperature: i32,
    /// 16-bit humidity count
    pub humidity: i32,
}

impl RawSample {
    /// Decode the 8-byte burst read from 0xF7
    pub fn from_registers(data: &[u8; 8]) -> Self {
        let twenty_bit = |msb: u8, lsb: u8, xlsb: u8| {
            (i32::from(msb) << 12) | (i32::from(lsb) << 4) | i32::from((xlsb >> 4) & 0x0F)
        };

        Self {
            pressure: twenty_bit(data[0], data[1], data[2]),
            temperature: twenty_bit(data[3], data[4], data[5]),
            humidity: (i32::from(data[6]) << 8) | i32::from(data[7]),
        }
    }
}

/// Fine temperature shared by the pressure and humidity stages.
///
/// Only [`convert_temperature`] can produce one, and it is neither `Copy`
/// nor `Clone`. The pressure and humidity stages are crate-private and
/// reached through [`compensate`], which feeds them the fine value of the
/// sample being compensated.
///
/// ```compile_fail
/// use duckwatch_firmware::drivers::bme280::FineTemperature;
///
/// let forged = FineTemperature(128_422);
/// ```
///
/// A fine value kept from an earlier cycle cannot be applied to a later
/// pressure or humidity count:
///
/// ```compile_fail
/// use duckwatch_firmware::drivers::bme280::{compensation, convert_temperature, CalibrationSet};
///
/// let calibration = CalibrationSet::default();
/// let (_, earlier) = convert_temperature(400_000, &calibration);
/// let _ = compensation::convert_pressure(415_148, &calibration, &earlier);
/// let _ = compensation::convert_humidity(0x6A5C, &calibration, &earlier);
/// ```
#[derive(Debug, PartialEq, Eq)]
pub struct FineTemperature(i32);

impl FineTemperature {
    pub fn value(&self) -> i32 {
        self.0
    }
}

/// One cycle's compensated output
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompensatedReading {
    /// Pascal
    pub pressure: u32,
    /// Centi-degrees Celsius, 5123 = 51.23 °C
    pub temperature: i32,
    /// Q22.10 %RH, 47445 = 46.333 %RH
    pub humidity: u32,
}

/// Compensate a whole sample. Temperature runs first and its fine value
/// feeds the other two stages of the same cycle.
pub fn compensate(
    sample: &RawSample,
    calibration: &CalibrationSet,
    temperature_offset: i32,
) -> CompensatedReading {
    let (temperature, fine) = convert_temperature(sample.temperature, calibration);

    CompensatedReading {
        pressure: convert_pressure(sample.pressure, calibration, &fine),
        temperature: temperature.wrapping_sub(temperature_offset),
        humidity: convert_humidity(sample.humidity, calibration, &fine),
    }
}

/// Temperature in centi-degrees Celsius plus the fine temperature
pub fn convert_temperature(raw_temperature: i32, calibration: &CalibrationSet) -> (i32, FineTemperature) {
    let raw = Wrapping(raw_temperature);
    let t1 = Wrapping(i32::from(calibration.dig_t1));
    let t2 = Wrapping(i32::from(calibration.dig_t2));
    let t3 = Wrapping(i32::from(calibration.dig_t3));

    let var1 = (((raw >> 3) - (t1 << 1)) * t2) >> 11;
    let delta = (raw >> 4) - t1;
    let var2 = (((delta * delta) >> 12) * t3) >> 14;
    let fine = var1 + var2;

    let centi = (fine * Wrapping(5) + Wrapping(128)) >> 8;
    (centi.0, FineTemperature(fine.0))
}

/// Pressure in Pascal
pub(crate) fn convert_pressure(raw_pressure: i32, calibration: &CalibrationSet, fine: &FineTemperature) -> u32 {
    pressure_q24_8(raw_pressure, calibration, fine) >> 8
}

/// Pressure in Q24.8 Pascal, 24674867 = 96386.2 Pa.
///
/// The raw count is narrowed by four bits before use. A zero first-stage
/// denominator yields 0 instead of dividing, as does a result outside the
/// `u32` range.
pub(crate) fn pressure_q24_8(raw_pressure: i32, calibration: &CalibrationSet, fine: &FineTemperature) -> u32 {
    let raw = Wrapping(i64::from(raw_pressure >> 4));
    let p1 = Wrapping(i64::from(calibration.dig_p1));
    let p2 = Wrapping(i64::from(calibration.dig_p2));
    let p3 = Wrapping(i64::from(calibration.dig_p3));
    let p4 = Wrapping(i64::from(calibration.dig_p4));
    let p5 = Wrapping(i64::from(calibration.dig_p5));
    let p6 = Wrapping(i64::from(calibration.dig_p6));
    let p7 = Wrapping(i64::from(calibration.dig_p7));
    let p8 = Wrapping(i64::from(calibration.dig_p8));
    let p9 = Wrapping(i64::from(calibration.dig_p9));

    let mut var1 = Wrapping(i64::from(fine.0)) - Wrapping(128_000);
    let mut var2 = var1 * var1 * p6;
    var2 += (var1 * p5) << 17;
    var2 += p4 << 35;
    var1 = ((var1 * var1 * p3) >> 8) + ((var1 * p2) << 12);
    var1 = (((Wrapping(1i64) << 47) + var1) * p1) >> 33;

    if var1.0 == 0 {
        return 0;
    }

    let mut p = Wrapping(1_048_576i64) - raw;
    p = (((p << 31) - var2) * Wrapping(3125)) / var1;
    var1 = (p9 * (p >> 13) * (p >> 13)) >> 25;
    var2 = (p8 * p) >> 19;
    p = ((p + var1 + var2) >> 8) + (p7 << 4);

    u32::try_from(p.0).unwrap_or(0)
}

/// Relative humidity in Q22.10 %RH, always within `0..=MAX_HUMIDITY`
pub(crate) fn convert_humidity(raw_humidity: i32, calibration: &CalibrationSet, fine: &FineTemperature) -> u32 {
    let raw = Wrapping(raw_humidity);
    let h1 = Wrapping(i32::from(calibration.dig_h1));
    let h2 = Wrapping(i32::from(calibration.dig_h2));
    let h3 = Wrapping(i32::from(calibration.dig_h3));
    let h4 = Wrapping(i32::from(calibration.dig_h4));
    let h5 = Wrapping(i32::from(calibration.dig_h5));
    let h6 = Wrapping(i32::from(calibration.dig_h6));

    let mut v = Wrapping(fine.0) - Wrapping(76_800);

    let offset = (((raw << 14) - (h4 << 20) - (h5 * v)) + Wrapping(16_384)) >> 15;
    let gain = ((((((v * h6) >> 10) * (((v * h3) >> 11) + Wrapping(32_768))) >> 10)
        + Wrapping(2_097_152))
        * h2
        + Wrapping(8_192))
        >> 14;
    v = offset * gain;
    v -= ((((v >> 15) * (v >> 15)) >> 7) * h1) >> 4;

    (v.0.clamp(0, HUMIDITY_CEILING) >> 12) as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drivers::bme280::calibration::tests::reference;

    const RAW_TEMPERATURE: i32 = 519_888;
    const RAW_PRESSURE: i32 = 415_148 << 4;
    const RAW_HUMIDITY: i32 = 0x6A5C;

    #[test]
    fn temperature_matches_reference_vector() {
        let (temperature, fine) = convert_temperature(RAW_TEMPERATURE, &reference());
        assert_eq!(temperature, 2508);
        assert_eq!(fine.value(), 128_422);
    }

    #[test]
    fn temperature_below_freezing_rounds_toward_negative_infinity() {
        let (temperature, fine) = convert_temperature(400_000, &reference());
        assert_eq!(temperature, -1264);
        assert_eq!(fine.value(), -64_736);
    }

    #[test]
    fn temperature_is_deterministic() {
        let calibration = reference();
        for raw in [0, 1, 400_000, RAW_TEMPERATURE, 0xFFFFF] {
            let (first, fine_a) = convert_temperature(raw, &calibration);
            let (second, fine_b) = convert_temperature(raw, &calibration);
            assert_eq!(first, second);
            assert_eq!(fine_a, fine_b);
        }
    }

    #[test]
    fn pressure_matches_reference_vector() {
        let calibration = reference();
        let (_, fine) = convert_temperature(RAW_TEMPERATURE, &calibration);

        assert_eq!(pressure_q24_8(RAW_PRESSURE, &calibration, &fine), 25_767_233);
        assert_eq!(convert_pressure(RAW_PRESSURE, &calibration, &fine), 100_653);
    }

    #[test]
    fn pressure_uses_narrowed_raw_count() {
        let calibration = reference();
        let (_, fine) = convert_temperature(RAW_TEMPERATURE, &calibration);

        assert_eq!(pressure_q24_8(415_148, &calibration, &fine), 43_165_109);
        assert_eq!(convert_pressure(415_148, &calibration, &fine), 168_613);
    }

    #[test]
    fn pressure_zero_denominator_yields_zero() {
        let calibration = CalibrationSet {
            dig_p1: 0,
            ..reference()
        };
        let (_, fine) = convert_temperature(RAW_TEMPERATURE, &calibration);

        assert_eq!(convert_pressure(RAW_PRESSURE, &calibration, &fine), 0);
        assert_eq!(convert_pressure(0, &calibration, &fine), 0);
    }

    #[test]
    fn pressure_out_of_range_yields_zero() {
        let (_, fine) = convert_temperature(RAW_TEMPERATURE, &reference());

        // Stage result of -366407750
        let negative = CalibrationSet {
            dig_p1: 2000,
            dig_p9: -32768,
            ..reference()
        };
        assert_eq!(pressure_q24_8(RAW_PRESSURE, &negative, &fine), 0);
        assert_eq!(convert_pressure(RAW_PRESSURE, &negative, &fine), 0);

        // Stage result of 914067049317
        let oversized = CalibrationSet {
            dig_p1: 1,
            dig_p9: -32768,
            ..reference()
        };
        assert_eq!(pressure_q24_8(RAW_PRESSURE, &oversized, &fine), 0);
    }

    #[test]
    fn humidity_matches_reference_vector() {
        let calibration = reference();
        let (_, fine) = convert_temperature(RAW_TEMPERATURE, &calibration);

        assert_eq!(convert_humidity(RAW_HUMIDITY, &calibration, &fine), 40_495);
        assert_eq!(convert_humidity(0, &calibration, &fine), 0);
        assert_eq!(convert_humidity(0xFFFF, &calibration, &fine), MAX_HUMIDITY);
    }

    #[test]
    fn humidity_stays_in_range_for_every_raw_count() {
        let calibration = reference();
        for raw_temperature in [0, 400_000, RAW_TEMPERATURE, 600_000, 0xFFFFF] {
            let (_, fine) = convert_temperature(raw_temperature, &calibration);
            for raw in 0..=0xFFFF {
                assert!(convert_humidity(raw, &calibration, &fine) <= MAX_HUMIDITY);
            }
        }
    }

    #[test]
    fn compensate_runs_all_stages_on_one_sample() {
        let sample = RawSample {
            pressure: RAW_PRESSURE,
            temperature: RAW_TEMPERATURE,
            humidity: RAW_HUMIDITY,
        };

        let reading = compensate(&sample, &reference(), 278);
        assert_eq!(
            reading,
            CompensatedReading {
                pressure: 100_653,
                temperature: 2230,
                humidity: 40_495,
            }
        );
    }

    #[test]
    fn compensate_follows_the_temperature_of_its_own_sample() {
        let calibration = reference();
        let cold = RawSample {
            pressure: RAW_PRESSURE,
            temperature: 400_000,
            humidity: RAW_HUMIDITY,
        };
        let warm = RawSample {
            temperature: 600_000,
            ..cold
        };

        assert_eq!(compensate(&cold, &calibration, 0).pressure, 94_916);
        assert_eq!(compensate(&cold, &calibration, 0).humidity, 40_187);
        assert_eq!(compensate(&warm, &calibration, 0).pressure, 104_527);
        assert_eq!(compensate(&warm, &calibration, 0).humidity, 40_393);
    }

    #[test]
    fn raw_sample_decodes_burst() {
        let sample = RawSample::from_registers(&[0x65, 0x5A, 0xC0, 0x7E, 0xED, 0x00, 0x6A, 0x5C]);
        assert_eq!(sample.pressure, 415_148);
        assert_eq!(sample.temperature, RAW_TEMPERATURE);
        assert_eq!(sample.humidity, RAW_HUMIDITY);
    }
}
