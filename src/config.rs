//! Configuration constants for the DuckWatch station

/// CPU frequency in Hz, passed in by the build script
pub const CPU_FREQ_HZ: u32 = parse_hz(env!("MCU_FREQ_HZ"));

/// UART baud rate for the report and diagnostic link
pub const UART_BAUD: u32 = 9600;

/// TWI bus clock in Hz
pub const TWI_FREQ_HZ: u32 = 200_000;

/// Handshake polls before a TWI step counts as a bus failure
pub const TWI_TIMEOUT_POLLS: u16 = 10_000;

/// Verbose diagnostics default
pub const VERBOSE_DIAGNOSTICS: bool = cfg!(feature = "debug");

// BME280

/// 7-bit bus address of the BME280 (SDO tied high)
pub const BME280_ADDRESS: u8 = 0x77;

/// Board-specific temperature trim in centi-degrees Celsius
pub const BME280_TEMPERATURE_OFFSET: i32 = 278;

/// The BME280 task runs a full update every this many invocations
pub const BME280_TASK_DIVIDER: u8 = 5;

// Lane detection

/// PORTD bit of the lane 1 PIR output
pub const LANE_1_PIN: u8 = 7;

/// PORTD bit of the lane 2 PIR output
pub const LANE_2_PIN: u8 = 4;

/// Quiet ticks before a full lane is committed empty
pub const MIN_LANE_EMPTY_TICKS: u8 = 155;

/// Quiet ticks before an empty lane is committed full
pub const MIN_LANE_FULL_TICKS: u8 = 100;

/// PIR sensors need this long after power-up before their output is valid
pub const PIR_WARMUP_MS: u32 = 30_000;

// Supplemental sensors

/// PORTB bit of the surface DS18B20 data line
pub const SURFACE_PROBE_PIN: u8 = 3;

/// PORTB bit of the underwater DS18B20 data line
pub const UNDERWATER_PROBE_PIN: u8 = 2;

/// PORTB bit of the tilt ball switch
pub const TILT_BALL_PIN: u8 = 0;

/// PORTD bit driving the UV sensor enable line
pub const UV_ENABLE_PIN: u8 = 6;

/// ADC channel of the UV sensor output
pub const UV_ADC_CHANNEL: u8 = 0;

/// Tilted samples out of the last 32 above which the station is windy
pub const WIND_TILT_THRESHOLD: u32 = 15;

// Main loop

/// Delay between main loop runs
pub const LOOP_PERIOD_MS: u16 = 1000;

/// A report packet goes out every this many runs
pub const REPORT_INTERVAL_RUNS: u16 = 30;

const fn parse_hz(text: &str) -> u32 {
    let bytes = text.as_bytes();
    let mut value = 0u32;
    let mut i = 0;
    while i < bytes.len() {
        value = value * 10 + (bytes[i] - b'0') as u32;
        i += 1;
    }
    value
}
