//! BME280 combined humidity, pressure and temperature sensor
//!
//! The driver owns its bus handle, reads the factory calibration once during
//! [`Bme280::init`] and afterwards turns each raw measurement burst into a
//! [`CompensatedReading`]. A failed read keeps the previous reading.

pub mod calibration;
pub mod compensation;

use embedded_hal::blocking::i2c::{Write, WriteRead};
use ufmt::uWrite;

use crate::config;
use crate::diagnostics::{subcode, Centi, Diagnostics, ErrorCode};
use crate::drivers::bus::RegisterDevice;
use crate::units;

pub use calibration::CalibrationSet;
pub use compensation::{
    compensate, convert_temperature, CompensatedReading, FineTemperature, RawSample,
};

// BME280 registers
const REG_CALIB_00: u8 = 0x88;
const REG_CALIB_26: u8 = 0xE1;
const REG_RESET: u8 = 0xE0;
const REG_CTRL_HUM: u8 = 0xF2;
const REG_CTRL_MEAS: u8 = 0xF4;
const REG_PRESS_MSB: u8 = 0xF7;

const RESET_POR: u8 = 0xB6;
const MODE_MASK: u8 = 0x03;

/// Per-channel oversampling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Oversampling {
    Skipped = 0b000,
    X1 = 0b001,
    X2 = 0b010,
    X4 = 0b011,
    X8 = 0b100,
    X16 = 0b101,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Sleep = 0b00,
    Forced = 0b01,
    Normal = 0b11,
}

/// Inactive time between measurements in normal mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Standby {
    Ms0_5 = 0b000,
    Ms62_5 = 0b001,
    Ms125 = 0b010,
    Ms250 = 0b011,
    Ms500 = 0b100,
    Ms1000 = 0b101,
    Ms10 = 0b110,
    Ms20 = 0b111,
}

/// IIR filter coefficient
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Filter {
    Off = 0b000,
    X2 = 0b001,
    X4 = 0b010,
    X8 = 0b011,
    X16 = 0b100,
}

/// Measurement configuration written during initialization
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settings {
    pub humidity: Oversampling,
    pub pressure: Oversampling,
    pub temperature: Oversampling,
    pub mode: Mode,
    pub standby: Standby,
    pub filter: Filter,
}

impl Settings {
    pub fn ctrl_hum(&self) -> u8 {
        self.humidity as u8
    }

    pub fn ctrl_meas(&self) -> u8 {
        ((self.temperature as u8) << 5) | ((self.pressure as u8) << 2) | self.mode as u8
    }

    /// 3-wire SPI stays disabled
    pub fn config(&self) -> u8 {
        ((self.standby as u8) << 5) | ((self.filter as u8) << 2)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            humidity: Oversampling::X1,
            pressure: Oversampling::X16,
            temperature: Oversampling::X1,
            mode: Mode::Normal,
            standby: Standby::Ms0_5,
            filter: Filter::Off,
        }
    }
}

/// Initialization step that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitStep {
    Presence,
    Configure,
    Calibration,
    InitialSample,
}

impl InitStep {
    /// Fault code reported when this step fails
    pub fn error_code(self) -> ErrorCode {
        match self {
            InitStep::Presence => ErrorCode::SensorError,
            InitStep::Configure | InitStep::InitialSample => ErrorCode::CommunicationError,
            InitStep::Calibration => ErrorCode::CalibrationError,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub enum Bme280Error<E> {
    /// Bus transfer failed
    Bus(E),
    /// Sensor has not been initialized successfully
    NotReady,
    InitFailed(InitStep),
}

impl<E> From<E> for Bme280Error<E> {
    fn from(error: E) -> Self {
        Bme280Error::Bus(error)
    }
}

pub struct Bme280<I2C> {
    device: RegisterDevice<I2C>,
    settings: Settings,
    calibration: CalibrationSet,
    raw: RawSample,
    reading: CompensatedReading,
    temperature_offset: i32,
    ready: bool,
    runs: u8,
}

impl<I2C, E> Bme280<I2C>
where
    I2C: Write<Error = E> + WriteRead<Error = E>,
{
    /// Create an uninitialized driver. Getters return zero until
    /// [`init`](Self::init) succeeds.
    pub fn new(i2c: I2C, address: u8, temperature_offset: i32) -> Self {
        Self::with_settings(i2c, address, temperature_offset, Settings::default())
    }

    pub fn with_settings(i2c: I2C, address: u8, temperature_offset: i32, settings: Settings) -> Self {
        Self {
            device: RegisterDevice::new(i2c, address),
            settings,
            calibration: CalibrationSet::default(),
            raw: RawSample::default(),
            reading: CompensatedReading::default(),
            temperature_offset,
            ready: false,
            runs: 0,
        }
    }

    /// Bring the sensor up: presence check, configuration, calibration and
    /// a first measurement. Nothing is retried; on failure the sensor stays
    /// not ready until `init` is called again.
    pub fn init(&mut self) -> Result<(), Bme280Error<E>> {
        self.ready = false;

        if !self.device.ping() {
            return Err(Bme280Error::InitFailed(InitStep::Presence));
        }
        self.configure()
            .map_err(|_| Bme280Error::InitFailed(InitStep::Configure))?;
        let calibration = self
            .read_calibration()
            .map_err(|_| Bme280Error::InitFailed(InitStep::Calibration))?;
        let sample = self
            .read_raw_sample()
            .map_err(|_| Bme280Error::InitFailed(InitStep::InitialSample))?;

        self.calibration = calibration;
        self.reading = compensate(&sample, &self.calibration, self.temperature_offset);
        self.ready = true;
        Ok(())
    }

    /// Write the humidity, measurement and config registers
    fn configure(&mut self) -> Result<(), E> {
        // ctrl_hum only latches on the following ctrl_meas write
        self.device.write_register(REG_CTRL_HUM, self.settings.ctrl_hum())?;
        self.device
            .write_registers(REG_CTRL_MEAS, &[self.settings.ctrl_meas(), self.settings.config()])
    }

    /// Read both calibration blocks. Nothing is stored here.
    pub fn read_calibration(&mut self) -> Result<CalibrationSet, Bme280Error<E>> {
        let mut block_1 = [0u8; calibration::BLOCK_1_LEN];
        let mut block_2 = [0u8; calibration::BLOCK_2_LEN];

        self.device.read_registers(REG_CALIB_00, &mut block_1)?;
        self.device.read_registers(REG_CALIB_26, &mut block_2)?;

        Ok(CalibrationSet::from_registers(&block_1, &block_2))
    }

    /// Burst-read one measurement. The held raw sample only changes when
    /// the whole burst succeeds.
    pub fn read_raw_sample(&mut self) -> Result<RawSample, Bme280Error<E>> {
        let mut data = [0u8; 8];
        self.device.read_registers(REG_PRESS_MSB, &mut data)?;

        self.raw = RawSample::from_registers(&data);
        Ok(self.raw)
    }

    /// Read and compensate a fresh measurement
    pub fn update(&mut self) -> Result<CompensatedReading, Bme280Error<E>> {
        if !self.ready {
            return Err(Bme280Error::NotReady);
        }

        let sample = self.read_raw_sample()?;
        self.reading = compensate(&sample, &self.calibration, self.temperature_offset);
        Ok(self.reading)
    }

    /// Periodic entry point. The first call and every
    /// `BME280_TASK_DIVIDER`-th call after it perform an update; returns
    /// true when a fresh reading was stored.
    pub fn task<W: uWrite>(&mut self, diag: &mut Diagnostics<W>) -> bool {
        let due = self.runs == 0;
        self.runs = (self.runs + 1) % config::BME280_TASK_DIVIDER;
        if !due {
            return false;
        }

        match self.update() {
            Ok(reading) => {
                trace!(
                    diag,
                    "BME280 T: {} C / {} F P: {} Pa H: {} %RH\r\n",
                    Centi(reading.temperature),
                    Centi(units::centi_celsius_to_fahrenheit(reading.temperature)),
                    reading.pressure,
                    Centi(units::humidity_to_centi_percent(reading.humidity) as i32)
                );
                true
            }
            Err(Bme280Error::NotReady) => {
                diag!(diag, "BME280 not initialized\r\n");
                false
            }
            Err(_) => {
                diag.report(ErrorCode::CommunicationError, subcode::BME280);
                false
            }
        }
    }

    /// Power-on reset. The sensor must be initialized again afterwards.
    pub fn reset(&mut self) -> Result<(), Bme280Error<E>> {
        self.ready = false;
        self.device.write_register(REG_RESET, RESET_POR)?;
        Ok(())
    }

    pub fn set_mode(&mut self, mode: Mode) -> Result<(), Bme280Error<E>> {
        let ctrl_hum = self.device.read_register(REG_CTRL_HUM)?;
        self.device.write_register(REG_CTRL_HUM, ctrl_hum)?;

        let ctrl_meas = self.device.read_register(REG_CTRL_MEAS)?;
        self.device
            .write_register(REG_CTRL_MEAS, (ctrl_meas & !MODE_MASK) | mode as u8)?;

        self.settings.mode = mode;
        Ok(())
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    pub fn reading(&self) -> CompensatedReading {
        self.reading
    }

    /// Pascal
    pub fn pressure(&self) -> u32 {
        self.reading.pressure
    }

    /// Centi-degrees Celsius
    pub fn temperature(&self) -> i32 {
        self.reading.temperature
    }

    /// Q22.10 %RH
    pub fn humidity(&self) -> u32 {
        self.reading.humidity
    }

    pub fn raw_sample(&self) -> RawSample {
        self.raw
    }

    pub fn calibration(&self) -> &CalibrationSet {
        &self.calibration
    }

    pub fn settings(&self) -> Settings {
        self.settings
    }

    pub fn temperature_offset(&self) -> i32 {
        self.temperature_offset
    }

    /// Takes effect on the next update
    pub fn set_temperature_offset(&mut self, offset: i32) {
        self.temperature_offset = offset;
    }

    pub fn address(&self) -> u8 {
        self.device.address()
    }

    pub fn release(self) -> I2C {
        self.device.release()
    }
}
