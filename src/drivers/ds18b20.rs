//! DS18B20 digital thermometer, one sensor per bus
//!
//! Each task starts a new conversion and then reads the scratchpad. The
//! station loop runs slower than the 750 ms conversion time, so the value
//! read is the one converted during the previous run.

use super::one_wire::{crc8, OneWire};
use crate::units;

const CMD_SKIP_ROM: u8 = 0xCC;
const CMD_CONVERT_T: u8 = 0x44;
const CMD_READ_SCRATCHPAD: u8 = 0xBE;

const SCRATCHPAD_LEN: usize = 9;

#[derive(Debug, Clone, Copy)]
pub enum Ds18b20Error<E> {
    Bus(E),
    /// No presence pulse after reset
    NoPresence,
    CrcMismatch,
}

impl<E> From<E> for Ds18b20Error<E> {
    fn from(error: E) -> Self {
        Ds18b20Error::Bus(error)
    }
}

/// Raw 12-bit reading, 1/16 °C per count
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Temperature {
    raw: i16,
}

impl Temperature {
    pub fn from_raw(raw: i16) -> Self {
        Self { raw }
    }

    pub fn raw(&self) -> i16 {
        self.raw
    }

    /// 2506 = 25.06 °C
    pub fn centi_celsius(&self) -> i32 {
        let raw = i32::from(self.raw);
        raw * 6 + raw / 4
    }

    pub fn centi_fahrenheit(&self) -> i32 {
        units::centi_celsius_to_fahrenheit(self.centi_celsius())
    }
}

pub struct Ds18b20<B> {
    bus: B,
    last: Option<Temperature>,
}

impl<B: OneWire> Ds18b20<B> {
    pub fn new(bus: B) -> Self {
        Self { bus, last: None }
    }

    /// Start a conversion and read back the previous result
    pub fn task(&mut self) -> Result<Temperature, Ds18b20Error<B::Error>> {
        self.start_conversion()?;
        self.read_temperature()
    }

    pub fn start_conversion(&mut self) -> Result<(), Ds18b20Error<B::Error>> {
        self.select()?;
        self.bus.write_byte(CMD_CONVERT_T)?;
        Ok(())
    }

    pub fn read_temperature(&mut self) -> Result<Temperature, Ds18b20Error<B::Error>> {
        let scratchpad = self.read_scratchpad()?;
        let temperature = Temperature::from_raw(i16::from_le_bytes([scratchpad[0], scratchpad[1]]));

        self.last = Some(temperature);
        Ok(temperature)
    }

    pub fn read_scratchpad(&mut self) -> Result<[u8; SCRATCHPAD_LEN], Ds18b20Error<B::Error>> {
        self.select()?;
        self.bus.write_byte(CMD_READ_SCRATCHPAD)?;

        let mut scratchpad = [0u8; SCRATCHPAD_LEN];
        for byte in scratchpad.iter_mut() {
            *byte = self.bus.read_byte()?;
        }

        if crc8(&scratchpad) != 0 {
            return Err(Ds18b20Error::CrcMismatch);
        }
        Ok(scratchpad)
    }

    /// Most recent successful reading
    pub fn last_temperature(&self) -> Option<Temperature> {
        self.last
    }

    pub fn release(self) -> B {
        self.bus
    }

    fn select(&mut self) -> Result<(), Ds18b20Error<B::Error>> {
        if !self.bus.reset()? {
            return Err(Ds18b20Error::NoPresence);
        }
        self.bus.write_byte(CMD_SKIP_ROM)?;
        Ok(())
    }
}
