//! TWI (I2C) master for the ATmega328P
//!
//! Every handshake step polls TWINT a bounded number of times; running out
//! is reported as [`TwiError::Timeout`] and the bus is released with a STOP.

use avr_device::atmega328p::TWI;
use embedded_hal::blocking::i2c::{Read, Write, WriteRead};

use crate::config;

/// TWI status codes
#[derive(Clone, Copy, PartialEq)]
#[repr(u8)]
pub enum TwiStatus {
    StartTransmitted = 0x08,
    RepStartTransmitted = 0x10,
    AddrWriteAck = 0x18,
    AddrWriteNack = 0x20,
    DataWriteAck = 0x28,
    DataWriteNack = 0x30,
    ArbitrationLost = 0x38,
    AddrReadAck = 0x40,
    AddrReadNack = 0x48,
    DataReadAck = 0x50,
    DataReadNack = 0x58,
}

// TWCR bits
const TWINT: u8 = 0x80;
const TWEA: u8 = 0x40;
const TWSTA: u8 = 0x20;
const TWSTO: u8 = 0x10;
const TWEN: u8 = 0x04;

const STATUS_MASK: u8 = 0xF8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TwiError {
    /// TWINT never set within the poll budget
    Timeout,
    /// Unexpected status after a handshake step
    Status(u8),
}

pub struct Twi {
    twi: TWI,
}

impl Twi {
    /// Master at `scl_hz`, prescaler 1
    pub fn new(twi: TWI, scl_hz: u32) -> Self {
        let bitrate = ((config::CPU_FREQ_HZ / scl_hz).saturating_sub(16) / 2) as u8;
        unsafe {
            twi.twsr.write(|w| w.bits(0));
            twi.twbr.write(|w| w.bits(bitrate));
            twi.twcr.write(|w| w.bits(TWEN));
        }
        Self { twi }
    }

    fn wait(&mut self) -> Result<u8, TwiError> {
        for _ in 0..config::TWI_TIMEOUT_POLLS {
            if self.twi.twcr.read().bits() & TWINT != 0 {
                return Ok(self.twi.twsr.read().bits() & STATUS_MASK);
            }
        }
        Err(TwiError::Timeout)
    }

    fn check_status(&mut self, expected: TwiStatus) -> Result<(), TwiError> {
        let status = self.wait()?;
        if status == expected as u8 {
            Ok(())
        } else {
            Err(TwiError::Status(status))
        }
    }

    fn start(&mut self, repeated: bool) -> Result<(), TwiError> {
        unsafe {
            self.twi.twcr.write(|w| w.bits(TWINT | TWSTA | TWEN));
        }
        self.check_status(if repeated {
            TwiStatus::RepStartTransmitted
        } else {
            TwiStatus::StartTransmitted
        })
    }

    fn stop(&mut self) {
        unsafe {
            self.twi.twcr.write(|w| w.bits(TWINT | TWSTO | TWEN));
        }
        for _ in 0..config::TWI_TIMEOUT_POLLS {
            if self.twi.twcr.read().bits() & TWSTO == 0 {
                break;
            }
        }
    }

    fn transmit(&mut self, byte: u8, expected: TwiStatus) -> Result<(), TwiError> {
        unsafe {
            self.twi.twdr.write(|w| w.bits(byte));
            self.twi.twcr.write(|w| w.bits(TWINT | TWEN));
        }
        self.check_status(expected)
    }

    fn receive(&mut self, ack: bool) -> Result<u8, TwiError> {
        let (control, expected) = if ack {
            (TWINT | TWEA | TWEN, TwiStatus::DataReadAck)
        } else {
            (TWINT | TWEN, TwiStatus::DataReadNack)
        };
        unsafe {
            self.twi.twcr.write(|w| w.bits(control));
        }
        self.check_status(expected)?;
        Ok(self.twi.twdr.read().bits())
    }

    fn write_frame(&mut self, address: u8, bytes: &[u8], repeated: bool) -> Result<(), TwiError> {
        self.start(repeated)?;
        self.transmit(address << 1, TwiStatus::AddrWriteAck)?;
        for &byte in bytes {
            self.transmit(byte, TwiStatus::DataWriteAck)?;
        }
        Ok(())
    }

    fn read_frame(&mut self, address: u8, buffer: &mut [u8], repeated: bool) -> Result<(), TwiError> {
        self.start(repeated)?;
        self.transmit((address << 1) | 1, TwiStatus::AddrReadAck)?;
        let last = buffer.len().saturating_sub(1);
        for (i, byte) in buffer.iter_mut().enumerate() {
            *byte = self.receive(i != last)?;
        }
        Ok(())
    }

    /// Always leave the bus idle, whatever the outcome
    fn finish<T>(&mut self, result: Result<T, TwiError>) -> Result<T, TwiError> {
        self.stop();
        result
    }
}

impl Write for Twi {
    type Error = TwiError;

    fn write(&mut self, address: u8, bytes: &[u8]) -> Result<(), TwiError> {
        let result = self.write_frame(address, bytes, false);
        self.finish(result)
    }
}

impl Read for Twi {
    type Error = TwiError;

    fn read(&mut self, address: u8, buffer: &mut [u8]) -> Result<(), TwiError> {
        let result = self.read_frame(address, buffer, false);
        self.finish(result)
    }
}

impl WriteRead for Twi {
    type Error = TwiError;

    fn write_read(&mut self, address: u8, bytes: &[u8], buffer: &mut [u8]) -> Result<(), TwiError> {
        let result = self
            .write_frame(address, bytes, false)
            .and_then(|_| self.read_frame(address, buffer, true));
        self.finish(result)
    }
}
