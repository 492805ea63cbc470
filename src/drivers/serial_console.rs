//! Blocking text output over a serial port

use embedded_hal::serial::Write;
use ufmt::uWrite;

pub struct SerialConsole<U> {
    uart: U,
}

impl<U: Write<u8>> SerialConsole<U> {
    pub fn new(uart: U) -> Self {
        Self { uart }
    }

    pub fn write_byte(&mut self, byte: u8) -> Result<(), U::Error> {
        nb::block!(self.uart.write(byte))
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), U::Error> {
        for &byte in bytes {
            self.write_byte(byte)?;
        }
        Ok(())
    }

    pub fn write_line(&mut self, s: &str) -> Result<(), U::Error> {
        self.write_bytes(s.as_bytes())?;
        self.write_bytes(b"\r\n")
    }

    // Debug helper - print hex value
    pub fn write_hex(&mut self, val: u8) -> Result<(), U::Error> {
        const HEX_CHARS: [u8; 16] = *b"0123456789ABCDEF";
        self.write_byte(HEX_CHARS[(val >> 4) as usize])?;
        self.write_byte(HEX_CHARS[(val & 0xF) as usize])
    }

    /// Wait until the last byte has left the transmitter
    pub fn flush(&mut self) -> Result<(), U::Error> {
        nb::block!(self.uart.flush())
    }

    pub fn release(self) -> U {
        self.uart
    }
}

impl<U: Write<u8>> uWrite for SerialConsole<U> {
    type Error = U::Error;

    fn write_str(&mut self, s: &str) -> Result<(), Self::Error> {
        self.write_bytes(s.as_bytes())
    }
}
