//! Register access for devices on the two-wire bus

use embedded_hal::blocking::i2c::{Write, WriteRead};

/// Registers per write transaction
const MAX_BURST: usize = 8;

/// A device at a fixed 7-bit address exposing byte-wide registers
pub struct RegisterDevice<I2C> {
    i2c: I2C,
    address: u8,
}

impl<I2C, E> RegisterDevice<I2C>
where
    I2C: Write<Error = E> + WriteRead<Error = E>,
{
    pub fn new(i2c: I2C, address: u8) -> Self {
        Self { i2c, address }
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    /// Address-only transfer, true when the device acknowledges
    pub fn ping(&mut self) -> bool {
        self.i2c.write(self.address, &[]).is_ok()
    }

    pub fn write_register(&mut self, register: u8, value: u8) -> Result<(), E> {
        self.i2c.write(self.address, &[register, value])
    }

    /// Write consecutive registers starting at `register`.
    ///
    /// Each value is sent with its own register address, so devices without
    /// write auto-increment accept the burst too.
    pub fn write_registers(&mut self, register: u8, values: &[u8]) -> Result<(), E> {
        let mut buffer = [0u8; MAX_BURST * 2];
        let mut next = register;

        for chunk in values.chunks(MAX_BURST) {
            for (pair, value) in buffer.chunks_exact_mut(2).zip(chunk) {
                pair[0] = next;
                pair[1] = *value;
                next = next.wrapping_add(1);
            }
            self.i2c.write(self.address, &buffer[..chunk.len() * 2])?;
        }
        Ok(())
    }

    pub fn read_register(&mut self, register: u8) -> Result<u8, E> {
        let mut value = [0u8; 1];
        self.i2c.write_read(self.address, &[register], &mut value)?;
        Ok(value[0])
    }

    /// Burst read into `buffer` starting at `register`
    pub fn read_registers(&mut self, register: u8, buffer: &mut [u8]) -> Result<(), E> {
        self.i2c.write_read(self.address, &[register], buffer)
    }

    /// Give the bus back
    pub fn release(self) -> I2C {
        self.i2c
    }
}
