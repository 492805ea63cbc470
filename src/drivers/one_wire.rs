//! Byte-level 1-Wire bus

use embedded_hal::blocking::delay::DelayUs;
use embedded_hal::digital::v2::{InputPin, OutputPin};

// Reset and presence detection
const IDLE_POLL_US: u16 = 2;
const IDLE_POLLS: u8 = 125;
const RESET_LOW_US: u16 = 480;
const PRESENCE_WAIT_US: u16 = 70;
const PRESENCE_RELEASE_US: u16 = 410;

// Write slots
const WRITE_1_LOW_US: u16 = 10;
const WRITE_1_HIGH_US: u16 = 55;
const WRITE_0_LOW_US: u16 = 65;
const WRITE_0_HIGH_US: u16 = 5;

// Read slot
const READ_INIT_LOW_US: u16 = 3;
const READ_SAMPLE_US: u16 = 10;
const READ_RECOVERY_US: u16 = 53;

/// Bus master operations used by the device drivers
pub trait OneWire {
    type Error;

    /// Reset pulse, true when a device answered with a presence pulse
    fn reset(&mut self) -> Result<bool, Self::Error>;

    /// LSB first
    fn write_byte(&mut self, byte: u8) -> Result<(), Self::Error>;

    /// LSB first
    fn read_byte(&mut self) -> Result<u8, Self::Error>;
}

/// Dallas/Maxim CRC8, zero over a block that ends in its own CRC
pub fn crc8(data: &[u8]) -> u8 {
    let mut crc = 0u8;
    for &byte in data {
        let mut input = byte;
        for _ in 0..8 {
            let mix = (crc ^ input) & 0x01;
            crc >>= 1;
            if mix != 0 {
                crc ^= 0x8C;
            }
            input >>= 1;
        }
    }
    crc
}

/// Bit-banged master on an open-drain pin. `set_high` releases the line to
/// the pull-up, `set_low` drives it.
pub struct BitBangOneWire<P, D> {
    pin: P,
    delay: D,
}

impl<P, D, E> BitBangOneWire<P, D>
where
    P: InputPin<Error = E> + OutputPin<Error = E>,
    D: DelayUs<u16>,
{
    pub fn new(pin: P, delay: D) -> Self {
        Self { pin, delay }
    }

    fn write_bit(&mut self, bit: bool) -> Result<(), E> {
        let (low, high) = if bit {
            (WRITE_1_LOW_US, WRITE_1_HIGH_US)
        } else {
            (WRITE_0_LOW_US, WRITE_0_HIGH_US)
        };

        self.pin.set_low()?;
        self.delay.delay_us(low);
        self.pin.set_high()?;
        self.delay.delay_us(high);
        Ok(())
    }

    fn read_bit(&mut self) -> Result<bool, E> {
        self.pin.set_low()?;
        self.delay.delay_us(READ_INIT_LOW_US);
        self.pin.set_high()?;
        self.delay.delay_us(READ_SAMPLE_US);
        let bit = self.pin.is_high()?;
        self.delay.delay_us(READ_RECOVERY_US);
        Ok(bit)
    }

    pub fn release(self) -> (P, D) {
        (self.pin, self.delay)
    }
}

impl<P, D, E> OneWire for BitBangOneWire<P, D>
where
    P: InputPin<Error = E> + OutputPin<Error = E>,
    D: DelayUs<u16>,
{
    type Error = E;

    fn reset(&mut self) -> Result<bool, E> {
        // A line held low by a stuck device never idles
        self.pin.set_high()?;
        let mut polls = IDLE_POLLS;
        while self.pin.is_low()? {
            polls -= 1;
            if polls == 0 {
                return Ok(false);
            }
            self.delay.delay_us(IDLE_POLL_US);
        }

        self.pin.set_low()?;
        self.delay.delay_us(RESET_LOW_US);
        self.pin.set_high()?;
        self.delay.delay_us(PRESENCE_WAIT_US);

        let present = self.pin.is_low()?;
        self.delay.delay_us(PRESENCE_RELEASE_US);
        Ok(present)
    }

    fn write_byte(&mut self, byte: u8) -> Result<(), E> {
        for i in 0..8 {
            self.write_bit(byte & (1 << i) != 0)?;
        }
        Ok(())
    }

    fn read_byte(&mut self) -> Result<u8, E> {
        let mut byte = 0u8;
        for i in 0..8 {
            if self.read_bit()? {
                byte |= 1 << i;
            }
        }
        Ok(byte)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal_mock::delay::MockNoop;
    use embedded_hal_mock::pin::{Mock as PinMock, State, Transaction};
    use std::vec::Vec;

    #[test]
    fn crc_of_rom_code() {
        let rom = [0x02, 0x1C, 0xB8, 0x01, 0x00, 0x00, 0x00, 0xA2];
        assert_eq!(crc8(&rom[..7]), 0xA2);
        assert_eq!(crc8(&rom), 0);
        assert_eq!(crc8(&[]), 0);
    }

    #[test]
    fn reset_detects_presence_pulse() {
        let expectations = [
            Transaction::set(State::High),
            Transaction::get(State::High),
            Transaction::set(State::Low),
            Transaction::set(State::High),
            Transaction::get(State::Low),
        ];
        let mut pin = PinMock::new(&expectations);
        let mut bus = BitBangOneWire::new(pin.clone(), MockNoop::new());

        assert!(matches!(bus.reset(), Ok(true)));
        pin.done();
    }

    #[test]
    fn reset_gives_up_on_stuck_line() {
        let mut expectations = Vec::new();
        expectations.push(Transaction::set(State::High));
        for _ in 0..IDLE_POLLS {
            expectations.push(Transaction::get(State::Low));
        }
        let mut pin = PinMock::new(&expectations);
        let mut bus = BitBangOneWire::new(pin.clone(), MockNoop::new());

        assert!(matches!(bus.reset(), Ok(false)));
        pin.done();
    }

    #[test]
    fn write_byte_sends_lsb_first() {
        // Every bit slot is a low pulse followed by a release
        let mut expectations = Vec::new();
        for _ in 0..8 {
            expectations.push(Transaction::set(State::Low));
            expectations.push(Transaction::set(State::High));
        }
        let mut pin = PinMock::new(&expectations);
        let mut bus = BitBangOneWire::new(pin.clone(), MockNoop::new());

        assert!(bus.write_byte(0xCC).is_ok());
        pin.done();
    }

    #[test]
    fn read_byte_samples_lsb_first() {
        let value = 0b1010_0110u8;
        let mut expectations = Vec::new();
        for i in 0..8 {
            expectations.push(Transaction::set(State::Low));
            expectations.push(Transaction::set(State::High));
            let level = if value & (1 << i) != 0 {
                State::High
            } else {
                State::Low
            };
            expectations.push(Transaction::get(level));
        }
        let mut pin = PinMock::new(&expectations);
        let mut bus = BitBangOneWire::new(pin.clone(), MockNoop::new());

        assert!(matches!(bus.read_byte(), Ok(0b1010_0110)));
        pin.done();
    }
}
