//! USART0 in polled mode

use avr_device::atmega328p::USART0;
use core::convert::Infallible;
use embedded_hal::serial::{Read, Write};

use crate::config;

// UCSR0A bits
const RXC0: u8 = 1 << 7;
const TXC0: u8 = 1 << 6;
const UDRE0: u8 = 1 << 5;

// UCSR0B bits
const RXEN0: u8 = 1 << 4;
const TXEN0: u8 = 1 << 3;

// UCSR0C: asynchronous, 8 data bits, no parity, 1 stop bit
const FRAME_8N1: u8 = 0x06;

pub struct Uart {
    usart: USART0,
    /// A byte went out since the last completed flush
    in_flight: bool,
}

impl Uart {
    pub fn new(usart: USART0, baud: u32) -> Self {
        let ubrr = (config::CPU_FREQ_HZ / (16 * baud) - 1) as u16;
        unsafe {
            usart.ubrr0.write(|w| w.bits(ubrr));
            usart.ucsr0a.write(|w| w.bits(0));
            usart.ucsr0c.write(|w| w.bits(FRAME_8N1));
            usart.ucsr0b.write(|w| w.bits(RXEN0 | TXEN0));
        }
        Self {
            usart,
            in_flight: false,
        }
    }

    fn status(&self) -> u8 {
        self.usart.ucsr0a.read().bits()
    }
}

impl Write<u8> for Uart {
    type Error = Infallible;

    fn write(&mut self, byte: u8) -> nb::Result<(), Infallible> {
        if self.status() & UDRE0 == 0 {
            return Err(nb::Error::WouldBlock);
        }
        unsafe {
            // Writing TXC0 back clears it, so flush can wait for this byte
            self.usart.ucsr0a.modify(|r, w| w.bits(r.bits() | TXC0));
            self.usart.udr0.write(|w| w.bits(byte));
        }
        self.in_flight = true;
        Ok(())
    }

    fn flush(&mut self) -> nb::Result<(), Infallible> {
        if self.in_flight && self.status() & TXC0 == 0 {
            return Err(nb::Error::WouldBlock);
        }
        self.in_flight = false;
        Ok(())
    }
}

impl Read<u8> for Uart {
    type Error = Infallible;

    fn read(&mut self) -> nb::Result<u8, Infallible> {
        if self.status() & RXC0 == 0 {
            return Err(nb::Error::WouldBlock);
        }
        Ok(self.usart.udr0.read().bits())
    }
}
