//! Single-conversion ADC

use avr_device::atmega328p::ADC;
use core::convert::Infallible;
use embedded_hal::adc::{Channel, OneShot};

#[derive(Clone, Copy)]
#[repr(u8)]
pub enum AdcReference {
    Aref = 0,          // External AREF
    Avcc = 1,          // AVCC with external cap at AREF
    Internal1_1V = 3,  // Internal 1.1V with external cap at AREF
}

#[derive(Clone, Copy)]
#[repr(u8)]
pub enum AdcPrescaler {
    Div2 = 1,
    Div4 = 2,
    Div8 = 3,
    Div16 = 4,
    Div32 = 5,
    Div64 = 6,
    Div128 = 7,
}

// ADCSRA bits
const ADEN: u8 = 1 << 7;
const ADSC: u8 = 1 << 6;

const MUX_MASK: u8 = 0x0F;

pub struct Adc {
    adc: ADC,
    /// Channel of the conversion in progress
    converting: Option<u8>,
}

impl Adc {
    pub fn new(adc: ADC, reference: AdcReference, prescaler: AdcPrescaler) -> Self {
        unsafe {
            adc.adcsrb.write(|w| w.bits(0));
            adc.admux.write(|w| w.bits((reference as u8) << 6));
            adc.adcsra.write(|w| w.bits(ADEN | prescaler as u8));
        }
        Self {
            adc,
            converting: None,
        }
    }
}

macro_rules! adc_channels {
    ($($name:ident => $id:expr),+ $(,)?) => {
        $(
            pub struct $name;

            impl Channel<Adc> for $name {
                type ID = u8;

                fn channel() -> u8 {
                    $id
                }
            }
        )+
    };
}

adc_channels!(
    Adc0 => 0,
    Adc1 => 1,
    Adc2 => 2,
    Adc3 => 3,
    Adc4 => 4,
    Adc5 => 5,
);

impl<PIN> OneShot<Adc, u16, PIN> for Adc
where
    PIN: Channel<Adc, ID = u8>,
{
    type Error = Infallible;

    fn read(&mut self, _pin: &mut PIN) -> nb::Result<u16, Infallible> {
        let channel = PIN::channel();
        if let Some(active) = self.converting {
            if self.adc.adcsra.read().bits() & ADSC != 0 {
                return Err(nb::Error::WouldBlock);
            }
            self.converting = None;
            if active == channel {
                return Ok(self.adc.adc.read().bits());
            }
        }

        unsafe {
            self.adc.admux.modify(|r, w| w.bits((r.bits() & !MUX_MASK) | channel));
            self.adc.adcsra.modify(|r, w| w.bits(r.bits() | ADSC));
        }
        self.converting = Some(channel);
        Err(nb::Error::WouldBlock)
    }
}
