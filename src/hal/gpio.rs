//! Typed GPIO pins for the ATmega328P

use avr_device::atmega328p::{PORTB, PORTC, PORTD};
use core::convert::Infallible;
use core::marker::PhantomData;
use embedded_hal::digital::v2::{InputPin, OutputPin};

use crate::config;

pub trait PinMode {}
pub struct Input;
pub struct Output;
/// Driven low, or released to the pull-up for high
pub struct OpenDrain;
impl PinMode for Input {}
impl PinMode for Output {}
impl PinMode for OpenDrain {}

#[derive(Debug)]
pub struct Pin<PORT, const P: u8, MODE> {
    _port: PhantomData<PORT>,
    _mode: PhantomData<MODE>,
}

impl<PORT, const P: u8> Pin<PORT, P, Input> {
    /// Pins come up as floating inputs after reset. Board setup takes each
    /// pin exactly once.
    pub const fn new() -> Self {
        Pin {
            _port: PhantomData,
            _mode: PhantomData,
        }
    }
}

impl<PORT, const P: u8, MODE> Pin<PORT, P, MODE> {
    const fn into_mode<M>(self) -> Pin<PORT, P, M> {
        Pin {
            _port: PhantomData,
            _mode: PhantomData,
        }
    }
}

macro_rules! impl_port {
    ($PORT:ident, $port:ident, $ddr:ident, $pin:ident) => {
        impl<const P: u8, MODE: PinMode> Pin<$PORT, P, MODE> {
            pub fn into_output(self) -> Pin<$PORT, P, Output> {
                // Set DDRx bit
                unsafe {
                    (*$PORT::ptr()).$ddr.modify(|r, w| w.bits(r.bits() | (1 << P)));
                }
                self.into_mode()
            }

            pub fn into_input(self) -> Pin<$PORT, P, Input> {
                // Clear DDRx bit and disable pull-up
                unsafe {
                    (*$PORT::ptr()).$ddr.modify(|r, w| w.bits(r.bits() & !(1 << P)));
                    (*$PORT::ptr()).$port.modify(|r, w| w.bits(r.bits() & !(1 << P)));
                }
                self.into_mode()
            }

            pub fn into_pull_up_input(self) -> Pin<$PORT, P, Input> {
                unsafe {
                    (*$PORT::ptr()).$ddr.modify(|r, w| w.bits(r.bits() & !(1 << P)));
                    (*$PORT::ptr()).$port.modify(|r, w| w.bits(r.bits() | (1 << P)));
                }
                self.into_mode()
            }

            /// Starts released
            pub fn into_open_drain(self) -> Pin<$PORT, P, OpenDrain> {
                unsafe {
                    (*$PORT::ptr()).$port.modify(|r, w| w.bits(r.bits() & !(1 << P)));
                    (*$PORT::ptr()).$ddr.modify(|r, w| w.bits(r.bits() & !(1 << P)));
                }
                self.into_mode()
            }

            fn level() -> bool {
                unsafe { (*$PORT::ptr()).$pin.read().bits() & (1 << P) != 0 }
            }
        }

        impl<const P: u8> OutputPin for Pin<$PORT, P, Output> {
            type Error = Infallible;

            fn set_high(&mut self) -> Result<(), Infallible> {
                unsafe {
                    (*$PORT::ptr()).$port.modify(|r, w| w.bits(r.bits() | (1 << P)));
                }
                Ok(())
            }

            fn set_low(&mut self) -> Result<(), Infallible> {
                unsafe {
                    (*$PORT::ptr()).$port.modify(|r, w| w.bits(r.bits() & !(1 << P)));
                }
                Ok(())
            }
        }

        impl<const P: u8> InputPin for Pin<$PORT, P, Input> {
            type Error = Infallible;

            fn is_high(&self) -> Result<bool, Infallible> {
                Ok(Self::level())
            }

            fn is_low(&self) -> Result<bool, Infallible> {
                Ok(!Self::level())
            }
        }

        // PORTx stays low; only the direction bit moves
        impl<const P: u8> OutputPin for Pin<$PORT, P, OpenDrain> {
            type Error = Infallible;

            fn set_high(&mut self) -> Result<(), Infallible> {
                unsafe {
                    (*$PORT::ptr()).$ddr.modify(|r, w| w.bits(r.bits() & !(1 << P)));
                }
                Ok(())
            }

            fn set_low(&mut self) -> Result<(), Infallible> {
                unsafe {
                    (*$PORT::ptr()).$ddr.modify(|r, w| w.bits(r.bits() | (1 << P)));
                }
                Ok(())
            }
        }

        impl<const P: u8> InputPin for Pin<$PORT, P, OpenDrain> {
            type Error = Infallible;

            fn is_high(&self) -> Result<bool, Infallible> {
                Ok(Self::level())
            }

            fn is_low(&self) -> Result<bool, Infallible> {
                Ok(!Self::level())
            }
        }
    };
}

impl_port!(PORTB, portb, ddrb, pinb);
impl_port!(PORTC, portc, ddrc, pinc);
impl_port!(PORTD, portd, ddrd, pind);

/// Read all eight input levels of PORTD at once
pub fn portd_levels() -> u8 {
    unsafe { (*PORTD::ptr()).pind.read().bits() }
}

// DuckWatch board pin definitions
pub mod board {
    use super::*;

    pub type Lane1Pir = Pin<PORTD, { config::LANE_1_PIN }, Input>;
    pub type Lane2Pir = Pin<PORTD, { config::LANE_2_PIN }, Input>;
    pub type UvEnable = Pin<PORTD, { config::UV_ENABLE_PIN }, Output>;

    pub type TiltBall = Pin<PORTB, { config::TILT_BALL_PIN }, Input>;
    pub type SurfaceProbe = Pin<PORTB, { config::SURFACE_PROBE_PIN }, OpenDrain>;
    pub type UnderwaterProbe = Pin<PORTB, { config::UNDERWATER_PROBE_PIN }, OpenDrain>;

    /// PIR outputs are push-pull, no pull-up
    pub fn lane_inputs() -> (Lane1Pir, Lane2Pir) {
        (Lane1Pir::new().into_input(), Lane2Pir::new().into_input())
    }

    pub fn uv_enable() -> UvEnable {
        Pin::<PORTD, { config::UV_ENABLE_PIN }, Input>::new().into_output()
    }

    pub fn tilt_ball() -> TiltBall {
        TiltBall::new().into_input()
    }

    /// Both probes rely on the external 4.7k pull-up
    pub fn surface_probe() -> SurfaceProbe {
        Pin::<PORTB, { config::SURFACE_PROBE_PIN }, Input>::new().into_open_drain()
    }

    pub fn underwater_probe() -> UnderwaterProbe {
        Pin::<PORTB, { config::UNDERWATER_PROBE_PIN }, Input>::new().into_open_drain()
    }
}
