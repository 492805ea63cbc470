//! Timer0 compare channels pacing the lane debounce
//!
//! Timer0 free-runs in normal mode. Both compare registers sit at 0xFF, so
//! each channel fires once per counter period: about 61 Hz with the /1024
//! prescaler at 16 MHz. Channel A ticks lane 1, channel B ticks lane 2.

use avr_device::atmega328p::TC0;

use crate::drivers::lane::Lane;

#[derive(Clone, Copy)]
pub enum Prescaler {
    Stop = 0,
    Direct = 1,
    Div8 = 2,
    Div64 = 3,
    Div256 = 4,
    Div1024 = 5,
}

const PRESCALER_MASK: u8 = 0x07;

// TIMSK0 / TIFR0 bits
const OCIE0A: u8 = 1 << 1;
const OCIE0B: u8 = 1 << 2;
const OCF0A: u8 = 1 << 1;
const OCF0B: u8 = 1 << 2;

const COMPARE_VALUE: u8 = 0xFF;

pub struct LaneTimer {
    tc0: TC0,
}

impl LaneTimer {
    pub fn new(tc0: TC0) -> Self {
        unsafe {
            // Normal mode, stopped
            tc0.tccr0a.write(|w| w.bits(0));
            tc0.tccr0b.write(|w| w.bits(0));
            tc0.tcnt0.write(|w| w.bits(0));
            tc0.ocr0a.write(|w| w.bits(COMPARE_VALUE));
            tc0.ocr0b.write(|w| w.bits(COMPARE_VALUE));
            // Flags clear by writing one
            tc0.tifr0.write(|w| w.bits(OCF0A | OCF0B));
        }
        Self { tc0 }
    }

    pub fn start(&mut self, prescaler: Prescaler) {
        unsafe {
            self.tc0.tccr0b.modify(|r, w| {
                w.bits((r.bits() & !PRESCALER_MASK) | (prescaler as u8 & PRESCALER_MASK))
            });
        }
    }

    pub fn enable_interrupts(&mut self) {
        unsafe {
            self.tc0.timsk0.modify(|r, w| w.bits(r.bits() | OCIE0A | OCIE0B));
        }
    }

    /// Drop a compare match already pending for `lane`, so the first tick
    /// after an edge is a full period away
    pub fn clear_pending(lane: Lane) {
        let flag = match lane {
            Lane::Lane1 => OCF0A,
            Lane::Lane2 => OCF0B,
        };
        unsafe {
            (*TC0::ptr()).tifr0.write(|w| w.bits(flag));
        }
    }
}
