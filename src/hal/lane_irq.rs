//! Interrupt glue for the lane detector
//!
//! The pin-change handler restarts a lane's count on every PIR edge; the two
//! Timer0 compare handlers advance the counts. All three touch the detector
//! only inside a critical section.

use avr_device::atmega328p::EXINT;
use avr_device::interrupt::{self, Mutex};
use core::cell::RefCell;

use super::gpio;
use super::timer::{LaneTimer, Prescaler};
use crate::drivers::lane::{Lane, LaneDetector, Thresholds};

static DETECTOR: Mutex<RefCell<LaneDetector>> =
    Mutex::new(RefCell::new(LaneDetector::new(Thresholds::station())));

// PCICR / PCIFR bits
const PCIE2: u8 = 1 << 2;
const PCIF2: u8 = 1 << 2;

/// Route both lane inputs to PCINT2 and start the debounce clock.
/// Interrupts still need to be enabled globally afterwards.
pub fn start(exint: EXINT, timer: &mut LaneTimer) {
    interrupt::free(|cs| {
        DETECTOR.borrow(cs).borrow_mut().prime(gpio::portd_levels());
    });

    let mask = Lane::Lane1.pin_mask() | Lane::Lane2.pin_mask();
    unsafe {
        exint.pcmsk2.modify(|r, w| w.bits(r.bits() | mask));
        exint.pcifr.write(|w| w.bits(PCIF2));
        exint.pcicr.modify(|r, w| w.bits(r.bits() | PCIE2));
    }

    timer.enable_interrupts();
    timer.start(Prescaler::Div1024);
}

/// Committed occupancy of `lane`
pub fn is_active(lane: Lane) -> bool {
    interrupt::free(|cs| DETECTOR.borrow(cs).borrow().is_active(lane))
}

#[avr_device::interrupt(atmega328p)]
fn PCINT2() {
    let levels = gpio::portd_levels();
    interrupt::free(|cs| {
        let changed = DETECTOR.borrow(cs).borrow_mut().on_pin_change(levels);
        for lane in Lane::ALL {
            if changed.contains(lane) {
                LaneTimer::clear_pending(lane);
            }
        }
    });
}

#[avr_device::interrupt(atmega328p)]
fn TIMER0_COMPA() {
    interrupt::free(|cs| {
        DETECTOR.borrow(cs).borrow_mut().on_tick(Lane::Lane1);
    });
}

#[avr_device::interrupt(atmega328p)]
fn TIMER0_COMPB() {
    interrupt::free(|cs| {
        DETECTOR.borrow(cs).borrow_mut().on_tick(Lane::Lane2);
    });
}
