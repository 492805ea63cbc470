//! Busy-wait delays
//!
//! Timer0 belongs to the lane detector, so these count CPU cycles instead.
//! The inner loop is `sbiw` + `brne`, four cycles per pass.

use embedded_hal::blocking::delay::{DelayMs, DelayUs};

use crate::config;

/// Cycles spent per inner loop iteration
const CYCLES_PER_LOOP: u32 = 4;
const LOOPS_PER_US: u16 = (config::CPU_FREQ_HZ / 1_000_000 / CYCLES_PER_LOOP) as u16;
/// Longest delay a single pass of the 16-bit counter covers
const MAX_SPIN_US: u16 = u16::MAX / LOOPS_PER_US;

// The clock must be a whole number of loop passes per microsecond
const _: () = assert!(LOOPS_PER_US as u32 * CYCLES_PER_LOOP * 1_000_000 == config::CPU_FREQ_HZ);

/// Run the four-cycle loop `count` times
#[inline(always)]
fn spin(count: u16) {
    if count == 0 {
        return;
    }
    // SAFETY: only the counter register pair is touched
    unsafe {
        core::arch::asm!(
            "1: sbiw {count}, 1",
            "brne 1b",
            count = inout(reg_iw) count => _,
            options(nomem, nostack),
        );
    }
}

#[derive(Clone, Copy, Default)]
pub struct Delay;

impl Delay {
    pub const fn new() -> Self {
        Delay
    }
}

impl DelayUs<u16> for Delay {
    fn delay_us(&mut self, us: u16) {
        let mut us = us;
        while us > MAX_SPIN_US {
            spin(MAX_SPIN_US * LOOPS_PER_US);
            us -= MAX_SPIN_US;
        }
        spin(us * LOOPS_PER_US);
    }
}

impl DelayMs<u32> for Delay {
    fn delay_ms(&mut self, ms: u32) {
        for _ in 0..ms {
            self.delay_us(1000);
        }
    }
}

impl DelayMs<u16> for Delay {
    fn delay_ms(&mut self, ms: u16) {
        DelayMs::<u32>::delay_ms(self, u32::from(ms));
    }
}

impl DelayMs<u8> for Delay {
    fn delay_ms(&mut self, ms: u8) {
        DelayMs::<u32>::delay_ms(self, u32::from(ms));
    }
}
