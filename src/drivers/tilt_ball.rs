//! Tilt ball switch used as a wind indicator

use embedded_hal::digital::v2::InputPin;

use crate::config;

/// Sliding window over the last 32 tilt samples
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct WindMonitor {
    history: u32,
}

impl WindMonitor {
    pub const fn new() -> Self {
        Self { history: 0 }
    }

    pub fn record(&mut self, tilted: bool) {
        self.history = (self.history << 1) | u32::from(tilted);
    }

    /// More than half of the window was tilted
    pub fn is_windy(&self) -> bool {
        self.history.count_ones() > config::WIND_TILT_THRESHOLD
    }

    pub fn history(&self) -> u32 {
        self.history
    }
}

pub struct TiltBall<P> {
    pin: P,
    wind: WindMonitor,
}

impl<P: InputPin> TiltBall<P> {
    pub fn new(pin: P) -> Self {
        Self {
            pin,
            wind: WindMonitor::new(),
        }
    }

    pub fn is_tilted(&self) -> Result<bool, P::Error> {
        self.pin.is_high()
    }

    /// Sample the switch once and return the updated wind flag.
    /// A failed sample leaves the window untouched.
    pub fn task(&mut self) -> Result<bool, P::Error> {
        let tilted = self.is_tilted()?;
        self.wind.record(tilted);
        Ok(self.wind.is_windy())
    }

    pub fn is_windy(&self) -> bool {
        self.wind.is_windy()
    }

    pub fn wind(&self) -> &WindMonitor {
        &self.wind
    }

    pub fn release(self) -> P {
        self.pin
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal_mock::pin::{Mock as PinMock, State, Transaction};
    use embedded_hal_mock::MockError;
    use std::io::ErrorKind;

    #[test]
    fn windy_after_sixteenth_tilt() {
        let mut wind = WindMonitor::new();
        for _ in 0..15 {
            wind.record(true);
        }
        assert!(!wind.is_windy());
        wind.record(true);
        assert!(wind.is_windy());
    }

    #[test]
    fn old_samples_fall_out_of_the_window() {
        let mut wind = WindMonitor::new();
        for _ in 0..32 {
            wind.record(true);
        }
        assert!(wind.is_windy());

        for _ in 0..16 {
            wind.record(false);
        }
        assert_eq!(wind.history().count_ones(), 16);
        assert!(wind.is_windy());

        wind.record(false);
        assert!(!wind.is_windy());
    }

    #[test]
    fn task_samples_pin() {
        let expectations = [
            Transaction::get(State::High),
            Transaction::get(State::Low),
            Transaction::get(State::High).with_error(MockError::Io(ErrorKind::Other)),
        ];
        let mut pin = PinMock::new(&expectations);
        let mut tilt = TiltBall::new(pin.clone());

        assert!(matches!(tilt.task(), Ok(false)));
        assert!(matches!(tilt.task(), Ok(false)));
        assert!(tilt.task().is_err());
        assert_eq!(tilt.wind().history(), 0b10);
        pin.done();
    }
}
