//! Analog UV index sensor with a switched supply
//!
//! The sensor is only powered while a conversion is taken. A reading of 302
//! corresponds to UV index 3.02.

use embedded_hal::adc::{Channel, OneShot};
use embedded_hal::blocking::delay::DelayMs;
use embedded_hal::digital::v2::OutputPin;

/// Settling time after enabling the sensor
const SETTLE_MS: u8 = 1;

/// 10-bit conversion result
const ADC_MASK: u16 = 0x3FF;

#[derive(Debug, Clone, Copy)]
pub enum UvIndexError<A, P> {
    Adc(A),
    Enable(P),
}

pub struct UvIndexSensor<CH, EN> {
    channel: CH,
    enable: EN,
    last: u16,
}

impl<CH, EN: OutputPin> UvIndexSensor<CH, EN> {
    pub fn new(channel: CH, enable: EN) -> Self {
        Self {
            channel,
            enable,
            last: 0,
        }
    }

    /// Power the sensor, take one conversion and power it down again.
    /// The enable line is released even when the conversion fails.
    pub fn read<ADC, A, D>(&mut self, adc: &mut A, delay: &mut D) -> Result<u16, UvIndexError<A::Error, EN::Error>>
    where
        CH: Channel<ADC>,
        A: OneShot<ADC, u16, CH>,
        D: DelayMs<u8>,
    {
        self.enable.set_high().map_err(UvIndexError::Enable)?;
        delay.delay_ms(SETTLE_MS);

        let conversion = nb::block!(adc.read(&mut self.channel));
        let released = self.enable.set_low();

        let value = conversion.map_err(UvIndexError::Adc)? & ADC_MASK;
        released.map_err(UvIndexError::Enable)?;

        self.last = value;
        Ok(value)
    }

    /// Most recent successful reading
    pub fn last_reading(&self) -> u16 {
        self.last
    }

    pub fn release(self) -> (CH, EN) {
        (self.channel, self.enable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal_mock::adc::{Mock as AdcMock, MockChan0, Transaction as AdcTransaction};
    use embedded_hal_mock::delay::MockNoop;
    use embedded_hal_mock::pin::{Mock as PinMock, State, Transaction as PinTransaction};
    use embedded_hal_mock::MockError;
    use std::io::ErrorKind;

    #[test]
    fn reads_masked_value_with_sensor_powered() {
        let pin_expectations = [
            PinTransaction::set(State::High),
            PinTransaction::set(State::Low),
        ];
        let mut enable = PinMock::new(&pin_expectations);
        let mut adc = AdcMock::new(&[AdcTransaction::read(0, 0xF12Eu16)]);
        let mut sensor = UvIndexSensor::new(MockChan0, enable.clone());

        let value = sensor.read(&mut adc, &mut MockNoop::new());
        assert!(matches!(value, Ok(0x12E)));
        assert_eq!(sensor.last_reading(), 302);

        enable.done();
        adc.done();
    }

    #[test]
    fn failed_conversion_still_powers_down() {
        let pin_expectations = [
            PinTransaction::set(State::High),
            PinTransaction::set(State::Low),
        ];
        let mut enable = PinMock::new(&pin_expectations);
        let mut adc = AdcMock::new(&[
            AdcTransaction::read(0, 0u16).with_error(MockError::Io(ErrorKind::Other))
        ]);
        let mut sensor = UvIndexSensor::new(MockChan0, enable.clone());

        assert!(matches!(
            sensor.read(&mut adc, &mut MockNoop::new()),
            Err(UvIndexError::Adc(_))
        ));
        assert_eq!(sensor.last_reading(), 0);

        enable.done();
        adc.done();
    }
}
