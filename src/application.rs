//! Station state shared between the sensor tasks and the report link
//!
//! Sensor tasks record their latest values here; the main loop asks
//! [`Station::tick`] whether a report is due and sends [`Station::report`].

use ufmt::uWrite;

use crate::config;
use crate::drivers::bme280::CompensatedReading;
use crate::drivers::ds18b20::Temperature;
use crate::protocol::StationReport;
use crate::units;

/// Position of a one-wire thermometer
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Probe {
    Surface,
    Underwater,
}

/// Latest readings and report cadence
pub struct Station {
    report: StationReport,
    runs: u16,
    reports_sent: u16,
}

impl Station {
    pub fn new() -> Self {
        Self {
            report: StationReport::default(),
            runs: 0,
            reports_sent: 0,
        }
    }

    /// BME280 output, exterior temperature is reported in Fahrenheit
    pub fn record_environment(&mut self, reading: &CompensatedReading) {
        self.report.exterior_temp = units::centi_celsius_to_fahrenheit(reading.temperature);
        self.report.exterior_humidity = reading.humidity;
    }

    pub fn record_probe(&mut self, probe: Probe, temperature: Temperature) {
        let fahrenheit = temperature.centi_fahrenheit();
        match probe {
            Probe::Surface => self.report.surface_temp = fahrenheit,
            Probe::Underwater => self.report.underwater_temp = fahrenheit,
        }
    }

    pub fn record_wind(&mut self, windy: bool) {
        self.report.windy = windy;
    }

    pub fn record_uv_index(&mut self, uv_index: u16) {
        self.report.uv_index = uv_index;
    }

    pub fn record_lanes(&mut self, lane_1: bool, lane_2: bool) {
        self.report.lane_1 = lane_1;
        self.report.lane_2 = lane_2;
    }

    /// Advance one main loop run. True on the first run and every
    /// `REPORT_INTERVAL_RUNS`-th run after it.
    pub fn tick(&mut self) -> bool {
        let due = self.runs == 0;
        self.runs = (self.runs + 1) % config::REPORT_INTERVAL_RUNS;
        due
    }

    pub fn report(&self) -> StationReport {
        self.report
    }

    pub fn send_report<W: uWrite>(&mut self, out: &mut W) -> Result<(), W::Error> {
        self.report.send(out)?;
        self.reports_sent = self.reports_sent.wrapping_add(1);
        Ok(())
    }

    pub fn reports_sent(&self) -> u16 {
        self.reports_sent
    }
}

impl Default for Station {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::tests::Capture;

    #[test]
    fn reports_on_first_run_then_every_interval() {
        let mut station = Station::new();
        let due: usize = (0..91).filter(|_| station.tick()).count();
        assert_eq!(due, 4);

        let mut station = Station::new();
        assert!(station.tick());
        for _ in 1..config::REPORT_INTERVAL_RUNS {
            assert!(!station.tick());
        }
        assert!(station.tick());
    }

    #[test]
    fn readings_land_in_their_fields() {
        let mut station = Station::new();
        station.record_environment(&CompensatedReading {
            pressure: 100_653,
            temperature: 2230,
            humidity: 40_495,
        });
        station.record_probe(Probe::Surface, Temperature::from_raw(401));
        station.record_probe(Probe::Underwater, Temperature::from_raw(-162));
        station.record_wind(true);
        station.record_uv_index(302);
        station.record_lanes(true, false);

        let mut out = Capture::default();
        station.send_report(&mut out).unwrap();
        assert_eq!(out.0, "<[=7710,1378,7214,40495,1,302,1,0=]>\r\n");
        assert_eq!(station.reports_sent(), 1);
    }
}
