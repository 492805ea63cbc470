//! Consolidated sensor report
//!
//! One frame per report interval, ASCII, terminated by CRLF:
//!
//! ```text
//! <[=surface,underwater,exterior,humidity,windy,uv,lane1,lane2=]>
//! ```
//!
//! Temperatures are centi-degrees Fahrenheit, humidity is Q22.10 %RH and
//! the flags are `0` or `1`.

use ufmt::{uDisplay, uWrite, uwrite, Formatter};

use super::{ProtocolError, Result};

const FRAME_START: &str = "<[=";
const FRAME_END: &str = "=]>";
const FIELD_COUNT: usize = 8;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StationReport {
    pub surface_temp: i32,
    pub underwater_temp: i32,
    pub exterior_temp: i32,
    pub exterior_humidity: u32,
    pub windy: bool,
    pub uv_index: u16,
    pub lane_1: bool,
    pub lane_2: bool,
}

impl StationReport {
    /// Write the frame followed by CRLF
    pub fn send<W: uWrite + ?Sized>(&self, out: &mut W) -> core::result::Result<(), W::Error> {
        uwrite!(out, "{}\r\n", *self)
    }

    /// Parse one frame; a trailing CRLF is accepted
    pub fn parse(frame: &str) -> Result<Self> {
        let body = frame
            .trim_end_matches(&['\r', '\n'][..])
            .strip_prefix(FRAME_START)
            .and_then(|rest| rest.strip_suffix(FRAME_END))
            .ok_or(ProtocolError::InvalidFrame)?;

        let mut fields = [""; FIELD_COUNT];
        let mut parts = body.split(',');
        for field in fields.iter_mut() {
            *field = parts.next().ok_or(ProtocolError::MissingField)?;
        }
        if parts.next().is_some() {
            return Err(ProtocolError::InvalidFrame);
        }

        Ok(Self {
            surface_temp: number(fields[0])?,
            underwater_temp: number(fields[1])?,
            exterior_temp: number(fields[2])?,
            exterior_humidity: number(fields[3])?,
            windy: flag(fields[4])?,
            uv_index: number(fields[5])?,
            lane_1: flag(fields[6])?,
            lane_2: flag(fields[7])?,
        })
    }
}

impl uDisplay for StationReport {
    fn fmt<W: uWrite + ?Sized>(&self, f: &mut Formatter<'_, W>) -> core::result::Result<(), W::Error> {
        uwrite!(
            f,
            "<[={},{},{},{},{},{},{},{}=]>",
            self.surface_temp,
            self.underwater_temp,
            self.exterior_temp,
            self.exterior_humidity,
            u8::from(self.windy),
            self.uv_index,
            u8::from(self.lane_1),
            u8::from(self.lane_2)
        )
    }
}

fn number<T: core::str::FromStr>(field: &str) -> Result<T> {
    field.parse().map_err(|_| ProtocolError::InvalidField)
}

fn flag(field: &str) -> Result<bool> {
    match field {
        "0" => Ok(false),
        "1" => Ok(true),
        _ => Err(ProtocolError::InvalidField),
    }
}
