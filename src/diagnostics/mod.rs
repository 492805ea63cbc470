//! Diagnostic output and fault accounting
//!
//! Everything written here is fire-and-forget: a sink that fails to accept
//! output never stops a sensor task.

use ufmt::{uDisplay, uWrite, uwrite, Formatter};

/// Emit a diagnostic line
#[macro_export]
macro_rules! diag {
    ($diag:expr, $($arg:tt)*) => {{
        let sink = $diag.sink();
        let _ = ::ufmt::uwrite!(sink, $($arg)*);
    }};
}

/// Emit a diagnostic line only when verbose output is enabled
#[macro_export]
macro_rules! trace {
    ($diag:expr, $($arg:tt)*) => {{
        if $diag.is_verbose() {
            $crate::diag!($diag, $($arg)*);
        }
    }};
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum ErrorCode {
    SensorError = 0x2000,
    CommunicationError = 0x3000,
    CalibrationError = 0x4000,
}

/// Subcodes identifying the reporting device
pub mod subcode {
    pub const BME280: u16 = 0x0001;
    pub const SURFACE_PROBE: u16 = 0x0002;
    pub const UNDERWATER_PROBE: u16 = 0x0003;
    pub const UV_INDEX: u16 = 0x0004;
    pub const TILT_BALL: u16 = 0x0005;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fault {
    pub code: ErrorCode,
    pub subcode: u16,
}

impl Fault {
    pub fn value(&self) -> u16 {
        self.code as u16 | self.subcode
    }
}

pub struct Diagnostics<W> {
    sink: W,
    verbose: bool,
    fault_count: u16,
    last_fault: Option<Fault>,
}

impl<W: uWrite> Diagnostics<W> {
    pub fn new(sink: W, verbose: bool) -> Self {
        Self {
            sink,
            verbose,
            fault_count: 0,
            last_fault: None,
        }
    }

    pub fn sink(&mut self) -> &mut W {
        &mut self.sink
    }

    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    pub fn set_verbose(&mut self, verbose: bool) {
        self.verbose = verbose;
    }

    /// Record a fault and print its code
    pub fn report(&mut self, code: ErrorCode, subcode: u16) {
        let fault = Fault { code, subcode };
        self.last_fault = Some(fault);
        self.fault_count = self.fault_count.saturating_add(1);

        let _ = uwrite!(self.sink, "ERR {}\r\n", Hex16(fault.value()));
    }

    pub fn last_fault(&self) -> Option<Fault> {
        self.last_fault
    }

    pub fn fault_count(&self) -> u16 {
        self.fault_count
    }

    pub fn release(self) -> W {
        self.sink
    }
}

/// Displays a byte as `0xNN`
pub struct Hex8(pub u8);

/// Displays a word as `0xNNNN`
pub struct Hex16(pub u16);

impl uDisplay for Hex8 {
    fn fmt<W: uWrite + ?Sized>(&self, f: &mut Formatter<'_, W>) -> Result<(), W::Error> {
        write_hex(f, u16::from(self.0), 2)
    }
}

impl uDisplay for Hex16 {
    fn fmt<W: uWrite + ?Sized>(&self, f: &mut Formatter<'_, W>) -> Result<(), W::Error> {
        write_hex(f, self.0, 4)
    }
}

/// Displays a hundredths value as a decimal, -1264 as `-12.64`
pub struct Centi(pub i32);

impl uDisplay for Centi {
    fn fmt<W: uWrite + ?Sized>(&self, f: &mut Formatter<'_, W>) -> Result<(), W::Error> {
        let magnitude = self.0.unsigned_abs();
        if self.0 < 0 {
            f.write_str("-")?;
        }
        let fraction = magnitude % 100;
        uwrite!(f, "{}.", magnitude / 100)?;
        if fraction < 10 {
            f.write_str("0")?;
        }
        uwrite!(f, "{}", fraction)
    }
}

fn write_hex<W: uWrite + ?Sized>(
    f: &mut Formatter<'_, W>,
    value: u16,
    digits: u32,
) -> Result<(), W::Error> {
    const HEX_CHARS: [u8; 16] = *b"0123456789ABCDEF";

    let mut text = [b'0', b'x', 0, 0, 0, 0];
    for i in 0..digits {
        let nibble = (value >> ((digits - 1 - i) * 4)) & 0xF;
        text[2 + i as usize] = HEX_CHARS[nibble as usize];
    }
    let len = 2 + digits as usize;
    // Only ASCII was written
    let text = core::str::from_utf8(&text[..len]).unwrap_or("0x??");
    f.write_str(text)
}
