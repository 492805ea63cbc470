//! Station report wire format

pub mod report;

pub use report::StationReport;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolError {
    /// Missing `<[=` / `=]>` delimiters or trailing data
    InvalidFrame,
    /// A field did not parse
    InvalidField,
    MissingField,
}

pub type Result<T> = core::result::Result<T, ProtocolError>;
