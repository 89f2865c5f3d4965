// Flamingo CSV record layout and the values extracted from it.

use std::fmt;

use serde::ser::{Serialize, SerializeTuple, Serializer};

use crate::error::{Error, Result};
use crate::numeric::{parse_float, parse_int};

/// Number of comma-separated fields in a Flamingo record.
pub const NUM_FIELDS_PER_LINE: usize = 9;

// Field positions. 0 and 1 (node name and number) are not used.
const TIMESTAMP: usize = 2;
const SERIAL_NUMBER: usize = 3;
const TEMPERATURE: usize = 4;
const CONDUCTIVITY: usize = 5;
const ERROR_INDICATOR: usize = 6;
const VOLTAGE: usize = 7;
const CHECKSUM: usize = 8;

/// The trimmed text fields of one data line.
///
/// Only lines with at least [`NUM_FIELDS_PER_LINE`] fields can be built;
/// anything past the ninth field is ignored.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRecord<'a> {
    fields: Vec<&'a str>,
}

impl<'a> RawRecord<'a> {
    /// Split `line` on commas and trim each field.
    pub fn parse(line: &'a str) -> std::result::Result<Self, SkipReason> {
        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        if fields.len() < NUM_FIELDS_PER_LINE {
            return Err(SkipReason::WrongFieldCount);
        }
        Ok(Self { fields })
    }

    pub fn serial_number(&self) -> &'a str {
        self.fields[SERIAL_NUMBER]
    }

    pub fn timestamp(&self) -> f64 {
        parse_float(self.fields[TIMESTAMP])
    }

    pub fn temperature(&self) -> f64 {
        parse_float(self.fields[TEMPERATURE])
    }

    pub fn conductivity(&self) -> f64 {
        parse_float(self.fields[CONDUCTIVITY])
    }

    /// Error indicator as a float; NaN when the field is not numeric.
    pub fn error_code(&self) -> f64 {
        parse_float(self.fields[ERROR_INDICATOR])
    }

    pub fn voltage(&self) -> f64 {
        parse_float(self.fields[VOLTAGE])
    }

    /// Checksum byte written by the device, read as an integer.
    pub fn checksum(&self) -> f64 {
        parse_int(self.fields[CHECKSUM])
    }

    pub fn to_output(&self) -> OutputRecord {
        OutputRecord {
            timestamp: self.timestamp(),
            temperature: self.temperature(),
            conductivity: self.conductivity(),
            voltage: self.voltage(),
        }
    }
}

/// Why a data line was dropped from the upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    WrongFieldCount,
    NonZeroErrorCode,
    InvalidChecksum,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::WrongFieldCount => "wrong number of fields",
            SkipReason::NonZeroErrorCode => "non-zero error code",
            SkipReason::InvalidChecksum => "invalid checksum",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One accepted sample, in upload channel order.
///
/// Serializes as the 4-element array `[timestamp, temperature, conductivity,
/// voltage]`. Whole numbers are written without a fraction (`500`, not
/// `500.0`) and non-finite values as `null`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OutputRecord {
    pub timestamp: f64,
    pub temperature: f64,
    pub conductivity: f64,
    pub voltage: f64,
}

impl OutputRecord {
    pub fn values(&self) -> [f64; 4] {
        [self.timestamp, self.temperature, self.conductivity, self.voltage]
    }
}

impl Serialize for OutputRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut tuple = serializer.serialize_tuple(4)?;
        for value in self.values() {
            tuple.serialize_element(&JsonNumber(value))?;
        }
        tuple.end()
    }
}

// Largest magnitude at which every integer is exactly representable.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

struct JsonNumber(f64);

impl Serialize for JsonNumber {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let value = self.0;
        if !value.is_finite() {
            serializer.serialize_none()
        } else if value.fract() == 0.0 && value.abs() <= MAX_SAFE_INTEGER {
            serializer.serialize_i64(value as i64)
        } else {
            serializer.serialize_f64(value)
        }
    }
}

/// Extract the device serial number from the first line of a data file.
///
/// The line must have the full record layout and a non-blank serial field.
pub fn serial_number_from_line(line: &str) -> Result<String> {
    let record = RawRecord::parse(line).map_err(|_| Error::MissingSerialNumber)?;
    let serial = record.serial_number();
    if serial.is_empty() {
        return Err(Error::MissingSerialNumber);
    }
    Ok(serial.to_string())
}
