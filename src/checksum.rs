// Record checksum computation.
//
// Flamingo firmware protects each record with a one-byte additive checksum.
// Temperature and voltage contribute their integer part and their fraction
// digits separately, each fraction padded to a fixed number of digits, and
// the total is truncated into an unsigned byte. It is not a CRC, only a
// wrapping byte sum.

use crate::numeric::{number_to_text, parse_int};

/// Fraction digits the firmware uses for temperature.
pub const TEMPERATURE_MANTISSA_WIDTH: usize = 1;

/// Fraction digits the firmware uses for voltage.
pub const VOLTAGE_MANTISSA_WIDTH: usize = 2;

/// Integer part and zero-padded fraction digits of a decimal string.
///
/// Both halves are NaN when the corresponding text has no integer prefix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecimalParts {
    pub characteristic: f64,
    pub mantissa: f64,
}

/// Split `value` at its decimal point.
///
/// The fraction is right-padded with zeros to `mantissa_width` digits before
/// it is read as an integer, so `"3.5"` at width 2 gives a mantissa of 50.
/// Fractions longer than the width are kept whole. Without a decimal point
/// the mantissa is 0.
pub fn decimal_parts(value: &str, mantissa_width: usize) -> DecimalParts {
    match value.split_once('.') {
        Some((characteristic, fraction)) => {
            let mut fraction = fraction.to_string();
            while fraction.len() < mantissa_width {
                fraction.push('0');
            }
            DecimalParts {
                characteristic: parse_int(characteristic),
                mantissa: parse_int(&fraction),
            }
        }
        None => DecimalParts {
            characteristic: parse_int(value),
            mantissa: 0.0,
        },
    }
}

/// Truncate a sum into an unsigned byte.
///
/// The sum is truncated toward zero and wrapped modulo 256, so negative sums
/// wrap from the top (`-1` becomes 255). NaN and infinities become 0.
pub fn wrap_to_byte(sum: f64) -> u8 {
    if !sum.is_finite() {
        return 0;
    }
    sum.trunc().rem_euclid(256.0) as u8
}

/// Compute the expected checksum byte for a record.
///
/// The arguments are the float-parsed field values. Temperature and voltage
/// are decomposed from their shortest decimal rendering, conductivity and
/// error code contribute their truncated integer value.
pub fn compute_checksum(temperature: f64, conductivity: f64, voltage: f64, error_code: f64) -> u8 {
    let temperature = decimal_parts(&number_to_text(temperature), TEMPERATURE_MANTISSA_WIDTH);
    let voltage = decimal_parts(&number_to_text(voltage), VOLTAGE_MANTISSA_WIDTH);

    let sum = temperature.characteristic
        + temperature.mantissa
        + parse_int(&number_to_text(conductivity))
        + parse_int(&number_to_text(error_code))
        + voltage.characteristic
        + voltage.mantissa;

    wrap_to_byte(sum)
}
