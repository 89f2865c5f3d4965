// Lenient number parsing used by the record validator.
//
// Flamingo exports are read the forgiving way the device tooling always
// read them: a number is taken from the longest numeric prefix of the text,
// and text without any numeric prefix becomes NaN instead of an error. The
// checksum and error-code rules depend on that (NaN never compares greater
// than or equal to anything), so these helpers return `f64` and keep NaN
// around rather than mapping it to `Option`.

/// Parse the longest floating-point prefix of `text`.
///
/// Accepts an optional sign, digits with an optional fraction, an optional
/// exponent, or the literal `Infinity`. Returns NaN when no prefix parses.
pub fn parse_float(text: &str) -> f64 {
    let text = text.trim_start();
    let bytes = text.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end += 1;
    }

    if text[end..].starts_with("Infinity") {
        return if text.starts_with('-') {
            f64::NEG_INFINITY
        } else {
            f64::INFINITY
        };
    }

    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut digits = end - int_start;

    if end < bytes.len() && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        digits += frac_end - frac_start;
        if digits > 0 {
            end = frac_end;
        }
    }

    if digits == 0 {
        return f64::NAN;
    }

    // An exponent only counts when at least one digit follows it.
    if end < bytes.len() && (bytes[end] == b'e' || bytes[end] == b'E') {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+') | Some(b'-')) {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }

    text[..end].parse::<f64>().unwrap_or(f64::NAN)
}

/// Parse the longest integer prefix of `text`, truncating any fraction.
///
/// A `0x`/`0X` prefix switches to hexadecimal. Returns NaN when no digit is
/// found. The value is returned as `f64` so oversized inputs lose precision
/// instead of failing.
pub fn parse_int(text: &str) -> f64 {
    let text = text.trim_start();
    let (negative, rest) = match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    };

    let (radix, rest) = if rest.starts_with("0x") || rest.starts_with("0X") {
        (16, &rest[2..])
    } else {
        (10, rest)
    };

    let digits: &str = {
        let len = rest
            .char_indices()
            .find(|(_, c)| !c.is_digit(radix))
            .map(|(i, _)| i)
            .unwrap_or(rest.len());
        &rest[..len]
    };

    if digits.is_empty() {
        return f64::NAN;
    }

    let magnitude = digits.chars().fold(0.0_f64, |acc, c| {
        acc * f64::from(radix) + f64::from(c.to_digit(radix).unwrap_or(0))
    });

    if negative {
        -magnitude
    } else {
        magnitude
    }
}

/// Render a parsed number back to its shortest decimal text.
///
/// `23.40` parsed and rendered gives `"23.4"`, and `23.0` gives `"23"`, which
/// is the text the checksum decomposition works on.
pub fn number_to_text(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value.is_infinite() {
        if value > 0.0 {
            "Infinity".to_string()
        } else {
            "-Infinity".to_string()
        }
    } else if value == 0.0 {
        "0".to_string()
    } else {
        format!("{}", value)
    }
}
