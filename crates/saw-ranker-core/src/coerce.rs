//! Lenient conversion of raw dataset cells into numbers and flags.
//!
//! Neither function can fail: dataset noise degrades to `0.0` / `false`
//! instead of aborting a ranking run.

use crate::item::RawValue;

/// Numeric reading of a raw value.
///
/// Text is read up to the longest leading run that forms a float, after
/// skipping leading whitespace, so `"12.5k"` reads as `12.5`. Absent,
/// empty, boolean, unparsable and non-finite values all read as `0.0`.
pub fn to_numeric(raw: &RawValue) -> f64 {
    let value = match raw {
        RawValue::Number(n) => *n,
        RawValue::Text(s) => leading_float(s).unwrap_or(0.0),
        RawValue::Bool(_) | RawValue::Absent => 0.0,
    };
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

/// Flag reading of a raw value: booleans pass through, text is true for
/// `"true"` in any case or exactly `"1"`, everything else is false.
pub fn to_boolean(raw: &RawValue) -> bool {
    match raw {
        RawValue::Bool(b) => *b,
        RawValue::Text(s) => s.eq_ignore_ascii_case("true") || s == "1",
        RawValue::Number(_) | RawValue::Absent => false,
    }
}

fn leading_float(text: &str) -> Option<f64> {
    let s = text.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end += 1;
    }
    let int_digits = count_digits(bytes.get(end..).unwrap_or_default());
    end += int_digits;

    let mut frac_digits = 0;
    if bytes.get(end) == Some(&b'.') {
        frac_digits = count_digits(bytes.get(end + 1..).unwrap_or_default());
        if int_digits + frac_digits > 0 {
            end += 1 + frac_digits;
        }
    }
    if int_digits + frac_digits == 0 {
        return None;
    }

    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+' | b'-')) {
            exp_end += 1;
        }
        let exp_digits = count_digits(bytes.get(exp_end..).unwrap_or_default());
        if exp_digits > 0 {
            end = exp_end + exp_digits;
        }
    }

    s.get(..end)?.parse::<f64>().ok()
}

fn count_digits(bytes: &[u8]) -> usize {
    bytes.iter().take_while(|b| b.is_ascii_digit()).count()
}
