// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Number ↔ text helpers used by the string converters.

use super::ConvertError;
use crate::config::FIXED_STRING_MAX_LEN;
use crate::convert::Scalar;

/// Magnitudes outside this window are printed in exponent form.
const PLAIN_MIN: f64 = 1e-5;
const PLAIN_MAX: f64 = 1e16;

/// Parse decimal text, falling back to hexadecimal (`0x` prefix optional).
pub fn parse_number(text: &str) -> Result<f64, ConvertError> {
    let trimmed = text.trim();
    if let Ok(value) = trimmed.parse::<f64>() {
        return Ok(value);
    }
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    u64::from_str_radix(digits, 16)
        .map(|v| v as f64)
        .map_err(|_| ConvertError::Malformed(text.to_string()))
}

/// Render a numeric scalar with the shortest text that parses back to the
/// same value.
pub fn format_number(value: &Scalar) -> Result<String, ConvertError> {
    let text = match value {
        Scalar::Int8(v) => v.to_string(),
        Scalar::Uint8(v) => v.to_string(),
        Scalar::Int16(v) => v.to_string(),
        Scalar::Uint16(v) | Scalar::Enum16(v) => v.to_string(),
        Scalar::Int32(v) => v.to_string(),
        Scalar::Uint32(v) => v.to_string(),
        Scalar::Float32(v) => {
            let magnitude = f64::from(v.abs());
            if plain(magnitude) {
                format!("{}", v)
            } else {
                format!("{:e}", v)
            }
        }
        Scalar::Float64(v) => {
            if plain(v.abs()) {
                format!("{}", v)
            } else {
                format!("{:e}", v)
            }
        }
        other => {
            return Err(ConvertError::NoConverter {
                dst: crate::types::PrimitiveType::String,
                src: other.kind(),
            })
        }
    };
    if text.len() > FIXED_STRING_MAX_LEN {
        return Err(ConvertError::OutputTooSmall(text.len()));
    }
    Ok(text)
}

fn plain(magnitude: f64) -> bool {
    magnitude == 0.0 || !magnitude.is_finite() || (PLAIN_MIN..PLAIN_MAX).contains(&magnitude)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_decimal_then_hex() {
        assert_eq!(parse_number("10"), Ok(10.0));
        assert_eq!(parse_number(" -2.5 "), Ok(-2.5));
        assert_eq!(parse_number("1e3"), Ok(1000.0));
        assert_eq!(parse_number("0x1A"), Ok(26.0));
        assert_eq!(parse_number("ff"), Ok(255.0));
        assert!(matches!(parse_number("twelve"), Err(ConvertError::Malformed(_))));
        assert!(parse_number("").is_err());
    }

    #[test]
    fn test_format_minimal() {
        assert_eq!(format_number(&Scalar::Float32(1.0)).as_deref(), Ok("1"));
        assert_eq!(format_number(&Scalar::Float32(0.1)).as_deref(), Ok("0.1"));
        assert_eq!(format_number(&Scalar::Float64(2.5)).as_deref(), Ok("2.5"));
        assert_eq!(format_number(&Scalar::Int16(-7)).as_deref(), Ok("-7"));
        assert_eq!(format_number(&Scalar::Float64(1e300)).as_deref(), Ok("1e300"));
        assert_eq!(format_number(&Scalar::Float64(1.5e-7)).as_deref(), Ok("1.5e-7"));
    }

    #[test]
    fn test_format_round_trips_f64() {
        for v in [0.1, -123.456, 6.02214076e23, 1e-300, f64::MAX, f64::MIN_POSITIVE] {
            let text = format_number(&Scalar::Float64(v)).expect("format");
            assert_eq!(parse_number(&text), Ok(v), "text {text}");
        }
    }

    #[test]
    fn test_format_rejects_strings() {
        assert!(format_number(&Scalar::String("x".into())).is_err());
    }
}
