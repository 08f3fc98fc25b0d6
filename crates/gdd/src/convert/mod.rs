// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Pairwise conversion between primitive kinds.
//!
//! The matrix is data: a 13x13 table of [`Route`]s computed at compile time,
//! plus one routine per route. Three tables share the routes and differ only
//! in byte order handling:
//!
//! | Table      | Source                 | Destination            |
//! |------------|------------------------|------------------------|
//! | `Native`   | host order             | host order             |
//! | `ToWire`   | host order             | big-endian             |
//! | `FromWire` | big-endian             | host order             |
//!
//! Only multi-byte numeric elements are swapped. On big-endian hosts the
//! three tables behave identically.
//!
//! Every conversion is all-or-nothing: results are staged and written only
//! when all `count` elements converted.

mod elements;
mod text;

pub use elements::{ElemSlice, ElemSliceMut, Elements, EnumChoice, Primitive, Scalar};
pub use text::{format_number, parse_number};

use crate::config::FIXED_STRING_SIZE;
use crate::error::GddError;
use crate::types::{EnumStringTable, FixedString, PrimitiveType};
use thiserror::Error;

/// Converter failure. Every variant maps to status -1.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConvertError {
    #[error("no converter from {src} to {dst}")]
    NoConverter {
        dst: PrimitiveType,
        src: PrimitiveType,
    },

    #[error("{value} out of range for {kind}")]
    OutOfRange { kind: PrimitiveType, value: f64 },

    #[error("formatted text needs {0} bytes")]
    OutputTooSmall(usize),

    #[error("no enum string for {0:?}")]
    NoEnumString(String),

    #[error("malformed numeric text {0:?}")]
    Malformed(String),

    #[error("{needed} elements requested, {available} available")]
    ShortBuffer { needed: usize, available: usize },
}

impl ConvertError {
    /// Status word of a failed converter.
    pub fn status(&self) -> i32 {
        -1
    }
}

impl From<ConvertError> for GddError {
    fn from(err: ConvertError) -> Self {
        log::debug!("[convert] {}", err);
        GddError::TypeMismatch("convert")
    }
}

/// Byte order handling of a conversion table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DataFormat {
    #[default]
    Native,
    ToWire,
    FromWire,
}

/// How one (destination, source) pair converts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    /// No converter (invalid or container on either side).
    Unsupported,
    /// Identical kinds.
    Copy,
    /// Range-checked numeric cast.
    Numeric,
    /// Numeric rendered as text.
    Format,
    /// Text parsed as a number.
    Parse,
    /// Enum index rendered through the choice table.
    EnumToText,
    /// Text looked up in the choice table.
    TextToEnum,
    /// String ↔ fixed string.
    Text,
}

const KINDS: usize = PrimitiveType::ALL.len();

const fn route_for(dst: PrimitiveType, src: PrimitiveType) -> Route {
    if !dst.is_convertible() || !src.is_convertible() {
        return Route::Unsupported;
    }
    if dst as u8 == src as u8 {
        return Route::Copy;
    }
    match (dst.is_string(), src.is_string()) {
        (false, false) => Route::Numeric,
        (true, true) => Route::Text,
        (true, false) => {
            if matches!(src, PrimitiveType::Enum16) {
                Route::EnumToText
            } else {
                Route::Format
            }
        }
        (false, true) => {
            if matches!(dst, PrimitiveType::Enum16) {
                Route::TextToEnum
            } else {
                Route::Parse
            }
        }
    }
}

const fn build_routes() -> [[Route; KINDS]; KINDS] {
    let mut table = [[Route::Unsupported; KINDS]; KINDS];
    let mut d = 0;
    while d < KINDS {
        let mut s = 0;
        while s < KINDS {
            table[d][s] = route_for(PrimitiveType::ALL[d], PrimitiveType::ALL[s]);
            s += 1;
        }
        d += 1;
    }
    table
}

const ROUTES: [[Route; KINDS]; KINDS] = build_routes();

static NATIVE: ConversionMatrix = ConversionMatrix::new(DataFormat::Native);
static TO_WIRE: ConversionMatrix = ConversionMatrix::new(DataFormat::ToWire);
static FROM_WIRE: ConversionMatrix = ConversionMatrix::new(DataFormat::FromWire);

/// One conversion table.
#[derive(Debug)]
pub struct ConversionMatrix {
    format: DataFormat,
    routes: [[Route; KINDS]; KINDS],
}

impl ConversionMatrix {
    const fn new(format: DataFormat) -> Self {
        Self {
            format,
            routes: ROUTES,
        }
    }

    pub fn native() -> &'static ConversionMatrix {
        &NATIVE
    }

    pub fn to_wire() -> &'static ConversionMatrix {
        &TO_WIRE
    }

    pub fn from_wire() -> &'static ConversionMatrix {
        &FROM_WIRE
    }

    pub fn for_format(format: DataFormat) -> &'static ConversionMatrix {
        match format {
            DataFormat::Native => &NATIVE,
            DataFormat::ToWire => &TO_WIRE,
            DataFormat::FromWire => &FROM_WIRE,
        }
    }

    pub fn format(&self) -> DataFormat {
        self.format
    }

    pub fn route(&self, dst: PrimitiveType, src: PrimitiveType) -> Route {
        self.routes[dst as usize][src as usize]
    }

    pub fn can_convert(&self, dst: PrimitiveType, src: PrimitiveType) -> bool {
        self.route(dst, src) != Route::Unsupported
    }

    /// Convert the first `count` elements of `src` into `dst`.
    ///
    /// Returns the destination bytes written: `count * size(dst)`, where
    /// variable strings count [`FIXED_STRING_SIZE`] bytes each.
    pub fn convert(
        &self,
        dst: &mut ElemSliceMut<'_>,
        src: &ElemSlice<'_>,
        count: usize,
        table: Option<&dyn EnumStringTable>,
    ) -> Result<usize, ConvertError> {
        let dst_kind = dst.kind();
        let src_kind = src.kind();
        let route = self.route(dst_kind, src_kind);
        if route == Route::Unsupported {
            return Err(ConvertError::NoConverter {
                dst: dst_kind,
                src: src_kind,
            });
        }
        if count > src.len() || count > dst.len() {
            return Err(ConvertError::ShortBuffer {
                needed: count,
                available: src.len().min(dst.len()),
            });
        }

        if route == Route::Copy && (self.format == DataFormat::Native || !needs_swap(dst_kind)) {
            dst.copy_from(src, count);
            return Ok(bytes_written(dst_kind, count));
        }

        let mut staged = Vec::with_capacity(count);
        for i in 0..count {
            staged.push(self.convert_one(route, dst_kind, src.get(i), table)?);
        }
        for (i, value) in staged.into_iter().enumerate() {
            dst.set(i, value);
        }
        Ok(bytes_written(dst_kind, count))
    }

    /// Convert one scalar into `dst_kind`.
    pub fn convert_scalar(
        &self,
        dst_kind: PrimitiveType,
        value: Scalar,
        table: Option<&dyn EnumStringTable>,
    ) -> Result<Scalar, ConvertError> {
        let route = self.route(dst_kind, value.kind());
        if route == Route::Unsupported {
            return Err(ConvertError::NoConverter {
                dst: dst_kind,
                src: value.kind(),
            });
        }
        self.convert_one(route, dst_kind, value, table)
    }

    fn convert_one(
        &self,
        route: Route,
        dst_kind: PrimitiveType,
        value: Scalar,
        table: Option<&dyn EnumStringTable>,
    ) -> Result<Scalar, ConvertError> {
        let value = match self.format {
            DataFormat::FromWire => value.swap_bytes(),
            _ => value,
        };
        let out = match route {
            Route::Unsupported => {
                return Err(ConvertError::NoConverter {
                    dst: dst_kind,
                    src: value.kind(),
                })
            }
            Route::Copy => value,
            Route::Numeric => {
                let v = value.as_f64().ok_or(ConvertError::NoConverter {
                    dst: dst_kind,
                    src: value.kind(),
                })?;
                numeric(dst_kind, v)?
            }
            Route::Format => text_into(dst_kind, &format_number(&value)?),
            Route::Parse => {
                let text = value.as_text().unwrap_or_default();
                numeric(dst_kind, parse_number(text)?)?
            }
            Route::EnumToText => {
                let index = match value {
                    Scalar::Enum16(i) => i,
                    _ => 0,
                };
                match table {
                    Some(t) => {
                        let text = t
                            .string_at(index as usize)
                            .ok_or_else(|| ConvertError::NoEnumString(index.to_string()))?;
                        text_into(dst_kind, text)
                    }
                    None => text_into(dst_kind, &index.to_string()),
                }
            }
            Route::TextToEnum => enum_from_text(value.as_text().unwrap_or_default(), table)?,
            Route::Text => text_into(dst_kind, value.as_text().unwrap_or_default()),
        };
        Ok(match self.format {
            DataFormat::ToWire => out.swap_bytes(),
            _ => out,
        })
    }
}

fn needs_swap(kind: PrimitiveType) -> bool {
    kind.is_numeric() && kind.size() > 1 && cfg!(target_endian = "little")
}

fn bytes_written(kind: PrimitiveType, count: usize) -> usize {
    match kind {
        PrimitiveType::String => count * FIXED_STRING_SIZE,
        other => count * other.size(),
    }
}

/// Range-checked cast of `value` into numeric `kind`.
fn numeric(kind: PrimitiveType, value: f64) -> Result<Scalar, ConvertError> {
    let (min, max) = kind.range().ok_or(ConvertError::NoConverter {
        dst: kind,
        src: PrimitiveType::Float64,
    })?;
    let in_range = if kind.is_float() {
        !value.is_finite() || (value >= min && value <= max)
    } else {
        let whole = value.trunc();
        whole >= min && whole <= max
    };
    if !in_range {
        return Err(ConvertError::OutOfRange { kind, value });
    }
    Ok(Scalar::cast_from_f64(kind, value))
}

fn text_into(kind: PrimitiveType, text: &str) -> Scalar {
    match kind {
        PrimitiveType::FixedString => Scalar::FixedString(FixedString::new(text)),
        _ => Scalar::String(text.to_string()),
    }
}

fn enum_from_text(text: &str, table: Option<&dyn EnumStringTable>) -> Result<Scalar, ConvertError> {
    let Some(table) = table else {
        return numeric(PrimitiveType::Enum16, parse_number(text)?);
    };
    if let Some(index) = table.index_of(text) {
        let index =
            u16::try_from(index).map_err(|_| ConvertError::NoEnumString(text.to_string()))?;
        return Ok(Scalar::Enum16(index));
    }
    match parse_number(text) {
        Ok(v) if v >= 0.0 && v.trunc() < table.len() as f64 => numeric(PrimitiveType::Enum16, v),
        _ => Err(ConvertError::NoEnumString(text.to_string())),
    }
}

/// Convert with the native table.
pub fn convert(
    dst: &mut ElemSliceMut<'_>,
    src: &ElemSlice<'_>,
    count: usize,
    table: Option<&dyn EnumStringTable>,
) -> Result<usize, ConvertError> {
    ConversionMatrix::native().convert(dst, src, count, table)
}

/// Convert with the table selected by `format`.
pub fn convert_with(
    format: DataFormat,
    dst: &mut ElemSliceMut<'_>,
    src: &ElemSlice<'_>,
    count: usize,
    table: Option<&dyn EnumStringTable>,
) -> Result<usize, ConvertError> {
    ConversionMatrix::for_format(format).convert(dst, src, count, table)
}

/// Convert a whole element vector into a new vector of `kind`.
pub fn convert_elements(
    kind: PrimitiveType,
    src: &ElemSlice<'_>,
    table: Option<&dyn EnumStringTable>,
) -> Result<Elements, ConvertError> {
    let mut out = Elements::zeroed(kind, src.len()).ok_or(ConvertError::NoConverter {
        dst: kind,
        src: src.kind(),
    })?;
    convert(&mut out.as_slice_mut(), src, src.len(), table)?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EnumStrings;

    fn conv(kind: PrimitiveType, src: Elements) -> Result<Elements, ConvertError> {
        convert_elements(kind, &src.as_slice(), None)
    }

    #[test]
    fn test_route_table() {
        let m = ConversionMatrix::native();
        assert_eq!(m.route(PrimitiveType::Int32, PrimitiveType::Int32), Route::Copy);
        assert_eq!(m.route(PrimitiveType::Int32, PrimitiveType::Float32), Route::Numeric);
        assert_eq!(m.route(PrimitiveType::String, PrimitiveType::Float32), Route::Format);
        assert_eq!(m.route(PrimitiveType::Uint8, PrimitiveType::FixedString), Route::Parse);
        assert_eq!(m.route(PrimitiveType::String, PrimitiveType::Enum16), Route::EnumToText);
        assert_eq!(m.route(PrimitiveType::Enum16, PrimitiveType::String), Route::TextToEnum);
        assert_eq!(m.route(PrimitiveType::FixedString, PrimitiveType::String), Route::Text);
        assert!(!m.can_convert(PrimitiveType::Container, PrimitiveType::Int8));
        assert!(!m.can_convert(PrimitiveType::Int8, PrimitiveType::Invalid));
    }

    #[test]
    fn test_float32_to_string_to_int32() {
        let strings = conv(PrimitiveType::String, Elements::Float32(vec![1.0, 2.0, 3.0]))
            .expect("float32 to string");
        assert_eq!(
            strings,
            Elements::String(vec!["1".into(), "2".into(), "3".into()])
        );
        let ints = conv(PrimitiveType::Int32, strings).expect("string to int32");
        assert_eq!(ints, Elements::Int32(vec![1, 2, 3]));
    }

    #[test]
    fn test_narrowing_out_of_range_fails() {
        assert!(matches!(
            conv(PrimitiveType::Int8, Elements::Int32(vec![1, 300])),
            Err(ConvertError::OutOfRange { .. })
        ));
        assert!(conv(PrimitiveType::Uint16, Elements::Int16(vec![-1])).is_err());
        assert!(conv(PrimitiveType::Float32, Elements::Float64(vec![1e300])).is_err());
        assert!(conv(PrimitiveType::Int32, Elements::Float64(vec![f64::NAN])).is_err());
        assert_eq!(
            conv(PrimitiveType::Float32, Elements::Float64(vec![f64::INFINITY])),
            Ok(Elements::Float32(vec![f32::INFINITY]))
        );
    }

    #[test]
    fn test_float_to_int_truncates() {
        assert_eq!(
            conv(PrimitiveType::Int16, Elements::Float64(vec![2.9, -2.9, 127.5])),
            Ok(Elements::Int16(vec![2, -2, 127]))
        );
        assert_eq!(
            conv(PrimitiveType::Int8, Elements::Float64(vec![127.5])),
            Ok(Elements::Int8(vec![127]))
        );
    }

    #[test]
    fn test_failure_leaves_destination_untouched() {
        let mut dst = Elements::Int8(vec![9, 9]);
        let src = Elements::Int32(vec![1, 1000]);
        let r = convert(&mut dst.as_slice_mut(), &src.as_slice(), 2, None);
        assert!(r.is_err());
        assert_eq!(r.unwrap_err().status(), -1);
        assert_eq!(dst, Elements::Int8(vec![9, 9]));
    }

    #[test]
    fn test_bytes_written() {
        let mut dst = Elements::zeroed(PrimitiveType::Float64, 4).expect("f64");
        let src = Elements::Int16(vec![1, 2, 3, 4]);
        assert_eq!(convert(&mut dst.as_slice_mut(), &src.as_slice(), 3, None), Ok(24));
        let mut dst = Elements::zeroed(PrimitiveType::String, 2).expect("string");
        assert_eq!(convert(&mut dst.as_slice_mut(), &src.as_slice(), 2, None), Ok(80));
    }

    #[test]
    fn test_short_buffers_rejected() {
        let mut dst = Elements::zeroed(PrimitiveType::Int32, 1).expect("i32");
        let src = Elements::Int32(vec![1, 2]);
        assert!(matches!(
            convert(&mut dst.as_slice_mut(), &src.as_slice(), 2, None),
            Err(ConvertError::ShortBuffer { .. })
        ));
    }

    #[test]
    fn test_malformed_text_fails() {
        assert!(matches!(
            conv(PrimitiveType::Float64, Elements::String(vec!["abc xyz".into()])),
            Err(ConvertError::Malformed(_))
        ));
        assert_eq!(
            conv(PrimitiveType::Uint8, Elements::String(vec!["0x10".into()])),
            Ok(Elements::Uint8(vec![16]))
        );
    }

    #[test]
    fn test_fixed_string_truncation() {
        let long = "y".repeat(60);
        let out = conv(PrimitiveType::FixedString, Elements::String(vec![long])).expect("fixed");
        match out {
            Elements::FixedString(v) => assert_eq!(v[0].len(), 39),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_enum_with_table() {
        let table = EnumStrings::new(["Off", "On", "Fault"]);
        let src = Elements::Enum16(vec![2, 0]);
        let text = convert_elements(PrimitiveType::String, &src.as_slice(), Some(&table))
            .expect("enum to text");
        assert_eq!(text, Elements::String(vec!["Fault".into(), "Off".into()]));
        let back = convert_elements(PrimitiveType::Enum16, &text.as_slice(), Some(&table))
            .expect("text to enum");
        assert_eq!(back, src);

        let missing = Elements::Enum16(vec![7]);
        assert!(matches!(
            convert_elements(PrimitiveType::String, &missing.as_slice(), Some(&table)),
            Err(ConvertError::NoEnumString(_))
        ));
        let numeric = Elements::String(vec!["1".into()]);
        assert_eq!(
            convert_elements(PrimitiveType::Enum16, &numeric.as_slice(), Some(&table)),
            Ok(Elements::Enum16(vec![1]))
        );
        let unknown = Elements::String(vec!["Broken".into()]);
        assert!(convert_elements(PrimitiveType::Enum16, &unknown.as_slice(), Some(&table)).is_err());
    }

    #[test]
    fn test_enum_without_table() {
        assert_eq!(
            conv(PrimitiveType::String, Elements::Enum16(vec![4])),
            Ok(Elements::String(vec!["4".into()]))
        );
        assert_eq!(
            conv(PrimitiveType::Enum16, Elements::String(vec!["12".into()])),
            Ok(Elements::Enum16(vec![12]))
        );
    }

    #[test]
    fn test_wire_tables_swap_multibyte_numerics() {
        let src = Elements::Int16(vec![0x0102]);
        let mut wire = Elements::zeroed(PrimitiveType::Int32, 1).expect("i32");
        ConversionMatrix::to_wire()
            .convert(&mut wire.as_slice_mut(), &src.as_slice(), 1, None)
            .expect("to wire");
        let expected = 0x0102i32.to_be();
        assert_eq!(wire, Elements::Int32(vec![expected]));

        let mut back = Elements::zeroed(PrimitiveType::Int16, 1).expect("i16");
        ConversionMatrix::from_wire()
            .convert(&mut back.as_slice_mut(), &wire.as_slice(), 1, None)
            .expect("from wire");
        assert_eq!(back, src);
    }

    #[test]
    fn test_wire_copy_swaps_same_kind() {
        let src = Elements::Float64(vec![1.25]);
        let mut wire = Elements::zeroed(PrimitiveType::Float64, 1).expect("f64");
        convert_with(DataFormat::ToWire, &mut wire.as_slice_mut(), &src.as_slice(), 1, None)
            .expect("to wire");
        match &wire {
            Elements::Float64(v) => assert_eq!(v[0].to_bits(), 1.25f64.to_bits().to_be()),
            other => panic!("unexpected {:?}", other),
        }
        let mut back = Elements::zeroed(PrimitiveType::Float64, 1).expect("f64");
        convert_with(DataFormat::FromWire, &mut back.as_slice_mut(), &wire.as_slice(), 1, None)
            .expect("from wire");
        assert_eq!(back, src);
    }

    #[test]
    fn test_wire_string_side_not_swapped() {
        let src = Elements::String(vec!["258".into()]);
        let mut wire = Elements::zeroed(PrimitiveType::Uint16, 1).expect("u16");
        convert_with(DataFormat::ToWire, &mut wire.as_slice_mut(), &src.as_slice(), 1, None)
            .expect("to wire");
        assert_eq!(wire, Elements::Uint16(vec![258u16.to_be()]));
    }

    #[test]
    fn test_convert_scalar() {
        let m = ConversionMatrix::native();
        assert_eq!(
            m.convert_scalar(PrimitiveType::Float64, Scalar::Int8(-3), None),
            Ok(Scalar::Float64(-3.0))
        );
        assert!(m
            .convert_scalar(PrimitiveType::Int8, Scalar::Invalid, None)
            .is_err());
    }
}
