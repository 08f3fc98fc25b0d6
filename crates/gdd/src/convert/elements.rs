// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Element storage: one scalar, owned arrays and borrowed views.

use crate::types::{FixedString, PrimitiveType};

/// Expand `$body` once per storage variant, binding the inner value to `$v`.
macro_rules! each_variant {
    ($value:expr, $enum:ident, $v:ident => $body:expr) => {
        match $value {
            $enum::Int8($v) => $body,
            $enum::Uint8($v) => $body,
            $enum::Int16($v) => $body,
            $enum::Uint16($v) => $body,
            $enum::Enum16($v) => $body,
            $enum::Int32($v) => $body,
            $enum::Uint32($v) => $body,
            $enum::Float32($v) => $body,
            $enum::Float64($v) => $body,
            $enum::FixedString($v) => $body,
            $enum::String($v) => $body,
        }
    };
}

/// Map each storage variant of `$value` onto the same variant of `$out`.
macro_rules! map_variant {
    ($value:expr, $enum:ident => $out:ident, $v:ident => $body:expr) => {
        match $value {
            $enum::Int8($v) => $out::Int8($body),
            $enum::Uint8($v) => $out::Uint8($body),
            $enum::Int16($v) => $out::Int16($body),
            $enum::Uint16($v) => $out::Uint16($body),
            $enum::Enum16($v) => $out::Enum16($body),
            $enum::Int32($v) => $out::Int32($body),
            $enum::Uint32($v) => $out::Uint32($body),
            $enum::Float32($v) => $out::Float32($body),
            $enum::Float64($v) => $out::Float64($body),
            $enum::FixedString($v) => $out::FixedString($body),
            $enum::String($v) => $out::String($body),
        }
    };
}

/// A single typed value.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Scalar {
    /// Untyped; carries nothing.
    #[default]
    Invalid,
    Int8(i8),
    Uint8(u8),
    Int16(i16),
    Uint16(u16),
    Enum16(u16),
    Int32(i32),
    Uint32(u32),
    Float32(f32),
    Float64(f64),
    FixedString(FixedString),
    String(String),
}

impl Scalar {
    /// Zero value of `kind` (empty for strings, `Invalid` for non-element kinds).
    pub fn zero(kind: PrimitiveType) -> Self {
        match kind {
            PrimitiveType::Int8 => Self::Int8(0),
            PrimitiveType::Uint8 => Self::Uint8(0),
            PrimitiveType::Int16 => Self::Int16(0),
            PrimitiveType::Uint16 => Self::Uint16(0),
            PrimitiveType::Enum16 => Self::Enum16(0),
            PrimitiveType::Int32 => Self::Int32(0),
            PrimitiveType::Uint32 => Self::Uint32(0),
            PrimitiveType::Float32 => Self::Float32(0.0),
            PrimitiveType::Float64 => Self::Float64(0.0),
            PrimitiveType::FixedString => Self::FixedString(FixedString::default()),
            PrimitiveType::String => Self::String(String::new()),
            PrimitiveType::Invalid | PrimitiveType::Container => Self::Invalid,
        }
    }

    pub fn kind(&self) -> PrimitiveType {
        match self {
            Self::Invalid => PrimitiveType::Invalid,
            Self::Int8(_) => PrimitiveType::Int8,
            Self::Uint8(_) => PrimitiveType::Uint8,
            Self::Int16(_) => PrimitiveType::Int16,
            Self::Uint16(_) => PrimitiveType::Uint16,
            Self::Enum16(_) => PrimitiveType::Enum16,
            Self::Int32(_) => PrimitiveType::Int32,
            Self::Uint32(_) => PrimitiveType::Uint32,
            Self::Float32(_) => PrimitiveType::Float32,
            Self::Float64(_) => PrimitiveType::Float64,
            Self::FixedString(_) => PrimitiveType::FixedString,
            Self::String(_) => PrimitiveType::String,
        }
    }

    /// Numeric value widened to f64 (exact for every integer kind).
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int8(v) => Some(f64::from(*v)),
            Self::Uint8(v) => Some(f64::from(*v)),
            Self::Int16(v) => Some(f64::from(*v)),
            Self::Uint16(v) | Self::Enum16(v) => Some(f64::from(*v)),
            Self::Int32(v) => Some(f64::from(*v)),
            Self::Uint32(v) => Some(f64::from(*v)),
            Self::Float32(v) => Some(f64::from(*v)),
            Self::Float64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::FixedString(s) => Some(s.as_str()),
            Self::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Cast `value` into `kind` without range checking.
    ///
    /// Callers validate the range first; float to integer truncates.
    pub(crate) fn cast_from_f64(kind: PrimitiveType, value: f64) -> Self {
        match kind {
            PrimitiveType::Int8 => Self::Int8(value as i8),
            PrimitiveType::Uint8 => Self::Uint8(value as u8),
            PrimitiveType::Int16 => Self::Int16(value as i16),
            PrimitiveType::Uint16 => Self::Uint16(value as u16),
            PrimitiveType::Enum16 => Self::Enum16(value as u16),
            PrimitiveType::Int32 => Self::Int32(value as i32),
            PrimitiveType::Uint32 => Self::Uint32(value as u32),
            PrimitiveType::Float32 => Self::Float32(value as f32),
            PrimitiveType::Float64 => Self::Float64(value),
            _ => Self::Invalid,
        }
    }

    /// Reverse the byte order of multi-byte numeric values.
    ///
    /// Identity on big-endian hosts, where native order is wire order.
    pub fn swap_bytes(self) -> Self {
        if cfg!(target_endian = "big") {
            return self;
        }
        match self {
            Self::Int16(v) => Self::Int16(v.swap_bytes()),
            Self::Uint16(v) => Self::Uint16(v.swap_bytes()),
            Self::Enum16(v) => Self::Enum16(v.swap_bytes()),
            Self::Int32(v) => Self::Int32(v.swap_bytes()),
            Self::Uint32(v) => Self::Uint32(v.swap_bytes()),
            Self::Float32(v) => Self::Float32(f32::from_bits(v.to_bits().swap_bytes())),
            Self::Float64(v) => Self::Float64(f64::from_bits(v.to_bits().swap_bytes())),
            other => other,
        }
    }

    /// One-element view; `None` when untyped.
    pub fn as_slice(&self) -> Option<ElemSlice<'_>> {
        let slice = match self {
            Self::Invalid => return None,
            Self::Int8(v) => ElemSlice::Int8(std::slice::from_ref(v)),
            Self::Uint8(v) => ElemSlice::Uint8(std::slice::from_ref(v)),
            Self::Int16(v) => ElemSlice::Int16(std::slice::from_ref(v)),
            Self::Uint16(v) => ElemSlice::Uint16(std::slice::from_ref(v)),
            Self::Enum16(v) => ElemSlice::Enum16(std::slice::from_ref(v)),
            Self::Int32(v) => ElemSlice::Int32(std::slice::from_ref(v)),
            Self::Uint32(v) => ElemSlice::Uint32(std::slice::from_ref(v)),
            Self::Float32(v) => ElemSlice::Float32(std::slice::from_ref(v)),
            Self::Float64(v) => ElemSlice::Float64(std::slice::from_ref(v)),
            Self::FixedString(v) => ElemSlice::FixedString(std::slice::from_ref(v)),
            Self::String(v) => ElemSlice::String(std::slice::from_ref(v)),
        };
        Some(slice)
    }

    /// One-element mutable view; `None` when untyped.
    pub fn as_slice_mut(&mut self) -> Option<ElemSliceMut<'_>> {
        let slice = match self {
            Self::Invalid => return None,
            Self::Int8(v) => ElemSliceMut::Int8(std::slice::from_mut(v)),
            Self::Uint8(v) => ElemSliceMut::Uint8(std::slice::from_mut(v)),
            Self::Int16(v) => ElemSliceMut::Int16(std::slice::from_mut(v)),
            Self::Uint16(v) => ElemSliceMut::Uint16(std::slice::from_mut(v)),
            Self::Enum16(v) => ElemSliceMut::Enum16(std::slice::from_mut(v)),
            Self::Int32(v) => ElemSliceMut::Int32(std::slice::from_mut(v)),
            Self::Uint32(v) => ElemSliceMut::Uint32(std::slice::from_mut(v)),
            Self::Float32(v) => ElemSliceMut::Float32(std::slice::from_mut(v)),
            Self::Float64(v) => ElemSliceMut::Float64(std::slice::from_mut(v)),
            Self::FixedString(v) => ElemSliceMut::FixedString(std::slice::from_mut(v)),
            Self::String(v) => ElemSliceMut::String(std::slice::from_mut(v)),
        };
        Some(slice)
    }
}

/// Owned, homogeneous element vector.
#[derive(Debug, Clone, PartialEq)]
pub enum Elements {
    Int8(Vec<i8>),
    Uint8(Vec<u8>),
    Int16(Vec<i16>),
    Uint16(Vec<u16>),
    Enum16(Vec<u16>),
    Int32(Vec<i32>),
    Uint32(Vec<u32>),
    Float32(Vec<f32>),
    Float64(Vec<f64>),
    FixedString(Vec<FixedString>),
    String(Vec<String>),
}

impl Default for Elements {
    fn default() -> Self {
        Self::Uint8(Vec::new())
    }
}

impl Elements {
    /// `len` zero elements of `kind`; `None` for non-element kinds.
    pub fn zeroed(kind: PrimitiveType, len: usize) -> Option<Self> {
        let elements = match kind {
            PrimitiveType::Int8 => Self::Int8(vec![0; len]),
            PrimitiveType::Uint8 => Self::Uint8(vec![0; len]),
            PrimitiveType::Int16 => Self::Int16(vec![0; len]),
            PrimitiveType::Uint16 => Self::Uint16(vec![0; len]),
            PrimitiveType::Enum16 => Self::Enum16(vec![0; len]),
            PrimitiveType::Int32 => Self::Int32(vec![0; len]),
            PrimitiveType::Uint32 => Self::Uint32(vec![0; len]),
            PrimitiveType::Float32 => Self::Float32(vec![0.0; len]),
            PrimitiveType::Float64 => Self::Float64(vec![0.0; len]),
            PrimitiveType::FixedString => Self::FixedString(vec![FixedString::default(); len]),
            PrimitiveType::String => Self::String(vec![String::new(); len]),
            PrimitiveType::Invalid | PrimitiveType::Container => return None,
        };
        Some(elements)
    }

    /// One-element vector holding `value`; `None` when untyped.
    pub fn from_scalar(value: &Scalar) -> Option<Self> {
        value.as_slice().map(|v| v.to_elements())
    }

    pub fn kind(&self) -> PrimitiveType {
        self.as_slice().kind()
    }

    pub fn len(&self) -> usize {
        each_variant!(self, Elements, v => v.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, index: usize) -> Option<Scalar> {
        (index < self.len()).then(|| self.as_slice().get(index))
    }

    pub fn as_slice(&self) -> ElemSlice<'_> {
        map_variant!(self, Elements => ElemSlice, v => v.as_slice())
    }

    pub fn as_slice_mut(&mut self) -> ElemSliceMut<'_> {
        map_variant!(self, Elements => ElemSliceMut, v => v.as_mut_slice())
    }

    /// Bytes occupied when flattened.
    pub fn byte_size(&self) -> usize {
        self.len() * self.kind().size()
    }

    /// Grow or shrink to `len`, zero filling new slots.
    pub fn resize(&mut self, len: usize) {
        match self {
            Self::Int8(v) => v.resize(len, 0),
            Self::Uint8(v) => v.resize(len, 0),
            Self::Int16(v) => v.resize(len, 0),
            Self::Uint16(v) | Self::Enum16(v) => v.resize(len, 0),
            Self::Int32(v) => v.resize(len, 0),
            Self::Uint32(v) => v.resize(len, 0),
            Self::Float32(v) => v.resize(len, 0.0),
            Self::Float64(v) => v.resize(len, 0.0),
            Self::FixedString(v) => v.resize(len, FixedString::default()),
            Self::String(v) => v.resize(len, String::new()),
        }
    }
}

/// Borrowed, homogeneous element view.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ElemSlice<'a> {
    Int8(&'a [i8]),
    Uint8(&'a [u8]),
    Int16(&'a [i16]),
    Uint16(&'a [u16]),
    Enum16(&'a [u16]),
    Int32(&'a [i32]),
    Uint32(&'a [u32]),
    Float32(&'a [f32]),
    Float64(&'a [f64]),
    FixedString(&'a [FixedString]),
    String(&'a [String]),
}

impl<'a> ElemSlice<'a> {
    pub fn kind(&self) -> PrimitiveType {
        match self {
            Self::Int8(_) => PrimitiveType::Int8,
            Self::Uint8(_) => PrimitiveType::Uint8,
            Self::Int16(_) => PrimitiveType::Int16,
            Self::Uint16(_) => PrimitiveType::Uint16,
            Self::Enum16(_) => PrimitiveType::Enum16,
            Self::Int32(_) => PrimitiveType::Int32,
            Self::Uint32(_) => PrimitiveType::Uint32,
            Self::Float32(_) => PrimitiveType::Float32,
            Self::Float64(_) => PrimitiveType::Float64,
            Self::FixedString(_) => PrimitiveType::FixedString,
            Self::String(_) => PrimitiveType::String,
        }
    }

    pub fn len(&self) -> usize {
        each_variant!(self, ElemSlice, v => v.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Element `index` as a scalar. Callers check `index < len()`.
    pub fn get(&self, index: usize) -> Scalar {
        match self {
            Self::Int8(v) => Scalar::Int8(v[index]),
            Self::Uint8(v) => Scalar::Uint8(v[index]),
            Self::Int16(v) => Scalar::Int16(v[index]),
            Self::Uint16(v) => Scalar::Uint16(v[index]),
            Self::Enum16(v) => Scalar::Enum16(v[index]),
            Self::Int32(v) => Scalar::Int32(v[index]),
            Self::Uint32(v) => Scalar::Uint32(v[index]),
            Self::Float32(v) => Scalar::Float32(v[index]),
            Self::Float64(v) => Scalar::Float64(v[index]),
            Self::FixedString(v) => Scalar::FixedString(v[index]),
            Self::String(v) => Scalar::String(v[index].clone()),
        }
    }

    /// Sub-view of `len` elements from `start`; `None` when out of range.
    pub fn range(&self, start: usize, len: usize) -> Option<ElemSlice<'a>> {
        let end = start.checked_add(len)?;
        if end > self.len() {
            return None;
        }
        Some(map_variant!(*self, ElemSlice => ElemSlice, v => &v[start..end]))
    }

    pub fn to_elements(&self) -> Elements {
        map_variant!(*self, ElemSlice => Elements, v => v.to_vec())
    }
}

/// Mutable, homogeneous element view.
#[derive(Debug, PartialEq)]
pub enum ElemSliceMut<'a> {
    Int8(&'a mut [i8]),
    Uint8(&'a mut [u8]),
    Int16(&'a mut [i16]),
    Uint16(&'a mut [u16]),
    Enum16(&'a mut [u16]),
    Int32(&'a mut [i32]),
    Uint32(&'a mut [u32]),
    Float32(&'a mut [f32]),
    Float64(&'a mut [f64]),
    FixedString(&'a mut [FixedString]),
    String(&'a mut [String]),
}

impl<'a> ElemSliceMut<'a> {
    pub fn kind(&self) -> PrimitiveType {
        self.as_const().kind()
    }

    pub fn len(&self) -> usize {
        each_variant!(self, ElemSliceMut, v => v.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_const(&self) -> ElemSlice<'_> {
        map_variant!(self, ElemSliceMut => ElemSlice, v => &v[..])
    }

    /// Shorter-lived mutable view over the same elements.
    pub fn reborrow(&mut self) -> ElemSliceMut<'_> {
        map_variant!(self, ElemSliceMut => ElemSliceMut, v => &mut v[..])
    }

    /// Mutable sub-view of `len` elements from `start`.
    pub fn range_mut(&mut self, start: usize, len: usize) -> Option<ElemSliceMut<'_>> {
        let end = start.checked_add(len)?;
        if end > self.len() {
            return None;
        }
        Some(map_variant!(self, ElemSliceMut => ElemSliceMut, v => &mut v[start..end]))
    }

    /// Store `value` at `index`. Returns false when the kinds differ or the
    /// index is out of range.
    pub fn set(&mut self, index: usize, value: Scalar) -> bool {
        if index >= self.len() {
            return false;
        }
        match (self, value) {
            (Self::Int8(d), Scalar::Int8(v)) => d[index] = v,
            (Self::Uint8(d), Scalar::Uint8(v)) => d[index] = v,
            (Self::Int16(d), Scalar::Int16(v)) => d[index] = v,
            (Self::Uint16(d), Scalar::Uint16(v)) => d[index] = v,
            (Self::Enum16(d), Scalar::Enum16(v)) => d[index] = v,
            (Self::Int32(d), Scalar::Int32(v)) => d[index] = v,
            (Self::Uint32(d), Scalar::Uint32(v)) => d[index] = v,
            (Self::Float32(d), Scalar::Float32(v)) => d[index] = v,
            (Self::Float64(d), Scalar::Float64(v)) => d[index] = v,
            (Self::FixedString(d), Scalar::FixedString(v)) => d[index] = v,
            (Self::String(d), Scalar::String(v)) => d[index] = v,
            _ => return false,
        }
        true
    }

    /// Element-wise copy of the first `count` elements of a same-kind view.
    pub(crate) fn copy_from(&mut self, src: &ElemSlice<'_>, count: usize) -> bool {
        if count > self.len() || count > src.len() {
            return false;
        }
        match (self, src) {
            (Self::Int8(d), ElemSlice::Int8(s)) => d[..count].copy_from_slice(&s[..count]),
            (Self::Uint8(d), ElemSlice::Uint8(s)) => d[..count].copy_from_slice(&s[..count]),
            (Self::Int16(d), ElemSlice::Int16(s)) => d[..count].copy_from_slice(&s[..count]),
            (Self::Uint16(d), ElemSlice::Uint16(s)) => d[..count].copy_from_slice(&s[..count]),
            (Self::Enum16(d), ElemSlice::Enum16(s)) => d[..count].copy_from_slice(&s[..count]),
            (Self::Int32(d), ElemSlice::Int32(s)) => d[..count].copy_from_slice(&s[..count]),
            (Self::Uint32(d), ElemSlice::Uint32(s)) => d[..count].copy_from_slice(&s[..count]),
            (Self::Float32(d), ElemSlice::Float32(s)) => d[..count].copy_from_slice(&s[..count]),
            (Self::Float64(d), ElemSlice::Float64(s)) => d[..count].copy_from_slice(&s[..count]),
            (Self::FixedString(d), ElemSlice::FixedString(s)) => {
                d[..count].copy_from_slice(&s[..count])
            }
            (Self::String(d), ElemSlice::String(s)) => d[..count].clone_from_slice(&s[..count]),
            _ => return false,
        }
        true
    }

    /// Reset every element to zero / empty.
    pub fn fill_zero(&mut self) {
        match self {
            Self::Int8(d) => d.fill(0),
            Self::Uint8(d) => d.fill(0),
            Self::Int16(d) => d.fill(0),
            Self::Uint16(d) | Self::Enum16(d) => d.fill(0),
            Self::Int32(d) => d.fill(0),
            Self::Uint32(d) => d.fill(0),
            Self::Float32(d) => d.fill(0.0),
            Self::Float64(d) => d.fill(0.0),
            Self::FixedString(d) => d.fill(FixedString::default()),
            Self::String(d) => d.iter_mut().for_each(String::clear),
        }
    }
}

/// Choice index of an enumerated value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct EnumChoice(pub u16);

/// Rust types that map onto one primitive kind.
pub trait Primitive: Clone + Sized {
    const KIND: PrimitiveType;

    fn into_scalar(self) -> Scalar;

    /// Extract from a scalar of exactly this kind.
    fn from_scalar(value: Scalar) -> Option<Self>;

    fn to_elements(values: &[Self]) -> Elements;

    /// Unwrap elements of exactly this kind.
    fn from_elements(elements: Elements) -> Option<Vec<Self>>;
}

macro_rules! impl_primitive {
    ($ty:ty, $variant:ident) => {
        impl Primitive for $ty {
            const KIND: PrimitiveType = PrimitiveType::$variant;

            fn into_scalar(self) -> Scalar {
                Scalar::$variant(self)
            }

            fn from_scalar(value: Scalar) -> Option<Self> {
                match value {
                    Scalar::$variant(v) => Some(v),
                    _ => None,
                }
            }

            fn to_elements(values: &[Self]) -> Elements {
                Elements::$variant(values.to_vec())
            }

            fn from_elements(elements: Elements) -> Option<Vec<Self>> {
                match elements {
                    Elements::$variant(v) => Some(v),
                    _ => None,
                }
            }
        }

        impl From<$ty> for Scalar {
            fn from(value: $ty) -> Self {
                Scalar::$variant(value)
            }
        }
    };
}

impl_primitive!(i8, Int8);
impl_primitive!(u8, Uint8);
impl_primitive!(i16, Int16);
impl_primitive!(u16, Uint16);
impl_primitive!(i32, Int32);
impl_primitive!(u32, Uint32);
impl_primitive!(f32, Float32);
impl_primitive!(f64, Float64);
impl_primitive!(FixedString, FixedString);
impl_primitive!(String, String);

impl Primitive for EnumChoice {
    const KIND: PrimitiveType = PrimitiveType::Enum16;

    fn into_scalar(self) -> Scalar {
        Scalar::Enum16(self.0)
    }

    fn from_scalar(value: Scalar) -> Option<Self> {
        match value {
            Scalar::Enum16(v) => Some(EnumChoice(v)),
            _ => None,
        }
    }

    fn to_elements(values: &[Self]) -> Elements {
        Elements::Enum16(values.iter().map(|c| c.0).collect())
    }

    fn from_elements(elements: Elements) -> Option<Vec<Self>> {
        match elements {
            Elements::Enum16(v) => Some(v.into_iter().map(EnumChoice).collect()),
            _ => None,
        }
    }
}

impl From<EnumChoice> for Scalar {
    fn from(value: EnumChoice) -> Self {
        Scalar::Enum16(value.0)
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Scalar::String(value.to_string())
    }
}
