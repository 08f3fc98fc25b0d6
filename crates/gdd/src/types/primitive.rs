// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Primitive kinds carried by a descriptor.

use crate::config::{FIXED_STRING_SIZE, FLAT_STRING_RECORD_SIZE};
use crate::error::GddError;
use std::fmt;

/// Closed set of primitive kinds.
///
/// Discriminants are part of the flattened layout and the wire header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[repr(u8)]
pub enum PrimitiveType {
    #[default]
    Invalid = 0,
    Int8 = 1,
    Uint8 = 2,
    Int16 = 3,
    Uint16 = 4,
    Enum16 = 5,
    Int32 = 6,
    Uint32 = 7,
    Float32 = 8,
    Float64 = 9,
    FixedString = 10,
    String = 11,
    Container = 12,
}

impl PrimitiveType {
    /// Every kind, in discriminant order.
    pub const ALL: [PrimitiveType; 13] = [
        Self::Invalid,
        Self::Int8,
        Self::Uint8,
        Self::Int16,
        Self::Uint16,
        Self::Enum16,
        Self::Int32,
        Self::Uint32,
        Self::Float32,
        Self::Float64,
        Self::FixedString,
        Self::String,
        Self::Container,
    ];

    /// Kinds the conversion matrix handles.
    pub const CONVERTIBLE: [PrimitiveType; 11] = [
        Self::Int8,
        Self::Uint8,
        Self::Int16,
        Self::Uint16,
        Self::Enum16,
        Self::Int32,
        Self::Uint32,
        Self::Float32,
        Self::Float64,
        Self::FixedString,
        Self::String,
    ];

    /// Element size in bytes inside a flat image.
    ///
    /// Variable strings count their 16-byte record, not the characters.
    pub const fn size(self) -> usize {
        match self {
            Self::Invalid | Self::Container => 0,
            Self::Int8 | Self::Uint8 => 1,
            Self::Int16 | Self::Uint16 | Self::Enum16 => 2,
            Self::Int32 | Self::Uint32 | Self::Float32 => 4,
            Self::Float64 => 8,
            Self::FixedString => FIXED_STRING_SIZE,
            Self::String => FLAT_STRING_RECORD_SIZE,
        }
    }

    /// Short name used in dumps.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Invalid => "invalid",
            Self::Int8 => "int8",
            Self::Uint8 => "uint8",
            Self::Int16 => "int16",
            Self::Uint16 => "uint16",
            Self::Enum16 => "enum16",
            Self::Int32 => "int32",
            Self::Uint32 => "uint32",
            Self::Float32 => "float32",
            Self::Float64 => "float64",
            Self::FixedString => "fixed_string",
            Self::String => "string",
            Self::Container => "container",
        }
    }

    pub const fn is_numeric(self) -> bool {
        matches!(
            self,
            Self::Int8
                | Self::Uint8
                | Self::Int16
                | Self::Uint16
                | Self::Enum16
                | Self::Int32
                | Self::Uint32
                | Self::Float32
                | Self::Float64
        )
    }

    pub const fn is_string(self) -> bool {
        matches!(self, Self::FixedString | Self::String)
    }

    pub const fn is_float(self) -> bool {
        matches!(self, Self::Float32 | Self::Float64)
    }

    /// True when the conversion matrix has converters for this kind.
    pub const fn is_convertible(self) -> bool {
        self.is_numeric() || self.is_string()
    }

    /// Inclusive value range of a numeric kind.
    pub fn range(self) -> Option<(f64, f64)> {
        let range = match self {
            Self::Int8 => (i8::MIN as f64, i8::MAX as f64),
            Self::Uint8 => (0.0, u8::MAX as f64),
            Self::Int16 => (i16::MIN as f64, i16::MAX as f64),
            Self::Uint16 | Self::Enum16 => (0.0, u16::MAX as f64),
            Self::Int32 => (i32::MIN as f64, i32::MAX as f64),
            Self::Uint32 => (0.0, u32::MAX as f64),
            Self::Float32 => (-(f32::MAX as f64), f32::MAX as f64),
            Self::Float64 => (-f64::MAX, f64::MAX),
            _ => return None,
        };
        Some(range)
    }
}

impl TryFrom<u8> for PrimitiveType {
    type Error = GddError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::ALL
            .get(value as usize)
            .copied()
            .ok_or(GddError::OutOfBounds("PrimitiveType::try_from"))
    }
}

impl fmt::Display for PrimitiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discriminants_round_trip() {
        for kind in PrimitiveType::ALL {
            assert_eq!(PrimitiveType::try_from(kind as u8), Ok(kind));
        }
        assert!(PrimitiveType::try_from(13).is_err());
    }

    #[test]
    fn test_sizes() {
        assert_eq!(PrimitiveType::Int8.size(), 1);
        assert_eq!(PrimitiveType::Enum16.size(), 2);
        assert_eq!(PrimitiveType::Float32.size(), 4);
        assert_eq!(PrimitiveType::Float64.size(), 8);
        assert_eq!(PrimitiveType::FixedString.size(), 40);
        assert_eq!(PrimitiveType::Container.size(), 0);
    }

    #[test]
    fn test_ranges() {
        assert_eq!(PrimitiveType::Uint8.range(), Some((0.0, 255.0)));
        assert_eq!(PrimitiveType::Int16.range(), Some((-32768.0, 32767.0)));
        assert_eq!(PrimitiveType::String.range(), None);
    }

    #[test]
    fn test_classification() {
        assert!(PrimitiveType::Enum16.is_numeric());
        assert!(PrimitiveType::FixedString.is_convertible());
        assert!(!PrimitiveType::Container.is_convertible());
        assert!(!PrimitiveType::Invalid.is_convertible());
    }
}
