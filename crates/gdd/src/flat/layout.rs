// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Flat image layout.
//!
//! ```text
//! header (48 bytes, little-endian)
//!   0  prim      u8        1  dimension u8      2  app   u16
//!   4  flags     u8        5  reserved  u8      6  refcount sentinel u16
//!   8  status    u32      12  ts sec    u64    20  ts nsec u32
//!  24  bounds    u64      32  data      u64    40  next  u64
//! bounds record (8 bytes):  first u32, count u32
//! string record (16 bytes): chars u64, len u32, buf_len u32
//! ```
//!
//! Headers come first: the root at 0, then the children of each container
//! contiguously, containers expanded depth-first. Bounds records and
//! payloads follow, each 8-byte aligned. Links (`bounds`, `data`, `next`,
//! string `chars`) are absolute addresses in address mode and image
//! offsets in offset mode; 0 means none. Numeric scalars live inline in
//! `data`.

use crate::convert::Scalar;
use crate::types::PrimitiveType;

// Header fields patched in place.
pub(crate) const H_FLAGS: usize = 4;
pub(crate) const H_BOUNDS: usize = 24;
pub(crate) const H_DATA: usize = 32;
pub(crate) const H_NEXT: usize = 40;

/// How links are encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LinkMode {
    /// Absolute address: image base plus offset.
    Address(u64),
    /// Offset from the image start.
    Offsets,
}

impl LinkMode {
    pub(crate) fn encode(self, offset: usize) -> u64 {
        match self {
            LinkMode::Address(base) => base + offset as u64,
            LinkMode::Offsets => offset as u64,
        }
    }

    /// Image offset designated by `link`; `None` when it falls outside
    /// `[0, len)`.
    pub(crate) fn decode(self, link: u64, len: usize) -> Option<usize> {
        let offset = match self {
            LinkMode::Address(base) => link.checked_sub(base)?,
            LinkMode::Offsets => link,
        };
        let offset = usize::try_from(offset).ok()?;
        (offset < len).then_some(offset)
    }
}

/// Address mode for an image whose first byte is at `image`.
pub(crate) fn address_mode(image: &[u8]) -> LinkMode {
    LinkMode::Address(image.as_ptr() as usize as u64)
}

/// Whether the `data` field of a header is a link (as opposed to an inline
/// numeric value).
pub(crate) fn data_is_link(prim: PrimitiveType, dimension: u8) -> bool {
    dimension > 0 || prim == PrimitiveType::Container || prim.is_string()
}

/// Inline encoding of a numeric scalar.
pub(crate) fn inline_bits(value: &Scalar) -> u64 {
    match value {
        Scalar::Int8(v) => u64::from(*v as u8),
        Scalar::Uint8(v) => u64::from(*v),
        Scalar::Int16(v) => u64::from(*v as u16),
        Scalar::Uint16(v) | Scalar::Enum16(v) => u64::from(*v),
        Scalar::Int32(v) => u64::from(*v as u32),
        Scalar::Uint32(v) => u64::from(*v),
        Scalar::Float32(v) => u64::from(v.to_bits()),
        Scalar::Float64(v) => v.to_bits(),
        _ => 0,
    }
}

/// Inverse of [`inline_bits`].
pub(crate) fn scalar_from_bits(prim: PrimitiveType, bits: u64) -> Scalar {
    match prim {
        PrimitiveType::Int8 => Scalar::Int8(bits as u8 as i8),
        PrimitiveType::Uint8 => Scalar::Uint8(bits as u8),
        PrimitiveType::Int16 => Scalar::Int16(bits as u16 as i16),
        PrimitiveType::Uint16 => Scalar::Uint16(bits as u16),
        PrimitiveType::Enum16 => Scalar::Enum16(bits as u16),
        PrimitiveType::Int32 => Scalar::Int32(bits as u32 as i32),
        PrimitiveType::Uint32 => Scalar::Uint32(bits as u32),
        PrimitiveType::Float32 => Scalar::Float32(f32::from_bits(bits as u32)),
        PrimitiveType::Float64 => Scalar::Float64(f64::from_bits(bits)),
        _ => Scalar::Invalid,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_link_modes() {
        let address = LinkMode::Address(0x1000);
        assert_eq!(address.encode(48), 0x1030);
        assert_eq!(address.decode(0x1030, 100), Some(48));
        assert_eq!(address.decode(0x0fff, 100), None);
        assert_eq!(address.decode(0x1000 + 100, 100), None);
        assert_eq!(LinkMode::Offsets.encode(48), 48);
        assert_eq!(LinkMode::Offsets.decode(48, 49), Some(48));
    }

    #[test]
    fn test_inline_scalars() {
        for value in [
            Scalar::Int8(-3),
            Scalar::Uint16(65535),
            Scalar::Int32(-70000),
            Scalar::Float32(1.25),
            Scalar::Float64(-2.5e300),
            Scalar::Enum16(4),
        ] {
            let bits = inline_bits(&value);
            assert_eq!(scalar_from_bits(value.kind(), bits), value);
        }
        assert_eq!(inline_bits(&Scalar::Int8(-1)), 0xFF);
    }

    #[test]
    fn test_data_link_kinds() {
        assert!(!data_is_link(PrimitiveType::Float64, 0));
        assert!(data_is_link(PrimitiveType::Float64, 1));
        assert!(data_is_link(PrimitiveType::String, 0));
        assert!(data_is_link(PrimitiveType::Container, 1));
        assert!(!data_is_link(PrimitiveType::Invalid, 0));
    }
}
