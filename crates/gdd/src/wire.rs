// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Header/data stream codec for scalars and arrays.
//!
//! ```text
//! "HEAD" | dim u8 | prim u8 | app u16 | status u32 | ts sec u32 | ts nsec u32
//! per dimension: count u32, first u32
//! payload: described elements in network order
//! ```
//!
//! Header integers are big-endian. The payload goes through the
//! [`ConversionMatrix::to_wire`] table on the way out and
//! [`ConversionMatrix::from_wire`] on the way in. Strings of either kind
//! travel as NUL-terminated fixed-size records. Containers are not
//! encoded.

use crate::config::FIXED_STRING_SIZE;
use crate::convert::{ConversionMatrix, ElemSlice, Elements};
use crate::error::{GddError, Result};
use crate::flat::cursor::{Cursor, CursorMut};
use crate::types::{Bounds, FixedString, PrimitiveType, Status, TimeStamp};
use crate::value::{checked_elements, Gdd};

/// Stream marker.
pub const WIRE_MAGIC: &[u8; 4] = b"HEAD";

/// Header bytes before the bounds records.
pub const WIRE_HEADER_SIZE: usize = 20;

/// Bytes per bounds record.
pub const WIRE_BOUNDS_SIZE: usize = 8;

/// Bytes of one element of `prim` on the wire.
pub const fn wire_element_size(prim: PrimitiveType) -> usize {
    match prim {
        PrimitiveType::FixedString | PrimitiveType::String => FIXED_STRING_SIZE,
        other => other.size(),
    }
}

/// Header size of `gdd`, bounds included.
pub fn header_size(gdd: &Gdd) -> usize {
    WIRE_HEADER_SIZE + gdd.dimension() * WIRE_BOUNDS_SIZE
}

/// Payload size of `gdd`.
pub fn data_size(gdd: &Gdd) -> usize {
    wire_element_size(gdd.primitive_type()).saturating_mul(gdd.data_size_elements())
}

/// Header plus payload.
pub fn encoded_size(gdd: &Gdd) -> usize {
    header_size(gdd).saturating_add(data_size(gdd))
}

/// Encode `gdd` into `buf`; returns the bytes written.
pub fn encode(gdd: &Gdd, buf: &mut [u8]) -> Result<usize> {
    if gdd.is_container() {
        log::debug!("[wire::encode] containers are not encoded");
        return Err(GddError::NotSupported("wire::encode"));
    }
    let needed = encoded_size(gdd);
    if buf.len() < needed {
        log::debug!(
            "[wire::encode] {} byte buffer for {} bytes",
            buf.len(),
            needed
        );
        return Err(GddError::OutOfBounds("wire::encode"));
    }
    let mut cursor = CursorMut::new(buf);
    encode_header(gdd, &mut cursor)?;
    encode_data(gdd, &mut cursor)?;
    Ok(cursor.offset())
}

fn encode_header(gdd: &Gdd, cursor: &mut CursorMut<'_>) -> Result<()> {
    let dimension = u8::try_from(gdd.dimension())
        .map_err(|_| GddError::NotSupported("wire::encode"))?;
    let stamp = gdd.timestamp();
    let sec = u32::try_from(stamp.sec()).map_err(|_| {
        log::debug!("[wire::encode] time stamp {} exceeds 32 bits", stamp.sec());
        GddError::NotSupported("wire::encode")
    })?;

    cursor.write_bytes(WIRE_MAGIC)?;
    cursor.write_u8(dimension)?;
    cursor.write_u8(gdd.primitive_type() as u8)?;
    cursor.write_u16_be(gdd.app_type())?;
    cursor.write_u32_be(gdd.status().word())?;
    cursor.write_u32_be(sec)?;
    cursor.write_u32_be(stamp.nsec())?;
    for bound in gdd.bounds() {
        cursor.write_u32_be(bound.size())?;
        cursor.write_u32_be(bound.first())?;
    }
    Ok(())
}

macro_rules! write_raw {
    ($cursor:expr, $values:expr) => {
        for value in $values.iter() {
            $cursor.write_bytes(&value.to_ne_bytes())?;
        }
    };
}

fn encode_data(gdd: &Gdd, cursor: &mut CursorMut<'_>) -> Result<()> {
    let count = gdd.data_size_elements();
    let prim = gdd.primitive_type();
    if count == 0 {
        return Ok(());
    }
    let local = gdd.get_elements(prim, None)?;
    let mut wire = Elements::zeroed(prim, count).ok_or(GddError::TypeMismatch("wire::encode"))?;
    ConversionMatrix::to_wire().convert(&mut wire.as_slice_mut(), &local.as_slice(), count, None)?;

    match wire.as_slice() {
        ElemSlice::Int8(v) => write_raw!(cursor, v),
        ElemSlice::Uint8(v) => cursor.write_bytes(v)?,
        ElemSlice::Int16(v) => write_raw!(cursor, v),
        ElemSlice::Uint16(v) | ElemSlice::Enum16(v) => write_raw!(cursor, v),
        ElemSlice::Int32(v) => write_raw!(cursor, v),
        ElemSlice::Uint32(v) => write_raw!(cursor, v),
        ElemSlice::Float32(v) => write_raw!(cursor, v),
        ElemSlice::Float64(v) => write_raw!(cursor, v),
        ElemSlice::FixedString(v) => {
            for fixed in v {
                cursor.write_bytes(fixed.as_bytes())?;
            }
        }
        ElemSlice::String(v) => {
            for text in v {
                if !FixedString::fits(text) {
                    log::debug!(
                        "[wire::encode] {} byte string exceeds a fixed record",
                        text.len()
                    );
                    return Err(GddError::NotSupported("wire::encode"));
                }
                cursor.write_bytes(FixedString::new(text).as_bytes())?;
            }
        }
    }
    Ok(())
}

macro_rules! read_raw {
    ($cursor:expr, $count:expr, $ty:ty) => {{
        const SIZE: usize = std::mem::size_of::<$ty>();
        $cursor
            .read_bytes($count * SIZE)?
            .chunks_exact(SIZE)
            .map(|chunk| {
                let mut bytes = [0u8; SIZE];
                bytes.copy_from_slice(chunk);
                <$ty>::from_ne_bytes(bytes)
            })
            .collect()
    }};
}

/// Decode one value from the front of `buf`.
///
/// Returns the value and the number of bytes consumed.
pub fn decode(buf: &[u8]) -> Result<(Gdd, usize)> {
    let mut cursor = Cursor::new(buf);
    if cursor.read_bytes(WIRE_MAGIC.len())? != WIRE_MAGIC {
        log::debug!("[wire::decode] missing stream marker");
        return Err(GddError::TypeMismatch("wire::decode"));
    }
    let dimension = cursor.read_u8()?;
    let prim = PrimitiveType::try_from(cursor.read_u8()?)?;
    if prim == PrimitiveType::Container {
        return Err(GddError::NotSupported("wire::decode"));
    }
    let app = cursor.read_u16_be()?;
    let status = Status::from_word(cursor.read_u32_be()?);
    let sec = cursor.read_u32_be()?;
    let nsec = cursor.read_u32_be()?;
    let bounds: Vec<Bounds> = (0..dimension)
        .map(|_| {
            let count = cursor.read_u32_be()?;
            let first = cursor.read_u32_be()?;
            Ok(Bounds::new(first, count))
        })
        .collect::<Result<_>>()?;

    let count = if bounds.is_empty() {
        usize::from(prim != PrimitiveType::Invalid)
    } else {
        checked_elements(&bounds, "wire::decode")?
    };
    let fits = count
        .checked_mul(wire_element_size(prim))
        .is_some_and(|bytes| bytes <= cursor.remaining());
    if !fits {
        log::debug!(
            "[wire::decode] {} x {} described, {} bytes left",
            count,
            prim,
            cursor.remaining()
        );
        return Err(GddError::OutOfBounds("wire::decode"));
    }

    let gdd = if bounds.is_empty() {
        Gdd::scalar(app, prim)
    } else {
        Gdd::with_bounds(app, prim, &bounds)
    };
    if count > 0 {
        let wire = read_elements(&mut cursor, prim, count)?;
        let mut local =
            Elements::zeroed(prim, count).ok_or(GddError::TypeMismatch("wire::decode"))?;
        ConversionMatrix::from_wire().convert(
            &mut local.as_slice_mut(),
            &wire.as_slice(),
            count,
            None,
        )?;
        if bounds.is_empty() {
            let value = local.get(0).ok_or(GddError::OutOfBounds("wire::decode"))?;
            gdd.put_scalar(value)?;
        } else {
            gdd.put_ref(local, None)?;
        }
    }
    gdd.set_status(status);
    gdd.set_timestamp(TimeStamp::new(u64::from(sec), nsec));
    gdd.mark_local_format();
    Ok((gdd, cursor.offset()))
}

fn read_elements(cursor: &mut Cursor<'_>, prim: PrimitiveType, count: usize) -> Result<Elements> {
    let fixed = |cursor: &mut Cursor<'_>| -> Result<FixedString> {
        let mut raw = [0u8; FIXED_STRING_SIZE];
        raw.copy_from_slice(cursor.read_bytes(FIXED_STRING_SIZE)?);
        Ok(FixedString::from_bytes(raw))
    };
    let elements = match prim {
        PrimitiveType::Int8 => Elements::Int8(read_raw!(cursor, count, i8)),
        PrimitiveType::Uint8 => Elements::Uint8(cursor.read_bytes(count)?.to_vec()),
        PrimitiveType::Int16 => Elements::Int16(read_raw!(cursor, count, i16)),
        PrimitiveType::Uint16 => Elements::Uint16(read_raw!(cursor, count, u16)),
        PrimitiveType::Enum16 => Elements::Enum16(read_raw!(cursor, count, u16)),
        PrimitiveType::Int32 => Elements::Int32(read_raw!(cursor, count, i32)),
        PrimitiveType::Uint32 => Elements::Uint32(read_raw!(cursor, count, u32)),
        PrimitiveType::Float32 => Elements::Float32(read_raw!(cursor, count, f32)),
        PrimitiveType::Float64 => Elements::Float64(read_raw!(cursor, count, f64)),
        PrimitiveType::FixedString => {
            Elements::FixedString((0..count).map(|_| fixed(cursor)).collect::<Result<_>>()?)
        }
        PrimitiveType::String => Elements::String(
            (0..count)
                .map(|_| fixed(cursor).map(|f| f.as_str().to_string()))
                .collect::<Result<_>>()?,
        ),
        PrimitiveType::Invalid | PrimitiveType::Container => {
            return Err(GddError::TypeMismatch("wire::decode"))
        }
    };
    Ok(elements)
}
