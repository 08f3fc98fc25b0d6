// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Flat image decoding, restore and link relocation.

use super::cursor::Cursor;
use super::layout::{
    address_mode, data_is_link, scalar_from_bits, LinkMode, H_BOUNDS, H_DATA, H_FLAGS, H_NEXT,
};
use crate::config::{
    EMPTY_STRING_SENTINEL, FIXED_STRING_SIZE, FLAT_HEADER_SIZE, FLAT_MAX_NESTING,
    FLAT_STRING_RECORD_SIZE,
};
use crate::convert::{Elements, Scalar};
use crate::destructor::DataBuffer;
use crate::error::{GddError, Result};
use crate::types::{Bounds, FixedString, PrimitiveType, Status, TimeStamp};
use crate::value::{checked_elements, Body, Flags, Gdd, Node};
use std::collections::{HashMap, HashSet};

/// Decoded header.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Header {
    pub(crate) at: usize,
    pub(crate) prim: PrimitiveType,
    pub(crate) dimension: u8,
    pub(crate) app: u16,
    pub(crate) flags: Flags,
    pub(crate) status: Status,
    pub(crate) stamp: TimeStamp,
    pub(crate) bounds: u64,
    pub(crate) data: u64,
    pub(crate) next: u64,
}

/// A flat image and the link encoding it uses.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Image<'a> {
    buf: &'a [u8],
    mode: LinkMode,
}

impl<'a> Image<'a> {
    /// Check the root header and pick the link mode from its flags.
    pub(crate) fn open(buf: &'a [u8]) -> Result<Self> {
        if buf.len() < FLAT_HEADER_SIZE {
            log::debug!("[flat::open] {} bytes cannot hold a header", buf.len());
            return Err(GddError::OutOfBounds("flat::open"));
        }
        let flags = Flags::from_bits_truncate(buf[H_FLAGS]);
        if !flags.contains(Flags::FLAT) {
            log::debug!("[flat::open] root header is not flagged flat");
            return Err(GddError::TypeMismatch("flat::open"));
        }
        let mode = if flags.contains(Flags::OFFSETS) {
            LinkMode::Offsets
        } else {
            address_mode(buf)
        };
        Ok(Self { buf, mode })
    }

    pub(crate) fn bytes(&self) -> &'a [u8] {
        self.buf
    }

    pub(crate) fn mode(&self) -> LinkMode {
        self.mode
    }

    /// Image offset of a non-null link.
    ///
    /// A link outside the image means the image moved since it was written
    /// in address mode (NotAllowed) or is corrupt (OutOfBounds).
    pub(crate) fn resolve(&self, link: u64, op: &'static str) -> Result<usize> {
        self.mode.decode(link, self.buf.len()).ok_or_else(|| {
            log::debug!("[{}] link {:#x} outside the image", op, link);
            match self.mode {
                LinkMode::Address(_) => GddError::NotAllowed(op),
                LinkMode::Offsets => GddError::OutOfBounds(op),
            }
        })
    }

    pub(crate) fn header(&self, at: usize) -> Result<Header> {
        let mut cursor = Cursor::at(self.buf, at)?;
        let prim = PrimitiveType::try_from(cursor.read_u8()?)?;
        let dimension = cursor.read_u8()?;
        let app = cursor.read_u16_le()?;
        let flags = Flags::from_bits_truncate(cursor.read_u8()?);
        cursor.read_u8()?;
        cursor.read_u16_le()?;
        let status = Status::from_word(cursor.read_u32_le()?);
        let sec = cursor.read_u64_le()?;
        let nsec = cursor.read_u32_le()?;
        Ok(Header {
            at,
            prim,
            dimension,
            app,
            flags,
            status,
            stamp: TimeStamp::new(sec, nsec),
            bounds: cursor.read_u64_le()?,
            data: cursor.read_u64_le()?,
            next: cursor.read_u64_le()?,
        })
    }

    /// Headers of a container's children, in order.
    pub(crate) fn children(&self, header: &Header) -> Result<Vec<Header>> {
        let mut children = Vec::new();
        if header.prim != PrimitiveType::Container || header.data == 0 {
            return Ok(children);
        }
        let limit = self.buf.len() / FLAT_HEADER_SIZE;
        let mut link = header.data;
        while link != 0 {
            if children.len() >= limit {
                log::debug!("[flat::children] sibling chain longer than the image");
                return Err(GddError::OutOfBounds("flat::children"));
            }
            let child = self.header(self.resolve(link, "flat::children")?)?;
            link = child.next;
            children.push(child);
        }
        Ok(children)
    }

    pub(crate) fn bounds(&self, header: &Header) -> Result<Vec<Bounds>> {
        if header.prim == PrimitiveType::Container {
            let count = self.children(header)?.len();
            return Ok(vec![Bounds::with_count(count as u32)]);
        }
        if header.dimension == 0 {
            return Ok(Vec::new());
        }
        let at = self.resolve(header.bounds, "flat::bounds")?;
        let mut cursor = Cursor::at(self.buf, at)?;
        (0..header.dimension)
            .map(|_| {
                let first = cursor.read_u32_le()?;
                let count = cursor.read_u32_le()?;
                Ok(Bounds::new(first, count))
            })
            .collect()
    }

    pub(crate) fn scalar(&self, header: &Header) -> Result<Scalar> {
        match header.prim {
            PrimitiveType::FixedString => {
                let at = self.resolve(header.data, "flat::scalar")?;
                Ok(Scalar::FixedString(self.fixed_string(at)?))
            }
            PrimitiveType::String => {
                let at = self.resolve(header.data, "flat::scalar")?;
                Ok(Scalar::String(self.string_record(at)?))
            }
            prim => Ok(scalar_from_bits(prim, header.data)),
        }
    }

    /// Array payload; `None` when the array has no buffer.
    pub(crate) fn elements(&self, header: &Header, bounds: &[Bounds]) -> Result<Option<Elements>> {
        if header.data == 0 || bounds.is_empty() {
            return Ok(None);
        }
        let count = checked_elements(bounds, "flat::elements")?;
        let at = self.resolve(header.data, "flat::elements")?;
        let fits = count
            .checked_mul(header.prim.size())
            .and_then(|bytes| bytes.checked_add(at))
            .is_some_and(|end| end <= self.buf.len());
        if !fits {
            log::debug!(
                "[flat::elements] {} x {} at {} overruns the image",
                count,
                header.prim,
                at
            );
            return Err(GddError::OutOfBounds("flat::elements"));
        }
        let mut cursor = Cursor::at(self.buf, at)?;
        let elements = match header.prim {
            PrimitiveType::Int8 => Elements::Int8(read_n(count, || {
                Ok(cursor.read_u8()? as i8)
            })?),
            PrimitiveType::Uint8 => Elements::Uint8(cursor.read_bytes(count)?.to_vec()),
            PrimitiveType::Int16 => Elements::Int16(read_n(count, || {
                Ok(cursor.read_u16_le()? as i16)
            })?),
            PrimitiveType::Uint16 => Elements::Uint16(read_n(count, || cursor.read_u16_le())?),
            PrimitiveType::Enum16 => Elements::Enum16(read_n(count, || cursor.read_u16_le())?),
            PrimitiveType::Int32 => Elements::Int32(read_n(count, || {
                Ok(cursor.read_u32_le()? as i32)
            })?),
            PrimitiveType::Uint32 => Elements::Uint32(read_n(count, || cursor.read_u32_le())?),
            PrimitiveType::Float32 => Elements::Float32(read_n(count, || {
                Ok(f32::from_bits(cursor.read_u32_le()?))
            })?),
            PrimitiveType::Float64 => Elements::Float64(read_n(count, || {
                Ok(f64::from_bits(cursor.read_u64_le()?))
            })?),
            PrimitiveType::FixedString => Elements::FixedString(
                (0..count)
                    .map(|i| self.fixed_string(at + i * FIXED_STRING_SIZE))
                    .collect::<Result<_>>()?,
            ),
            PrimitiveType::String => Elements::String(
                (0..count)
                    .map(|i| self.string_record(at + i * FLAT_STRING_RECORD_SIZE))
                    .collect::<Result<_>>()?,
            ),
            PrimitiveType::Invalid | PrimitiveType::Container => return Ok(None),
        };
        Ok(Some(elements))
    }

    fn fixed_string(&self, at: usize) -> Result<FixedString> {
        let mut raw = [0u8; FIXED_STRING_SIZE];
        raw.copy_from_slice(Cursor::at(self.buf, at)?.read_bytes(FIXED_STRING_SIZE)?);
        Ok(FixedString::from_bytes(raw))
    }

    fn string_record(&self, at: usize) -> Result<String> {
        let mut cursor = Cursor::at(self.buf, at)?;
        let chars = cursor.read_u64_le()?;
        let len = cursor.read_u32_le()? as usize;
        if chars == EMPTY_STRING_SENTINEL || len == 0 {
            return Ok(String::new());
        }
        let start = self.resolve(chars, "flat::string")?;
        let bytes = Cursor::at(self.buf, start)?.read_bytes(len)?;
        String::from_utf8(bytes.to_vec()).map_err(|_| {
            log::debug!("[flat::string] record at {} is not valid UTF-8", at);
            GddError::TypeMismatch("flat::string")
        })
    }

    /// Every header reachable from the root, in layout order.
    pub(crate) fn walk(&self) -> Result<Vec<Header>> {
        self.walk_from(self.header(0)?)
    }

    /// Every header reachable from `top`, breadth first.
    ///
    /// Each header may be reached once, and containers may nest at most
    /// [`FLAT_MAX_NESTING`] levels; anything else is OutOfBounds.
    pub(crate) fn walk_from(&self, top: Header) -> Result<Vec<Header>> {
        let mut seen = HashSet::from([top.at]);
        let mut order = vec![top];
        let mut depth = vec![0usize];
        let mut i = 0;
        while i < order.len() {
            let current = order[i];
            let level = depth[i] + 1;
            for child in self.children(&current)? {
                if !seen.insert(child.at) {
                    log::debug!("[flat::walk] header {} reached twice", child.at);
                    return Err(GddError::OutOfBounds("flat::walk"));
                }
                if level > FLAT_MAX_NESTING {
                    log::debug!("[flat::walk] nesting deeper than {}", FLAT_MAX_NESTING);
                    return Err(GddError::OutOfBounds("flat::walk"));
                }
                order.push(child);
                depth.push(level);
            }
            i += 1;
        }
        Ok(order)
    }

    /// Rebuild a live graph below `header`.
    ///
    /// Nodes are built bottom-up over the walk order, so every header is
    /// decoded once. The result keeps only the network-format flag of each
    /// node.
    pub(crate) fn restore(&self, header: &Header) -> Result<Gdd> {
        let order = self.walk_from(*header)?;
        let mut built: HashMap<usize, Gdd> = HashMap::with_capacity(order.len());
        for current in order.iter().rev() {
            let body = match current.prim {
                PrimitiveType::Container => Body::Container {
                    children: self
                        .children(current)?
                        .iter()
                        .map(|child| {
                            built
                                .remove(&child.at)
                                .ok_or(GddError::OutOfBounds("flat::restore"))
                        })
                        .collect::<Result<_>>()?,
                },
                _ if current.dimension == 0 => Body::Scalar(self.scalar(current)?),
                prim => {
                    let bounds = self.bounds(current)?;
                    let buffer = self
                        .elements(current, &bounds)?
                        .map(DataBuffer::with_default);
                    Body::Array {
                        prim,
                        bounds,
                        buffer,
                    }
                }
            };
            let node = Gdd::from_node(Node {
                app: current.app,
                flags: current.flags & Flags::NET,
                status: current.status,
                stamp: current.stamp,
                body,
            });
            built.insert(current.at, node);
        }
        built
            .remove(&header.at)
            .ok_or(GddError::OutOfBounds("flat::restore"))
    }
}

fn read_n<T>(count: usize, mut next: impl FnMut() -> Result<T>) -> Result<Vec<T>> {
    (0..count).map(|_| next()).collect()
}

/// Rewrite every link of `buf` into the other mode and toggle OFFSETS.
///
/// Patches are collected from an immutable walk first, so a corrupt image
/// is left untouched.
pub(crate) fn relink(buf: &mut [u8], to_offsets: bool) -> Result<()> {
    let patches = {
        let image = Image::open(&*buf)?;
        if (image.mode() == LinkMode::Offsets) == to_offsets {
            return Ok(());
        }
        let target = if to_offsets {
            LinkMode::Offsets
        } else {
            address_mode(image.bytes())
        };
        collect_patches(&image, target)?
    };

    for (at, value) in patches.links {
        buf[at..at + 8].copy_from_slice(&value.to_le_bytes());
    }
    for at in patches.flags {
        if to_offsets {
            buf[at] |= Flags::OFFSETS.bits();
        } else {
            buf[at] &= !Flags::OFFSETS.bits();
        }
    }
    log::trace!(
        "[flat::relink] {} bytes now in {} mode",
        buf.len(),
        if to_offsets { "offset" } else { "address" }
    );
    Ok(())
}

struct Patches {
    links: Vec<(usize, u64)>,
    flags: Vec<usize>,
}

fn collect_patches(image: &Image<'_>, target: LinkMode) -> Result<Patches> {
    let mut patches = Patches {
        links: Vec::new(),
        flags: Vec::new(),
    };
    let relocate = |patches: &mut Patches, field: usize, link: u64| -> Result<()> {
        if link != 0 {
            let at = image.resolve(link, "flat::relink")?;
            patches.links.push((field, target.encode(at)));
        }
        Ok(())
    };

    for header in image.walk()? {
        patches.flags.push(header.at + H_FLAGS);
        if header.dimension > 0 && header.prim != PrimitiveType::Container {
            relocate(&mut patches, header.at + H_BOUNDS, header.bounds)?;
        }
        if data_is_link(header.prim, header.dimension) {
            relocate(&mut patches, header.at + H_DATA, header.data)?;
        }
        relocate(&mut patches, header.at + H_NEXT, header.next)?;

        if header.prim != PrimitiveType::String || header.data == 0 {
            continue;
        }
        let count = if header.dimension == 0 {
            1
        } else {
            checked_elements(&image.bounds(&header)?, "flat::relink")?
        };
        let records = image.resolve(header.data, "flat::relink")?;
        for i in 0..count {
            let field = records + i * FLAT_STRING_RECORD_SIZE;
            let chars = Cursor::at(image.bytes(), field)?.read_u64_le()?;
            if chars != EMPTY_STRING_SENTINEL {
                relocate(&mut patches, field, chars)?;
            }
        }
    }
    Ok(patches)
}

#[cfg(test)]
mod tests {
    use super::super::writer::Plan;
    use super::*;

    fn offsets_image(gdd: &Gdd) -> Vec<u8> {
        let plan = Plan::build(gdd).expect("plan");
        let mut buf = vec![0u8; plan.total()];
        plan.write(&mut buf, LinkMode::Offsets).expect("write");
        buf
    }

    #[test]
    fn test_open_rejects_plain_bytes() {
        assert!(matches!(
            Image::open(&[0u8; 8]),
            Err(GddError::OutOfBounds(_))
        ));
        assert!(matches!(
            Image::open(&[0u8; FLAT_HEADER_SIZE]),
            Err(GddError::TypeMismatch(_))
        ));
    }

    #[test]
    fn test_offsets_image_restores() {
        let root = Gdd::container(10);
        root.insert(Gdd::from_value(11, -7i32)).expect("insert");
        let names = Gdd::array(12, PrimitiveType::String, &[3]);
        names
            .put_elements(
                &Elements::String(vec!["a".into(), String::new(), "ccc".into()]).as_slice(),
                None,
            )
            .expect("put");
        root.insert(names).expect("insert");

        let buf = offsets_image(&root);
        let image = Image::open(&buf).expect("open");
        assert_eq!(image.mode(), LinkMode::Offsets);
        assert_eq!(image.walk().expect("walk").len(), 3);

        let restored = image.restore(&image.header(0).expect("root")).expect("restore");
        assert_eq!(restored.total(), 2);
        assert_eq!(restored.child(0).expect("child").get::<i32>().expect("get"), -7);
        let strings: Vec<String> = restored
            .child(1)
            .expect("child")
            .get_array()
            .expect("strings");
        assert_eq!(strings, vec!["a", "", "ccc"]);
        assert!(!restored.is_flat());
    }

    #[test]
    fn test_relink_round_trip() {
        let array = Gdd::array(3, PrimitiveType::Float32, &[2, 2]);
        array.put_array(&[1.0f32, 2.0, 3.0, 4.0]).expect("put");
        let original = offsets_image(&array);

        let mut buf = original.clone();
        relink(&mut buf, false).expect("to addresses");
        assert_ne!(buf, original);
        let image = Image::open(&buf).expect("open");
        assert!(matches!(image.mode(), LinkMode::Address(_)));
        let bounds = image.bounds(&image.header(0).expect("root")).expect("bounds");
        assert_eq!(bounds, vec![Bounds::with_count(2), Bounds::with_count(2)]);

        relink(&mut buf, true).expect("to offsets");
        assert_eq!(buf, original);
    }

    #[test]
    fn test_corrupt_link_rejected() {
        let value = Gdd::from_value(1, "text");
        let mut buf = offsets_image(&value);
        buf[H_DATA..H_DATA + 8].copy_from_slice(&(10_000u64).to_le_bytes());
        let image = Image::open(&buf).expect("open");
        let root = image.header(0).expect("root");
        assert!(matches!(image.scalar(&root), Err(GddError::OutOfBounds(_))));
        let before = buf.clone();
        assert!(relink(&mut buf, false).is_err());
        assert_eq!(buf, before);
    }
}
