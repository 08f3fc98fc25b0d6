// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Flatten planner and writer.
//!
//! Planning snapshots the graph into an append-only arena of [`Planned`]
//! nodes in layout order, then assigns every header, bounds record and
//! payload an image offset. Writing only touches the arena, so a graph is
//! locked node by node while it is planned and never while bytes are
//! produced.

use super::cursor::{align_up, CursorMut};
use super::layout::{inline_bits, LinkMode};
use crate::config::{
    EMPTY_STRING_SENTINEL, FIXED_STRING_SIZE, FLAT_ALIGNMENT, FLAT_BOUNDS_SIZE, FLAT_HEADER_SIZE,
    FLAT_REF_SENTINEL, FLAT_STRING_RECORD_SIZE,
};
use crate::convert::{ElemSlice, Scalar};
use crate::destructor::SharedBuffer;
use crate::error::{GddError, Result};
use crate::types::{Bounds, FixedString, PrimitiveType, Status, TimeStamp};
use crate::value::{checked_elements, Body, Flags, Gdd};

/// What the `data` field of a header designates.
enum Payload {
    /// Untyped scalar, empty container or unallocated array.
    None,
    /// Numeric scalar stored in the header itself.
    Inline(u64),
    Fixed(FixedString),
    Text(String),
    /// Array elements; `count` is the described element count.
    Elements { buffer: SharedBuffer, count: usize },
    Children,
}

impl Payload {
    fn byte_size(&self) -> usize {
        match self {
            Payload::None | Payload::Inline(_) | Payload::Children => 0,
            Payload::Fixed(_) => FIXED_STRING_SIZE,
            Payload::Text(text) => strings_size(std::iter::once(text.as_str()), 1),
            Payload::Elements { buffer, count } => {
                let elements = buffer.read();
                match elements.as_slice() {
                    ElemSlice::String(values) => {
                        strings_size(values.iter().map(String::as_str), *count)
                    }
                    other => other.kind().size().saturating_mul(*count),
                }
            }
        }
    }
}

/// Record table plus characters for `count` strings (missing ones empty).
fn strings_size<'a>(values: impl Iterator<Item = &'a str>, count: usize) -> usize {
    let chars: usize = values
        .take(count)
        .filter(|s| !s.is_empty())
        .map(|s| s.len() + 1)
        .sum();
    count
        .saturating_mul(FLAT_STRING_RECORD_SIZE)
        .saturating_add(chars)
}

/// One node of the plan arena.
struct Planned {
    app: u16,
    prim: PrimitiveType,
    dimension: u8,
    flags: Flags,
    status: Status,
    stamp: TimeStamp,
    bounds: Vec<Bounds>,
    payload: Payload,
    first_child: Option<usize>,
    next: Option<usize>,
    bounds_at: usize,
    data_at: usize,
}

impl Planned {
    fn snapshot(gdd: &Gdd) -> Result<(Self, Vec<Gdd>)> {
        let node = gdd.node();
        let dimension = u8::try_from(node.body.dimension()).map_err(|_| {
            log::debug!(
                "[flat::plan] dimension {} does not fit a header",
                node.body.dimension()
            );
            GddError::NotSupported("flat::plan")
        })?;
        let mut children = Vec::new();
        let (bounds, payload) = match &node.body {
            Body::Scalar(value) => {
                let payload = match value {
                    Scalar::Invalid => Payload::None,
                    Scalar::FixedString(fixed) => Payload::Fixed(*fixed),
                    Scalar::String(text) => Payload::Text(text.clone()),
                    numeric => Payload::Inline(inline_bits(numeric)),
                };
                (Vec::new(), payload)
            }
            Body::Array {
                bounds, buffer, ..
            } => {
                let count = checked_elements(bounds, "flat::plan")?;
                let payload = match buffer {
                    Some(buffer) if count > 0 => Payload::Elements {
                        buffer: buffer.clone(),
                        count,
                    },
                    _ => Payload::None,
                };
                (bounds.clone(), payload)
            }
            Body::Container { children: kids } => {
                children = kids.iter().map(Gdd::share).collect();
                let payload = if kids.is_empty() {
                    Payload::None
                } else {
                    Payload::Children
                };
                (Vec::new(), payload)
            }
        };
        let planned = Self {
            app: node.app,
            prim: node.body.prim(),
            dimension,
            flags: node.flags & (Flags::NET | Flags::CONSTANT),
            status: node.status,
            stamp: node.stamp,
            bounds,
            payload,
            first_child: None,
            next: None,
            bounds_at: 0,
            data_at: 0,
        };
        Ok((planned, children))
    }
}

/// Arena of planned nodes with assigned offsets.
pub(crate) struct Plan {
    nodes: Vec<Planned>,
    total: usize,
}

impl Plan {
    pub(crate) fn build(root: &Gdd) -> Result<Self> {
        let (planned, children) = Planned::snapshot(root)?;
        let mut nodes = vec![planned];
        Self::expand(&mut nodes, 0, children)?;

        // Headers first, then per node bounds records and payload.
        let mut at = nodes.len() * FLAT_HEADER_SIZE;
        for node in &mut nodes {
            if !node.bounds.is_empty() {
                node.bounds_at = at;
                at = align_up(at + node.bounds.len() * FLAT_BOUNDS_SIZE, FLAT_ALIGNMENT);
            }
            let size = node.payload.byte_size();
            if size > 0 {
                node.data_at = at;
                let end = at
                    .checked_add(size)
                    .filter(|end| *end <= isize::MAX as usize)
                    .ok_or_else(|| {
                        log::debug!("[flat::plan] {} byte payload cannot be laid out", size);
                        GddError::OutOfBounds("flat::plan")
                    })?;
                at = align_up(end, FLAT_ALIGNMENT);
            }
        }
        log::trace!("[flat::plan] {} nodes, {} bytes", nodes.len(), at);
        Ok(Self { nodes, total: at })
    }

    /// Children of `parent` go contiguously at the end of the arena, then
    /// each child container is expanded in order.
    fn expand(nodes: &mut Vec<Planned>, parent: usize, children: Vec<Gdd>) -> Result<()> {
        if children.is_empty() {
            return Ok(());
        }
        let first = nodes.len();
        let mut grandchildren = Vec::with_capacity(children.len());
        for (k, child) in children.iter().enumerate() {
            let (mut planned, kids) = Planned::snapshot(child)?;
            if k + 1 < children.len() {
                planned.next = Some(first + k + 1);
            }
            nodes.push(planned);
            grandchildren.push(kids);
        }
        nodes[parent].first_child = Some(first);
        for (k, kids) in grandchildren.into_iter().enumerate() {
            Self::expand(nodes, first + k, kids)?;
        }
        Ok(())
    }

    pub(crate) fn total(&self) -> usize {
        self.total
    }

    pub(crate) fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Write the image into `buf[..total]`, which the caller has zeroed.
    pub(crate) fn write(&self, buf: &mut [u8], mode: LinkMode) -> Result<()> {
        if buf.len() < self.total {
            return Err(GddError::OutOfBounds("flat::write"));
        }
        let mut cursor = CursorMut::new(buf);
        let mut flag_bits = Flags::FLAT;
        if mode == LinkMode::Offsets {
            flag_bits |= Flags::OFFSETS;
        }
        for (index, node) in self.nodes.iter().enumerate() {
            self.write_header(&mut cursor, index, node, flag_bits, mode)?;
            if !node.bounds.is_empty() {
                cursor.seek(node.bounds_at)?;
                for bound in &node.bounds {
                    cursor.write_u32_le(bound.first())?;
                    cursor.write_u32_le(bound.size())?;
                }
            }
            write_payload(&mut cursor, node, mode)?;
        }
        Ok(())
    }

    fn write_header(
        &self,
        cursor: &mut CursorMut<'_>,
        index: usize,
        node: &Planned,
        flag_bits: Flags,
        mode: LinkMode,
    ) -> Result<()> {
        let link = |target: Option<usize>| target.map_or(0, |at| mode.encode(at));
        let data = match &node.payload {
            Payload::None => 0,
            Payload::Inline(bits) => *bits,
            Payload::Children => link(node.first_child.map(|c| c * FLAT_HEADER_SIZE)),
            _ => mode.encode(node.data_at),
        };
        let bounds = if node.bounds.is_empty() {
            0
        } else {
            mode.encode(node.bounds_at)
        };

        cursor.seek(index * FLAT_HEADER_SIZE)?;
        cursor.write_u8(node.prim as u8)?;
        cursor.write_u8(node.dimension)?;
        cursor.write_u16_le(node.app)?;
        cursor.write_u8((node.flags | flag_bits).bits())?;
        cursor.write_u8(0)?;
        cursor.write_u16_le(FLAT_REF_SENTINEL)?;
        cursor.write_u32_le(node.status.word())?;
        cursor.write_u64_le(node.stamp.sec())?;
        cursor.write_u32_le(node.stamp.nsec())?;
        cursor.write_u64_le(bounds)?;
        cursor.write_u64_le(data)?;
        cursor.write_u64_le(link(node.next.map(|n| n * FLAT_HEADER_SIZE)))
    }
}

macro_rules! write_numeric {
    ($cursor:expr, $values:expr, $count:expr) => {
        for value in $values.iter().take($count) {
            $cursor.write_bytes(&value.to_le_bytes())?;
        }
    };
}

fn write_payload(cursor: &mut CursorMut<'_>, node: &Planned, mode: LinkMode) -> Result<()> {
    match &node.payload {
        Payload::None | Payload::Inline(_) | Payload::Children => Ok(()),
        Payload::Fixed(fixed) => {
            cursor.seek(node.data_at)?;
            cursor.write_bytes(fixed.as_bytes())
        }
        Payload::Text(text) => {
            write_strings(cursor, std::iter::once(text.as_str()), 1, node.data_at, mode)
        }
        Payload::Elements { buffer, count } => {
            let elements = buffer.read();
            cursor.seek(node.data_at)?;
            // Elements past the buffer stay zero.
            match elements.as_slice() {
                ElemSlice::Int8(v) => write_numeric!(cursor, v, *count),
                ElemSlice::Uint8(v) => write_numeric!(cursor, v, *count),
                ElemSlice::Int16(v) => write_numeric!(cursor, v, *count),
                ElemSlice::Uint16(v) | ElemSlice::Enum16(v) => write_numeric!(cursor, v, *count),
                ElemSlice::Int32(v) => write_numeric!(cursor, v, *count),
                ElemSlice::Uint32(v) => write_numeric!(cursor, v, *count),
                ElemSlice::Float32(v) => write_numeric!(cursor, v, *count),
                ElemSlice::Float64(v) => write_numeric!(cursor, v, *count),
                ElemSlice::FixedString(v) => {
                    for fixed in v.iter().take(*count) {
                        cursor.write_bytes(fixed.as_bytes())?;
                    }
                }
                ElemSlice::String(v) => {
                    write_strings(cursor, v.iter().map(String::as_str), *count, node.data_at, mode)?
                }
            }
            Ok(())
        }
    }
}

/// `count` string records at `at`, characters packed after the table.
fn write_strings<'a>(
    cursor: &mut CursorMut<'_>,
    mut values: impl Iterator<Item = &'a str>,
    count: usize,
    at: usize,
    mode: LinkMode,
) -> Result<()> {
    let mut chars_at = at + count * FLAT_STRING_RECORD_SIZE;
    for i in 0..count {
        let text = values.next().unwrap_or("");
        cursor.seek(at + i * FLAT_STRING_RECORD_SIZE)?;
        if text.is_empty() {
            cursor.write_u64_le(EMPTY_STRING_SENTINEL)?;
            cursor.write_u32_le(0)?;
            cursor.write_u32_le(0)?;
            continue;
        }
        let len = u32::try_from(text.len()).map_err(|_| GddError::NotSupported("flat::write"))?;
        cursor.write_u64_le(mode.encode(chars_at))?;
        cursor.write_u32_le(len)?;
        cursor.write_u32_le(len + 1)?;
        cursor.seek(chars_at)?;
        cursor.write_bytes(text.as_bytes())?;
        cursor.write_u8(0)?;
        chars_at += text.len() + 1;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_layout_order() {
        let root = Gdd::container(1);
        let inner = Gdd::container(2);
        inner.insert(Gdd::from_value(4, 1.5f64)).expect("insert");
        root.insert(inner).expect("insert");
        root.insert(Gdd::from_value(3, "abc")).expect("insert");

        let plan = Plan::build(&root).expect("plan");
        assert_eq!(plan.node_count(), 4);
        let apps: Vec<u16> = plan.nodes.iter().map(|n| n.app).collect();
        assert_eq!(apps, vec![1, 2, 3, 4]);
        assert_eq!(plan.nodes[0].first_child, Some(1));
        assert_eq!(plan.nodes[1].next, Some(2));
        assert_eq!(plan.nodes[1].first_child, Some(3));
        assert_eq!(plan.nodes[2].next, None);

        // 4 headers, then the "abc" record and characters.
        assert_eq!(plan.nodes[2].data_at, 4 * FLAT_HEADER_SIZE);
        assert_eq!(plan.total(), 4 * FLAT_HEADER_SIZE + 24);
    }

    #[test]
    fn test_plan_array_sizes() {
        let array = Gdd::array(1, PrimitiveType::Int16, &[3]);
        array.put_array(&[1i16, 2, 3]).expect("put");
        let plan = Plan::build(&array).expect("plan");
        let node = &plan.nodes[0];
        assert_eq!(node.bounds_at, FLAT_HEADER_SIZE);
        assert_eq!(node.data_at, FLAT_HEADER_SIZE + 8);
        assert_eq!(plan.total(), FLAT_HEADER_SIZE + 8 + 8);

        let unallocated = Gdd::array(1, PrimitiveType::Float64, &[4]);
        let plan = Plan::build(&unallocated).expect("plan");
        assert_eq!(plan.total(), FLAT_HEADER_SIZE + 8);
    }

    #[test]
    fn test_write_too_small() {
        let value = Gdd::from_value(1, 2u32);
        let plan = Plan::build(&value).expect("plan");
        let mut buf = vec![0u8; plan.total() - 1];
        assert!(plan.write(&mut buf, LinkMode::Offsets).is_err());
    }
}
