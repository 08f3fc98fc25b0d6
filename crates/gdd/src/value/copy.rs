// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Whole-value copies and value-to-value puts.

use super::{Body, Flags, Gdd, Node};
use crate::convert::{convert_elements, ConversionMatrix, Elements};
use crate::destructor::{DataBuffer, SharedBuffer};
use crate::error::{GddError, Result};
use crate::types::{PrimitiveType, Status, TimeStamp};
use std::sync::Arc;

/// How payloads travel when a graph is copied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyMode {
    /// Shape and scalar values; arrays come out unallocated.
    Info,
    /// Shape plus a freshly allocated copy of every payload.
    Deep,
    /// Shape plus the same payload buffers, shared.
    Dup,
}

/// What `put_gdd` needs from its source, taken under one read lock.
struct Source {
    kind: PrimitiveType,
    dimension: usize,
    first: u32,
    count: u32,
    data: Option<Elements>,
    container: bool,
    status: Status,
    stamp: TimeStamp,
}

impl Source {
    fn take(gdd: &Gdd) -> Self {
        let node = gdd.node();
        let mut source = Source {
            kind: node.body.prim(),
            dimension: node.body.dimension(),
            first: 0,
            count: 1,
            data: None,
            container: false,
            status: node.status,
            stamp: node.stamp,
        };
        match &node.body {
            Body::Scalar(s) => source.data = Elements::from_scalar(s),
            Body::Array {
                prim,
                bounds,
                buffer,
            } => {
                if let Some(b) = bounds.first() {
                    source.first = b.first();
                    source.count = b.size();
                }
                source.data = match buffer {
                    Some(buffer) => Some(buffer.read().clone()),
                    None => Elements::zeroed(*prim, source.count as usize),
                };
            }
            Body::Container { .. } => source.container = true,
        }
        source
    }
}

impl Gdd {
    /// Copy shape and scalar data from `src`.
    pub fn copy_info(&self, src: &Gdd) -> Result<()> {
        self.copy_with(src, CopyMode::Info, "Gdd::copy_info")
    }

    /// Copy shape and payloads from `src` into fresh storage.
    pub fn copy(&self, src: &Gdd) -> Result<()> {
        self.copy_with(src, CopyMode::Deep, "Gdd::copy")
    }

    /// Copy shape from `src`, sharing its payloads.
    pub fn dup(&self, src: &Gdd) -> Result<()> {
        self.copy_with(src, CopyMode::Dup, "Gdd::dup")
    }

    /// New graph with the shape of this one.
    pub fn duplicate(&self, mode: CopyMode) -> Gdd {
        Gdd::from_node(self.clone_node(mode))
    }

    fn copy_with(&self, src: &Gdd, mode: CopyMode, op: &'static str) -> Result<()> {
        if self.ptr_eq(src) {
            return Ok(());
        }
        let copied = src.clone_node(mode);
        let old = {
            let mut node = self.node_mut();
            node.check_reshapable(op)?;
            node.app = copied.app;
            node.status = copied.status;
            node.stamp = copied.stamp;
            node.flags.set(Flags::NET, copied.flags.contains(Flags::NET));
            std::mem::replace(&mut node.body, copied.body)
        };
        drop(old);
        Ok(())
    }

    pub(crate) fn clone_node(&self, mode: CopyMode) -> Node {
        let node = self.node();
        let body = match &node.body {
            Body::Scalar(s) => Body::Scalar(s.clone()),
            Body::Array {
                prim,
                bounds,
                buffer,
            } => Body::Array {
                prim: *prim,
                bounds: bounds.clone(),
                buffer: match mode {
                    CopyMode::Info => None,
                    CopyMode::Deep => buffer
                        .as_ref()
                        .map(|b| DataBuffer::with_default(b.read().clone())),
                    CopyMode::Dup => buffer.clone(),
                },
            },
            Body::Container { children } => Body::Container {
                children: children
                    .iter()
                    .map(|c| Gdd::from_node(c.clone_node(mode)))
                    .collect(),
            },
        };
        Node {
            app: node.app,
            flags: node.flags & Flags::NET,
            status: node.status,
            stamp: node.stamp,
            body,
        }
    }

    /// Put the value of `src` into this value, converting into its kind.
    ///
    /// Scalars and one-dimensional arrays only. For arrays the source range
    /// is clipped to the destination bounds and destination elements the
    /// source does not cover are zeroed. An unallocated destination takes
    /// the clipped source range as its bounds. Status and time stamp follow
    /// the source.
    pub fn put_gdd(&self, src: &Gdd) -> Result<()> {
        if self.ptr_eq(src) {
            return Ok(());
        }
        let source = Source::take(src);
        if source.container || self.is_container() {
            return Err(GddError::NotSupported("Gdd::put_gdd"));
        }
        if source.dimension > 1 || self.dimension() > 1 {
            log::debug!("[Gdd::put_gdd] multi-dimensional put refused");
            return Err(GddError::OutOfBounds("Gdd::put_gdd"));
        }
        let data = source
            .data
            .as_ref()
            .ok_or(GddError::TypeMismatch("Gdd::put_gdd"))?;

        let mut node = self.node_mut();
        node.check_writable("Gdd::put_gdd")?;
        match &mut node.body {
            Body::Scalar(s) => {
                let first = data.get(0).ok_or(GddError::OutOfBounds("Gdd::put_gdd"))?;
                *s = if s.kind() == PrimitiveType::Invalid {
                    first
                } else {
                    ConversionMatrix::native().convert_scalar(s.kind(), first, None)?
                };
            }
            Body::Array {
                prim,
                bounds,
                buffer,
            } => {
                let dst = bounds
                    .first()
                    .copied()
                    .ok_or(GddError::OutOfBounds("Gdd::put_gdd"))?;
                let copy_first = dst.first().max(source.first);
                let skipped = (copy_first - source.first) as usize;
                let src_count = source.count as usize;
                if src_count != 0 && src_count <= skipped {
                    return Err(GddError::OutOfBounds("Gdd::put_gdd"));
                }
                let available = src_count.saturating_sub(skipped);
                let dest_size = dst.size() as usize;
                let copy_size = if dest_size > 0 && available > dest_size {
                    dest_size
                } else {
                    available
                };
                if *prim == PrimitiveType::Invalid {
                    *prim = source.kind;
                }
                let clipped = data
                    .as_slice()
                    .range(skipped, copy_size)
                    .ok_or(GddError::OutOfBounds("Gdd::put_gdd"))?;
                let staged = convert_elements(*prim, &clipped, None)?;

                match buffer {
                    None => {
                        *buffer = Some(DataBuffer::with_default(staged));
                        bounds[0].set(copy_first, copy_size as u32);
                    }
                    Some(b) => {
                        let low = (copy_first - dst.first()) as usize;
                        if low + copy_size > dest_size {
                            return Err(GddError::OutOfBounds("Gdd::put_gdd"));
                        }
                        let mut elements = b.write();
                        if elements.len() < dest_size || elements.kind() != *prim {
                            return Err(GddError::OutOfBounds("Gdd::put_gdd"));
                        }
                        let mut view = elements.as_slice_mut();
                        if let Some(mut region) = view.range_mut(0, dest_size) {
                            region.fill_zero();
                        }
                        if let Some(mut target) = view.range_mut(low, copy_size) {
                            target.copy_from(&staged.as_slice(), copy_size);
                        }
                    }
                }
            }
            Body::Container { .. } => return Err(GddError::NotSupported("Gdd::put_gdd")),
        }
        node.status = source.status;
        node.stamp = source.stamp;
        Ok(())
    }

    /// Share the payload of `src` when both are one-dimensional arrays of
    /// the same kind; otherwise behave like [`put_gdd`](Self::put_gdd).
    pub fn put_ref_gdd(&self, src: &Gdd) -> Result<()> {
        if self.ptr_eq(src) {
            return Ok(());
        }
        let shared: Option<(PrimitiveType, _, SharedBuffer, Status, TimeStamp)> = {
            let s = src.node();
            match &s.body {
                Body::Array {
                    prim,
                    bounds,
                    buffer: Some(b),
                } if bounds.len() == 1 => {
                    Some((*prim, bounds.clone(), Arc::clone(b), s.status, s.stamp))
                }
                _ => None,
            }
        };
        let Some((kind, src_bounds, shared, status, stamp)) = shared else {
            return self.put_gdd(src);
        };

        let mut node = self.node_mut();
        node.check_writable("Gdd::put_ref_gdd")?;
        let compatible = matches!(
            &node.body,
            Body::Array { prim, bounds, .. }
                if bounds.len() == 1 && (*prim == kind || *prim == PrimitiveType::Invalid)
        );
        if !compatible {
            drop(node);
            return self.put_gdd(src);
        }
        let old = match &mut node.body {
            Body::Array {
                prim,
                bounds,
                buffer,
            } => {
                *prim = kind;
                *bounds = src_bounds;
                buffer.replace(shared)
            }
            _ => None,
        };
        node.status = status;
        node.stamp = stamp;
        drop(node);
        drop(old);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Bounds;

    fn sample_container() -> Gdd {
        let c = Gdd::container(10);
        c.insert(Gdd::from_value(11, 3.5f64)).expect("insert");
        c.insert(Gdd::from_elements(12, Elements::Int16(vec![1, 2, 3])))
            .expect("insert");
        c
    }

    #[test]
    fn test_copy_modes() {
        let src = sample_container();
        let array = src.child(1).expect("array child");

        let info = Gdd::new();
        info.copy_info(&src).expect("copy_info");
        assert_eq!(info.total(), 2);
        assert_eq!(info.child(0).expect("scalar").get::<f64>(), Ok(3.5));
        assert!(info.child(1).expect("array").data_buffer().is_none());

        let deep = Gdd::new();
        deep.copy(&src).expect("copy");
        let deep_buf = deep.child(1).expect("array").data_buffer().expect("buffer");
        let src_buf = array.data_buffer().expect("buffer");
        assert!(!Arc::ptr_eq(&deep_buf, &src_buf));
        assert_eq!(*deep_buf.read(), *src_buf.read());

        let dup = Gdd::new();
        dup.dup(&src).expect("dup");
        let dup_buf = dup.child(1).expect("array").data_buffer().expect("buffer");
        assert!(Arc::ptr_eq(&dup_buf, &src_buf));
        assert!(!dup.child(1).expect("array").ptr_eq(&array));
    }

    #[test]
    fn test_copy_refused_on_managed() {
        let dst = Gdd::new();
        dst.node_mut().flags.insert(Flags::MANAGED);
        assert!(matches!(
            dst.copy(&Gdd::from_value(1, 1u8)),
            Err(GddError::NotAllowed(_))
        ));
    }

    #[test]
    fn test_put_gdd_scalar_converts() {
        let dst = Gdd::scalar(1, PrimitiveType::Int32);
        let src = Gdd::from_value(2, 41.7f32);
        src.set_stat_sevr(3, 1);
        src.set_timestamp(TimeStamp::new(9, 9));
        dst.put_gdd(&src).expect("put_gdd");
        assert_eq!(dst.get::<i32>(), Ok(41));
        assert_eq!(dst.primitive_type(), PrimitiveType::Int32);
        assert_eq!(dst.status(), Status::new(3, 1));
        assert_eq!(dst.timestamp(), TimeStamp::new(9, 9));

        let untyped = Gdd::new();
        untyped.put_gdd(&src).expect("untyped adopts");
        assert_eq!(untyped.primitive_type(), PrimitiveType::Float32);
    }

    #[test]
    fn test_put_gdd_clips_and_zero_fills() {
        let dst = Gdd::with_bounds(1, PrimitiveType::Int32, &[Bounds::new(2, 4)]);
        dst.put_array(&[9i32, 9, 9, 9]).expect("prefill");

        // source covers indices 3..6
        let src = Gdd::with_bounds(2, PrimitiveType::Int16, &[Bounds::new(3, 3)]);
        src.put_array(&[1i16, 2, 3]).expect("source data");

        dst.put_gdd(&src).expect("clipped put");
        assert_eq!(dst.get_array::<i32>(), Ok(vec![0, 1, 2, 3]));
        assert_eq!(dst.bound(0), Ok(Bounds::new(2, 4)));
    }

    #[test]
    fn test_put_gdd_allocates_from_source_range() {
        let dst = Gdd::atomic(1, PrimitiveType::Float64, 1);
        let src = Gdd::from_elements(2, Elements::Uint8(vec![5, 6, 7]));
        dst.put_gdd(&src).expect("put into unallocated");
        assert_eq!(dst.bound(0), Ok(Bounds::new(0, 3)));
        assert_eq!(dst.get_array::<f64>(), Ok(vec![5.0, 6.0, 7.0]));
    }

    #[test]
    fn test_put_gdd_refusals() {
        let dst = Gdd::scalar(1, PrimitiveType::Int8);
        assert!(matches!(
            dst.put_gdd(&Gdd::container(2)),
            Err(GddError::NotSupported(_))
        ));
        assert!(matches!(
            dst.put_gdd(&Gdd::array(2, PrimitiveType::Int8, &[2, 2])),
            Err(GddError::OutOfBounds(_))
        ));
        let late = Gdd::with_bounds(1, PrimitiveType::Int8, &[Bounds::new(10, 2)]);
        assert!(matches!(
            late.put_gdd(&Gdd::from_elements(2, Elements::Int8(vec![1, 2]))),
            Err(GddError::OutOfBounds(_))
        ));
        let overflow = Gdd::from_value(2, 1000i32);
        assert!(matches!(dst.put_gdd(&overflow), Err(GddError::TypeMismatch(_))));
        assert_eq!(dst.get::<i8>(), Ok(0));
    }

    #[test]
    fn test_put_ref_gdd_shares_when_kinds_match() {
        let src = Gdd::from_elements(1, Elements::Float32(vec![1.0, 2.0]));
        let same = Gdd::atomic(2, PrimitiveType::Float32, 1);
        same.put_ref_gdd(&src).expect("share");
        assert!(Arc::ptr_eq(
            &same.data_buffer().expect("shared"),
            &src.data_buffer().expect("source")
        ));

        let other = Gdd::array(3, PrimitiveType::Int32, &[2]);
        other.put_ref_gdd(&src).expect("fallback");
        assert_eq!(other.get_array::<i32>(), Ok(vec![1, 2]));
        assert!(!Arc::ptr_eq(
            &other.data_buffer().expect("own"),
            &src.data_buffer().expect("source")
        ));
    }
}
