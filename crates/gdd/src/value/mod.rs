// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! The generic data descriptor.
//!
//! A [`Gdd`] is a shared handle on one node of a value graph. Each node
//! carries an application tag, status/severity, a time stamp, flags and one
//! of three bodies:
//!
//! | Body        | Payload                                     |
//! |-------------|---------------------------------------------|
//! | `Scalar`    | one inline [`Scalar`] (or untyped)          |
//! | `Array`     | bounds per dimension + optional [`SharedBuffer`] |
//! | `Container` | ordered child handles (bound 0 = child count)    |
//!
//! Handles are reference counted with `Arc`. [`Gdd::reference`] hands out a
//! new handle after checking the no-referencing flag and the count limit;
//! dropping (or [`Gdd::unreference`]) releases it. When the last handle of a
//! container goes away each child is released exactly once, and a payload is
//! handed to its destructor only after every sharer is gone.

mod access;
mod container;
mod copy;
mod describe;

pub use copy::CopyMode;

use crate::config::REF_COUNT_LIMIT;
use crate::convert::{Elements, Scalar};
use crate::destructor::{DataBuffer, SharedBuffer};
use crate::error::{GddError, Result};
use crate::registry::Recycler;
use crate::types::{Bounds, PrimitiveType, Status, TimeStamp};
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::sync::Arc;

bitflags::bitflags! {
    /// Ownership and format flags; values match the flattened header byte.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Flags: u8 {
        /// Owned by a registry pool; the whole subtree is recycled at once.
        const MANAGED = 0x01;
        /// Part of a flattened image.
        const FLAT = 0x02;
        /// Payload is in wire byte order.
        const NET = 0x04;
        /// No further handles may be taken.
        const NO_REF = 0x08;
        /// Read-only.
        const CONSTANT = 0x10;
        /// Flattened image whose links are offsets, not addresses.
        const OFFSETS = 0x20;
    }
}

/// Payload of a node.
#[derive(Debug)]
pub(crate) enum Body {
    Scalar(Scalar),
    Array {
        prim: PrimitiveType,
        bounds: Vec<Bounds>,
        buffer: Option<SharedBuffer>,
    },
    Container {
        children: Vec<Gdd>,
    },
}

impl Default for Body {
    fn default() -> Self {
        Body::Scalar(Scalar::Invalid)
    }
}

impl Body {
    fn new(prim: PrimitiveType, bounds: &[Bounds]) -> Self {
        if prim == PrimitiveType::Container {
            return Body::Container {
                children: Vec::new(),
            };
        }
        if bounds.is_empty() {
            Body::Scalar(Scalar::zero(prim))
        } else {
            Body::Array {
                prim,
                bounds: bounds.to_vec(),
                buffer: None,
            }
        }
    }

    pub(crate) fn prim(&self) -> PrimitiveType {
        match self {
            Body::Scalar(s) => s.kind(),
            Body::Array { prim, .. } => *prim,
            Body::Container { .. } => PrimitiveType::Container,
        }
    }

    pub(crate) fn dimension(&self) -> usize {
        match self {
            Body::Scalar(_) => 0,
            Body::Array { bounds, .. } => bounds.len(),
            Body::Container { .. } => 1,
        }
    }

    pub(crate) fn bounds(&self) -> Vec<Bounds> {
        match self {
            Body::Scalar(_) => Vec::new(),
            Body::Array { bounds, .. } => bounds.clone(),
            Body::Container { children } => vec![Bounds::with_count(children.len() as u32)],
        }
    }
}

/// One node of a value graph.
#[derive(Debug, Default)]
pub(crate) struct Node {
    pub(crate) app: u16,
    pub(crate) flags: Flags,
    pub(crate) status: Status,
    pub(crate) stamp: TimeStamp,
    pub(crate) body: Body,
}

impl Node {
    pub(crate) fn new(app: u16, prim: PrimitiveType, bounds: &[Bounds]) -> Self {
        Self {
            app,
            body: Body::new(prim, bounds),
            ..Self::default()
        }
    }

    /// Data writes: refused on constant and flat nodes.
    pub(crate) fn check_writable(&self, op: &'static str) -> Result<()> {
        if self.flags.intersects(Flags::CONSTANT | Flags::FLAT) {
            log::debug!("[{}] node is read-only ({:?})", op, self.flags);
            return Err(GddError::NotAllowed(op));
        }
        Ok(())
    }

    /// Shape changes: additionally refused on managed and no-referencing nodes.
    pub(crate) fn check_reshapable(&self, op: &'static str) -> Result<()> {
        if self
            .flags
            .intersects(Flags::CONSTANT | Flags::FLAT | Flags::MANAGED | Flags::NO_REF)
        {
            log::debug!("[{}] shape is fixed ({:?})", op, self.flags);
            return Err(GddError::NotAllowed(op));
        }
        Ok(())
    }
}

pub(crate) struct GddInner {
    node: RwLock<Node>,
    recycler: Option<Recycler>,
}

impl Drop for GddInner {
    fn drop(&mut self) {
        if let Some(recycler) = self.recycler.take() {
            let node = std::mem::take(self.node.get_mut());
            recycler.recycle(node);
        }
    }
}

/// Shared handle on a descriptor node.
pub struct Gdd {
    inner: Arc<GddInner>,
}

impl Gdd {
    // ------------------------------------------------------------------
    // Construction
    // ------------------------------------------------------------------

    /// Untyped scalar with application tag 0.
    pub fn new() -> Self {
        Self::from_node(Node::default())
    }

    /// Untyped scalar with an application tag.
    pub fn with_app(app: u16) -> Self {
        Self::from_node(Node {
            app,
            ..Node::default()
        })
    }

    /// Zeroed scalar of `prim`.
    pub fn scalar(app: u16, prim: PrimitiveType) -> Self {
        Self::from_node(Node::new(app, prim, &[]))
    }

    /// Array with one `{0, count}` bound per entry of `counts`.
    ///
    /// An empty `counts` yields a scalar; `prim == Container` yields an
    /// empty container.
    pub fn array(app: u16, prim: PrimitiveType, counts: &[u32]) -> Self {
        let bounds: Vec<Bounds> = counts.iter().map(|c| Bounds::with_count(*c)).collect();
        Self::from_node(Node::new(app, prim, &bounds))
    }

    /// Array of `dimension` zero-sized bounds.
    pub fn atomic(app: u16, prim: PrimitiveType, dimension: usize) -> Self {
        Self::from_node(Node::new(app, prim, &vec![Bounds::default(); dimension]))
    }

    /// Array with explicit bounds.
    pub fn with_bounds(app: u16, prim: PrimitiveType, bounds: &[Bounds]) -> Self {
        Self::from_node(Node::new(app, prim, bounds))
    }

    /// Empty container.
    pub fn container(app: u16) -> Self {
        Self::from_node(Node::new(app, PrimitiveType::Container, &[]))
    }

    /// Scalar holding `value`.
    pub fn from_value(app: u16, value: impl Into<Scalar>) -> Self {
        Self::from_node(Node {
            app,
            body: Body::Scalar(value.into()),
            ..Node::default()
        })
    }

    /// One-dimensional array owning `elements` (default destructor).
    pub fn from_elements(app: u16, elements: Elements) -> Self {
        Self::from_node(Node {
            app,
            body: Body::Array {
                prim: elements.kind(),
                bounds: vec![Bounds::with_count(elements.len() as u32)],
                buffer: Some(DataBuffer::with_default(elements)),
            },
            ..Node::default()
        })
    }

    pub(crate) fn from_node(node: Node) -> Self {
        Self {
            inner: Arc::new(GddInner {
                node: RwLock::new(node),
                recycler: None,
            }),
        }
    }

    pub(crate) fn from_node_managed(node: Node, recycler: Recycler) -> Self {
        Self {
            inner: Arc::new(GddInner {
                node: RwLock::new(node),
                recycler: Some(recycler),
            }),
        }
    }

    pub(crate) fn node(&self) -> RwLockReadGuard<'_, Node> {
        self.inner.node.read()
    }

    pub(crate) fn node_mut(&self) -> RwLockWriteGuard<'_, Node> {
        self.inner.node.write()
    }

    /// Second handle without the reference checks (internal traversal).
    pub(crate) fn share(&self) -> Gdd {
        Gdd {
            inner: Arc::clone(&self.inner),
        }
    }

    /// True when both handles designate the same node.
    pub fn ptr_eq(&self, other: &Gdd) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    // ------------------------------------------------------------------
    // Reference counting
    // ------------------------------------------------------------------

    /// Take another handle on this node.
    pub fn reference(&self) -> Result<Gdd> {
        if self.node().flags.contains(Flags::NO_REF) {
            log::warn!("[Gdd::reference] no-referencing descriptor, reference refused");
            return Err(GddError::NotAllowed("Gdd::reference"));
        }
        if Arc::strong_count(&self.inner) >= REF_COUNT_LIMIT {
            log::error!("[Gdd::reference] reference count overflow");
            return Err(GddError::Overflow("Gdd::reference"));
        }
        Ok(self.share())
    }

    /// Release this handle.
    pub fn unreference(self) -> Result<()> {
        drop(self);
        Ok(())
    }

    /// Number of live handles on this node.
    pub fn reference_count(&self) -> usize {
        Arc::strong_count(&self.inner)
    }

    /// Forbid further handles. Fails when the node is already shared.
    pub fn no_referencing(&self) -> Result<()> {
        if self.reference_count() > 1 {
            return Err(GddError::NotAllowed("Gdd::no_referencing"));
        }
        self.node_mut().flags.insert(Flags::NO_REF);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Identity and shape
    // ------------------------------------------------------------------

    pub fn app_type(&self) -> u16 {
        self.node().app
    }

    pub fn set_app_type(&self, app: u16) -> Result<()> {
        let mut node = self.node_mut();
        node.check_writable("Gdd::set_app_type")?;
        node.app = app;
        Ok(())
    }

    pub fn primitive_type(&self) -> PrimitiveType {
        self.node().body.prim()
    }

    pub fn dimension(&self) -> usize {
        self.node().body.dimension()
    }

    pub fn is_scalar(&self) -> bool {
        matches!(self.node().body, Body::Scalar(_))
    }

    pub fn is_atomic(&self) -> bool {
        matches!(self.node().body, Body::Array { .. })
    }

    pub fn is_container(&self) -> bool {
        matches!(self.node().body, Body::Container { .. })
    }

    /// No primitive type assigned yet.
    pub fn is_untyped(&self) -> bool {
        self.primitive_type() == PrimitiveType::Invalid
    }

    pub fn bounds(&self) -> Vec<Bounds> {
        self.node().body.bounds()
    }

    pub fn bound(&self, dim: usize) -> Result<Bounds> {
        self.node()
            .body
            .bounds()
            .get(dim)
            .copied()
            .ok_or(GddError::OutOfBounds("Gdd::bound"))
    }

    /// Set bound `dim` of an array.
    pub fn set_bound(&self, dim: usize, first: u32, count: u32) -> Result<()> {
        let mut node = self.node_mut();
        node.check_writable("Gdd::set_bound")?;
        match &mut node.body {
            Body::Array { bounds, .. } => {
                let b = bounds
                    .get_mut(dim)
                    .ok_or(GddError::OutOfBounds("Gdd::set_bound"))?;
                b.set(first, count);
                Ok(())
            }
            Body::Scalar(_) => Err(GddError::OutOfBounds("Gdd::set_bound")),
            Body::Container { .. } => Err(GddError::NotAllowed("Gdd::set_bound")),
        }
    }

    /// Reassign tag and primitive type of a scalar or untyped node.
    pub fn change_type(&self, app: u16, prim: PrimitiveType) -> Result<()> {
        let mut node = self.node_mut();
        node.check_writable("Gdd::change_type")?;
        let untyped = node.body.prim() == PrimitiveType::Invalid;
        match &mut node.body {
            Body::Scalar(_) if prim == PrimitiveType::Container => {
                if !untyped {
                    log::debug!("[Gdd::change_type] typed scalar cannot become a container");
                    return Err(GddError::TypeMismatch("Gdd::change_type"));
                }
                node.body = Body::Container {
                    children: Vec::new(),
                };
            }
            Body::Scalar(s) => *s = Scalar::zero(prim),
            Body::Array { prim: p, .. } if untyped && prim != PrimitiveType::Container => *p = prim,
            _ => {
                log::debug!(
                    "[Gdd::change_type] {} node with data cannot change type",
                    node.body.prim()
                );
                return Err(GddError::TypeMismatch("Gdd::change_type"));
            }
        }
        node.app = app;
        Ok(())
    }

    /// Reassign the primitive type of a scalar or untyped node.
    pub fn set_prim_type(&self, prim: PrimitiveType) -> Result<()> {
        let app = self.app_type();
        self.change_type(app, prim)
    }

    /// Change the number of dimensions; payload and bounds are discarded.
    pub fn set_dimension(&self, dimension: usize, bounds: Option<&[Bounds]>) -> Result<()> {
        let old = {
            let mut node = self.node_mut();
            node.check_reshapable("Gdd::set_dimension")?;
            let prim = node.body.prim();
            if prim == PrimitiveType::Container {
                return Err(GddError::TypeMismatch("Gdd::set_dimension"));
            }
            if node.body.dimension() == dimension && bounds.is_none() {
                return Ok(());
            }
            let new_bounds = match bounds {
                Some(b) if b.len() == dimension => b.to_vec(),
                Some(_) => return Err(GddError::OutOfBounds("Gdd::set_dimension")),
                None => vec![Bounds::default(); dimension],
            };
            std::mem::replace(&mut node.body, Body::new(prim, &new_bounds))
        };
        drop(old);
        Ok(())
    }

    /// Return to an untyped scalar, releasing payload and children.
    pub fn clear(&self) -> Result<()> {
        let old = {
            let mut node = self.node_mut();
            node.check_reshapable("Gdd::clear")?;
            std::mem::take(&mut node.body)
        };
        drop(old);
        Ok(())
    }

    /// `clear` then reinitialise as `prim` with `{0, count}` bounds.
    ///
    /// Both steps happen under one write lock.
    pub fn reset(&self, prim: PrimitiveType, counts: &[u32]) -> Result<()> {
        let bounds: Vec<Bounds> = counts.iter().map(|c| Bounds::with_count(*c)).collect();
        let old = {
            let mut node = self.node_mut();
            node.check_reshapable("Gdd::reset")?;
            std::mem::replace(&mut node.body, Body::new(prim, &bounds))
        };
        drop(old);
        Ok(())
    }

    /// Release payload only; scalars return to zero, arrays lose their
    /// buffer and element counts.
    pub fn clear_data(&self) -> Result<()> {
        let old = {
            let mut node = self.node_mut();
            node.check_writable("Gdd::clear_data")?;
            match &mut node.body {
                Body::Scalar(s) => {
                    *s = Scalar::zero(s.kind());
                    None
                }
                Body::Array { bounds, buffer, .. } => {
                    bounds.iter_mut().for_each(|b| b.set(0, 0));
                    buffer.take()
                }
                Body::Container { .. } => return Err(GddError::NotAllowed("Gdd::clear_data")),
            }
        };
        drop(old);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Status, severity and time stamp
    // ------------------------------------------------------------------

    pub fn status(&self) -> Status {
        self.node().status
    }

    pub fn stat(&self) -> u16 {
        self.node().status.stat
    }

    pub fn severity(&self) -> u16 {
        self.node().status.sevr
    }

    pub fn set_status(&self, status: Status) {
        self.node_mut().status = status;
    }

    pub fn set_stat_sevr(&self, stat: u16, sevr: u16) {
        self.set_status(Status::new(stat, sevr));
    }

    pub fn timestamp(&self) -> TimeStamp {
        self.node().stamp
    }

    pub fn set_timestamp(&self, stamp: TimeStamp) {
        self.node_mut().stamp = stamp;
    }

    /// Stamp with the current time.
    pub fn stamp_now(&self) {
        self.set_timestamp(TimeStamp::now());
    }

    // ------------------------------------------------------------------
    // Flags
    // ------------------------------------------------------------------

    pub fn flags(&self) -> Flags {
        self.node().flags
    }

    pub fn is_managed(&self) -> bool {
        self.flags().contains(Flags::MANAGED)
    }

    pub fn is_flat(&self) -> bool {
        self.flags().contains(Flags::FLAT)
    }

    pub fn is_constant(&self) -> bool {
        self.flags().contains(Flags::CONSTANT)
    }

    pub fn is_no_ref(&self) -> bool {
        self.flags().contains(Flags::NO_REF)
    }

    pub fn is_network_format(&self) -> bool {
        self.flags().contains(Flags::NET)
    }

    pub fn mark_constant(&self) {
        self.node_mut().flags.insert(Flags::CONSTANT);
    }

    pub fn mark_network_format(&self) {
        self.node_mut().flags.insert(Flags::NET);
    }

    pub fn mark_local_format(&self) {
        self.node_mut().flags.remove(Flags::NET);
    }

    pub(crate) fn mark_managed_tree(&self) {
        self.node_mut().flags.insert(Flags::MANAGED);
        for child in self.children() {
            child.mark_managed_tree();
        }
    }

    // ------------------------------------------------------------------
    // Sizes
    // ------------------------------------------------------------------

    /// Described element count: 1 for a typed scalar, the product of the
    /// bound counts for an array, the child count for a container.
    pub fn data_size_elements(&self) -> usize {
        let node = self.node();
        match &node.body {
            Body::Scalar(Scalar::Invalid) => 0,
            Body::Scalar(_) => 1,
            Body::Array { bounds, .. } => described_elements(bounds),
            Body::Container { children } => children.len(),
        }
    }

    /// Described payload bytes (element size times element count).
    pub fn data_size_bytes(&self) -> usize {
        if self.is_container() {
            return self.children().iter().map(Gdd::data_size_bytes).sum();
        }
        self.primitive_type()
            .size()
            .saturating_mul(self.data_size_elements())
    }

    /// Bytes a flat image of this graph occupies.
    pub fn total_size_bytes(&self) -> usize {
        crate::flat::flattened_size(self)
    }
}

/// Element count described by `bounds`, saturating on overflow.
pub(crate) fn described_elements(bounds: &[Bounds]) -> usize {
    if bounds.is_empty() {
        return 0;
    }
    bounds
        .iter()
        .fold(1usize, |acc, b| acc.saturating_mul(b.size() as usize))
}

/// Element count described by untrusted `bounds`; OutOfBounds on overflow.
pub(crate) fn checked_elements(bounds: &[Bounds], op: &'static str) -> Result<usize> {
    if bounds.is_empty() {
        return Ok(0);
    }
    bounds
        .iter()
        .try_fold(1usize, |acc, b| acc.checked_mul(b.size() as usize))
        .ok_or_else(|| {
            log::debug!("[{}] element count of {} dimensions overflows", op, bounds.len());
            GddError::OutOfBounds(op)
        })
}

impl Default for Gdd {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Gdd {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let node = self.node();
        f.debug_struct("Gdd")
            .field("app", &node.app)
            .field("prim", &node.body.prim())
            .field("bounds", &node.body.bounds())
            .field("flags", &node.flags)
            .field("refs", &Arc::strong_count(&self.inner))
            .finish()
    }
}
