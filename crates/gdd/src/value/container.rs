// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Container membership and traversal.
//!
//! Descendants are numbered in layout order: 0 is the root, then the
//! children of each container contiguously, containers expanded depth-first
//! in child order. Flat images use the same order for their headers.

use super::{Body, Gdd};
use crate::error::{GddError, Result};

impl Gdd {
    /// Append `child` to this container.
    pub fn insert(&self, child: Gdd) -> Result<()> {
        if self.ptr_eq(&child) || child.contains(self) {
            log::debug!("[Gdd::insert] insertion would create a cycle");
            return Err(GddError::NotAllowed("Gdd::insert"));
        }
        let mut node = self.node_mut();
        node.check_reshapable("Gdd::insert")?;
        match &mut node.body {
            Body::Container { children } => {
                children.push(child);
                Ok(())
            }
            _ => Err(GddError::TypeMismatch("Gdd::insert")),
        }
    }

    /// Detach and return child `index`.
    pub fn remove(&self, index: usize) -> Result<Gdd> {
        let mut node = self.node_mut();
        node.check_reshapable("Gdd::remove")?;
        match &mut node.body {
            Body::Container { children } if index < children.len() => Ok(children.remove(index)),
            Body::Container { .. } => Err(GddError::OutOfBounds("Gdd::remove")),
            _ => Err(GddError::TypeMismatch("Gdd::remove")),
        }
    }

    /// Number of direct children (0 for non-containers).
    pub fn total(&self) -> usize {
        match &self.node().body {
            Body::Container { children } => children.len(),
            _ => 0,
        }
    }

    pub fn child(&self, index: usize) -> Option<Gdd> {
        match &self.node().body {
            Body::Container { children } => children.get(index).map(Gdd::share),
            _ => None,
        }
    }

    pub fn children(&self) -> Vec<Gdd> {
        match &self.node().body {
            Body::Container { children } => children.iter().map(Gdd::share).collect(),
            _ => Vec::new(),
        }
    }

    /// Descendant `index` in layout order; 0 is this value.
    pub fn index_dd(&self, index: usize) -> Option<Gdd> {
        self.layout_order().into_iter().nth(index)
    }

    /// First node in layout order carrying `app`.
    pub fn find(&self, app: u16) -> Option<Gdd> {
        self.layout_order().into_iter().find(|g| g.app_type() == app)
    }

    /// Position of the first node carrying `app` in layout order.
    pub fn position_of(&self, app: u16) -> Option<usize> {
        self.layout_order().iter().position(|g| g.app_type() == app)
    }

    /// Number of nodes in the graph, root included.
    pub fn node_count(&self) -> usize {
        1 + self.children().iter().map(Gdd::node_count).sum::<usize>()
    }

    /// Every node of the graph in layout order.
    pub fn layout_order(&self) -> Vec<Gdd> {
        let mut order = vec![self.share()];
        append_children(self, &mut order);
        order
    }

    pub(crate) fn contains(&self, target: &Gdd) -> bool {
        self.children()
            .iter()
            .any(|c| c.ptr_eq(target) || c.contains(target))
    }
}

fn append_children(parent: &Gdd, order: &mut Vec<Gdd>) {
    let children = parent.children();
    order.extend(children.iter().map(Gdd::share));
    for child in &children {
        append_children(child, order);
    }
}
