// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Per-prototype free lists.
//!
//! Every prototype owns one [`ShapePool`]. Instances handed out by
//! `get_dd` carry a [`Recycler`] pointing back at it; when the last handle
//! on an instance goes away its root node is restored to the prototype's
//! content and pushed on the free list. A pool that no longer exists (the
//! registry was dropped) simply lets the node go.

use crate::destructor::DataBuffer;
use crate::error::{GddError, Result};
use crate::value::{Body, CopyMode, Flags, Gdd, Node};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Weak};

/// Counters of one prototype pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PoolStats {
    /// Instances built from the prototype.
    pub constructed: u64,
    /// Instances returned to the free list.
    pub recycled: u64,
    /// Instances handed out and not yet released.
    pub live: usize,
    /// Instances waiting on the free list.
    pub pooled: usize,
}

/// Drop hook of a managed instance.
pub(crate) struct Recycler {
    pool: Weak<ShapePool>,
}

impl Recycler {
    pub(crate) fn recycle(self, node: Node) {
        match self.pool.upgrade() {
            Some(pool) => pool.give_back(node),
            None => drop(node),
        }
    }
}

pub(crate) struct ShapePool {
    tag: u16,
    prototype: Gdd,
    free: Mutex<Vec<Node>>,
    limit: Option<usize>,
    live: AtomicUsize,
    constructed: AtomicU64,
    recycled: AtomicU64,
}

impl ShapePool {
    pub(crate) fn new(tag: u16, prototype: Gdd, limit: Option<usize>) -> Arc<Self> {
        Arc::new(Self {
            tag,
            prototype,
            free: Mutex::new(Vec::new()),
            limit,
            live: AtomicUsize::new(0),
            constructed: AtomicU64::new(0),
            recycled: AtomicU64::new(0),
        })
    }

    pub(crate) fn prototype(&self) -> &Gdd {
        &self.prototype
    }

    /// Pop a released instance or build a new one.
    pub(crate) fn take(self: &Arc<Self>) -> Result<Gdd> {
        let popped = self.free.lock().pop();
        let node = match popped {
            Some(node) => node,
            None => {
                if let Some(limit) = self.limit {
                    let held = self.live.load(Ordering::Acquire) + self.free.lock().len();
                    if held >= limit {
                        log::warn!(
                            "[ShapePool::take] tag {} pool limit {} reached",
                            self.tag,
                            limit
                        );
                        return Err(GddError::NewFailed("ApplicationTypeRegistry::get_dd"));
                    }
                }
                self.constructed.fetch_add(1, Ordering::Relaxed);
                log::trace!("[ShapePool::take] building instance of tag {}", self.tag);
                let mut node = self.prototype.clone_node(CopyMode::Deep);
                mark_managed(&mut node);
                node
            }
        };
        self.live.fetch_add(1, Ordering::AcqRel);
        Ok(Gdd::from_node_managed(
            node,
            Recycler {
                pool: Arc::downgrade(self),
            },
        ))
    }

    fn give_back(&self, mut node: Node) {
        self.live.fetch_sub(1, Ordering::AcqRel);
        let restored = {
            let proto = self.prototype.node();
            restore(&mut node, &proto)
        };
        if restored {
            self.recycled.fetch_add(1, Ordering::Relaxed);
            log::trace!("[ShapePool::give_back] tag {} instance recycled", self.tag);
            self.free.lock().push(node);
        } else {
            log::debug!(
                "[ShapePool::give_back] tag {} instance still shared or reshaped, discarded",
                self.tag
            );
        }
    }

    pub(crate) fn stats(&self) -> PoolStats {
        PoolStats {
            constructed: self.constructed.load(Ordering::Relaxed),
            recycled: self.recycled.load(Ordering::Relaxed),
            live: self.live.load(Ordering::Acquire),
            pooled: self.free.lock().len(),
        }
    }
}

fn mark_managed(node: &mut Node) {
    node.flags.insert(Flags::MANAGED);
    if let Body::Container { children } = &node.body {
        for child in children {
            child.mark_managed_tree();
        }
    }
}

/// Reset `node` and its subtree to the prototype's content.
///
/// Returns false when the subtree can not be reused: a descendant is still
/// held elsewhere or the shape no longer matches.
fn restore(node: &mut Node, proto: &Node) -> bool {
    node.app = proto.app;
    node.status = proto.status;
    node.stamp = proto.stamp;
    node.flags = (proto.flags & Flags::NET) | Flags::MANAGED;
    match (&mut node.body, &proto.body) {
        (Body::Container { children }, Body::Container { children: template }) => {
            children.len() == template.len()
                && children.iter().zip(template).all(|(child, t)| {
                    child.reference_count() == 1 && restore(&mut child.node_mut(), &t.node())
                })
        }
        (Body::Container { .. }, _) | (_, Body::Container { .. }) => false,
        (body, Body::Scalar(s)) => {
            *body = Body::Scalar(s.clone());
            true
        }
        (
            body,
            Body::Array {
                prim,
                bounds,
                buffer: template,
            },
        ) => {
            let buffer = template
                .as_ref()
                .map(|t| DataBuffer::with_default(t.read().clone()));
            *body = Body::Array {
                prim: *prim,
                bounds: bounds.clone(),
                buffer,
            };
            true
        }
    }
}
