// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Payload buffers and their cleanup hooks.
//!
//! An array descriptor points at a [`SharedBuffer`]: the element storage plus
//! an optional [`Destructor`]. Descriptors that share a payload (see
//! [`Gdd::dup`](crate::Gdd::dup)) share the `Arc`; the destructor runs exactly
//! once, when the last sharer lets go.
//!
//! ```
//! use gdd::{DataBuffer, Elements, ReturnDestructor};
//!
//! let (destructor, returned) = ReturnDestructor::channel();
//! let buffer = DataBuffer::new(Elements::Int32(vec![1, 2, 3]), Some(Box::new(destructor)));
//! let sharer = buffer.clone();
//! drop(buffer);
//! assert!(returned.try_recv().is_err());
//! drop(sharer);
//! assert_eq!(returned.try_recv().ok(), Some(Elements::Int32(vec![1, 2, 3])));
//! ```

use crate::convert::Elements;
use crate::error::{GddError, Result};
use crate::types::PrimitiveType;
use crossbeam::channel::{self, Receiver, Sender};
use parking_lot::{Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::fmt;
use std::sync::Arc;

/// Cleanup capability invoked once on a payload whose last owner is gone.
pub trait Destructor: Send {
    fn run(self: Box<Self>, payload: Elements);
}

/// Default destructor: releases the storage.
#[derive(Debug, Default, Clone, Copy)]
pub struct ReleaseDestructor;

impl Destructor for ReleaseDestructor {
    fn run(self: Box<Self>, payload: Elements) {
        drop(payload);
    }
}

/// Destructor backed by a closure.
pub struct FnDestructor<F>(F);

impl<F> FnDestructor<F>
where
    F: FnOnce(Elements) + Send,
{
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

impl<F> Destructor for FnDestructor<F>
where
    F: FnOnce(Elements) + Send,
{
    fn run(self: Box<Self>, payload: Elements) {
        (self.0)(payload);
    }
}

/// Hands the payload back to its lender instead of releasing it.
///
/// This is how a descriptor adopts a buffer it does not own.
#[derive(Debug, Clone)]
pub struct ReturnDestructor {
    tx: Sender<Elements>,
}

impl ReturnDestructor {
    pub fn new(tx: Sender<Elements>) -> Self {
        Self { tx }
    }

    /// Destructor plus the receiving end the lender keeps.
    pub fn channel() -> (Self, Receiver<Elements>) {
        let (tx, rx) = channel::unbounded();
        (Self { tx }, rx)
    }
}

impl Destructor for ReturnDestructor {
    fn run(self: Box<Self>, payload: Elements) {
        if self.tx.send(payload).is_err() {
            log::debug!("[ReturnDestructor::run] lender gone, releasing payload");
        }
    }
}

/// Payload shared between descriptors.
pub type SharedBuffer = Arc<DataBuffer>;

/// Element storage with its cleanup hook.
pub struct DataBuffer {
    elements: RwLock<Elements>,
    destructor: Mutex<Option<Box<dyn Destructor>>>,
}

impl DataBuffer {
    pub fn new(elements: Elements, destructor: Option<Box<dyn Destructor>>) -> SharedBuffer {
        Arc::new(Self {
            elements: RwLock::new(elements),
            destructor: Mutex::new(destructor),
        })
    }

    /// Buffer released by [`ReleaseDestructor`].
    pub fn with_default(elements: Elements) -> SharedBuffer {
        Self::new(elements, Some(Box::new(ReleaseDestructor)))
    }

    pub fn read(&self) -> RwLockReadGuard<'_, Elements> {
        self.elements.read()
    }

    /// Mutable access for the owning descriptor, which keeps kind and
    /// length in step with its own description.
    pub(crate) fn write(&self) -> RwLockWriteGuard<'_, Elements> {
        self.elements.write()
    }

    /// Replace the elements in place.
    ///
    /// Every sharer describes this payload by kind and length, so `elements`
    /// must match both: another kind is TypeMismatch, another length is
    /// OutOfBounds.
    pub fn store(&self, elements: Elements) -> Result<()> {
        let mut current = self.elements.write();
        if elements.kind() != current.kind() {
            log::debug!(
                "[DataBuffer::store] {} elements offered for a {} buffer",
                elements.kind(),
                current.kind()
            );
            return Err(GddError::TypeMismatch("DataBuffer::store"));
        }
        if elements.len() != current.len() {
            log::debug!(
                "[DataBuffer::store] {} elements offered for {}",
                elements.len(),
                current.len()
            );
            return Err(GddError::OutOfBounds("DataBuffer::store"));
        }
        *current = elements;
        Ok(())
    }

    pub fn kind(&self) -> PrimitiveType {
        self.elements.read().kind()
    }

    pub fn len(&self) -> usize {
        self.elements.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn has_destructor(&self) -> bool {
        self.destructor.lock().is_some()
    }

    /// Install a destructor where none is present.
    pub fn register_destructor(&self, destructor: Box<dyn Destructor>) -> Result<()> {
        let mut slot = self.destructor.lock();
        if slot.is_some() {
            return Err(GddError::AlreadyDefined("DataBuffer::register_destructor"));
        }
        *slot = Some(destructor);
        Ok(())
    }

    /// Swap the destructor, returning the previous one uninvoked.
    pub fn replace_destructor(
        &self,
        destructor: Option<Box<dyn Destructor>>,
    ) -> Option<Box<dyn Destructor>> {
        std::mem::replace(&mut *self.destructor.lock(), destructor)
    }
}

impl Drop for DataBuffer {
    fn drop(&mut self) {
        if let Some(destructor) = self.destructor.get_mut().take() {
            let payload = std::mem::take(self.elements.get_mut());
            destructor.run(payload);
        }
    }
}

impl fmt::Debug for DataBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataBuffer")
            .field("elements", &*self.elements.read())
            .field("destructor", &self.has_destructor())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting(counter: &Arc<AtomicUsize>) -> Box<dyn Destructor> {
        let counter = Arc::clone(counter);
        Box::new(FnDestructor::new(move |_payload| {
            counter.fetch_add(1, Ordering::SeqCst);
        }))
    }

    #[test]
    fn test_destructor_runs_once_after_last_sharer() {
        let runs = Arc::new(AtomicUsize::new(0));
        let buffer = DataBuffer::new(Elements::Uint8(vec![1, 2]), Some(counting(&runs)));
        let a = Arc::clone(&buffer);
        let b = Arc::clone(&buffer);
        drop(buffer);
        drop(a);
        assert_eq!(runs.load(Ordering::SeqCst), 0);
        drop(b);
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_register_twice_is_already_defined() {
        let buffer = DataBuffer::new(Elements::Uint8(vec![]), None);
        assert!(!buffer.has_destructor());
        buffer
            .register_destructor(Box::new(ReleaseDestructor))
            .expect("first register");
        assert!(matches!(
            buffer.register_destructor(Box::new(ReleaseDestructor)),
            Err(GddError::AlreadyDefined(_))
        ));
    }

    #[test]
    fn test_replace_returns_previous_uninvoked() {
        let runs = Arc::new(AtomicUsize::new(0));
        let buffer = DataBuffer::new(Elements::Int16(vec![5]), Some(counting(&runs)));
        let previous = buffer.replace_destructor(None);
        assert!(previous.is_some());
        drop(buffer);
        assert_eq!(runs.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_store_keeps_kind_and_length() {
        let buffer = DataBuffer::with_default(Elements::Int8(vec![1, 2, 3, 4]));
        assert!(matches!(
            buffer.store(Elements::Float64(vec![1.5, 2.5, 3.5, 4.5])),
            Err(GddError::TypeMismatch(_))
        ));
        assert!(matches!(
            buffer.store(Elements::Int8(vec![9])),
            Err(GddError::OutOfBounds(_))
        ));
        assert_eq!(*buffer.read(), Elements::Int8(vec![1, 2, 3, 4]));

        buffer.store(Elements::Int8(vec![4, 3, 2, 1])).expect("store");
        assert_eq!(*buffer.read(), Elements::Int8(vec![4, 3, 2, 1]));
    }

    #[test]
    fn test_return_destructor_hands_back_payload() {
        let (destructor, rx) = ReturnDestructor::channel();
        let buffer = DataBuffer::new(Elements::Float64(vec![0.5]), Some(Box::new(destructor)));
        buffer.write().as_slice_mut().fill_zero();
        drop(buffer);
        assert_eq!(rx.try_recv().ok(), Some(Elements::Float64(vec![0.0])));
    }
}
