// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Typed get/put accessors.

use super::{checked_elements, described_elements, Body, Gdd};
use crate::convert::{convert_elements, ConversionMatrix, ElemSlice, Elements, Primitive, Scalar};
use crate::destructor::{DataBuffer, Destructor, SharedBuffer};
use crate::error::{GddError, Result};
use crate::types::{EnumStringTable, PrimitiveType};

impl Gdd {
    // ------------------------------------------------------------------
    // Scalars
    // ------------------------------------------------------------------

    /// Store `value` in a scalar, adopting its kind.
    pub fn put<T: Primitive>(&self, value: T) -> Result<()> {
        self.put_scalar(value.into_scalar())
    }

    /// Store a raw scalar, adopting its kind.
    pub fn put_scalar(&self, value: Scalar) -> Result<()> {
        let mut node = self.node_mut();
        node.check_writable("Gdd::put")?;
        match &mut node.body {
            Body::Scalar(s) => {
                *s = value;
                Ok(())
            }
            _ => Err(GddError::TypeMismatch("Gdd::put")),
        }
    }

    /// Store `value` converted into the current kind.
    ///
    /// An untyped scalar adopts the kind of `value`; an array receives it
    /// as its first element.
    pub fn put_convert<T: Primitive>(&self, value: T) -> Result<()> {
        self.put_using(value, None)
    }

    /// [`put_convert`](Self::put_convert) with an enum string table.
    pub fn put_using<T: Primitive>(
        &self,
        value: T,
        table: Option<&dyn EnumStringTable>,
    ) -> Result<()> {
        let value = value.into_scalar();
        let prim = self.primitive_type();
        if self.is_scalar() {
            if prim == PrimitiveType::Invalid {
                return self.put_scalar(value);
            }
            let converted = ConversionMatrix::native().convert_scalar(prim, value, table)?;
            return self.put_scalar(converted);
        }
        if self.is_container() {
            return Err(GddError::TypeMismatch("Gdd::put_convert"));
        }
        let src = Elements::from_scalar(&value).ok_or(GddError::TypeMismatch("Gdd::put_convert"))?;
        let mut node = self.node_mut();
        node.check_writable("Gdd::put_convert")?;
        let Body::Array {
            prim,
            bounds,
            buffer,
        } = &mut node.body
        else {
            return Err(GddError::TypeMismatch("Gdd::put_convert"));
        };
        let kind = match buffer {
            Some(b) => b.kind(),
            None if *prim == PrimitiveType::Invalid => src.kind(),
            None => *prim,
        };
        let staged = convert_elements(kind, &src.as_slice(), table)?;
        let value = staged
            .get(0)
            .ok_or(GddError::OutOfBounds("Gdd::put_convert"))?;
        match buffer {
            Some(b) => {
                let mut elements = b.write();
                if !elements.as_slice_mut().set(0, value) {
                    return Err(GddError::OutOfBounds("Gdd::put_convert"));
                }
            }
            None => {
                let len = checked_elements(bounds, "Gdd::put_convert")?.max(1);
                let mut zeroed =
                    Elements::zeroed(kind, len).ok_or(GddError::TypeMismatch("Gdd::put_convert"))?;
                zeroed.as_slice_mut().set(0, value);
                *buffer = Some(DataBuffer::with_default(zeroed));
            }
        }
        *prim = kind;
        Ok(())
    }

    /// Read the value converted into `T`.
    ///
    /// Arrays yield their first element.
    pub fn get<T: Primitive>(&self) -> Result<T> {
        self.get_using(None)
    }

    /// [`get`](Self::get) with an enum string table.
    pub fn get_using<T: Primitive>(&self, table: Option<&dyn EnumStringTable>) -> Result<T> {
        let value = self.first_value()?;
        let converted = ConversionMatrix::native().convert_scalar(T::KIND, value, table)?;
        T::from_scalar(converted).ok_or(GddError::TypeMismatch("Gdd::get"))
    }

    /// Raw scalar value, or the first element of an array.
    pub fn value(&self) -> Result<Scalar> {
        self.first_value()
    }

    fn first_value(&self) -> Result<Scalar> {
        let node = self.node();
        match &node.body {
            Body::Scalar(Scalar::Invalid) => Err(GddError::TypeMismatch("Gdd::get")),
            Body::Scalar(s) => Ok(s.clone()),
            Body::Array { prim, buffer, .. } => match buffer {
                Some(b) => b.read().get(0).ok_or(GddError::OutOfBounds("Gdd::get")),
                None if *prim != PrimitiveType::Invalid => Ok(Scalar::zero(*prim)),
                None => Err(GddError::TypeMismatch("Gdd::get")),
            },
            Body::Container { .. } => Err(GddError::TypeMismatch("Gdd::get")),
        }
    }

    // ------------------------------------------------------------------
    // Arrays
    // ------------------------------------------------------------------

    /// Copy `values` into the array payload, converting into its kind.
    ///
    /// The first put on an unallocated array allocates a zeroed buffer with
    /// the default destructor; an untyped array adopts `T`'s kind.
    pub fn put_array<T: Primitive>(&self, values: &[T]) -> Result<()> {
        self.put_elements(&T::to_elements(values).as_slice(), None)
    }

    /// [`put_array`](Self::put_array) over an element view.
    ///
    /// A one-dimensional array with a zero count takes its count from
    /// `src`. Fewer source elements than described is OutOfBounds. The
    /// elements are converted before anything is committed, so a failed
    /// put leaves shape, kind and payload as they were.
    pub fn put_elements(
        &self,
        src: &ElemSlice<'_>,
        table: Option<&dyn EnumStringTable>,
    ) -> Result<()> {
        let mut node = self.node_mut();
        node.check_writable("Gdd::put_array")?;
        let Body::Array {
            prim,
            bounds,
            buffer,
        } = &mut node.body
        else {
            log::debug!("[Gdd::put_array] not an array");
            return Err(GddError::TypeMismatch("Gdd::put_array"));
        };
        let mut shape = bounds.clone();
        if shape.len() == 1 && shape[0].size() == 0 {
            let len = u32::try_from(src.len()).map_err(|_| GddError::OutOfBounds("Gdd::put_array"))?;
            shape[0].set_size(len);
        }
        let count = checked_elements(&shape, "Gdd::put_array")?;
        if src.len() < count {
            log::debug!(
                "[Gdd::put_array] {} source elements for {} described",
                src.len(),
                count
            );
            return Err(GddError::OutOfBounds("Gdd::put_array"));
        }
        let kind = match buffer {
            Some(b) => b.kind(),
            None if *prim == PrimitiveType::Invalid => src.kind(),
            None => *prim,
        };
        let head = src
            .range(0, count)
            .ok_or(GddError::OutOfBounds("Gdd::put_array"))?;
        let staged = convert_elements(kind, &head, table)?;

        match buffer {
            Some(b) => {
                let mut elements = b.write();
                if elements.len() < count {
                    return Err(GddError::OutOfBounds("Gdd::put_array"));
                }
                if let Some(mut target) = elements.as_slice_mut().range_mut(0, count) {
                    target.copy_from(&staged.as_slice(), count);
                }
            }
            None => {
                log::trace!("[Gdd::put_array] allocated {} x {}", count, kind);
                *buffer = Some(DataBuffer::with_default(staged));
            }
        }
        *bounds = shape;
        *prim = kind;
        Ok(())
    }

    /// Read the described elements converted into `T`.
    pub fn get_array<T: Primitive>(&self) -> Result<Vec<T>> {
        let elements = self.get_elements(T::KIND, None)?;
        T::from_elements(elements).ok_or(GddError::TypeMismatch("Gdd::get_array"))
    }

    /// Read the described elements converted into `kind`.
    ///
    /// A scalar yields one element; an unallocated array yields zeros.
    pub fn get_elements(
        &self,
        kind: PrimitiveType,
        table: Option<&dyn EnumStringTable>,
    ) -> Result<Elements> {
        let node = self.node();
        let matrix = ConversionMatrix::native();
        let mut out;
        match &node.body {
            Body::Scalar(s) => {
                let src = s.as_slice().ok_or(GddError::TypeMismatch("Gdd::get_array"))?;
                out = Elements::zeroed(kind, 1).ok_or(GddError::TypeMismatch("Gdd::get_array"))?;
                matrix.convert(&mut out.as_slice_mut(), &src, 1, table)?;
            }
            Body::Array {
                prim,
                bounds,
                buffer,
            } => {
                let count = described_elements(bounds);
                out = Elements::zeroed(kind, count)
                    .ok_or(GddError::TypeMismatch("Gdd::get_array"))?;
                match buffer {
                    Some(b) => {
                        let src = b.read();
                        if src.len() < count {
                            return Err(GddError::OutOfBounds("Gdd::get_array"));
                        }
                        matrix.convert(&mut out.as_slice_mut(), &src.as_slice(), count, table)?;
                    }
                    None if *prim == PrimitiveType::Invalid => {
                        return Err(GddError::TypeMismatch("Gdd::get_array"))
                    }
                    None => {
                        if !matrix.can_convert(kind, *prim) {
                            return Err(GddError::TypeMismatch("Gdd::get_array"));
                        }
                    }
                }
            }
            Body::Container { .. } => return Err(GddError::TypeMismatch("Gdd::get_array")),
        }
        Ok(out)
    }

    /// Snapshot of the raw array payload.
    pub fn elements(&self) -> Option<Elements> {
        match &self.node().body {
            Body::Array {
                buffer: Some(b), ..
            } => Some(b.read().clone()),
            _ => None,
        }
    }

    // ------------------------------------------------------------------
    // Adopted buffers
    // ------------------------------------------------------------------

    /// Adopt `elements` as the array payload.
    ///
    /// The previous payload is released (its destructor runs once its last
    /// sharer lets go); the primitive type follows the new payload and the
    /// bounds are left alone.
    pub fn put_ref(
        &self,
        elements: Elements,
        destructor: Option<Box<dyn Destructor>>,
    ) -> Result<()> {
        self.put_ref_shared(DataBuffer::new(elements, destructor))
    }

    /// Share an existing payload buffer.
    pub fn put_ref_shared(&self, shared: SharedBuffer) -> Result<()> {
        let old = {
            let mut node = self.node_mut();
            node.check_writable("Gdd::put_ref")?;
            let Body::Array { prim, buffer, .. } = &mut node.body else {
                log::debug!("[Gdd::put_ref] not an array");
                return Err(GddError::TypeMismatch("Gdd::put_ref"));
            };
            *prim = shared.kind();
            buffer.replace(shared)
        };
        drop(old);
        Ok(())
    }

    /// The payload buffer of an array, shared.
    pub fn data_buffer(&self) -> Option<SharedBuffer> {
        match &self.node().body {
            Body::Array { buffer, .. } => buffer.clone(),
            _ => None,
        }
    }

    /// Attach a destructor to the current payload.
    pub fn register_destructor(&self, destructor: Box<dyn Destructor>) -> Result<()> {
        self.data_buffer()
            .ok_or(GddError::NotDefined("Gdd::register_destructor"))?
            .register_destructor(destructor)
    }

    /// Swap the destructor of the current payload.
    pub fn replace_destructor(
        &self,
        destructor: Option<Box<dyn Destructor>>,
    ) -> Result<Option<Box<dyn Destructor>>> {
        let buffer = self
            .data_buffer()
            .ok_or(GddError::NotDefined("Gdd::replace_destructor"))?;
        Ok(buffer.replace_destructor(destructor))
    }
}
