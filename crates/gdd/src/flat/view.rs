// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! In-place typed access to an address-mode image.

use super::layout::{data_is_link, LinkMode};
use super::reader::{Header, Image};
use crate::convert::{convert_elements, ConversionMatrix, Elements, Primitive, Scalar};
use crate::error::{GddError, Result};
use crate::types::{Bounds, PrimitiveType, Status, TimeStamp};
use crate::value::{Flags, Gdd};

/// Read-only view over a flat image in address mode.
///
/// Every link is checked once when the view is built; an image that is in
/// offset mode, or was moved after being written in address mode, is
/// refused with NotAllowed.
#[derive(Debug, Clone, Copy)]
pub struct FlatView<'a> {
    image: Image<'a>,
    root: Header,
}

impl<'a> FlatView<'a> {
    pub fn new(bytes: &'a [u8]) -> Result<Self> {
        let image = Image::open(bytes)?;
        if image.mode() == LinkMode::Offsets {
            log::debug!("[FlatView::new] image is in offset mode");
            return Err(GddError::NotAllowed("FlatView::new"));
        }
        for header in image.walk()? {
            if header.dimension > 0 && header.prim != PrimitiveType::Container {
                image.resolve(header.bounds, "FlatView::new")?;
            }
            if data_is_link(header.prim, header.dimension) && header.data != 0 {
                image.resolve(header.data, "FlatView::new")?;
            }
        }
        let root = image.header(0)?;
        Ok(Self { image, root })
    }

    pub fn root(&self) -> FlatNode<'a> {
        FlatNode {
            image: self.image,
            header: self.root,
        }
    }

    /// Image size in bytes.
    pub fn len(&self) -> usize {
        self.image.bytes().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One node of a [`FlatView`].
#[derive(Debug, Clone, Copy)]
pub struct FlatNode<'a> {
    image: Image<'a>,
    header: Header,
}

impl<'a> FlatNode<'a> {
    pub fn app_type(&self) -> u16 {
        self.header.app
    }

    pub fn primitive_type(&self) -> PrimitiveType {
        self.header.prim
    }

    pub fn dimension(&self) -> usize {
        self.header.dimension as usize
    }

    pub fn is_container(&self) -> bool {
        self.header.prim == PrimitiveType::Container
    }

    pub fn flags(&self) -> Flags {
        self.header.flags
    }

    pub fn status(&self) -> Status {
        self.header.status
    }

    pub fn timestamp(&self) -> TimeStamp {
        self.header.stamp
    }

    pub fn bounds(&self) -> Result<Vec<Bounds>> {
        self.image.bounds(&self.header)
    }

    pub fn children(&self) -> Result<Vec<FlatNode<'a>>> {
        Ok(self
            .image
            .children(&self.header)?
            .into_iter()
            .map(|header| FlatNode {
                image: self.image,
                header,
            })
            .collect())
    }

    /// Child count of a container, 0 otherwise.
    pub fn total(&self) -> Result<usize> {
        Ok(self.image.children(&self.header)?.len())
    }

    pub fn child(&self, index: usize) -> Result<Option<FlatNode<'a>>> {
        Ok(self.children()?.into_iter().nth(index))
    }

    /// First node below this one (in layout order) tagged `app`.
    pub fn find(&self, app: u16) -> Result<Option<FlatNode<'a>>> {
        let mut pending = self.children()?;
        let mut i = 0;
        while i < pending.len() {
            let node = pending[i];
            if node.app_type() == app {
                return Ok(Some(node));
            }
            pending.extend(node.children()?);
            i += 1;
        }
        Ok(None)
    }

    /// Scalar value, or the first element of an array.
    pub fn value(&self) -> Result<Scalar> {
        if self.is_container() {
            return Err(GddError::TypeMismatch("FlatNode::value"));
        }
        if self.header.dimension == 0 {
            return match self.image.scalar(&self.header)? {
                Scalar::Invalid => Err(GddError::TypeMismatch("FlatNode::value")),
                value => Ok(value),
            };
        }
        match self.elements()? {
            Some(elements) => elements
                .get(0)
                .ok_or(GddError::OutOfBounds("FlatNode::value")),
            None => Ok(Scalar::zero(self.header.prim)),
        }
    }

    pub fn get<T: Primitive>(&self) -> Result<T> {
        let converted = ConversionMatrix::native().convert_scalar(T::KIND, self.value()?, None)?;
        T::from_scalar(converted).ok_or(GddError::TypeMismatch("FlatNode::get"))
    }

    /// Raw array payload; `None` for scalars and arrays without data.
    pub fn elements(&self) -> Result<Option<Elements>> {
        if self.header.dimension == 0 || self.is_container() {
            return Ok(None);
        }
        let bounds = self.bounds()?;
        self.image.elements(&self.header, &bounds)
    }

    pub fn get_array<T: Primitive>(&self) -> Result<Vec<T>> {
        let elements = match self.elements()? {
            Some(elements) => elements,
            None if self.header.dimension == 0 => {
                Elements::from_scalar(&self.value()?)
                    .ok_or(GddError::TypeMismatch("FlatNode::get_array"))?
            }
            None => return Err(GddError::TypeMismatch("FlatNode::get_array")),
        };
        let converted = convert_elements(T::KIND, &elements.as_slice(), None)?;
        T::from_elements(converted).ok_or(GddError::TypeMismatch("FlatNode::get_array"))
    }

    /// Restore the subtree rooted here into a live graph.
    pub fn to_gdd(&self) -> Result<Gdd> {
        self.image.restore(&self.header)
    }
}
