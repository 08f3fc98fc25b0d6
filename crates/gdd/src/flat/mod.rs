// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Flattened value images.
//!
//! A value graph flattens into one contiguous byte image (see
//! [`layout`](self) for the header format). Images come in two link modes:
//!
//! - **address mode**: links are absolute addresses inside the image, so
//!   the image can be read in place with [`FlatView`] as long as it does
//!   not move.
//! - **offset mode**: links are offsets from the image start; the portable
//!   form for copying, storing or sending.
//!
//! [`convert_address_to_offsets`] and [`convert_offsets_to_address`] switch
//! between the two; [`restore`] accepts either.
//!
//! # Example
//!
//! ```
//! use gdd::{Gdd, PrimitiveType};
//!
//! let reading = Gdd::container(1);
//! reading.insert(Gdd::from_value(2, 3.5f64))?;
//! reading.insert(Gdd::from_value(3, "volts"))?;
//!
//! let mut image = reading.flatten()?;
//! image.to_offsets()?;
//! let restored = image.restore()?;
//! assert_eq!(restored.child(0).map(|v| v.get::<f64>()).transpose()?, Some(3.5));
//! assert_eq!(restored.child(1).map(|u| u.primitive_type()), Some(PrimitiveType::String));
//! # Ok::<(), gdd::GddError>(())
//! ```

pub(crate) mod cursor;
mod layout;
mod reader;
mod view;
mod writer;

pub use view::{FlatNode, FlatView};

use crate::error::{GddError, Result};
use crate::value::{Flags, Gdd};
use layout::{address_mode, H_FLAGS};
use reader::Image;
use writer::Plan;

/// Bytes needed to flatten `gdd`; 0 when it cannot be flattened.
pub(crate) fn flattened_size(gdd: &Gdd) -> usize {
    Plan::build(gdd).map(|plan| plan.total()).unwrap_or(0)
}

/// Flatten `gdd` into `buf` in address mode.
///
/// Returns the number of bytes written, or 0 when `buf` is too small or
/// the graph cannot be flattened. Bytes past the image are left as they
/// were.
pub fn flatten_with_address(gdd: &Gdd, buf: &mut [u8]) -> usize {
    let plan = match Plan::build(gdd) {
        Ok(plan) => plan,
        Err(e) => {
            log::debug!("[flat::flatten] cannot plan: {}", e);
            return 0;
        }
    };
    let total = plan.total();
    if buf.len() < total {
        log::debug!(
            "[flat::flatten] {} byte buffer for a {} byte image",
            buf.len(),
            total
        );
        return 0;
    }
    let image = &mut buf[..total];
    image.fill(0);
    let mode = address_mode(image);
    match plan.write(image, mode) {
        Ok(()) => total,
        Err(e) => {
            log::debug!("[flat::flatten] write failed: {}", e);
            0
        }
    }
}

/// Rewrite the links of an address-mode image as offsets.
///
/// A no-op on an image already in offset mode.
pub fn convert_address_to_offsets(buf: &mut [u8]) -> Result<()> {
    reader::relink(buf, true)
}

/// Rewrite the links of an offset-mode image as addresses at the image's
/// current location.
pub fn convert_offsets_to_address(buf: &mut [u8]) -> Result<()> {
    reader::relink(buf, false)
}

/// Rebuild a live graph from an image in either mode.
///
/// The restored graph owns its data; nothing refers back into `buf`.
pub fn restore(buf: &[u8]) -> Result<Gdd> {
    let image = Image::open(buf)?;
    let root = image.header(0)?;
    image.restore(&root)
}

/// An owned flat image in a single allocation.
#[derive(PartialEq, Eq)]
pub struct FlatGdd {
    bytes: Vec<u8>,
}

impl FlatGdd {
    /// Flatten `gdd` in address mode.
    pub fn new(gdd: &Gdd) -> Result<Self> {
        let plan = Plan::build(gdd)?;
        let mut bytes = Vec::new();
        bytes.try_reserve_exact(plan.total()).map_err(|_| {
            log::debug!("[FlatGdd::new] cannot allocate {} bytes", plan.total());
            GddError::NewFailed("FlatGdd::new")
        })?;
        bytes.resize(plan.total(), 0);
        let mode = address_mode(&bytes);
        plan.write(&mut bytes, mode)?;
        log::trace!(
            "[FlatGdd::new] {} nodes in {} bytes",
            plan.node_count(),
            bytes.len()
        );
        Ok(Self { bytes })
    }

    /// Adopt bytes produced elsewhere (typically an offset-mode image).
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        Image::open(&bytes)?;
        Ok(Self { bytes })
    }

    pub fn to_offsets(&mut self) -> Result<()> {
        convert_address_to_offsets(&mut self.bytes)
    }

    pub fn to_addresses(&mut self) -> Result<()> {
        convert_offsets_to_address(&mut self.bytes)
    }

    pub fn restore(&self) -> Result<Gdd> {
        restore(&self.bytes)
    }

    /// Typed read access; the image must be in address mode.
    pub fn view(&self) -> Result<FlatView<'_>> {
        FlatView::new(&self.bytes)
    }

    pub fn is_offsets(&self) -> bool {
        Flags::from_bits_truncate(self.bytes[H_FLAGS]).contains(Flags::OFFSETS)
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Release the image bytes. Convert to offsets first if they will be
    /// moved and read again.
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

impl std::fmt::Debug for FlatGdd {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlatGdd")
            .field("len", &self.bytes.len())
            .field("offsets", &self.is_offsets())
            .finish()
    }
}

impl Gdd {
    /// Flatten this graph into an owned address-mode image.
    pub fn flatten(&self) -> Result<FlatGdd> {
        FlatGdd::new(self)
    }
}

impl From<FlatGdd> for Vec<u8> {
    fn from(image: FlatGdd) -> Self {
        image.into_bytes()
    }
}

impl TryFrom<Vec<u8>> for FlatGdd {
    type Error = GddError;

    fn try_from(bytes: Vec<u8>) -> Result<Self> {
        Self::from_bytes(bytes)
    }
}
