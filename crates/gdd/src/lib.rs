// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # gdd - Generic Data Descriptors
//!
//! Self-describing values for control-system data: every value carries an
//! application tag, a primitive kind, a shape, an alarm status and a time
//! stamp, and may be a scalar, a multi-dimensional array or an ordered
//! container of further values.
//!
//! ## Quick Start
//!
//! ```rust
//! use gdd::{names, ApplicationTypeRegistry, Gdd, RegistryConfig, Result};
//!
//! fn main() -> Result<()> {
//!     let registry = ApplicationTypeRegistry::new(RegistryConfig::default());
//!     let value_tag = registry.application_type(names::VALUE).unwrap_or(0);
//!
//!     // A float array converted on the way in and out
//!     let samples = Gdd::array(value_tag, gdd::PrimitiveType::Float32, &[3]);
//!     samples.put_array(&[1.0f32, 2.0, 3.0])?;
//!     assert_eq!(samples.get_array::<i32>()?, vec![1, 2, 3]);
//!
//!     // One contiguous image, restorable anywhere once in offset mode
//!     let mut image = samples.flatten()?;
//!     image.to_offsets()?;
//!     let copy = gdd::flat::restore(image.as_bytes())?;
//!     assert_eq!(copy.get_array::<String>()?, vec!["1", "2", "3"]);
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! +---------------------------------------------------------------------+
//! |                    ApplicationTypeRegistry                          |
//! |   name <-> tag | prototypes | pooled instances | smart copy         |
//! +---------------------------------------------------------------------+
//! |                            Gdd                                      |
//! |   scalar | array (bounds + shared buffer) | container (children)    |
//! +---------------------------------------------------------------------+
//! |       ConversionMatrix         |         Destructor chain           |
//! |   native | to-wire | from-wire |   release | return | closure       |
//! +---------------------------------------------------------------------+
//! |          flat (images)         |          wire (HEAD stream)        |
//! +---------------------------------------------------------------------+
//! ```
//!
//! ## Key Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Gdd`] | Shared handle on one node of a value graph |
//! | [`ApplicationTypeRegistry`] | Name/tag table with prototype pools |
//! | [`ConversionMatrix`] | Conversion between any two primitive kinds |
//! | [`DataBuffer`] | Array payload released through its [`Destructor`] |
//! | [`FlatGdd`] | A value graph flattened into one allocation |
//! | [`FlatView`] | Typed in-place reads of an address-mode image |

/// Constants and registry configuration.
pub mod config;
/// Conversion matrix and element containers.
pub mod convert;
/// Payload buffers and their release hooks.
pub mod destructor;
/// Error taxonomy and status codes.
pub mod error;
/// Flattened images: flatten, relocate, restore, view.
pub mod flat;
/// Application type registry.
pub mod registry;
/// Primitive kinds, bounds, strings, status and time stamps.
pub mod types;
/// The value graph.
pub mod value;
/// `HEAD` header/data stream codec.
pub mod wire;

pub use config::{ConfigError, RegistryConfig};
pub use convert::{
    ConversionMatrix, ConvertError, DataFormat, ElemSlice, ElemSliceMut, Elements, EnumChoice,
    Primitive, Route, Scalar,
};
pub use destructor::{
    DataBuffer, Destructor, FnDestructor, ReleaseDestructor, ReturnDestructor, SharedBuffer,
};
pub use error::{status_code, GddError, Result};
pub use flat::{FlatGdd, FlatNode, FlatView};
pub use registry::{names, ApplicationTypeRegistry, PoolStats, SmartCopyReport};
pub use types::{
    Bounds, EnumStringTable, EnumStrings, FixedString, PrimitiveType, Status, TimeStamp,
};
pub use value::{CopyMode, Flags, Gdd};
