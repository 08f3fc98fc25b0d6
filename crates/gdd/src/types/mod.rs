// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Leaf types: primitive kinds, bounds, strings, status and time stamps.

mod bounds;
mod enum_table;
mod fixed_string;
mod primitive;
mod status;
mod timestamp;

pub use bounds::Bounds;
pub use enum_table::{EnumStringTable, EnumStrings};
pub use fixed_string::FixedString;
pub use primitive::PrimitiveType;
pub use status::Status;
pub use timestamp::TimeStamp;
