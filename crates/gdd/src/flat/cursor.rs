// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Bounds-checked cursors over flat images and wire buffers.
//!
//! Flat images are little-endian; the wire codec writes its header in
//! network order.

use crate::error::{GddError, Result};

/// Generate little-endian write methods.
macro_rules! impl_write_le {
    ($name:ident, $type:ty, $size:expr) => {
        pub fn $name(&mut self, value: $type) -> Result<()> {
            self.write_bytes(&value.to_le_bytes())
        }
    };
}

/// Generate little-endian read methods.
macro_rules! impl_read_le {
    ($name:ident, $type:ty, $size:expr) => {
        pub fn $name(&mut self) -> Result<$type> {
            let mut bytes = [0u8; $size];
            bytes.copy_from_slice(self.read_bytes($size)?);
            Ok(<$type>::from_le_bytes(bytes))
        }
    };
}

/// Generate big-endian write methods.
macro_rules! impl_write_be {
    ($name:ident, $type:ty) => {
        pub fn $name(&mut self, value: $type) -> Result<()> {
            self.write_bytes(&value.to_be_bytes())
        }
    };
}

/// Generate big-endian read methods.
macro_rules! impl_read_be {
    ($name:ident, $type:ty, $size:expr) => {
        pub fn $name(&mut self) -> Result<$type> {
            let mut bytes = [0u8; $size];
            bytes.copy_from_slice(self.read_bytes($size)?);
            Ok(<$type>::from_be_bytes(bytes))
        }
    };
}

/// Generate the methods both cursors share (offset, seek, align).
macro_rules! impl_cursor_common {
    ($op:expr) => {
        pub fn offset(&self) -> usize {
            self.offset
        }

        pub fn remaining(&self) -> usize {
            self.buffer.len().saturating_sub(self.offset)
        }

        pub fn seek(&mut self, offset: usize) -> Result<()> {
            if offset > self.buffer.len() {
                log::debug!(
                    "[{}] seek to {} past end of {} byte buffer",
                    $op,
                    offset,
                    self.buffer.len()
                );
                return Err(GddError::OutOfBounds($op));
            }
            self.offset = offset;
            Ok(())
        }

        pub fn align(&mut self, alignment: usize) -> Result<()> {
            if alignment <= 1 {
                return Ok(());
            }
            let aligned = align_up(self.offset, alignment);
            self.seek(aligned)
        }
    };
}

/// Round `offset` up to a multiple of `alignment` (a power of two).
pub(crate) const fn align_up(offset: usize, alignment: usize) -> usize {
    let mask = alignment - 1;
    (offset + mask) & !mask
}

/// Writing cursor.
pub(crate) struct CursorMut<'a> {
    buffer: &'a mut [u8],
    offset: usize,
}

impl<'a> CursorMut<'a> {
    pub fn new(buffer: &'a mut [u8]) -> Self {
        Self { buffer, offset: 0 }
    }

    impl_write_le!(write_u8, u8, 1);
    impl_write_le!(write_u16_le, u16, 2);
    impl_write_le!(write_u32_le, u32, 4);
    impl_write_le!(write_u64_le, u64, 8);
    impl_write_be!(write_u16_be, u16);
    impl_write_be!(write_u32_be, u32);

    pub fn write_bytes(&mut self, data: &[u8]) -> Result<()> {
        let end = self.offset + data.len();
        if end > self.buffer.len() {
            log::debug!(
                "[cursor::write] {} bytes at {} overflow {} byte buffer",
                data.len(),
                self.offset,
                self.buffer.len()
            );
            return Err(GddError::OutOfBounds("cursor::write"));
        }
        self.buffer[self.offset..end].copy_from_slice(data);
        self.offset = end;
        Ok(())
    }

    impl_cursor_common!("cursor::write");
}

/// Reading cursor.
pub(crate) struct Cursor<'a> {
    buffer: &'a [u8],
    offset: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(buffer: &'a [u8]) -> Self {
        Self { buffer, offset: 0 }
    }

    /// Cursor positioned at `offset`.
    pub fn at(buffer: &'a [u8], offset: usize) -> Result<Self> {
        let mut cursor = Self::new(buffer);
        cursor.seek(offset)?;
        Ok(cursor)
    }

    impl_read_le!(read_u8, u8, 1);
    impl_read_le!(read_u16_le, u16, 2);
    impl_read_le!(read_u32_le, u32, 4);
    impl_read_le!(read_u64_le, u64, 8);
    impl_read_be!(read_u16_be, u16, 2);
    impl_read_be!(read_u32_be, u32, 4);

    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        let end = self
            .offset
            .checked_add(len)
            .ok_or(GddError::OutOfBounds("cursor::read"))?;
        if end > self.buffer.len() {
            log::debug!(
                "[cursor::read] {} bytes at {} past end of {} byte buffer",
                len,
                self.offset,
                self.buffer.len()
            );
            return Err(GddError::OutOfBounds("cursor::read"));
        }
        let slice = &self.buffer[self.offset..end];
        self.offset = end;
        Ok(slice)
    }

    impl_cursor_common!("cursor::read");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_overflow() {
        let mut buffer = [0u8; 2];
        let mut cursor = CursorMut::new(&mut buffer);
        cursor.write_u16_le(0xABCD).expect("fits");
        assert!(matches!(cursor.write_u8(1), Err(GddError::OutOfBounds(_))));
        assert_eq!(buffer, [0xCD, 0xAB]);
    }

    #[test]
    fn test_read_overflow() {
        let buffer = [7u8; 3];
        let mut cursor = Cursor::new(&buffer);
        assert_eq!(cursor.read_u16_le().expect("fits"), 0x0707);
        assert!(matches!(cursor.read_u16_le(), Err(GddError::OutOfBounds(_))));
        assert_eq!(cursor.offset(), 2);
    }

    #[test]
    fn test_align_and_seek() {
        let mut buffer = [0u8; 16];
        let mut writer = CursorMut::new(&mut buffer);
        writer.write_u8(1).expect("write");
        writer.align(8).expect("align");
        assert_eq!(writer.offset(), 8);
        writer.write_u64_le(u64::MAX).expect("write");
        assert!(matches!(writer.align(32), Err(GddError::OutOfBounds(_))));
        writer.seek(4).expect("seek back");
        writer.write_u32_le(0x0102_0304).expect("write");

        let mut reader = Cursor::at(&buffer, 4).expect("at");
        assert_eq!(reader.read_u32_le().expect("read"), 0x0102_0304);
        assert_eq!(reader.read_u64_le().expect("read"), u64::MAX);
        assert_eq!(reader.remaining(), 0);
        assert!(Cursor::at(&buffer, 17).is_err());
    }

    #[test]
    fn test_network_order() {
        let mut buffer = [0u8; 6];
        let mut writer = CursorMut::new(&mut buffer);
        writer.write_u16_be(0x0102).expect("write");
        writer.write_u32_be(0x0304_0506).expect("write");
        assert_eq!(buffer, [1, 2, 3, 4, 5, 6]);

        let mut reader = Cursor::new(&buffer);
        assert_eq!(reader.read_u16_be().expect("read"), 0x0102);
        assert_eq!(reader.read_u32_be().expect("read"), 0x0304_0506);
    }

    #[test]
    fn test_align_up() {
        assert_eq!(align_up(0, 8), 0);
        assert_eq!(align_up(1, 8), 8);
        assert_eq!(align_up(16, 8), 16);
        assert_eq!(align_up(17, 4), 20);
    }
}
