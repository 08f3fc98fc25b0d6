// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Per-dimension shape descriptor.

/// `{first, count}` pair describing one dimension of an array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Bounds {
    first: u32,
    count: u32,
}

impl Bounds {
    pub const fn new(first: u32, count: u32) -> Self {
        Self { first, count }
    }

    /// Bounds starting at 0.
    pub const fn with_count(count: u32) -> Self {
        Self { first: 0, count }
    }

    pub const fn first(&self) -> u32 {
        self.first
    }

    /// Number of elements in this dimension.
    pub const fn size(&self) -> u32 {
        self.count
    }

    /// One past the last index.
    pub const fn end(&self) -> u64 {
        self.first as u64 + self.count as u64
    }

    pub fn contains(&self, index: u32) -> bool {
        (index as u64) >= self.first as u64 && (index as u64) < self.end()
    }

    pub fn set(&mut self, first: u32, count: u32) {
        self.first = first;
        self.count = count;
    }

    pub fn set_first(&mut self, first: u32) {
        self.first = first;
    }

    pub fn set_size(&mut self, count: u32) {
        self.count = count;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains() {
        let b = Bounds::new(2, 3);
        assert!(!b.contains(1));
        assert!(b.contains(2));
        assert!(b.contains(4));
        assert!(!b.contains(5));
        assert_eq!(b.end(), 5);
    }

    #[test]
    fn test_end_does_not_overflow() {
        let b = Bounds::new(u32::MAX, u32::MAX);
        assert_eq!(b.end(), 2 * u32::MAX as u64);
    }
}
