// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Fixed-capacity string element.

use crate::config::{FIXED_STRING_MAX_LEN, FIXED_STRING_SIZE};
use std::fmt;

/// NUL padded string of [`FIXED_STRING_SIZE`] bytes.
///
/// At most [`FIXED_STRING_MAX_LEN`] bytes of text are kept; longer input is
/// truncated on a character boundary.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct FixedString([u8; FIXED_STRING_SIZE]);

impl FixedString {
    pub fn new(text: &str) -> Self {
        let mut raw = [0u8; FIXED_STRING_SIZE];
        let mut len = text.len().min(FIXED_STRING_MAX_LEN);
        while !text.is_char_boundary(len) {
            len -= 1;
        }
        raw[..len].copy_from_slice(&text.as_bytes()[..len]);
        Self(raw)
    }

    /// Wrap raw bytes; the final byte is forced to NUL.
    pub fn from_bytes(mut raw: [u8; FIXED_STRING_SIZE]) -> Self {
        raw[FIXED_STRING_SIZE - 1] = 0;
        Self(raw)
    }

    /// True when `text` fits without truncation.
    pub fn fits(text: &str) -> bool {
        text.len() <= FIXED_STRING_MAX_LEN
    }

    pub fn as_bytes(&self) -> &[u8; FIXED_STRING_SIZE] {
        &self.0
    }

    /// Text up to the first NUL (longest valid UTF-8 prefix).
    pub fn as_str(&self) -> &str {
        let end = self.len();
        match std::str::from_utf8(&self.0[..end]) {
            Ok(s) => s,
            Err(e) => std::str::from_utf8(&self.0[..e.valid_up_to()]).unwrap_or_default(),
        }
    }

    pub fn len(&self) -> usize {
        self.0.iter().position(|b| *b == 0).unwrap_or(FIXED_STRING_SIZE)
    }

    pub fn is_empty(&self) -> bool {
        self.0[0] == 0
    }

    pub fn clear(&mut self) {
        self.0 = [0u8; FIXED_STRING_SIZE];
    }
}

impl Default for FixedString {
    fn default() -> Self {
        Self([0u8; FIXED_STRING_SIZE])
    }
}

impl From<&str> for FixedString {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

impl fmt::Debug for FixedString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FixedString({:?})", self.as_str())
    }
}

impl fmt::Display for FixedString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_text() {
        let s = FixedString::new("counts");
        assert_eq!(s.as_str(), "counts");
        assert_eq!(s.len(), 6);
        assert_eq!(s.as_bytes()[6], 0);
    }

    #[test]
    fn test_truncates_to_capacity() {
        let long = "x".repeat(100);
        let s = FixedString::new(&long);
        assert_eq!(s.len(), FIXED_STRING_MAX_LEN);
        assert!(!FixedString::fits(&long));
    }

    #[test]
    fn test_truncates_on_char_boundary() {
        // 38 ASCII bytes then a two-byte character straddling the limit
        let text = format!("{}é", "a".repeat(38));
        let s = FixedString::new(&text);
        assert_eq!(s.as_str(), "a".repeat(38));
    }

    #[test]
    fn test_from_bytes_terminates() {
        let s = FixedString::from_bytes([b'z'; FIXED_STRING_SIZE]);
        assert_eq!(s.len(), FIXED_STRING_MAX_LEN);
    }
}
