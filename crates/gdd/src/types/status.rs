// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Alarm status word.

/// Alarm condition and severity, stored as one 32-bit word.
///
/// The condition occupies the low half, the severity the high half.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Status {
    pub stat: u16,
    pub sevr: u16,
}

impl Status {
    pub const fn new(stat: u16, sevr: u16) -> Self {
        Self { stat, sevr }
    }

    pub const fn from_word(word: u32) -> Self {
        Self {
            stat: (word & 0xFFFF) as u16,
            sevr: (word >> 16) as u16,
        }
    }

    pub const fn word(&self) -> u32 {
        ((self.sevr as u32) << 16) | self.stat as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_word_halves() {
        let status = Status::new(3, 2);
        assert_eq!(status.word(), 0x0002_0003);
        assert_eq!(Status::from_word(0x0002_0003), status);
    }
}
