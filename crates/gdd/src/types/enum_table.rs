// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Ordered choice strings consulted by enum conversions.

/// Externally supplied index → text table.
pub trait EnumStringTable {
    /// Text of choice `index`, if any.
    fn string_at(&self, index: usize) -> Option<&str>;

    /// Number of choices.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Index of the first choice equal to `text`.
    fn index_of(&self, text: &str) -> Option<usize> {
        (0..self.len()).find(|i| self.string_at(*i) == Some(text))
    }
}

impl EnumStringTable for Vec<String> {
    fn string_at(&self, index: usize) -> Option<&str> {
        self.get(index).map(String::as_str)
    }

    fn len(&self) -> usize {
        Vec::len(self)
    }
}

impl EnumStringTable for [&str] {
    fn string_at(&self, index: usize) -> Option<&str> {
        self.get(index).copied()
    }

    fn len(&self) -> usize {
        <[&str]>::len(self)
    }
}

impl<const N: usize> EnumStringTable for [&str; N] {
    fn string_at(&self, index: usize) -> Option<&str> {
        self.get(index).copied()
    }

    fn len(&self) -> usize {
        N
    }
}

/// Owned choice table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnumStrings {
    choices: Vec<String>,
}

impl EnumStrings {
    pub fn new<I, S>(choices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            choices: choices.into_iter().map(Into::into).collect(),
        }
    }

    pub fn push(&mut self, choice: impl Into<String>) {
        self.choices.push(choice.into());
    }
}

impl EnumStringTable for EnumStrings {
    fn string_at(&self, index: usize) -> Option<&str> {
        self.choices.get(index).map(String::as_str)
    }

    fn len(&self) -> usize {
        self.choices.len()
    }
}
