// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Error taxonomy for descriptor operations.
//!
//! Every failure is returned to the immediate caller; nothing in this crate
//! panics or aborts on bad input. Collaborators that speak numeric status
//! words (record mappers, protocol servers) use [`GddError::code`] and
//! [`status_code`] to obtain the negative status values.

use thiserror::Error;

/// Errors raised by values, the registry and the flat serializer.
///
/// The payload of each variant names the operation that detected it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GddError {
    // ========================================================================
    // Shape / type errors
    // ========================================================================
    /// Container, scalar or array used where another shape was required,
    /// or a conversion between kinds failed.
    #[error("type mismatch in {0}")]
    TypeMismatch(&'static str),

    /// Dimension or element index outside the described bounds, unknown
    /// application tag, or a buffer too short for the requested data.
    #[error("out of bounds in {0}")]
    OutOfBounds(&'static str),

    // ========================================================================
    // Ownership errors
    // ========================================================================
    /// Mutation of managed, flat, constant or no-referencing data.
    #[error("operation not allowed in {0}")]
    NotAllowed(&'static str),

    /// Reference count would exceed its limit.
    #[error("reference count overflow in {0}")]
    Overflow(&'static str),

    /// Reference count released below zero.
    #[error("reference count underflow in {0}")]
    Underflow(&'static str),

    // ========================================================================
    // Registry errors
    // ========================================================================
    /// Name or destructor already defined with a different meaning.
    #[error("already defined in {0}")]
    AlreadyDefined(&'static str),

    /// Application type table full.
    #[error("at limit in {0}")]
    AtLimit(&'static str),

    /// Tag, field or mapping not defined.
    #[error("not defined in {0}")]
    NotDefined(&'static str),

    // ========================================================================
    // Misc
    // ========================================================================
    /// Allocation failed or a pool is exhausted.
    #[error("allocation failed in {0}")]
    NewFailed(&'static str),

    /// Operation not supported for this shape.
    #[error("not supported in {0}")]
    NotSupported(&'static str),
}

impl GddError {
    /// Negative status code of this error.
    pub fn code(&self) -> i32 {
        match self {
            Self::TypeMismatch(_) => -1,
            Self::NotAllowed(_) => -2,
            Self::AlreadyDefined(_) => -3,
            Self::NewFailed(_) => -4,
            Self::OutOfBounds(_) => -5,
            Self::AtLimit(_) => -6,
            Self::NotDefined(_) => -7,
            Self::NotSupported(_) => -8,
            Self::Overflow(_) => -9,
            Self::Underflow(_) => -10,
        }
    }

    /// Name of the operation that raised the error.
    pub fn operation(&self) -> &'static str {
        match self {
            Self::TypeMismatch(op)
            | Self::NotAllowed(op)
            | Self::AlreadyDefined(op)
            | Self::NewFailed(op)
            | Self::OutOfBounds(op)
            | Self::AtLimit(op)
            | Self::NotDefined(op)
            | Self::NotSupported(op)
            | Self::Overflow(op)
            | Self::Underflow(op) => op,
        }
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, GddError>;

/// Collapse a result into a status word: 0 on success, the negative error
/// code otherwise.
pub fn status_code<T>(result: &Result<T>) -> i32 {
    match result {
        Ok(_) => 0,
        Err(err) => err.code(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_negative_and_distinct() {
        let all = [
            GddError::TypeMismatch("t"),
            GddError::NotAllowed("t"),
            GddError::AlreadyDefined("t"),
            GddError::NewFailed("t"),
            GddError::OutOfBounds("t"),
            GddError::AtLimit("t"),
            GddError::NotDefined("t"),
            GddError::NotSupported("t"),
            GddError::Overflow("t"),
            GddError::Underflow("t"),
        ];
        let mut codes: Vec<i32> = all.iter().map(GddError::code).collect();
        assert!(codes.iter().all(|c| *c < 0));
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), all.len());
    }

    #[test]
    fn test_status_code() {
        let ok: Result<u8> = Ok(1);
        let err: Result<u8> = Err(GddError::OutOfBounds("bound"));
        assert_eq!(status_code(&ok), 0);
        assert_eq!(status_code(&err), -5);
        assert_eq!(err.unwrap_err().operation(), "bound");
    }

    #[test]
    fn test_display_names_operation() {
        let err = GddError::NotAllowed("clear");
        assert_eq!(err.to_string(), "operation not allowed in clear");
    }
}
