// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! GDD Global Configuration - Single Source of Truth
//!
//! This module centralizes the layout constants of the flattened format and
//! the runtime knobs of the application type registry.
//! **NEVER hardcode them elsewhere!**
//!
//! # Architecture
//!
//! - **Level 1 (Static)**: Compile-time constants (string capacity, flat layout)
//! - **Level 2 (Dynamic)**: `RegistryConfig` (table size, pool limits), built
//!   from code, environment variables or a YAML document
//!
//! # Example
//!
//! ```
//! use gdd::config::{RegistryConfig, FIXED_STRING_SIZE};
//!
//! assert_eq!(FIXED_STRING_SIZE, 40);
//! let config = RegistryConfig::default().max_types(256).pool_limit(Some(64));
//! assert_eq!(config.max_types, 256);
//! ```

#[cfg(feature = "config-loaders")]
use std::path::Path;
use thiserror::Error;

// =======================================================================
// Strings
// =======================================================================

/// Capacity of a fixed string, terminator included.
pub const FIXED_STRING_SIZE: usize = 40;

/// Longest text a fixed string (or a formatted number) may hold.
pub const FIXED_STRING_MAX_LEN: usize = FIXED_STRING_SIZE - 1;

// =======================================================================
// Flattened layout
// =======================================================================

/// Alignment of every bounds and payload region in a flat image.
pub const FLAT_ALIGNMENT: usize = 8;

/// Size of one node header in a flat image.
pub const FLAT_HEADER_SIZE: usize = 48;

/// Size of one bounds record (first u32 + count u32).
pub const FLAT_BOUNDS_SIZE: usize = 8;

/// Size of one string record (chars u64 + len u32 + buf_len u32).
pub const FLAT_STRING_RECORD_SIZE: usize = 16;

/// Reference count stamped into every flattened header.
///
/// A flat image is never referenced node by node.
pub const FLAT_REF_SENTINEL: u16 = 0xFFFF;

/// Deepest container nesting accepted when walking a flat image.
pub const FLAT_MAX_NESTING: usize = 256;

/// `chars` value of a string record that holds the empty string.
///
/// Distinct from 0, which means "no buffer".
pub const EMPTY_STRING_SENTINEL: u64 = u64::MAX;

// =======================================================================
// Reference counting
// =======================================================================

/// Highest number of live handles on one value.
pub const REF_COUNT_LIMIT: usize = u32::MAX as usize;

// =======================================================================
// Registry
// =======================================================================

/// Default capacity of the application type table.
pub const DEFAULT_MAX_APP_TYPES: u32 = 1 << 13;

/// Hard ceiling: tags are 16-bit.
pub const MAX_APP_TYPES_CEILING: u32 = 1 << 16;

/// Environment variable overriding [`RegistryConfig::max_types`].
pub const ENV_MAX_APP_TYPES: &str = "GDD_MAX_APP_TYPES";

/// Environment variable overriding [`RegistryConfig::pool_limit`].
pub const ENV_POOL_LIMIT: &str = "GDD_POOL_LIMIT";

/// Configuration loading failures.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(String),

    #[error("invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
}

/// Runtime configuration of an [`ApplicationTypeRegistry`](crate::ApplicationTypeRegistry).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "config-loaders", derive(serde::Deserialize))]
#[cfg_attr(feature = "config-loaders", serde(default))]
pub struct RegistryConfig {
    /// Number of tag slots, tag 0 included.
    pub max_types: u32,

    /// Live instances allowed per prototype shape (None = unlimited).
    pub pool_limit: Option<usize>,

    /// Register the standard attribute names and DBR prototypes.
    pub standard_types: bool,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            max_types: DEFAULT_MAX_APP_TYPES,
            pool_limit: None,
            standard_types: true,
        }
    }
}

impl RegistryConfig {
    /// Set table capacity.
    pub fn max_types(mut self, max_types: u32) -> Self {
        self.max_types = max_types;
        self
    }

    /// Set per-shape instance limit.
    pub fn pool_limit(mut self, limit: Option<usize>) -> Self {
        self.pool_limit = limit;
        self
    }

    /// Enable or disable the standard type set.
    pub fn standard_types(mut self, enabled: bool) -> Self {
        self.standard_types = enabled;
        self
    }

    /// Table capacity clamped to what 16-bit tags can address.
    pub fn effective_max_types(&self) -> u32 {
        self.max_types.clamp(2, MAX_APP_TYPES_CEILING)
    }

    /// Defaults overridden by `GDD_MAX_APP_TYPES` / `GDD_POOL_LIMIT`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Ok(raw) = std::env::var(ENV_MAX_APP_TYPES) {
            config.max_types = raw.trim().parse().map_err(|_| ConfigError::Invalid {
                key: ENV_MAX_APP_TYPES,
                value: raw.clone(),
            })?;
        }
        if let Ok(raw) = std::env::var(ENV_POOL_LIMIT) {
            let limit: usize = raw.trim().parse().map_err(|_| ConfigError::Invalid {
                key: ENV_POOL_LIMIT,
                value: raw.clone(),
            })?;
            config.pool_limit = Some(limit);
        }
        log::debug!("[RegistryConfig::from_env] {:?}", config);
        Ok(config)
    }

    /// Parse a YAML document.
    ///
    /// ```yaml
    /// max_types: 1024
    /// pool_limit: 32
    /// standard_types: false
    /// ```
    #[cfg(feature = "config-loaders")]
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_yaml::from_str(yaml).map_err(|e| ConfigError::Yaml(e.to_string()))?;
        if config.max_types < 2 {
            return Err(ConfigError::Invalid {
                key: "max_types",
                value: config.max_types.to_string(),
            });
        }
        Ok(config)
    }

    /// Load a YAML file.
    #[cfg(feature = "config-loaders")]
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_constants() {
        assert_eq!(FLAT_HEADER_SIZE % FLAT_ALIGNMENT, 0);
        assert_eq!(FIXED_STRING_MAX_LEN, 39);
    }

    #[test]
    fn test_builder() {
        let config = RegistryConfig::default()
            .max_types(16)
            .pool_limit(Some(2))
            .standard_types(false);
        assert_eq!(config.max_types, 16);
        assert_eq!(config.pool_limit, Some(2));
        assert!(!config.standard_types);
    }

    #[test]
    fn test_effective_max_types_clamped() {
        assert_eq!(RegistryConfig::default().max_types(0).effective_max_types(), 2);
        assert_eq!(
            RegistryConfig::default()
                .max_types(u32::MAX)
                .effective_max_types(),
            MAX_APP_TYPES_CEILING
        );
    }

    #[cfg(feature = "config-loaders")]
    #[test]
    fn test_yaml_partial_document() {
        let config = RegistryConfig::from_yaml_str("pool_limit: 8\n").expect("parse yaml");
        assert_eq!(config.pool_limit, Some(8));
        assert_eq!(config.max_types, DEFAULT_MAX_APP_TYPES);
        assert!(config.standard_types);
    }

    #[cfg(feature = "config-loaders")]
    #[test]
    fn test_yaml_rejects_tiny_table() {
        assert!(matches!(
            RegistryConfig::from_yaml_str("max_types: 1\n"),
            Err(ConfigError::Invalid { .. })
        ));
    }
}
