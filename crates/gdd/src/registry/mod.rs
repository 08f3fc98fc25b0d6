// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Application type registry.
//!
//! Maps application names to 16-bit tags and owns the prototype graphs
//! registered for them.
//!
//! # Architecture
//!
//! ```text
//! ApplicationTypeRegistry
//! +-- names:   DashMap<String, u16>          name -> tag
//! +-- entries: RwLock<Vec<TypeEntry>>        indexed by tag, slot 0 reserved
//!
//! TypeEntry
//! +-- name, user value (store_value / get_value)
//! +-- prototype: Option<Prototype>
//!
//! Prototype
//! +-- pool:  Arc<ShapePool>                  free list + prototype graph
//! +-- index: HashMap<u16, usize>             field tag -> layout index
//! ```
//!
//! `get_dd` on a prototype tag pops an instance from the pool (or deep
//! copies the prototype) and marks it managed. The instance goes back to
//! the pool from its drop hook.

mod pool;
mod smart;
mod standard;

pub use pool::PoolStats;
pub use smart::SmartCopyReport;
pub use standard::names;

pub(crate) use pool::Recycler;

use crate::config::RegistryConfig;
use crate::error::{GddError, Result};
use crate::types::PrimitiveType;
use crate::value::{CopyMode, Gdd};
use dashmap::DashMap;
use parking_lot::RwLock;
use pool::ShapePool;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock};

/// Structural fingerprint of one node: tag, kind, dimension, child count.
type NodeShape = (u16, PrimitiveType, usize, usize);

struct Prototype {
    pool: Arc<ShapePool>,
    index: HashMap<u16, usize>,
    shape: Vec<NodeShape>,
}

impl Prototype {
    fn new(tag: u16, graph: Gdd, limit: Option<usize>) -> Self {
        let order = graph.layout_order();
        let mut index = HashMap::with_capacity(order.len());
        for (i, node) in order.iter().enumerate() {
            index.entry(node.app_type()).or_insert(i);
        }
        let shape = shape_of(&graph);
        Self {
            pool: ShapePool::new(tag, graph, limit),
            index,
            shape,
        }
    }
}

struct TypeEntry {
    name: String,
    value: u32,
    prototype: Option<Prototype>,
}

/// Name/tag table with prototype pools.
pub struct ApplicationTypeRegistry {
    config: RegistryConfig,
    names: DashMap<String, u16>,
    entries: RwLock<Vec<TypeEntry>>,
}

impl ApplicationTypeRegistry {
    /// Registry sized by `config`; registers the standard types when
    /// `config.standard_types` is set.
    pub fn new(config: RegistryConfig) -> Self {
        let standard = config.standard_types;
        let registry = Self {
            config,
            names: DashMap::new(),
            entries: RwLock::new(vec![TypeEntry {
                name: String::new(),
                value: 0,
                prototype: None,
            }]),
        };
        if standard {
            if let Err(e) = standard::register_standard_types(&registry) {
                log::error!("[ApplicationTypeRegistry::new] standard types failed: {}", e);
            }
        }
        registry
    }

    /// Registry with the standard types, whatever `config` says.
    pub fn with_standard_types(config: RegistryConfig) -> Self {
        Self::new(config.standard_types(true))
    }

    /// Process-wide registry, configured from the environment on first use.
    pub fn global() -> &'static ApplicationTypeRegistry {
        static GLOBAL: OnceLock<ApplicationTypeRegistry> = OnceLock::new();
        GLOBAL.get_or_init(|| {
            let config = RegistryConfig::from_env().unwrap_or_else(|e| {
                log::warn!("[ApplicationTypeRegistry::global] {}, using defaults", e);
                RegistryConfig::default()
            });
            Self::with_standard_types(config)
        })
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    // ------------------------------------------------------------------
    // Registration
    // ------------------------------------------------------------------

    /// Register `name`; returns the existing tag when already known.
    pub fn register(&self, name: &str) -> Result<u16> {
        let mut entries = self.entries.write();
        if let Some(tag) = self.names.get(name) {
            return Ok(*tag);
        }
        let tag = self.next_tag(&entries)?;
        entries.push(TypeEntry {
            name: name.to_string(),
            value: 0,
            prototype: None,
        });
        self.names.insert(name.to_string(), tag);
        log::debug!("[ApplicationTypeRegistry::register] {} -> {}", name, tag);
        Ok(tag)
    }

    /// Register `name` with a prototype graph.
    ///
    /// The prototype's root takes the new tag once the prototype is
    /// installed. Registering the same name again with an identically shaped
    /// prototype returns the existing tag; a different shape is
    /// AlreadyDefined. Neither touches `prototype`. A name registered
    /// without a prototype is upgraded.
    pub fn register_with_prototype(&self, name: &str, prototype: Gdd) -> Result<u16> {
        let mut entries = self.entries.write();
        let existing = self.names.get(name).map(|t| *t);
        let tag = match existing {
            Some(tag) => tag,
            None => self.next_tag(&entries)?,
        };
        let graph = prototype.duplicate(CopyMode::Deep);
        graph.set_app_type(tag)?;

        if let Some(tag) = existing {
            let entry = entries
                .get_mut(tag as usize)
                .ok_or(GddError::OutOfBounds("ApplicationTypeRegistry::register"))?;
            if let Some(current) = &entry.prototype {
                if current.shape == shape_of(&graph) {
                    log::debug!(
                        "[ApplicationTypeRegistry::register_with_prototype] {} already registered as {}",
                        name,
                        tag
                    );
                    return Ok(tag);
                }
                log::debug!(
                    "[ApplicationTypeRegistry::register_with_prototype] {} registered with another shape",
                    name
                );
                return Err(GddError::AlreadyDefined(
                    "ApplicationTypeRegistry::register_with_prototype",
                ));
            }
            prototype.set_app_type(tag)?;
            entry.prototype = Some(Prototype::new(tag, graph, self.config.pool_limit));
            log::debug!(
                "[ApplicationTypeRegistry::register_with_prototype] {} ({}) upgraded with prototype",
                name,
                tag
            );
            return Ok(tag);
        }

        prototype.set_app_type(tag)?;
        entries.push(TypeEntry {
            name: name.to_string(),
            value: 0,
            prototype: Some(Prototype::new(tag, graph, self.config.pool_limit)),
        });
        self.names.insert(name.to_string(), tag);
        log::debug!(
            "[ApplicationTypeRegistry::register_with_prototype] {} -> {}",
            name,
            tag
        );
        Ok(tag)
    }

    fn next_tag(&self, entries: &[TypeEntry]) -> Result<u16> {
        let max = self.config.effective_max_types() as usize;
        if entries.len() >= max {
            log::warn!(
                "[ApplicationTypeRegistry::register] table full ({} types)",
                max
            );
            return Err(GddError::AtLimit("ApplicationTypeRegistry::register"));
        }
        u16::try_from(entries.len()).map_err(|_| GddError::AtLimit("ApplicationTypeRegistry::register"))
    }

    // ------------------------------------------------------------------
    // Lookup
    // ------------------------------------------------------------------

    pub fn application_type(&self, name: &str) -> Option<u16> {
        self.names.get(name).map(|t| *t)
    }

    pub fn name_of(&self, tag: u16) -> Option<String> {
        if tag == 0 {
            return None;
        }
        self.entries.read().get(tag as usize).map(|e| e.name.clone())
    }

    /// Number of registered names.
    pub fn total_registered(&self) -> usize {
        self.names.len()
    }

    /// Tag slots available, tag 0 included.
    pub fn max_allowed(&self) -> u32 {
        self.config.effective_max_types()
    }

    pub fn has_prototype(&self, tag: u16) -> bool {
        self.entries
            .read()
            .get(tag as usize)
            .is_some_and(|e| e.prototype.is_some())
    }

    /// Deep copy of the prototype registered for `tag`.
    pub fn prototype(&self, tag: u16) -> Option<Gdd> {
        self.entries
            .read()
            .get(tag as usize)?
            .prototype
            .as_ref()
            .map(|p| p.pool.prototype().duplicate(CopyMode::Deep))
    }

    pub fn pool_stats(&self, tag: u16) -> Option<PoolStats> {
        self.entries
            .read()
            .get(tag as usize)?
            .prototype
            .as_ref()
            .map(|p| p.pool.stats())
    }

    // ------------------------------------------------------------------
    // Instances
    // ------------------------------------------------------------------

    /// Value for `tag`: a managed prototype instance, or an untyped value
    /// carrying the tag when no prototype is registered.
    pub fn get_dd(&self, tag: u16) -> Result<Gdd> {
        let pool = {
            let entries = self.entries.read();
            let entry = match entries.get(tag as usize) {
                Some(entry) if tag != 0 => entry,
                _ => return Err(GddError::OutOfBounds("ApplicationTypeRegistry::get_dd")),
            };
            match &entry.prototype {
                Some(p) => Arc::clone(&p.pool),
                None => return Ok(Gdd::with_app(tag)),
            }
        };
        pool.take()
    }

    /// [`get_dd`](Self::get_dd) by name.
    pub fn get_dd_by_name(&self, name: &str) -> Result<Gdd> {
        let tag = self
            .application_type(name)
            .ok_or(GddError::NotDefined("ApplicationTypeRegistry::get_dd"))?;
        self.get_dd(tag)
    }

    /// Layout index of field `field` inside prototype `container`.
    ///
    /// The container's own tag maps to 0.
    pub fn map_app_to_index(&self, container: u16, field: u16) -> Result<usize> {
        let entries = self.entries.read();
        let prototype = entries
            .get(container as usize)
            .and_then(|e| e.prototype.as_ref())
            .ok_or(GddError::OutOfBounds("ApplicationTypeRegistry::map_app_to_index"))?;
        if container == field {
            return Ok(0);
        }
        match prototype.index.get(&field) {
            Some(&index) if index != 0 => Ok(index),
            _ => Err(GddError::NotDefined("ApplicationTypeRegistry::map_app_to_index")),
        }
    }

    // ------------------------------------------------------------------
    // User values
    // ------------------------------------------------------------------

    /// Attach an opaque number to `tag` (wire type code of a mapping layer).
    pub fn store_value(&self, tag: u16, value: u32) -> Result<()> {
        let mut entries = self.entries.write();
        match entries.get_mut(tag as usize) {
            Some(entry) if tag != 0 => {
                entry.value = value;
                Ok(())
            }
            _ => Err(GddError::OutOfBounds("ApplicationTypeRegistry::store_value")),
        }
    }

    pub fn get_value(&self, tag: u16) -> Result<u32> {
        match self.entries.read().get(tag as usize) {
            Some(entry) if tag != 0 => Ok(entry.value),
            _ => Err(GddError::OutOfBounds("ApplicationTypeRegistry::get_value")),
        }
    }

    /// Human-readable table listing.
    pub fn describe(&self) -> String {
        self.to_string()
    }
}

impl Default for ApplicationTypeRegistry {
    fn default() -> Self {
        Self::new(RegistryConfig::default())
    }
}

impl fmt::Display for ApplicationTypeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let entries = self.entries.read();
        writeln!(
            f,
            "{} of {} application types registered",
            entries.len() - 1,
            self.max_allowed()
        )?;
        for (tag, entry) in entries.iter().enumerate().skip(1) {
            match &entry.prototype {
                None => writeln!(f, "{:5} {}", tag, entry.name)?,
                Some(p) => {
                    let stats = p.pool.stats();
                    writeln!(
                        f,
                        "{:5} {} prototype nodes={} live={} pooled={}",
                        tag,
                        entry.name,
                        p.shape.len(),
                        stats.live,
                        stats.pooled
                    )?;
                    let mut fields: Vec<(&u16, &usize)> = p.index.iter().collect();
                    fields.sort_by_key(|(_, index)| **index);
                    for (field, index) in fields.into_iter().skip(1) {
                        writeln!(f, "        [{}] {}", index, field)?;
                    }
                }
            }
        }
        Ok(())
    }
}

impl fmt::Debug for ApplicationTypeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApplicationTypeRegistry")
            .field("config", &self.config)
            .field("registered", &self.names.len())
            .finish()
    }
}

/// Layout-order fingerprint, root tag excluded.
fn shape_of(graph: &Gdd) -> Vec<NodeShape> {
    graph
        .layout_order()
        .iter()
        .enumerate()
        .map(|(i, node)| {
            let app = if i == 0 { 0 } else { node.app_type() };
            (app, node.primitive_type(), node.dimension(), node.total())
        })
        .collect()
}
