// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Structural reconciliation between two graphs.
//!
//! One side must be a managed container (its layout is known through the
//! prototype index), the other is walked leaf by leaf. Every leaf whose tag
//! has a counterpart on the managed side is put across; leaves without one
//! are skipped. Fields are never created and never cleared.

use super::ApplicationTypeRegistry;
use crate::error::{GddError, Result};
use crate::value::Gdd;

/// Outcome of a smart copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SmartCopyReport {
    /// Fields put across.
    pub copied: usize,
    /// Matched fields whose put failed (conversion, shape).
    pub failed: usize,
}

impl SmartCopyReport {
    fn record(&mut self, outcome: Result<()>, field: u16) {
        match outcome {
            Ok(()) => self.copied += 1,
            Err(e) => {
                log::debug!("[smart_copy] field {} skipped: {}", field, e);
                self.failed += 1;
            }
        }
    }
}

#[derive(Clone, Copy)]
enum Transfer {
    Copy,
    Ref,
}

impl Transfer {
    fn apply(self, dest: &Gdd, src: &Gdd) -> Result<()> {
        match self {
            Transfer::Copy => dest.put_gdd(src),
            Transfer::Ref => dest.put_ref_gdd(src),
        }
    }
}

impl ApplicationTypeRegistry {
    /// Copy every field of `src` that `dest` also has.
    pub fn smart_copy(&self, dest: &Gdd, src: &Gdd) -> Result<SmartCopyReport> {
        self.reconcile(dest, src, Transfer::Copy, "ApplicationTypeRegistry::smart_copy")
    }

    /// Like [`smart_copy`](Self::smart_copy) but shares payloads where the
    /// kinds allow it.
    pub fn smart_ref(&self, dest: &Gdd, src: &Gdd) -> Result<SmartCopyReport> {
        self.reconcile(dest, src, Transfer::Ref, "ApplicationTypeRegistry::smart_ref")
    }

    fn reconcile(
        &self,
        dest: &Gdd,
        src: &Gdd,
        transfer: Transfer,
        op: &'static str,
    ) -> Result<SmartCopyReport> {
        let mut report = SmartCopyReport::default();
        if dest.is_container() && dest.is_managed() {
            let container = dest.app_type();
            for leaf in leaves(src) {
                let field = leaf.app_type();
                if let Ok(index) = self.map_app_to_index(container, field) {
                    if let Some(target) = dest.index_dd(index) {
                        report.record(transfer.apply(&target, &leaf), field);
                    }
                }
            }
        } else if src.is_container() && src.is_managed() {
            let container = src.app_type();
            for leaf in leaves(dest) {
                let field = leaf.app_type();
                if let Ok(index) = self.map_app_to_index(container, field) {
                    if let Some(source) = src.index_dd(index) {
                        report.record(transfer.apply(&leaf, &source), field);
                    }
                }
            }
        } else if !dest.is_container() && !src.is_container() {
            if dest.app_type() != src.app_type() {
                log::debug!(
                    "[{}] tags differ ({} <- {})",
                    op,
                    dest.app_type(),
                    src.app_type()
                );
                return Err(GddError::NotDefined(op));
            }
            transfer.apply(dest, src)?;
            report.copied = 1;
        } else {
            log::debug!("[{}] needs a managed container on one side", op);
            return Err(GddError::NotAllowed(op));
        }
        Ok(report)
    }
}

/// Non-container nodes of `graph` in child order, depth-first.
fn leaves(graph: &Gdd) -> Vec<Gdd> {
    let mut out = Vec::new();
    collect_leaves(graph, &mut out);
    out
}

fn collect_leaves(graph: &Gdd, out: &mut Vec<Gdd>) {
    if graph.is_container() {
        for child in graph.children() {
            collect_leaves(&child, out);
        }
    } else {
        out.push(graph.share());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RegistryConfig;
    use crate::convert::Elements;
    use crate::types::PrimitiveType;
    use std::sync::Arc;

    struct Fixture {
        registry: ApplicationTypeRegistry,
        value: u16,
        units: u16,
        precision: u16,
        tag: u16,
    }

    fn fixture() -> Fixture {
        let registry =
            ApplicationTypeRegistry::new(RegistryConfig::default().standard_types(false));
        let value = registry.register("value").expect("value");
        let units = registry.register("units").expect("units");
        let precision = registry.register("precision").expect("precision");
        let proto = Gdd::container(0);
        proto
            .insert(Gdd::scalar(value, PrimitiveType::Float64))
            .expect("insert");
        proto
            .insert(Gdd::scalar(units, PrimitiveType::String))
            .expect("insert");
        let tag = registry
            .register_with_prototype("reading", proto)
            .expect("register");
        Fixture {
            registry,
            value,
            units,
            precision,
            tag,
        }
    }

    #[test]
    fn test_copy_into_managed_container() {
        let f = fixture();
        let dest = f.registry.get_dd(f.tag).expect("instance");
        dest.find(f.units)
            .expect("units")
            .put("mA".to_string())
            .expect("preset units");

        let src = Gdd::container(0);
        src.insert(Gdd::from_value(f.value, 12i32)).expect("insert");
        src.insert(Gdd::from_value(f.precision, 3i16)).expect("insert");

        let report = f.registry.smart_copy(&dest, &src).expect("smart copy");
        assert_eq!(report, SmartCopyReport { copied: 1, failed: 0 });
        assert_eq!(dest.find(f.value).expect("value").get::<f64>(), Ok(12.0));
        // unmatched destination field untouched, missing field not created
        assert_eq!(
            dest.find(f.units).expect("units").get::<String>(),
            Ok("mA".to_string())
        );
        assert!(dest.find(f.precision).is_none());
        assert_eq!(dest.total(), 2);
    }

    #[test]
    fn test_copy_out_of_managed_container() {
        let f = fixture();
        let src = f.registry.get_dd(f.tag).expect("instance");
        src.find(f.value).expect("value").put(2.5f64).expect("put");

        let dest = Gdd::container(0);
        dest.insert(Gdd::scalar(f.value, PrimitiveType::Int8))
            .expect("insert");
        dest.insert(Gdd::scalar(f.precision, PrimitiveType::Int16))
            .expect("insert");

        let report = f.registry.smart_copy(&dest, &src).expect("smart copy");
        assert_eq!(report.copied, 1);
        assert_eq!(dest.find(f.value).expect("value").get::<i8>(), Ok(2));
        assert_eq!(dest.find(f.precision).expect("precision").get::<i16>(), Ok(0));
    }

    #[test]
    fn test_failed_field_is_skipped() {
        let f = fixture();
        let dest = f.registry.get_dd(f.tag).expect("instance");
        let src = Gdd::container(0);
        src.insert(Gdd::from_value(f.value, "not a number"))
            .expect("insert");
        src.insert(Gdd::from_value(f.units, "V")).expect("insert");
        let report = f.registry.smart_copy(&dest, &src).expect("smart copy");
        assert_eq!(report, SmartCopyReport { copied: 1, failed: 1 });
        assert_eq!(dest.find(f.value).expect("value").get::<f64>(), Ok(0.0));
    }

    #[test]
    fn test_leaf_pairs() {
        let f = fixture();
        let a = Gdd::scalar(f.value, PrimitiveType::Float32);
        let b = Gdd::from_value(f.value, 7u8);
        assert_eq!(f.registry.smart_copy(&a, &b).expect("leaf copy").copied, 1);
        assert_eq!(a.get::<f32>(), Ok(7.0));

        let other = Gdd::from_value(f.units, 1u8);
        assert!(matches!(
            f.registry.smart_copy(&a, &other),
            Err(GddError::NotDefined(_))
        ));
        assert!(matches!(
            f.registry.smart_copy(&Gdd::container(0), &a),
            Err(GddError::NotAllowed(_))
        ));
    }

    #[test]
    fn test_smart_ref_shares_arrays() {
        let registry =
            ApplicationTypeRegistry::new(RegistryConfig::default().standard_types(false));
        let value = registry.register("value").expect("value");
        let proto = Gdd::container(0);
        proto
            .insert(Gdd::atomic(value, PrimitiveType::Int32, 1))
            .expect("insert");
        let tag = registry
            .register_with_prototype("waveform", proto)
            .expect("register");

        let dest = registry.get_dd(tag).expect("instance");
        let src = Gdd::from_elements(value, Elements::Int32(vec![1, 2, 3]));
        let report = registry.smart_ref(&dest, &src).expect("smart ref");
        assert_eq!(report.copied, 1);
        let field = dest.find(value).expect("field");
        assert!(Arc::ptr_eq(
            &field.data_buffer().expect("shared"),
            &src.data_buffer().expect("source")
        ));
        assert_eq!(field.get_array::<i32>(), Ok(vec![1, 2, 3]));
    }
}
