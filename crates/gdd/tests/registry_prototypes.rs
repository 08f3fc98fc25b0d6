// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

#![allow(clippy::uninlined_format_args)] // Test/bench code readability over pedantic
#![allow(clippy::float_cmp)] // Test assertions with constants

//! Registry configuration, prototypes, pooled instances and smart copy.

use gdd::{
    names, ApplicationTypeRegistry, Gdd, GddError, PrimitiveType, RegistryConfig,
};
use std::io::Write;

fn reading_registry() -> (ApplicationTypeRegistry, u16, u16, u16) {
    let registry = ApplicationTypeRegistry::new(RegistryConfig::default().standard_types(false));
    let value = registry.register("value").expect("value");
    let units = registry.register("units").expect("units");
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
    (registry, tag, value, units)
}

#[test]
fn yaml_config_file() {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    writeln!(file, "max_types: 40").expect("write");
    writeln!(file, "pool_limit: 8").expect("write");
    writeln!(file, "standard_types: true").expect("write");

    let config = RegistryConfig::from_yaml_file(file.path()).expect("load");
    assert_eq!(config.max_types, 40);
    assert_eq!(config.pool_limit, Some(8));

    let registry = ApplicationTypeRegistry::new(config);
    assert_eq!(registry.max_allowed(), 40);
    assert!(registry.application_type(names::ALL).is_some());
    assert!(registry.total_registered() <= 40);
}

#[test]
fn yaml_config_rejects_bad_documents() {
    assert!(RegistryConfig::from_yaml_str("max_types: [1, 2]").is_err());
    assert!(RegistryConfig::from_yaml_str("max_types: 1").is_err());
}

#[test]
fn table_limit_is_enforced() {
    let registry =
        ApplicationTypeRegistry::new(RegistryConfig::default().max_types(4).standard_types(false));
    for name in ["a", "b", "c"] {
        registry.register(name).expect("register");
    }
    assert!(matches!(registry.register("d"), Err(GddError::AtLimit(_))));
    // Existing names still resolve.
    assert_eq!(registry.register("b").expect("existing"), 2);
}

#[test]
fn prototype_registered_twice_yields_one_tag() {
    let (registry, tag, value, units) = reading_registry();
    let again = Gdd::container(0);
    again
        .insert(Gdd::scalar(value, PrimitiveType::Float64))
        .expect("insert");
    again
        .insert(Gdd::scalar(units, PrimitiveType::String))
        .expect("insert");
    assert_eq!(
        registry
            .register_with_prototype("reading", again)
            .expect("same shape"),
        tag
    );

    let other = Gdd::container(0);
    other
        .insert(Gdd::scalar(value, PrimitiveType::Float64))
        .expect("insert");
    assert!(matches!(
        registry.register_with_prototype("reading", other),
        Err(GddError::AlreadyDefined(_))
    ));
    assert_eq!(registry.map_app_to_index(tag, value), Ok(1));
    assert_eq!(registry.map_app_to_index(tag, units), Ok(2));
}

#[test]
fn released_instance_is_recycled() {
    let (registry, tag, value, units) = reading_registry();

    let first = registry.get_dd(tag).expect("instance");
    assert!(first.is_managed());
    first.find(value).expect("value").put(9.5f64).expect("put");
    first.find(units).expect("units").put("V".to_string()).expect("put");
    first.set_stat_sevr(1, 1);
    drop(first);

    let stats = registry.pool_stats(tag).expect("stats");
    assert_eq!((stats.constructed, stats.recycled), (1, 1));
    assert_eq!((stats.live, stats.pooled), (0, 1));

    // The recycled instance looks exactly like a fresh one.
    let second = registry.get_dd(tag).expect("instance");
    assert_eq!(registry.pool_stats(tag).expect("stats").constructed, 1);
    assert_eq!(second.app_type(), tag);
    assert_eq!(second.stat(), 0);
    assert_eq!(second.find(value).expect("value").get::<f64>(), Ok(0.0));
    assert_eq!(
        second.find(units).expect("units").get::<String>(),
        Ok(String::new())
    );
    assert!(second.is_managed());
}

#[test]
fn managed_instances_cannot_be_reshaped() {
    let (registry, tag, value, _) = reading_registry();
    let instance = registry.get_dd(tag).expect("instance");
    assert!(matches!(
        instance.insert(Gdd::new()),
        Err(GddError::NotAllowed(_))
    ));
    assert!(matches!(instance.remove(0), Err(GddError::NotAllowed(_))));
    assert!(matches!(
        instance.find(value).expect("value").clear(),
        Err(GddError::NotAllowed(_))
    ));
}

#[test]
fn smart_copy_between_standard_types() {
    let registry = ApplicationTypeRegistry::new(RegistryConfig::default());
    let value = registry.application_type(names::VALUE).expect("value");
    let units = registry.application_type(names::UNITS).expect("units");
    let precision = registry.application_type(names::PRECISION).expect("precision");

    let ctrl = registry
        .get_dd_by_name("dbr_ctrl_double")
        .expect("ctrl double");
    let before = ctrl.node_count();

    let src = Gdd::container(0);
    src.insert(Gdd::from_value(value, 42i32)).expect("insert");
    src.insert(Gdd::from_value(units, "mm")).expect("insert");
    src.insert(Gdd::from_value(precision, 3i16)).expect("insert");
    src.insert(Gdd::from_value(9_000, 1u8)).expect("insert");

    let report = registry.smart_copy(&ctrl, &src).expect("smart copy");
    assert_eq!(report.copied, 3);
    assert_eq!(ctrl.node_count(), before);
    assert_eq!(ctrl.find(value).expect("value").get::<f64>(), Ok(42.0));
    assert_eq!(
        ctrl.find(units).expect("units").get::<String>(),
        Ok("mm".to_string())
    );
}
