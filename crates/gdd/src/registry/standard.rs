// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Standard attribute names and the DBR-style prototype containers.

use super::ApplicationTypeRegistry;
use crate::error::Result;
use crate::types::PrimitiveType;
use crate::value::Gdd;

/// Registered attribute names.
pub mod names {
    pub const STATUS: &str = "status";
    pub const SEVERITY: &str = "severity";
    pub const TIME_STAMP: &str = "timeStamp";
    pub const PV_NAME: &str = "name";
    pub const CLASS: &str = "class";
    pub const PRECISION: &str = "precision";
    pub const GRAPH_HIGH: &str = "graphicHigh";
    pub const GRAPH_LOW: &str = "graphicLow";
    pub const CONTROL_HIGH: &str = "controlHigh";
    pub const CONTROL_LOW: &str = "controlLow";
    pub const ALARM_HIGH: &str = "alarmHigh";
    pub const ALARM_LOW: &str = "alarmLow";
    pub const ALARM_WARN_HIGH: &str = "alarmHighWarning";
    pub const ALARM_WARN_LOW: &str = "alarmLowWarning";
    pub const MAX_ELEMENTS: &str = "maxElements";
    pub const VALUE: &str = "value";
    pub const ENUM: &str = "enums";
    pub const UNITS: &str = "units";
    pub const ACKT: &str = "ackt";
    pub const ACKS: &str = "acks";
    pub const ATTRIBUTES: &str = "attributes";
    pub const ALL: &str = "all";
}

struct Tags {
    prec: u16,
    ghigh: u16,
    glow: u16,
    chigh: u16,
    clow: u16,
    ahigh: u16,
    alow: u16,
    awhigh: u16,
    awlow: u16,
    maxele: u16,
    value: u16,
    menu: u16,
    units: u16,
    ackt: u16,
    acks: u16,
}

pub(super) fn register_standard_types(registry: &ApplicationTypeRegistry) -> Result<()> {
    for name in [
        names::STATUS,
        names::SEVERITY,
        names::TIME_STAMP,
        names::PV_NAME,
        names::CLASS,
    ] {
        registry.register(name)?;
    }
    let t = Tags {
        prec: registry.register(names::PRECISION)?,
        ghigh: registry.register(names::GRAPH_HIGH)?,
        glow: registry.register(names::GRAPH_LOW)?,
        chigh: registry.register(names::CONTROL_HIGH)?,
        clow: registry.register(names::CONTROL_LOW)?,
        ahigh: registry.register(names::ALARM_HIGH)?,
        alow: registry.register(names::ALARM_LOW)?,
        awhigh: registry.register(names::ALARM_WARN_HIGH)?,
        awlow: registry.register(names::ALARM_WARN_LOW)?,
        maxele: registry.register(names::MAX_ELEMENTS)?,
        value: registry.register(names::VALUE)?,
        menu: registry.register(names::ENUM)?,
        units: registry.register_with_prototype(
            names::UNITS,
            Gdd::scalar(0, PrimitiveType::String),
        )?,
        ackt: registry.register(names::ACKT)?,
        acks: registry.register(names::ACKS)?,
    };

    let limits = [t.ghigh, t.glow, t.chigh, t.clow, t.ahigh, t.alow, t.awhigh, t.awlow];

    let attributes = Gdd::container(0);
    for tag in [t.prec]
        .into_iter()
        .chain(limits)
        .chain([t.units, t.maxele])
    {
        attributes.insert(registry.get_dd(tag)?)?;
    }
    registry.register_with_prototype(names::ATTRIBUTES, attributes)?;

    let all = Gdd::container(0);
    for tag in [t.prec]
        .into_iter()
        .chain(limits)
        .chain([t.units, t.value])
    {
        all.insert(registry.get_dd(tag)?)?;
    }
    registry.register_with_prototype(names::ALL, all)?;

    let graphic = [t.ghigh, t.glow, t.ahigh, t.alow, t.awhigh, t.awlow];
    let control = [t.ghigh, t.glow, t.chigh, t.clow, t.ahigh, t.alow, t.awhigh, t.awlow];

    for (family, fields) in [("gr", &graphic[..]), ("ctrl", &control[..])] {
        for (suffix, prim) in [
            ("short", PrimitiveType::Int16),
            ("float", PrimitiveType::Float32),
            ("char", PrimitiveType::Int8),
            ("long", PrimitiveType::Int32),
            ("double", PrimitiveType::Float64),
        ] {
            let c = Gdd::container(0);
            c.insert(Gdd::scalar(t.value, prim))?;
            if prim.is_float() {
                c.insert(Gdd::scalar(t.prec, PrimitiveType::Int16))?;
            }
            for &tag in fields {
                c.insert(Gdd::scalar(tag, prim))?;
            }
            c.insert(registry.get_dd(t.units)?)?;
            registry.register_with_prototype(&format!("dbr_{}_{}", family, suffix), c)?;
        }

        let enumerated = Gdd::container(0);
        enumerated.insert(registry.get_dd(t.menu)?)?;
        enumerated.insert(Gdd::scalar(t.value, PrimitiveType::Enum16))?;
        registry.register_with_prototype(&format!("dbr_{}_enum", family), enumerated)?;
    }

    let stsack = Gdd::container(0);
    stsack.insert(Gdd::scalar(t.value, PrimitiveType::String))?;
    stsack.insert(Gdd::scalar(t.acks, PrimitiveType::Uint16))?;
    stsack.insert(Gdd::scalar(t.ackt, PrimitiveType::Uint16))?;
    registry.register_with_prototype("dbr_stsack_string", stsack)?;

    log::debug!(
        "[ApplicationTypeRegistry] {} standard types registered",
        registry.total_registered()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RegistryConfig;

    #[test]
    fn test_standard_set() {
        let r = ApplicationTypeRegistry::new(RegistryConfig::default());
        assert_eq!(r.application_type(names::STATUS), Some(1));
        for name in [
            names::VALUE,
            names::UNITS,
            names::ATTRIBUTES,
            names::ALL,
            "dbr_gr_short",
            "dbr_gr_enum",
            "dbr_ctrl_double",
            "dbr_stsack_string",
        ] {
            assert!(r.application_type(name).is_some(), "{} missing", name);
        }
        // 20 names, 2 attribute containers, 12 dbr containers, stsack
        assert_eq!(r.total_registered(), 35);
    }

    #[test]
    fn test_dbr_ctrl_double_layout() {
        let r = ApplicationTypeRegistry::new(RegistryConfig::default());
        let tag = r.application_type("dbr_ctrl_double").expect("tag");
        let dd = r.get_dd(tag).expect("instance");
        assert!(dd.is_managed());
        assert_eq!(dd.total(), 11);
        let value = r.application_type(names::VALUE).expect("value");
        let precision = r.application_type(names::PRECISION).expect("precision");
        let units = r.application_type(names::UNITS).expect("units");
        assert_eq!(r.map_app_to_index(tag, value), Ok(1));
        assert_eq!(r.map_app_to_index(tag, precision), Ok(2));
        assert_eq!(
            dd.find(value).map(|g| g.primitive_type()),
            Some(PrimitiveType::Float64)
        );
        assert_eq!(
            dd.find(units).map(|g| g.primitive_type()),
            Some(PrimitiveType::String)
        );
    }

    #[test]
    fn test_attributes_fields_untyped() {
        let r = ApplicationTypeRegistry::new(RegistryConfig::default());
        let tag = r.application_type(names::ATTRIBUTES).expect("tag");
        let dd = r.get_dd(tag).expect("instance");
        assert_eq!(dd.total(), 11);
        let prec = r.application_type(names::PRECISION).expect("precision");
        assert!(dd.find(prec).expect("precision").is_untyped());
    }
}
