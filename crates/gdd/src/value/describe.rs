// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

use super::{Body, Gdd};
use crate::convert::Scalar;
use std::fmt;

/// Arrays longer than this print a prefix only.
const MAX_PRINTED_ELEMENTS: usize = 16;

impl fmt::Display for Gdd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.dump(f, 0)
    }
}

impl Gdd {
    fn dump(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        for child in self.dump_node(f, depth)? {
            child.dump(f, depth + 1)?;
        }
        Ok(())
    }

    /// Print this node; returns its children.
    fn dump_node(
        &self,
        f: &mut fmt::Formatter<'_>,
        depth: usize,
    ) -> Result<Vec<Gdd>, fmt::Error> {
        let node = self.node();
        write!(
            f,
            "{:indent$}app={} {} status={}/{} ts={}",
            "",
            node.app,
            node.body.prim(),
            node.status.stat,
            node.status.sevr,
            node.stamp,
            indent = depth * 2
        )?;
        if !node.flags.is_empty() {
            write!(f, " flags={:?}", node.flags)?;
        }
        match &node.body {
            Body::Scalar(Scalar::Invalid) => writeln!(f)?,
            Body::Scalar(s) => writeln!(f, " value={}", scalar_text(s))?,
            Body::Array {
                bounds, buffer, ..
            } => {
                for b in bounds {
                    write!(f, " [{}:{}]", b.first(), b.size())?;
                }
                match buffer {
                    Some(buffer) => {
                        let elements = buffer.read();
                        let shown = elements.len().min(MAX_PRINTED_ELEMENTS);
                        let values: Vec<String> = (0..shown)
                            .filter_map(|i| elements.get(i))
                            .map(|s| scalar_text(&s))
                            .collect();
                        write!(f, " data=[{}", values.join(", "))?;
                        if elements.len() > shown {
                            write!(f, ", ...")?;
                        }
                        writeln!(f, "]")?;
                    }
                    None => writeln!(f, " data=none")?,
                }
            }
            Body::Container { children } => {
                writeln!(f, " children={}", children.len())?;
                return Ok(children.iter().map(Gdd::share).collect());
            }
        }
        Ok(Vec::new())
    }
}

fn scalar_text(value: &Scalar) -> String {
    match value {
        Scalar::FixedString(s) => format!("{:?}", s.as_str()),
        Scalar::String(s) => format!("{:?}", s),
        Scalar::Enum16(i) => format!("#{}", i),
        other => other
            .as_f64()
            .map(|v| v.to_string())
            .unwrap_or_default(),
    }
}
