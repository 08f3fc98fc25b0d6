// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Flatten Benchmark
//!
//! Measures flattening a standard control record and a waveform, relinking
//! to offsets and restoring.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use gdd::{flat, names, ApplicationTypeRegistry, Elements, Gdd, RegistryConfig};

fn control_record(registry: &ApplicationTypeRegistry) -> Gdd {
    let record = registry
        .get_dd_by_name("dbr_ctrl_double")
        .expect("ctrl double");
    if let Some(value) = registry
        .application_type(names::VALUE)
        .and_then(|tag| record.find(tag))
    {
        value.put(12.5f64).expect("value");
    }
    record
}

fn bench_flatten(c: &mut Criterion) {
    let registry = ApplicationTypeRegistry::new(RegistryConfig::default());
    let record = control_record(&registry);
    let waveform = Gdd::from_elements(1, Elements::Float64(vec![0.5; 4_096]));

    c.bench_function("flatten_ctrl_double", |b| {
        b.iter(|| black_box(&record).flatten().expect("flatten"));
    });

    let mut buf = vec![0u8; waveform.total_size_bytes()];
    c.bench_function("flatten_waveform_in_place", |b| {
        b.iter(|| flat::flatten_with_address(black_box(&waveform), &mut buf));
    });

    let mut image = record.flatten().expect("flatten");
    image.to_offsets().expect("offsets");
    let bytes = image.into_bytes();
    c.bench_function("restore_ctrl_double", |b| {
        b.iter(|| flat::restore(black_box(&bytes)).expect("restore"));
    });

    c.bench_function("relink_ctrl_double", |b| {
        let mut scratch = bytes.clone();
        b.iter(|| {
            flat::convert_offsets_to_address(&mut scratch).expect("addresses");
            flat::convert_address_to_offsets(&mut scratch).expect("offsets");
        });
    });
}

criterion_group!(benches, bench_flatten);
criterion_main!(benches);
