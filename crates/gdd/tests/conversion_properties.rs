// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

#![allow(clippy::uninlined_format_args)] // Test/bench code readability over pedantic
#![allow(clippy::cast_possible_truncation)] // Test parameters
#![allow(clippy::cast_precision_loss)] // Test data conversions
#![allow(clippy::float_cmp)] // Test assertions with constants
#![allow(clippy::unreadable_literal)] // Large test constants

//! Randomized properties of the conversion matrix.

use gdd::{
    convert::{convert_elements, format_number, parse_number},
    ConversionMatrix, Elements, Gdd, PrimitiveType, Scalar,
};

const ROUNDS: usize = 2_000;

#[test]
fn integer_widening_round_trips() {
    let mut rng = fastrand::Rng::with_seed(0x6764_6401);
    for _ in 0..ROUNDS {
        let narrow: Vec<i16> = (0..8).map(|_| rng.i16(..)).collect();
        let wide = convert_elements(
            PrimitiveType::Int32,
            &Elements::Int16(narrow.clone()).as_slice(),
            None,
        )
        .expect("widen");
        let back = convert_elements(PrimitiveType::Int16, &wide.as_slice(), None).expect("narrow");
        assert_eq!(back, Elements::Int16(narrow));

        let byte = rng.u8(..);
        let as_f64 = ConversionMatrix::native()
            .convert_scalar(PrimitiveType::Float64, Scalar::Uint8(byte), None)
            .expect("to f64");
        let again = ConversionMatrix::native()
            .convert_scalar(PrimitiveType::Uint8, as_f64, None)
            .expect("to u8");
        assert_eq!(again, Scalar::Uint8(byte));
    }
}

#[test]
fn float64_text_round_trips() {
    let mut rng = fastrand::Rng::with_seed(0x6764_6402);
    for _ in 0..ROUNDS {
        let value = (rng.f64() - 0.5) * 10f64.powi(rng.i32(-6..=12));
        let text = format_number(&Scalar::Float64(value)).expect("format");
        let parsed = parse_number(&text).expect("parse");
        assert_eq!(parsed, value, "text {:?}", text);

        let back = ConversionMatrix::native()
            .convert_scalar(PrimitiveType::Float64, Scalar::String(text), None)
            .expect("convert");
        assert_eq!(back, Scalar::Float64(value));
    }
}

#[test]
fn out_of_range_leaves_destination_untouched() {
    let mut rng = fastrand::Rng::with_seed(0x6764_6403);
    for _ in 0..ROUNDS / 10 {
        let target = Gdd::array(1, PrimitiveType::Int8, &[4]);
        let before: Vec<i8> = (0..4).map(|_| rng.i8(..)).collect();
        target.put_array(&before).expect("seed");

        let mut src: Vec<i32> = (0..4).map(|_| i32::from(rng.i8(..))).collect();
        src[rng.usize(..4)] = rng.i32(1_000..100_000);
        assert!(target.put_array(&src).is_err());
        assert_eq!(target.get_array::<i8>().expect("read"), before);
    }
}

#[test]
fn float_array_through_strings_to_int() {
    let samples = Gdd::array(1, PrimitiveType::Float32, &[3]);
    samples.put_array(&[1.0f32, 2.0, 3.0]).expect("put");

    let strings = samples.get_array::<String>().expect("strings");
    assert_eq!(strings, vec!["1", "2", "3"]);

    let ints = Gdd::array(2, PrimitiveType::Int32, &[3]);
    ints.put_array(&strings).expect("parse");
    assert_eq!(ints.get_array::<i32>().expect("ints"), vec![1, 2, 3]);
}

#[test]
fn wire_tables_are_inverse() {
    let mut rng = fastrand::Rng::with_seed(0x6764_6404);
    for _ in 0..ROUNDS {
        let values: Vec<u32> = (0..4).map(|_| rng.u32(..)).collect();
        let src = Elements::Uint32(values.clone());
        let mut wire = Elements::zeroed(PrimitiveType::Uint32, 4).expect("zeroed");
        ConversionMatrix::to_wire()
            .convert(&mut wire.as_slice_mut(), &src.as_slice(), 4, None)
            .expect("to wire");
        let mut back = Elements::zeroed(PrimitiveType::Uint32, 4).expect("zeroed");
        ConversionMatrix::from_wire()
            .convert(&mut back.as_slice_mut(), &wire.as_slice(), 4, None)
            .expect("from wire");
        assert_eq!(back, Elements::Uint32(values));
    }
}
