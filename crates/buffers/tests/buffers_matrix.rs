//! Writer/Reader roundtrip matrix and f16 edge-case tests for the buffers
//! crate.

use cbor_graph_buffers::{decode_f16, encode_f16, is_float32, Reader, WriteOp, Writer};

// ---------------------------------------------------------------------------
// Writer/Reader roundtrip matrix
// ---------------------------------------------------------------------------

#[test]
fn roundtrip_u8() {
    let mut w = Writer::new();
    w.u8(0x00);
    w.u8(0x7F);
    w.u8(0xFF);
    let data = w.materialize();
    let mut r = Reader::new(&data);
    assert_eq!(r.u8(), 0x00);
    assert_eq!(r.u8(), 0x7F);
    assert_eq!(r.u8(), 0xFF);
}

#[test]
fn roundtrip_u16() {
    let mut w = Writer::new();
    w.u16(0);
    w.u16(0x0102);
    w.u16(u16::MAX);
    let data = w.materialize();
    let mut r = Reader::new(&data);
    assert_eq!(r.u16(), 0);
    assert_eq!(r.u16(), 0x0102);
    assert_eq!(r.u16(), u16::MAX);
}

#[test]
fn roundtrip_u32() {
    let mut w = Writer::new();
    w.u32(0);
    w.u32(0x01020304);
    w.u32(u32::MAX);
    let data = w.materialize();
    let mut r = Reader::new(&data);
    assert_eq!(r.u32(), 0);
    assert_eq!(r.u32(), 0x01020304);
    assert_eq!(r.u32(), u32::MAX);
}

#[test]
fn roundtrip_u64_as_two_u32() {
    let mut w = Writer::new();
    w.u32(0x01020304);
    w.u32(0x05060708);
    let data = w.materialize();
    let mut r = Reader::new(&data);
    assert_eq!(r.u64(), 0x0102030405060708);
}

#[test]
fn roundtrip_f64() {
    let mut w = Writer::new();
    w.f64(0.0);
    w.f64(std::f64::consts::PI);
    w.f64(-std::f64::consts::E);
    w.f64(f64::INFINITY);
    w.f64(f64::NEG_INFINITY);
    let data = w.materialize();
    let mut r = Reader::new(&data);
    assert_eq!(r.f64(), 0.0);
    assert_eq!(r.f64(), std::f64::consts::PI);
    assert_eq!(r.f64(), -std::f64::consts::E);
    assert_eq!(r.f64(), f64::INFINITY);
    assert_eq!(r.f64(), f64::NEG_INFINITY);
}

#[test]
fn roundtrip_f64_nan() {
    let mut w = Writer::new();
    w.f64(f64::NAN);
    let data = w.materialize();
    let mut r = Reader::new(&data);
    assert!(r.f64().is_nan());
}

#[test]
fn roundtrip_raw() {
    let mut w = Writer::new();
    w.raw(&[]);
    w.raw(&[0xDE, 0xAD, 0xBE, 0xEF]);
    let data = w.materialize();
    let mut r = Reader::new(&data);
    assert_eq!(r.buf(0), &[]);
    assert_eq!(r.buf(4), &[0xDE, 0xAD, 0xBE, 0xEF]);
}

#[test]
fn roundtrip_utf8() {
    let mut w = Writer::new();
    w.utf8("hello");
    w.utf8("");
    w.utf8("cafe\u{0301}"); // e + combining accent
    w.utf8("\u{1F600}"); // emoji
    let data = w.materialize();
    let mut r = Reader::new(&data);
    assert_eq!(r.utf8(5), Some("hello"));
    assert_eq!(r.utf8(0), Some(""));
    assert_eq!(r.utf8("cafe\u{0301}".len()), Some("cafe\u{0301}"));
    assert_eq!(r.utf8("\u{1F600}".len()), Some("\u{1F600}"));
}

#[test]
fn utf8_rejects_invalid_bytes() {
    let data = [0xFF, 0xFE];
    let mut r = Reader::new(&data);
    assert_eq!(r.utf8(2), None);
}

// ---------------------------------------------------------------------------
// Deferred fragments
// ---------------------------------------------------------------------------

#[test]
fn byte_size_tracks_pending_fragments() {
    let mut w = Writer::new();
    assert_eq!(w.byte_size(), 0);
    w.push(WriteOp::U8(0x01));
    w.push(WriteOp::U32(0x02030405));
    w.push(WriteOp::Utf8("ab".to_string()));
    assert_eq!(w.byte_size(), 7);
    let data = w.materialize();
    assert_eq!(data, [0x01, 0x02, 0x03, 0x04, 0x05, b'a', b'b']);
    assert_eq!(w.byte_size(), 0);
}

#[test]
fn materialize_resets_the_window() {
    let mut w = Writer::new();
    w.u8(0x01);
    w.u8(0x02);
    let first = w.materialize();
    assert_eq!(first, [0x01, 0x02]);

    w.u8(0x03);
    let second = w.materialize();
    assert_eq!(second, [0x03]);
}

#[test]
fn streaming_sink_receives_each_fragment() {
    use std::cell::RefCell;
    use std::rc::Rc;

    let seen: Rc<RefCell<Vec<Vec<u8>>>> = Rc::new(RefCell::new(Vec::new()));
    let sink = seen.clone();
    let mut w = Writer::with_sink(Box::new(move |bytes| {
        sink.borrow_mut().push(bytes.to_vec());
    }));
    assert!(w.is_streaming());

    w.u8(0xAA);
    w.u16(0x0102);
    assert!(w.materialize().is_empty());
    assert_eq!(*seen.borrow(), vec![vec![0xAA], vec![0x01, 0x02]]);
}

// ---------------------------------------------------------------------------
// f16 decode edge cases
// ---------------------------------------------------------------------------

#[test]
fn f16_decode_zeroes() {
    assert_eq!(decode_f16(0x0000), 0.0);
    assert!(decode_f16(0x0000).is_sign_positive());
    let neg = decode_f16(0x8000);
    assert_eq!(neg, 0.0);
    assert!(neg.is_sign_negative());
}

#[test]
fn f16_decode_normals() {
    assert_eq!(decode_f16(0x3C00), 1.0);
    assert_eq!(decode_f16(0xBC00), -1.0);
    assert_eq!(decode_f16(0x4000), 2.0);
    assert_eq!(decode_f16(0x3800), 0.5);
}

#[test]
fn f16_decode_non_finite() {
    let pos = decode_f16(0x7C00);
    assert!(pos.is_infinite() && pos.is_sign_positive());
    let neg = decode_f16(0xFC00);
    assert!(neg.is_infinite() && neg.is_sign_negative());
    assert!(decode_f16(0x7C01).is_nan());
    assert!(decode_f16(0xFC01).is_nan());
    assert!(decode_f16(0x7E00).is_nan());
}

#[test]
fn f16_decode_subnormals() {
    // smallest positive subnormal: 0x0001 = 2^-24
    let smallest = decode_f16(0x0001);
    assert!(smallest > 0.0 && smallest < 1e-4);
    // largest positive subnormal: 0x03FF
    let largest = decode_f16(0x03FF);
    assert!(largest > 0.0 && largest < 1.0);
}

// ---------------------------------------------------------------------------
// f16 encode
// ---------------------------------------------------------------------------

#[test]
fn f16_encode_exact_values_roundtrip() {
    for bits in [0x3C00u16, 0xBC00, 0x4000, 0x3800, 0x7BFF, 0x0001, 0x03FF] {
        let val = decode_f16(bits);
        assert_eq!(encode_f16(val), Some(bits), "bits {bits:#06x}");
    }
}

#[test]
fn f16_encode_rejects_lossy_values() {
    assert_eq!(encode_f16(0.1), None);
    assert_eq!(encode_f16(65536.0), None);
    assert_eq!(encode_f16(1e-30), None);
}

// ---------------------------------------------------------------------------
// is_float32
// ---------------------------------------------------------------------------

#[test]
fn is_float32_exact_values() {
    assert!(is_float32(0.0));
    assert!(is_float32(1.0));
    assert!(is_float32(0.5));
    assert!(is_float32(0.25));
    assert!(is_float32(-1.0));
}

#[test]
fn is_float32_non_representable() {
    assert!(!is_float32(0.1));
    assert!(!is_float32(0.3));
}

// ---------------------------------------------------------------------------
// Mixed-type roundtrip: interleaved writes
// ---------------------------------------------------------------------------

#[test]
fn roundtrip_mixed_types() {
    let mut w = Writer::new();
    w.u8(0x42);
    w.u16(0xCAFE);
    w.u32(0xDEADBEEF);
    w.f64(std::f64::consts::PI);
    w.utf8("hello");
    let data = w.materialize();

    let mut r = Reader::new(&data);
    assert_eq!(r.u8(), 0x42);
    assert_eq!(r.u16(), 0xCAFE);
    assert_eq!(r.u32(), 0xDEADBEEF);
    assert_eq!(r.f64(), std::f64::consts::PI);
    assert_eq!(r.utf8(5), Some("hello"));
    assert_eq!(r.size(), 0);
}
