//! CBOR encoder with the sharing/cycles extension.
//!
//! Every header uses the minimal width for its argument, map keys are
//! pre-encoded and sorted (shorter first, then lexicographic), and values
//! already in the kept table encode as tag-29 back-references instead of
//! being serialized again.

use std::cmp::Ordering;
use std::collections::HashSet;
use std::rc::Rc;

use cbor_graph_buffers::{decode_f16, encode_f16, is_float32, Writer};

use crate::constants::*;
use crate::error::EncodeError;
use crate::extension::{ExtHandler, ExtensionType};
use crate::value::{Value, ValueRef};

/// Callback fired the second time a shared composite is reached; returning
/// `false` skips re-encoding its subtree.
pub type SharedHook = Box<dyn FnMut(&ValueRef) -> bool>;
/// Callback fired when a value turns out to be its own ancestor.
pub type CycleHook = Box<dyn FnMut(&ValueRef)>;

/// Per-invocation encoder configuration.
pub struct EncodeOptions {
    /// Recursion ceiling; exceeding it is a hard error.
    pub max_depth: usize,
    /// Seed for the back-reference table. Values already here encode as
    /// tag-29 references from the start.
    pub kept: Vec<ValueRef>,
    /// Values to wrap with tag 28 on first encounter; later encounters
    /// become tag-29 back-references.
    pub please_keep: Vec<ValueRef>,
    /// With [`encode_all`]: discover values reachable more than once and
    /// re-encode with them kept.
    pub sharing: bool,
    /// Like `sharing`, but aimed at self-referential data. Either flag
    /// triggers the same two-pass discovery.
    pub cycles: bool,
    /// Accepted for compatibility; maps are always canonically ordered.
    pub canonical: bool,
    /// Streaming sink. Every recorded fragment is flushed to it
    /// synchronously and the encode functions return no bytes.
    pub stream: Option<Box<dyn FnMut(&[u8])>>,
    pub on_shared: Option<SharedHook>,
    pub on_cycle: Option<CycleHook>,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            kept: Vec::new(),
            please_keep: Vec::new(),
            sharing: false,
            cycles: false,
            canonical: false,
            stream: None,
            on_shared: None,
            on_cycle: None,
        }
    }
}

/// CBOR encoder over a deferred [`Writer`].
///
/// The kept table, coloring set and ancestor path live on the instance, so
/// one encoder can push several values that share a reference space (see
/// [`encode_all`]).
pub struct Encoder {
    pub writer: Writer,
    depth: usize,
    max_depth: usize,
    kept: Vec<ValueRef>,
    please_keep: Vec<ValueRef>,
    colored: HashSet<*const Value>,
    path: Vec<*const Value>,
    on_shared: Option<SharedHook>,
    on_cycle: Option<CycleHook>,
    types: Vec<(ExtensionType, ExtHandler)>,
}

impl Default for Encoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Encoder {
    pub fn new() -> Self {
        Self::with_options(EncodeOptions::default())
    }

    pub fn with_options(options: EncodeOptions) -> Self {
        let EncodeOptions {
            max_depth,
            kept,
            please_keep,
            stream,
            mut on_shared,
            on_cycle,
            ..
        } = options;
        // Cycle detection needs coloring as a first cut, so give it a
        // permissive shared hook when none was supplied.
        if on_cycle.is_some() && on_shared.is_none() {
            on_shared = Some(Box::new(|_| true));
        }
        let writer = match stream {
            Some(sink) => Writer::with_sink(sink),
            None => Writer::new(),
        };
        Self {
            writer,
            depth: 0,
            max_depth,
            kept,
            please_keep,
            colored: HashSet::new(),
            path: Vec::new(),
            on_shared,
            on_cycle,
            types: default_types(),
        }
    }

    /// Registers a handler for an extension type. A handler registered
    /// under an existing name replaces it; the previous handler is
    /// returned so it can be restored or chained.
    pub fn add_extension_type(
        &mut self,
        ty: ExtensionType,
        handler: ExtHandler,
    ) -> Option<ExtHandler> {
        for entry in self.types.iter_mut() {
            if entry.0.name == ty.name {
                return Some(std::mem::replace(&mut entry.1, handler));
            }
        }
        self.types.push((ty, handler));
        None
    }

    /// Encodes one value and materializes the bytes. In streaming mode the
    /// bytes have already gone to the sink and the result is empty.
    pub fn encode(&mut self, value: &ValueRef) -> Result<Vec<u8>, EncodeError> {
        self.writer.reset();
        self.push_any(value)?;
        Ok(self.writer.materialize())
    }

    /// Encodes a value, honoring the reference protocol, coloring and the
    /// recursion ceiling.
    pub fn push_any(&mut self, value: &ValueRef) -> Result<(), EncodeError> {
        let ptr = Rc::as_ptr(value);

        // Reference protocol first: a kept value becomes a back-reference,
        // a requested value gets marked shareable and then encoded.
        if let Some(index) = self.kept.iter().position(|k| Rc::ptr_eq(k, value)) {
            self.write_tag_hdr(TAG_SHARED_REF);
            self.write_hdr(OVERLAY_UIN, index as u64);
            return Ok(());
        }
        if let Some(index) = self.please_keep.iter().position(|k| Rc::ptr_eq(k, value)) {
            self.please_keep.remove(index);
            self.kept.push(value.clone());
            self.write_tag_hdr(TAG_SHAREABLE);
            // keep going; the value itself follows the mark
        }

        if self.tracking() && value.is_composite() {
            if self.colored.contains(&ptr) {
                let mut abort = false;
                if let Some(hook) = self.on_shared.as_mut() {
                    if !hook(value) {
                        abort = true;
                    }
                }
                if self.path.contains(&ptr) {
                    if let Some(hook) = self.on_cycle.as_mut() {
                        hook(value);
                        abort = true;
                    }
                }
                if abort {
                    return Ok(());
                }
            }
            self.colored.insert(ptr);
        }

        let on_path = self.on_cycle.is_some() && value.is_composite();
        if on_path {
            self.path.push(ptr);
        }
        self.depth += 1;
        let result = if self.depth > self.max_depth {
            Err(EncodeError::RecursionLimit { depth: self.depth })
        } else {
            self.write_value(value)
        };
        if on_path {
            self.path.pop();
        }
        self.depth -= 1;
        result
    }

    fn tracking(&self) -> bool {
        self.on_shared.is_some() || self.on_cycle.is_some()
    }

    fn write_value(&mut self, value: &ValueRef) -> Result<(), EncodeError> {
        // Extension types get the first look.
        for i in 0..self.types.len() {
            if (self.types[i].0.matches)(value) {
                let handler = Rc::clone(&self.types[i].1);
                return handler(self, value);
            }
        }
        match value.as_ref() {
            Value::Null => self.write_null(),
            Value::Undefined => self.write_undefined(),
            Value::Bool(b) => self.write_boolean(*b),
            Value::Integer(int) => self.write_integer(*int),
            Value::Float(f) => self.write_number(*f),
            Value::Str(s) => self.write_str(s),
            Value::Bytes(b) => self.write_bin(b),
            Value::Array(items) | Value::Set(items) => {
                let items = items.borrow();
                self.write_hdr(OVERLAY_ARR, items.len() as u64);
                for item in items.iter() {
                    self.push_any(item)?;
                }
            }
            Value::Map(pairs) => {
                let pairs = pairs.borrow();
                self.write_map(&pairs)?;
            }
            Value::Tag(tag, inner) => {
                self.write_tag_hdr(*tag);
                let inner = inner.borrow().clone();
                self.push_any(&inner)?;
            }
            Value::Date(seconds) => {
                self.write_tag_hdr(TAG_DATE_EPOCH);
                self.write_number(*seconds);
            }
            Value::Regex(source) => {
                self.write_tag_hdr(TAG_REGEX);
                self.write_str(source);
            }
            Value::BigInt(int) => self.write_bignum(*int),
            Value::Decimal { exponent, mantissa } => self.write_decimal(*exponent, *mantissa),
            Value::Uri(s) => {
                self.write_tag_hdr(TAG_URI);
                self.write_str(s);
            }
            Value::Custom(custom) => {
                let custom = Rc::clone(custom);
                custom.encode_cbor(self)?;
            }
        }
        Ok(())
    }

    /// Writes a CBOR header: a major-type overlay plus its argument at
    /// minimal width. 64-bit arguments go out as two 4-byte fragments.
    pub fn write_hdr(&mut self, overlay: u8, val: u64) {
        let w = &mut self.writer;
        if val < 24 {
            w.u8(overlay | val as u8);
        } else if val <= 0xff {
            w.u8(overlay | 24);
            w.u8(val as u8);
        } else if val <= 0xffff {
            w.u8(overlay | 25);
            w.u16(val as u16);
        } else if val <= 0xffff_ffff {
            w.u8(overlay | 26);
            w.u32(val as u32);
        } else {
            w.u8(overlay | 27);
            w.u32((val >> 32) as u32);
            w.u32(val as u32);
        }
    }

    pub fn write_null(&mut self) {
        self.writer.u8(0xf6);
    }

    pub fn write_undefined(&mut self) {
        self.writer.u8(0xf7);
    }

    pub fn write_boolean(&mut self, b: bool) {
        self.writer.u8(if b { 0xf5 } else { 0xf4 });
    }

    pub fn write_integer(&mut self, int: i64) {
        if int >= 0 {
            self.write_hdr(OVERLAY_UIN, int as u64);
        } else {
            self.write_hdr(OVERLAY_NIN, (-1i64).wrapping_sub(int) as u64);
        }
    }

    /// Encodes a float. Integral values whose sign-adjusted magnitude fits
    /// a 64-bit header take the integer path; everything else narrows
    /// through half and single precision before settling on a double.
    pub fn write_number(&mut self, num: f64) {
        const TWO_POW_64: f64 = 18446744073709551616.0;
        if num.is_nan() {
            self.writer.raw(&[0xf9, 0x7e, 0x00]);
        } else if num.is_infinite() {
            self.writer.raw(if num < 0.0 {
                &[0xf9, 0xfc, 0x00]
            } else {
                &[0xf9, 0x7c, 0x00]
            });
        } else if num.fract() == 0.0 {
            if num >= 0.0 {
                if num < TWO_POW_64 {
                    self.write_hdr(OVERLAY_UIN, num as u64);
                } else {
                    self.write_float(num);
                }
            } else {
                let magnitude = -1.0 - num;
                if magnitude < TWO_POW_64 {
                    self.write_hdr(OVERLAY_NIN, magnitude as u64);
                } else {
                    // too wide for the negative header: fall back to a
                    // float of the original value
                    self.write_float(num);
                }
            }
        } else {
            self.write_float(num);
        }
    }

    /// Narrowest exact float encoding: half, then single, then double.
    pub fn write_float(&mut self, num: f64) {
        if let Some(bits) = encode_f16(num) {
            if decode_f16(bits) == num {
                self.writer.u8(0xf9);
                self.writer.raw(&bits.to_be_bytes());
                return;
            }
        }
        if is_float32(num) {
            self.writer.u8(0xfa);
            self.writer.raw(&(num as f32).to_be_bytes());
        } else {
            self.writer.u8(0xfb);
            self.writer.f64(num);
        }
    }

    pub fn write_str(&mut self, s: &str) {
        self.write_hdr(OVERLAY_STR, s.len() as u64);
        self.writer.utf8(s);
    }

    pub fn write_bin(&mut self, buf: &[u8]) {
        self.write_hdr(OVERLAY_BIN, buf.len() as u64);
        self.writer.raw(buf);
    }

    pub fn write_tag_hdr(&mut self, tag: u64) {
        self.write_hdr(OVERLAY_TAG, tag);
    }

    pub fn write_bignum(&mut self, int: i128) {
        let (tag, magnitude) = if int < 0 {
            (TAG_NEG_BIGNUM, (-1i128 - int) as u128)
        } else {
            (TAG_POS_BIGNUM, int as u128)
        };
        self.write_tag_hdr(tag);
        let bytes = magnitude.to_be_bytes();
        // minimal big-endian magnitude, at least one byte
        let start = bytes
            .iter()
            .position(|b| *b != 0)
            .unwrap_or(bytes.len() - 1);
        self.write_bin(&bytes[start..]);
    }

    pub fn write_decimal(&mut self, exponent: i64, mantissa: i128) {
        self.write_tag_hdr(TAG_DECIMAL_FRACTION);
        self.write_hdr(OVERLAY_ARR, 2);
        self.write_integer(exponent);
        if mantissa >= i64::MIN as i128 && mantissa <= i64::MAX as i128 {
            self.write_integer(mantissa as i64);
        } else {
            self.write_bignum(mantissa);
        }
    }

    /// Maps are always canonical: each key is encoded on its own with a
    /// fresh default encoder (outside any sharing context), and pairs are
    /// sorted by encoded length, then lexicographically.
    fn write_map(&mut self, pairs: &[(ValueRef, ValueRef)]) -> Result<(), EncodeError> {
        self.write_hdr(OVERLAY_MAP, pairs.len() as u64);
        let mut sorted = Vec::with_capacity(pairs.len());
        for (key, val) in pairs {
            sorted.push((encode(key)?, val.clone()));
        }
        sorted.sort_by(|a, b| cmp_encoded_key(&a.0, &b.0));
        for (key_bytes, val) in &sorted {
            self.writer.raw(key_bytes);
            self.push_any(val)?;
        }
        Ok(())
    }
}

fn default_types() -> Vec<(ExtensionType, ExtHandler)> {
    vec![
        (
            ExtensionType {
                name: "uri",
                matches: |v| matches!(v, Value::Uri(_)),
            },
            Rc::new(|enc: &mut Encoder, v: &ValueRef| {
                if let Value::Uri(s) = v.as_ref() {
                    enc.write_tag_hdr(TAG_URI);
                    enc.write_str(s);
                }
                Ok(())
            }) as ExtHandler,
        ),
        (
            ExtensionType {
                name: "decimal",
                matches: |v| matches!(v, Value::Decimal { .. }),
            },
            Rc::new(|enc: &mut Encoder, v: &ValueRef| {
                if let Value::Decimal { exponent, mantissa } = v.as_ref() {
                    enc.write_decimal(*exponent, *mantissa);
                }
                Ok(())
            }) as ExtHandler,
        ),
    ]
}

/// Compare pre-encoded map keys: shorter first, then byte order.
fn cmp_encoded_key(a: &[u8], b: &[u8]) -> Ordering {
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

/// Encodes one value with default options.
pub fn encode(value: &ValueRef) -> Result<Vec<u8>, EncodeError> {
    Encoder::new().encode(value)
}

/// Encodes one value with the given options. Never runs two-pass
/// discovery; the `sharing`/`cycles` flags only apply to [`encode_all`].
///
/// With a streaming sink the returned buffer is empty; on error, fragments
/// already flushed to the sink stay flushed.
pub fn encode_with(value: &ValueRef, options: EncodeOptions) -> Result<Vec<u8>, EncodeError> {
    Encoder::with_options(options).encode(value)
}

/// Encodes a JSON document with default options.
pub fn encode_json(json: &serde_json::Value) -> Result<Vec<u8>, EncodeError> {
    encode(&Value::from_json(json))
}

/// Encodes a sequence of values through one encoder, so they share a kept
/// table. With `sharing` or `cycles` set, runs two-pass discovery.
pub fn encode_all(values: &[ValueRef], mut options: EncodeOptions) -> Result<Vec<u8>, EncodeError> {
    if options.sharing || options.cycles {
        options.sharing = false;
        options.cycles = false;
        return encode_all_with_sharing(values, options);
    }
    let mut enc = Encoder::with_options(options);
    for value in values {
        enc.push_any(value)?;
    }
    Ok(enc.writer.materialize())
}

/// Two-pass sharing discovery. Pass one encodes with hooks that collect
/// every value reached twice (or found cyclic) into an ordered list; its
/// output is discarded unless nothing was discovered. Pass two re-encodes
/// with the discovered list as `please_keep`, which assigns share indices
/// in first-encounter order.
fn encode_all_with_sharing(
    values: &[ValueRef],
    mut options: EncodeOptions,
) -> Result<Vec<u8>, EncodeError> {
    use std::cell::RefCell;

    if options.stream.is_some() {
        return Err(EncodeError::StreamingWithSharing);
    }

    fn remember(list: &RefCell<Vec<ValueRef>>, value: &ValueRef) {
        let mut list = list.borrow_mut();
        if !list.iter().any(|x| Rc::ptr_eq(x, value)) {
            list.push(value.clone());
        }
    }

    let shared: Rc<RefCell<Vec<ValueRef>>> = Rc::new(RefCell::new(Vec::new()));

    // Pass one: look for sharing. The caller's please_keep still applies
    // here; discovered values replace it for pass two.
    let pass1 = EncodeOptions {
        max_depth: options.max_depth,
        kept: options.kept.clone(),
        please_keep: std::mem::take(&mut options.please_keep),
        sharing: false,
        cycles: false,
        canonical: options.canonical,
        stream: None,
        on_shared: Some(Box::new({
            let shared = shared.clone();
            move |value: &ValueRef| {
                remember(&shared, value);
                false // no need to go in, we have already looked there
            }
        })),
        on_cycle: Some(Box::new({
            let shared = shared.clone();
            move |value: &ValueRef| {
                remember(&shared, value);
            }
        })),
    };
    let mut enc = Encoder::with_options(pass1);
    for value in values {
        enc.push_any(value)?;
    }
    let bytes = enc.writer.materialize();
    if shared.borrow().is_empty() {
        return Ok(bytes);
    }

    // Pass two: no hooks needed, the discovered values are marked already.
    options.please_keep = shared.borrow().clone();
    options.on_shared = None;
    options.on_cycle = None;
    let mut enc = Encoder::with_options(options);
    for value in values {
        enc.push_any(value)?;
    }
    Ok(enc.writer.materialize())
}
