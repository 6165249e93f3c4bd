//! CBOR decoder for definite-length payloads.
//!
//! Tag 28 values are recorded into a kept table as they are decoded; tag 29
//! back-references stay in the tree as `Tag(29, index)` placeholders for
//! [`crate::resolve::resolve_references`] to patch afterwards.

use cbor_graph_buffers::{decode_f16, Reader};

use crate::constants::*;
use crate::error::DecodeError;
use crate::value::{Value, ValueRef};

/// Shared-value table built while decoding. Index `i` holds the value
/// marked by the `i`-th tag 28, in pre-order; a slot is `None` only while
/// its value is still being decoded (or if a caller left a gap).
pub type KeptTable = Vec<Option<ValueRef>>;

pub struct Decoder<'a> {
    rdr: Reader<'a>,
    kept: KeptTable,
}

impl<'a> Decoder<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            rdr: Reader::new(data),
            kept: Vec::new(),
        }
    }

    fn ensure(&self, bytes: usize) -> Result<(), DecodeError> {
        if self.rdr.size() < bytes {
            Err(DecodeError::EndOfInput)
        } else {
            Ok(())
        }
    }

    /// Reads the argument for a header with the given minor value.
    fn arg(&mut self, minor: u8) -> Result<u64, DecodeError> {
        match minor {
            0..=23 => Ok(minor as u64),
            24 => {
                self.ensure(1)?;
                Ok(self.rdr.u8() as u64)
            }
            25 => {
                self.ensure(2)?;
                Ok(self.rdr.u16() as u64)
            }
            26 => {
                self.ensure(4)?;
                Ok(self.rdr.u32() as u64)
            }
            27 => {
                self.ensure(8)?;
                Ok(self.rdr.u64())
            }
            31 => Err(DecodeError::IndefiniteLength),
            _ => Err(DecodeError::UnexpectedMinor),
        }
    }

    fn len(&mut self, minor: u8) -> Result<usize, DecodeError> {
        Ok(self.arg(minor)? as usize)
    }

    pub fn val(&mut self) -> Result<ValueRef, DecodeError> {
        self.ensure(1)?;
        let octet = self.rdr.u8();
        let major = octet >> 5;
        let minor = octet & MINOR_MASK;
        match major {
            MAJOR_UIN => {
                let n = self.arg(minor)?;
                if n <= i64::MAX as u64 {
                    Ok(Value::int(n as i64))
                } else {
                    Ok(Value::bigint(n as i128))
                }
            }
            MAJOR_NIN => {
                let n = self.arg(minor)?;
                let val = -1i128 - n as i128;
                if val >= i64::MIN as i128 {
                    Ok(Value::int(val as i64))
                } else {
                    Ok(Value::bigint(val))
                }
            }
            MAJOR_BIN => {
                let len = self.len(minor)?;
                self.ensure(len)?;
                Ok(Value::bytes(self.rdr.buf(len).to_vec()))
            }
            MAJOR_STR => {
                let len = self.len(minor)?;
                self.ensure(len)?;
                match self.rdr.utf8(len) {
                    Some(s) => Ok(Value::str(s)),
                    None => Err(DecodeError::InvalidUtf8),
                }
            }
            MAJOR_ARR => {
                let len = self.len(minor)?;
                let mut items = Vec::new();
                for _ in 0..len {
                    items.push(self.val()?);
                }
                Ok(Value::array(items))
            }
            MAJOR_MAP => {
                let len = self.len(minor)?;
                let mut pairs = Vec::new();
                for _ in 0..len {
                    let key = self.val()?;
                    let val = self.val()?;
                    pairs.push((key, val));
                }
                Ok(Value::map(pairs))
            }
            MAJOR_TAG => {
                let tag = self.arg(minor)?;
                self.tagged(tag)
            }
            _ => self.token(minor),
        }
    }

    fn tagged(&mut self, tag: u64) -> Result<ValueRef, DecodeError> {
        match tag {
            TAG_SHAREABLE => {
                // reserve the index before decoding the payload, so nested
                // marks number in pre-order
                let index = self.kept.len();
                self.kept.push(None);
                let val = self.val()?;
                self.kept[index] = Some(val.clone());
                Ok(val)
            }
            TAG_SHARED_REF => {
                let inner = self.val()?;
                // left in the tree for the resolver
                Ok(Value::tag(TAG_SHARED_REF, inner))
            }
            TAG_DATE_EPOCH => {
                let inner = self.val()?;
                match inner.as_ref() {
                    Value::Integer(i) => Ok(Value::date(*i as f64)),
                    Value::Float(f) => Ok(Value::date(*f)),
                    _ => Err(DecodeError::InvalidTagPayload { tag }),
                }
            }
            TAG_POS_BIGNUM | TAG_NEG_BIGNUM => {
                let inner = self.val()?;
                let Value::Bytes(bytes) = inner.as_ref() else {
                    return Err(DecodeError::InvalidTagPayload { tag });
                };
                let magnitude =
                    be_magnitude(bytes).ok_or(DecodeError::InvalidTagPayload { tag })?;
                if tag == TAG_POS_BIGNUM {
                    Ok(Value::bigint(magnitude as i128))
                } else {
                    Ok(Value::bigint(-1i128 - magnitude as i128))
                }
            }
            TAG_DECIMAL_FRACTION => {
                let inner = self.val()?;
                if let Value::Array(items) = inner.as_ref() {
                    let items = items.borrow();
                    if items.len() == 2 {
                        if let (Some(exponent), Some(mantissa)) =
                            (as_i64(&items[0]), as_i128(&items[1]))
                        {
                            return Ok(Value::decimal(exponent, mantissa));
                        }
                    }
                }
                Err(DecodeError::InvalidTagPayload { tag })
            }
            TAG_URI => {
                let inner = self.val()?;
                match inner.as_ref() {
                    Value::Str(s) => Ok(Value::uri(s.clone())),
                    _ => Err(DecodeError::InvalidTagPayload { tag }),
                }
            }
            TAG_REGEX => {
                let inner = self.val()?;
                match inner.as_ref() {
                    Value::Str(s) => Ok(Value::regex(s.clone())),
                    _ => Err(DecodeError::InvalidTagPayload { tag }),
                }
            }
            _ => Ok(Value::tag(tag, self.val()?)),
        }
    }

    fn token(&mut self, minor: u8) -> Result<ValueRef, DecodeError> {
        match minor {
            20 => Ok(Value::bool(false)),
            21 => Ok(Value::bool(true)),
            22 => Ok(Value::null()),
            23 => Ok(Value::undefined()),
            25 => {
                self.ensure(2)?;
                Ok(Value::float(decode_f16(self.rdr.u16())))
            }
            26 => {
                self.ensure(4)?;
                Ok(Value::float(self.rdr.f32() as f64))
            }
            27 => {
                self.ensure(8)?;
                Ok(Value::float(self.rdr.f64()))
            }
            31 => Err(DecodeError::IndefiniteLength),
            other => Err(DecodeError::UnknownSimple(other)),
        }
    }
}

/// Big-endian magnitude of a bignum payload. `None` when the magnitude
/// does not fit the codec's 128-bit signed range.
fn be_magnitude(bytes: &[u8]) -> Option<u128> {
    let stripped = match bytes.iter().position(|b| *b != 0) {
        Some(start) => &bytes[start..],
        None => return Some(0),
    };
    if stripped.len() > 16 {
        return None;
    }
    let mut magnitude: u128 = 0;
    for b in stripped {
        magnitude = (magnitude << 8) | *b as u128;
    }
    if magnitude > i128::MAX as u128 {
        return None;
    }
    Some(magnitude)
}

fn as_i64(value: &ValueRef) -> Option<i64> {
    match value.as_ref() {
        Value::Integer(i) => Some(*i),
        _ => None,
    }
}

fn as_i128(value: &ValueRef) -> Option<i128> {
    match value.as_ref() {
        Value::Integer(i) => Some(*i as i128),
        Value::BigInt(i) => Some(*i),
        _ => None,
    }
}

/// Decodes the first value in `data`, returning it with the kept table
/// accumulated from tag-28 marks.
pub fn decode(data: &[u8]) -> Result<(ValueRef, KeptTable), DecodeError> {
    let mut dec = Decoder::new(data);
    let val = dec.val()?;
    Ok((val, dec.kept))
}

/// Decodes every value in `data`. All values share one kept table.
pub fn decode_all(data: &[u8]) -> Result<(Vec<ValueRef>, KeptTable), DecodeError> {
    let mut dec = Decoder::new(data);
    let mut out = Vec::new();
    while dec.rdr.size() > 0 {
        out.push(dec.val()?);
    }
    Ok((out, dec.kept))
}
