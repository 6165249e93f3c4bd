//! Half-precision (16-bit) floating point utilities.

/// Decodes a half-precision (16-bit) floating point value.
///
/// The input is the raw binary representation (u16) of an IEEE 754 half-precision float.
///
/// # Example
///
/// ```
/// use cbor_graph_buffers::decode_f16;
///
/// assert_eq!(decode_f16(0x0000), 0.0);
/// assert_eq!(decode_f16(0x3C00), 1.0);
/// assert!(decode_f16(0x7C00).is_infinite());
/// assert!(decode_f16(0x7C01).is_nan());
/// ```
pub fn decode_f16(binary: u16) -> f64 {
    let exponent = ((binary & 0x7C00) >> 10) as i32;
    let fraction = (binary & 0x03FF) as f64;
    let sign = if (binary >> 15) & 1 == 1 { -1.0 } else { 1.0 };

    if exponent == 0 {
        // Subnormal or zero
        sign * 6.103515625e-5 * (fraction / 1024.0)
    } else if exponent == 0x1F {
        // Infinity or NaN
        if fraction != 0.0 {
            f64::NAN
        } else {
            sign * f64::INFINITY
        }
    } else {
        // Normalized
        sign * 2f64.powi(exponent - 15) * (1.0 + fraction / 1024.0)
    }
}

/// Encodes a finite value as a half-precision (16-bit) float.
///
/// Returns `None` when half precision cannot hold the value. The conversion
/// goes through the f32 bit pattern: the low 13 mantissa bits must be zero,
/// and the exponent must land either in the normal half range or in the
/// subnormal window with no significant bits shifted out.
///
/// Callers that require exactness should still verify
/// `decode_f16(bits) == value`, since the initial f64→f32 step can round.
pub fn encode_f16(value: f64) -> Option<u16> {
    let u = (value as f32).to_bits();
    if u & 0x1FFF != 0 {
        return None;
    }
    let sign = ((u >> 16) & 0x8000) as u16;
    let exp = ((u >> 23) & 0xFF) as i32;
    let mant = u & 0x007F_FFFF;
    if (113..=142).contains(&exp) {
        // Normal half-precision range
        Some(sign + (((exp - 112) as u16) << 10) + (mant >> 13) as u16)
    } else if (103..113).contains(&exp) {
        // Subnormal half; the implicit leading bit becomes explicit
        if mant & ((1 << (126 - exp)) - 1) != 0 {
            return None;
        }
        Some(sign + ((mant + 0x0080_0000) >> (126 - exp)) as u16)
    } else {
        None
    }
}
