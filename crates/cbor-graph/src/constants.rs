//! CBOR wire constants.

// MAJOR type values (bits 7-5 of the initial byte)
pub const MAJOR_UIN: u8 = 0b000;
pub const MAJOR_NIN: u8 = 0b001;
pub const MAJOR_BIN: u8 = 0b010;
pub const MAJOR_STR: u8 = 0b011;
pub const MAJOR_ARR: u8 = 0b100;
pub const MAJOR_MAP: u8 = 0b101;
pub const MAJOR_TAG: u8 = 0b110;
pub const MAJOR_TKN: u8 = 0b111;

// MAJOR type overlays (major shifted to bits 7-5)
pub const OVERLAY_UIN: u8 = 0b000_00000;
pub const OVERLAY_NIN: u8 = 0b001_00000;
pub const OVERLAY_BIN: u8 = 0b010_00000;
pub const OVERLAY_STR: u8 = 0b011_00000;
pub const OVERLAY_ARR: u8 = 0b100_00000;
pub const OVERLAY_MAP: u8 = 0b101_00000;
pub const OVERLAY_TAG: u8 = 0b110_00000;
pub const OVERLAY_TKN: u8 = 0b111_00000;

pub const MINOR_MASK: u8 = 0b11111;

// Registered tags the codec understands
pub const TAG_DATE_EPOCH: u64 = 1;
pub const TAG_POS_BIGNUM: u64 = 2;
pub const TAG_NEG_BIGNUM: u64 = 3;
pub const TAG_DECIMAL_FRACTION: u64 = 4;
pub const TAG_URI: u64 = 32;
pub const TAG_REGEX: u64 = 35;

// Non-standard sharing extension
/// Marks the tagged value as shareable; it takes the next index in the
/// kept table, in order of first appearance.
pub const TAG_SHAREABLE: u64 = 28;
/// Back-reference to an earlier shareable value, by kept-table index.
pub const TAG_SHARED_REF: u64 = 29;

/// Default recursion ceiling for the encoder.
pub const DEFAULT_MAX_DEPTH: usize = 20;
