//! Binary buffer utilities for cbor-graph.
//!
//! # Overview
//!
//! - [`Writer`] - Deferred binary writer: records [`WriteOp`] fragments and
//!   materializes them into one exactly-sized allocation
//! - [`Reader`] - Reads binary data from a byte slice with cursor tracking
//! - [`decode_f16`] / [`encode_f16`] - IEEE 754 half-precision conversions
//! - [`is_float32`] - f32 round-trip precision check
//!
//! # Example
//!
//! ```
//! use cbor_graph_buffers::{Reader, Writer};
//!
//! // Record some fragments
//! let mut writer = Writer::new();
//! writer.u8(0x01);
//! writer.u16(0x0203);
//! writer.utf8("hello");
//! let data = writer.materialize();
//!
//! // Read them back
//! let mut reader = Reader::new(&data);
//! assert_eq!(reader.u8(), 0x01);
//! assert_eq!(reader.u16(), 0x0203);
//! assert_eq!(reader.utf8(5), Some("hello"));
//! ```

mod f16;
mod is_float32;
mod reader;
mod writer;

pub use f16::{decode_f16, encode_f16};
pub use is_float32::is_float32;
pub use reader::Reader;
pub use writer::{WriteOp, Writer};
