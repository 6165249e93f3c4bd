//! CBOR codec with value sharing and cycle support.
//!
//! On top of the plain CBOR data model this crate implements the shareable
//! value protocol: tag 28 marks a value as shared, tag 29 refers back to the
//! n-th marked value. [`encode_all`] discovers shared and cyclic structure
//! automatically in two passes; [`decode_all`] plus [`resolve_references`]
//! rebuild the aliasing (including cycles) on the way back.
//!
//! ```
//! use cbor_graph::{decode_all, encode_all, resolve_references, EncodeOptions, Value};
//!
//! let shared = Value::array(vec![Value::int(1)]);
//! let roots = vec![shared.clone(), shared.clone()];
//! let mut opts = EncodeOptions::default();
//! opts.sharing = true;
//! let bytes = encode_all(&roots, opts).unwrap();
//!
//! let (mut out, mut kept) = decode_all(&bytes).unwrap();
//! resolve_references(&mut out, &mut kept);
//! assert!(std::rc::Rc::ptr_eq(&out[0], &out[1]));
//! ```

pub mod constants;

mod decoder;
mod encoder;
mod error;
mod extension;
mod resolve;
mod value;

pub use decoder::{decode, decode_all, Decoder, KeptTable};
pub use encoder::{
    encode, encode_all, encode_json, encode_with, CycleHook, EncodeOptions, Encoder, SharedHook,
};
pub use error::{DecodeError, EncodeError};
pub use extension::{CustomEncode, ExtHandler, ExtensionType};
pub use resolve::resolve_references;
pub use value::{Value, ValueRef};
