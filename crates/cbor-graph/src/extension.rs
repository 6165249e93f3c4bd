//! Pluggable value encoders.
//!
//! The encoder carries an ordered list of `(ExtensionType, ExtHandler)`
//! entries; the first entry whose predicate matches a value takes over its
//! encoding. URIs and decimal fractions are pre-registered, so replacing
//! their handlers changes how those values go on the wire.

use std::fmt;
use std::rc::Rc;

use crate::encoder::Encoder;
use crate::error::EncodeError;
use crate::value::{Value, ValueRef};

/// A named structural match over values.
#[derive(Clone)]
pub struct ExtensionType {
    /// Registry key; registering a second handler under the same name
    /// replaces the first.
    pub name: &'static str,
    /// Returns `true` if the handler should encode this value.
    pub matches: fn(&Value) -> bool,
}

impl fmt::Debug for ExtensionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtensionType")
            .field("name", &self.name)
            .finish()
    }
}

/// Encodes a matched value through the encoder it was handed.
pub type ExtHandler = Rc<dyn Fn(&mut Encoder, &ValueRef) -> Result<(), EncodeError>>;

/// A value that knows how to put itself on the wire.
///
/// Consulted after the extension registry: a [`Value::Custom`] no registered
/// type claims encodes through this trait.
pub trait CustomEncode: fmt::Debug {
    fn encode_cbor(&self, encoder: &mut Encoder) -> Result<(), EncodeError>;
}
