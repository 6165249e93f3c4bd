//! The value graph the codec operates on.
//!
//! Values live behind [`ValueRef`] handles. A handle's allocation address is
//! its identity: the sharing machinery (kept table, coloring, ancestor path)
//! compares handles, never structure, so the same `ValueRef` reachable from
//! two places is one shared value, while two structurally equal allocations
//! are distinct. Containers hold their children in `RefCell`s so graphs can
//! be made cyclic and so the reference resolver can patch slots in place.

use std::cell::RefCell;
use std::rc::Rc;

use crate::extension::CustomEncode;

/// Shared handle to a [`Value`].
pub type ValueRef = Rc<Value>;

#[derive(Debug)]
pub enum Value {
    Null,
    Undefined,
    Bool(bool),
    Integer(i64),
    Float(f64),
    Str(String),
    Bytes(Vec<u8>),
    Array(RefCell<Vec<ValueRef>>),
    Map(RefCell<Vec<(ValueRef, ValueRef)>>),
    /// Encoded as an array; kept distinct so decoded data can be rebuilt
    /// into a set by the caller.
    Set(RefCell<Vec<ValueRef>>),
    /// An arbitrary tagged value.
    Tag(u64, RefCell<ValueRef>),
    /// Epoch date, in seconds (tag 1).
    Date(f64),
    /// Regular expression source (tag 35).
    Regex(String),
    /// Arbitrary-precision integer (tags 2/3).
    BigInt(i128),
    /// Decimal fraction `mantissa * 10^exponent` (tag 4).
    Decimal { exponent: i64, mantissa: i128 },
    /// URI text (tag 32).
    Uri(String),
    /// A value that encodes itself.
    Custom(Rc<dyn CustomEncode>),
}

impl Value {
    pub fn null() -> ValueRef {
        Rc::new(Value::Null)
    }

    pub fn undefined() -> ValueRef {
        Rc::new(Value::Undefined)
    }

    pub fn bool(b: bool) -> ValueRef {
        Rc::new(Value::Bool(b))
    }

    pub fn int(i: i64) -> ValueRef {
        Rc::new(Value::Integer(i))
    }

    pub fn float(f: f64) -> ValueRef {
        Rc::new(Value::Float(f))
    }

    pub fn str(s: impl Into<String>) -> ValueRef {
        Rc::new(Value::Str(s.into()))
    }

    pub fn bytes(b: Vec<u8>) -> ValueRef {
        Rc::new(Value::Bytes(b))
    }

    pub fn array(items: Vec<ValueRef>) -> ValueRef {
        Rc::new(Value::Array(RefCell::new(items)))
    }

    pub fn map(pairs: Vec<(ValueRef, ValueRef)>) -> ValueRef {
        Rc::new(Value::Map(RefCell::new(pairs)))
    }

    pub fn set(items: Vec<ValueRef>) -> ValueRef {
        Rc::new(Value::Set(RefCell::new(items)))
    }

    pub fn tag(tag: u64, val: ValueRef) -> ValueRef {
        Rc::new(Value::Tag(tag, RefCell::new(val)))
    }

    pub fn date(epoch_seconds: f64) -> ValueRef {
        Rc::new(Value::Date(epoch_seconds))
    }

    pub fn regex(source: impl Into<String>) -> ValueRef {
        Rc::new(Value::Regex(source.into()))
    }

    pub fn bigint(i: i128) -> ValueRef {
        Rc::new(Value::BigInt(i))
    }

    pub fn decimal(exponent: i64, mantissa: i128) -> ValueRef {
        Rc::new(Value::Decimal { exponent, mantissa })
    }

    pub fn uri(s: impl Into<String>) -> ValueRef {
        Rc::new(Value::Uri(s.into()))
    }

    pub fn custom(c: Rc<dyn CustomEncode>) -> ValueRef {
        Rc::new(Value::Custom(c))
    }

    /// Composite values participate in identity bookkeeping (coloring,
    /// ancestor path). Scalars are compared by content and carry no
    /// meaningful identity.
    pub fn is_composite(&self) -> bool {
        !matches!(
            self,
            Value::Null
                | Value::Undefined
                | Value::Bool(_)
                | Value::Integer(_)
                | Value::Float(_)
                | Value::Str(_)
        )
    }

    /// Builds a value tree from a JSON document. Integers that fit `i64`
    /// stay integers; larger magnitudes become bignums.
    pub fn from_json(json: &serde_json::Value) -> ValueRef {
        match json {
            serde_json::Value::Null => Value::null(),
            serde_json::Value::Bool(b) => Value::bool(*b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::int(i)
                } else if let Some(u) = n.as_u64() {
                    Value::bigint(u as i128)
                } else {
                    Value::float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            serde_json::Value::String(s) => Value::str(s.clone()),
            serde_json::Value::Array(items) => {
                Value::array(items.iter().map(Value::from_json).collect())
            }
            serde_json::Value::Object(obj) => Value::map(
                obj.iter()
                    .map(|(k, v)| (Value::str(k.clone()), Value::from_json(v)))
                    .collect(),
            ),
        }
    }
}

/// Structural equality. Only meaningful for acyclic values; identity checks
/// on graphs with cycles should use `Rc::ptr_eq` instead.
impl PartialEq for Value {
    fn eq(&self, other: &Value) -> bool {
        use Value::*;
        match (self, other) {
            (Null, Null) | (Undefined, Undefined) => true,
            (Bool(a), Bool(b)) => a == b,
            (Integer(a), Integer(b)) => a == b,
            (Float(a), Float(b)) => a == b,
            (Str(a), Str(b)) => a == b,
            (Bytes(a), Bytes(b)) => a == b,
            (Array(a), Array(b)) => *a.borrow() == *b.borrow(),
            (Set(a), Set(b)) => *a.borrow() == *b.borrow(),
            (Map(a), Map(b)) => *a.borrow() == *b.borrow(),
            (Tag(ta, va), Tag(tb, vb)) => ta == tb && *va.borrow() == *vb.borrow(),
            (Date(a), Date(b)) => a == b,
            (Regex(a), Regex(b)) => a == b,
            (BigInt(a), BigInt(b)) => a == b,
            (
                Decimal {
                    exponent: ea,
                    mantissa: ma,
                },
                Decimal {
                    exponent: eb,
                    mantissa: mb,
                },
            ) => ea == eb && ma == mb,
            (Uri(a), Uri(b)) => a == b,
            (Custom(a), Custom(b)) => {
                Rc::as_ptr(a) as *const () == Rc::as_ptr(b) as *const ()
            }
            _ => false,
        }
    }
}
