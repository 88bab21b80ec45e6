//! The dynamic value representation.

use std::fmt;

use crate::{Heap, TypeKey};

/// Runtime value operated on by shape applications.
///
/// Scalars are stored inline; strings, lists, maps, and record fields
/// live behind [`Heap`] (shared `Arc`) payloads. `Clone` is therefore
/// shallow and cheap.
///
/// Maps are association lists: entries preserve insertion order and the
/// representation does not enforce key uniqueness. Keyed (order- and
/// duplicate-aware) semantics belong to the applications that interpret
/// dictionary shapes.
#[derive(Clone)]
pub enum Value {
    /// Absent value. The representation of nullable types, and of empty
    /// dictionary/enumerable payloads in some applications.
    Null,
    /// Boolean value.
    Bool(bool),
    /// Integer value. Also the runtime representation of enum constants.
    Int(i64),
    /// Floating-point value.
    Float(f64),
    /// String value.
    Str(Heap<String>),
    /// Ordered sequence of values.
    List(Heap<Vec<Value>>),
    /// Association list of key/value entries.
    Map(Heap<Vec<(Value, Value)>>),
    /// Instance of an object type, tagged with the declaring type's key.
    ///
    /// Fields are positional; property getters defined by the declaring
    /// shape know which index belongs to which property.
    Record {
        ty: TypeKey,
        fields: Heap<Vec<Value>>,
    },
}

// Factory Methods (ONLY way to construct heap values)

impl Value {
    /// Create an integer value.
    #[inline]
    pub fn int(n: i64) -> Self {
        Value::Int(n)
    }

    /// Create a float value.
    #[inline]
    pub fn float(f: f64) -> Self {
        Value::Float(f)
    }

    /// Create a string value.
    ///
    /// # Example
    ///
    /// ```
    /// # use kata_value::Value;
    /// let s = Value::string("hello");
    /// assert_eq!(s.as_str(), Some("hello"));
    /// ```
    #[inline]
    pub fn string(s: impl Into<String>) -> Self {
        Value::Str(Heap::new(s.into()))
    }

    /// Create a list value.
    #[inline]
    pub fn list(items: Vec<Value>) -> Self {
        Value::List(Heap::new(items))
    }

    /// Create a map value from key/value entries.
    #[inline]
    pub fn map(entries: Vec<(Value, Value)>) -> Self {
        Value::Map(Heap::new(entries))
    }

    /// Create a record value with positional fields.
    #[inline]
    pub fn record(ty: TypeKey, fields: Vec<Value>) -> Self {
        Value::Record {
            ty,
            fields: Heap::new(fields),
        }
    }
}

// Accessors

impl Value {
    /// Whether this is `Value::Null`.
    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Try to read as a boolean.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Try to read as an integer.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Try to read as a float.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Try to read as a string slice.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Try to read as a list slice.
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// Try to read as map entries.
    pub fn as_map(&self) -> Option<&[(Value, Value)]> {
        match self {
            Value::Map(entries) => Some(entries),
            _ => None,
        }
    }

    /// Try to read as a record, yielding the type key and fields.
    pub fn as_record(&self) -> Option<(TypeKey, &[Value])> {
        match self {
            Value::Record { ty, fields } => Some((*ty, fields)),
            _ => None,
        }
    }

    /// Get the kind name for error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "str",
            Value::List(_) => "list",
            Value::Map(_) => "map",
            Value::Record { .. } => "record",
        }
    }

    /// Whether two values share identity.
    ///
    /// Heap variants compare by allocation pointer, scalars by value.
    /// This is the probe that tells a shallow clone (`true` for every
    /// heap payload) apart from a deep clone (`false` for every heap
    /// payload, even though [`PartialEq`] holds).
    pub fn ptr_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a.to_bits() == b.to_bits(),
            (Value::Str(a), Value::Str(b)) => a.ptr_eq(b),
            (Value::List(a), Value::List(b)) => a.ptr_eq(b),
            (Value::Map(a), Value::Map(b)) => a.ptr_eq(b),
            (Value::Record { ty: t1, fields: f1 }, Value::Record { ty: t2, fields: f2 }) => {
                t1 == t2 && f1.ptr_eq(f2)
            }
            _ => false,
        }
    }
}

// Trait Implementations

impl PartialEq for Value {
    /// Structural equality. Floats compare IEEE-style (`NaN != NaN`);
    /// maps compare entries in order. Order-insensitive dictionary
    /// comparison is an application concern, not a representation one.
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            (Value::Record { ty: t1, fields: f1 }, Value::Record { ty: t2, fields: f2 }) => {
                t1 == t2 && f1 == f2
            }
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "Null"),
            Value::Bool(b) => write!(f, "Bool({b})"),
            Value::Int(n) => write!(f, "Int({n})"),
            Value::Float(x) => write!(f, "Float({x})"),
            Value::Str(s) => write!(f, "Str({:?})", &**s),
            Value::List(items) => write!(f, "List({:?})", &**items),
            Value::Map(entries) => write!(f, "Map({:?})", &**entries),
            Value::Record { ty, fields } => write!(f, "Record({ty}, {:?})", &**fields),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(n) => write!(f, "{n}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Str(s) => write!(f, "\"{}\"", &**s),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Value::Map(entries) => {
                write!(f, "{{")?;
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{k}: {v}")?;
                }
                write!(f, "}}")
            }
            Value::Record { ty, fields } => {
                write!(f, "{ty}(")?;
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{field}")?;
                }
                write!(f, ")")
            }
        }
    }
}
