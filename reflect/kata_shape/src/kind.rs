//! The closed set of structural kinds a shape can have.

use std::fmt;
use std::sync::Arc;

use kata_value::{TypeKey, Value};

/// Reads one property out of an instance.
///
/// Getters are total over values of the declaring type; applying one to
/// a value of the wrong kind is a caller bug and panics.
pub type FieldGetter = Arc<dyn Fn(&Value) -> Value + Send + Sync>;

/// Builds an instance from its property values, in declaration order.
pub type InstanceCtor = Arc<dyn Fn(Vec<Value>) -> Value + Send + Sync>;

/// Scalar interpretation of a property-less object shape.
///
/// The kind set is closed at five; leaf types (int, str, ...) are
/// modeled as objects with no properties, and this hint tells
/// applications which native representation backs them. `Opaque` means
/// "none that the toolkit knows about": such a type can be described
/// and cached, but an application that needs to produce or take apart
/// its values has nothing to work with and reports it as unsupported.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    /// No known native representation.
    #[default]
    Opaque,
    /// Backed by `Value::Bool`.
    Bool,
    /// Backed by `Value::Int`.
    Int,
    /// Backed by `Value::Float`.
    Float,
    /// Backed by `Value::Str`.
    Str,
}

/// One named property of an object shape.
#[derive(Clone)]
pub struct PropertyShape {
    /// Property name, unique within the declaring object.
    pub name: Arc<str>,
    /// Key of the property's declared type.
    pub ty: TypeKey,
    /// Getter extracting this property from an instance.
    pub get: FieldGetter,
}

impl PropertyShape {
    /// Create a property with an arbitrary getter.
    pub fn new(name: impl Into<Arc<str>>, ty: TypeKey, get: FieldGetter) -> Self {
        PropertyShape {
            name: name.into(),
            ty,
            get,
        }
    }

    /// Create a property whose getter reads positional record field
    /// `index`.
    ///
    /// This is the standard getter for types represented as
    /// `Value::Record`: field order matches property declaration order.
    ///
    /// # Panics
    ///
    /// The returned getter panics when applied to a non-record value or
    /// when the record has fewer than `index + 1` fields.
    pub fn indexed(name: impl Into<Arc<str>>, ty: TypeKey, index: usize) -> Self {
        let name = name.into();
        let getter_name = Arc::clone(&name);
        let get: FieldGetter = Arc::new(move |value| match value {
            Value::Record { fields, .. } => fields.get(index).cloned().unwrap_or_else(|| {
                panic!(
                    "record has {} fields, property `{getter_name}` expects index {index}",
                    fields.len()
                )
            }),
            other => panic!(
                "property `{getter_name}` read from {} value, expected record",
                other.kind_name()
            ),
        });
        PropertyShape { name, ty, get }
    }
}

impl fmt::Debug for PropertyShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PropertyShape({}: {})", self.name, self.ty)
    }
}

/// The standard constructor for types represented as `Value::Record`:
/// wraps the property values, in declaration order, into a record tagged
/// with `ty`.
pub fn record_ctor(ty: TypeKey) -> InstanceCtor {
    Arc::new(move |fields| Value::record(ty, fields))
}

/// An object type: named properties plus an optional constructor.
///
/// Property-less objects double as leaf types; see [`ScalarKind`].
#[derive(Clone)]
pub struct ObjectShape {
    /// Properties in declaration order.
    pub properties: Vec<PropertyShape>,
    /// How to build an instance from property values. `None` means the
    /// type is opaque to construction (it can still be read).
    pub ctor: Option<InstanceCtor>,
    /// Scalar interpretation, meaningful only when `properties` is
    /// empty.
    pub scalar: ScalarKind,
}

impl fmt::Debug for ObjectShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectShape")
            .field("properties", &self.properties)
            .field("ctor", &self.ctor.as_ref().map(|_| "..."))
            .field("scalar", &self.scalar)
            .finish()
    }
}

/// One named constant of an enum shape.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EnumCase {
    /// Constant name.
    pub name: Arc<str>,
    /// Constant value, in the underlying type's representation.
    pub value: i64,
}

impl EnumCase {
    pub fn new(name: impl Into<Arc<str>>, value: i64) -> Self {
        EnumCase {
            name: name.into(),
            value,
        }
    }
}

/// An enum type: a named-constant set over an underlying scalar type.
///
/// Runtime representation is the underlying type's (`Value::Int`).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EnumShape {
    /// Key of the underlying scalar type.
    pub underlying: TypeKey,
    /// Declared constants. May be empty; values need not be distinct.
    pub cases: Vec<EnumCase>,
}

/// A nullable wrapper: `Value::Null` or the element's representation.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct NullableShape {
    /// Key of the wrapped element type.
    pub element: TypeKey,
}

/// A homogeneous sequence, represented as `Value::List`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct EnumerableShape {
    /// Key of the element type.
    pub element: TypeKey,
}

/// A keyed collection, represented as `Value::Map`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct DictionaryShape {
    /// Key of the key type.
    pub key: TypeKey,
    /// Key of the value type.
    pub value: TypeKey,
}

/// The structural kind of a shape.
///
/// The set is closed: every consumer matches on all five variants, and
/// [`ShapeVisitor`](crate::ShapeVisitor) requires a method for each.
#[derive(Clone)]
pub enum ShapeKind {
    /// Named properties with getters and an optional constructor.
    Object(ObjectShape),
    /// Named constants over an underlying type.
    Enum(EnumShape),
    /// Optional wrapper around an element type.
    Nullable(NullableShape),
    /// Homogeneous sequence of an element type.
    Enumerable(EnumerableShape),
    /// Keyed collection of a key and a value type.
    Dictionary(DictionaryShape),
}

impl ShapeKind {
    /// Get the kind name for diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            ShapeKind::Object(_) => "object",
            ShapeKind::Enum(_) => "enum",
            ShapeKind::Nullable(_) => "nullable",
            ShapeKind::Enumerable(_) => "enumerable",
            ShapeKind::Dictionary(_) => "dictionary",
        }
    }

    /// Keys of the child types this kind references.
    ///
    /// Used by the builder's dangling-reference validation and handy for
    /// generic traversals that only need reachability.
    pub fn child_keys(&self) -> Vec<TypeKey> {
        match self {
            ShapeKind::Object(object) => object.properties.iter().map(|p| p.ty).collect(),
            ShapeKind::Enum(enumeration) => vec![enumeration.underlying],
            ShapeKind::Nullable(nullable) => vec![nullable.element],
            ShapeKind::Enumerable(enumerable) => vec![enumerable.element],
            ShapeKind::Dictionary(dictionary) => vec![dictionary.key, dictionary.value],
        }
    }
}

impl fmt::Debug for ShapeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShapeKind::Object(object) => write!(f, "Object({object:?})"),
            ShapeKind::Enum(enumeration) => write!(f, "Enum({enumeration:?})"),
            ShapeKind::Nullable(nullable) => write!(f, "Nullable({nullable:?})"),
            ShapeKind::Enumerable(enumerable) => write!(f, "Enumerable({enumerable:?})"),
            ShapeKind::Dictionary(dictionary) => write!(f, "Dictionary({dictionary:?})"),
        }
    }
}
