//! Shape dispatch protocol.

use crate::{
    DictionaryShape, EnumShape, EnumerableShape, NullableShape, ObjectShape, Shape, ShapeKind,
};

/// Per-kind dispatch over a shape.
///
/// The trait is closed: every method is required, so adding a shape kind
/// breaks every visitor at compile time instead of falling into a
/// default at run time. Traversal state lives in the implementing
/// struct.
///
/// Visitors that build per-type artifacts must not recurse into child
/// shapes directly; they request child artifacts through a generation
/// context, which is what makes recursive types and caching work. The
/// applications in `kata_ops` are the reference for that pattern.
///
/// # Example
///
/// ```
/// # use kata_shape::{DictionaryShape, EnumShape, EnumerableShape, NullableShape,
/// #                  ObjectShape, ScalarKind, Shape, ShapeProviderBuilder, ShapeVisitor};
/// struct KindName;
///
/// impl ShapeVisitor for KindName {
///     type Output = &'static str;
///
///     fn visit_object(&mut self, _: &Shape, _: &ObjectShape) -> &'static str {
///         "object"
///     }
///     fn visit_enum(&mut self, _: &Shape, _: &EnumShape) -> &'static str {
///         "enum"
///     }
///     fn visit_nullable(&mut self, _: &Shape, _: &NullableShape) -> &'static str {
///         "nullable"
///     }
///     fn visit_enumerable(&mut self, _: &Shape, _: &EnumerableShape) -> &'static str {
///         "enumerable"
///     }
///     fn visit_dictionary(&mut self, _: &Shape, _: &DictionaryShape) -> &'static str {
///         "dictionary"
///     }
/// }
///
/// let mut builder = ShapeProviderBuilder::new("demo");
/// let int = builder.scalar("int", ScalarKind::Int)?;
/// let list = builder.enumerable("List<int>", int)?;
/// let provider = builder.build()?;
/// let shape = provider.resolve(list)?;
/// assert_eq!(shape.accept(&mut KindName), "enumerable");
/// # Ok::<(), kata_shape::ShapeError>(())
/// ```
pub trait ShapeVisitor {
    /// Result of visiting one shape.
    type Output;

    /// Visit an object shape.
    fn visit_object(&mut self, shape: &Shape, object: &ObjectShape) -> Self::Output;

    /// Visit an enum shape.
    fn visit_enum(&mut self, shape: &Shape, enumeration: &EnumShape) -> Self::Output;

    /// Visit a nullable shape.
    fn visit_nullable(&mut self, shape: &Shape, nullable: &NullableShape) -> Self::Output;

    /// Visit an enumerable shape.
    fn visit_enumerable(&mut self, shape: &Shape, enumerable: &EnumerableShape) -> Self::Output;

    /// Visit a dictionary shape.
    fn visit_dictionary(&mut self, shape: &Shape, dictionary: &DictionaryShape) -> Self::Output;
}

impl Shape {
    /// Dispatch to the visitor method for this shape's kind.
    pub fn accept<V: ShapeVisitor>(&self, visitor: &mut V) -> V::Output {
        match self.kind() {
            ShapeKind::Object(object) => visitor.visit_object(self, object),
            ShapeKind::Enum(enumeration) => visitor.visit_enum(self, enumeration),
            ShapeKind::Nullable(nullable) => visitor.visit_nullable(self, nullable),
            ShapeKind::Enumerable(enumerable) => visitor.visit_enumerable(self, enumerable),
            ShapeKind::Dictionary(dictionary) => visitor.visit_dictionary(self, dictionary),
        }
    }
}
