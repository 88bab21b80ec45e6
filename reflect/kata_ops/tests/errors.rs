//! Unsupported types and error replay through the facades.

#![expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]

use std::sync::Arc;

use kata_cache::BuildError;
use kata_ops::{Cloner, RandomGenerator};
use kata_shape::{PropertyShape, ScalarKind, ShapeProviderBuilder};
use kata_value::Value;
use pretty_assertions::assert_eq;

#[test]
fn random_values_for_opaque_scalars_are_unsupported() {
    let mut builder = ShapeProviderBuilder::new("opaque");
    let blob = builder.scalar("Blob", ScalarKind::Opaque).unwrap();
    let provider = builder.build().unwrap();
    let shape = provider.resolve(blob).unwrap();

    let random = RandomGenerator::new();
    let error = random.generate(&shape, 1, 8).unwrap_err();
    assert_eq!(
        error,
        BuildError::Unsupported {
            operation: "random",
            type_name: Arc::from("Blob"),
        }
    );
    assert_eq!(
        error.to_string(),
        "operation `random` is not supported for type `Blob`"
    );

    // The generator memoizes errors; a second request replays the same
    // failure.
    let replayed = random.generate(&shape, 2, 8).unwrap_err();
    assert_eq!(replayed, error);
}

#[test]
fn cloning_an_object_without_a_constructor_is_unsupported() {
    let mut builder = ShapeProviderBuilder::new("readonly");
    let int = builder.scalar("int", ScalarKind::Int).unwrap();
    let frozen = builder.reserve("Frozen").unwrap();
    builder
        .object(frozen, vec![PropertyShape::indexed("value", int, 0)], None)
        .unwrap();
    let provider = builder.build().unwrap();
    let shape = provider.resolve(frozen).unwrap();

    let error = Cloner::new()
        .deep_clone(&shape, &Value::record(frozen, vec![Value::int(1)]))
        .unwrap_err();
    assert!(matches!(
        error,
        BuildError::Unsupported {
            operation: "clone",
            ..
        }
    ));
}

#[test]
fn unsupported_children_fail_the_whole_artifact() {
    // List<Blob>: the element is rejected, so the list artifact is too,
    // and the error names the type that actually failed.
    let mut builder = ShapeProviderBuilder::new("opaque");
    let blob = builder.scalar("Blob", ScalarKind::Opaque).unwrap();
    let list = builder.enumerable("List<Blob>", blob).unwrap();
    let provider = builder.build().unwrap();
    let shape = provider.resolve(list).unwrap();

    let error = RandomGenerator::new().generate(&shape, 1, 8).unwrap_err();
    assert!(matches!(
        error,
        BuildError::Unsupported {
            operation: "random",
            ..
        }
    ));
    assert!(error.to_string().contains("`Blob`"));
}
