//! Build errors.

use std::sync::Arc;

use kata_shape::{Shape, ShapeError};
use thiserror::Error;

/// Error produced while building an artifact.
///
/// These are the *application* failures of the system: a visitor that
/// cannot handle a type, a child shape that does not resolve, or a
/// builder that fails on its own terms. They flow through `Result`s and
/// may be memoized by the caches, hence `Clone`. Contract violations
/// (provider mixing, incomplete delayed reads, double generation) are
/// panics, not variants here.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    /// The requested operation has no meaning for this type.
    #[error("operation `{operation}` is not supported for type `{type_name}`")]
    Unsupported {
        /// Name of the operation that gave up.
        operation: &'static str,
        /// Name of the offending type.
        type_name: Arc<str>,
    },

    /// A shape lookup failed during building.
    #[error(transparent)]
    Shape(#[from] ShapeError),

    /// The application's builder failed.
    #[error("building artifact for `{type_name}` failed: {message}")]
    Builder {
        /// Name of the type being built.
        type_name: Arc<str>,
        /// Application-provided description.
        message: Arc<str>,
    },
}

impl BuildError {
    /// An operation declining a type it cannot handle.
    pub fn unsupported(operation: &'static str, shape: &Shape) -> Self {
        BuildError::Unsupported {
            operation,
            type_name: shape.name_arc(),
        }
    }

    /// A free-form builder failure for `shape`.
    pub fn builder(shape: &Shape, message: impl Into<Arc<str>>) -> Self {
        BuildError::Builder {
            type_name: shape.name_arc(),
            message: message.into(),
        }
    }
}
