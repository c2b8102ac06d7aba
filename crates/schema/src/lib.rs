//! crossbuild schema: field paths, known paths, and static shape resolution.

#![forbid(unsafe_code)]

pub mod fieldpath;
pub mod known;
pub mod shape;

pub use fieldpath::{FieldPath, Segment};
pub use known::KnownPaths;
pub use shape::ObjectShape;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    #[error("the given path is empty")]
    Empty,
    #[error("cannot parse field path '{path}': {reason} at position {pos}")]
    Malformed { path: String, pos: usize, reason: &'static str },
    #[error("no field with JSON key '{field}'")]
    FieldNotFound { field: String },
    #[error("expected object type for field '{field}', but got {found}")]
    NotAnObject { field: String, found: String },
    #[error("expected array type but got {found}")]
    NotASequence { found: String },
    #[error("static path validation is not supported for maps")]
    MapNotSupported,
    #[error("cannot resolve schema reference '{reference}'")]
    Unresolvable { reference: String },
}

#[derive(Debug, thiserror::Error)]
pub enum ShapeError {
    #[error("cannot encode schema: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("custom resource definition '{crd}' has no served version with an openAPIV3Schema")]
    NoSchema { crd: String },
}

/// Parse `path`, accept it if registered in `known`, else resolve it against `shape`.
pub fn validate_field_path(shape: &ObjectShape, path: &str, known: &KnownPaths) -> Result<(), PathError> {
    let parsed = FieldPath::parse(path)?;
    if known.contains(&parsed) {
        return Ok(());
    }
    shape.resolve(&parsed)
}
