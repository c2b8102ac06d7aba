//! Build-time validation of patch field paths.
//!
//! A patch reads from one object and writes into the other. Which object is
//! which depends on the patch type; the checks themselves are the same.

use crossbuild_core::{Patch, PatchType};
use crossbuild_schema::{validate_field_path, KnownPaths, ObjectShape, PathError};

use crate::error::{PatchError, PatchSide};

/// One side of a patch: the shape of the object and the paths registered on it.
#[derive(Debug, Clone, Copy)]
pub struct PatchEndpoint<'a> {
    pub shape: &'a ObjectShape,
    pub known: &'a KnownPaths,
}

impl<'a> PatchEndpoint<'a> {
    pub fn new(shape: &'a ObjectShape, known: &'a KnownPaths) -> Self {
        Self { shape, known }
    }

    pub fn check(&self, path: &str) -> Result<(), PathError> {
        validate_field_path(self.shape, path, self.known)
    }
}

/// Validate a single patch between a composite and a composed resource.
///
/// Required fields are checked before any path is resolved. `PatchSet`
/// references are not expanded here and are always rejected.
pub fn validate_patch(patch: &Patch, composite: PatchEndpoint<'_>, composed: PatchEndpoint<'_>) -> Result<(), PatchError> {
    match patch.kind() {
        PatchType::FromCompositeFieldPath => validate_simple(patch, composite, composed),
        PatchType::ToCompositeFieldPath => validate_simple(patch, composed, composite),
        PatchType::CombineFromComposite => validate_combine(patch, composite, composed),
        PatchType::CombineToComposite => validate_combine(patch, composed, composite),
        PatchType::PatchSet => Err(PatchError::UnsupportedKind(PatchType::PatchSet)),
    }
}

fn validate_simple(patch: &Patch, from: PatchEndpoint<'_>, to: PatchEndpoint<'_>) -> Result<(), PatchError> {
    let from_path = required(&patch.from_field_path, "fromFieldPath")?;
    let to_path = required(&patch.to_field_path, "toFieldPath")?;
    check_side(from, PatchSide::From, from_path)?;
    check_side(to, PatchSide::To, to_path)
}

fn validate_combine(patch: &Patch, from: PatchEndpoint<'_>, to: PatchEndpoint<'_>) -> Result<(), PatchError> {
    let combine = patch.combine.as_ref().ok_or(PatchError::FieldRequired("combine"))?;
    if combine.variables.is_empty() {
        return Err(PatchError::EmptyCombineVariables);
    }
    let to_path = required(&patch.to_field_path, "toFieldPath")?;
    for (index, variable) in combine.variables.iter().enumerate() {
        from.check(&variable.from_field_path).map_err(|source| PatchError::InvalidCombineVariable {
            index,
            path: variable.from_field_path.clone(),
            source,
        })?;
    }
    check_side(to, PatchSide::To, to_path)
}

fn required<'p>(field: &'p Option<String>, name: &'static str) -> Result<&'p str, PatchError> {
    field.as_deref().ok_or(PatchError::FieldRequired(name))
}

fn check_side(endpoint: PatchEndpoint<'_>, side: PatchSide, path: &str) -> Result<(), PatchError> {
    endpoint
        .check(path)
        .map_err(|source| PatchError::InvalidPath { side, path: path.to_string(), source })
}
