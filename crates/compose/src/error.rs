use std::fmt;
use std::path::PathBuf;

use crossbuild_core::PatchType;
use crossbuild_schema::{PathError, ShapeError};

/// Which end of a patch a path belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchSide {
    From,
    To,
}

impl fmt::Display for PatchSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::From => "fromFieldPath",
            Self::To => "toFieldPath",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PatchError {
    #[error("missing field {0}")]
    FieldRequired(&'static str),
    #[error("no variables given")]
    EmptyCombineVariables,
    #[error("patch type {0} is not supported")]
    UnsupportedKind(PatchType),
    #[error("{side} '{path}' is invalid")]
    InvalidPath {
        side: PatchSide,
        path: String,
        #[source]
        source: PathError,
    },
    #[error("fromFieldPath '{path}' of variable at index {index} is invalid")]
    InvalidCombineVariable {
        index: usize,
        path: String,
        #[source]
        source: PathError,
    },
}

impl PatchError {
    /// The underlying path failure, if this error came from a path check.
    pub fn path_error(&self) -> Option<&PathError> {
        match self {
            Self::InvalidPath { source, .. } | Self::InvalidCombineVariable { source, .. } => Some(source),
            _ => None,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    #[error("invalid patch at index {index}")]
    InvalidPatch {
        index: usize,
        #[source]
        source: PatchError,
    },
    #[error("cannot parse registered composed path '{path}'")]
    InvalidRegisteredPath {
        path: String,
        #[source]
        source: PathError,
    },
    #[error("cannot derive shape of base object")]
    Shape(#[source] ShapeError),
    #[error("cannot serialize base object")]
    Serialize(#[source] serde_json::Error),
    #[error("base object must serialize to a JSON object, got {found}")]
    BaseNotAnObject { found: &'static str },
}

#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("composition name must not be empty")]
    EmptyName,
    #[error("cannot parse registered composite path '{path}'")]
    InvalidRegisteredPath {
        path: String,
        #[source]
        source: PathError,
    },
    #[error("cannot derive shape of composite object")]
    Shape(#[source] ShapeError),
    #[error("cannot build composed template at index {index}{}", name_suffix(.name))]
    Resource {
        index: usize,
        name: Option<String>,
        #[source]
        source: TemplateError,
    },
}

fn name_suffix(name: &Option<String>) -> String {
    name.as_deref().map(|n| format!(" ({})", n)).unwrap_or_default()
}

impl BuildError {
    /// `(resource index, patch index, patch error)` when a patch failed validation.
    pub fn invalid_patch(&self) -> Option<(usize, usize, &PatchError)> {
        match self {
            Self::Resource { index, source: TemplateError::InvalidPatch { index: patch, source }, .. } => {
                Some((*index, *patch, source))
            }
            _ => None,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum WriteError {
    #[error("cannot encode composition")]
    Encode(#[source] Box<dyn std::error::Error + Send + Sync>),
    #[error("cannot write {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{0}")]
    Other(Box<dyn std::error::Error + Send + Sync>),
}

#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("failed to generate composition from skeleton at index {index}")]
    Build {
        index: usize,
        #[source]
        source: BuildError,
    },
    #[error("failed to write composition '{name}' at index {index}")]
    Write {
        index: usize,
        name: String,
        #[source]
        source: WriteError,
    },
}
