//! crossbuild compose: composition skeletons, patch validation and the build runner.

#![forbid(unsafe_code)]

pub mod error;
pub mod object;
pub mod runner;
pub mod skeleton;
pub mod validate;

pub use error::{BuildError, PatchError, PatchSide, RunError, TemplateError, WriteError};
pub use object::{Object, ObjectKindReference};
pub use runner::{compose_all, CompositionBuilder, CompositionWriter, Runner, RunnerConfig};
pub use skeleton::{ComposeTemplateSkeleton, CompositionSkeleton};
pub use validate::{validate_patch, PatchEndpoint};

pub mod prelude {
    pub use super::{
        CompositionBuilder, CompositionSkeleton, CompositionWriter, ObjectKindReference, Runner, RunnerConfig,
    };
    pub use crossbuild_core::prelude::*;
}
