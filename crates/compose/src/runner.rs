//! Drives a set of composition builders and hands the results to a writer.

use std::time::Instant;

use crossbuild_core::Composition;
use metrics::{counter, histogram};
use tracing::{info, warn};

use crate::error::{RunError, WriteError};
use crate::object::ObjectKindReference;
use crate::skeleton::CompositionSkeleton;

/// A delegate that populates one Composition.
pub trait CompositionBuilder {
    /// The composite type the Composition is written for.
    fn composite_type_ref(&self) -> ObjectKindReference;
    fn build(&self, composition: &mut CompositionSkeleton);
}

/// Output sink for finalized compositions.
pub trait CompositionWriter {
    fn write(&mut self, composition: &Composition) -> Result<(), WriteError>;
}

impl<W: CompositionWriter + ?Sized> CompositionWriter for Box<W> {
    fn write(&mut self, composition: &Composition) -> Result<(), WriteError> {
        (**self).write(composition)
    }
}

impl<W: CompositionWriter + ?Sized> CompositionWriter for &mut W {
    fn write(&mut self, composition: &Composition) -> Result<(), WriteError> {
        (**self).write(composition)
    }
}

/// Collects compositions in memory.
impl CompositionWriter for Vec<Composition> {
    fn write(&mut self, composition: &Composition) -> Result<(), WriteError> {
        self.push(composition.clone());
        Ok(())
    }
}

pub struct RunnerConfig<W> {
    pub builders: Vec<Box<dyn CompositionBuilder>>,
    pub writer: W,
}

pub struct Runner<W> {
    builders: Vec<Box<dyn CompositionBuilder>>,
    writer: W,
}

impl<W: CompositionWriter> Runner<W> {
    pub fn new(config: RunnerConfig<W>) -> Self {
        Self { builders: config.builders, writer: config.writer }
    }

    /// Finalize every builder without writing anything.
    pub fn check(&self) -> Result<Vec<Composition>, RunError> {
        compose_all(&self.builders)
    }

    /// Finalize every builder, then write the results in order.
    ///
    /// Nothing is written unless all builders succeed. A write failure stops
    /// the run; compositions written before it stay written.
    pub fn build(&mut self) -> Result<usize, RunError> {
        let compositions = compose_all(&self.builders)?;
        for (index, composition) in compositions.iter().enumerate() {
            if let Err(source) = self.writer.write(composition) {
                warn!(index, name = composition.name(), error = %source, "write failed");
                return Err(RunError::Write { index, name: composition.name().to_string(), source });
            }
            counter!("compositions_written_total", 1u64);
        }
        info!(count = compositions.len(), "compositions written");
        Ok(compositions.len())
    }

    pub fn writer(&self) -> &W { &self.writer }

    pub fn into_writer(self) -> W { self.writer }
}

/// Finalize every builder in order, failing on the first error.
pub fn compose_all(builders: &[Box<dyn CompositionBuilder>]) -> Result<Vec<Composition>, RunError> {
    let started = Instant::now();
    let mut compositions = Vec::with_capacity(builders.len());
    for (index, builder) in builders.iter().enumerate() {
        let mut skeleton = CompositionSkeleton::new(builder.composite_type_ref());
        builder.build(&mut skeleton);
        match skeleton.to_composition() {
            Ok(composition) => compositions.push(composition),
            Err(source) => {
                warn!(index, name = skeleton.name(), error = %source, "composition build failed");
                counter!("composition_build_failures_total", 1u64);
                return Err(RunError::Build { index, source });
            }
        }
    }
    histogram!("composition_build_ms", started.elapsed().as_secs_f64() * 1000.0);
    Ok(compositions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BuildError;
    use crossbuild_core::Patch;
    use k8s_openapi::api::core::v1::ConfigMap;

    struct Named(&'static str);

    impl CompositionBuilder for Named {
        fn composite_type_ref(&self) -> ObjectKindReference {
            ObjectKindReference::of(ConfigMap::default())
        }

        fn build(&self, composition: &mut CompositionSkeleton) {
            composition.with_name(self.0);
            composition
                .new_resource(ObjectKindReference::of(ConfigMap::default()))
                .with_patches([Patch::from_composite("metadata.name", "metadata.name")]);
        }
    }

    struct Broken;

    impl CompositionBuilder for Broken {
        fn composite_type_ref(&self) -> ObjectKindReference {
            ObjectKindReference::of(ConfigMap::default())
        }

        fn build(&self, composition: &mut CompositionSkeleton) {
            composition.with_name("broken");
            composition
                .new_resource(ObjectKindReference::of(ConfigMap::default()))
                .with_patches([Patch::from_composite("metadata.name", "spec.missing")]);
        }
    }

    struct FailSecond(Vec<String>);

    impl CompositionWriter for FailSecond {
        fn write(&mut self, composition: &Composition) -> Result<(), WriteError> {
            if self.0.len() == 1 {
                return Err(WriteError::Other("disk full".into()));
            }
            self.0.push(composition.name().to_string());
            Ok(())
        }
    }

    #[test]
    fn writes_in_builder_order() {
        let builders: Vec<Box<dyn CompositionBuilder>> = vec![Box::new(Named("b")), Box::new(Named("a"))];
        let mut runner = Runner::new(RunnerConfig { builders, writer: Vec::<Composition>::new() });
        assert_eq!(runner.build().unwrap(), 2);
        let names: Vec<&str> = runner.writer().iter().map(|c| c.name()).collect();
        assert_eq!(names, ["b", "a"]);
    }

    #[test]
    fn nothing_is_written_when_a_builder_fails() {
        let builders: Vec<Box<dyn CompositionBuilder>> =
            vec![Box::new(Named("first")), Box::new(Broken), Box::new(Named("third"))];
        let mut runner = Runner::new(RunnerConfig { builders, writer: Vec::<Composition>::new() });
        match runner.build() {
            Err(RunError::Build { index, source }) => {
                assert_eq!(index, 1);
                assert!(matches!(source, BuildError::Resource { index: 0, .. }));
            }
            other => panic!("unexpected result: {:?}", other),
        }
        assert!(runner.into_writer().is_empty());
    }

    #[test]
    fn write_failure_stops_the_run() {
        let builders: Vec<Box<dyn CompositionBuilder>> =
            vec![Box::new(Named("one")), Box::new(Named("two")), Box::new(Named("three"))];
        let mut runner = Runner::new(RunnerConfig { builders, writer: FailSecond(Vec::new()) });
        match runner.build() {
            Err(RunError::Write { index, name, .. }) => {
                assert_eq!(index, 1);
                assert_eq!(name, "two");
            }
            other => panic!("unexpected result: {:?}", other),
        }
        assert_eq!(runner.writer().0, ["one"]);
    }

    #[test]
    fn check_does_not_write() {
        let builders: Vec<Box<dyn CompositionBuilder>> = vec![Box::new(Named("only"))];
        let runner = Runner::new(RunnerConfig { builders, writer: Vec::<Composition>::new() });
        assert_eq!(runner.check().unwrap().len(), 1);
        assert!(runner.writer().is_empty());
    }

    #[test]
    fn boxed_writers_are_writers() {
        let writer: Box<dyn CompositionWriter> = Box::new(Vec::<Composition>::new());
        let builders: Vec<Box<dyn CompositionBuilder>> = vec![Box::new(Named("boxed"))];
        let mut runner = Runner::new(RunnerConfig { builders, writer });
        assert_eq!(runner.build().unwrap(), 1);
    }
}
