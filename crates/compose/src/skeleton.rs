//! Mutable builders that finalize into a validated [`Composition`].

use crossbuild_core::{
    ComposedTemplate, Composition, CompositionSpec, ConnectionDetail, Patch, ReadinessCheck,
    StoreConfigReference, TypeReference,
};
use crossbuild_schema::KnownPaths;
use metrics::counter;
use tracing::debug;

use crate::error::{BuildError, TemplateError};
use crate::object::ObjectKindReference;
use crate::validate::{validate_patch, PatchEndpoint};

#[derive(Debug, Clone)]
struct PatchEntry {
    patch: Patch,
    checked: bool,
}

/// Builder for a whole Composition targeting one composite type.
#[derive(Debug)]
pub struct CompositionSkeleton {
    composite: ObjectKindReference,
    name: String,
    resources: Vec<ComposeTemplateSkeleton>,
    publish_connection_details_with_store_config: Option<StoreConfigReference>,
    write_connection_secrets_to_namespace: Option<String>,
    known: KnownPaths,
    field_paths: Vec<String>,
}

impl CompositionSkeleton {
    pub fn new(composite: ObjectKindReference) -> Self {
        Self {
            composite,
            name: String::new(),
            resources: Vec::new(),
            publish_connection_details_with_store_config: None,
            write_connection_secrets_to_namespace: None,
            known: KnownPaths::new(),
            field_paths: Vec::new(),
        }
    }

    pub fn with_name(&mut self, name: impl Into<String>) -> &mut Self {
        self.name = name.into();
        self
    }

    /// Append a composed resource and return its builder.
    pub fn new_resource(&mut self, base: ObjectKindReference) -> &mut ComposeTemplateSkeleton {
        let index = self.resources.len();
        self.resources.push(ComposeTemplateSkeleton::new(base));
        &mut self.resources[index]
    }

    pub fn with_publish_connection_details_with_store_config(
        &mut self,
        store_config: impl Into<Option<StoreConfigReference>>,
    ) -> &mut Self {
        self.publish_connection_details_with_store_config = store_config.into();
        self
    }

    pub fn with_write_connection_secrets_to_namespace(&mut self, namespace: impl Into<Option<String>>) -> &mut Self {
        self.write_connection_secrets_to_namespace = namespace.into();
        self
    }

    /// Mark `metadata.annotations[key]` of the composite as known.
    pub fn register_composite_annotations<I, S>(&mut self, keys: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.known.insert_annotations(keys);
        self
    }

    /// Mark `metadata.labels[key]` of the composite as known.
    pub fn register_composite_labels<I, S>(&mut self, keys: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.known.insert_labels(keys);
        self
    }

    /// Mark raw field paths of the composite as known. Parsed when the
    /// composition is finalized.
    pub fn register_composite_field_paths<I, S>(&mut self, paths: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.field_paths.extend(paths.into_iter().map(Into::into));
        self
    }

    pub fn name(&self) -> &str { &self.name }

    pub fn composite(&self) -> &ObjectKindReference { &self.composite }

    pub fn resources(&self) -> &[ComposeTemplateSkeleton] { &self.resources }

    /// Validate every patch and produce the Composition document.
    ///
    /// Does not modify the skeleton; calling it twice yields equal documents.
    pub fn to_composition(&self) -> Result<Composition, BuildError> {
        if self.name.is_empty() {
            return Err(BuildError::EmptyName);
        }
        let mut known = KnownPaths::composite_defaults();
        known.extend(&self.known);
        for raw in &self.field_paths {
            known
                .register(raw)
                .map_err(|source| BuildError::InvalidRegisteredPath { path: raw.clone(), source })?;
        }
        let shape = self.composite.shape().map_err(BuildError::Shape)?;
        let composite = PatchEndpoint::new(&shape, &known);

        let mut resources = Vec::with_capacity(self.resources.len());
        for (index, template) in self.resources.iter().enumerate() {
            let composed = template.to_composed_template(composite).map_err(|source| BuildError::Resource {
                index,
                name: template.name.clone(),
                source,
            })?;
            resources.push(composed);
        }
        debug!(composition = %self.name, resources = resources.len(), "composition finalized");
        counter!("compositions_built_total", 1u64);

        Ok(Composition::new(
            self.name.clone(),
            CompositionSpec {
                composite_type_ref: TypeReference::to(self.composite.gvk()),
                resources,
                write_connection_secrets_to_namespace: self.write_connection_secrets_to_namespace.clone(),
                publish_connection_details_with_store_config_ref: self.publish_connection_details_with_store_config.clone(),
            },
        ))
    }
}

/// Builder for one composed resource entry.
#[derive(Debug)]
pub struct ComposeTemplateSkeleton {
    name: Option<String>,
    base: ObjectKindReference,
    patches: Vec<PatchEntry>,
    connection_details: Vec<ConnectionDetail>,
    readiness_checks: Vec<ReadinessCheck>,
    known: KnownPaths,
    field_paths: Vec<String>,
}

impl ComposeTemplateSkeleton {
    fn new(base: ObjectKindReference) -> Self {
        Self {
            name: None,
            base,
            patches: Vec::new(),
            connection_details: Vec::new(),
            readiness_checks: Vec::new(),
            known: KnownPaths::new(),
            field_paths: Vec::new(),
        }
    }

    pub fn with_name(&mut self, name: impl Into<String>) -> &mut Self {
        self.name = Some(name.into());
        self
    }

    /// Append patches that are validated when the composition is finalized.
    pub fn with_patches(&mut self, patches: impl IntoIterator<Item = Patch>) -> &mut Self {
        self.patches.extend(patches.into_iter().map(|patch| PatchEntry { patch, checked: true }));
        self
    }

    /// Append patches that are emitted as-is without validation.
    pub fn with_unsafe_patches(&mut self, patches: impl IntoIterator<Item = Patch>) -> &mut Self {
        self.patches.extend(patches.into_iter().map(|patch| PatchEntry { patch, checked: false }));
        self
    }

    pub fn with_connection_details(&mut self, details: impl IntoIterator<Item = ConnectionDetail>) -> &mut Self {
        self.connection_details.extend(details);
        self
    }

    pub fn with_readiness_checks(&mut self, checks: impl IntoIterator<Item = ReadinessCheck>) -> &mut Self {
        self.readiness_checks.extend(checks);
        self
    }

    pub fn register_annotations<I, S>(&mut self, keys: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.known.insert_annotations(keys);
        self
    }

    pub fn register_labels<I, S>(&mut self, keys: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.known.insert_labels(keys);
        self
    }

    pub fn register_field_paths<I, S>(&mut self, paths: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.field_paths.extend(paths.into_iter().map(Into::into));
        self
    }

    pub fn name(&self) -> Option<&str> { self.name.as_deref() }

    pub fn base(&self) -> &ObjectKindReference { &self.base }

    pub(crate) fn to_composed_template(&self, composite: PatchEndpoint<'_>) -> Result<ComposedTemplate, TemplateError> {
        let mut known = KnownPaths::resource_defaults();
        known.extend(&self.known);
        for raw in &self.field_paths {
            known
                .register(raw)
                .map_err(|source| TemplateError::InvalidRegisteredPath { path: raw.clone(), source })?;
        }
        let shape = self.base.shape().map_err(TemplateError::Shape)?;
        let composed = PatchEndpoint::new(&shape, &known);

        let mut patches = Vec::with_capacity(self.patches.len());
        for (index, entry) in self.patches.iter().enumerate() {
            if !entry.checked {
                debug!(patch = index, kind = %entry.patch.kind(), "skipping validation of unsafe patch");
                counter!("unsafe_patches_total", 1u64);
            } else if let Err(source) = validate_patch(&entry.patch, composite, composed) {
                counter!("patch_validation_failures_total", 1u64);
                return Err(TemplateError::InvalidPatch { index, source });
            }
            patches.push(entry.patch.clone());
        }

        Ok(ComposedTemplate {
            name: self.name.clone(),
            base: self.base.to_stamped_value()?,
            patches,
            connection_details: self.connection_details.clone(),
            readiness_checks: self.readiness_checks.clone(),
        })
    }
}
