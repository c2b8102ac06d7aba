//! Paths accepted without structural proof.
//!
//! Label and annotation values live in string maps, so a path like
//! `metadata.labels[crossplane.io/claim-name]` can never be proven by the shape
//! walker. Registering it here accepts it as-is. Matching is exact: the whole
//! segment sequence has to equal a registered entry.

use rustc_hash::FxHashSet;

use crate::fieldpath::FieldPath;
use crate::PathError;

pub const LABEL_CLAIM_NAME: &str = "crossplane.io/claim-name";
pub const LABEL_CLAIM_NAMESPACE: &str = "crossplane.io/claim-namespace";

pub const ANNOTATION_EXTERNAL_NAME: &str = "crossplane.io/external-name";
pub const ANNOTATION_EXTERNAL_CREATE_PENDING: &str = "crossplane.io/external-create-pending";
pub const ANNOTATION_EXTERNAL_CREATE_SUCCEEDED: &str = "crossplane.io/external-create-succeeded";
pub const ANNOTATION_EXTERNAL_CREATE_FAILED: &str = "crossplane.io/external-create-failed";

/// Composite labels registered by default.
pub const KNOWN_COMPOSITE_LABELS: &[&str] = &[LABEL_CLAIM_NAME, LABEL_CLAIM_NAMESPACE];
/// Composite annotations registered by default.
pub const KNOWN_COMPOSITE_ANNOTATIONS: &[&str] = &[];
/// Composed resource labels registered by default.
pub const KNOWN_RESOURCE_LABELS: &[&str] = &[];
/// Composed resource annotations registered by default.
pub const KNOWN_RESOURCE_ANNOTATIONS: &[&str] = &[
    ANNOTATION_EXTERNAL_NAME,
    ANNOTATION_EXTERNAL_CREATE_PENDING,
    ANNOTATION_EXTERNAL_CREATE_SUCCEEDED,
    ANNOTATION_EXTERNAL_CREATE_FAILED,
];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KnownPaths {
    paths: FxHashSet<FieldPath>,
}

impl KnownPaths {
    pub fn new() -> Self { Self::default() }

    fn seeded(labels: &[&str], annotations: &[&str]) -> Self {
        let mut known = Self::new();
        known.insert_labels(labels.iter().copied());
        known.insert_annotations(annotations.iter().copied());
        known
    }

    /// Registry seeded with the composite-side defaults (claim labels).
    pub fn composite_defaults() -> Self {
        Self::seeded(KNOWN_COMPOSITE_LABELS, KNOWN_COMPOSITE_ANNOTATIONS)
    }

    /// Registry seeded with the composed-side defaults (external-name annotations).
    pub fn resource_defaults() -> Self {
        Self::seeded(KNOWN_RESOURCE_LABELS, KNOWN_RESOURCE_ANNOTATIONS)
    }

    pub fn insert(&mut self, path: FieldPath) -> bool {
        self.paths.insert(path)
    }

    pub fn insert_labels<I, S>(&mut self, keys: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.paths.extend(keys.into_iter().map(|k| FieldPath::label(k.as_ref())));
    }

    pub fn insert_annotations<I, S>(&mut self, keys: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.paths.extend(keys.into_iter().map(|k| FieldPath::annotation(k.as_ref())));
    }

    /// Parse and register a raw path string.
    pub fn register(&mut self, raw: &str) -> Result<(), PathError> {
        self.paths.insert(FieldPath::parse(raw)?);
        Ok(())
    }

    pub fn extend(&mut self, other: &KnownPaths) {
        self.paths.extend(other.paths.iter().cloned());
    }

    pub fn contains(&self, path: &FieldPath) -> bool {
        self.paths.contains(path)
    }

    pub fn len(&self) -> usize { self.paths.len() }
    pub fn is_empty(&self) -> bool { self.paths.is_empty() }
}
