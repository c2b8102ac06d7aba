//! crossbuild core types: the Composition document produced by a finalized skeleton.

#![forbid(unsafe_code)]

use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::core::GroupVersionKind;
use serde::{Deserialize, Serialize};

pub mod patch;
pub mod resource;

pub use patch::{
    Combine, CombineStrategy, CombineVariable, ConvertTransform, FromFieldPathPolicy,
    MathTransform, Patch, PatchPolicy, PatchType, StringCombine, StringTransform,
    StringTransformType, Transform, TransformType,
};
pub use resource::{ConnectionDetail, ConnectionDetailType, ReadinessCheck, ReadinessCheckType};

pub const COMPOSITION_API_VERSION: &str = "apiextensions.crossplane.io/v1";
pub const COMPOSITION_KIND: &str = "Composition";

/// `apiVersion` string for a GVK: `group/version`, or just `version` for the core group.
pub fn api_version_of(gvk: &GroupVersionKind) -> String {
    if gvk.group.is_empty() {
        gvk.version.clone()
    } else {
        format!("{}/{}", gvk.group, gvk.version)
    }
}

/// Reference to the composite type a Composition is written for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeReference {
    pub api_version: String,
    pub kind: String,
}

impl TypeReference {
    pub fn to(gvk: &GroupVersionKind) -> Self {
        Self { api_version: api_version_of(gvk), kind: gvk.kind.clone() }
    }
}

/// Store config that connection details are published to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfigReference {
    pub name: String,
}

impl StoreConfigReference {
    pub fn new(name: impl Into<String>) -> Self { Self { name: name.into() } }
}

/// One composed resource entry of a finalized Composition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComposedTemplate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Base object with `apiVersion`/`kind` stamped from its GVK.
    pub base: serde_json::Value,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub patches: Vec<Patch>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub connection_details: Vec<ConnectionDetail>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub readiness_checks: Vec<ReadinessCheck>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompositionSpec {
    pub composite_type_ref: TypeReference,
    pub resources: Vec<ComposedTemplate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub write_connection_secrets_to_namespace: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publish_connection_details_with_store_config_ref: Option<StoreConfigReference>,
}

/// A finalized Composition document. Never mutated after it is produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Composition {
    pub api_version: String,
    pub kind: String,
    pub metadata: ObjectMeta,
    pub spec: CompositionSpec,
}

impl Composition {
    pub fn new(name: impl Into<String>, spec: CompositionSpec) -> Self {
        Self {
            api_version: COMPOSITION_API_VERSION.to_string(),
            kind: COMPOSITION_KIND.to_string(),
            metadata: ObjectMeta { name: Some(name.into()), ..ObjectMeta::default() },
            spec,
        }
    }

    pub fn name(&self) -> &str {
        self.metadata.name.as_deref().unwrap_or("")
    }
}

pub mod prelude {
    pub use super::{
        api_version_of, ComposedTemplate, Composition, CompositionSpec, ConnectionDetail,
        Patch, PatchType, ReadinessCheck, StoreConfigReference, TypeReference,
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_version_omits_empty_group() {
        let core = GroupVersionKind::gvk("", "v1", "ConfigMap");
        let rbac = GroupVersionKind::gvk("rbac.authorization.k8s.io", "v1", "ClusterRole");
        assert_eq!(api_version_of(&core), "v1");
        assert_eq!(api_version_of(&rbac), "rbac.authorization.k8s.io/v1");
        assert_eq!(TypeReference::to(&rbac).kind, "ClusterRole");
    }

    #[test]
    fn composition_serializes_crossplane_shape() {
        let spec = CompositionSpec {
            composite_type_ref: TypeReference { api_version: "example.org/v1alpha1".into(), kind: "XExample".into() },
            resources: vec![ComposedTemplate {
                name: Some("role".into()),
                base: serde_json::json!({ "apiVersion": "v1", "kind": "ConfigMap" }),
                patches: vec![Patch::from_composite("spec.a", "data.a")],
                connection_details: vec![],
                readiness_checks: vec![],
            }],
            write_connection_secrets_to_namespace: Some("crossplane-system".into()),
            publish_connection_details_with_store_config_ref: None,
        };
        let comp = Composition::new("example", spec);
        let v = serde_json::to_value(&comp).unwrap();
        assert_eq!(v["apiVersion"], "apiextensions.crossplane.io/v1");
        assert_eq!(v["kind"], "Composition");
        assert_eq!(v["metadata"]["name"], "example");
        assert_eq!(v["spec"]["compositeTypeRef"]["kind"], "XExample");
        assert_eq!(v["spec"]["writeConnectionSecretsToNamespace"], "crossplane-system");
        assert_eq!(v["spec"]["resources"][0]["patches"][0]["fromFieldPath"], "spec.a");
        assert!(v["spec"]["resources"][0].get("connectionDetails").is_none());
        assert!(v["spec"].get("publishConnectionDetailsWithStoreConfigRef").is_none());
        assert_eq!(comp.name(), "example");
    }
}
