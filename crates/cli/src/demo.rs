//! Bundled composite type and builders used by `generate`, `check` and `paths`.

use crossbuild_compose::prelude::*;
use k8s_openapi::api::rbac::v1::{ClusterRole, PolicyRule};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::core::GroupVersionKind;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub const GROUP: &str = "example.crossbuild.io";
pub const VERSION: &str = "v1alpha1";
pub const KIND: &str = "XExample";

#[derive(Serialize, Deserialize, JsonSchema, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct XExampleParameters {
    pub example_field: String,
}

#[derive(Serialize, Deserialize, JsonSchema, Clone, Debug, Default)]
pub struct XExampleSpec {
    pub parameters: XExampleParameters,
}

#[derive(Serialize, Deserialize, JsonSchema, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    #[serde(rename = "type")]
    pub kind: String,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_transition_time: Option<String>,
}

#[derive(Serialize, Deserialize, JsonSchema, Clone, Debug, Default)]
pub struct ConditionedStatus {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,
}

#[derive(Serialize, Deserialize, JsonSchema, Clone, Debug, Default)]
pub struct XExampleStatus {
    #[serde(flatten)]
    pub conditioned: ConditionedStatus,
}

/// Cluster-scoped example composite resource.
#[derive(Serialize, Deserialize, JsonSchema, Clone, Debug, Default)]
pub struct XExample {
    #[serde(default)]
    pub metadata: ObjectMeta,
    pub spec: XExampleSpec,
    #[serde(default)]
    pub status: XExampleStatus,
}

pub fn xexample_gvk() -> GroupVersionKind {
    GroupVersionKind::gvk(GROUP, VERSION, KIND)
}

/// Copies `spec.parameters.exampleField` into the resources of a ClusterRole rule.
pub struct ExampleBuilder;

impl CompositionBuilder for ExampleBuilder {
    fn composite_type_ref(&self) -> ObjectKindReference {
        ObjectKindReference::new(xexample_gvk(), XExample::default())
    }

    fn build(&self, c: &mut CompositionSkeleton) {
        c.with_name("example");

        c.new_resource(ObjectKindReference::of(example_role()))
            .with_name("cluster-role")
            .with_patches([Patch::from_composite("spec.parameters.exampleField", "rules[0].resources[0]")]);
    }
}

fn example_role() -> ClusterRole {
    ClusterRole {
        rules: Some(vec![PolicyRule {
            verbs: vec!["GET".to_string()],
            api_groups: Some(vec!["v1".to_string()]),
            // patched
            resources: Some(vec![String::new()]),
            ..PolicyRule::default()
        }]),
        ..ClusterRole::default()
    }
}

pub fn builders() -> Vec<Box<dyn CompositionBuilder>> {
    vec![Box::new(ExampleBuilder)]
}
