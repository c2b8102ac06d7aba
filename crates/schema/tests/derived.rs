use std::collections::BTreeMap;

use crossbuild_schema::{FieldPath, ObjectShape, PathError};
use k8s_openapi::api::rbac::v1::ClusterRole;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::{CustomResource, CustomResourceExt};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

fn p(s: &str) -> FieldPath { FieldPath::parse(s).unwrap() }

#[derive(Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
struct Conditioned {
    conditions: Vec<Condition>,
}

#[derive(Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
struct Condition {
    #[serde(rename = "type")]
    kind: String,
    last_transition_time: Option<String>,
}

#[derive(Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
struct BucketStatus {
    #[serde(flatten)]
    conditioned: Conditioned,
    /// Endpoint once provisioned.
    endpoint: Option<String>,
}

#[derive(Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
struct BucketParameters {
    region: String,
    storage_class: Option<String>,
    tags: BTreeMap<String, String>,
    replicas: Vec<Replica>,
}

#[derive(Serialize, Deserialize, JsonSchema)]
struct Replica {
    region: String,
}

#[derive(Serialize, Deserialize, JsonSchema)]
struct BucketSpec {
    parameters: BucketParameters,
}

#[derive(Serialize, Deserialize, JsonSchema)]
struct XBucket {
    metadata: ObjectMeta,
    spec: BucketSpec,
    status: Option<BucketStatus>,
}

#[test]
fn derived_struct_paths_follow_serde_names() {
    let shape = ObjectShape::of::<XBucket>().unwrap();
    for ok in [
        "spec.parameters.region",
        "spec.parameters.storageClass",
        "spec.parameters.replicas[2].region",
        "status.endpoint",
        "metadata.name",
        "metadata.labels",
    ] {
        assert_eq!(shape.resolve(&p(ok)), Ok(()), "path={}", ok);
    }
    assert_eq!(
        shape.resolve(&p("spec.parameters.storage_class")),
        Err(PathError::FieldNotFound { field: "storage_class".into() })
    );
}

#[test]
fn flattened_fields_are_promoted() {
    let shape = ObjectShape::of::<XBucket>().unwrap();
    assert_eq!(shape.resolve(&p("status.conditions[0].type")), Ok(()));
    assert_eq!(shape.resolve(&p("status.conditions[0].lastTransitionTime")), Ok(()));
    assert_eq!(
        shape.resolve(&p("status.conditioned")),
        Err(PathError::FieldNotFound { field: "conditioned".into() })
    );
}

#[test]
fn map_fields_need_registration() {
    let shape = ObjectShape::of::<XBucket>().unwrap();
    assert_eq!(shape.resolve(&p("spec.parameters.tags[env]")), Err(PathError::MapNotSupported));
    assert_eq!(shape.resolve(&p("metadata.annotations[a.b/c]")), Err(PathError::MapNotSupported));
    assert_eq!(shape.describe(&p("spec.parameters.tags")).unwrap(), "map");
}

#[test]
fn cluster_role_rules_resolve() {
    let shape = ObjectShape::of::<ClusterRole>().unwrap();
    assert_eq!(shape.resolve(&p("rules[0].resources[0]")), Ok(()));
    assert_eq!(shape.resolve(&p("rules[0].verbs")), Ok(()));
    assert_eq!(
        shape.resolve(&p("rules[0].nonexistent[0]")),
        Err(PathError::FieldNotFound { field: "nonexistent".into() })
    );
    assert_eq!(shape.resolve(&p("metadata.labels[team]")), Err(PathError::MapNotSupported));
    assert!(matches!(shape.resolve(&p("rules.verbs")), Err(PathError::NotAnObject { .. })));
}

#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, JsonSchema)]
#[kube(group = "example.crossbuild.io", version = "v1alpha1", kind = "XExample")]
#[serde(rename_all = "camelCase")]
pub struct XExampleSpec {
    pub parameters: XExampleParameters,
}

#[derive(Serialize, Deserialize, Clone, Debug, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct XExampleParameters {
    pub example_field: String,
    pub sizes: Vec<i64>,
}

#[test]
fn crd_schema_resolves_like_derived_schema() {
    let crd = XExample::crd();
    let shape = ObjectShape::from_crd(&crd).unwrap();
    assert_eq!(shape.resolve(&p("spec.parameters.exampleField")), Ok(()));
    assert_eq!(shape.resolve(&p("spec.parameters.sizes[1]")), Ok(()));
    assert_eq!(
        shape.resolve(&p("spec.parameters.other")),
        Err(PathError::FieldNotFound { field: "other".into() })
    );
}

#[test]
fn crd_without_schema_is_rejected() {
    let mut crd = XExample::crd();
    for v in crd.spec.versions.iter_mut() {
        v.schema = None;
    }
    assert!(ObjectShape::from_crd(&crd).is_err());
}
