//! Patch declarations: field-level data flow between a composite and a composed resource.
//!
//! Only the field paths of a patch are checked at build time. Transforms and
//! policies are carried through to the document untouched.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PatchType {
    FromCompositeFieldPath,
    ToCompositeFieldPath,
    CombineFromComposite,
    CombineToComposite,
    PatchSet,
}

impl fmt::Display for PatchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::FromCompositeFieldPath => "FromCompositeFieldPath",
            Self::ToCompositeFieldPath => "ToCompositeFieldPath",
            Self::CombineFromComposite => "CombineFromComposite",
            Self::CombineToComposite => "CombineToComposite",
            Self::PatchSet => "PatchSet",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Patch {
    /// Unset means `FromCompositeFieldPath`.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<PatchType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_field_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_field_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub combine: Option<Combine>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patch_set_name: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub transforms: Vec<Transform>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy: Option<PatchPolicy>,
}

impl Patch {
    /// Effective patch type, applying the default.
    pub fn kind(&self) -> PatchType {
        self.kind.unwrap_or(PatchType::FromCompositeFieldPath)
    }

    /// Default-typed patch copying `from` on the composite to `to` on the composed resource.
    pub fn from_composite(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from_field_path: Some(from.into()),
            to_field_path: Some(to.into()),
            ..Self::default()
        }
    }

    pub fn to_composite(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            kind: Some(PatchType::ToCompositeFieldPath),
            from_field_path: Some(from.into()),
            to_field_path: Some(to.into()),
            ..Self::default()
        }
    }

    pub fn combine_from_composite(combine: Combine, to: impl Into<String>) -> Self {
        Self {
            kind: Some(PatchType::CombineFromComposite),
            to_field_path: Some(to.into()),
            combine: Some(combine),
            ..Self::default()
        }
    }

    pub fn combine_to_composite(combine: Combine, to: impl Into<String>) -> Self {
        Self {
            kind: Some(PatchType::CombineToComposite),
            to_field_path: Some(to.into()),
            combine: Some(combine),
            ..Self::default()
        }
    }

    pub fn patch_set(name: impl Into<String>) -> Self {
        Self {
            kind: Some(PatchType::PatchSet),
            patch_set_name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn with_transforms(mut self, transforms: impl IntoIterator<Item = Transform>) -> Self {
        self.transforms.extend(transforms);
        self
    }

    pub fn with_policy(mut self, policy: PatchPolicy) -> Self {
        self.policy = Some(policy);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CombineVariable {
    pub from_field_path: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CombineStrategy {
    #[default]
    String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StringCombine {
    pub fmt: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Combine {
    pub variables: Vec<CombineVariable>,
    pub strategy: CombineStrategy,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub string: Option<StringCombine>,
}

impl Combine {
    /// String-format combine of the given source paths.
    pub fn string<I, S>(paths: I, fmt: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            variables: paths.into_iter().map(|p| CombineVariable { from_field_path: p.into() }).collect(),
            strategy: CombineStrategy::String,
            string: Some(StringCombine { fmt: fmt.into() }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransformType {
    Map,
    Math,
    String,
    Convert,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MathTransform {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multiply: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StringTransformType {
    Format,
    Convert,
    TrimPrefix,
    TrimSuffix,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StringTransform {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<StringTransformType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fmt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub convert: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trim: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConvertTransform {
    /// One of `string`, `int`, `int64`, `bool`, `float64`, `object`, `array`.
    pub to_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    #[serde(rename = "type")]
    pub kind: TransformType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub map: Option<BTreeMap<String, serde_json::Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub math: Option<MathTransform>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub string: Option<StringTransform>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub convert: Option<ConvertTransform>,
}

impl Transform {
    fn of(kind: TransformType) -> Self {
        Self { kind, map: None, math: None, string: None, convert: None }
    }

    pub fn map<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<serde_json::Value>,
    {
        Self {
            map: Some(entries.into_iter().map(|(k, v)| (k.into(), v.into())).collect()),
            ..Self::of(TransformType::Map)
        }
    }

    pub fn multiply(factor: i64) -> Self {
        Self { math: Some(MathTransform { multiply: Some(factor) }), ..Self::of(TransformType::Math) }
    }

    pub fn format(fmt: impl Into<String>) -> Self {
        Self {
            string: Some(StringTransform {
                kind: Some(StringTransformType::Format),
                fmt: Some(fmt.into()),
                convert: None,
                trim: None,
            }),
            ..Self::of(TransformType::String)
        }
    }

    pub fn convert(to_type: impl Into<String>) -> Self {
        Self { convert: Some(ConvertTransform { to_type: to_type.into() }), ..Self::of(TransformType::Convert) }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FromFieldPathPolicy {
    Optional,
    Required,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatchPolicy {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_field_path: Option<FromFieldPathPolicy>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_type_defaults_to_from_composite() {
        let p = Patch::from_composite("spec.a", "spec.b");
        assert_eq!(p.kind, None);
        assert_eq!(p.kind(), PatchType::FromCompositeFieldPath);
        let v = serde_json::to_value(&p).unwrap();
        assert!(v.get("type").is_none());
    }

    #[test]
    fn combine_and_transforms_serialize_like_crossplane() {
        let p = Patch::combine_from_composite(
            Combine::string(["spec.a", "spec.b"], "%s-%s"),
            "metadata.name",
        )
        .with_transforms([Transform::format("x-%s"), Transform::multiply(2)]);
        let v = serde_json::to_value(&p).unwrap();
        assert_eq!(v["type"], "CombineFromComposite");
        assert_eq!(v["combine"]["strategy"], "string");
        assert_eq!(v["combine"]["variables"][1]["fromFieldPath"], "spec.b");
        assert_eq!(v["combine"]["string"]["fmt"], "%s-%s");
        assert_eq!(v["transforms"][0]["type"], "string");
        assert_eq!(v["transforms"][0]["string"]["type"], "Format");
        assert_eq!(v["transforms"][1]["math"]["multiply"], 2);
    }

    #[test]
    fn patch_round_trips_through_yaml_shaped_json() {
        let raw = serde_json::json!({
            "type": "ToCompositeFieldPath",
            "fromFieldPath": "status.atProvider.arn",
            "toFieldPath": "status.arn",
            "policy": { "fromFieldPath": "Required" }
        });
        let p: Patch = serde_json::from_value(raw).unwrap();
        assert_eq!(p.kind(), PatchType::ToCompositeFieldPath);
        assert_eq!(p.policy.unwrap().from_field_path, Some(FromFieldPathPolicy::Required));
    }
}
