//! Static shape resolution of field paths against a JSON/OpenAPI schema.
//!
//! The schema is either derived with `schemars` from the Rust type (serde
//! renames and `#[serde(flatten)]` are already reflected in it) or taken from
//! a CRD's `openAPIV3Schema`. Nothing here looks at values: a path resolves when
//! the declared shape can hold it.

use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::CustomResourceDefinition;
use schemars::JsonSchema;
use serde_json::Value;

use crate::fieldpath::{FieldPath, Segment};
use crate::{PathError, ShapeError};

/// Bound on `$ref` hops and nested composition while unwrapping one node.
const MAX_DEPTH: usize = 64;

const SUBSCHEMA_KEYS: [&str; 3] = ["allOf", "anyOf", "oneOf"];

#[derive(Debug, Clone, PartialEq)]
pub struct ObjectShape {
    root: Value,
}

impl ObjectShape {
    /// Shape of a Rust type, from its `JsonSchema` impl.
    pub fn of<T: JsonSchema>() -> Result<Self, ShapeError> {
        let root = schemars::schema_for!(T);
        Ok(Self { root: serde_json::to_value(root)? })
    }

    /// Shape from a raw OpenAPI v3 / JSON schema document.
    pub fn from_openapi(schema: Value) -> Self {
        Self { root: schema }
    }

    /// Shape from a CRD. Prefers the storage version, else the first served one.
    pub fn from_crd(crd: &CustomResourceDefinition) -> Result<Self, ShapeError> {
        let versions = &crd.spec.versions;
        let chosen = versions
            .iter()
            .find(|v| v.storage)
            .or_else(|| versions.iter().find(|v| v.served));
        let schema = chosen
            .and_then(|v| v.schema.as_ref())
            .and_then(|s| s.open_api_v3_schema.as_ref())
            .ok_or_else(|| ShapeError::NoSchema { crd: crd.metadata.name.clone().unwrap_or_default() })?;
        Ok(Self { root: serde_json::to_value(schema)? })
    }

    pub fn schema(&self) -> &Value { &self.root }

    /// Check that `path` is structurally reachable.
    pub fn resolve(&self, path: &FieldPath) -> Result<(), PathError> {
        self.walk(path).map(|_| ())
    }

    /// Like [`resolve`](Self::resolve) but describes the node the path ends on,
    /// e.g. `string`, `array`, `object`, `map`.
    pub fn describe(&self, path: &FieldPath) -> Result<String, PathError> {
        let node = self.walk(path)?;
        Ok(if is_map(node) { "map".to_string() } else { type_name(node) })
    }

    fn walk(&self, path: &FieldPath) -> Result<&Value, PathError> {
        let mut current = self.deref(&self.root)?;
        for segment in path.segments() {
            if is_map(current) {
                return Err(PathError::MapNotSupported);
            }
            current = match segment {
                Segment::Field(name) => self.field(current, name)?,
                Segment::Index(_) => self.element(current)?,
            };
        }
        Ok(current)
    }

    /// Follow `$ref`s and single-member `allOf`/`anyOf`/`oneOf` wrappers.
    fn deref<'a>(&'a self, mut node: &'a Value) -> Result<&'a Value, PathError> {
        for _ in 0..MAX_DEPTH {
            if let Some(reference) = node.get("$ref").and_then(Value::as_str) {
                node = self.lookup_ref(reference)?;
                continue;
            }
            match single_member(node) {
                Some(inner) => node = inner,
                None => return Ok(node),
            }
        }
        Err(PathError::Unresolvable { reference: "reference chain too deep".to_string() })
    }

    fn lookup_ref(&self, reference: &str) -> Result<&Value, PathError> {
        let pointer = reference.strip_prefix('#').unwrap_or(reference);
        self.root
            .pointer(pointer)
            .ok_or_else(|| PathError::Unresolvable { reference: reference.to_string() })
    }

    fn field<'a>(&'a self, node: &'a Value, name: &str) -> Result<&'a Value, PathError> {
        if !is_object_like(node) {
            return Err(PathError::NotAnObject { field: name.to_string(), found: type_name(node) });
        }
        match self.find_property(node, name, 0)? {
            Some(found) => self.deref(found),
            None if allows_additional(node) => Err(PathError::MapNotSupported),
            None => Err(PathError::FieldNotFound { field: name.to_string() }),
        }
    }

    /// Look in `properties`, then transparently in inlined members.
    fn find_property<'a>(&'a self, node: &'a Value, name: &str, depth: usize) -> Result<Option<&'a Value>, PathError> {
        if let Some(prop) = node.get("properties").and_then(|p| p.get(name)) {
            return Ok(Some(prop));
        }
        if depth >= MAX_DEPTH {
            return Ok(None);
        }
        for member in subschemas(node) {
            let member = self.deref(member)?;
            if !is_object_like(member) {
                continue;
            }
            if let Some(found) = self.find_property(member, name, depth + 1)? {
                return Ok(Some(found));
            }
        }
        Ok(None)
    }

    fn element<'a>(&'a self, node: &'a Value) -> Result<&'a Value, PathError> {
        if let Some(items) = node.get("items") {
            // Tuple-style `items: [..]`: take the first element type.
            let items = match items {
                Value::Array(list) => list
                    .first()
                    .ok_or_else(|| PathError::NotASequence { found: "empty tuple".to_string() })?,
                other => other,
            };
            return self.deref(items);
        }
        for member in subschemas(node) {
            let member = self.deref(member)?;
            if member.get("items").is_some() {
                return self.element(member);
            }
        }
        Err(PathError::NotASequence { found: type_name(node) })
    }
}

fn subschemas(node: &Value) -> impl Iterator<Item = &Value> {
    SUBSCHEMA_KEYS
        .iter()
        .filter_map(move |k| node.get(*k).and_then(Value::as_array))
        .flatten()
}

fn is_null_schema(node: &Value) -> bool {
    types(node) == ["null"]
}

/// The single non-null member of a pure wrapper node (`Option<T>`, documented `$ref`).
fn single_member(node: &Value) -> Option<&Value> {
    if node.get("properties").is_some() || node.get("items").is_some() || node.get("additionalProperties").is_some() {
        return None;
    }
    let mut members = subschemas(node).filter(|m| !is_null_schema(m));
    let first = members.next()?;
    if members.next().is_some() { None } else { Some(first) }
}

fn types(node: &Value) -> Vec<&str> {
    match node.get("type") {
        Some(Value::String(t)) => vec![t.as_str()],
        Some(Value::Array(ts)) => ts.iter().filter_map(Value::as_str).collect(),
        _ => Vec::new(),
    }
}

fn type_name(node: &Value) -> String {
    if let Value::Bool(b) = node {
        return format!("{} schema", b);
    }
    let ts: Vec<&str> = types(node).into_iter().filter(|t| *t != "null").collect();
    if !ts.is_empty() {
        return ts.join("|");
    }
    if node.get("items").is_some() {
        "array".to_string()
    } else if node.get("properties").is_some() || node.get("additionalProperties").is_some() {
        "object".to_string()
    } else if node.get("enum").is_some() {
        "enum".to_string()
    } else {
        "unknown".to_string()
    }
}

fn allows_additional(node: &Value) -> bool {
    matches!(node.get("additionalProperties"), Some(Value::Object(_)) | Some(Value::Bool(true)))
        || node.get("x-kubernetes-preserve-unknown-fields") == Some(&Value::Bool(true))
}

/// Dynamically keyed: a string map or free-form object with no declared properties.
fn is_map(node: &Value) -> bool {
    match node {
        Value::Bool(true) => true,
        Value::Object(_) => {
            node.get("properties").is_none() && subschemas(node).next().is_none() && allows_additional(node)
        }
        _ => false,
    }
}

fn is_object_like(node: &Value) -> bool {
    node.get("properties").is_some()
        || node.get("additionalProperties").is_some()
        || subschemas(node).next().is_some()
        || types(node).contains(&"object")
}
