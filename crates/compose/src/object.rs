//! Typed objects that take part in a composition, paired with their GVK.

use std::borrow::Cow;
use std::fmt;

use crossbuild_core::api_version_of;
use crossbuild_schema::{ObjectShape, ShapeError};
use kube::core::GroupVersionKind;
use schemars::JsonSchema;
use serde::Serialize;
use serde_json::Value;

use crate::error::TemplateError;

/// A value that can be serialized into a composition and whose declared
/// shape can be inspected for field path validation.
pub trait Object {
    fn to_value(&self) -> serde_json::Result<Value>;
    fn shape(&self) -> Result<ObjectShape, ShapeError>;
}

impl<T: Serialize + JsonSchema> Object for T {
    fn to_value(&self) -> serde_json::Result<Value> {
        serde_json::to_value(self)
    }

    fn shape(&self) -> Result<ObjectShape, ShapeError> {
        ObjectShape::of::<T>()
    }
}

/// A typed object together with the GVK it is stamped with.
///
/// The shape defaults to the object's derived schema. Use
/// [`with_shape`](Self::with_shape) when the authoritative schema lives
/// elsewhere, e.g. in a CRD.
pub struct ObjectKindReference {
    gvk: GroupVersionKind,
    object: Box<dyn Object>,
    shape: Option<ObjectShape>,
}

impl ObjectKindReference {
    pub fn new<T: Object + 'static>(gvk: GroupVersionKind, object: T) -> Self {
        Self { gvk, object: Box::new(object), shape: None }
    }

    /// Reference for a statically typed Kubernetes resource; the GVK comes from its type.
    pub fn of<K>(object: K) -> Self
    where
        K: kube::Resource<DynamicType = ()> + Object + 'static,
    {
        let gvk = GroupVersionKind::gvk(&K::group(&()), &K::version(&()), &K::kind(&()));
        Self::new(gvk, object)
    }

    pub fn with_shape(mut self, shape: ObjectShape) -> Self {
        self.shape = Some(shape);
        self
    }

    pub fn gvk(&self) -> &GroupVersionKind { &self.gvk }

    pub fn object(&self) -> &dyn Object { self.object.as_ref() }

    pub fn shape(&self) -> Result<Cow<'_, ObjectShape>, ShapeError> {
        match &self.shape {
            Some(shape) => Ok(Cow::Borrowed(shape)),
            None => self.object.shape().map(Cow::Owned),
        }
    }

    /// Serialized object with `apiVersion` and `kind` set from the GVK.
    pub fn to_stamped_value(&self) -> Result<Value, TemplateError> {
        let mut value = self.object.to_value().map_err(TemplateError::Serialize)?;
        if !value.is_object() {
            return Err(TemplateError::BaseNotAnObject { found: json_kind(&value) });
        }
        if let Some(map) = value.as_object_mut() {
            map.insert("apiVersion".to_string(), Value::String(api_version_of(&self.gvk)));
            map.insert("kind".to_string(), Value::String(self.gvk.kind.clone()));
        }
        Ok(value)
    }
}

impl fmt::Debug for ObjectKindReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectKindReference")
            .field("gvk", &self.gvk)
            .field("shape_override", &self.shape.is_some())
            .finish()
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
