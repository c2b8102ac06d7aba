//! Connection detail exports and readiness checks of a composed resource.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionDetailType {
    FromConnectionSecretKey,
    FromFieldPath,
    FromValue,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionDetail {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<ConnectionDetailType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_connection_secret_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_field_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl ConnectionDetail {
    fn named(name: impl Into<String>, kind: ConnectionDetailType) -> Self {
        Self {
            name: Some(name.into()),
            kind: Some(kind),
            from_connection_secret_key: None,
            from_field_path: None,
            value: None,
        }
    }

    pub fn from_secret_key(name: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            from_connection_secret_key: Some(key.into()),
            ..Self::named(name, ConnectionDetailType::FromConnectionSecretKey)
        }
    }

    pub fn from_field_path(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self { from_field_path: Some(path.into()), ..Self::named(name, ConnectionDetailType::FromFieldPath) }
    }

    pub fn from_value(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self { value: Some(value.into()), ..Self::named(name, ConnectionDetailType::FromValue) }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReadinessCheckType {
    None,
    MatchString,
    MatchInteger,
    NonEmpty,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadinessCheck {
    #[serde(rename = "type")]
    pub kind: ReadinessCheckType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub match_string: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub match_integer: Option<i64>,
}

impl ReadinessCheck {
    /// Resource counts as ready as soon as it exists.
    pub fn none() -> Self {
        Self { kind: ReadinessCheckType::None, field_path: None, match_string: None, match_integer: None }
    }

    pub fn non_empty(path: impl Into<String>) -> Self {
        Self { kind: ReadinessCheckType::NonEmpty, field_path: Some(path.into()), ..Self::none() }
    }

    pub fn match_string(path: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            kind: ReadinessCheckType::MatchString,
            field_path: Some(path.into()),
            match_string: Some(value.into()),
            ..Self::none()
        }
    }

    pub fn match_integer(path: impl Into<String>, value: i64) -> Self {
        Self {
            kind: ReadinessCheckType::MatchInteger,
            field_path: Some(path.into()),
            match_integer: Some(value),
            ..Self::none()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connection_detail_constructors_set_type() {
        let d = ConnectionDetail::from_secret_key("password", "attribute.password");
        let v = serde_json::to_value(&d).unwrap();
        assert_eq!(v["type"], "FromConnectionSecretKey");
        assert_eq!(v["fromConnectionSecretKey"], "attribute.password");
        assert!(v.get("value").is_none());
    }

    #[test]
    fn readiness_check_omits_unused_fields() {
        let v = serde_json::to_value(ReadinessCheck::match_integer("status.ready", 1)).unwrap();
        assert_eq!(v, serde_json::json!({ "type": "MatchInteger", "fieldPath": "status.ready", "matchInteger": 1 }));
        let v = serde_json::to_value(ReadinessCheck::none()).unwrap();
        assert_eq!(v, serde_json::json!({ "type": "None" }));
    }
}
