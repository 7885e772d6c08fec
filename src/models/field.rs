//! Field values carried by work items.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Ordered mapping of field reference name to value.
///
/// Iteration order is insertion order, which is also the order in which patch
/// operations are emitted.
pub type FieldMap = IndexMap<String, FieldValue>;

/// A reference to a user or group as the server embeds it in fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityRef {
    #[serde(default)]
    pub id: Option<String>,
    pub display_name: String,
    #[serde(default)]
    pub unique_name: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

impl IdentityRef {
    /// Value the server accepts when this identity is written into a field.
    pub fn field_text(&self) -> &str {
        self.unique_name
            .as_deref()
            .filter(|name| !name.is_empty())
            .unwrap_or(&self.display_name)
    }
}

/// The value of a single work item field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Identity(IdentityRef),
    /// Anything else: numbers, booleans, nested objects.
    Json(Value),
}

impl FieldValue {
    /// Classifies a raw JSON field value.
    ///
    /// Objects with a `displayName` are identity references, strings are text, and
    /// every other value is kept as opaque JSON.
    pub fn from_json(value: Value) -> Self {
        match value {
            Value::String(text) => Self::Text(text),
            Value::Object(ref map) if map.contains_key("displayName") => {
                serde_json::from_value::<IdentityRef>(value.clone())
                    .map(Self::Identity)
                    .unwrap_or(Self::Json(value))
            }
            other => Self::Json(other),
        }
    }

    /// Converts back to the JSON written into a patch document.
    pub fn to_json(&self) -> Value {
        match self {
            Self::Text(text) => Value::String(text.clone()),
            Self::Identity(identity) => Value::String(identity.field_text().to_string()),
            Self::Json(value) => value.clone(),
        }
    }

    /// Returns the text if this is a [`FieldValue::Text`].
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Returns the integer if this is a JSON number that fits an `i64`.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Json(value) => value.as_i64(),
            Self::Text(text) => text.parse().ok(),
            Self::Identity(_) => None,
        }
    }

    /// True for values that must not be written as a pending edit.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Text(text) => text.is_empty(),
            Self::Identity(identity) => identity.display_name.is_empty(),
            Self::Json(Value::Null) => true,
            Self::Json(Value::String(text)) => text.is_empty(),
            Self::Json(_) => false,
        }
    }

    /// Human-readable rendering; identities render as their display name.
    pub fn display_text(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Identity(identity) => identity.display_name.clone(),
            Self::Json(Value::String(text)) => text.clone(),
            Self::Json(value) => value.to_string(),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<IdentityRef> for FieldValue {
    fn from(value: IdentityRef) -> Self {
        Self::Identity(value)
    }
}

impl From<Value> for FieldValue {
    fn from(value: Value) -> Self {
        Self::from_json(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        Self::Json(Value::from(value))
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Json(Value::Bool(value))
    }
}
