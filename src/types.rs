// Core data types shared by every source.
// Defines the two template collections and the opaque item record.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, de};
use serde_json::Value;

use crate::error::{Result, TemplateError};

/// Template collection managed by the loader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollectionType {
    Steps,
    Workflows,
}

impl CollectionType {
    pub const ALL: [CollectionType; 2] = [CollectionType::Steps, CollectionType::Workflows];

    /// Sub-path used both remotely and in the mirror/bundled directories.
    pub fn as_str(&self) -> &'static str {
        match self {
            CollectionType::Steps => "steps",
            CollectionType::Workflows => "workflows",
        }
    }

    pub(crate) fn index(&self) -> usize {
        match self {
            CollectionType::Steps => 0,
            CollectionType::Workflows => 1,
        }
    }
}

impl fmt::Display for CollectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CollectionType {
    type Err = TemplateError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "steps" => Ok(CollectionType::Steps),
            "workflows" => Ok(CollectionType::Workflows),
            other => Err(TemplateError::InvalidConfig(format!(
                "unknown collection type '{}'",
                other
            ))),
        }
    }
}

/// A step or workflow template.
///
/// Only the `id` field is interpreted; everything else is carried through untouched.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Item(Value);

impl Item {
    /// Wrap a JSON value, requiring an object with a non-empty string `id`.
    pub fn from_value(value: Value) -> std::result::Result<Self, String> {
        let problem = match value.get("id") {
            Some(Value::String(id)) if id.is_empty() => Some("`id` must not be empty"),
            Some(Value::String(_)) => None,
            Some(_) => Some("`id` must be a string"),
            None if value.is_object() => Some("missing `id` field"),
            None => Some("expected a JSON object"),
        };
        match problem {
            None => Ok(Item(value)),
            Some(problem) => Err(problem.to_string()),
        }
    }

    /// Parse raw bytes from a remote, mirrored or bundled file.
    pub fn parse(bytes: &[u8], origin: &str) -> Result<Self> {
        let value: Value = serde_json::from_slice(bytes).map_err(|e| TemplateError::Parse {
            origin: origin.to_string(),
            message: e.to_string(),
        })?;
        Item::from_value(value).map_err(|message| TemplateError::Parse {
            origin: origin.to_string(),
            message,
        })
    }

    pub fn id(&self) -> &str {
        self.0.get("id").and_then(Value::as_str).unwrap_or_default()
    }

    pub fn value(&self) -> &Value {
        &self.0
    }
}

impl<'de> Deserialize<'de> for Item {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Item::from_value(value).map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_item() {
        let item = Item::parse(br#"{"id":"a","name":"Checkout"}"#, "a.json").unwrap();
        assert_eq!(item.id(), "a");
        assert_eq!(item.value()["name"], "Checkout");
    }

    #[test]
    fn test_parse_rejects_missing_or_non_string_id() {
        assert!(matches!(
            Item::parse(br#"{"name":"x"}"#, "x.json"),
            Err(TemplateError::Parse { .. })
        ));
        assert!(Item::parse(br#"{"id":7}"#, "x.json").is_err());
        assert!(Item::parse(br#"{"id":""}"#, "x.json").is_err());
        assert!(Item::parse(b"[1,2]", "x.json").is_err());
        assert!(Item::parse(b"{not json", "x.json").is_err());
    }

    #[test]
    fn test_item_serializes_transparently() {
        let item = Item::from_value(json!({"id": "a", "x": 1})).unwrap();
        assert_eq!(serde_json::to_value(&item).unwrap(), json!({"id": "a", "x": 1}));

        let back: Item = serde_json::from_str(r#"{"id":"a","x":1}"#).unwrap();
        assert_eq!(back, item);
    }

    #[test]
    fn test_collection_type_names() {
        assert_eq!(CollectionType::Steps.to_string(), "steps");
        assert_eq!(
            "workflows".parse::<CollectionType>().unwrap(),
            CollectionType::Workflows
        );
        assert!("jobs".parse::<CollectionType>().is_err());
    }
}
