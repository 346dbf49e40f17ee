use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A stored record as the REST API returns it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: String,
    pub metadata: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated: Option<String>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub links: Map<String, Value>,
}

impl Record {
    pub fn new(id: impl Into<String>, metadata: Value) -> Self {
        Self {
            id: id.into(),
            metadata,
            created: None,
            updated: None,
            links: Map::new(),
        }
    }

    pub fn field(&self, key: &str) -> Option<&Value> {
        self.metadata.get(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn optional_parts_may_be_missing() {
        let r: Record = serde_json::from_value(json!({
            "id": "3",
            "metadata": {"pid": "3", "name": "Short loans"}
        }))
        .unwrap();
        assert_eq!(r.field("name"), Some(&json!("Short loans")));
        assert!(r.links.is_empty());
        assert_eq!(
            serde_json::to_value(&r).unwrap(),
            json!({"id": "3", "metadata": {"pid": "3", "name": "Short loans"}})
        );
    }
}
