//! Declared response schemas
//!
//! A `Schema` is sent to the service as `responseSchema` and checked again
//! locally against whatever comes back.

use serde::Serialize;
use serde_json::{json, Value};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum SchemaType {
    String,
    Number,
    Boolean,
    Array,
    Object,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Schema {
    #[serde(rename = "type")]
    pub kind: SchemaType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "enum", skip_serializing_if = "Vec::is_empty")]
    pub allowed: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<Schema>>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, Schema>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,
    /// Field order for the service; BTreeMap would otherwise sort them
    #[serde(rename = "propertyOrdering", skip_serializing_if = "Vec::is_empty")]
    pub ordering: Vec<String>,
}

impl Schema {
    fn of(kind: SchemaType) -> Self {
        Self {
            kind,
            description: None,
            allowed: Vec::new(),
            items: None,
            properties: BTreeMap::new(),
            required: Vec::new(),
            ordering: Vec::new(),
        }
    }

    pub fn string() -> Self {
        Self::of(SchemaType::String)
    }

    pub fn number() -> Self {
        Self::of(SchemaType::Number)
    }

    pub fn boolean() -> Self {
        Self::of(SchemaType::Boolean)
    }

    pub fn object() -> Self {
        Self::of(SchemaType::Object)
    }

    pub fn array(items: Schema) -> Self {
        let mut schema = Self::of(SchemaType::Array);
        schema.items = Some(Box::new(items));
        schema
    }

    pub fn string_array() -> Self {
        Self::array(Self::string())
    }

    /// String restricted to a fixed set of values
    pub fn one_of(values: &[&str]) -> Self {
        let mut schema = Self::string();
        schema.allowed = values.iter().map(|v| v.to_string()).collect();
        schema
    }

    pub fn describe(mut self, text: &str) -> Self {
        self.description = Some(text.to_string());
        self
    }

    /// Add a required property
    pub fn field(mut self, name: &str, schema: Schema) -> Self {
        self.required.push(name.to_string());
        self.ordering.push(name.to_string());
        self.properties.insert(name.to_string(), schema);
        self
    }

    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    /// Skeleton of the expected JSON, embedded in the prompt text
    pub fn outline(&self) -> Value {
        match self.kind {
            SchemaType::Object => {
                let mut map = serde_json::Map::new();
                for name in &self.ordering {
                    if let Some(prop) = self.properties.get(name) {
                        map.insert(name.clone(), prop.outline());
                    }
                }
                Value::Object(map)
            }
            SchemaType::Array => match &self.items {
                Some(items) => json!([items.outline()]),
                None => json!([]),
            },
            _ => {
                let base = match self.kind {
                    SchemaType::String => "string",
                    SchemaType::Number => "number",
                    _ => "boolean",
                };
                let mut label = base.to_string();
                if !self.allowed.is_empty() {
                    label = format!("{} (one of: {})", label, self.allowed.join(", "));
                }
                if let Some(desc) = &self.description {
                    label = format!("{} ({})", label, desc);
                }
                Value::String(label)
            }
        }
    }

    /// Structural check of a parsed response against this schema.
    ///
    /// Returns the first violation as `path: problem`.
    pub fn check(&self, value: &Value) -> Result<(), String> {
        self.check_at("$", value)
    }

    fn check_at(&self, path: &str, value: &Value) -> Result<(), String> {
        match (self.kind, value) {
            (SchemaType::String, Value::String(s)) => {
                if !self.allowed.is_empty() && !self.allowed.iter().any(|a| a == s) {
                    return Err(format!("{}: '{}' is not one of [{}]", path, s, self.allowed.join(", ")));
                }
                Ok(())
            }
            (SchemaType::Number, Value::Number(_)) => Ok(()),
            (SchemaType::Boolean, Value::Bool(_)) => Ok(()),
            (SchemaType::Array, Value::Array(values)) => {
                if let Some(items) = &self.items {
                    for (i, item) in values.iter().enumerate() {
                        items.check_at(&format!("{}[{}]", path, i), item)?;
                    }
                }
                Ok(())
            }
            (SchemaType::Object, Value::Object(map)) => {
                for name in &self.required {
                    if !map.contains_key(name) || map[name].is_null() {
                        return Err(format!("{}: missing required field '{}'", path, name));
                    }
                }
                for (name, prop) in &self.properties {
                    if let Some(v) = map.get(name) {
                        prop.check_at(&format!("{}.{}", path, name), v)?;
                    }
                }
                Ok(())
            }
            (expected, other) => Err(format!(
                "{}: expected {:?}, found {}",
                path,
                expected,
                json_type_name(other)
            )),
        }
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Schema {
        Schema::object()
            .field("score", Schema::number())
            .field("summary", Schema::string())
            .field("tips", Schema::string_array())
    }

    #[test]
    fn test_serializes_to_gemini_shape() {
        let json = sample().to_json();
        assert_eq!(json["type"], "OBJECT");
        assert_eq!(json["properties"]["score"]["type"], "NUMBER");
        assert_eq!(json["properties"]["tips"]["items"]["type"], "STRING");
        assert_eq!(json["required"], json!(["score", "summary", "tips"]));
        assert_eq!(json["propertyOrdering"], json!(["score", "summary", "tips"]));
    }

    #[test]
    fn test_check_reports_missing_and_mistyped_fields() {
        let schema = sample();
        assert!(schema
            .check(&json!({"score": 71, "summary": "ok", "tips": ["a"]}))
            .is_ok());

        let missing = schema.check(&json!({"score": 71, "tips": []})).unwrap_err();
        assert!(missing.contains("summary"));

        let mistyped = schema
            .check(&json!({"score": "71", "summary": "ok", "tips": []}))
            .unwrap_err();
        assert!(mistyped.contains("$.score"));

        let bad_item = schema
            .check(&json!({"score": 1, "summary": "ok", "tips": ["a", 2]}))
            .unwrap_err();
        assert!(bad_item.contains("$.tips[1]"));
    }

    #[test]
    fn test_enum_restriction() {
        let schema = Schema::object().field("category", Schema::one_of(&["Bills", "Other"]));
        assert!(schema.check(&json!({"category": "Bills"})).is_ok());
        assert!(schema.check(&json!({"category": "Groceries"})).is_err());
    }

    #[test]
    fn test_outline_skeleton() {
        let outline = sample().outline();
        let keys: Vec<_> = outline.as_object().unwrap().keys().cloned().collect();
        assert!(keys.contains(&"score".to_string()));
        assert_eq!(outline["tips"], json!(["string"]));
    }
}
