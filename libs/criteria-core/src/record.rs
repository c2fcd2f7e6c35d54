//! Row access by canonical field name.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::{Error, Result};
use crate::schema::FieldSchema;
use crate::value::{FieldKind, Value};

/// Anything a page can be built from. `None` means the field is null/absent.
pub trait Record {
    fn field_value(&self, field: &str) -> Option<Value>;
}

impl<R: Record + ?Sized> Record for &R {
    fn field_value(&self, field: &str) -> Option<Value> {
        (**self).field_value(field)
    }
}

/// Schema-typed row backed by a map, e.g. loaded from JSON.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct DynRecord(BTreeMap<String, Value>);

impl DynRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(field.into(), value.into());
        self
    }

    /// Convert a JSON object using the schema's field kinds. Unknown keys are
    /// dropped; `null` is treated as absent.
    pub fn from_json(
        schema: &FieldSchema,
        obj: &serde_json::Map<String, serde_json::Value>,
    ) -> Result<Self> {
        let mut out = BTreeMap::new();
        for (key, raw) in obj {
            let Some(field) = schema.get(key) else {
                continue;
            };
            let text = match raw {
                serde_json::Value::Null => continue,
                serde_json::Value::String(s) => s.clone(),
                serde_json::Value::Number(n) if field.spec.kind == FieldKind::Number => {
                    n.to_string()
                }
                serde_json::Value::Bool(b) if field.spec.kind == FieldKind::Bool => b.to_string(),
                other => {
                    return Err(Error::InvalidFilterValue {
                        field: field.name.to_string(),
                        value: other.to_string(),
                        expected: field.spec.kind,
                    })
                }
            };
            let value = field
                .spec
                .parse_value(&text)
                .map_err(|e| Error::InvalidFilterValue {
                    field: field.name.to_string(),
                    value: e.raw,
                    expected: e.expected,
                })?;
            out.insert(field.name.to_string(), value);
        }
        Ok(Self(out))
    }
}

impl Record for DynRecord {
    fn field_value(&self, field: &str) -> Option<Value> {
        self.0.get(field).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::FieldSpec;

    #[test]
    fn json_rows_are_typed_by_schema() {
        let schema = FieldSchema::builder("tag")
            .field("id", FieldSpec::number().sortable())
            .field("name", FieldSpec::string())
            .field("color", FieldSpec::enumeration(["RED", "BLUE"]))
            .tiebreaker("id")
            .build()
            .unwrap();
        let obj = serde_json::json!({
            "id": 7, "NAME": "vip", "color": "red", "extra": true, "gone": null
        });
        let rec = DynRecord::from_json(&schema, obj.as_object().unwrap()).unwrap();
        assert_eq!(rec.field_value("id"), Some(Value::from(7)));
        assert_eq!(rec.field_value("name"), Some(Value::from("vip")));
        assert_eq!(rec.field_value("color"), Some(Value::Enum("RED".into())));
        assert_eq!(rec.field_value("extra"), None);

        let bad = serde_json::json!({"id": "seven"});
        assert!(DynRecord::from_json(&schema, bad.as_object().unwrap()).is_err());
    }
}
