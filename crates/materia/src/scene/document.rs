//! The persisted scene shape.
//!
//! ```json
//! {
//!   "ambiente": { "luzAmbiental": "#1a1a2a", "hora": "12", ... },
//!   "materias": [
//!     { "id": 1, "name": "Scene", "tag": "", "parentId": null,
//!       "leyes": [ { "type": "Transform", "properties": { ... } } ] },
//!     { "id": 2, "name": "Main Camera", "tag": "", "parentId": 1,
//!       "leyes": [ ... ] }
//!   ]
//! }
//! ```
//!
//! Records are flat; the tree is encoded only by `parentId`. A child may
//! appear before its parent.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::ambiente::Ambiente;
use crate::ecs::EntityId;
use crate::error::{Result, SceneError};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SceneDocument {
    pub ambiente: Ambiente,
    pub materias: Vec<MateriaRecord>,
    /// Records dropped while decoding, reported by the loader.
    #[serde(skip)]
    pub rejected: Vec<RejectedRecord>,
}

/// A `materias` entry that could not become a materia at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedRecord {
    /// Position in the `materias` list.
    pub index: usize,
    pub message: String,
}

impl SceneDocument {
    pub fn new(ambiente: Ambiente, materias: Vec<MateriaRecord>) -> Self {
        Self {
            ambiente,
            materias,
            rejected: Vec::new(),
        }
    }

    /// Parse a document. Anything that is not a JSON object with a
    /// `materias` list is [`SceneError::MalformedDocument`].
    pub fn from_json_str(json: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(json)
            .map_err(|e| SceneError::MalformedDocument(format!("not valid JSON: {e}")))?;
        Self::from_value(value)
    }

    /// Decode record by record. A record without a usable id is kept in
    /// [`rejected`](Self::rejected); other bad fields fall back to their
    /// defaults, and a broken `ambiente` falls back to the default one.
    pub fn from_value(value: Value) -> Result<Self> {
        let Value::Object(mut object) = value else {
            return Err(SceneError::MalformedDocument("top level is not an object".into()));
        };
        let records = match object.remove("materias") {
            Some(Value::Array(records)) => records,
            Some(_) => return Err(SceneError::MalformedDocument("'materias' is not a list".into())),
            None => return Err(SceneError::MalformedDocument("missing 'materias'".into())),
        };

        let ambiente = match object.remove("ambiente") {
            None | Some(Value::Null) => Ambiente::default(),
            Some(value) => serde_json::from_value(value).unwrap_or_else(|e| {
                log::warn!("Unreadable ambiente ({e}), using defaults");
                Ambiente::default()
            }),
        };

        let mut document = Self::new(ambiente, Vec::with_capacity(records.len()));
        for (index, record) in records.into_iter().enumerate() {
            match decode_materia(record) {
                Ok(record) => document.materias.push(record),
                Err(message) => {
                    log::warn!("Materia record {index}: {message}");
                    document.rejected.push(RejectedRecord { index, message });
                }
            }
        }
        Ok(document)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn to_json_string_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn to_value(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }

    pub fn record(&self, id: EntityId) -> Option<&MateriaRecord> {
        self.materias.iter().find(|m| m.id == id)
    }
}

impl<'de> Deserialize<'de> for SceneDocument {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::from_value(value).map_err(serde::de::Error::custom)
    }
}

fn entity_id(value: &Value) -> Option<EntityId> {
    value.as_u64().and_then(|n| u32::try_from(n).ok()).map(EntityId)
}

fn string_field(object: &Map<String, Value>, key: &str) -> String {
    object.get(key).and_then(Value::as_str).unwrap_or_default().to_string()
}

fn decode_materia(value: Value) -> std::result::Result<MateriaRecord, String> {
    let Value::Object(mut object) = value else {
        return Err("not an object".into());
    };
    let id = object.get("id").and_then(entity_id).ok_or("no usable id")?;

    let parent_id = match object.get("parentId") {
        None | Some(Value::Null) => None,
        Some(value) => {
            let parent = entity_id(value);
            if parent.is_none() {
                log::warn!("{id}: parentId {value} is not an id, kept as a root");
            }
            parent
        }
    };

    let leyes = match object.remove("leyes").or_else(|| object.remove("components")) {
        Some(Value::Array(items)) => items.into_iter().map(decode_ley).collect(),
        None | Some(Value::Null) => Vec::new(),
        Some(other) => {
            log::warn!("{id}: leyes is not a list ({other}), ignored");
            Vec::new()
        }
    };

    let flags = match object.remove("flags") {
        Some(Value::Object(flags)) => flags.into_iter().collect(),
        _ => BTreeMap::new(),
    };

    Ok(MateriaRecord {
        id,
        name: string_field(&object, "name"),
        tag: string_field(&object, "tag"),
        parent_id,
        is_active: object.get("isActive").and_then(Value::as_bool).unwrap_or(true),
        layer: object
            .get("layer")
            .and_then(Value::as_i64)
            .and_then(|layer| i32::try_from(layer).ok())
            .unwrap_or(0),
        flags,
        leyes,
    })
}

/// A ley without a string `type` keeps an empty type name so the loader can
/// report it against its materia.
fn decode_ley(value: Value) -> LeyRecord {
    let Value::Object(mut object) = value else {
        return LeyRecord::new("", value);
    };
    let type_name = match object.remove("type") {
        Some(Value::String(type_name)) => type_name,
        _ => String::new(),
    };
    let properties = match object.remove("properties") {
        None | Some(Value::Null) => empty_object(),
        Some(properties) => properties,
    };
    LeyRecord {
        type_name,
        properties,
        inline: object,
    }
}

/// One materia, flattened.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MateriaRecord {
    pub id: EntityId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub tag: String,
    /// `null` for roots.
    #[serde(default)]
    pub parent_id: Option<EntityId>,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default)]
    pub layer: i32,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub flags: BTreeMap<String, Value>,
    #[serde(default, alias = "components")]
    pub leyes: Vec<LeyRecord>,
}

fn default_active() -> bool {
    true
}

/// One component: its registered type name and its properties.
///
/// A `CustomComponent` keeps `definitionName` and `publicVars` next to
/// `type` rather than inside `properties`; those sibling keys land in
/// `inline`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeyRecord {
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default = "empty_object", skip_serializing_if = "is_empty_object")]
    pub properties: Value,
    #[serde(flatten)]
    pub inline: Map<String, Value>,
}

impl LeyRecord {
    pub fn new(type_name: impl Into<String>, properties: Value) -> Self {
        Self {
            type_name: type_name.into(),
            properties,
            inline: Map::new(),
        }
    }

    /// `properties` with any inline keys laid over it.
    pub fn merged_properties(&self) -> Value {
        if self.inline.is_empty() {
            return self.properties.clone();
        }
        let mut merged = match &self.properties {
            Value::Object(map) => map.clone(),
            _ => Map::new(),
        };
        for (key, value) in &self.inline {
            merged.insert(key.clone(), value.clone());
        }
        Value::Object(merged)
    }
}

fn empty_object() -> Value {
    Value::Object(Map::new())
}

fn is_empty_object(value: &Value) -> bool {
    matches!(value, Value::Object(map) if map.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn minimal_legacy_document() {
        let doc = SceneDocument::from_value(json!({
            "materias": [
                { "id": 3, "name": "Solo", "parentId": null,
                  "leyes": [ { "type": "Transform", "properties": {} } ] }
            ]
        }))
        .unwrap();
        assert_eq!(doc.ambiente, Ambiente::default());
        let record = doc.record(EntityId(3)).unwrap();
        assert!(record.is_active);
        assert_eq!(record.tag, "");
        assert_eq!(record.leyes[0].type_name, "Transform");
    }

    #[test]
    fn structural_problems_are_malformed() {
        for bad in [json!([]), json!({ "ambiente": {} }), json!({ "materias": "no" })] {
            let err = SceneDocument::from_value(bad).unwrap_err();
            assert!(matches!(err, SceneError::MalformedDocument(_)), "{err}");
        }
        assert!(matches!(
            SceneDocument::from_json_str("{ not json"),
            Err(SceneError::MalformedDocument(_))
        ));
    }

    #[test]
    fn bad_records_are_dropped_or_defaulted_one_by_one() {
        let doc = SceneDocument::from_value(json!({
            "ambiente": { "hora": [] },
            "materias": [
                { "id": 1, "name": null, "tag": null, "isActive": "yes", "layer": 1e12,
                  "leyes": [ 7, { "properties": {} }, { "type": "Camera" } ] },
                "not a record",
                { "name": "no id" },
                { "id": -4 },
                { "id": 2, "parentId": "one" }
            ]
        }))
        .unwrap();

        assert_eq!(doc.ambiente, Ambiente::default());
        assert_eq!(doc.materias.len(), 2);
        let first = doc.record(EntityId(1)).unwrap();
        assert_eq!((first.name.as_str(), first.tag.as_str()), ("", ""));
        assert!(first.is_active);
        assert_eq!(first.layer, 0);
        let types: Vec<_> = first.leyes.iter().map(|l| l.type_name.as_str()).collect();
        assert_eq!(types, ["", "", "Camera"]);
        assert_eq!(first.leyes[0].properties, json!(7));
        assert_eq!(doc.record(EntityId(2)).unwrap().parent_id, None);

        let rejected: Vec<_> = doc.rejected.iter().map(|r| r.index).collect();
        assert_eq!(rejected, [1, 2, 3]);
        assert_eq!(doc.rejected[1].message, "no usable id");
    }

    #[test]
    fn components_is_accepted_for_leyes() {
        let doc = SceneDocument::from_value(json!({
            "materias": [ { "id": 1, "components": [ { "type": "Camera" } ] } ]
        }))
        .unwrap();
        assert_eq!(doc.materias[0].leyes.len(), 1);
        assert_eq!(doc.materias[0].leyes[0].properties, json!({}));
    }

    #[test]
    fn inline_keys_merge_over_properties() {
        let record: LeyRecord = serde_json::from_value(json!({
            "type": "CustomComponent",
            "definitionName": "Health",
            "publicVars": { "max": 10 }
        }))
        .unwrap();
        assert_eq!(
            record.merged_properties(),
            json!({ "definitionName": "Health", "publicVars": { "max": 10 } })
        );
        // Written back in the same shape.
        assert_eq!(
            serde_json::to_value(&record).unwrap(),
            json!({ "type": "CustomComponent", "definitionName": "Health", "publicVars": { "max": 10 } })
        );
    }
}
