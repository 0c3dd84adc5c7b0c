//! Table entity model
//!
//! An [`Entity`] is a row in a table: a partition key, a row key and a map of
//! typed properties. Entities convert to and from serde records so callers can
//! work with their own structs:
//!
//! ```
//! use serde::{Deserialize, Serialize};
//! use stowage::domain::entity::Entity;
//!
//! #[derive(Serialize, Deserialize)]
//! #[serde(rename_all = "PascalCase")]
//! struct Upload {
//!     partition_key: String,
//!     row_key: String,
//!     original_url: String,
//! }
//!
//! let upload = Upload {
//!     partition_key: "user-1".to_string(),
//!     row_key: "photo.png".to_string(),
//!     original_url: "https://example.com/photo.png".to_string(),
//! };
//! let entity = Entity::from_record(&upload).unwrap();
//! assert_eq!(entity.partition_key(), "user-1");
//!
//! let back: Upload = entity.to_record().unwrap();
//! assert_eq!(back.original_url, "https://example.com/photo.png");
//! ```

use crate::domain::errors::StowageError;
use crate::domain::result::Result;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Reserved property names of the key and system columns
pub const PARTITION_KEY: &str = "PartitionKey";
pub const ROW_KEY: &str = "RowKey";
pub const TIMESTAMP: &str = "Timestamp";
pub const ETAG: &str = "ETag";

/// Suffix of the property naming the type of the property before it
pub const TYPE_ANNOTATION_SUFFIX: &str = "@odata.type";

/// HTTP-style status codes reported by table operations
pub mod status {
    pub const OK: u16 = 200;
    pub const CREATED: u16 = 201;
    pub const NO_CONTENT: u16 = 204;
    pub const BAD_REQUEST: u16 = 400;
    pub const NOT_FOUND: u16 = 404;
    pub const CONFLICT: u16 = 409;
    pub const PRECONDITION_FAILED: u16 = 412;
    pub const INTERNAL_SERVER_ERROR: u16 = 500;
}

/// Typed property value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EntityProperty {
    String(String),
    Boolean(bool),
    Int32(i32),
    Int64(i64),
    Double(f64),
    DateTime(DateTime<Utc>),
    Guid(Uuid),
    Binary(Vec<u8>),
}

impl EntityProperty {
    /// Returns the string value, if this is a string property
    pub fn as_str(&self) -> Option<&str> {
        match self {
            EntityProperty::String(s) => Some(s),
            _ => None,
        }
    }

    /// Converts the property to its JSON representation
    ///
    /// Dates are RFC 3339 strings, GUIDs hyphenated strings and binary values
    /// base64 strings.
    pub fn to_json(&self) -> Value {
        match self {
            EntityProperty::String(s) => Value::String(s.clone()),
            EntityProperty::Boolean(b) => Value::Bool(*b),
            EntityProperty::Int32(n) => Value::from(*n),
            EntityProperty::Int64(n) => Value::from(*n),
            EntityProperty::Double(n) => {
                serde_json::Number::from_f64(*n).map_or(Value::Null, Value::Number)
            }
            EntityProperty::DateTime(dt) => Value::String(dt.to_rfc3339()),
            EntityProperty::Guid(id) => Value::String(id.to_string()),
            EntityProperty::Binary(bytes) => Value::String(STANDARD.encode(bytes)),
        }
    }

    /// EDM type name of the property
    pub fn edm_type(&self) -> &'static str {
        match self {
            EntityProperty::String(_) => "Edm.String",
            EntityProperty::Boolean(_) => "Edm.Boolean",
            EntityProperty::Int32(_) => "Edm.Int32",
            EntityProperty::Int64(_) => "Edm.Int64",
            EntityProperty::Double(_) => "Edm.Double",
            EntityProperty::DateTime(_) => "Edm.DateTime",
            EntityProperty::Guid(_) => "Edm.Guid",
            EntityProperty::Binary(_) => "Edm.Binary",
        }
    }

    /// Returns `true` if [`from_json`](Self::from_json) would not infer the
    /// same type back from [`to_json`](Self::to_json)
    fn needs_annotation(&self) -> bool {
        match self {
            EntityProperty::Int64(n) => i32::try_from(*n).is_ok(),
            EntityProperty::DateTime(_) | EntityProperty::Guid(_) | EntityProperty::Binary(_) => {
                true
            }
            _ => false,
        }
    }

    /// Reads a property whose type is given by an EDM type name
    ///
    /// `Edm.Int64` also accepts a decimal string. `null` yields `None`.
    pub fn from_typed_json(name: &str, value: Value, edm_type: &str) -> Result<Option<Self>> {
        if value.is_null() {
            return Ok(None);
        }
        let invalid = || {
            StowageError::Serialization(format!("Property '{name}' is not a valid {edm_type}"))
        };

        let property = match (edm_type, value) {
            ("Edm.String", Value::String(s)) => EntityProperty::String(s),
            ("Edm.Boolean", Value::Bool(b)) => EntityProperty::Boolean(b),
            ("Edm.Int32", Value::Number(n)) => EntityProperty::Int32(
                n.as_i64()
                    .and_then(|i| i32::try_from(i).ok())
                    .ok_or_else(invalid)?,
            ),
            ("Edm.Int64", Value::Number(n)) => EntityProperty::Int64(n.as_i64().ok_or_else(invalid)?),
            ("Edm.Int64", Value::String(s)) => {
                EntityProperty::Int64(s.parse().map_err(|_| invalid())?)
            }
            ("Edm.Double", Value::Number(n)) => EntityProperty::Double(n.as_f64().ok_or_else(invalid)?),
            ("Edm.DateTime", Value::String(s)) => EntityProperty::DateTime(
                DateTime::parse_from_rfc3339(&s)
                    .map_err(|_| invalid())?
                    .with_timezone(&Utc),
            ),
            ("Edm.Guid", Value::String(s)) => {
                EntityProperty::Guid(Uuid::parse_str(&s).map_err(|_| invalid())?)
            }
            ("Edm.Binary", Value::String(s)) => {
                EntityProperty::Binary(STANDARD.decode(s).map_err(|_| invalid())?)
            }
            _ => return Err(invalid()),
        };
        Ok(Some(property))
    }

    /// Infers a property from a JSON scalar
    ///
    /// Integers that fit in 32 bits become `Int32`, larger ones `Int64`.
    /// `null` yields `None`. Arrays and objects are rejected.
    pub fn from_json(name: &str, value: Value) -> Result<Option<Self>> {
        let property = match value {
            Value::Null => return Ok(None),
            Value::Bool(b) => EntityProperty::Boolean(b),
            Value::String(s) => EntityProperty::String(s),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    match i32::try_from(i) {
                        Ok(small) => EntityProperty::Int32(small),
                        Err(_) => EntityProperty::Int64(i),
                    }
                } else if let Some(f) = n.as_f64() {
                    EntityProperty::Double(f)
                } else {
                    return Err(StowageError::Serialization(format!(
                        "Property '{name}' holds a number outside the supported range: {n}"
                    )));
                }
            }
            Value::Array(_) | Value::Object(_) => {
                return Err(StowageError::Serialization(format!(
                    "Property '{name}' must be a scalar value"
                )))
            }
        };
        Ok(Some(property))
    }
}

macro_rules! impl_property_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for EntityProperty {
                fn from(value: $ty) -> Self {
                    EntityProperty::$variant(value.into())
                }
            }
        )*
    };
}

impl_property_from!(
    String => String,
    &str => String,
    bool => Boolean,
    i32 => Int32,
    i64 => Int64,
    f64 => Double,
    DateTime<Utc> => DateTime,
    Uuid => Guid,
    Vec<u8> => Binary,
);

/// A table row keyed by (partition key, row key)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    partition_key: String,
    row_key: String,

    /// Last modification time assigned by the server
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,

    /// Concurrency tag assigned by the server
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,

    #[serde(default)]
    properties: BTreeMap<String, EntityProperty>,
}

impl Entity {
    /// Creates an entity with no properties
    pub fn new(partition_key: impl Into<String>, row_key: impl Into<String>) -> Self {
        Self {
            partition_key: partition_key.into(),
            row_key: row_key.into(),
            timestamp: None,
            etag: None,
            properties: BTreeMap::new(),
        }
    }

    /// Adds a property, consuming and returning the entity
    pub fn with(mut self, name: impl Into<String>, value: impl Into<EntityProperty>) -> Self {
        self.set(name, value);
        self
    }

    /// Partition key
    pub fn partition_key(&self) -> &str {
        &self.partition_key
    }

    /// Row key
    pub fn row_key(&self) -> &str {
        &self.row_key
    }

    /// (partition key, row key) pair
    pub fn key(&self) -> (&str, &str) {
        (&self.partition_key, &self.row_key)
    }

    /// Sets a property, returning the previous value
    pub fn set(
        &mut self,
        name: impl Into<String>,
        value: impl Into<EntityProperty>,
    ) -> Option<EntityProperty> {
        self.properties.insert(name.into(), value.into())
    }

    /// Gets a property by name
    pub fn get(&self, name: &str) -> Option<&EntityProperty> {
        self.properties.get(name)
    }

    /// Removes a property by name
    pub fn remove(&mut self, name: &str) -> Option<EntityProperty> {
        self.properties.remove(name)
    }

    /// All properties in name order
    pub fn properties(&self) -> &BTreeMap<String, EntityProperty> {
        &self.properties
    }

    /// Copies every property of `other` into this entity, overwriting
    /// properties with the same name and keeping the rest
    pub fn merge_from(&mut self, other: &Entity) {
        for (name, value) in &other.properties {
            self.properties.insert(name.clone(), value.clone());
        }
    }

    /// Converts the entity to a flat JSON object with key and system columns
    ///
    /// Properties whose type cannot be inferred from their JSON value (dates,
    /// GUIDs, binary values and 64-bit integers small enough to pass as
    /// 32-bit ones) are followed by a `Name@odata.type` annotation, so
    /// [`from_json`](Self::from_json) restores the same types.
    pub fn to_json(&self) -> Value {
        self.to_object(true)
    }

    fn to_object(&self, annotate: bool) -> Value {
        let mut map = Map::new();
        map.insert(PARTITION_KEY.to_string(), Value::String(self.partition_key.clone()));
        map.insert(ROW_KEY.to_string(), Value::String(self.row_key.clone()));
        if let Some(ts) = self.timestamp {
            map.insert(TIMESTAMP.to_string(), Value::String(ts.to_rfc3339()));
        }
        if let Some(ref etag) = self.etag {
            map.insert(ETAG.to_string(), Value::String(etag.clone()));
        }
        for (name, value) in &self.properties {
            map.insert(name.clone(), value.to_json());
            if annotate && value.needs_annotation() {
                map.insert(
                    format!("{name}{TYPE_ANNOTATION_SUFFIX}"),
                    Value::String(value.edm_type().to_string()),
                );
            }
        }
        Value::Object(map)
    }

    /// Builds an entity from a flat JSON object
    ///
    /// `PartitionKey` and `RowKey` must be present as strings. `Timestamp` and
    /// `ETag` are server-assigned and ignored. A property with a
    /// `Name@odata.type` annotation takes the annotated type; others are
    /// inferred from their JSON value.
    pub fn from_json(value: Value) -> Result<Self> {
        let Value::Object(mut map) = value else {
            return Err(StowageError::Serialization(
                "Entity must be a JSON object".to_string(),
            ));
        };

        let partition_key = take_key(&mut map, PARTITION_KEY)?;
        let row_key = take_key(&mut map, ROW_KEY)?;
        map.remove(TIMESTAMP);
        map.remove(ETAG);

        let annotated: Vec<String> = map
            .keys()
            .filter(|key| key.ends_with(TYPE_ANNOTATION_SUFFIX))
            .cloned()
            .collect();
        let mut types = BTreeMap::new();
        for key in annotated {
            let name = key.trim_end_matches(TYPE_ANNOTATION_SUFFIX).to_string();
            match map.remove(&key) {
                Some(Value::String(edm_type)) => {
                    types.insert(name, edm_type);
                }
                _ => {
                    return Err(StowageError::Serialization(format!(
                        "{key} must be a string"
                    )))
                }
            }
        }

        let mut entity = Entity::new(partition_key, row_key);
        for (name, value) in map {
            let property = match types.get(&name) {
                Some(edm_type) => EntityProperty::from_typed_json(&name, value, edm_type)?,
                None => EntityProperty::from_json(&name, value)?,
            };
            if let Some(property) = property {
                entity.properties.insert(name, property);
            }
        }
        Ok(entity)
    }

    /// Builds an entity from any serializable record with `PartitionKey` and
    /// `RowKey` fields
    pub fn from_record<T: Serialize>(record: &T) -> Result<Self> {
        Self::from_json(serde_json::to_value(record)?)
    }

    /// Deserializes the entity into a record type
    pub fn to_record<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_value(self.to_object(false))?)
    }
}

fn take_key(map: &mut Map<String, Value>, name: &str) -> Result<String> {
    match map.remove(name) {
        Some(Value::String(key)) => Ok(key),
        Some(_) => Err(StowageError::Serialization(format!(
            "{name} must be a string"
        ))),
        None => Err(StowageError::Serialization(format!(
            "Entity is missing required {name}"
        ))),
    }
}

/// A single table mutation or lookup, tagged with its kind
#[derive(Debug, Clone, PartialEq)]
pub enum EntityOperation {
    /// Insert; conflicts if the key exists
    Insert(Entity),
    /// Insert, or replace an existing entity entirely
    InsertOrReplace(Entity),
    /// Insert, or merge properties into an existing entity
    InsertOrMerge(Entity),
    /// Replace an existing entity entirely; fails if absent
    Replace(Entity),
    /// Merge properties into an existing entity; fails if absent
    Merge(Entity),
    /// Delete an existing entity; fails if absent
    Delete(Entity),
    /// Point lookup
    Retrieve {
        partition_key: String,
        row_key: String,
    },
}

impl EntityOperation {
    /// Operation name used in logs
    pub fn name(&self) -> &'static str {
        match self {
            EntityOperation::Insert(_) => "insert",
            EntityOperation::InsertOrReplace(_) => "insert_or_replace",
            EntityOperation::InsertOrMerge(_) => "insert_or_merge",
            EntityOperation::Replace(_) => "replace",
            EntityOperation::Merge(_) => "merge",
            EntityOperation::Delete(_) => "delete",
            EntityOperation::Retrieve { .. } => "retrieve",
        }
    }

    /// (partition key, row key) targeted by the operation
    pub fn key(&self) -> (&str, &str) {
        match self {
            EntityOperation::Insert(e)
            | EntityOperation::InsertOrReplace(e)
            | EntityOperation::InsertOrMerge(e)
            | EntityOperation::Replace(e)
            | EntityOperation::Merge(e)
            | EntityOperation::Delete(e) => e.key(),
            EntityOperation::Retrieve {
                partition_key,
                row_key,
            } => (partition_key, row_key),
        }
    }
}

/// Uniform operation kind applied to every entity of a batch call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchKind {
    Insert,
    Upsert,
    Replace,
    /// Insert-or-merge, matching the upsert flavour of `Upsert`
    Merge,
    Delete,
}

impl BatchKind {
    /// Wraps an entity in the operation this kind stands for
    pub fn operation(self, entity: Entity) -> EntityOperation {
        match self {
            BatchKind::Insert => EntityOperation::Insert(entity),
            BatchKind::Upsert => EntityOperation::InsertOrReplace(entity),
            BatchKind::Replace => EntityOperation::Replace(entity),
            BatchKind::Merge => EntityOperation::InsertOrMerge(entity),
            BatchKind::Delete => EntityOperation::Delete(entity),
        }
    }

    /// Lowercase name of the kind
    pub fn as_str(&self) -> &'static str {
        match self {
            BatchKind::Insert => "insert",
            BatchKind::Upsert => "upsert",
            BatchKind::Replace => "replace",
            BatchKind::Merge => "merge",
            BatchKind::Delete => "delete",
        }
    }
}

impl fmt::Display for BatchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BatchKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "insert" => Ok(BatchKind::Insert),
            "upsert" => Ok(BatchKind::Upsert),
            "replace" => Ok(BatchKind::Replace),
            "merge" => Ok(BatchKind::Merge),
            "delete" => Ok(BatchKind::Delete),
            _ => Err(format!(
                "Invalid batch kind '{s}'. Must be one of: insert, upsert, replace, merge, delete"
            )),
        }
    }
}

/// Outcome of a single table operation
///
/// Carries the raw backend status so callers can branch on it; absence of an
/// entity is a 404 result rather than an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableResult {
    /// HTTP-style status code reported by the backend
    pub status: u16,

    /// Entity returned by the operation, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity: Option<Entity>,

    /// ETag of the affected entity, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
}

impl TableResult {
    /// Result with a status and no payload
    pub fn with_status(status: u16) -> Self {
        Self {
            status,
            entity: None,
            etag: None,
        }
    }

    /// Result carrying an entity; the ETag is taken from the entity
    pub fn with_entity(status: u16, entity: Entity) -> Self {
        Self {
            status,
            etag: entity.etag.clone(),
            entity: Some(entity),
        }
    }

    /// 404 result
    pub fn not_found() -> Self {
        Self::with_status(status::NOT_FOUND)
    }

    /// Returns `true` for 2xx statuses
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Returns `true` for a 404 status
    pub fn is_not_found(&self) -> bool {
        self.status == status::NOT_FOUND
    }

    /// Entity of a successful lookup, or the status code otherwise
    pub fn into_entity(self) -> std::result::Result<Entity, u16> {
        match self.entity {
            Some(entity) if self.is_success() => Ok(entity),
            _ => Err(self.status),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_entity_builder_and_accessors() {
        let entity = Entity::new("pk", "rk")
            .with("Name", "alpha")
            .with("Count", 3)
            .with("Active", true);

        assert_eq!(entity.key(), ("pk", "rk"));
        assert_eq!(entity.get("Name").and_then(|p| p.as_str()), Some("alpha"));
        assert_eq!(entity.get("Count"), Some(&EntityProperty::Int32(3)));
        assert_eq!(entity.properties().len(), 3);
    }

    #[test]
    fn test_merge_from_overwrites_and_keeps() {
        let mut server = Entity::new("pk", "rk").with("A", 1).with("B", 2);
        let local = Entity::new("pk", "rk").with("B", 20).with("C", 30);
        server.merge_from(&local);

        assert_eq!(server.get("A"), Some(&EntityProperty::Int32(1)));
        assert_eq!(server.get("B"), Some(&EntityProperty::Int32(20)));
        assert_eq!(server.get("C"), Some(&EntityProperty::Int32(30)));
    }

    #[test]
    fn test_from_json_infers_types() {
        let entity = Entity::from_json(json!({
            "PartitionKey": "p",
            "RowKey": "r",
            "Timestamp": "2024-01-01T00:00:00Z",
            "Small": 7,
            "Large": 5_000_000_000i64,
            "Ratio": 0.5,
            "Flag": false,
            "Missing": null
        }))
        .unwrap();

        assert_eq!(entity.get("Small"), Some(&EntityProperty::Int32(7)));
        assert_eq!(
            entity.get("Large"),
            Some(&EntityProperty::Int64(5_000_000_000))
        );
        assert_eq!(entity.get("Ratio"), Some(&EntityProperty::Double(0.5)));
        assert_eq!(entity.get("Flag"), Some(&EntityProperty::Boolean(false)));
        assert!(entity.get("Missing").is_none());
        assert!(entity.get("Timestamp").is_none());
        assert!(entity.timestamp.is_none());
    }

    #[test]
    fn test_from_json_requires_keys() {
        assert!(Entity::from_json(json!({"RowKey": "r"})).is_err());
        assert!(Entity::from_json(json!({"PartitionKey": 1, "RowKey": "r"})).is_err());
        assert!(Entity::from_json(json!(["not", "an", "object"])).is_err());
        assert!(Entity::from_json(json!({
            "PartitionKey": "p",
            "RowKey": "r",
            "Nested": {"a": 1}
        }))
        .is_err());
    }

    #[test]
    fn test_binary_and_guid_to_json() {
        let id = Uuid::nil();
        let entity = Entity::new("p", "r")
            .with("Blob", vec![1u8, 2, 3])
            .with("Id", id);
        let json = entity.to_json();

        assert_eq!(json["Blob"], json!("AQID"));
        assert_eq!(json["Blob@odata.type"], json!("Edm.Binary"));
        assert_eq!(json["Id"], json!("00000000-0000-0000-0000-000000000000"));
        assert_eq!(json["Id@odata.type"], json!("Edm.Guid"));
    }

    #[test]
    fn test_json_export_restores_types_on_import() {
        let when = DateTime::parse_from_rfc3339("2024-05-06T07:08:09.123Z")
            .unwrap()
            .with_timezone(&Utc);
        let entity = Entity::new("p", "r")
            .with("Name", "alpha")
            .with("Small", 7)
            .with("SmallWide", 7i64)
            .with("Wide", 5_000_000_000i64)
            .with("Ratio", 0.5)
            .with("When", when)
            .with("Id", Uuid::nil())
            .with("Blob", vec![1u8, 2, 3]);

        let json = entity.to_json();
        assert!(json.get("Name@odata.type").is_none());
        assert!(json.get("Small@odata.type").is_none());
        assert_eq!(json["SmallWide@odata.type"], json!("Edm.Int64"));

        let back = Entity::from_json(json).unwrap();
        assert_eq!(back.properties(), entity.properties());
    }

    #[test]
    fn test_from_json_honours_annotations() {
        let entity = Entity::from_json(json!({
            "PartitionKey": "p",
            "RowKey": "r",
            "Count": "42",
            "Count@odata.type": "Edm.Int64",
            "Ratio": 2,
            "Ratio@odata.type": "Edm.Double"
        }))
        .unwrap();
        assert_eq!(entity.get("Count"), Some(&EntityProperty::Int64(42)));
        assert_eq!(entity.get("Ratio"), Some(&EntityProperty::Double(2.0)));
        assert!(entity.get("Count@odata.type").is_none());

        let bad = Entity::from_json(json!({
            "PartitionKey": "p",
            "RowKey": "r",
            "Id": "not-a-guid",
            "Id@odata.type": "Edm.Guid"
        }));
        assert!(matches!(bad, Err(StowageError::Serialization(_))));
    }

    #[test]
    fn test_to_record_ignores_annotations() {
        #[derive(Deserialize)]
        #[serde(rename_all = "PascalCase", deny_unknown_fields)]
        struct Row {
            partition_key: String,
            row_key: String,
            size: i64,
        }

        let row: Row = Entity::new("p", "r").with("Size", 3i64).to_record().unwrap();
        assert_eq!((row.partition_key.as_str(), row.row_key.as_str()), ("p", "r"));
        assert_eq!(row.size, 3);
    }

    #[test]
    fn test_batch_kind_mapping() {
        let e = Entity::new("p", "r");
        assert!(matches!(
            BatchKind::Upsert.operation(e.clone()),
            EntityOperation::InsertOrReplace(_)
        ));
        assert!(matches!(
            BatchKind::Merge.operation(e.clone()),
            EntityOperation::InsertOrMerge(_)
        ));
        assert!(matches!(
            BatchKind::Delete.operation(e),
            EntityOperation::Delete(_)
        ));
    }

    #[test]
    fn test_batch_kind_from_str() {
        assert_eq!("UPSERT".parse::<BatchKind>().unwrap(), BatchKind::Upsert);
        assert_eq!(BatchKind::Merge.to_string(), "merge");
        assert!("mixed".parse::<BatchKind>().is_err());
    }

    #[test]
    fn test_table_result_into_entity() {
        let found = TableResult::with_entity(status::OK, Entity::new("p", "r"));
        assert!(found.is_success());
        assert_eq!(found.into_entity().unwrap().row_key(), "r");

        let missing = TableResult::not_found();
        assert!(missing.is_not_found());
        assert_eq!(missing.into_entity(), Err(404));
    }

    #[test]
    fn test_operation_key_and_name() {
        let op = EntityOperation::Retrieve {
            partition_key: "p".to_string(),
            row_key: "r".to_string(),
        };
        assert_eq!(op.key(), ("p", "r"));
        assert_eq!(op.name(), "retrieve");
    }
}
