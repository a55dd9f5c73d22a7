//! Request payloads and the plain-JSON rendering of stored records.

use mongodb::bson::{Bson, Document};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use utoipa::ToSchema;

use crate::error::{BackofficeError, BackofficeResult};

/// Fields the server owns; dropped from any payload
pub const MANAGED_FIELDS: [&str; 3] = ["_id", "createdAt", "updatedAt"];

/// Arbitrary record fields for create and update.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(transparent)]
#[schema(value_type = Object, example = json!({ "name": "Ada Lovelace", "email": "ada@example.com" }))]
pub struct RecordPayload(pub Map<String, Value>);

impl RecordPayload {
    /// Validated BSON document with server-managed fields removed.
    ///
    /// Operator keys (`$set`, `$where`, ...) are rejected at any depth, and
    /// top-level dotted paths are rejected so a write cannot reach into a
    /// sub-document behind the field rules' back.
    pub fn into_document(self) -> BackofficeResult<Document> {
        let mut fields = self.0;
        for managed in MANAGED_FIELDS {
            fields.remove(managed);
        }

        for (key, value) in &fields {
            if key.contains('.') {
                return Err(BackofficeError::validation(format!(
                    "'{key}': nested paths are not accepted, send the whole sub-document"
                )));
            }
            reject_operators(key, value)?;
        }

        Ok(mongodb::bson::to_document(&fields)?)
    }
}

fn reject_operators(key: &str, value: &Value) -> BackofficeResult<()> {
    if key.starts_with('$') {
        return Err(BackofficeError::validation(format!("'{key}': keys may not start with '$'")));
    }
    match value {
        Value::Object(map) => map.iter().try_for_each(|(k, v)| reject_operators(k, v)),
        Value::Array(items) => items.iter().try_for_each(|v| reject_operators(key, v)),
        _ => Ok(()),
    }
}

/// Render a stored record as plain JSON.
///
/// ObjectIds become hex strings and datetimes RFC 3339 strings; everything
/// else follows relaxed extended JSON.
pub fn to_plain_json(record: &Document) -> Value {
    Value::Object(
        record
            .iter()
            .map(|(key, value)| (key.clone(), plain(value)))
            .collect(),
    )
}

fn plain(value: &Bson) -> Value {
    match value {
        Bson::ObjectId(id) => Value::String(id.to_hex()),
        Bson::DateTime(dt) => match dt.try_to_rfc3339_string() {
            Ok(s) => Value::String(s),
            Err(_) => json!(dt.timestamp_millis()),
        },
        Bson::Document(doc) => to_plain_json(doc),
        Bson::Array(items) => Value::Array(items.iter().map(plain).collect()),
        Bson::Int32(n) => json!(n),
        Bson::Int64(n) => json!(n),
        Bson::Decimal128(d) => Value::String(d.to_string()),
        other => other.clone().into_relaxed_extjson(),
    }
}

/// List response as documented in the API schema
#[derive(Debug, Serialize, ToSchema)]
pub struct RecordListResponse {
    pub success: bool,
    pub message: String,
    #[schema(value_type = Vec<Object>)]
    pub data: Vec<Value>,
    pub count: u64,
}

/// Single-record response as documented in the API schema
#[derive(Debug, Serialize, ToSchema)]
pub struct RecordResponse {
    pub success: bool,
    pub message: String,
    #[schema(value_type = Object)]
    pub data: Value,
}

/// Response without payload as documented in the API schema
#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::{DateTime, doc, oid::ObjectId};

    fn payload(value: Value) -> RecordPayload {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_managed_fields_are_dropped() {
        let doc = payload(json!({ "_id": "x", "createdAt": 1, "updatedAt": 2, "name": "Ada" }))
            .into_document()
            .unwrap();
        assert_eq!(doc, doc! { "name": "Ada" });
    }

    #[test]
    fn test_operator_keys_are_rejected_at_any_depth() {
        for body in [
            json!({ "$set": { "role": "root" } }),
            json!({ "address": { "$where": "sleep(1000)" } }),
            json!({ "tags": [{ "$gt": "" }] }),
        ] {
            assert!(matches!(
                payload(body.clone()).into_document(),
                Err(BackofficeError::Validation(_))
            ), "{body}");
        }
    }

    #[test]
    fn test_dotted_keys_are_rejected() {
        let err = payload(json!({ "password.hash": "x" })).into_document().unwrap_err();
        assert!(matches!(err, BackofficeError::Validation(_)));
    }

    #[test]
    fn test_plain_json_rendering() {
        let id = ObjectId::parse_str("65a1f0c2e4b0a1b2c3d4e5f6").unwrap();
        let record = doc! {
            "_id": id,
            "createdAt": DateTime::from_millis(1_704_067_200_000_i64),
            "price": 12.5,
            "qty": 3,
            "tags": ["a", { "ref": id }],
            "address": { "city": "Lisbon" },
        };

        assert_eq!(
            to_plain_json(&record),
            json!({
                "_id": "65a1f0c2e4b0a1b2c3d4e5f6",
                "createdAt": "2024-01-01T00:00:00Z",
                "price": 12.5,
                "qty": 3,
                "tags": ["a", { "ref": "65a1f0c2e4b0a1b2c3d4e5f6" }],
                "address": { "city": "Lisbon" },
            })
        );
    }
}
