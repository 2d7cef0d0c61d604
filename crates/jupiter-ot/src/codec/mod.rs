//! JSON wire codec for [`Activity`] envelopes.
//!
//! The wire shape is language-neutral:
//!
//! ```json
//! { "operation": { "kind": "insert", "position": 3, "text": "f" },
//!   "timestamp": { "local": 1, "remote": 0 },
//!   "sourceSiteId": "client-a",
//!   "targetPath": "/shared/readme.txt" }
//! ```
//!
//! Operation kinds: `insert`, `delete`, `noop`, and `split` (whose `parts`
//! array nests further operation objects). Decoding is strict: malformed
//! payloads are rejected, never repaired, since a repaired edit is a silent
//! divergence.

use serde_json::{Map, Value};

use crate::activity::Activity;
use crate::operation::Operation;
use crate::timestamp::Timestamp;

#[derive(Debug, thiserror::Error)]
pub enum WireCodecError {
    #[error("payload is not a JSON object")]
    NotAnObject,
    #[error("missing field: {0}")]
    MissingField(&'static str),
    #[error("invalid field: {0}")]
    InvalidField(&'static str),
    #[error("unknown operation kind: {0}")]
    UnknownKind(String),
}

// ── Encoding ────────────────────────────────────────────────────────────────

fn operation_to_wire(op: &Operation) -> Value {
    let mut row = Map::new();
    match op {
        Operation::Insert { position, text } => {
            row.insert("kind".to_string(), Value::from("insert"));
            row.insert("position".to_string(), Value::from(*position));
            row.insert("text".to_string(), Value::from(text.as_str()));
        }
        Operation::Delete { position, text } => {
            row.insert("kind".to_string(), Value::from("delete"));
            row.insert("position".to_string(), Value::from(*position));
            row.insert("text".to_string(), Value::from(text.as_str()));
        }
        Operation::NoOperation => {
            row.insert("kind".to_string(), Value::from("noop"));
        }
        Operation::Split(parts) => {
            row.insert("kind".to_string(), Value::from("split"));
            row.insert(
                "parts".to_string(),
                Value::Array(parts.iter().map(operation_to_wire).collect()),
            );
        }
    }
    Value::Object(row)
}

pub fn encode_activity(activity: &Activity) -> Value {
    let mut ts = Map::new();
    ts.insert("local".to_string(), Value::from(activity.timestamp.local));
    ts.insert("remote".to_string(), Value::from(activity.timestamp.remote));

    let mut root = Map::new();
    root.insert(
        "operation".to_string(),
        operation_to_wire(&activity.operation),
    );
    root.insert("timestamp".to_string(), Value::Object(ts));
    root.insert(
        "sourceSiteId".to_string(),
        Value::from(activity.source_site_id.as_str()),
    );
    root.insert(
        "targetPath".to_string(),
        Value::from(activity.target_path.as_str()),
    );
    Value::Object(root)
}

// ── Decoding ────────────────────────────────────────────────────────────────

fn field<'a>(obj: &'a Map<String, Value>, name: &'static str) -> Result<&'a Value, WireCodecError> {
    obj.get(name).ok_or(WireCodecError::MissingField(name))
}

fn as_usize(v: &Value, name: &'static str) -> Result<usize, WireCodecError> {
    v.as_u64()
        .and_then(|n| usize::try_from(n).ok())
        .ok_or(WireCodecError::InvalidField(name))
}

fn as_str<'a>(v: &'a Value, name: &'static str) -> Result<&'a str, WireCodecError> {
    v.as_str().ok_or(WireCodecError::InvalidField(name))
}

fn wire_to_operation(v: &Value) -> Result<Operation, WireCodecError> {
    let obj = v.as_object().ok_or(WireCodecError::NotAnObject)?;
    let kind = as_str(field(obj, "kind")?, "kind")?;
    match kind {
        "insert" => Ok(Operation::Insert {
            position: as_usize(field(obj, "position")?, "position")?,
            text: as_str(field(obj, "text")?, "text")?.to_string(),
        }),
        "delete" => Ok(Operation::Delete {
            position: as_usize(field(obj, "position")?, "position")?,
            text: as_str(field(obj, "text")?, "text")?.to_string(),
        }),
        "noop" => Ok(Operation::NoOperation),
        "split" => {
            let parts = field(obj, "parts")?
                .as_array()
                .ok_or(WireCodecError::InvalidField("parts"))?;
            Ok(Operation::Split(
                parts
                    .iter()
                    .map(wire_to_operation)
                    .collect::<Result<Vec<_>, _>>()?,
            ))
        }
        other => Err(WireCodecError::UnknownKind(other.to_string())),
    }
}

fn wire_to_timestamp(v: &Value) -> Result<Timestamp, WireCodecError> {
    let obj = v.as_object().ok_or(WireCodecError::NotAnObject)?;
    let local = field(obj, "local")?
        .as_u64()
        .and_then(|n| u32::try_from(n).ok())
        .ok_or(WireCodecError::InvalidField("local"))?;
    let remote = field(obj, "remote")?
        .as_u64()
        .and_then(|n| u32::try_from(n).ok())
        .ok_or(WireCodecError::InvalidField("remote"))?;
    Ok(Timestamp::new(local, remote))
}

pub fn decode_activity(v: &Value) -> Result<Activity, WireCodecError> {
    let obj = v.as_object().ok_or(WireCodecError::NotAnObject)?;
    Ok(Activity {
        operation: wire_to_operation(field(obj, "operation")?)?,
        timestamp: wire_to_timestamp(field(obj, "timestamp")?)?,
        source_site_id: as_str(field(obj, "sourceSiteId")?, "sourceSiteId")?.to_string(),
        target_path: as_str(field(obj, "targetPath")?, "targetPath")?.to_string(),
    })
}
