//! Audit trail of tie-format modifications.
//!
//! When the audit policy is active, every successful operation appends one
//! [`TieFormatModification`] to an append-only array kept in a named draw
//! extension. Event-scoped operations record against every draw of the
//! event.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;
use uuid::Uuid;

use tie_format_core::{DrawDefinition, Extension, Scope, Tournament};

use crate::propagate::Effect;

/// One recorded modification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TieFormatModification {
    pub id: Uuid,
    pub action: String,
    pub event_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub draw_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub structure_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub match_up_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection_id: Option<String>,
    /// Operation-specific change detail.
    #[serde(flatten)]
    pub detail: Map<String, Value>,
    pub created_at: DateTime<Utc>,
}

impl TieFormatModification {
    pub fn new(action: &str, scope: &Scope) -> Self {
        Self {
            id: Uuid::new_v4(),
            action: action.to_string(),
            event_id: scope.event_id().to_string(),
            draw_id: scope.draw_id().map(str::to_string),
            structure_id: scope.structure_id().map(str::to_string),
            match_up_id: scope.match_up_id().map(str::to_string),
            collection_id: None,
            detail: Map::new(),
            created_at: Utc::now(),
        }
    }

    /// Builder: name the collection the action concerns.
    pub fn with_collection(mut self, collection_id: impl Into<String>) -> Self {
        self.collection_id = Some(collection_id.into());
        self
    }

    /// Builder: add a detail field.
    pub fn with_detail(mut self, key: &str, value: impl Serialize) -> Self {
        let value = serde_json::to_value(value).unwrap_or_else(|err| {
            warn!(key, %err, "audit detail has no JSON form; recording null");
            Value::Null
        });
        self.detail.insert(key.to_string(), value);
        self
    }

    fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or_else(|err| {
            warn!(action = %self.action, %err, "audit record has no JSON form; recording null");
            Value::Null
        })
    }
}

/// Effects appending `record` to each draw the scope covers.
pub fn audit_effects(
    tournament: &Tournament,
    scope: &Scope,
    extension_name: &str,
    record: &TieFormatModification,
) -> Vec<Effect> {
    let draw_ids: Vec<String> = match scope.draw_id() {
        Some(draw_id) => vec![draw_id.to_string()],
        None => tournament
            .event(scope.event_id())
            .map(|e| e.draw_definitions.iter().map(|d| d.draw_id.clone()).collect())
            .unwrap_or_default(),
    };
    let value = record.to_value();
    draw_ids
        .into_iter()
        .map(|draw_id| Effect::AppendAudit {
            draw_id,
            extension_name: extension_name.to_string(),
            record: value.clone(),
        })
        .collect()
}

/// Append a record to the named extension, creating it if absent.
pub fn append_record(draw: &mut DrawDefinition, extension_name: &str, record: Value) {
    match draw.extensions.iter_mut().find(|e| e.name == extension_name) {
        Some(extension) => match &mut extension.value {
            Value::Array(records) => records.push(record),
            other => *other = Value::Array(vec![other.take(), record]),
        },
        None => draw.extensions.push(Extension {
            name: extension_name.to_string(),
            value: Value::Array(vec![record]),
        }),
    }
}

/// Records stored in a draw under the named extension.
pub fn modifications(draw: &DrawDefinition, extension_name: &str) -> Vec<TieFormatModification> {
    draw.extension(extension_name)
        .and_then(|e| e.value.as_array())
        .map(|records| {
            records
                .iter()
                .filter_map(|r| serde_json::from_value(r.clone()).ok())
                .collect()
        })
        .unwrap_or_default()
}
