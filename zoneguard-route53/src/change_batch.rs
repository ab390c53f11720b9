//! Change batch payloads

use serde::Serialize;
use serde_json::{json, Value as JsonValue};

/// TTL applied to generated service records
pub const DEFAULT_TTL: u32 = 300;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeAction {
    Create,
    Upsert,
    Delete,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
struct Change {
    action: ChangeAction,
    resource_record_set: JsonValue,
}

/// Ordered list of record changes submitted in one request
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ChangeBatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    comment: Option<String>,
    changes: Vec<Change>,
}

impl ChangeBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// One change per record set, all with the same action
    pub fn from_records(action: ChangeAction, record_sets: impl IntoIterator<Item = JsonValue>) -> Self {
        record_sets
            .into_iter()
            .fold(Self::new(), |batch, record_set| batch.with_change(action, record_set))
    }

    pub fn with_change(mut self, action: ChangeAction, record_set: JsonValue) -> Self {
        self.changes.push(Change {
            action,
            resource_record_set: record_set,
        });
        self
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn to_json(&self) -> JsonValue {
        // Every field serializes infallibly to a JSON value
        serde_json::to_value(self).unwrap_or(JsonValue::Null)
    }
}

/// `{service}.{domain}` where `domain` already ends with a dot
pub fn service_record_name(service: &str, domain: &str) -> String {
    format!("{}.{}", service, domain)
}

/// A record for `{service}.{domain}` pointing at `target_ip`
pub fn service_a_record(service: &str, domain: &str, target_ip: &str) -> JsonValue {
    json!({
        "Name": service_record_name(service, domain),
        "Type": "A",
        "TTL": DEFAULT_TTL,
        "ResourceRecords": [{ "Value": target_ip }],
    })
}

/// Record identity used when deleting a service's A record
pub fn service_a_record_key(service: &str, domain: &str) -> JsonValue {
    json!({
        "Name": service_record_name(service, domain),
        "Type": "A",
    })
}
