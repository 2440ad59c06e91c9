use super::settings::EntityRef;
use eventtap_core::UpsertDirective;
use serde::{Deserialize, Serialize};

pub const EVENTS_TABLE: &str = "github_events";

/// One item of the repository events feed. Only the fields the connector keeps.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawEvent {
    pub id: String,
    #[serde(default = "empty_object")]
    pub payload: serde_json::Value,
    pub created_at: String,
}

fn empty_object() -> serde_json::Value {
    serde_json::Value::Object(serde_json::Map::new())
}

/// Normalized row written to `github_events`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventRecord {
    pub event_id: String,
    pub payload: serde_json::Value,
    pub created_at: String,
    pub repo: String,
}

impl EventRecord {
    pub fn from_raw(raw: RawEvent, repo: &EntityRef) -> Self {
        Self {
            event_id: raw.id,
            payload: raw.payload,
            created_at: raw.created_at,
            repo: repo.to_string(),
        }
    }

    pub fn into_upsert(self) -> UpsertDirective {
        let mut fields = serde_json::Map::with_capacity(4);
        fields.insert("event_id".to_string(), serde_json::Value::String(self.event_id));
        fields.insert("payload".to_string(), self.payload);
        fields.insert(
            "created_at".to_string(),
            serde_json::Value::String(self.created_at),
        );
        fields.insert("repo".to_string(), serde_json::Value::String(self.repo));
        UpsertDirective::new(EVENTS_TABLE, fields)
    }
}

/// Order-preserving transform of one entity's feed page.
pub fn to_records(events: Vec<RawEvent>, repo: &EntityRef) -> Vec<EventRecord> {
    events
        .into_iter()
        .map(|raw| EventRecord::from_raw(raw, repo))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_payload_becomes_empty_object() {
        let raw: RawEvent =
            serde_json::from_value(json!({"id":"42","created_at":"2024-01-01T00:00:00Z"}))
                .unwrap();
        let rec = EventRecord::from_raw(raw, &EntityRef::new("owner", "name"));
        assert_eq!(
            rec,
            EventRecord {
                event_id: "42".to_string(),
                payload: json!({}),
                created_at: "2024-01-01T00:00:00Z".to_string(),
                repo: "owner/name".to_string(),
            }
        );
    }

    #[test]
    fn missing_required_fields_fail_to_decode() {
        assert!(serde_json::from_value::<RawEvent>(json!({"created_at":"x"})).is_err());
        assert!(serde_json::from_value::<RawEvent>(json!({"id":"1"})).is_err());
    }

    #[test]
    fn extra_fields_are_ignored_and_payload_kept_verbatim() {
        let raw: RawEvent = serde_json::from_value(json!({
            "id": "7",
            "type": "PushEvent",
            "actor": {"login": "octocat"},
            "payload": {"ref": "refs/heads/main", "size": 1},
            "created_at": "2024-02-02T10:00:00Z"
        }))
        .unwrap();
        let up = EventRecord::from_raw(raw, &EntityRef::new("acme", "widgets")).into_upsert();
        assert_eq!(up.table, EVENTS_TABLE);
        assert_eq!(up.field("event_id"), Some(&json!("7")));
        assert_eq!(up.field("payload"), Some(&json!({"ref": "refs/heads/main", "size": 1})));
        assert_eq!(up.field("repo"), Some(&json!("acme/widgets")));
        assert_eq!(up.fields.len(), 4);
    }

    #[test]
    fn to_records_preserves_feed_order() {
        let events = vec![
            RawEvent {
                id: "3".to_string(),
                payload: json!({}),
                created_at: "2024-01-03T00:00:00Z".to_string(),
            },
            RawEvent {
                id: "1".to_string(),
                payload: json!({}),
                created_at: "2024-01-01T00:00:00Z".to_string(),
            },
        ];
        let ids: Vec<String> = to_records(events, &EntityRef::new("a", "b"))
            .into_iter()
            .map(|r| r.event_id)
            .collect();
        assert_eq!(ids, vec!["3", "1"]);
    }
}
