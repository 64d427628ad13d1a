//! Core domain types for alertmate
//!
//! ## Terminology
//!
//! | Term | Definition |
//! |------|------------|
//! | **Event source** | The platform subsystem that delivers raw notifications to this process |
//! | **Source** | The application that posted the original notification (`source_id`) |
//! | **Capture** | Accepting one raw notification into the pipeline |
//! | **Forward** | Transmitting a captured event to the ingestion endpoint |
//!
//! [`RawEvent`] is what the event source hands us. [`Event`] is what we send;
//! it only exists for notifications that passed self-origin filtering.

use serde::{Deserialize, Serialize};

// ============================================
// Inbound
// ============================================

/// Optional fields attached to a raw notification.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Extras {
    /// Notification title
    #[serde(default)]
    pub title: Option<String>,
    /// Notification body text
    #[serde(default)]
    pub text: Option<String>,
}

/// A notification as delivered by the event source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawEvent {
    /// Identifier of the posting application
    pub source_id: String,
    /// Opaque key assigned by the event source
    pub key: String,
    /// Post time in the event source's epoch unit
    pub post_time: i64,
    /// Optional title/text payload
    #[serde(default)]
    pub extras: Extras,
}

impl RawEvent {
    /// Create a raw event with no extras
    pub fn new(source_id: impl Into<String>, key: impl Into<String>, post_time: i64) -> Self {
        Self {
            source_id: source_id.into(),
            key: key.into(),
            post_time,
            extras: Extras::default(),
        }
    }

    /// Attach a title
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.extras.title = Some(title.into());
        self
    }

    /// Attach body text
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.extras.text = Some(text.into());
        self
    }
}

/// Removal notice for a previously posted notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemovedEvent {
    pub source_id: String,
    #[serde(default)]
    pub key: Option<String>,
}

/// Envelope read from a line-oriented event source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceMessage {
    /// A notification was posted
    Posted(RawEvent),
    /// A notification was dismissed
    Removed(RemovedEvent),
}

// ============================================
// Outbound
// ============================================

/// Discriminator for the payload shape.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    #[default]
    Notification,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Notification => "notification",
        }
    }
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Title and message of a captured notification. Both may be empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payload {
    pub title: String,
    pub message: String,
}

/// One captured notification, ready to forward.
///
/// Serializes to the ingestion wire format:
///
/// ```json
/// {"id":"…","deviceId":"…","source":"…","type":"notification","timestamp":0,
///  "payload":{"title":"…","message":"…"}}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Opaque key from the event source
    pub id: String,
    /// Stable identifier of the capturing device
    #[serde(rename = "deviceId")]
    pub device_id: String,
    /// Posting application
    #[serde(rename = "source")]
    pub source_id: String,
    #[serde(rename = "type")]
    pub event_type: EventType,
    /// Producer-assigned post time (not the forwarding time)
    pub timestamp: i64,
    pub payload: Payload,
}

impl Event {
    /// Build an event from a raw notification, defaulting absent
    /// title/text to empty strings.
    pub fn from_raw(raw: RawEvent, device_id: impl Into<String>) -> Self {
        let RawEvent {
            source_id,
            key,
            post_time,
            extras,
        } = raw;

        Event {
            id: key,
            device_id: device_id.into(),
            source_id,
            event_type: EventType::Notification,
            timestamp: post_time,
            payload: Payload {
                title: extras.title.unwrap_or_default(),
                message: extras.text.unwrap_or_default(),
            },
        }
    }

    /// Serialize to the JSON request body
    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_raw_defaults_missing_text() {
        let raw = RawEvent::new("com.chat.app", "0|com.chat.app|7", 1_700_000_000_123);
        let event = Event::from_raw(raw, "device-1");

        assert_eq!(event.id, "0|com.chat.app|7");
        assert_eq!(event.device_id, "device-1");
        assert_eq!(event.source_id, "com.chat.app");
        assert_eq!(event.event_type, EventType::Notification);
        assert_eq!(event.timestamp, 1_700_000_000_123);
        assert_eq!(event.payload, Payload::default());
    }

    #[test]
    fn test_wire_format_shape() {
        let raw = RawEvent::new("app.a", "k1", 42)
            .with_title("Hi")
            .with_text("there");
        let body = Event::from_raw(raw, "dev").to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&body).unwrap();

        assert_eq!(
            value,
            serde_json::json!({
                "id": "k1",
                "deviceId": "dev",
                "source": "app.a",
                "type": "notification",
                "timestamp": 42,
                "payload": { "title": "Hi", "message": "there" }
            })
        );
    }

    #[test]
    fn test_body_parses_back_to_event() {
        let raw = RawEvent::new("app.b", "key|with|pipes", -5)
            .with_title("Ünïcode \"quoted\"")
            .with_text("line1\nline2");
        let event = Event::from_raw(raw, "dev");

        let parsed: Event = serde_json::from_str(&event.to_json().unwrap()).unwrap();
        assert_eq!(parsed.id, "key|with|pipes");
        assert_eq!(parsed.source_id, "app.b");
        assert_eq!(parsed.timestamp, -5);
        assert_eq!(parsed.payload.title, "Ünïcode \"quoted\"");
        assert_eq!(parsed.payload.message, "line1\nline2");
    }

    #[test]
    fn test_parse_source_messages() {
        let posted: SourceMessage = serde_json::from_str(
            r#"{"kind":"posted","source_id":"app.a","key":"k","post_time":1,"extras":{"title":"t"}}"#,
        )
        .unwrap();
        match posted {
            SourceMessage::Posted(raw) => {
                assert_eq!(raw.extras.title.as_deref(), Some("t"));
                assert!(raw.extras.text.is_none());
            }
            other => panic!("unexpected message: {:?}", other),
        }

        // extras may be omitted entirely
        let bare: SourceMessage =
            serde_json::from_str(r#"{"kind":"posted","source_id":"a","key":"k","post_time":1}"#)
                .unwrap();
        assert!(matches!(bare, SourceMessage::Posted(r) if r.extras == Extras::default()));

        let removed: SourceMessage =
            serde_json::from_str(r#"{"kind":"removed","source_id":"app.a"}"#).unwrap();
        assert_eq!(
            removed,
            SourceMessage::Removed(RemovedEvent {
                source_id: "app.a".to_string(),
                key: None,
            })
        );
    }

    #[test]
    fn test_event_type_as_str() {
        assert_eq!(EventType::Notification.as_str(), "notification");
        assert_eq!(EventType::Notification.to_string(), "notification");
    }
}
