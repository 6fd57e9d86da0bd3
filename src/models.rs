use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A calendar event. `start < end` is the caller's responsibility.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    #[serde(default)]
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

impl Event {
    /// Create an event with a fresh unique identifier
    pub fn new(title: impl Into<String>, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Event {
            id: Uuid::new_v4().to_string(),
            title: title.into(),
            description: None,
            start,
            end,
            color: None,
            location: None,
        }
    }
}

/// Who sent a transcript message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Assistant,
}

/// A chat transcript entry. Append-only, in-memory only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub text: String,
    pub sender: Sender,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    pub fn new(text: impl Into<String>, sender: Sender) -> Self {
        Message {
            id: Uuid::new_v4().to_string(),
            text: text.into(),
            sender,
            timestamp: Utc::now(),
        }
    }
}

/// Outcome of interpreting a user message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub events: Option<Vec<Event>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestions: Option<Vec<String>>,
}

impl AssistantResponse {
    /// A failure response with a user-facing message and nothing else
    pub fn failure(message: impl Into<String>) -> Self {
        AssistantResponse {
            success: false,
            message: Some(message.into()),
            events: None,
            suggestions: None,
        }
    }
}

/// An event as the model emits it: no id, zoneless datetimes
#[derive(Debug, Clone, Deserialize)]
pub struct ExtractedEvent {
    pub title: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
}

impl ExtractedEvent {
    /// Turn the extraction into a stored event, assigning a fresh id and
    /// interpreting the zoneless datetimes in the given timezone.
    pub fn into_event(self, tz: Tz) -> Event {
        Event {
            id: Uuid::new_v4().to_string(),
            title: self.title,
            description: self.description,
            start: resolve_local(self.start, tz),
            end: resolve_local(self.end, tz),
            color: None,
            location: self.location,
        }
    }
}

/// Resolve a zoneless datetime in `tz`, taking the earlier instant when the
/// local time is ambiguous and treating nonexistent local times as UTC.
fn resolve_local(naive: NaiveDateTime, tz: Tz) -> DateTime<Utc> {
    tz.from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|| Utc.from_utc_datetime(&naive))
}

/// The JSON shape the model is instructed to reply with
#[derive(Debug, Clone, Deserialize)]
pub struct ModelReply {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub events: Option<Vec<ExtractedEvent>>,
    #[serde(default)]
    pub suggestions: Option<Vec<String>>,
}
