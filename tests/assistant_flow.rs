use async_trait::async_trait;
use chrono::{NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;
use kalenda::assistant::{Assistant, ChatCompletion};
use kalenda::error::{chat_api_error, AppResult};
use kalenda::models::Event;
use std::sync::Arc;

/// Scripted chat-completion implementation for testing the orchestration
/// without a network
struct MockChat {
    script: MockReply,
}

enum MockReply {
    Content(&'static str),
    TransportFailure,
}

#[async_trait]
impl ChatCompletion for MockChat {
    async fn complete(&self, _system_prompt: &str, _user_message: &str) -> AppResult<String> {
        match &self.script {
            MockReply::Content(content) => Ok(content.to_string()),
            MockReply::TransportFailure => Err(chat_api_error("connection reset")),
        }
    }
}

fn assistant_with(script: MockReply) -> Assistant {
    Assistant::new(Arc::new(MockChat { script }), Tz::UTC)
}

fn existing_lunch() -> Event {
    Event {
        id: "lunch-1".to_string(),
        title: "Lunch".to_string(),
        description: None,
        start: Utc.with_ymd_and_hms(2025, 8, 15, 12, 0, 0).unwrap(),
        end: Utc.with_ymd_and_hms(2025, 8, 15, 13, 0, 0).unwrap(),
        color: None,
        location: None,
    }
}

fn selected_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 8, 15).unwrap()
}

const ONE_EVENT_REPLY: &str = r#"{
    "success": true,
    "message": "Scheduled your meeting.",
    "events": [
        {"title": "Team sync", "start": "2025-08-15T14:00:00", "end": "2025-08-15T15:00:00"}
    ]
}"#;

const CONFLICTING_REPLY: &str = r#"{
    "success": true,
    "message": "Scheduled your call.",
    "events": [
        {"title": "Client call", "start": "2025-08-15T12:30:00", "end": "2025-08-15T13:30:00"}
    ]
}"#;

const ADJACENT_REPLY: &str = r#"{
    "success": true,
    "message": "Scheduled your call.",
    "events": [
        {"title": "Client call", "start": "2025-08-15T13:00:00", "end": "2025-08-15T14:00:00"}
    ]
}"#;

#[tokio::test]
async fn extracted_events_get_fresh_ids() {
    rust_i18n::set_locale("en");
    let assistant = assistant_with(MockReply::Content(ONE_EVENT_REPLY));

    let response = assistant
        .analyze_message("team sync at 2pm", &[], selected_date())
        .await;

    assert!(response.success);
    assert_eq!(response.message.as_deref(), Some("Scheduled your meeting."));
    let events = response.events.unwrap();
    assert_eq!(events.len(), 1);
    assert!(!events[0].id.is_empty());
    assert_eq!(events[0].title, "Team sync");
    assert_eq!(
        events[0].start,
        Utc.with_ymd_and_hms(2025, 8, 15, 14, 0, 0).unwrap()
    );
}

#[tokio::test]
async fn conflicting_event_downgrades_the_whole_response() {
    rust_i18n::set_locale("en");
    let assistant = assistant_with(MockReply::Content(CONFLICTING_REPLY));

    let response = assistant
        .analyze_message("call at 12:30", &[existing_lunch()], selected_date())
        .await;

    assert!(!response.success);
    let message = response.message.unwrap();
    assert!(message.contains("Lunch"), "message was: {}", message);
    assert!(message.contains("12:00 - 13:00"), "message was: {}", message);
    let suggestions = response.suggestions.unwrap();
    assert_eq!(suggestions.len(), 3);
    // The extracted events are still returned for display
    assert_eq!(response.events.unwrap().len(), 1);
}

#[tokio::test]
async fn adjacent_event_is_not_a_conflict() {
    rust_i18n::set_locale("en");
    let assistant = assistant_with(MockReply::Content(ADJACENT_REPLY));

    let response = assistant
        .analyze_message("call at 1pm", &[existing_lunch()], selected_date())
        .await;

    assert!(response.success);
    assert!(response.suggestions.is_none());
}

#[tokio::test]
async fn unparseable_reply_becomes_fixed_fallback() {
    rust_i18n::set_locale("en");
    let assistant = assistant_with(MockReply::Content(
        "Sure! I'd be happy to help you schedule that.",
    ));

    let response = assistant
        .analyze_message("schedule something", &[], selected_date())
        .await;

    assert!(!response.success);
    assert_eq!(
        response.message.as_deref(),
        Some("Sorry, I could not understand your request. Please describe your schedule more explicitly.")
    );
    assert!(response.events.is_none());
}

#[tokio::test]
async fn transport_failure_becomes_unavailable_fallback() {
    rust_i18n::set_locale("en");
    let assistant = assistant_with(MockReply::TransportFailure);

    let response = assistant
        .analyze_message("schedule something", &[], selected_date())
        .await;

    assert!(!response.success);
    assert_eq!(
        response.message.as_deref(),
        Some("Sorry, the service is temporarily unavailable. Please try again later.")
    );
}

#[tokio::test]
async fn clarifying_question_passes_through() {
    rust_i18n::set_locale("en");
    let assistant = assistant_with(MockReply::Content(
        r#"{"success": false, "message": "How long should the meeting be?"}"#,
    ));

    let response = assistant
        .analyze_message("meeting tomorrow", &[], selected_date())
        .await;

    assert!(!response.success);
    assert_eq!(
        response.message.as_deref(),
        Some("How long should the meeting be?")
    );
    assert!(response.events.is_none());
}
