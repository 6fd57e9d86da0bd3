use crate::config::Config;
use crate::conflict::check_conflicts;
use crate::error::{chat_api_error, AppResult};
use crate::models::{AssistantResponse, Event, ModelReply};
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;
use reqwest::header::AUTHORIZATION;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

const SYSTEM_PROMPT_TEMPLATE: &str = "You are an intelligent calendar assistant that helps users plan their schedule. Today's date is {today}.

Important rules:
1. When the user's information is incomplete, ask a question instead of making assumptions. For example:
   - If no end time is given, ask how long the event lasts or when it ends
   - If the time description is vague, ask for clarification
   - Never schedule an event longer than 4 hours unless the user explicitly says so

2. For common activity types, use reasonable default durations:
   - Meetings: 1-2 hours
   - Study sessions: 2 hours
   - Meals: 1-1.5 hours
   - Exercise: 1-2 hours

3. If no reasonable duration can be determined, ask the user instead of creating the event.

Parse the user's input and extract event information: title, start time, end time, location and description.
If the user gives a time without a date, assume today or the user's previously selected date: {selected_date}.

Reply with JSON only, using these fields:
{
  \"success\": true/false,
  \"message\": \"reply to the user\",
  \"events\": [
    {
      \"title\": \"event title\",
      \"start\": \"2023-08-15T14:00:00\",
      \"end\": \"2023-08-15T15:00:00\",
      \"location\": \"location (optional)\",
      \"description\": \"description (optional)\"
    }
  ]
}

If you need to ask the user for more information, set success to false, omit the events field, and put your question in message.";

/// Seam for sending a message through a chat-completion model
#[async_trait]
pub trait ChatCompletion: Send + Sync {
    /// Send a system prompt and user message, returning the raw content of
    /// the model's reply
    async fn complete(&self, system_prompt: &str, user_message: &str) -> AppResult<String>;
}

/// Direct client for the upstream chat-completion API
pub struct ChatApiClient {
    client: reqwest::Client,
    url: String,
    api_key: Option<String>,
    model: String,
    timeout: Duration,
}

impl ChatApiClient {
    pub fn new(config: &Config, client: reqwest::Client) -> Self {
        ChatApiClient {
            client,
            url: config.chat_api_url.clone(),
            api_key: config.chat_api_key.clone(),
            model: config.chat_model.clone(),
            timeout: Duration::from_secs(config.chat_timeout_secs),
        }
    }
}

#[async_trait]
impl ChatCompletion for ChatApiClient {
    async fn complete(&self, system_prompt: &str, user_message: &str) -> AppResult<String> {
        let api_key = self
            .api_key
            .as_ref()
            .ok_or_else(|| chat_api_error("VOLCES_API_KEY is not configured"))?;

        let body = json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": system_prompt },
                { "role": "user", "content": user_message }
            ]
        });

        let response = self
            .client
            .post(&self.url)
            .header(AUTHORIZATION, format!("Bearer {}", api_key))
            .json(&body)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| chat_api_error(&format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Could not read error response".to_string());
            return Err(chat_api_error(&format!(
                "HTTP {} - {}",
                status, error_body
            )));
        }

        let reply: Value = response
            .json()
            .await
            .map_err(|e| chat_api_error(&format!("Failed to parse response: {}", e)))?;

        reply
            .pointer("/choices/0/message/content")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
            .ok_or_else(|| chat_api_error("Response missing message content"))
    }
}

/// Interprets free-text user messages into calendar events
pub struct Assistant {
    chat: Arc<dyn ChatCompletion>,
    tz: Tz,
}

impl Assistant {
    pub fn new(chat: Arc<dyn ChatCompletion>, tz: Tz) -> Self {
        Assistant { chat, tz }
    }

    /// Analyze a user message against the existing events.
    ///
    /// Extracted events get fresh ids and are checked for conflicts; any
    /// conflict downgrades the whole response to a failure with three fixed
    /// suggestions. Transport or parse failures become fixed fallback
    /// replies, never errors.
    pub async fn analyze_message(
        &self,
        message: &str,
        existing_events: &[Event],
        selected_date: NaiveDate,
    ) -> AssistantResponse {
        let today = Utc::now().with_timezone(&self.tz).date_naive();
        let system_prompt = build_system_prompt(today, selected_date);

        let content = match self.chat.complete(&system_prompt, message).await {
            Ok(content) => content,
            Err(e) => {
                error!("Chat completion failed: {}", e);
                return AssistantResponse::failure(t!("assistant.unavailable"));
            }
        };

        let Some(reply) = parse_model_reply(&content) else {
            error!("Could not parse model reply as JSON");
            return AssistantResponse::failure(t!("assistant.unparseable"));
        };

        let mut response = AssistantResponse {
            success: reply.success,
            message: reply.message,
            events: None,
            suggestions: reply.suggestions,
        };

        if let Some(extracted) = reply.events {
            let events: Vec<Event> = extracted
                .into_iter()
                .map(|e| e.into_event(self.tz))
                .collect();

            for event in &events {
                let conflicts = check_conflicts(event, existing_events, self.tz);
                if !conflicts.is_empty() {
                    info!(
                        "Event \"{}\" conflicts with {} existing event(s)",
                        event.title,
                        conflicts.len()
                    );
                    response.success = false;
                    response.message = Some(
                        t!(
                            "assistant.conflict_found",
                            title = event.title,
                            conflicts = conflicts.join(", ")
                        )
                        .into_owned(),
                    );
                    response.suggestions = Some(vec![
                        t!("assistant.suggest_before", title = event.title).into_owned(),
                        t!("assistant.suggest_after", title = event.title).into_owned(),
                        t!("assistant.suggest_move").into_owned(),
                    ]);
                }
            }

            if !events.is_empty() {
                response.events = Some(events);
            }
        }

        response
    }
}

/// Build the fixed system instruction with today's date and the date the
/// user has selected in the calendar
pub fn build_system_prompt(today: NaiveDate, selected_date: NaiveDate) -> String {
    SYSTEM_PROMPT_TEMPLATE
        .replace("{today}", &today.format("%Y-%m-%d").to_string())
        .replace(
            "{selected_date}",
            &selected_date.format("%Y-%m-%d").to_string(),
        )
}

/// Attempt to parse the model reply as JSON.
///
/// Models sometimes wrap the JSON in prose or code fences, so first try the
/// outermost brace pair, then the whole string.
fn parse_model_reply(content: &str) -> Option<ModelReply> {
    if let (Some(start), Some(end)) = (content.find('{'), content.rfind('}')) {
        if start < end {
            if let Ok(reply) = serde_json::from_str::<ModelReply>(&content[start..=end]) {
                return Some(reply);
            }
        }
    }

    serde_json::from_str::<ModelReply>(content).ok()
}
