use crate::assistant::Assistant;
use crate::config::Config;
use crate::models::{Event, Message, Sender};
use crate::proxy::chat::{chat_handler, method_not_allowed, ChatProxy};
use crate::proxy::map::{geocode_handler, route_handler, MapProxy};
use crate::store::EventStore;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::error;

/// Shared per-request state, threaded through every handler
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: Arc<EventStore>,
    pub chat_proxy: Arc<ChatProxy>,
    pub map_proxy: Arc<MapProxy>,
    pub assistant: Arc<Assistant>,
    /// Chat transcript for the current session; never persisted
    pub messages: Arc<RwLock<Vec<Message>>>,
}

/// Assemble the application router.
///
/// Every route carries permissive CORS (any origin may call the service,
/// preflight answered by the layer) and request tracing.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/chat", post(chat_handler).fallback(method_not_allowed))
        .route("/api/geocode", get(geocode_handler))
        .route("/api/route", get(route_handler))
        .route("/api/assistant", post(assistant_handler))
        .route("/api/messages", get(list_messages))
        .route("/api/events", get(list_events).post(create_event))
        .route(
            "/api/events/{id}",
            put(update_event).delete(delete_event),
        )
        .route("/health", get(health_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_handler() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Request body for `POST /api/assistant`
#[derive(Debug, Deserialize)]
pub struct AssistantRequest {
    pub message: String,
    /// Date the user has selected in the calendar; defaults to today
    pub selected_date: Option<NaiveDate>,
}

/// `POST /api/assistant`: interpret a free-text message against the stored
/// events. Extracted events are returned, not persisted; the caller adds
/// them through the events API once the user confirms.
async fn assistant_handler(
    State(state): State<AppState>,
    Json(request): Json<AssistantRequest>,
) -> Json<Value> {
    let selected_date = request.selected_date.unwrap_or_else(|| {
        Utc::now().with_timezone(&state.config.tz()).date_naive()
    });
    let existing = state.store.list().await;
    let response = state
        .assistant
        .analyze_message(&request.message, &existing, selected_date)
        .await;

    {
        let mut messages = state.messages.write().await;
        messages.push(Message::new(request.message, Sender::User));
        messages.push(Message::new(
            response.message.clone().unwrap_or_default(),
            Sender::Assistant,
        ));
    }

    Json(json!(response))
}

async fn list_messages(State(state): State<AppState>) -> Json<Vec<Message>> {
    Json(state.messages.read().await.clone())
}

async fn list_events(State(state): State<AppState>) -> Json<Vec<Event>> {
    Json(state.store.list().await)
}

async fn create_event(
    State(state): State<AppState>,
    Json(event): Json<Event>,
) -> (StatusCode, Json<Value>) {
    match state.store.add(event).await {
        Ok(stored) => (StatusCode::CREATED, Json(json!(stored))),
        Err(e) => internal_error(e),
    }
}

async fn update_event(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(event): Json<Event>,
) -> (StatusCode, Json<Value>) {
    match state.store.update(&id, event).await {
        Ok(true) => match state.store.get(&id).await {
            Some(stored) => (StatusCode::OK, Json(json!(stored))),
            None => not_found(),
        },
        Ok(false) => not_found(),
        Err(e) => internal_error(e),
    }
}

async fn delete_event(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    match state.store.remove(&id).await {
        Ok(true) => StatusCode::NO_CONTENT.into_response(),
        Ok(false) => not_found().into_response(),
        Err(e) => internal_error(e).into_response(),
    }
}

fn not_found() -> (StatusCode, Json<Value>) {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "error": t!("events.not_found") })),
    )
}

fn internal_error(e: crate::error::Error) -> (StatusCode, Json<Value>) {
    error!("Event store operation failed: {}", e);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": e.to_string() })),
    )
}
