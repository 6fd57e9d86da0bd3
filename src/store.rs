use crate::error::{store_error, AppResult};
use crate::models::Event;
use std::fs;
use std::path::PathBuf;
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

/// JSON-file-backed event store.
///
/// Events are kept in memory behind a lock and written back to the file
/// after every mutation, with dates round-tripped as RFC3339 strings.
pub struct EventStore {
    path: PathBuf,
    events: RwLock<Vec<Event>>,
}

impl EventStore {
    /// Open a store, loading any previously saved events.
    /// A missing file means an empty store.
    pub fn load(path: impl Into<PathBuf>) -> AppResult<Self> {
        let path = path.into();
        let events = if path.exists() {
            let content = fs::read_to_string(&path)?;
            let events: Vec<Event> = serde_json::from_str(&content)
                .map_err(|e| store_error(&format!("Failed to parse {}: {}", path.display(), e)))?;
            info!("Loaded {} events from {}", events.len(), path.display());
            events
        } else {
            Vec::new()
        };

        Ok(EventStore {
            path,
            events: RwLock::new(events),
        })
    }

    /// All stored events, in insertion order
    pub async fn list(&self) -> Vec<Event> {
        self.events.read().await.clone()
    }

    /// Look up one event by id
    pub async fn get(&self, id: &str) -> Option<Event> {
        self.events.read().await.iter().find(|e| e.id == id).cloned()
    }

    /// Add an event, generating an id when the caller left it empty
    pub async fn add(&self, mut event: Event) -> AppResult<Event> {
        if event.id.is_empty() {
            event.id = Uuid::new_v4().to_string();
        }
        let mut events = self.events.write().await;
        events.push(event.clone());
        self.persist(&events)?;
        Ok(event)
    }

    /// Replace the stored event with the given id.
    /// Returns false when no such event exists.
    pub async fn update(&self, id: &str, mut event: Event) -> AppResult<bool> {
        let mut events = self.events.write().await;
        let Some(slot) = events.iter_mut().find(|e| e.id == id) else {
            return Ok(false);
        };
        event.id = id.to_string();
        *slot = event;
        self.persist(&events)?;
        Ok(true)
    }

    /// Remove the event with the given id.
    /// Returns false when no such event exists.
    pub async fn remove(&self, id: &str) -> AppResult<bool> {
        let mut events = self.events.write().await;
        let before = events.len();
        events.retain(|e| e.id != id);
        if events.len() == before {
            return Ok(false);
        }
        self.persist(&events)?;
        Ok(true)
    }

    /// Replace the entire event list
    pub async fn replace_all(&self, new_events: Vec<Event>) -> AppResult<()> {
        let mut events = self.events.write().await;
        *events = new_events;
        self.persist(&events)
    }

    fn persist(&self, events: &[Event]) -> AppResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(events)?;
        fs::write(&self.path, json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn temp_store_path() -> PathBuf {
        std::env::temp_dir().join(format!("kalenda-store-{}.json", Uuid::new_v4()))
    }

    fn sample_event(title: &str) -> Event {
        Event::new(
            title,
            Utc.with_ymd_and_hms(2025, 8, 15, 12, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2025, 8, 15, 13, 0, 0).unwrap(),
        )
    }

    #[tokio::test]
    async fn missing_file_means_empty_store() {
        let store = EventStore::load(temp_store_path()).unwrap();
        assert!(store.list().await.is_empty());
    }

    #[tokio::test]
    async fn events_survive_a_reload() {
        let path = temp_store_path();
        let stored = {
            let store = EventStore::load(&path).unwrap();
            store.add(sample_event("Lunch")).await.unwrap()
        };

        let reloaded = EventStore::load(&path).unwrap();
        let events = reloaded.list().await;
        assert_eq!(events.len(), 1);
        assert_eq!(events[0], stored);

        fs::remove_file(path).ok();
    }

    #[tokio::test]
    async fn add_assigns_id_when_empty() {
        let path = temp_store_path();
        let store = EventStore::load(&path).unwrap();

        let mut event = sample_event("Lunch");
        event.id.clear();
        let stored = store.add(event).await.unwrap();
        assert!(!stored.id.is_empty());

        fs::remove_file(path).ok();
    }

    #[tokio::test]
    async fn update_and_remove_report_missing_ids() {
        let path = temp_store_path();
        let store = EventStore::load(&path).unwrap();
        let stored = store.add(sample_event("Lunch")).await.unwrap();

        let mut changed = stored.clone();
        changed.title = "Long lunch".to_string();
        assert!(store.update(&stored.id, changed).await.unwrap());
        assert_eq!(store.get(&stored.id).await.unwrap().title, "Long lunch");

        assert!(!store.update("no-such-id", stored.clone()).await.unwrap());
        assert!(!store.remove("no-such-id").await.unwrap());
        assert!(store.remove(&stored.id).await.unwrap());
        assert!(store.list().await.is_empty());

        fs::remove_file(path).ok();
    }
}
