// Test mocks for the pipeline.
//
// Three mocks matching the three trait boundaries:
// - MockNewsSource (NewsSource) — canned article list or scripted failure
// - MockScorer (RiskScorer) — per-event-id scripted signals
// - MemoryStore (EventStore) — stateful in-memory store
//
// Plus helpers for constructing test articles, events and assessments.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use anyhow::{bail, Result};
use async_trait::async_trait;
use chrono::{Duration, Utc};

use chainwatch_common::{event_id, Assessment, Event, GeoPoint, Query, RiskCategory};

use crate::traits::{EventStore, NewsSource, RawArticle, RiskScorer, RiskSignal};

// ---------------------------------------------------------------------------
// MockNewsSource
// ---------------------------------------------------------------------------

/// Canned news source. Returns the same article list on every call, or a
/// scripted error. Records each query it is asked to run.
pub struct MockNewsSource {
    articles: Vec<RawArticle>,
    fail_with: Option<String>,
    queries: Arc<Mutex<Vec<Query>>>,
}

impl MockNewsSource {
    pub fn with_articles(articles: Vec<RawArticle>) -> Self {
        Self {
            articles,
            fail_with: None,
            queries: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            articles: Vec::new(),
            fail_with: Some(message.to_string()),
            queries: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Handle to the queries this source has been asked to run; keep a
    /// clone before moving the source into a pipeline.
    pub fn recorded_queries(&self) -> Arc<Mutex<Vec<Query>>> {
        self.queries.clone()
    }
}

#[async_trait]
impl NewsSource for MockNewsSource {
    async fn search(&self, query: &Query) -> Result<Vec<RawArticle>> {
        self.queries.lock().unwrap().push(query.clone());
        if let Some(message) = &self.fail_with {
            bail!("MockNewsSource: {message}");
        }
        Ok(self.articles.clone())
    }
}

// ---------------------------------------------------------------------------
// MockScorer
// ---------------------------------------------------------------------------

enum ScriptedScore {
    Signal(RiskSignal),
    Fail,
}

/// Per-event-id scripted scorer. Errors on unregistered ids so tests
/// notice unexpected scoring calls.
pub struct MockScorer {
    scripts: HashMap<String, ScriptedScore>,
}

impl MockScorer {
    pub fn new() -> Self {
        Self {
            scripts: HashMap::new(),
        }
    }

    pub fn on(mut self, event_id: &str, signal: RiskSignal) -> Self {
        self.scripts
            .insert(event_id.to_string(), ScriptedScore::Signal(signal));
        self
    }

    /// Relevant signal with the given score and no location.
    pub fn scoring(self, event_id: &str, risk_score: f64) -> Self {
        self.on(
            event_id,
            RiskSignal {
                relevant: true,
                risk_score,
                rationale: "scripted score".to_string(),
                location: None,
            },
        )
    }

    /// Relevant signal with the given score and location.
    pub fn scoring_located(self, event_id: &str, risk_score: f64, lat: f64, lng: f64) -> Self {
        self.on(
            event_id,
            RiskSignal {
                relevant: true,
                risk_score,
                rationale: "scripted score".to_string(),
                location: Some(GeoPoint { lat, lng }),
            },
        )
    }

    pub fn failing_on(mut self, event_id: &str) -> Self {
        self.scripts
            .insert(event_id.to_string(), ScriptedScore::Fail);
        self
    }
}

#[async_trait]
impl RiskScorer for MockScorer {
    async fn score(&self, event: &Event) -> Result<RiskSignal> {
        match self.scripts.get(&event.id) {
            Some(ScriptedScore::Signal(signal)) => Ok(signal.clone()),
            Some(ScriptedScore::Fail) => bail!("MockScorer: scripted failure for {}", event.id),
            None => bail!("MockScorer: no score registered for {}", event.id),
        }
    }
}

// ---------------------------------------------------------------------------
// MemoryStore
// ---------------------------------------------------------------------------

/// Stateful in-memory EventStore with the same semantics as the graph:
/// merge-if-absent on both keys, assessments only for existing events.
pub struct MemoryStore {
    events: Mutex<HashMap<String, Event>>,
    assessments: Mutex<HashMap<String, Assessment>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            events: Mutex::new(HashMap::new()),
            assessments: Mutex::new(HashMap::new()),
        }
    }

    pub fn event_count(&self) -> usize {
        self.events.lock().unwrap().len()
    }

    pub fn assessment_count(&self) -> usize {
        self.assessments.lock().unwrap().len()
    }

    pub fn assessment(&self, event_id: &str) -> Option<Assessment> {
        self.assessments.lock().unwrap().get(event_id).cloned()
    }
}

#[async_trait]
impl EventStore for MemoryStore {
    async fn create_event_if_absent(&self, event: &Event) -> Result<bool> {
        let mut events = self.events.lock().unwrap();
        if events.contains_key(&event.id) {
            return Ok(false);
        }
        events.insert(event.id.clone(), event.clone());
        Ok(true)
    }

    async fn unassessed_events(&self) -> Result<Vec<Event>> {
        let events = self.events.lock().unwrap();
        let assessments = self.assessments.lock().unwrap();
        let mut backlog: Vec<Event> = events
            .values()
            .filter(|e| !assessments.contains_key(&e.id))
            .cloned()
            .collect();
        backlog.sort_by_key(|e| e.published_at);
        Ok(backlog)
    }

    async fn put_assessment(&self, assessment: &Assessment) -> Result<bool> {
        let events = self.events.lock().unwrap();
        if !events.contains_key(&assessment.event_id) {
            return Ok(false);
        }
        let mut assessments = self.assessments.lock().unwrap();
        if assessments.contains_key(&assessment.event_id) {
            return Ok(false);
        }
        assessments.insert(assessment.event_id.clone(), assessment.clone());
        Ok(true)
    }

    async fn assessed_with_location(&self) -> Result<Vec<(Event, Assessment)>> {
        let events = self.events.lock().unwrap();
        let assessments = self.assessments.lock().unwrap();
        Ok(assessments
            .values()
            .filter(|a| a.resolved_location.is_some())
            .filter_map(|a| {
                events
                    .get(&a.event_id)
                    .map(|e| (e.clone(), a.clone()))
            })
            .collect())
    }
}

// ---------------------------------------------------------------------------
// Test data helpers
// ---------------------------------------------------------------------------

pub fn test_article(url: &str, title: &str) -> RawArticle {
    RawArticle {
        title: title.to_string(),
        source: "Example Wire".to_string(),
        published_at: Some(Utc::now()),
        url: Some(url.to_string()),
        description: format!("{title} — what happened and where."),
        content: "Longer article body.".to_string(),
        location_hint: None,
    }
}

pub fn test_event(url: &str, title: &str, hours_old: i64) -> Event {
    Event {
        id: event_id(url),
        title: title.to_string(),
        source: "Example Wire".to_string(),
        published_at: Utc::now() - Duration::hours(hours_old),
        url: url.to_string(),
        raw_text: format!("{title} — what happened and where."),
        location_hint: None,
    }
}

pub fn test_assessment(event_id: &str, risk_score: f64) -> Assessment {
    Assessment {
        event_id: event_id.to_string(),
        risk_score,
        risk_category: RiskCategory::from_score(risk_score),
        rationale: "test rationale".to_string(),
        resolved_location: None,
        relevant: true,
        assessed_at: Utc::now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_store_dedups_by_id() {
        let store = MemoryStore::new();
        let event = test_event("https://example.com/a", "A", 0);
        assert!(store.create_event_if_absent(&event).await.unwrap());
        assert!(!store.create_event_if_absent(&event).await.unwrap());
        assert_eq!(store.event_count(), 1);
    }

    #[tokio::test]
    async fn memory_store_never_overwrites_assessments() {
        let store = MemoryStore::new();
        let event = test_event("https://example.com/a", "A", 0);
        store.create_event_if_absent(&event).await.unwrap();

        let first = test_assessment(&event.id, 0.9);
        let second = test_assessment(&event.id, 0.1);
        assert!(store.put_assessment(&first).await.unwrap());
        assert!(!store.put_assessment(&second).await.unwrap());
        assert_eq!(store.assessment(&event.id).unwrap().risk_score, 0.9);
    }

    #[tokio::test]
    async fn memory_store_rejects_assessment_for_unknown_event() {
        let store = MemoryStore::new();
        let orphan = test_assessment("no-such-id", 0.5);
        assert!(!store.put_assessment(&orphan).await.unwrap());
        assert_eq!(store.assessment_count(), 0);
    }

    #[tokio::test]
    async fn backlog_is_oldest_first() {
        let store = MemoryStore::new();
        let newer = test_event("https://example.com/new", "New", 1);
        let older = test_event("https://example.com/old", "Old", 48);
        store.create_event_if_absent(&newer).await.unwrap();
        store.create_event_if_absent(&older).await.unwrap();

        let backlog = store.unassessed_events().await.unwrap();
        assert_eq!(backlog[0].id, older.id);
        assert_eq!(backlog[1].id, newer.id);
    }
}
