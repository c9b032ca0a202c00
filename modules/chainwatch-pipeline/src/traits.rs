// Trait abstractions for the pipeline's three external collaborators.
//
// NewsSource — one search call per run against the news provider.
// RiskScorer — per-event scoring via the reasoning service.
// EventStore — the shared store all three stages read and write.
//
// These enable deterministic testing with MockNewsSource, MockScorer and
// MemoryStore: no network, no database, no Docker. `cargo test` in seconds.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use chainwatch_common::{Assessment, Event, GeoPoint, Query};
use chainwatch_graph::{GraphReader, GraphWriter};
use newsapi_client::NewsApiClient;

// ---------------------------------------------------------------------------
// NewsSource
// ---------------------------------------------------------------------------

/// A raw article as returned by the news source, before normalization
/// into an Event.
#[derive(Debug, Clone)]
pub struct RawArticle {
    pub title: String,
    pub source: String,
    pub published_at: Option<DateTime<Utc>>,
    pub url: Option<String>,
    pub description: String,
    pub content: String,
    pub location_hint: Option<String>,
}

#[async_trait]
pub trait NewsSource: Send + Sync {
    /// Run one provider search for up to `query.count` articles matching
    /// `query.topic` inside the query's date window.
    async fn search(&self, query: &Query) -> Result<Vec<RawArticle>>;
}

/// Production NewsSource backed by NewsAPI's `/v2/everything`.
pub struct NewsApiSource {
    client: NewsApiClient,
}

impl NewsApiSource {
    pub fn new(client: NewsApiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl NewsSource for NewsApiSource {
    async fn search(&self, query: &Query) -> Result<Vec<RawArticle>> {
        let articles = self
            .client
            .everything(&query.topic, query.from_date, query.to_date, query.count)
            .await?;

        Ok(articles
            .into_iter()
            .map(|a| RawArticle {
                title: a.title.unwrap_or_else(|| "Untitled".to_string()),
                source: a
                    .source
                    .name
                    .unwrap_or_else(|| "Unknown source".to_string()),
                published_at: a.published_at,
                url: a.url,
                description: a.description.unwrap_or_default(),
                content: a.content.unwrap_or_default(),
                // NewsAPI articles carry no structured location; sources
                // that do can populate this through the same seam.
                location_hint: None,
            })
            .collect())
    }
}

// ---------------------------------------------------------------------------
// RiskScorer
// ---------------------------------------------------------------------------

/// What the scoring capability returns for one event.
#[derive(Debug, Clone)]
pub struct RiskSignal {
    /// Whether the event is relevant to supply chains at all.
    pub relevant: bool,
    /// Risk score; callers clamp to [0,1] before bucketing.
    pub risk_score: f64,
    pub rationale: String,
    /// Where the disruption hits, if the scorer could determine it.
    pub location: Option<GeoPoint>,
}

#[async_trait]
pub trait RiskScorer: Send + Sync {
    async fn score(&self, event: &Event) -> Result<RiskSignal>;
}

// ---------------------------------------------------------------------------
// EventStore
// ---------------------------------------------------------------------------

#[async_trait]
pub trait EventStore: Send + Sync {
    /// Store an event unless its id already exists. Returns true when this
    /// call created the record (first-write-wins, atomic per id).
    async fn create_event_if_absent(&self, event: &Event) -> Result<bool>;

    /// The backlog: all events without an assessment, oldest first.
    async fn unassessed_events(&self) -> Result<Vec<Event>>;

    /// Store an assessment unless one exists for its event. Returns true
    /// when this call created the record; existing assessments are never
    /// overwritten.
    async fn put_assessment(&self, assessment: &Assessment) -> Result<bool>;

    /// All (event, assessment) pairs carrying a resolved location.
    async fn assessed_with_location(&self) -> Result<Vec<(Event, Assessment)>>;
}

// Stages borrow the store; tests share one behind an Arc.
#[async_trait]
impl<T: EventStore> EventStore for std::sync::Arc<T> {
    async fn create_event_if_absent(&self, event: &Event) -> Result<bool> {
        (**self).create_event_if_absent(event).await
    }

    async fn unassessed_events(&self) -> Result<Vec<Event>> {
        (**self).unassessed_events().await
    }

    async fn put_assessment(&self, assessment: &Assessment) -> Result<bool> {
        (**self).put_assessment(assessment).await
    }

    async fn assessed_with_location(&self) -> Result<Vec<(Event, Assessment)>> {
        (**self).assessed_with_location().await
    }
}

/// Production EventStore backed by the Neo4j graph.
pub struct GraphStore {
    writer: GraphWriter,
    reader: GraphReader,
}

impl GraphStore {
    pub fn new(writer: GraphWriter, reader: GraphReader) -> Self {
        Self { writer, reader }
    }
}

#[async_trait]
impl EventStore for GraphStore {
    async fn create_event_if_absent(&self, event: &Event) -> Result<bool> {
        Ok(self.writer.create_event_if_absent(event).await?)
    }

    async fn unassessed_events(&self) -> Result<Vec<Event>> {
        Ok(self.reader.unassessed_events().await?)
    }

    async fn put_assessment(&self, assessment: &Assessment) -> Result<bool> {
        Ok(self.writer.put_assessment(assessment).await?)
    }

    async fn assessed_with_location(&self) -> Result<Vec<(Event, Assessment)>> {
        Ok(self.reader.assessed_with_location().await?)
    }
}
