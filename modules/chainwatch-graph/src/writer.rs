use chrono::{DateTime, Utc};
use neo4rs::query;
use tracing::warn;

use chainwatch_common::{Assessment, Event};

use crate::GraphClient;

/// Write-side wrapper for the graph. Used by the pipeline only.
///
/// Both writers are MERGE-based on the id key: concurrent attempts to
/// create the same record resolve to exactly one stored node, and the
/// returned flag reports whether THIS call created it.
pub struct GraphWriter {
    client: GraphClient,
}

impl GraphWriter {
    pub fn new(client: GraphClient) -> Self {
        Self { client }
    }

    /// Store an event unless one with its id already exists.
    /// Returns true if the event was newly created.
    pub async fn create_event_if_absent(&self, event: &Event) -> Result<bool, neo4rs::Error> {
        let q = query(
            "MERGE (e:Event {id: $id})
             ON CREATE SET
                e.title = $title,
                e.source = $source,
                e.published_at = $published_at,
                e.url = $url,
                e.raw_text = $raw_text,
                e.location_hint = $location_hint,
                e._new = true
             WITH e, coalesce(e._new, false) AS created
             REMOVE e._new
             RETURN created",
        )
        .param("id", event.id.as_str())
        .param("title", event.title.as_str())
        .param("source", event.source.as_str())
        .param("published_at", format_datetime(&event.published_at))
        .param("url", event.url.as_str())
        .param("raw_text", event.raw_text.as_str())
        .param("location_hint", event.location_hint.clone());

        let mut stream = self.client.graph.execute(q).await?;
        match stream.next().await? {
            Some(row) => Ok(row.get("created").unwrap_or(false)),
            None => {
                warn!(id = event.id.as_str(), "Event merge returned no row");
                Ok(false)
            }
        }
    }

    /// Store an assessment for an event unless one already exists.
    /// Existing assessments are never overwritten; returns true only when
    /// this call created the record.
    pub async fn put_assessment(&self, assessment: &Assessment) -> Result<bool, neo4rs::Error> {
        let (lat, lng) = match assessment.resolved_location {
            Some(loc) => (Some(loc.lat), Some(loc.lng)),
            None => (None, None),
        };

        let q = query(
            "MATCH (e:Event {id: $event_id})
             MERGE (a:Assessment {event_id: $event_id})
             ON CREATE SET
                a.risk_score = $risk_score,
                a.risk_category = $risk_category,
                a.rationale = $rationale,
                a.relevant = $relevant,
                a.assessed_at = $assessed_at,
                a.lat = $lat,
                a.lng = $lng,
                a._new = true
             MERGE (e)-[:ASSESSED_AS]->(a)
             WITH a, coalesce(a._new, false) AS created
             REMOVE a._new
             RETURN created",
        )
        .param("event_id", assessment.event_id.as_str())
        .param("risk_score", assessment.risk_score)
        .param("risk_category", assessment.risk_category.to_string())
        .param("rationale", assessment.rationale.as_str())
        .param("relevant", assessment.relevant)
        .param("assessed_at", format_datetime(&assessment.assessed_at))
        .param("lat", lat)
        .param("lng", lng);

        let mut stream = self.client.graph.execute(q).await?;
        match stream.next().await? {
            Some(row) => Ok(row.get("created").unwrap_or(false)),
            None => {
                // MATCH found no event for this id — nothing was written.
                warn!(
                    event_id = assessment.event_id.as_str(),
                    "Assessment skipped: no event with this id"
                );
                Ok(false)
            }
        }
    }
}

pub(crate) fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
}
