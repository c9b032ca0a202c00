use chrono::{DateTime, NaiveDateTime, Utc};
use neo4rs::query;

use chainwatch_common::{Assessment, Event, GeoPoint, RiskCategory};

use crate::GraphClient;

/// Read-side wrapper for the graph: the unassessed backlog and the
/// assessed-with-location projection. Never mutates the store.
pub struct GraphReader {
    client: GraphClient,
}

impl GraphReader {
    pub fn new(client: GraphClient) -> Self {
        Self { client }
    }

    /// All events without an assessment, oldest first.
    pub async fn unassessed_events(&self) -> Result<Vec<Event>, neo4rs::Error> {
        let q = query(
            "MATCH (e:Event)
             WHERE NOT (e)-[:ASSESSED_AS]->(:Assessment)
             RETURN e
             ORDER BY e.published_at ASC",
        );

        let mut events = Vec::new();
        let mut stream = self.client.graph.execute(q).await?;
        while let Some(row) = stream.next().await? {
            if let Some(event) = row_to_event(&row) {
                events.push(event);
            }
        }
        Ok(events)
    }

    /// All (event, assessment) pairs whose assessment carries a resolved
    /// location. Ordering is left to the caller.
    pub async fn assessed_with_location(
        &self,
    ) -> Result<Vec<(Event, Assessment)>, neo4rs::Error> {
        let q = query(
            "MATCH (e:Event)-[:ASSESSED_AS]->(a:Assessment)
             WHERE a.lat IS NOT NULL AND a.lng IS NOT NULL
             RETURN e, a",
        );

        let mut pairs = Vec::new();
        let mut stream = self.client.graph.execute(q).await?;
        while let Some(row) = stream.next().await? {
            if let (Some(event), Some(assessment)) =
                (row_to_event(&row), row_to_assessment(&row))
            {
                pairs.push((event, assessment));
            }
        }
        Ok(pairs)
    }
}

fn row_to_event(row: &neo4rs::Row) -> Option<Event> {
    let n: neo4rs::Node = row.get("e").ok()?;

    let id: String = n.get("id").ok()?;
    let title: String = n.get("title").unwrap_or_default();
    let source: String = n.get("source").unwrap_or_default();
    let url: String = n.get("url").unwrap_or_default();
    let raw_text: String = n.get("raw_text").unwrap_or_default();
    let location_hint: Option<String> = n.get("location_hint").ok();

    Some(Event {
        id,
        title,
        source,
        published_at: parse_datetime_prop(&n, "published_at"),
        url,
        raw_text,
        location_hint,
    })
}

fn row_to_assessment(row: &neo4rs::Row) -> Option<Assessment> {
    let a: neo4rs::Node = row.get("a").ok()?;

    let event_id: String = a.get("event_id").ok()?;
    let risk_score: f64 = a.get("risk_score").unwrap_or(0.0);
    let category_str: String = a.get("risk_category").unwrap_or_default();
    let rationale: String = a.get("rationale").unwrap_or_default();
    let relevant: bool = a.get("relevant").unwrap_or(false);

    let resolved_location = match (a.get::<f64>("lat").ok(), a.get::<f64>("lng").ok()) {
        (Some(lat), Some(lng)) => Some(GeoPoint { lat, lng }),
        _ => None,
    };

    Some(Assessment {
        event_id,
        risk_score,
        risk_category: RiskCategory::from_str_loose(&category_str),
        rationale,
        resolved_location,
        relevant,
        assessed_at: parse_datetime_prop(&a, "assessed_at"),
    })
}

/// Writer stores datetimes as "%Y-%m-%dT%H:%M:%S%.6f" (no timezone,
/// implicitly UTC). Accept RFC3339 too for externally seeded data.
fn parse_datetime_prop(n: &neo4rs::Node, prop: &str) -> DateTime<Utc> {
    if let Ok(s) = n.get::<String>(prop) {
        if let Ok(dt) = DateTime::parse_from_rfc3339(&s) {
            return dt.with_timezone(&Utc);
        }
        if let Ok(naive) = NaiveDateTime::parse_from_str(&s, "%Y-%m-%dT%H:%M:%S%.f") {
            return naive.and_utc();
        }
    }
    Utc::now()
}
