//! Map Loader — stage 3 of the pipeline.
//!
//! Read-only projection of assessed, locatable events into render-ready
//! MapEntry records: highest risk first, recency breaking ties.

use tracing::info;

use chainwatch_common::{ChainwatchError, MapEntry};

use crate::traits::EventStore;

/// Load every assessed event with a resolved location, ordered by
/// risk_score descending, then published_at descending. Zero qualifying
/// events is an empty vec, not an error.
pub async fn load_map_entries(store: &dyn EventStore) -> Result<Vec<MapEntry>, ChainwatchError> {
    let pairs = store
        .assessed_with_location()
        .await
        .map_err(|e| ChainwatchError::Store(e.to_string()))?;

    let mut entries: Vec<MapEntry> = pairs
        .iter()
        .filter_map(|(event, assessment)| MapEntry::from_pair(event, assessment))
        .collect();

    entries.sort_by(|a, b| {
        b.risk_score
            .total_cmp(&a.risk_score)
            .then_with(|| b.published_at.cmp(&a.published_at))
    });

    info!(entries = entries.len(), "Map load complete");
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{test_assessment, test_event, MemoryStore};
    use crate::traits::EventStore;
    use chainwatch_common::GeoPoint;

    async fn seed(
        store: &MemoryStore,
        url: &str,
        hours_old: i64,
        score: f64,
        location: Option<GeoPoint>,
    ) -> String {
        let event = test_event(url, url, hours_old);
        store.create_event_if_absent(&event).await.unwrap();
        let mut assessment = test_assessment(&event.id, score);
        assessment.resolved_location = location;
        store.put_assessment(&assessment).await.unwrap();
        event.id
    }

    #[tokio::test]
    async fn empty_store_yields_empty_sequence() {
        let store = MemoryStore::new();
        let entries = load_map_entries(&store).await.unwrap();
        assert!(entries.is_empty());
    }

    #[tokio::test]
    async fn events_without_location_are_excluded() {
        let store = MemoryStore::new();
        let here = GeoPoint { lat: 1.0, lng: 2.0 };
        let kept = seed(&store, "https://example.com/a", 0, 0.9, Some(here)).await;
        seed(&store, "https://example.com/b", 1, 0.95, None).await;

        let entries = load_map_entries(&store).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].event_id, kept);
    }

    #[tokio::test]
    async fn ordered_by_risk_then_recency() {
        let store = MemoryStore::new();
        let here = GeoPoint { lat: 1.0, lng: 2.0 };
        let low = seed(&store, "https://example.com/low", 0, 0.2, Some(here)).await;
        let high = seed(&store, "https://example.com/high", 5, 0.8, Some(here)).await;
        // Same score, different ages: newer first.
        let tie_old = seed(&store, "https://example.com/tie-old", 10, 0.5, Some(here)).await;
        let tie_new = seed(&store, "https://example.com/tie-new", 2, 0.5, Some(here)).await;

        let entries = load_map_entries(&store).await.unwrap();
        let ids: Vec<&str> = entries.iter().map(|e| e.event_id.as_str()).collect();
        assert_eq!(ids, vec![&high[..], &tie_new[..], &tie_old[..], &low[..]]);

        let scores: Vec<f64> = entries.iter().map(|e| e.risk_score).collect();
        assert!(scores.windows(2).all(|w| w[0] >= w[1]));
    }

    #[tokio::test]
    async fn load_does_not_mutate_the_store() {
        let store = MemoryStore::new();
        let here = GeoPoint { lat: 1.0, lng: 2.0 };
        seed(&store, "https://example.com/a", 0, 0.9, Some(here)).await;

        load_map_entries(&store).await.unwrap();
        load_map_entries(&store).await.unwrap();
        assert_eq!(store.event_count(), 1);
        assert_eq!(store.assessment_count(), 1);
    }
}
