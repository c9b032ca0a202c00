//! Event Fetcher — stage 1 of the pipeline.
//!
//! One provider call per run, then a per-article store loop. Ids are
//! content-addressed (SHA-256 of the article URL) and the store's
//! merge-if-absent makes the loop idempotent: re-fetching the same
//! articles stores nothing new.

use chrono::Utc;
use tracing::{info, warn};

use chainwatch_common::{event_id, ChainwatchError, Event, Query};

use crate::run_log::{EventKind, RunLog};
use crate::traits::{EventStore, NewsSource, RawArticle};

/// Counts from one fetch stage.
#[derive(Debug, Default)]
pub struct FetchOutcome {
    pub fetched: u32,
    pub stored: u32,
    pub deduplicated: u32,
    pub skipped_invalid: u32,
}

/// Fetch articles for `query` and store the new ones.
///
/// A provider failure aborts the stage (nothing to assess yet); retry
/// policy belongs to the caller. Store failures abort too — a half-written
/// batch is safe to re-run thanks to id dedup.
pub async fn fetch_events(
    source: &dyn NewsSource,
    store: &dyn EventStore,
    query: &Query,
    log: &mut RunLog,
) -> Result<FetchOutcome, ChainwatchError> {
    let articles = match source.search(query).await {
        Ok(articles) => articles,
        Err(e) => {
            log.log(EventKind::FetchFailed {
                error: e.to_string(),
            });
            return Err(ChainwatchError::NewsProvider(e.to_string()));
        }
    };

    let mut outcome = FetchOutcome {
        fetched: articles.len() as u32,
        ..Default::default()
    };

    for article in articles {
        let Some(url) = article.url.clone() else {
            warn!(title = article.title.as_str(), "Article without URL skipped");
            outcome.skipped_invalid += 1;
            continue;
        };

        let event = event_from_article(article, &url);

        let created = store
            .create_event_if_absent(&event)
            .await
            .map_err(|e| ChainwatchError::Store(e.to_string()))?;

        if created {
            outcome.stored += 1;
            log.log(EventKind::EventStored {
                event_id: event.id.clone(),
                title: event.title.clone(),
                source_url: url,
            });
        } else {
            outcome.deduplicated += 1;
            log.log(EventKind::EventDeduplicated {
                event_id: event.id.clone(),
                source_url: url,
            });
        }
    }

    info!(
        fetched = outcome.fetched,
        stored = outcome.stored,
        deduplicated = outcome.deduplicated,
        "Fetch stage complete"
    );
    log.log(EventKind::FetchCompleted {
        articles_returned: outcome.fetched,
        stored: outcome.stored,
        deduplicated: outcome.deduplicated,
    });

    Ok(outcome)
}

fn event_from_article(article: RawArticle, url: &str) -> Event {
    let raw_text = match (
        article.description.is_empty(),
        article.content.is_empty(),
    ) {
        (false, false) => format!("{}\n\n{}", article.description, article.content),
        (false, true) => article.description,
        (true, false) => article.content,
        (true, true) => article.title.clone(),
    };

    Event {
        id: event_id(url),
        title: article.title,
        source: article.source,
        published_at: article.published_at.unwrap_or_else(Utc::now),
        url: url.to_string(),
        raw_text,
        location_hint: article.location_hint,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{test_article, MemoryStore, MockNewsSource};
    use chainwatch_common::{DEFAULT_COUNT, DEFAULT_TOPIC};
    use chrono::NaiveDate;

    fn test_query() -> Query {
        Query {
            topic: DEFAULT_TOPIC.to_string(),
            count: DEFAULT_COUNT,
            from_date: NaiveDate::from_ymd_opt(2025, 6, 8).unwrap(),
            to_date: NaiveDate::from_ymd_opt(2025, 6, 15).unwrap(),
        }
    }

    #[tokio::test]
    async fn stores_new_events() {
        let source = MockNewsSource::with_articles(vec![
            test_article("https://example.com/a", "Port strike"),
            test_article("https://example.com/b", "Factory fire"),
        ]);
        let store = MemoryStore::new();
        let mut log = RunLog::new("test");

        let outcome = fetch_events(&source, &store, &test_query(), &mut log)
            .await
            .unwrap();
        assert_eq!(outcome.fetched, 2);
        assert_eq!(outcome.stored, 2);
        assert_eq!(outcome.deduplicated, 0);
        assert_eq!(store.event_count(), 2);
    }

    #[tokio::test]
    async fn refetching_identical_articles_stores_nothing() {
        let source = MockNewsSource::with_articles(vec![
            test_article("https://example.com/a", "Port strike"),
            test_article("https://example.com/b", "Factory fire"),
        ]);
        let store = MemoryStore::new();
        let mut log = RunLog::new("test");

        let first = fetch_events(&source, &store, &test_query(), &mut log)
            .await
            .unwrap();
        assert_eq!(first.stored, 2);

        let second = fetch_events(&source, &store, &test_query(), &mut log)
            .await
            .unwrap();
        assert_eq!(second.stored, 0);
        assert_eq!(second.deduplicated, 2);
        assert_eq!(store.event_count(), 2);
    }

    #[tokio::test]
    async fn provider_failure_is_surfaced() {
        let source = MockNewsSource::failing("rate limited");
        let store = MemoryStore::new();
        let mut log = RunLog::new("test");

        let err = fetch_events(&source, &store, &test_query(), &mut log)
            .await
            .unwrap_err();
        assert!(matches!(err, ChainwatchError::NewsProvider(_)));
        assert_eq!(store.event_count(), 0);
    }

    #[tokio::test]
    async fn article_without_url_is_skipped() {
        let mut broken = test_article("https://example.com/a", "No link");
        broken.url = None;
        let source = MockNewsSource::with_articles(vec![
            broken,
            test_article("https://example.com/b", "Good link"),
        ]);
        let store = MemoryStore::new();
        let mut log = RunLog::new("test");

        let outcome = fetch_events(&source, &store, &test_query(), &mut log)
            .await
            .unwrap();
        assert_eq!(outcome.skipped_invalid, 1);
        assert_eq!(outcome.stored, 1);
        assert_eq!(store.event_count(), 1);
    }

    #[tokio::test]
    async fn empty_raw_text_falls_back_to_title() {
        let mut article = test_article("https://example.com/a", "Just a headline");
        article.description = String::new();
        article.content = String::new();
        let source = MockNewsSource::with_articles(vec![article]);
        let store = MemoryStore::new();
        let mut log = RunLog::new("test");

        fetch_events(&source, &store, &test_query(), &mut log)
            .await
            .unwrap();
        let events = store.unassessed_events().await.unwrap();
        assert_eq!(events[0].raw_text, "Just a headline");
    }
}
