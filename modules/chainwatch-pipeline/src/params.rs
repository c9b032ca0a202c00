//! Natural-language parameter extraction.
//!
//! Turns one free-text instruction ("Fetch 15 articles about semiconductor
//! shortages in the last 30 days") into a structured Query. Extraction is
//! best-effort: anything the instruction doesn't say falls back to the
//! documented defaults, and malformed input never errors.

use std::sync::LazyLock;

use chrono::{Duration, NaiveDate};
use regex::Regex;

use chainwatch_common::{Query, DEFAULT_COUNT, DEFAULT_TOPIC, DEFAULT_WINDOW_DAYS};

/// "in the last 30 days", "from last 2 weeks", "past month" — the optional
/// leading connective is part of the match so stripping leaves clean prose.
static TIME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(?:\b(?:in|from|of|over|during|within)\s+)?(?:the\s+)?\b(?:last|past)\s+(?:(\d+)\s+)?(day|week|month|year)s?\b",
    )
    .unwrap()
});

/// A number adjacent to an article/news-item noun.
static COUNT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(\d+)\s+(?:news\s+)?(?:articles?|items?|events?|stories|story|headlines?|news)\b")
        .unwrap()
});

/// Topic is whatever follows a connective word, once time language is gone.
static TOPIC_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(?:about|on)\s+(.+)$").unwrap());

/// Extract a Query from a free-text instruction, anchored at `today`.
/// Pure function of its inputs; always returns a usable Query.
pub fn extract_query(instruction: &str, today: NaiveDate) -> Query {
    let (from_date, to_date, cleaned) = extract_window(instruction, today);
    let count = extract_count(&cleaned);
    let topic = extract_topic(&cleaned);

    Query {
        topic,
        count,
        from_date,
        to_date,
    }
}

/// Resolve the relative time phrase to an absolute window ending today,
/// and return the instruction with the phrase removed. Multipliers are
/// approximate (weeks×7, months×30, years×365), not calendar-aware.
fn extract_window(instruction: &str, today: NaiveDate) -> (NaiveDate, NaiveDate, String) {
    if let Some(caps) = TIME_RE.captures(instruction) {
        let n: i64 = caps
            .get(1)
            .and_then(|m| m.as_str().parse().ok())
            .unwrap_or(1);
        let unit_days = match caps.get(2).map(|m| m.as_str().to_lowercase()).as_deref() {
            Some("day") => 1,
            Some("week") => 7,
            Some("month") => 30,
            _ => 365,
        };
        let days = (n * unit_days).max(1);
        let cleaned = TIME_RE.replace(instruction, " ").into_owned();
        (today - Duration::days(days), today, cleaned)
    } else {
        (
            today - Duration::days(DEFAULT_WINDOW_DAYS),
            today,
            instruction.to_string(),
        )
    }
}

fn extract_count(cleaned: &str) -> u32 {
    COUNT_RE
        .captures(cleaned)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<u32>().ok())
        .map(|n| n.max(1))
        .unwrap_or(DEFAULT_COUNT)
}

fn extract_topic(cleaned: &str) -> String {
    let topic = TOPIC_RE
        .captures(cleaned)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .unwrap_or("")
        .trim()
        .trim_matches(|c: char| ".,;:!?".contains(c))
        .trim()
        .to_string();

    if topic.is_empty() {
        DEFAULT_TOPIC.to_string()
    } else {
        topic
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 15).unwrap()
    }

    #[test]
    fn full_instruction_extracts_all_parameters() {
        let q = extract_query(
            "Fetch 15 articles about semiconductor shortages in the last 30 days",
            today(),
        );
        assert_eq!(q.topic, "semiconductor shortages");
        assert_eq!(q.count, 15);
        assert_eq!(q.from_date, today() - Duration::days(30));
        assert_eq!(q.to_date, today());
    }

    #[test]
    fn missing_topic_falls_back_to_default() {
        let q = extract_query("Fetch new events from last 2 weeks", today());
        assert_eq!(q.topic, DEFAULT_TOPIC);
        assert_eq!(q.count, DEFAULT_COUNT);
        assert_eq!(q.from_date, today() - Duration::days(14));
        assert_eq!(q.to_date, today());
    }

    #[test]
    fn empty_instruction_returns_all_defaults() {
        let q = extract_query("", today());
        assert_eq!(q.topic, DEFAULT_TOPIC);
        assert_eq!(q.count, DEFAULT_COUNT);
        assert_eq!(q.from_date, today() - Duration::days(7));
        assert_eq!(q.to_date, today());
    }

    #[test]
    fn garbage_instruction_never_errors() {
        let q = extract_query("?!?! 42 %% about    ", today());
        assert_eq!(q.topic, DEFAULT_TOPIC);
        assert_eq!(q.count, DEFAULT_COUNT);
    }

    #[test]
    fn time_phrase_is_stripped_from_topic() {
        let q = extract_query("Get news about port strikes from the past 3 weeks", today());
        assert_eq!(q.topic, "port strikes");
        assert_eq!(q.from_date, today() - Duration::days(21));
    }

    #[test]
    fn bare_unit_means_one() {
        let q = extract_query("Fetch articles about lithium mining in the last month", today());
        assert_eq!(q.topic, "lithium mining");
        assert_eq!(q.from_date, today() - Duration::days(30));
    }

    #[test]
    fn years_use_365_day_multiplier() {
        let q = extract_query("events about trade wars over the past 2 years", today());
        assert_eq!(q.topic, "trade wars");
        assert_eq!(q.from_date, today() - Duration::days(730));
    }

    #[test]
    fn count_adjacent_to_news_nouns() {
        assert_eq!(extract_query("Fetch 25 news items", today()).count, 25);
        assert_eq!(extract_query("get 3 stories on floods", today()).count, 3);
        assert_eq!(extract_query("7 headlines about tariffs", today()).count, 7);
    }

    #[test]
    fn count_not_confused_with_time_numbers() {
        let q = extract_query("Fetch events from the last 30 days", today());
        assert_eq!(q.count, DEFAULT_COUNT);
        assert_eq!(q.from_date, today() - Duration::days(30));
    }

    #[test]
    fn zero_count_clamps_to_one() {
        assert_eq!(extract_query("Fetch 0 articles about x", today()).count, 1);
    }

    #[test]
    fn window_always_satisfies_from_before_to() {
        for instruction in [
            "",
            "last 1 days",
            "past 5 years of news about chips",
            "Fetch 10 articles",
        ] {
            let q = extract_query(instruction, today());
            assert!(q.from_date <= q.to_date, "bad window for {instruction:?}");
        }
    }
}
