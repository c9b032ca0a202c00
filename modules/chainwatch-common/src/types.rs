use chrono::{DateTime, NaiveDate, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

// --- Query defaults ---

/// Fallback search query when an instruction names no topic.
pub const DEFAULT_TOPIC: &str =
    "supply chain disruptions OR supply chain risks OR geopolitical challenges";

/// Fallback article count when an instruction names none.
pub const DEFAULT_COUNT: u32 = 10;

/// Fallback date window in days, ending today.
pub const DEFAULT_WINDOW_DAYS: i64 = 7;

/// A structured news query, extracted from a free-text instruction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
    pub topic: String,
    pub count: u32,
    pub from_date: NaiveDate,
    pub to_date: NaiveDate,
}

// --- Geo Types ---

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

// --- Risk bucketing ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum RiskCategory {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskCategory {
    /// Bucket a risk score into a category. Total over [0,1]; the 0.75,
    /// 0.5 and 0.25 boundaries are inclusive on the higher bucket.
    pub fn from_score(score: f64) -> Self {
        if score >= 0.75 {
            RiskCategory::Critical
        } else if score >= 0.5 {
            RiskCategory::High
        } else if score >= 0.25 {
            RiskCategory::Medium
        } else {
            RiskCategory::Low
        }
    }

    pub fn from_str_loose(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "critical" => RiskCategory::Critical,
            "high" => RiskCategory::High,
            "medium" => RiskCategory::Medium,
            _ => RiskCategory::Low,
        }
    }
}

impl std::fmt::Display for RiskCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RiskCategory::Low => write!(f, "low"),
            RiskCategory::Medium => write!(f, "medium"),
            RiskCategory::High => write!(f, "high"),
            RiskCategory::Critical => write!(f, "critical"),
        }
    }
}

// --- Event ---

/// A single ingested article describing a geopolitical occurrence.
/// Immutable once stored; assessments link to it by id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    /// Stable id: hex SHA-256 of the article URL.
    pub id: String,
    pub title: String,
    /// Name of the publishing outlet.
    pub source: String,
    pub published_at: DateTime<Utc>,
    pub url: String,
    /// Description plus whatever article body the provider returned.
    pub raw_text: String,
    /// Location language found in the article itself, if any. The
    /// assessment's resolved location is authoritative over this.
    pub location_hint: Option<String>,
}

/// Stable event id for a source URL: hex-encoded SHA-256.
pub fn event_id(url: &str) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(url.as_bytes());
    let digest = hasher.finalize();
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

// --- Assessment ---

/// The risk evaluation computed for one Event. Created exactly once per
/// event; an existing assessment is never overwritten.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assessment {
    pub event_id: String,
    /// Normalized risk score in [0,1].
    pub risk_score: f64,
    pub risk_category: RiskCategory,
    pub rationale: String,
    /// Where the disruption hits, when the scorer could determine it.
    pub resolved_location: Option<GeoPoint>,
    /// Whether the scorer judged the event relevant to supply chains at
    /// all. Carried for downstream styling, never used as a filter.
    pub relevant: bool,
    pub assessed_at: DateTime<Utc>,
}

// --- MapEntry ---

/// Render-ready projection of an (Event, Assessment) pair for geographic
/// display. Only pairs with a resolved location qualify.
#[derive(Debug, Clone, Serialize)]
pub struct MapEntry {
    pub event_id: String,
    pub title: String,
    pub url: String,
    pub source: String,
    pub published_at: DateTime<Utc>,
    pub risk_score: f64,
    pub risk_category: RiskCategory,
    pub relevant: bool,
    pub latitude: f64,
    pub longitude: f64,
    pub rationale: String,
}

impl MapEntry {
    pub fn from_pair(event: &Event, assessment: &Assessment) -> Option<Self> {
        let loc = assessment.resolved_location?;
        Some(Self {
            event_id: event.id.clone(),
            title: event.title.clone(),
            url: event.url.clone(),
            source: event.source.clone(),
            published_at: event.published_at,
            risk_score: assessment.risk_score,
            risk_category: assessment.risk_category,
            relevant: assessment.relevant,
            latitude: loc.lat,
            longitude: loc.lng,
            rationale: assessment.rationale.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_id_deterministic() {
        let a = event_id("https://example.com/article");
        let b = event_id("https://example.com/article");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn event_id_different_urls() {
        assert_ne!(
            event_id("https://example.com/a"),
            event_id("https://example.com/b")
        );
    }

    #[test]
    fn bucketing_boundaries_are_inclusive() {
        assert_eq!(RiskCategory::from_score(0.75), RiskCategory::Critical);
        assert_eq!(RiskCategory::from_score(0.5), RiskCategory::High);
        assert_eq!(RiskCategory::from_score(0.25), RiskCategory::Medium);
    }

    #[test]
    fn bucketing_total_over_unit_interval() {
        assert_eq!(RiskCategory::from_score(0.0), RiskCategory::Low);
        assert_eq!(RiskCategory::from_score(0.2499), RiskCategory::Low);
        assert_eq!(RiskCategory::from_score(0.4), RiskCategory::Medium);
        assert_eq!(RiskCategory::from_score(0.6), RiskCategory::High);
        assert_eq!(RiskCategory::from_score(1.0), RiskCategory::Critical);
        // Every hundredth of the interval maps to some bucket.
        for i in 0..=100 {
            let _ = RiskCategory::from_score(i as f64 / 100.0);
        }
    }

    #[test]
    fn map_entry_requires_location() {
        let event = Event {
            id: event_id("https://example.com/a"),
            title: "Port strike".to_string(),
            source: "Example Wire".to_string(),
            published_at: Utc::now(),
            url: "https://example.com/a".to_string(),
            raw_text: "Dock workers walked out".to_string(),
            location_hint: None,
        };
        let mut assessment = Assessment {
            event_id: event.id.clone(),
            risk_score: 0.8,
            risk_category: RiskCategory::Critical,
            rationale: "major port".to_string(),
            resolved_location: None,
            relevant: true,
            assessed_at: Utc::now(),
        };
        assert!(MapEntry::from_pair(&event, &assessment).is_none());

        assessment.resolved_location = Some(GeoPoint {
            lat: 51.9,
            lng: 4.48,
        });
        let entry = MapEntry::from_pair(&event, &assessment).unwrap();
        assert_eq!(entry.latitude, 51.9);
        assert_eq!(entry.risk_category, RiskCategory::Critical);
    }
}
