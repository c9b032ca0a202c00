//! Pipeline run log — persisted JSON timeline of every action taken during
//! a run.
//!
//! Each run produces a single `{DATA_DIR}/pipeline-runs/{run_id}.json` file
//! containing an ordered list of events with timestamps.

use std::path::PathBuf;

use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use tracing::info;

use crate::stats::RunSummary;

// ---------------------------------------------------------------------------
// data_dir helper
// ---------------------------------------------------------------------------

/// Root data directory, controlled by `DATA_DIR` env var (default: `"data"`).
pub fn data_dir() -> PathBuf {
    PathBuf::from(std::env::var("DATA_DIR").unwrap_or_else(|_| "data".to_string()))
}

// ---------------------------------------------------------------------------
// RunLog
// ---------------------------------------------------------------------------

pub struct RunLog {
    pub run_id: String,
    pub instruction: String,
    pub started_at: DateTime<Utc>,
    events: Vec<RunEvent>,
    seq: u32,
}

#[derive(Serialize)]
struct RunEvent {
    seq: u32,
    ts: DateTime<Utc>,
    #[serde(flatten)]
    kind: EventKind,
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventKind {
    QueryExtracted {
        topic: String,
        count: u32,
        from_date: NaiveDate,
        to_date: NaiveDate,
    },
    FetchCompleted {
        articles_returned: u32,
        stored: u32,
        deduplicated: u32,
    },
    FetchFailed {
        error: String,
    },
    EventStored {
        event_id: String,
        title: String,
        source_url: String,
    },
    EventDeduplicated {
        event_id: String,
        source_url: String,
    },
    EventAssessed {
        event_id: String,
        risk_score: f64,
        risk_category: String,
        has_location: bool,
    },
    ScoringFailed {
        event_id: String,
        error: String,
    },
    MapLoaded {
        entries: u32,
    },
}

impl RunLog {
    pub fn new(instruction: &str) -> Self {
        Self {
            run_id: uuid::Uuid::new_v4().to_string(),
            instruction: instruction.to_string(),
            started_at: Utc::now(),
            events: Vec::new(),
            seq: 0,
        }
    }

    pub fn log(&mut self, kind: EventKind) {
        self.events.push(RunEvent {
            seq: self.seq,
            ts: Utc::now(),
            kind,
        });
        self.seq += 1;
    }

    pub fn event_count(&self) -> usize {
        self.events.len()
    }

    /// Serialize the run log to JSON and write to disk.
    /// Returns the file path on success.
    pub fn save(&self, summary: &RunSummary) -> Result<PathBuf> {
        let dir = data_dir().join("pipeline-runs");
        std::fs::create_dir_all(&dir)?;

        let path = dir.join(format!("{}.json", self.run_id));

        let output = SerializedRunLog {
            run_id: &self.run_id,
            instruction: &self.instruction,
            started_at: self.started_at,
            finished_at: Utc::now(),
            summary,
            events: &self.events,
        };

        std::fs::write(&path, serde_json::to_string_pretty(&output)?)?;
        info!(path = %path.display(), events = self.events.len(), "Pipeline run log saved");

        Ok(path)
    }
}

#[derive(Serialize)]
struct SerializedRunLog<'a> {
    run_id: &'a str,
    instruction: &'a str,
    started_at: DateTime<Utc>,
    finished_at: DateTime<Utc>,
    summary: &'a RunSummary,
    events: &'a [RunEvent],
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_assigns_sequential_numbers() {
        let mut log = RunLog::new("test instruction");
        log.log(EventKind::MapLoaded { entries: 0 });
        log.log(EventKind::FetchFailed {
            error: "unreachable".to_string(),
        });
        assert_eq!(log.event_count(), 2);
        assert_eq!(log.events[0].seq, 0);
        assert_eq!(log.events[1].seq, 1);
    }

    #[test]
    fn events_serialize_with_type_tag() {
        let mut log = RunLog::new("test");
        log.log(EventKind::EventAssessed {
            event_id: "abc".to_string(),
            risk_score: 0.6,
            risk_category: "high".to_string(),
            has_location: true,
        });
        let json = serde_json::to_string(&log.events[0]).unwrap();
        assert!(json.contains("\"type\":\"event_assessed\""));
        assert!(json.contains("\"risk_category\":\"high\""));
    }
}
