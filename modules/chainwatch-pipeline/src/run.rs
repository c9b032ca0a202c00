//! Pipeline Orchestrator.
//!
//! One invocation: instruction -> query -> Fetch -> Assess -> Map-Load ->
//! summary. The stages run strictly in that order, each awaiting the
//! previous. Fetch failing entirely aborts the run; the assess stage
//! always works the whole backlog, so a fetch that stored nothing new
//! still drains events left over from earlier runs.

use chrono::{NaiveDate, Utc};
use tracing::{info, warn};

use chainwatch_common::{ChainwatchError, MapEntry};

use crate::assess::assess_backlog;
use crate::fetch::fetch_events;
use crate::map_loader::load_map_entries;
use crate::params::extract_query;
use crate::run_log::{EventKind, RunLog};
use crate::stats::RunSummary;
use crate::traits::{EventStore, NewsSource, RiskScorer};

/// What one run returns to the invocation surface.
#[derive(Debug)]
pub struct PipelineOutcome {
    pub summary: RunSummary,
    pub entries: Vec<MapEntry>,
}

pub struct Pipeline {
    source: Box<dyn NewsSource>,
    scorer: Box<dyn RiskScorer>,
    store: Box<dyn EventStore>,
    save_run_log: bool,
}

impl Pipeline {
    pub fn new(
        source: Box<dyn NewsSource>,
        scorer: Box<dyn RiskScorer>,
        store: Box<dyn EventStore>,
    ) -> Self {
        Self {
            source,
            scorer,
            store,
            save_run_log: false,
        }
    }

    /// Persist a JSON run log under `{DATA_DIR}/pipeline-runs/`.
    pub fn with_run_log(mut self) -> Self {
        self.save_run_log = true;
        self
    }

    /// Run the pipeline for one instruction, anchored at the current date.
    pub async fn run(&self, instruction: &str) -> Result<PipelineOutcome, ChainwatchError> {
        self.run_at(instruction, Utc::now().date_naive()).await
    }

    /// Run with an explicit `today`, so extraction is deterministic.
    pub async fn run_at(
        &self,
        instruction: &str,
        today: NaiveDate,
    ) -> Result<PipelineOutcome, ChainwatchError> {
        let mut log = RunLog::new(instruction);
        info!(run_id = log.run_id.as_str(), instruction, "Pipeline run starting");

        let query = extract_query(instruction, today);
        info!(
            topic = query.topic.as_str(),
            count = query.count,
            from = %query.from_date,
            to = %query.to_date,
            "Query extracted"
        );
        log.log(EventKind::QueryExtracted {
            topic: query.topic.clone(),
            count: query.count,
            from_date: query.from_date,
            to_date: query.to_date,
        });

        // Stage 1: fetch. A provider failure here means there is nothing
        // new to assess and the run surfaces the failure.
        let fetch = match fetch_events(
            self.source.as_ref(),
            self.store.as_ref(),
            &query,
            &mut log,
        )
        .await
        {
            Ok(outcome) => outcome,
            Err(e) => {
                self.maybe_save(&log, &RunSummary::default());
                return Err(e);
            }
        };

        // Stage 2: assess the backlog, not just this batch.
        let assess = assess_backlog(self.scorer.as_ref(), self.store.as_ref(), &mut log).await?;

        // Stage 3: map load.
        let entries = load_map_entries(self.store.as_ref()).await?;
        log.log(EventKind::MapLoaded {
            entries: entries.len() as u32,
        });

        let summary = RunSummary {
            fetched: fetch.fetched,
            stored: fetch.stored,
            deduplicated: fetch.deduplicated,
            skipped_invalid: fetch.skipped_invalid,
            assessed: assess.assessed,
            skipped_on_error: assess.skipped_on_error,
            mappable: entries.len() as u32,
            errors: assess.errors,
        };

        self.maybe_save(&log, &summary);

        Ok(PipelineOutcome { summary, entries })
    }

    fn maybe_save(&self, log: &RunLog, summary: &RunSummary) {
        if self.save_run_log {
            if let Err(e) = log.save(summary) {
                warn!(error = %e, "Failed to save run log");
            }
        }
    }
}
