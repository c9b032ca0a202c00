//! Risk Assessor — stage 2 of the pipeline.
//!
//! Scans the store for unassessed events (the backlog — regardless of
//! which fetch produced them) and scores each one via the reasoning
//! service. One event failing never aborts the batch; it stays in the
//! backlog for the next run and the failure lands in the summary's
//! error list.

use ai_client::Claude;
use anyhow::Result;
use chrono::Utc;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use chainwatch_common::{Assessment, ChainwatchError, Event, GeoPoint, RiskCategory};

use crate::run_log::{EventKind, RunLog};
use crate::traits::{EventStore, RiskScorer, RiskSignal};

/// Counts from one assess stage.
#[derive(Debug, Default)]
pub struct AssessOutcome {
    pub assessed: u32,
    pub skipped_on_error: u32,
    pub errors: Vec<String>,
}

/// Score every unassessed event in the store and persist the assessments.
pub async fn assess_backlog(
    scorer: &dyn RiskScorer,
    store: &dyn EventStore,
    log: &mut RunLog,
) -> Result<AssessOutcome, ChainwatchError> {
    let backlog = store
        .unassessed_events()
        .await
        .map_err(|e| ChainwatchError::Store(e.to_string()))?;

    info!(backlog = backlog.len(), "Assess stage starting");

    let mut outcome = AssessOutcome::default();

    for event in &backlog {
        let signal = match scorer.score(event).await {
            Ok(signal) => signal,
            Err(e) => {
                warn!(event_id = event.id.as_str(), error = %e, "Scoring failed, event left unassessed");
                outcome.skipped_on_error += 1;
                outcome.errors.push(
                    ChainwatchError::ScoringProvider(format!("{}: {e}", event.id)).to_string(),
                );
                log.log(EventKind::ScoringFailed {
                    event_id: event.id.clone(),
                    error: e.to_string(),
                });
                continue;
            }
        };

        let assessment = assessment_from_signal(event, signal);

        let created = store
            .put_assessment(&assessment)
            .await
            .map_err(|e| ChainwatchError::Store(e.to_string()))?;

        if created {
            outcome.assessed += 1;
            log.log(EventKind::EventAssessed {
                event_id: event.id.clone(),
                risk_score: assessment.risk_score,
                risk_category: assessment.risk_category.to_string(),
                has_location: assessment.resolved_location.is_some(),
            });
        } else {
            // Someone beat us to it; the existing assessment stands.
            warn!(event_id = event.id.as_str(), "Assessment already present, kept existing");
        }
    }

    info!(
        assessed = outcome.assessed,
        skipped = outcome.skipped_on_error,
        "Assess stage complete"
    );

    Ok(outcome)
}

/// Clamp the scorer's output into [0,1] and bucket it. The category is
/// always derived here, never trusted from the wire.
fn assessment_from_signal(event: &Event, signal: RiskSignal) -> Assessment {
    let risk_score = signal.risk_score.clamp(0.0, 1.0);
    Assessment {
        event_id: event.id.clone(),
        risk_score,
        risk_category: RiskCategory::from_score(risk_score),
        rationale: signal.rationale,
        resolved_location: signal.location,
        relevant: signal.relevant,
        assessed_at: Utc::now(),
    }
}

// ---------------------------------------------------------------------------
// Likelihood / impact scales
// ---------------------------------------------------------------------------

/// Probability-of-disruption weight for a likelihood label. Unknown labels
/// parse to the middle rung.
fn likelihood_weight(label: &str) -> f64 {
    match label.to_lowercase().as_str() {
        "rare" => 0.001,
        "unlikely" => 0.01,
        "possible" => 0.1,
        "likely" => 0.5,
        "almost_certain" | "almost certain" => 0.9,
        _ => 0.1,
    }
}

/// Severity-of-disruption weight for an impact label.
fn impact_weight(label: &str) -> f64 {
    match label.to_lowercase().as_str() {
        "insignificant" => 0.001,
        "minor" => 0.01,
        "moderate" => 0.1,
        "major" => 0.5,
        "catastrophic" => 0.9,
        _ => 0.1,
    }
}

/// Combine likelihood and impact into a normalized [0,1] score.
/// Raw risk spans [0.002, 1.8]; the normalization maps those endpoints
/// to 0 and 1.
fn normalize_risk(likelihood: f64, impact: f64) -> f64 {
    let raw = likelihood + impact;
    ((raw - 0.002) / (1.8 - 0.002)).clamp(0.0, 1.0)
}

// ---------------------------------------------------------------------------
// ClaudeRiskScorer
// ---------------------------------------------------------------------------

/// What the LLM returns for each scored event.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ScoredRisk {
    /// Whether the event has a direct or indirect effect on supply chains
    pub relevant: bool,
    /// Probability of disruption: "rare", "unlikely", "possible", "likely",
    /// or "almost_certain"
    pub likelihood: String,
    /// Severity of disruption: "insignificant", "minor", "moderate",
    /// "major", or "catastrophic"
    pub impact: String,
    /// One short paragraph justifying relevance, likelihood and impact
    pub rationale: String,
    /// Latitude of where the disruption hits supply chains, if a specific
    /// place can be determined
    pub latitude: Option<f64>,
    /// Longitude of where the disruption hits supply chains
    pub longitude: Option<f64>,
}

const SYSTEM_PROMPT: &str = "\
You are an expert in supply chain risk management. You analyze one news \
event at a time and judge its risk to supply chains.

Rules:
1. An event is relevant if it has a direct or indirect effect on supply \
chains: suppliers, factories, transport routes, ports, raw materials, \
regulation, or market access. General observations and speculative pieces \
are not relevant.
2. Likelihood is the probability the event disrupts supply chain \
operations: rare, unlikely, possible, likely, or almost_certain.
3. Impact is the severity if disruption occurs: insignificant, minor, \
moderate, major, or catastrophic.
4. If the event is not relevant, use likelihood rare and impact \
insignificant and explain why in the rationale.
5. Give coordinates only when the disruption centers on a determinable \
place — the place where supply chains are hit, which is not always where \
the event happened. Leave them out for diffuse or global events.";

/// Production RiskScorer backed by Claude structured extraction.
pub struct ClaudeRiskScorer {
    claude: Claude,
}

impl ClaudeRiskScorer {
    pub fn new(anthropic_api_key: &str) -> Self {
        Self {
            claude: Claude::new(anthropic_api_key, "claude-haiku-4-5-20251001"),
        }
    }
}

#[async_trait::async_trait]
impl RiskScorer for ClaudeRiskScorer {
    async fn score(&self, event: &Event) -> Result<RiskSignal> {
        let scored: ScoredRisk = self
            .claude
            .extract(SYSTEM_PROMPT, build_user_prompt(event))
            .await?;

        let location = match (scored.latitude, scored.longitude) {
            (Some(lat), Some(lng)) => Some(GeoPoint { lat, lng }),
            _ => None,
        };

        Ok(RiskSignal {
            relevant: scored.relevant,
            risk_score: normalize_risk(
                likelihood_weight(&scored.likelihood),
                impact_weight(&scored.impact),
            ),
            rationale: scored.rationale,
            location,
        })
    }
}

fn build_user_prompt(event: &Event) -> String {
    // Truncate long bodies to stay inside token limits.
    let text = if event.raw_text.len() > 30_000 {
        let mut end = 30_000;
        while !event.raw_text.is_char_boundary(end) {
            end -= 1;
        }
        &event.raw_text[..end]
    } else {
        &event.raw_text
    };

    let mut prompt = format!(
        "Event Title: {}\nSource: {}\nPublished: {}\n",
        event.title, event.source, event.published_at
    );
    if let Some(hint) = &event.location_hint {
        prompt.push_str(&format!("Location mentioned: {hint}\n"));
    }
    prompt.push_str(&format!(
        "\nEvent Text:\n{text}\n\nJudge this event's supply chain risk."
    ));
    prompt
}
