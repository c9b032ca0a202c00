use serde::Serialize;

/// Summary of one pipeline run. Always distinguishes fetched, stored,
/// assessed, skipped-on-error and mappable counts, even on partial failure.
#[derive(Debug, Default, Serialize)]
pub struct RunSummary {
    /// Articles the provider returned.
    pub fetched: u32,
    /// Events newly stored this run.
    pub stored: u32,
    /// Articles whose event id already existed.
    pub deduplicated: u32,
    /// Articles dropped for missing a usable URL.
    pub skipped_invalid: u32,
    /// Events assessed this run (backlog included).
    pub assessed: u32,
    /// Events left unassessed because scoring failed.
    pub skipped_on_error: u32,
    /// Assessed events with a resolved location, ready for the map.
    pub mappable: u32,
    /// Per-event scoring failures.
    pub errors: Vec<String>,
}

impl std::fmt::Display for RunSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "\n=== Pipeline Run Complete ===")?;
        writeln!(f, "Articles returned:  {}", self.fetched)?;
        writeln!(f, "Events stored:      {}", self.stored)?;
        writeln!(f, "Duplicates skipped: {}", self.deduplicated)?;
        writeln!(f, "Invalid articles:   {}", self.skipped_invalid)?;
        writeln!(f, "Events assessed:    {}", self.assessed)?;
        writeln!(f, "Skipped on error:   {}", self.skipped_on_error)?;
        writeln!(f, "Mappable entries:   {}", self.mappable)?;
        if !self.errors.is_empty() {
            writeln!(f, "\nErrors:")?;
            for e in &self.errors {
                writeln!(f, "  - {e}")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_renders_all_counts() {
        let summary = RunSummary {
            fetched: 5,
            stored: 3,
            deduplicated: 2,
            skipped_invalid: 0,
            assessed: 2,
            skipped_on_error: 1,
            mappable: 1,
            errors: vec!["Scoring provider error: abc123: timeout".to_string()],
        };
        let rendered = summary.to_string();
        for needle in [
            "Articles returned:  5",
            "Events stored:      3",
            "Duplicates skipped: 2",
            "Events assessed:    2",
            "Skipped on error:   1",
            "Mappable entries:   1",
            "Scoring provider error: abc123",
        ] {
            assert!(rendered.contains(needle), "missing {needle:?}");
        }
    }
}
