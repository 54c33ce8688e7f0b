//! Per-run summary of what the pipeline did

use std::fs;
use std::path::Path;

use serde::Serialize;

use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    /// Data line rewritten in full
    Rewritten { offset: String },
    /// Resolution failed; the data line was left alone
    ResolveFailed { error: String },
    /// Resolved, but the data line could not be (fully) rewritten
    RewriteFailed { offset: String, error: String },
    /// Resolved header was the last line of the input
    MissingDataLine { offset: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnnotationOutcome {
    pub line: usize,
    pub tag: String,
    pub signature: String,
    #[serde(flatten)]
    pub outcome: Outcome,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanReport {
    pub lines: usize,
    pub annotations: Vec<AnnotationOutcome>,
}

impl ScanReport {
    pub fn rewritten(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Rewritten { .. }))
    }

    pub fn failed(&self) -> usize {
        self.annotations.len() - self.rewritten()
    }

    pub fn resolve_failures(&self) -> usize {
        self.count(|o| matches!(o, Outcome::ResolveFailed { .. }))
    }

    pub fn is_clean(&self) -> bool {
        self.failed() == 0
    }

    fn count(&self, pred: impl Fn(&Outcome) -> bool) -> usize {
        self.annotations.iter().filter(|a| pred(&a.outcome)).count()
    }

    /// Save report to a JSON file
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}
