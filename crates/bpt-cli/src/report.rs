//! Reporter
//!
//! Collects the outcome of each stage that ran and renders it for people
//! (indented text) or machines (JSON).

use bpt_model::Outcome;
use serde::Serialize;
use std::fmt::{self, Write as _};

/// Pipeline stage producing an outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Validate,
    Static,
    Dynamic,
}

impl Stage {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Validate => "validate",
            Self::Static => "static",
            Self::Dynamic => "dynamic",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageReport {
    pub stage: Stage,
    /// `true` when valid, the issue list otherwise
    pub outcome: Outcome,
}

/// Outcomes of one process run, in stage order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub process: String,
    pub valid: bool,
    pub stages: Vec<StageReport>,
}

impl Report {
    #[must_use]
    pub fn new(process: impl Into<String>) -> Self {
        Self {
            process: process.into(),
            valid: true,
            stages: Vec::new(),
        }
    }

    pub fn push(&mut self, stage: Stage, outcome: Outcome) {
        self.valid &= outcome.is_valid();
        self.stages.push(StageReport { stage, outcome });
    }

    #[must_use]
    pub fn outcome(&self, stage: Stage) -> Option<&Outcome> {
        self.stages
            .iter()
            .find(|s| s.stage == stage)
            .map(|s| &s.outcome)
    }

    /// Top-level issues across every stage
    #[must_use]
    pub fn issue_count(&self) -> usize {
        self.stages.iter().map(|s| s.outcome.issues().len()).sum()
    }

    #[must_use]
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Process '{}'", self.process);
        for report in &self.stages {
            match &report.outcome {
                Outcome::Valid => {
                    let _ = writeln!(out, "  {}: passed", report.stage);
                }
                Outcome::Invalid(issues) => {
                    let _ = writeln!(out, "  {}: {} issue(s)", report.stage, issues.len());
                    for issue in issues {
                        for line in issue.to_string().lines() {
                            let _ = writeln!(out, "    {line}");
                        }
                    }
                }
            }
        }
        if self.valid {
            out.push_str("PASSED\n");
        } else {
            let _ = writeln!(out, "FAILED ({} issue(s))", self.issue_count());
        }
        out
    }

    /// # Errors
    /// Serialization failure, which plain data does not produce in practice
    pub fn render_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
