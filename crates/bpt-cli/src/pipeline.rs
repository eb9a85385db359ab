//! Stage wiring: validate, then gather, then confirm

use crate::config::{BptConfig, ConfigError};
use crate::report::{Report, Stage};
use bpt_assertions::{gather, Assertions, ProcessValidator};
use bpt_model::Process;

/// Which confirmation stages follow validation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Validate,
    Static,
    Dynamic,
    /// Static and dynamic
    Check,
}

impl Mode {
    #[inline]
    #[must_use]
    pub fn runs_static(&self) -> bool {
        matches!(self, Self::Static | Self::Check)
    }

    #[inline]
    #[must_use]
    pub fn runs_dynamic(&self) -> bool {
        matches!(self, Self::Dynamic | Self::Check)
    }
}

/// Runs one process description through the configured stages
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: BptConfig,
}

impl Pipeline {
    #[must_use]
    pub fn new(config: BptConfig) -> Self {
        Self { config }
    }

    #[inline]
    #[must_use]
    pub fn config(&self) -> &BptConfig {
        &self.config
    }

    /// Validate and gather; `Err` carries the validation report
    ///
    /// # Errors
    /// The validation [`Report`] when the description is malformed
    pub fn assertions(&self, process: &Process) -> Result<Assertions, Report> {
        let mut report = Report::new(&process.name);
        let outcome = ProcessValidator::new().validate(process);
        if outcome.is_valid() {
            Ok(gather(process))
        } else {
            report.push(Stage::Validate, outcome);
            Err(report)
        }
    }

    /// Run `mode`. A process failing validation is not confirmed.
    ///
    /// # Errors
    /// `ConfigError` if the dynamic stage cannot be set up
    pub async fn run(&self, process: &Process, mode: Mode) -> Result<Report, ConfigError> {
        let assertions = match self.assertions(process) {
            Ok(assertions) => assertions,
            Err(report) => return Ok(report),
        };

        let mut report = Report::new(&process.name);
        report.push(Stage::Validate, bpt_model::Outcome::Valid);

        if mode.runs_static() {
            let outcome = self.config.static_confirmation().confirm(&assertions).await;
            report.push(Stage::Static, outcome);
        }
        if mode.runs_dynamic() {
            let runner = self.config.dynamic_confirmation()?;
            report.push(Stage::Dynamic, runner.confirm(&assertions).await);
        }

        tracing::info!(process = %process.name, valid = report.valid, "pipeline finished");
        Ok(report)
    }
}
