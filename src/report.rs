use std::{
    process::{ExitCode, Termination},
    time::Duration,
};

use crate::{
    collector::ErrorItem, error::HookFailure, formatter::FormatError, scope::Stats,
    test::TestState,
};

pub type TestOutcomes = Vec<(String, TestState)>;

/// Result of a finished run.
#[derive(Debug)]
#[non_exhaustive]
pub struct RunReport<FmtError> {
    /// Aggregated over the whole tree.
    pub stats: Stats,
    /// Full path and final state of every test, in registration order.
    pub outcomes: TestOutcomes,
    /// Content of the error collector.
    pub failures: Vec<ErrorItem>,
    /// The hook failure that aborted the run, if any.
    pub fatal: Option<HookFailure>,
    pub duration: Duration,
    pub fmt_errors: Vec<(FormatError, FmtError)>,
}

impl<FmtError> RunReport<FmtError> {
    /// No test failed and no hook aborted the run.
    pub fn success(&self) -> bool {
        self.failures.is_empty() && self.fatal.is_none()
    }

    /// `0` on success, `1` otherwise.
    pub fn exit_status(&self) -> u8 {
        match self.success() {
            true => 0,
            false => 1,
        }
    }

    pub fn exit_code(&self) -> ExitCode {
        ExitCode::from(self.exit_status())
    }
}

impl<FmtError> Termination for RunReport<FmtError> {
    fn report(self) -> ExitCode {
        self.exit_code()
    }
}
