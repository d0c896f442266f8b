//! Event driven output of a run.
//!
//! The engine calls a [`RunFormatter`] at fixed points of a run. Every method
//! has a no-op default, so a formatter only implements the events it cares
//! about. Formatter errors never stop a run; they are collected into the
//! [`RunReport`](crate::RunReport) together with the event that failed.

use std::{fmt::Display, time::Duration};

use crate::{
    collector::ErrorItem, error::HookFailure, scope::Stats, test::TestState,
};

pub mod common;
pub mod no;
pub mod pretty;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub struct FmtRunStart {
    /// Number of registered tests.
    pub tests: usize,
}

/// A scope with at least one test below it is about to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub struct FmtScopeStart<'t> {
    pub depth: usize,
    pub description: &'t str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub struct FmtTestStart<'t> {
    pub depth: usize,
    pub description: &'t str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub struct FmtTestOutcome<'t> {
    pub depth: usize,
    pub description: &'t str,
    pub path: &'t str,
    pub state: &'t TestState,
    /// Position in the error collector, for failed tests.
    pub ordinal: Option<usize>,
    /// Reported after the run already moved on, e.g. a second `done` call.
    pub late: bool,
    pub duration: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub struct FmtFatal<'t> {
    pub failure: &'t HookFailure,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub struct FmtRunOutcomes<'t> {
    pub stats: Stats,
    pub failures: &'t [ErrorItem],
    pub fatal: Option<&'t HookFailure>,
    pub duration: Duration,
}

pub trait RunFormatter {
    type Error;

    fn fmt_run_start(&mut self, data: FmtRunStart) -> Result<(), Self::Error> {
        let _ = data;
        Ok(())
    }

    fn fmt_scope_start(&mut self, data: FmtScopeStart<'_>) -> Result<(), Self::Error> {
        let _ = data;
        Ok(())
    }

    fn fmt_test_start(&mut self, data: FmtTestStart<'_>) -> Result<(), Self::Error> {
        let _ = data;
        Ok(())
    }

    fn fmt_test_outcome(&mut self, data: FmtTestOutcome<'_>) -> Result<(), Self::Error> {
        let _ = data;
        Ok(())
    }

    fn fmt_fatal(&mut self, data: FmtFatal<'_>) -> Result<(), Self::Error> {
        let _ = data;
        Ok(())
    }

    fn fmt_run_outcomes(&mut self, data: FmtRunOutcomes<'_>) -> Result<(), Self::Error> {
        let _ = data;
        Ok(())
    }
}

impl<F: RunFormatter + ?Sized> RunFormatter for &mut F {
    type Error = F::Error;

    fn fmt_run_start(&mut self, data: FmtRunStart) -> Result<(), Self::Error> {
        (**self).fmt_run_start(data)
    }

    fn fmt_scope_start(&mut self, data: FmtScopeStart<'_>) -> Result<(), Self::Error> {
        (**self).fmt_scope_start(data)
    }

    fn fmt_test_start(&mut self, data: FmtTestStart<'_>) -> Result<(), Self::Error> {
        (**self).fmt_test_start(data)
    }

    fn fmt_test_outcome(&mut self, data: FmtTestOutcome<'_>) -> Result<(), Self::Error> {
        (**self).fmt_test_outcome(data)
    }

    fn fmt_fatal(&mut self, data: FmtFatal<'_>) -> Result<(), Self::Error> {
        (**self).fmt_fatal(data)
    }

    fn fmt_run_outcomes(&mut self, data: FmtRunOutcomes<'_>) -> Result<(), Self::Error> {
        (**self).fmt_run_outcomes(data)
    }
}

/// The formatter event whose call returned an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormatError {
    RunStart,
    ScopeStart,
    TestStart,
    TestOutcome,
    Fatal,
    RunOutcomes,
}

impl Display for FormatError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            FormatError::RunStart => "fmt_run_start",
            FormatError::ScopeStart => "fmt_scope_start",
            FormatError::TestStart => "fmt_test_start",
            FormatError::TestOutcome => "fmt_test_outcome",
            FormatError::Fatal => "fmt_fatal",
            FormatError::RunOutcomes => "fmt_run_outcomes",
        })
    }
}

pub(crate) trait FmtErrors<E> {
    fn push_on_error(&mut self, event: FormatError, result: Result<(), E>);
}

impl<E> FmtErrors<E> for Vec<(FormatError, E)> {
    fn push_on_error(&mut self, event: FormatError, result: Result<(), E>) {
        if let Err(err) = result {
            self.push((event, err));
        }
    }
}
