//! Error types of the three failure domains.
//!
//! A [`Failure`] is attributed to a single test and never stops the run.
//! A [`HookFailure`] is fatal and aborts the whole run.
//! A [`RegistrationError`] is returned synchronously while the tree is built.

use std::{
    any::Any,
    backtrace::{Backtrace, BacktraceStatus},
    fmt::{Debug, Display},
    panic::PanicHookInfo,
    time::Duration,
};

use thiserror::Error;

use crate::scope::HookKind;

/// The payload of a failed test or hook.
///
/// `message` is the [`Display`] form of whatever went wrong.
/// `detail` holds the richer representation, a captured backtrace for panics or
/// the pretty [`Debug`] form for error values, when that adds anything.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct Fault {
    pub message: String,
    pub detail: Option<String>,
}

impl Fault {
    pub fn msg(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            detail: None,
        }
    }

    pub fn with_detail(self, detail: impl Into<String>) -> Self {
        Self {
            detail: Some(detail.into()),
            ..self
        }
    }

    /// Build a fault from an arbitrary error value.
    ///
    /// Plain strings only keep their message, since their `Debug` form is the
    /// same text in quotes.
    pub fn from_value<E: Debug + Display + ?Sized>(value: &E) -> Self {
        let message = value.to_string();
        let debug = format!("{value:#?}");
        let detail = (debug != message && debug != format!("{message:?}")).then_some(debug);
        Self { message, detail }
    }

    pub(crate) fn from_panic_info(info: &PanicHookInfo<'_>) -> Self {
        let message = payload_as_str(info.payload())
            .unwrap_or("Box<dyn Any>")
            .to_string();
        let mut detail = match info.location() {
            Some(location) => format!("panicked at {location}:\n{message}"),
            None => format!("panicked:\n{message}"),
        };
        let backtrace = Backtrace::capture();
        if backtrace.status() == BacktraceStatus::Captured {
            detail.push_str(&format!("\nstack backtrace:\n{backtrace}"));
        }
        Self {
            message,
            detail: Some(detail),
        }
    }

    pub(crate) fn from_panic_payload(payload: Box<dyn Any + Send + 'static>) -> Self {
        Self::msg(payload_as_str(payload.as_ref()).unwrap_or("Box<dyn Any>"))
    }

    /// The text shown in the failure summary.
    pub fn render(&self) -> String {
        match &self.detail {
            Some(detail) => format!("{}\n{detail}", self.message),
            None => self.message.clone(),
        }
    }
}

fn payload_as_str(payload: &(dyn Any + Send)) -> Option<&str> {
    payload
        .downcast_ref::<&'static str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
}

/// Why a test or hook failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum Failure {
    /// The handler returned an error or passed one to `done`.
    #[error("{0}")]
    Error(Fault),

    /// The handler panicked while being called or polled.
    #[error("{0}")]
    Panicked(Fault),

    #[error("Test timed out after {}ms", .0.as_millis())]
    TimedOut(Duration),

    #[error("Callback `done` is called multiple times")]
    DoneCalledTwice,

    /// A fault routed through the fault bridge, e.g. a panic in a detached task.
    #[error("{0}")]
    Uncaught(Fault),
}

impl Failure {
    /// The text shown in the failure summary.
    pub fn render(&self) -> String {
        match self {
            Failure::Error(fault) | Failure::Panicked(fault) | Failure::Uncaught(fault) => {
                fault.render()
            }
            Failure::TimedOut(_) | Failure::DoneCalledTwice => self.to_string(),
        }
    }
}

/// A setup or teardown hook failed; the run cannot continue.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("`{hook}` hook of `{scope}` failed: {failure}")]
pub struct HookFailure {
    pub hook: HookKind,
    /// Full path of the scope owning the hook, empty for the root.
    pub scope: String,
    pub failure: Failure,
}

/// Misuse of the registration API.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum RegistrationError {
    #[error("cannot register into `{scope}` as it is not the active scope")]
    Inactive { scope: String },

    #[error("`{0}` handler already set")]
    HookAlreadySet(HookKind),
}
