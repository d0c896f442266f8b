//! Nested `describe` / `it` test suites with hooks, `done` callbacks and
//! per-test timeouts.
//!
//! A [`Suite`] is built synchronously through registration calls, then handed
//! to [`harness`] which runs it strictly sequentially on a single threaded
//! tokio runtime and produces a [`RunReport`].
//!
//! ```no_run
//! use suitecase::{Handler, Suite, harness};
//!
//! fn main() -> std::io::Result<impl std::process::Termination> {
//!     let mut suite = Suite::new();
//!     suite
//!         .describe("math", |cx| {
//!             cx.it("adds", Handler::sync(|| assert_eq!(1 + 1, 2)))?;
//!             cx.it("waits", Handler::callback(|done| done.pass()))?;
//!             Ok(())
//!         })
//!         .expect("registration succeeds");
//!     harness(suite).run_blocking()
//! }
//! ```

pub mod collector;
pub mod error;
pub mod fault;
pub mod formatter;
pub mod registry;
pub mod scope;
pub mod tree;
pub mod util;

mod invoke;
pub use invoke::Done;

mod runner;

mod harness;
pub use harness::*;

mod report;
pub use report::*;

pub use error::{Failure, Fault, HookFailure, RegistrationError};
pub use registry::{DEFAULT_TIMEOUT, ScopeContext, Suite};
pub use scope::{HookKind, Stats};
pub use test::{Handler, TestResult, TestState};

#[cfg(test)]
mod test_support;
