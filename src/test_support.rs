use std::{
    cell::RefCell,
    convert::Infallible,
    io,
    rc::Rc,
    string::FromUtf8Error,
    sync::Arc,
    time::Duration,
};

use parking_lot::{Mutex, MutexGuard};

use crate::{
    fault::NoFaultBridge,
    formatter::{common::color::SupportsColor, no::NoFormatter, *},
    harness,
    registry::Suite,
    report::RunReport,
    test::{Handler, TestState},
    util::delay,
};

static SERIAL: Mutex<()> = parking_lot::const_mutex(());

/// Serialize tests touching the panic hook or the fault bridge owner slot.
pub fn serial() -> MutexGuard<'static, ()> {
    SERIAL.lock()
}

#[derive(Debug, Default, Clone)]
pub struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl io::Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl SupportsColor for SharedBuffer {
    fn supports_color(&self) -> bool {
        false
    }
}

impl SharedBuffer {
    pub fn try_to_string(&self) -> Result<String, FromUtf8Error> {
        String::from_utf8(self.0.lock().clone())
    }
}

/// Shared, ordered log of what handlers did.
#[derive(Debug, Default, Clone)]
pub struct Log(Rc<RefCell<Vec<String>>>);

impl Log {
    pub fn push(&self, entry: impl Into<String>) {
        self.0.borrow_mut().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.borrow().clone()
    }

    /// A handler that records `entry` and passes.
    pub fn handler(&self, entry: &'static str) -> Handler {
        let log = self.clone();
        Handler::sync(move || log.push(entry))
    }

    /// A handler that waits for `after` before recording `entry`.
    pub fn handler_after(&self, entry: &'static str, after: Duration) -> Handler {
        let log = self.clone();
        Handler::future(move || {
            let log = log.clone();
            async move {
                delay(after).await;
                log.push(entry);
            }
        })
    }
}

/// Formatter writing every event as one short line.
#[derive(Debug, Default)]
pub struct Recorder {
    pub events: Vec<String>,
}

impl RunFormatter for Recorder {
    type Error = Infallible;

    fn fmt_run_start(&mut self, data: FmtRunStart) -> Result<(), Self::Error> {
        self.events.push(format!("run start {}", data.tests));
        Ok(())
    }

    fn fmt_scope_start(&mut self, data: FmtScopeStart<'_>) -> Result<(), Self::Error> {
        self.events
            .push(format!("scope {} {}", data.depth, data.description));
        Ok(())
    }

    fn fmt_test_start(&mut self, data: FmtTestStart<'_>) -> Result<(), Self::Error> {
        self.events.push(format!("test start {}", data.description));
        Ok(())
    }

    fn fmt_test_outcome(&mut self, data: FmtTestOutcome<'_>) -> Result<(), Self::Error> {
        let event = match (data.state, data.ordinal) {
            (TestState::Failed(_), Some(ordinal)) if data.late => {
                format!("late fail {ordinal} {}", data.path)
            }
            (TestState::Failed(_), Some(ordinal)) => format!("fail {ordinal} {}", data.path),
            (TestState::Passed, _) => format!("pass {}", data.path),
            (state, _) => format!("{state:?} {}", data.path),
        };
        self.events.push(event);
        Ok(())
    }

    fn fmt_fatal(&mut self, data: FmtFatal<'_>) -> Result<(), Self::Error> {
        self.events.push(format!("fatal {}", data.failure));
        Ok(())
    }

    fn fmt_run_outcomes(&mut self, data: FmtRunOutcomes<'_>) -> Result<(), Self::Error> {
        self.events.push(format!(
            "outcomes {}/{}",
            data.stats.passed, data.stats.failed
        ));
        Ok(())
    }
}

/// Run `suite` without output and without touching the panic hook.
pub async fn run_suite(suite: Suite) -> RunReport<()> {
    harness(suite)
        .with_formatter(NoFormatter)
        .with_fault_bridge(NoFaultBridge)
        .run()
        .await
}
