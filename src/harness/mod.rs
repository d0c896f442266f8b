use std::io;

use tokio::{runtime, task::LocalSet};

use crate::{
    fault::{FaultBridge, PanicFaultBridge},
    formatter::{RunFormatter, pretty::PrettyFormatter},
    registry::Suite,
    report::RunReport,
    runner::Engine,
};

/// Prepare a run of `suite` with pretty console output and panic routing.
///
/// Taking the suite by value closes registration: everything loaded up to
/// this point runs, nothing can be added afterwards.
pub fn harness(suite: Suite) -> Harness<PrettyFormatter<io::Stdout>, PanicFaultBridge> {
    Harness {
        suite,
        formatter: PrettyFormatter::default(),
        fault_bridge: PanicFaultBridge,
    }
}

#[derive(Debug)]
pub struct Harness<Formatter, Bridge> {
    pub(crate) suite: Suite,
    pub(crate) formatter: Formatter,
    pub(crate) fault_bridge: Bridge,
}

impl<Formatter, Bridge> Harness<Formatter, Bridge> {
    pub fn with_formatter<WithFormatter>(
        self,
        formatter: WithFormatter,
    ) -> Harness<WithFormatter, Bridge> {
        Harness {
            suite: self.suite,
            formatter,
            fault_bridge: self.fault_bridge,
        }
    }

    pub fn with_fault_bridge<WithBridge>(
        self,
        fault_bridge: WithBridge,
    ) -> Harness<Formatter, WithBridge> {
        Harness {
            suite: self.suite,
            formatter: self.formatter,
            fault_bridge,
        }
    }
}

impl<Formatter: RunFormatter, Bridge: FaultBridge> Harness<Formatter, Bridge> {
    /// Run on the current runtime.
    ///
    /// Handlers that use [`spawn_local`](tokio::task::spawn_local) need this to
    /// be driven inside a [`LocalSet`].
    pub async fn run(self) -> RunReport<Formatter::Error> {
        Engine::new(self.suite.into_tree(), self.formatter, self.fault_bridge)
            .run()
            .await
    }

    /// Run on a fresh single threaded runtime inside a [`LocalSet`].
    pub fn run_blocking(self) -> io::Result<RunReport<Formatter::Error>> {
        let runtime = runtime::Builder::new_current_thread()
            .enable_time()
            .build()?;
        Ok(LocalSet::new().block_on(&runtime, self.run()))
    }
}
