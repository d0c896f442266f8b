//! The single invocation protocol shared by tests and hooks.
//!
//! One invocation races the handler's own completion (its future, or its
//! [`Done`] callback), faults routed through the [`FaultBridge`], and a
//! timer. The first terminal signal wins. A second `done` call is the one
//! signal that still counts afterwards, because it reports misuse.

use std::{
    fmt::{Debug, Display},
    panic::{self, AssertUnwindSafe},
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use crossbeam_channel::{Receiver, Sender};
use futures::{
    FutureExt,
    future::{self, LocalBoxFuture},
};
use tokio::sync::Notify;

use crate::{
    error::{Failure, Fault},
    fault::{self, Catching, FaultBridge, FaultSink},
    test::{Handler, TestResult},
};

#[derive(Debug)]
pub(crate) enum Signal {
    Done(TestResult),
    DoneAgain,
    Uncaught(Failure),
}

/// Completion callback handed to [`Handler::callback`] handlers.
///
/// Can be cloned and sent to other tasks or threads. Calling it more than once
/// fails the test, even if it already finished.
#[derive(Clone)]
pub struct Done {
    calls: Arc<AtomicUsize>,
    signals: Sender<Signal>,
    wake: Arc<Notify>,
}

impl Debug for Done {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Done")
            .field("calls", &self.calls.load(Ordering::SeqCst))
            .finish()
    }
}

impl Done {
    pub fn call(&self, result: impl Into<TestResult>) {
        let signal = match self.calls.fetch_add(1, Ordering::SeqCst) {
            0 => Signal::Done(result.into()),
            _ => Signal::DoneAgain,
        };
        // the receiver only goes away once the whole run is over
        let _ = self.signals.send(signal);
        self.wake.notify_one();
    }

    pub fn pass(&self) {
        self.call(());
    }

    pub fn fail<E: Debug + Display>(&self, error: E) {
        self.call(Err::<(), E>(error));
    }
}

/// Signals of a finished invocation that may still receive a second `done`.
#[derive(Debug)]
pub(crate) struct LateSignals {
    signals: Receiver<Signal>,
    misuse_reported: bool,
}

impl LateSignals {
    /// Whether a second `done` arrived that has not been reported yet.
    pub(crate) fn take_misuse(&mut self) -> bool {
        let misuse = self
            .signals
            .try_iter()
            .any(|signal| matches!(signal, Signal::DoneAgain));
        match misuse && !self.misuse_reported {
            true => {
                self.misuse_reported = true;
                true
            }
            false => false,
        }
    }
}

#[derive(Debug, Default)]
struct Completion {
    result: Option<Result<(), Failure>>,
    misuse: bool,
}

impl Completion {
    fn settle(&mut self, result: Result<(), Failure>) {
        if self.result.is_none() {
            self.result = Some(result);
        }
    }

    fn apply(&mut self, signal: Signal) {
        match signal {
            Signal::Done(TestResult(result)) => self.settle(result.map_err(Failure::Error)),
            Signal::DoneAgain => {
                self.misuse = true;
                self.result = Some(Err(Failure::DoneCalledTwice));
            }
            Signal::Uncaught(failure) => self.settle(Err(failure)),
        }
    }

    fn drain(&mut self, signals: &Receiver<Signal>) {
        for signal in signals.try_iter() {
            self.apply(signal);
        }
    }
}

#[derive(Debug)]
pub(crate) struct Resolution {
    pub(crate) result: Result<(), Failure>,
    pub(crate) late: LateSignals,
}

fn panicked(payload: Box<dyn std::any::Any + Send + 'static>) -> Failure {
    Failure::Panicked(fault::take_last_panic().unwrap_or_else(|| Fault::from_panic_payload(payload)))
}

type Body = LocalBoxFuture<'static, Result<(), Failure>>;

fn start(handler: &Handler, done: Done) -> Body {
    match handler {
        Handler::Direct(f) => match fault::catching(|| panic::catch_unwind(AssertUnwindSafe(f))) {
            Ok(fut) => AssertUnwindSafe(Catching(fut))
                .catch_unwind()
                .map(|result| match result {
                    Ok(TestResult(result)) => result.map_err(Failure::Error),
                    Err(payload) => Err(panicked(payload)),
                })
                .boxed_local(),
            Err(payload) => future::ready(Err(panicked(payload))).boxed_local(),
        },
        Handler::Callback(f) => {
            match fault::catching(|| panic::catch_unwind(AssertUnwindSafe(|| f(done)))) {
                Ok(()) => future::pending().boxed_local(),
                Err(payload) => future::ready(Err(panicked(payload))).boxed_local(),
            }
        }
    }
}

/// Run `handler` to its first terminal signal, or fail it after `timeout`.
pub(crate) async fn invoke<B>(handler: &Handler, timeout: Duration, bridge: &B) -> Resolution
where
    B: FaultBridge + ?Sized,
{
    let (tx, rx) = crossbeam_channel::unbounded();
    let wake = Arc::new(Notify::new());

    let sink: FaultSink = {
        let tx = tx.clone();
        let wake = Arc::clone(&wake);
        Arc::new(move |failure| {
            let _ = tx.send(Signal::Uncaught(failure));
            wake.notify_one();
        })
    };
    let guard = bridge.acquire(sink);

    let done = Done {
        calls: Arc::default(),
        signals: tx,
        wake: Arc::clone(&wake),
    };
    let mut body = start(handler, done);
    let sleep = tokio::time::sleep(timeout);
    tokio::pin!(sleep);

    let mut completion = Completion::default();
    loop {
        completion.drain(&rx);
        if completion.result.is_some() {
            break;
        }

        tokio::select! {
            biased;
            result = &mut body => completion.settle(result),
            () = wake.notified() => {}
            () = &mut sleep => completion.settle(Err(Failure::TimedOut(timeout))),
        }
    }
    // a second `done` issued right after the first one
    completion.drain(&rx);
    drop(guard);

    Resolution {
        result: completion
            .result
            .unwrap_or(Err(Failure::TimedOut(timeout))),
        late: LateSignals {
            signals: rx,
            misuse_reported: completion.misuse,
        },
    }
}
