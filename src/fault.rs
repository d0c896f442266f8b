//! Routing of faults that escape a handler's own completion channel.
//!
//! A test body may hand work to a detached task or thread. When that work
//! panics, nothing awaits it, so the fault would be lost. A [`FaultBridge`]
//! routes such faults to whichever invocation currently owns the single,
//! process wide owner slot.
//!
//! Ownership is scoped: [`FaultBridge::acquire`] returns a [`FaultGuard`] and
//! dropping the guard releases the slot, whatever way the invocation ended.

use std::{
    cell::{Cell, RefCell},
    fmt::Debug,
    panic,
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
};

use parking_lot::Mutex;

use crate::error::{Failure, Fault};

/// Receiver of routed faults.
pub type FaultSink = Arc<dyn Fn(Failure) + Send + Sync + 'static>;

static OWNER: Mutex<Option<FaultSink>> = parking_lot::const_mutex(None);

thread_local! {
    static CATCHING: Cell<bool> = const { Cell::new(false) };
    static LAST_PANIC: RefCell<Option<Fault>> = const { RefCell::new(None) };
}

/// Injectable collaborator deciding how escaped faults reach the current owner.
pub trait FaultBridge {
    /// Make `owner` the current owner until the returned guard is dropped.
    fn acquire(&self, owner: FaultSink) -> FaultGuard;
}

/// Releases a [`FaultBridge`] acquisition on drop.
#[must_use = "dropping the guard releases the fault bridge immediately"]
pub struct FaultGuard(Option<Box<dyn FnOnce()>>);

impl FaultGuard {
    pub fn new(release: impl FnOnce() + 'static) -> Self {
        Self(Some(Box::new(release)))
    }

    pub fn noop() -> Self {
        Self(None)
    }
}

impl Debug for FaultGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("FaultGuard").field(&self.0.is_some()).finish()
    }
}

impl Drop for FaultGuard {
    fn drop(&mut self) {
        if let Some(release) = self.0.take() {
            release();
        }
    }
}

fn claim(owner: FaultSink) {
    let previous = OWNER.lock().replace(owner);
    if previous.is_some() {
        tracing::warn!("fault bridge acquired while another owner still held it");
    }
    tracing::trace!("fault bridge acquired");
}

fn release() {
    OWNER.lock().take();
    tracing::trace!("fault bridge released");
}

/// Hand `failure` to the current owner.
///
/// Returns `false` if nobody owns the bridge, in which case the failure is
/// only logged.
pub fn notify_uncaught(failure: Failure) -> bool {
    // clone first, the sink must not run under the lock
    let owner = OWNER.lock().clone();
    match owner {
        Some(sink) => {
            sink(failure);
            true
        }
        None => {
            tracing::warn!(%failure, "uncaught fault without an owner");
            false
        }
    }
}

/// Only explicit [`notify_uncaught`] calls reach the owner.
///
/// Panics in detached tasks are left to the runtime.
#[derive(Debug, Default, Clone)]
pub struct ManualFaultBridge;

impl FaultBridge for ManualFaultBridge {
    fn acquire(&self, owner: FaultSink) -> FaultGuard {
        claim(owner);
        FaultGuard::new(release)
    }
}

/// Intercepts nothing; escaped faults are lost and the test runs into its
/// timeout instead.
#[derive(Debug, Default, Clone)]
pub struct NoFaultBridge;

impl FaultBridge for NoFaultBridge {
    fn acquire(&self, _: FaultSink) -> FaultGuard {
        FaultGuard::noop()
    }
}

/// Routes every panic that is not caught by the engine itself, from any
/// thread, to the current owner.
///
/// The panic hook is swapped in on acquisition and the previous hook is put
/// back on release.
#[derive(Debug, Default, Clone)]
pub struct PanicFaultBridge;

impl FaultBridge for PanicFaultBridge {
    fn acquire(&self, owner: FaultSink) -> FaultGuard {
        claim(owner);
        let old_hook = panic::take_hook();
        panic::set_hook(Box::new(|info| {
            let fault = Fault::from_panic_info(info);
            if CATCHING.get() {
                // caught by the engine, keep the location for the report
                LAST_PANIC.set(Some(fault));
                return;
            }
            notify_uncaught(Failure::Uncaught(fault));
        }));

        FaultGuard::new(move || {
            let _ = panic::take_hook();
            panic::set_hook(old_hook);
            release();
        })
    }
}

/// Mark the current thread as catching panics itself while `f` runs.
pub(crate) fn catching<R>(f: impl FnOnce() -> R) -> R {
    struct Reset(bool);
    impl Drop for Reset {
        fn drop(&mut self) {
            CATCHING.set(self.0);
        }
    }

    let _reset = Reset(CATCHING.replace(true));
    f()
}

/// Take the panic recorded by the hook while [`catching`] was active.
pub(crate) fn take_last_panic() -> Option<Fault> {
    LAST_PANIC.take()
}

/// Polls the inner future inside [`catching`].
pub(crate) struct Catching<F>(pub(crate) F);

impl<F: Future + Unpin> Future for Catching<F> {
    type Output = F::Output;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        catching(|| Pin::new(&mut self.0).poll(cx))
    }
}
