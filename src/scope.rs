use std::{
    fmt::Display,
    iter::Sum,
    ops::{Add, AddAssign},
    time::Duration,
};

use crate::{error::RegistrationError, test::Handler, tree::NodeId};

/// Which of the four scope hooks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookKind {
    /// Once, before the first child.
    Before,
    /// Before every child.
    BeforeEach,
    /// Once, after the last child.
    After,
    /// After every child.
    AfterEach,
}

impl Display for HookKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            HookKind::Before => "before",
            HookKind::BeforeEach => "before_each",
            HookKind::After => "after",
            HookKind::AfterEach => "after_each",
        })
    }
}

#[derive(Debug, Default)]
pub struct Hooks {
    before: Option<Handler>,
    before_each: Option<Handler>,
    after: Option<Handler>,
    after_each: Option<Handler>,
}

impl Hooks {
    fn slot(&mut self, kind: HookKind) -> &mut Option<Handler> {
        match kind {
            HookKind::Before => &mut self.before,
            HookKind::BeforeEach => &mut self.before_each,
            HookKind::After => &mut self.after,
            HookKind::AfterEach => &mut self.after_each,
        }
    }

    pub fn get(&self, kind: HookKind) -> Option<&Handler> {
        match kind {
            HookKind::Before => self.before.as_ref(),
            HookKind::BeforeEach => self.before_each.as_ref(),
            HookKind::After => self.after.as_ref(),
            HookKind::AfterEach => self.after_each.as_ref(),
        }
    }

    pub(crate) fn set(&mut self, kind: HookKind, handler: Handler) -> Result<(), RegistrationError> {
        let slot = self.slot(kind);
        if slot.is_some() {
            return Err(RegistrationError::HookAlreadySet(kind));
        }
        *slot = Some(handler);
        Ok(())
    }
}

/// Composite node of the suite tree.
#[derive(Debug)]
pub struct ScopeNode {
    pub(crate) children: Vec<NodeId>,
    pub(crate) hooks: Hooks,
    pub(crate) timeout: Duration,
}

impl ScopeNode {
    pub(crate) fn new(timeout: Duration) -> Self {
        Self {
            children: Vec::new(),
            hooks: Hooks::default(),
            timeout,
        }
    }

    /// Children in registration order, which is also run order.
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn hooks(&self) -> &Hooks {
        &self.hooks
    }

    /// Timeout applied to every test and hook directly inside this scope.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Stats {
    pub passed: usize,
    pub failed: usize,
}

impl Add for Stats {
    type Output = Stats;

    fn add(self, rhs: Self) -> Self::Output {
        Stats {
            passed: self.passed + rhs.passed,
            failed: self.failed + rhs.failed,
        }
    }
}

impl AddAssign for Stats {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sum for Stats {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Stats::default(), Add::add)
    }
}
