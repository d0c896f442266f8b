//! Building the suite tree.
//!
//! Registration is explicit: every call goes through a [`ScopeContext`] for a
//! specific scope, and only the active scope accepts registrations. A
//! `describe` call activates its new scope for the duration of its handler,
//! so nested registrations build the tree synchronously, before anything runs.

use std::{borrow::Cow, time::Duration};

use crate::{
    error::RegistrationError,
    scope::HookKind,
    test::Handler,
    tree::{ScopeId, TestId, Tree},
};

/// Timeout used by scopes that don't set their own.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(2000);

/// A suite tree under construction.
///
/// Running it consumes it, so no registration can happen once execution has
/// started. Everything loaded before that point runs together.
#[derive(Debug)]
pub struct Suite {
    tree: Tree,
    active: ScopeId,
}

impl Default for Suite {
    fn default() -> Self {
        Self::new()
    }
}

impl Suite {
    pub fn new() -> Self {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    /// A suite whose root scope uses `timeout`, inherited by every scope below.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            tree: Tree::new(timeout),
            active: Tree::ROOT,
        }
    }

    /// Registration context for the root scope.
    pub fn root(&mut self) -> ScopeContext<'_> {
        self.at(Tree::ROOT)
    }

    /// Registration context for an existing scope.
    ///
    /// Registering through it fails unless `scope` is the active scope.
    pub fn at(&mut self, scope: ScopeId) -> ScopeContext<'_> {
        ScopeContext { suite: self, scope }
    }

    pub fn describe<F>(
        &mut self,
        description: impl Into<Cow<'static, str>>,
        handler: F,
    ) -> Result<ScopeId, RegistrationError>
    where
        F: FnOnce(&mut ScopeContext<'_>) -> Result<(), RegistrationError>,
    {
        self.root().describe(description, handler)
    }

    pub fn it(
        &mut self,
        description: impl Into<Cow<'static, str>>,
        handler: Handler,
    ) -> Result<TestId, RegistrationError> {
        self.root().it(description, handler)
    }

    /// Apply one batch of top level registrations, e.g. one loaded test source.
    pub fn load<F>(&mut self, source: F) -> Result<(), RegistrationError>
    where
        F: FnOnce(&mut ScopeContext<'_>) -> Result<(), RegistrationError>,
    {
        tracing::trace!("loading registration batch");
        source(&mut self.root())
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    pub(crate) fn into_tree(self) -> Tree {
        self.tree
    }
}

/// Registration handle for one scope.
#[derive(Debug)]
pub struct ScopeContext<'s> {
    suite: &'s mut Suite,
    scope: ScopeId,
}

impl ScopeContext<'_> {
    pub fn id(&self) -> ScopeId {
        self.scope
    }

    fn ensure_active(&self) -> Result<(), RegistrationError> {
        match self.suite.active == self.scope {
            true => Ok(()),
            false => Err(RegistrationError::Inactive {
                scope: match self.scope == Tree::ROOT {
                    true => Tree::ROOT_DESCRIPTION.to_string(),
                    false => self.suite.tree.full_path(self.scope),
                },
            }),
        }
    }

    /// Add a child scope and fill it through `handler`.
    ///
    /// The child is the active scope while `handler` runs; the previous active
    /// scope is restored afterwards, also when `handler` fails.
    pub fn describe<F>(
        &mut self,
        description: impl Into<Cow<'static, str>>,
        handler: F,
    ) -> Result<ScopeId, RegistrationError>
    where
        F: FnOnce(&mut ScopeContext<'_>) -> Result<(), RegistrationError>,
    {
        self.ensure_active()?;
        let timeout = self.suite.tree.scope(self.scope).timeout();
        let child = self
            .suite
            .tree
            .push_scope(self.scope, description.into(), timeout);

        let previous = std::mem::replace(&mut self.suite.active, child);
        let result = handler(&mut ScopeContext {
            suite: &mut *self.suite,
            scope: child,
        });
        self.suite.active = previous;

        result.map(|()| child)
    }

    pub fn it(
        &mut self,
        description: impl Into<Cow<'static, str>>,
        handler: Handler,
    ) -> Result<TestId, RegistrationError> {
        self.ensure_active()?;
        Ok(self
            .suite
            .tree
            .push_test(self.scope, description.into(), handler))
    }

    pub fn hook(&mut self, kind: HookKind, handler: Handler) -> Result<(), RegistrationError> {
        self.ensure_active()?;
        self.suite.tree.scope_mut(self.scope).hooks.set(kind, handler)
    }

    pub fn before(&mut self, handler: Handler) -> Result<(), RegistrationError> {
        self.hook(HookKind::Before, handler)
    }

    pub fn before_each(&mut self, handler: Handler) -> Result<(), RegistrationError> {
        self.hook(HookKind::BeforeEach, handler)
    }

    pub fn after(&mut self, handler: Handler) -> Result<(), RegistrationError> {
        self.hook(HookKind::After, handler)
    }

    pub fn after_each(&mut self, handler: Handler) -> Result<(), RegistrationError> {
        self.hook(HookKind::AfterEach, handler)
    }

    /// Override the timeout of this scope and of scopes created below it from
    /// now on.
    pub fn timeout(&mut self, timeout: Duration) -> Result<(), RegistrationError> {
        self.ensure_active()?;
        self.suite.tree.scope_mut(self.scope).timeout = timeout;
        Ok(())
    }
}
