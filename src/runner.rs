//! Sequential execution of a suite tree.

use std::time::{Duration, Instant};

use futures::{FutureExt, future::LocalBoxFuture};

use crate::{
    error::{Failure, HookFailure},
    fault::FaultBridge,
    formatter::*,
    invoke::{Resolution, invoke},
    report::RunReport,
    scope::HookKind,
    test::TestState,
    tree::{Runnable, ScopeId, TestId, Tree},
};

pub(crate) struct Engine<F: RunFormatter, B> {
    tree: Tree,
    formatter: F,
    bridge: B,
    fmt_errors: Vec<(FormatError, F::Error)>,
}

impl<F: RunFormatter, B: FaultBridge> Engine<F, B> {
    pub(crate) fn new(tree: Tree, formatter: F, bridge: B) -> Self {
        Self {
            tree,
            formatter,
            bridge,
            fmt_errors: Vec::new(),
        }
    }

    pub(crate) async fn run(mut self) -> RunReport<F::Error> {
        let now = Instant::now();
        let tests = self.tree.tests().count();
        tracing::debug!(tests, "starting run");
        self.fmt_errors.push_on_error(
            FormatError::RunStart,
            self.formatter.fmt_run_start(FmtRunStart { tests }),
        );

        let fatal = self.run_scope(Tree::ROOT).await.err();
        if let Some(failure) = &fatal {
            tracing::error!(%failure, "aborting run");
            self.fmt_errors.push_on_error(
                FormatError::Fatal,
                self.formatter.fmt_fatal(FmtFatal { failure }),
            );
            self.skip_pending();
        }

        // give detached work a chance to deliver a late second `done`
        tokio::task::yield_now().await;
        self.reconcile_late();

        let duration = now.elapsed();
        let stats = self.tree.stats(Tree::ROOT);
        self.fmt_errors.push_on_error(
            FormatError::RunOutcomes,
            self.formatter.fmt_run_outcomes(FmtRunOutcomes {
                stats,
                failures: self.tree.collector().items(),
                fatal: fatal.as_ref(),
                duration,
            }),
        );
        tracing::debug!(
            passed = stats.passed,
            failed = stats.failed,
            ?duration,
            "run finished"
        );

        let outcomes = self
            .tree
            .tests()
            .map(|id| (self.tree.full_path(id), self.tree.test(id).state().clone()))
            .collect();
        RunReport {
            stats,
            outcomes,
            failures: self.tree.collector().items().to_vec(),
            fatal,
            duration,
            fmt_errors: self.fmt_errors,
        }
    }

    fn run_scope(&mut self, scope: ScopeId) -> LocalBoxFuture<'_, Result<(), HookFailure>> {
        async move {
            if scope != Tree::ROOT && self.tree.has_tests(scope) {
                let node = self.tree.node(scope);
                self.fmt_errors.push_on_error(
                    FormatError::ScopeStart,
                    self.formatter.fmt_scope_start(FmtScopeStart {
                        depth: node.depth(),
                        description: node.description(),
                    }),
                );
            }
            tracing::debug!(scope = %self.tree.full_path(scope), "entering scope");

            self.run_hook(scope, HookKind::Before).await?;
            let children = self.tree.scope(scope).children().to_vec();
            for child in children {
                self.run_hook(scope, HookKind::BeforeEach).await?;
                match self.tree.resolve(child) {
                    Runnable::Scope(inner) => self.run_scope(inner).await?,
                    Runnable::Test(test) => self.run_test(test).await,
                }
                self.run_hook(scope, HookKind::AfterEach).await?;
            }
            self.run_hook(scope, HookKind::After).await
        }
        .boxed_local()
    }

    async fn run_hook(&self, scope: ScopeId, kind: HookKind) -> Result<(), HookFailure> {
        let node = self.tree.scope(scope);
        let Some(handler) = node.hooks().get(kind) else {
            return Ok(());
        };

        tracing::debug!(hook = %kind, scope = %self.tree.full_path(scope), "running hook");
        let Resolution { result, .. } = invoke(handler, node.timeout(), &self.bridge).await;
        result.map_err(|failure| HookFailure {
            hook: kind,
            scope: self.tree.full_path(scope),
            failure,
        })
    }

    async fn run_test(&mut self, id: TestId) {
        let node = self.tree.node(id);
        self.fmt_errors.push_on_error(
            FormatError::TestStart,
            self.formatter.fmt_test_start(FmtTestStart {
                depth: node.depth(),
                description: node.description(),
            }),
        );

        let path = self.tree.full_path(id);
        tracing::debug!(test = %path, "running test");
        let now = Instant::now();
        let Resolution { result, late } =
            invoke(self.tree.test(id).handler(), self.tree.timeout_of(id), &self.bridge).await;
        let duration = now.elapsed();

        let ordinal = match &result {
            Ok(()) => {
                tracing::debug!(test = %path, ?duration, "test passed");
                None
            }
            Err(failure) => {
                tracing::debug!(test = %path, %failure, "test failed");
                Some(self.tree.collector_mut().add(path.as_str(), failure.clone()))
            }
        };

        let test = self.tree.test_mut(id);
        test.state = TestState::from(result);
        test.late = Some(late);
        self.emit_outcome(id, &path, ordinal, false, duration);
    }

    fn emit_outcome(
        &mut self,
        id: TestId,
        path: &str,
        ordinal: Option<usize>,
        late: bool,
        duration: Duration,
    ) {
        let node = self.tree.node(id);
        self.fmt_errors.push_on_error(
            FormatError::TestOutcome,
            self.formatter.fmt_test_outcome(FmtTestOutcome {
                depth: node.depth(),
                description: node.description(),
                path,
                state: self.tree.test(id).state(),
                ordinal,
                late,
                duration,
            }),
        );
    }

    fn skip_pending(&mut self) {
        let pending: Vec<TestId> = self
            .tree
            .tests()
            .filter(|&id| !self.tree.test(id).state().is_terminal())
            .collect();
        tracing::debug!(skipped = pending.len(), "skipping unreached tests");
        for id in pending {
            self.tree.test_mut(id).state = TestState::Skipped;
        }
    }

    /// Fail tests whose `done` was called a second time after they finished.
    fn reconcile_late(&mut self) {
        let tests: Vec<TestId> = self.tree.tests().collect();
        for id in tests {
            let misuse = self
                .tree
                .test_mut(id)
                .late
                .as_mut()
                .is_some_and(|late| late.take_misuse());
            if !misuse {
                continue;
            }

            let path = self.tree.full_path(id);
            tracing::warn!(test = %path, "`done` called again after the test finished");
            let failure = Failure::DoneCalledTwice;
            let ordinal = self.tree.collector_mut().add(path.as_str(), failure.clone());
            self.tree.test_mut(id).state = TestState::Failed(failure);
            self.emit_outcome(id, &path, Some(ordinal), true, Duration::ZERO);
        }
    }
}
