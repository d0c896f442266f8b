//! Arena backed suite tree.
//!
//! Every node shares the same base record ([`Node`]) and carries either a
//! [`ScopeNode`] or a [`TestNode`]. Parents are referenced by id, so the tree
//! owns all nodes and no node owns its parent.

use std::{borrow::Cow, time::Duration};

use crate::{
    collector::ErrorCollector,
    scope::{ScopeNode, Stats},
    test::{Handler, TestNode, TestState},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeId(NodeId);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TestId(NodeId);

impl From<ScopeId> for NodeId {
    fn from(value: ScopeId) -> Self {
        value.0
    }
}

impl From<TestId> for NodeId {
    fn from(value: TestId) -> Self {
        value.0
    }
}

/// A node id resolved to what it points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Runnable {
    Scope(ScopeId),
    Test(TestId),
}

#[derive(Debug)]
pub enum NodeKind {
    Scope(ScopeNode),
    Test(TestNode),
}

#[derive(Debug)]
pub struct Node {
    parent: Option<ScopeId>,
    depth: usize,
    description: Cow<'static, str>,
    pub(crate) kind: NodeKind,
}

impl Node {
    pub fn parent(&self) -> Option<ScopeId> {
        self.parent
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }
}

#[derive(Debug)]
pub struct Tree {
    nodes: Vec<Node>,
    collector: ErrorCollector,
}

impl Tree {
    pub const ROOT: ScopeId = ScopeId(NodeId(0));
    pub const ROOT_DESCRIPTION: &'static str = "ROOT";

    pub(crate) fn new(timeout: Duration) -> Self {
        Self {
            nodes: vec![Node {
                parent: None,
                depth: 0,
                description: Cow::Borrowed(Self::ROOT_DESCRIPTION),
                kind: NodeKind::Scope(ScopeNode::new(timeout)),
            }],
            collector: ErrorCollector::new(),
        }
    }

    fn push(&mut self, parent: ScopeId, description: Cow<'static, str>, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        let depth = self.node(parent).depth + 1;
        self.nodes.push(Node {
            parent: Some(parent),
            depth,
            description,
            kind,
        });
        self.scope_mut(parent).children.push(id);
        id
    }

    pub(crate) fn push_scope(
        &mut self,
        parent: ScopeId,
        description: Cow<'static, str>,
        timeout: Duration,
    ) -> ScopeId {
        ScopeId(self.push(parent, description, NodeKind::Scope(ScopeNode::new(timeout))))
    }

    pub(crate) fn push_test(
        &mut self,
        parent: ScopeId,
        description: Cow<'static, str>,
        handler: Handler,
    ) -> TestId {
        TestId(self.push(parent, description, NodeKind::Test(TestNode::new(handler))))
    }

    pub fn node(&self, id: impl Into<NodeId>) -> &Node {
        &self.nodes[id.into().0]
    }

    fn node_mut(&mut self, id: impl Into<NodeId>) -> &mut Node {
        &mut self.nodes[id.into().0]
    }

    pub fn resolve(&self, id: NodeId) -> Runnable {
        match self.node(id).kind {
            NodeKind::Scope(_) => Runnable::Scope(ScopeId(id)),
            NodeKind::Test(_) => Runnable::Test(TestId(id)),
        }
    }

    pub fn scope(&self, id: ScopeId) -> &ScopeNode {
        match &self.node(id).kind {
            NodeKind::Scope(scope) => scope,
            NodeKind::Test(_) => unreachable!("scope ids only point at scopes"),
        }
    }

    pub(crate) fn scope_mut(&mut self, id: ScopeId) -> &mut ScopeNode {
        match &mut self.node_mut(id).kind {
            NodeKind::Scope(scope) => scope,
            NodeKind::Test(_) => unreachable!("scope ids only point at scopes"),
        }
    }

    pub fn test(&self, id: TestId) -> &TestNode {
        match &self.node(id).kind {
            NodeKind::Test(test) => test,
            NodeKind::Scope(_) => unreachable!("test ids only point at tests"),
        }
    }

    pub(crate) fn test_mut(&mut self, id: TestId) -> &mut TestNode {
        match &mut self.node_mut(id).kind {
            NodeKind::Test(test) => test,
            NodeKind::Scope(_) => unreachable!("test ids only point at tests"),
        }
    }

    /// Timeout a test runs under, the one of its enclosing scope.
    pub fn timeout_of(&self, id: TestId) -> Duration {
        self.node(id)
            .parent
            .map(|parent| self.scope(parent).timeout)
            .unwrap_or_else(|| self.scope(Self::ROOT).timeout)
    }

    /// Ancestor descriptions joined with ` > `, leaving out the root.
    pub fn full_path(&self, id: impl Into<NodeId>) -> String {
        let mut descriptions = Vec::new();
        let mut current = Some(id.into());
        while let Some(id) = current {
            let node = self.node(id);
            if node.parent.is_none() {
                break;
            }
            descriptions.push(node.description.as_ref());
            current = node.parent.map(NodeId::from);
        }
        descriptions.reverse();
        descriptions.join(" > ")
    }

    pub fn has_tests(&self, scope: ScopeId) -> bool {
        self.scope(scope)
            .children
            .iter()
            .any(|&child| match self.resolve(child) {
                Runnable::Test(_) => true,
                Runnable::Scope(scope) => self.has_tests(scope),
            })
    }

    pub fn stats(&self, scope: ScopeId) -> Stats {
        self.scope(scope)
            .children
            .iter()
            .map(|&child| match self.resolve(child) {
                Runnable::Scope(scope) => self.stats(scope),
                Runnable::Test(test) => match self.test(test).state {
                    TestState::Passed => Stats { passed: 1, failed: 0 },
                    TestState::Failed(_) => Stats { passed: 0, failed: 1 },
                    TestState::Pending | TestState::Skipped => Stats::default(),
                },
            })
            .sum()
    }

    /// All tests in registration order.
    pub fn tests(&self) -> impl Iterator<Item = TestId> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, node)| matches!(node.kind, NodeKind::Test(_)))
            .map(|(index, _)| TestId(NodeId(index)))
    }

    pub fn collector(&self) -> &ErrorCollector {
        &self.collector
    }

    pub(crate) fn collector_mut(&mut self) -> &mut ErrorCollector {
        &mut self.collector
    }
}
