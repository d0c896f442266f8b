use crate::error::Failure;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorItem {
    /// Full path of the failed test, e.g. `Suite > Subsuite > test`.
    pub description: String,
    pub failure: Failure,
}

/// Append-only log of test failures, in the order they happened.
///
/// There is exactly one per suite tree and only the engine writes to it.
#[derive(Debug, Default)]
pub struct ErrorCollector {
    items: Vec<ErrorItem>,
}

impl ErrorCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a failure and return its 1-based ordinal.
    pub fn add(&mut self, description: impl Into<String>, failure: Failure) -> usize {
        self.items.push(ErrorItem {
            description: description.into(),
            failure,
        });
        self.items.len()
    }

    pub fn items(&self) -> &[ErrorItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
