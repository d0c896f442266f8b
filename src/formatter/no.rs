use crate::formatter::*;

/// A formatter that produces no output.
///
/// Useful when running a suite programmatically and only the
/// [`RunReport`](crate::RunReport) matters.
#[derive(Debug, Default, Clone)]
pub struct NoFormatter;

impl RunFormatter for NoFormatter {
    type Error = ();
}
