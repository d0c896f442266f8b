//! Common helpers for formatter implementations.

pub mod color;

/// Prefix every line of `text` with two spaces per `level`.
pub fn indent(text: &str, level: usize) -> String {
    let prefix = "  ".repeat(level);
    text.lines()
        .map(|line| format!("{prefix}{line}"))
        .collect::<Vec<_>>()
        .join("\n")
}
