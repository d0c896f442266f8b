use std::sync::LazyLock;

use regex::Regex;

static LOCATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    // Example matches:
    //   tests\report\main.rs:4:9
    //   tests/report/main.rs:4:9
    Regex::new(r"tests[/\\][^\n:]+\.rs:\d+:\d+").unwrap()
});

static BACKTRACE_RE: LazyLock<Regex> = LazyLock::new(|| {
    // Present only when RUST_BACKTRACE is set
    Regex::new(r"(?s)\n *stack backtrace:\n.*?\n\n").unwrap()
});

pub fn sanitize_panic_output(input: &str) -> String {
    let tmp = BACKTRACE_RE.replace_all(input, "\n\n");
    let tmp = LOCATION_RE.replace_all(tmp.as_ref(), "<location>");
    tmp.to_string()
}
