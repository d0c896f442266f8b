use std::io;

#[derive(Debug, Default, PartialEq, Eq, Clone, Copy)]
pub enum ColorSetting {
    #[default]
    Automatic,
    Always,
    Never,
}

pub(crate) mod colors {
    pub const RESET: &str = "\x1b[0m";
    pub const BOLD: &str = "\x1b[1m";
    pub const RED: &str = "\x1b[31m";
    pub const GREEN: &str = "\x1b[32m";
    pub const GRAY: &str = "\x1b[90m";
}

pub trait SupportsColor {
    fn supports_color(&self) -> bool;
}

impl<T: io::IsTerminal> SupportsColor for T {
    fn supports_color(&self) -> bool {
        self.is_terminal()
    }
}

/// Wrap `text` in `style` when `enabled`.
pub(crate) fn paint(text: &str, style: &str, enabled: bool) -> String {
    match enabled {
        true => format!("{style}{text}{}", colors::RESET),
        false => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::{colors::*, *};

    #[test]
    fn paint_only_when_enabled() {
        assert_eq!(paint("ok", GREEN, false), "ok");
        assert_eq!(paint("ok", GREEN, true), "\x1b[32mok\x1b[0m");
    }
}
