use std::io;

use crate::{
    formatter::{
        common::{
            color::{ColorSetting, SupportsColor, colors::*, paint},
            indent,
        },
        *,
    },
    test::TestState,
};

/// Nested console output.
///
/// Scopes print as headers indented by their depth, passed tests as `> name`
/// and failed tests with their failure ordinal. The closing summary lists
/// counts and the detail of every failure.
#[derive(Debug)]
pub struct PrettyFormatter<W: io::Write> {
    target: W,
    color_setting: ColorSetting,
}

impl Default for PrettyFormatter<io::Stdout> {
    fn default() -> Self {
        Self {
            target: io::stdout(),
            color_setting: Default::default(),
        }
    }
}

impl<W: io::Write> PrettyFormatter<W> {
    pub fn with_target<WithTarget: io::Write>(
        self,
        with_target: WithTarget,
    ) -> PrettyFormatter<WithTarget> {
        PrettyFormatter {
            target: with_target,
            color_setting: self.color_setting,
        }
    }

    pub fn with_color_setting(self, color_setting: impl Into<ColorSetting>) -> Self {
        PrettyFormatter {
            color_setting: color_setting.into(),
            ..self
        }
    }

    pub fn into_target(self) -> W {
        self.target
    }
}

impl<W: io::Write + SupportsColor> PrettyFormatter<W> {
    /// Return whether this formatter will currently emit colored output.
    pub fn use_color(&self) -> bool {
        match self.color_setting {
            ColorSetting::Automatic => self.target.supports_color(),
            ColorSetting::Always => true,
            ColorSetting::Never => false,
        }
    }
}

impl<W: io::Write + SupportsColor> RunFormatter for PrettyFormatter<W> {
    type Error = io::Error;

    fn fmt_run_start(&mut self, _: FmtRunStart) -> Result<(), Self::Error> {
        writeln!(self.target)
    }

    fn fmt_scope_start(&mut self, data: FmtScopeStart<'_>) -> Result<(), Self::Error> {
        let color = self.use_color();
        writeln!(
            self.target,
            "{}",
            indent(&paint(data.description, BOLD, color), data.depth)
        )
    }

    fn fmt_test_outcome(&mut self, data: FmtTestOutcome<'_>) -> Result<(), Self::Error> {
        let color = self.use_color();
        let line = match (data.state, data.ordinal) {
            (TestState::Passed, _) => format!(
                "{} {}",
                paint(">", GREEN, color),
                paint(data.description, GRAY, color)
            ),
            (TestState::Failed(_), Some(ordinal)) if data.late => format!(
                "{} {}",
                paint(&format!("{ordinal})"), RED, color),
                paint(&format!("{} (after completion)", data.path), RED, color)
            ),
            (TestState::Failed(_), Some(ordinal)) => format!(
                "{} {}",
                paint(&format!("{ordinal})"), RED, color),
                paint(data.description, RED, color)
            ),
            _ => return Ok(()),
        };
        let depth = match data.late {
            true => 1,
            false => data.depth,
        };
        writeln!(self.target, "{}", indent(&line, depth))
    }

    fn fmt_fatal(&mut self, FmtFatal { failure }: FmtFatal<'_>) -> Result<(), Self::Error> {
        let color = self.use_color();
        let scope = match failure.scope.is_empty() {
            true => String::from("root scope"),
            false => format!("`{}`", failure.scope),
        };
        writeln!(self.target)?;
        writeln!(
            self.target,
            "{}",
            indent(
                &paint(&format!("`{}` hook of {scope} failed:", failure.hook), RED, color),
                1
            )
        )?;
        writeln!(
            self.target,
            "{}",
            indent(&paint(&failure.failure.render(), GRAY, color), 2)
        )
    }

    fn fmt_run_outcomes(
        &mut self,
        FmtRunOutcomes {
            stats, failures, ..
        }: FmtRunOutcomes<'_>,
    ) -> Result<(), Self::Error> {
        let color = self.use_color();
        writeln!(self.target)?;

        if stats.passed > 0 || stats.failed == 0 {
            let passing = format!("{} passing", stats.passed);
            writeln!(self.target, "{}", indent(&paint(&passing, GREEN, color), 1))?;
        }

        if stats.failed > 0 {
            let failing = format!("{} failing", stats.failed);
            writeln!(self.target, "{}", indent(&paint(&failing, RED, color), 1))?;
        }

        for (index, item) in failures.iter().enumerate() {
            writeln!(self.target)?;
            writeln!(
                self.target,
                "{}",
                indent(&format!("{}) {}", index + 1, item.description), 1)
            )?;
            writeln!(self.target)?;
            writeln!(
                self.target,
                "{}",
                indent(&paint(&item.failure.render(), GRAY, color), 2)
            )?;
        }

        writeln!(self.target)
    }
}
