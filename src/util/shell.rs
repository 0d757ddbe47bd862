//! Matrix report output.
//!
//! The report goes to stdout (or any writer, in tests) and is the observable
//! contract of a run: unit numbering, labels, pass/fail glyphs and durations.
//! Diagnostics and logging go to stderr and never interleave with it.

use std::fmt::Display;
use std::io::{self, IsTerminal, Write};
use std::time::Duration;

/// Color output mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorChoice {
    /// Detect TTY and use colors if available.
    #[default]
    Auto,
    /// Always use ANSI colors.
    Always,
    /// Never use ANSI colors.
    Never,
}

impl ColorChoice {
    /// Resolve against whether stdout is a terminal.
    pub fn use_color(self) -> bool {
        self.use_color_for(&io::stdout())
    }

    /// Resolve against whether `stream` is a terminal.
    pub fn use_color_for(self, stream: &impl IsTerminal) -> bool {
        match self {
            ColorChoice::Auto => stream.is_terminal(),
            ColorChoice::Always => true,
            ColorChoice::Never => false,
        }
    }
}

impl std::str::FromStr for ColorChoice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "auto" => Ok(ColorChoice::Auto),
            "always" => Ok(ColorChoice::Always),
            "never" => Ok(ColorChoice::Never),
            _ => Err(format!(
                "invalid color choice '{}'; expected 'auto', 'always', or 'never'",
                s
            )),
        }
    }
}

/// Outcome marks printed after each unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mark {
    Pass,
    Fail,
    Skipped,
}

impl Mark {
    fn as_str(&self) -> &'static str {
        match self {
            Mark::Pass => "✓",
            Mark::Fail => "✗",
            Mark::Skipped => "skipped",
        }
    }

    fn color_code(&self) -> &'static str {
        match self {
            Mark::Pass => "\x1b[1;32m",
            Mark::Fail => "\x1b[1;31m",
            Mark::Skipped => "\x1b[1;33m",
        }
    }
}

/// Writer for the matrix report.
pub struct Shell<W: Write> {
    out: W,
    use_color: bool,
}

impl Shell<io::Stdout> {
    /// A shell on stdout.
    pub fn stdout(color: ColorChoice) -> Self {
        Shell::new(io::stdout(), color.use_color())
    }
}

impl<W: Write> Shell<W> {
    pub fn new(out: W, use_color: bool) -> Self {
        Shell { out, use_color }
    }

    /// Print without a newline and flush, so a label is visible while a build runs.
    pub fn print(&mut self, msg: impl Display) -> io::Result<()> {
        write!(self.out, "{}", msg)?;
        self.out.flush()
    }

    pub fn println(&mut self, msg: impl Display) -> io::Result<()> {
        writeln!(self.out, "{}", msg)?;
        self.out.flush()
    }

    /// Finish a unit line with its mark and, unless skipped, its duration.
    pub fn finish_unit(&mut self, mark: Mark, elapsed: Duration) -> io::Result<()> {
        let text = if self.use_color {
            format!("{}{}\x1b[0m", mark.color_code(), mark.as_str())
        } else {
            mark.as_str().to_string()
        };

        match mark {
            Mark::Skipped => self.println(text),
            Mark::Pass | Mark::Fail => self.println(format!("{} {}", text, format_duration(elapsed))),
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

/// Format a duration as `HHh MMm SSs`.
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    format!(
        "{:02}h {:02}m {:02}s",
        secs / 3600,
        (secs % 3600) / 60,
        secs % 60
    )
}
