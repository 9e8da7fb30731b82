use crate::error;
use crate::token::Locator;
use colored::*;

pub fn format_error(f: &mut std::fmt::Formatter<'_>, err: &error::Error) -> std::fmt::Result {
    let kind = err.kind();
    let line = PrimaryLine {
        kind: PrimaryLineKind::Error,
        locator: err.locator(),
        title: kind.title(),
        notes: kind.notes(),
    };
    write!(f, "{line}")?;

    let stack_trace = err.stack_trace();
    if let Some(innermost) = stack_trace.first() {
        let line = PrimaryLine {
            kind: PrimaryLineKind::Context,
            locator: innermost.locator.as_ref(),
            title: format!["this error occurred while calling `{}`:", innermost.function],
            notes: vec![format![
                "this is the full stack trace of the error:\n\n{}",
                ErrorStack(stack_trace)
            ]],
        };
        write!(f, "\n{line}")?;
    }
    Ok(())
}

struct PrimaryLine<'a> {
    kind: PrimaryLineKind,
    locator: Option<&'a Locator>,
    title: String,
    notes: Vec<String>,
}

enum PrimaryLineKind {
    Error,
    Context,
}

impl PrimaryLineKind {
    fn color(&self) -> Color {
        match self {
            PrimaryLineKind::Error => Color::BrightRed,
            PrimaryLineKind::Context => Color::Yellow,
        }
    }
}

impl std::fmt::Display for PrimaryLineKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                PrimaryLineKind::Error => "Error",
                PrimaryLineKind::Context => "Context",
            }
            .color(self.color())
            .bold()
        )
    }
}

impl<'a> std::fmt::Display for PrimaryLine<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.kind, self.title.bold())?;
        if let Some(locator) = self.locator {
            write!(f, "\n {} {}", ">>>".bright_blue().bold(), locator)?;
        }
        for note in &self.notes {
            let mut note_lines = note.trim_end().lines();
            let first_note_line = match note_lines.next() {
                None => continue,
                Some(s) => s,
            };
            write!(f, "\n  {} {} {}", "=".bright_blue().bold(), "note:".bold(), first_note_line)?;
            for line in note_lines {
                write!(f, "\n        {line}")?;
            }
        }
        Ok(())
    }
}

struct ErrorStack<'a>(&'a [error::StackTraceElement]);

impl<'a> std::fmt::Display for ErrorStack<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, element) in self.0.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{:>3}: {}", i, element.function.to_string().yellow())?;
            if let Some(locator) = &element.locator {
                write!(f, " at {locator}")?;
            }
        }
        Ok(())
    }
}
