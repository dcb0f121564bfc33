//! Error rendering using ariadne
//!
//! Compilation errors point into the source; evaluation errors have no
//! span and render as a single headline.

use std::io::Write;

use ariadne::{ColorGenerator, Label, Report, ReportKind, Source};

use crate::{Diagnostic, Error, Severity};

/// Render an error with source snippets to stderr
///
/// # Example
/// ```no_run
/// use weft::{Engine, EngineOptions, render_error};
///
/// let engine = Engine::new(EngineOptions::default());
/// let source = "1 +";
/// if let Err(e) = engine.compile(source) {
///     render_error(&e, source);
/// }
/// ```
pub fn render_error(error: &Error, source: &str) {
    render_error_to_writer(error, source, &mut std::io::stderr(), true).ok();
}

/// Render an error to a specific writer
pub fn render_error_to(error: &Error, source: &str, writer: &mut dyn Write) -> std::io::Result<()> {
    render_error_to_writer(error, source, writer, true)
}

/// Render an error to a String (useful for tests, web UIs, etc.)
pub fn render_error_to_string(error: &Error, source: &str) -> String {
    let mut buf = Vec::new();
    render_error_to_writer(error, source, &mut buf, true).ok();
    String::from_utf8_lossy(&buf).to_string()
}

/// Render an error to a String without color codes (useful for tests)
pub fn render_error_to_string_no_color(error: &Error, source: &str) -> String {
    let mut buf = Vec::new();
    render_error_to_writer(error, source, &mut buf, false).ok();
    String::from_utf8_lossy(&buf).to_string()
}

fn render_error_to_writer(
    error: &Error,
    source: &str,
    writer: &mut dyn Write,
    use_color: bool,
) -> std::io::Result<()> {
    render_diagnostic(source, &error.to_diagnostic(), writer, use_color)
}

fn render_diagnostic(
    source: &str,
    diag: &Diagnostic,
    writer: &mut dyn Write,
    use_color: bool,
) -> std::io::Result<()> {
    let Some(span) = &diag.span else {
        write!(writer, "{}", diag.severity)?;
        if let Some(code) = &diag.code {
            write!(writer, "[{}]", code)?;
        }
        writeln!(writer, ": {}", diag.message)?;
        if let Some(help) = &diag.help {
            writeln!(writer, "help: {}", help)?;
        }
        return Ok(());
    };

    let mut colors = ColorGenerator::new();
    colors.next(); // Skip the first color.

    let kind = match diag.severity {
        Severity::Error => ReportKind::Error,
        Severity::Warning => ReportKind::Warning,
        Severity::Info => ReportKind::Advice,
    };

    // Spans are byte offsets; an empty span still gets a one-byte marker.
    let end = span.0.end.max(span.0.start + 1).min(source.len());
    let range = span.0.start.min(end.saturating_sub(1))..end;
    let config = ariadne::Config::default()
        .with_color(use_color)
        .with_index_type(ariadne::IndexType::Byte);

    let mut report = Report::build(kind, ("<input>", range.clone()))
        .with_message(&diag.message)
        .with_config(config);

    if let Some(code) = &diag.code {
        report = report.with_code(code);
    }

    report = report.with_label(
        Label::new(("<input>", range))
            .with_message(&diag.message)
            .with_color(colors.next()),
    );

    for related in &diag.related {
        report = report.with_label(
            Label::new(("<input>", related.span.0.clone()))
                .with_message(&related.message)
                .with_color(colors.next()),
        );
    }

    if let Some(help) = &diag.help {
        report = report.with_help(help);
    }

    report.finish().write(("<input>", Source::from(source)), &mut *writer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Engine, EngineOptions};

    #[test]
    fn test_render_parse_error() {
        let engine = Engine::new(EngineOptions::default());
        let source = "1 + + 2";
        let error = engine.compile(source).err().unwrap();

        let output = render_error_to_string_no_color(&error, source);
        assert!(output.contains("Error"));
        assert!(output.contains("1 + + 2"));
    }

    #[test]
    fn test_render_translate_error_shows_code() {
        let engine = Engine::new(EngineOptions::default());
        let source = "x = 1\nx = 2";
        let error = engine.compile(source).err().unwrap();

        let output = render_error_to_string_no_color(&error, source);
        assert!(output.contains("T003"));
        assert!(output.contains("`x` is already defined in this scope"));
        assert!(output.lines().count() > 1);
    }

    #[test]
    fn test_render_runtime_error_without_span() {
        let engine = Engine::new(EngineOptions::default());
        let source = "1 / 0";
        let program = engine.compile(source).unwrap();
        let error = program.run(&engine.runtime()).unwrap_err();

        let output = render_error_to_string_no_color(&error, source);
        assert_eq!(output, "error[E001]: runtime error: division by zero\n");
    }
}
