//! Pretty diagnostic reporting using ariadne
//!
//! Renders colorful, user-friendly reports with source context. The
//! resolver tracks line/column positions, so these helpers translate a
//! position back into a byte offset in the source text before handing it
//! to ariadne.

use crate::errors::Diagnostic;
use ariadne::{Color, Label, Report, ReportKind, Source};

/// Translate a 1-based line/column position into a byte offset
fn byte_offset(source: &str, line: u32, column: u32) -> usize {
    let mut current = 1u32;
    let mut offset = 0usize;
    for l in source.split_inclusive('\n') {
        if current == line {
            let col = (column.saturating_sub(1)) as usize;
            return offset + col.min(l.len());
        }
        offset += l.len();
        current += 1;
    }
    offset
}

/// Print a diagnostic with source context
pub fn print_diagnostic(source: &str, filename: &str, diagnostic: &Diagnostic) {
    let start = byte_offset(source, diagnostic.pos.line, diagnostic.pos.column);
    let span = start..(start + 1).min(source.len()).max(start);

    let header = if filename.is_empty() {
        format!("{}", diagnostic.kind)
    } else {
        format!("{} in {}", diagnostic.kind, filename)
    };

    let mut report = Report::build(ReportKind::Error, span.clone())
        .with_message(header)
        .with_label(
            Label::new(span)
                .with_message(&diagnostic.message)
                .with_color(Color::Red),
        );

    if let Some(lhs) = &diagnostic.lhs {
        report = report.with_note(format!("left-hand side has type {}", lhs));
    }
    if let Some(rhs) = &diagnostic.rhs {
        report = report.with_note(format!("right-hand side has type {}", rhs));
    }

    report
        .finish()
        .print(Source::from(source))
        .expect("failed to print diagnostic report");
}

/// Print every diagnostic in the list
pub fn print_diagnostics(source: &str, filename: &str, diagnostics: &[Diagnostic]) {
    for diagnostic in diagnostics {
        print_diagnostic(source, filename, diagnostic);
    }
}

/// Format a diagnostic as a string (for testing)
pub fn format_diagnostic(source: &str, filename: &str, diagnostic: &Diagnostic) -> String {
    let start = byte_offset(source, diagnostic.pos.line, diagnostic.pos.column);
    let span = start..(start + 1).min(source.len()).max(start);

    let header = if filename.is_empty() {
        format!("{}", diagnostic.kind)
    } else {
        format!("{} in {}", diagnostic.kind, filename)
    };

    let report = Report::build(ReportKind::Error, span.clone())
        .with_message(header)
        .with_label(
            Label::new(span)
                .with_message(&diagnostic.message)
                .with_color(Color::Red),
        );

    let mut output = Vec::new();
    report
        .finish()
        .write(Source::from(source), &mut output)
        .expect("failed to write diagnostic report");

    String::from_utf8(output).expect("diagnostic report should be valid UTF-8")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_byte_offset_walks_lines() {
        let source = "var x:i32 = 5;\nvar y:bool = 1;\n";
        assert_eq!(byte_offset(source, 1, 1), 0);
        assert_eq!(byte_offset(source, 2, 1), 15);
        assert_eq!(byte_offset(source, 2, 5), 19);
    }

    #[test]
    fn test_offset_clamps_past_end() {
        let source = "ab\n";
        assert_eq!(byte_offset(source, 1, 40), 3);
        assert_eq!(byte_offset(source, 9, 1), 3);
    }
}
