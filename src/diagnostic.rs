use owo_colors::OwoColorize;
use std::fmt;

/// Identifies one loaded source text (the program file, an invocation line, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SourceId(pub u32);

impl SourceId {
    const DETACHED: SourceId = SourceId(u32::MAX);
}

/// A source span representing a range of bytes in one source text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub source: SourceId,
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(source: SourceId, start: usize, end: usize) -> Self {
        Self { source, start, end }
    }

    /// A span not attached to any source, used by errors raised outside the AST
    /// (builtins) until the evaluator fills in the call site.
    pub fn dummy() -> Self {
        Self {
            source: SourceId::DETACHED,
            start: 0,
            end: 0,
        }
    }

    pub fn merge(self, other: Span) -> Span {
        Span {
            source: self.source,
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    pub fn is_dummy(&self) -> bool {
        self.source == SourceId::DETACHED
    }
}

/// 1-based line and column of a byte offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Precomputed line starts so positions for every token can be found without
/// rescanning the whole source.
#[derive(Debug, Clone)]
pub struct LineIndex {
    line_starts: Vec<usize>,
}

impl LineIndex {
    pub fn new(source: &str) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(source.match_indices('\n').map(|(i, _)| i + 1));
        Self { line_starts }
    }

    pub fn position(&self, source: &str, offset: usize) -> Position {
        let offset = offset.min(source.len());
        let line = match self.line_starts.binary_search(&offset) {
            Ok(line) => line,
            Err(next) => next - 1,
        };
        let line_start = self.line_starts[line];
        let column = source
            .get(line_start..offset)
            .map(|prefix| prefix.chars().count())
            .unwrap_or(offset - line_start);
        Position {
            line: line + 1,
            column: column + 1,
        }
    }
}

/// A named source text registered for diagnostic rendering.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub name: String,
    pub text: String,
    lines: LineIndex,
}

impl SourceFile {
    pub fn position(&self, offset: usize) -> Position {
        self.lines.position(&self.text, offset)
    }

    fn line(&self, line_num: usize) -> Option<&str> {
        let start = *self.lines.line_starts.get(line_num.checked_sub(1)?)?;
        let end = self.text[start..]
            .find('\n')
            .map(|p| start + p)
            .unwrap_or(self.text.len());
        Some(self.text[start..end].trim_end_matches('\r'))
    }
}

#[derive(Debug, Clone, Default)]
pub struct SourceMap {
    files: Vec<SourceFile>,
}

impl SourceMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, name: impl Into<String>, text: impl Into<String>) -> SourceId {
        let text = text.into();
        let id = SourceId(self.files.len() as u32);
        self.files.push(SourceFile {
            name: name.into(),
            lines: LineIndex::new(&text),
            text,
        });
        id
    }

    pub fn get(&self, id: SourceId) -> Option<&SourceFile> {
        self.files.get(id.0 as usize)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Forget every source added after the first `len`. Their ids will be
    /// handed out again.
    pub fn truncate(&mut self, len: usize) {
        self.files.truncate(len);
    }
}

/// Severity level for diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
        }
    }
}

/// Style for diagnostic labels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelStyle {
    Primary,
    Secondary,
}

/// A label pointing to a specific span in the source
#[derive(Debug, Clone)]
pub struct Label {
    pub span: Span,
    pub message: String,
    pub style: LabelStyle,
}

impl Label {
    pub fn primary(span: Span, message: impl Into<String>) -> Self {
        Self {
            span,
            message: message.into(),
            style: LabelStyle::Primary,
        }
    }

    pub fn secondary(span: Span, message: impl Into<String>) -> Self {
        Self {
            span,
            message: message.into(),
            style: LabelStyle::Secondary,
        }
    }
}

/// A complete diagnostic message
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: Option<String>,
    pub message: String,
    pub labels: Vec<Label>,
    pub notes: Vec<String>,
}

impl Diagnostic {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            code: None,
            message: message.into(),
            labels: Vec::new(),
            notes: Vec::new(),
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// Labels on detached spans are dropped; there is no source line to point at.
    pub fn with_label(mut self, label: Label) -> Self {
        if !label.span.is_dummy() {
            self.labels.push(label);
        }
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.notes.push(format!("help: {}", help.into()));
        self
    }
}

/// Diagnostic renderer for Rust-like error output
pub struct DiagnosticRenderer<'a> {
    sources: &'a SourceMap,
    use_color: bool,
}

impl<'a> DiagnosticRenderer<'a> {
    pub fn new(sources: &'a SourceMap, use_color: bool) -> Self {
        Self { sources, use_color }
    }

    /// Render a diagnostic to a string
    pub fn render(&self, diagnostic: &Diagnostic) -> String {
        let mut output = String::new();

        // error[E0001]: message
        self.render_header(&mut output, diagnostic);

        if let Some(first) = diagnostic.labels.first() {
            if let Some(file) = self.sources.get(first.span.source) {
                self.render_snippet(&mut output, diagnostic, file, first.span.source);
            }
        }

        for note in &diagnostic.notes {
            output.push_str(&format!("  {} {}\n", self.style_blue("="), note));
        }

        output
    }

    fn render_header(&self, output: &mut String, diagnostic: &Diagnostic) {
        let severity_str = match diagnostic.severity {
            Severity::Error => self.style_red_bold("error"),
        };

        if let Some(code) = &diagnostic.code {
            output.push_str(&format!(
                "{}[{}]: {}\n",
                severity_str,
                code,
                self.style_bold(&diagnostic.message)
            ));
        } else {
            output.push_str(&format!(
                "{}: {}\n",
                severity_str,
                self.style_bold(&diagnostic.message)
            ));
        }
    }

    fn render_snippet(&self, output: &mut String, diagnostic: &Diagnostic, file: &SourceFile, source: SourceId) {
        let labels: Vec<&Label> = diagnostic
            .labels
            .iter()
            .filter(|label| label.span.source == source)
            .collect();

        let mut lines_to_show: Vec<usize> = Vec::new();
        for label in &labels {
            let start_line = file.position(label.span.start).line;
            let end_line = file
                .position(label.span.end.saturating_sub(1).max(label.span.start))
                .line;
            for line in start_line..=end_line {
                if !lines_to_show.contains(&line) {
                    lines_to_show.push(line);
                }
            }
        }
        lines_to_show.sort();

        let start = file.position(labels[0].span.start);
        output.push_str(&format!(
            "  {} {}:{}\n",
            self.style_blue("-->"),
            file.name,
            start
        ));

        let max_line = lines_to_show.last().copied().unwrap_or(1);
        let width = max_line.to_string().len();

        output.push_str(&format!("{} {}\n", " ".repeat(width + 1), self.style_blue("|")));
        for &line_num in &lines_to_show {
            self.render_line(output, file, &labels, line_num, width);
        }
        output.push_str(&format!("{} {}\n", " ".repeat(width + 1), self.style_blue("|")));
    }

    fn render_line(&self, output: &mut String, file: &SourceFile, labels: &[&Label], line_num: usize, width: usize) {
        let Some(content) = file.line(line_num) else {
            return;
        };

        output.push_str(&format!(
            "{:>width$} {} {}\n",
            self.style_blue(&line_num.to_string()),
            self.style_blue("|"),
            content,
            width = width + 1
        ));

        let line_len = content.chars().count();
        let mut underlines: Vec<(usize, usize, &str, LabelStyle)> = Vec::new();
        for label in labels {
            let start = file.position(label.span.start);
            let end = file.position(label.span.end.saturating_sub(1).max(label.span.start));

            if start.line <= line_num && end.line >= line_num {
                let col_start = if start.line == line_num { start.column } else { 1 };
                let col_end = if end.line == line_num {
                    end.column + 1
                } else {
                    line_len + 1
                };
                underlines.push((col_start, col_end.max(col_start + 1), &label.message, label.style));
            }
        }

        if underlines.is_empty() {
            return;
        }

        underlines.sort_by_key(|(start, _, _, _)| *start);

        let mut underline_str = String::new();
        let mut pos = 1;
        for (col_start, col_end, _, style) in &underlines {
            while pos < *col_start {
                underline_str.push(' ');
                pos += 1;
            }
            let marker = match style {
                LabelStyle::Primary => '^',
                LabelStyle::Secondary => '-',
            };
            while pos < *col_end {
                underline_str.push(marker);
                pos += 1;
            }
        }

        let styled_underline = if underlines.iter().any(|(_, _, _, s)| *s == LabelStyle::Primary) {
            self.style_red(&underline_str)
        } else {
            self.style_blue(&underline_str)
        };
        output.push_str(&format!(
            "{} {} {}\n",
            " ".repeat(width + 1),
            self.style_blue("|"),
            styled_underline
        ));

        for (col_start, _, message, style) in &underlines {
            if message.is_empty() {
                continue;
            }
            let padding = " ".repeat(col_start.saturating_sub(1));
            let styled_msg = match style {
                LabelStyle::Primary => self.style_red(message),
                LabelStyle::Secondary => self.style_blue(message),
            };
            output.push_str(&format!(
                "{} {} {}{}\n",
                " ".repeat(width + 1),
                self.style_blue("|"),
                padding,
                styled_msg
            ));
        }
    }

    fn style_red(&self, s: &str) -> String {
        if self.use_color {
            s.red().to_string()
        } else {
            s.to_string()
        }
    }

    fn style_red_bold(&self, s: &str) -> String {
        if self.use_color {
            s.red().bold().to_string()
        } else {
            s.to_string()
        }
    }

    fn style_blue(&self, s: &str) -> String {
        if self.use_color {
            s.blue().to_string()
        } else {
            s.to_string()
        }
    }

    fn style_bold(&self, s: &str) -> String {
        if self.use_color {
            s.bold().to_string()
        } else {
            s.to_string()
        }
    }
}

/// Render multiple diagnostics followed by an error count summary
pub fn render_diagnostics(sources: &SourceMap, diagnostics: &[Diagnostic], use_color: bool) -> String {
    let renderer = DiagnosticRenderer::new(sources, use_color);
    let mut output = String::new();

    for diagnostic in diagnostics {
        output.push_str(&renderer.render(diagnostic));
        output.push('\n');
    }

    let error_count = diagnostics
        .iter()
        .filter(|d| d.severity == Severity::Error)
        .count();
    if error_count > 0 {
        output.push_str(&format!(
            "error: aborting due to {} error{}\n",
            error_count,
            if error_count == 1 { "" } else { "s" }
        ));
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_index_positions() {
        let source = "{def {x} = 5}\n\n  {def {y} = 'é'}\n";
        let index = LineIndex::new(source);
        assert_eq!(index.position(source, 0), Position { line: 1, column: 1 });
        assert_eq!(index.position(source, 5), Position { line: 1, column: 6 });
        assert_eq!(index.position(source, 14), Position { line: 2, column: 1 });
        assert_eq!(index.position(source, 17), Position { line: 3, column: 3 });
        // Columns count characters, not bytes.
        let after_accent = source.find('é').map(|i| i + 'é'.len_utf8()).unwrap();
        assert_eq!(index.position(source, after_accent), Position { line: 3, column: 16 });
        assert_eq!(index.position(source, source.len()), Position { line: 4, column: 1 });
    }

    #[test]
    fn test_source_map_truncate_reuses_ids() {
        let mut sources = SourceMap::new();
        let program = sources.add("prog.a9", "{def {x} = 1}");
        let mark = sources.len();
        let first = sources.add("<repl:1>", "x");
        sources.truncate(mark);
        assert_eq!(sources.len(), 1);
        assert!(sources.get(first).is_none());
        assert_eq!(sources.add("<repl:2>", "{x}"), first);
        assert_eq!(sources.get(program).map(|file| file.name.as_str()), Some("prog.a9"));
    }

    #[test]
    fn test_span_merge() {
        let s1 = Span::new(SourceId(0), 5, 10);
        let s2 = Span::new(SourceId(0), 8, 15);
        let merged = s1.merge(s2);
        assert_eq!(merged.start, 5);
        assert_eq!(merged.end, 15);
    }

    #[test]
    fn test_dummy_labels_are_dropped() {
        let diagnostic = Diagnostic::error("boom").with_label(Label::primary(Span::dummy(), "here"));
        assert!(diagnostic.labels.is_empty());
    }

    #[test]
    fn test_diagnostic_rendering() {
        let mut sources = SourceMap::new();
        let id = sources.add("prog.a9", "{def {x} = }\n");
        let diagnostic = Diagnostic::error("expected expression")
            .with_code("E0101")
            .with_label(Label::primary(Span::new(id, 11, 12), "expected expression here"))
            .with_help("provide a body after `=`");

        let output = DiagnosticRenderer::new(&sources, false).render(&diagnostic);

        assert!(output.contains("error[E0101]"));
        assert!(output.contains("expected expression"));
        assert!(output.contains("prog.a9:1:12"));
        assert!(output.contains("^"));
        assert!(output.contains("help: provide a body"));
    }

    #[test]
    fn test_render_summary_counts_errors() {
        let sources = SourceMap::new();
        let diagnostics = vec![Diagnostic::error("a"), Diagnostic::error("b")];
        let output = render_diagnostics(&sources, &diagnostics, false);
        assert!(output.contains("aborting due to 2 errors"));
    }
}
