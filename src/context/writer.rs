//! Output writer collaborator.
//!
//! Handlers write through the `Writer` trait and never touch the terminal
//! directly. `TerminalWriter` styles lines for a real terminal;
//! `BufferWriter` records them for tests and embedding hosts.

use std::io::Write as _;
use std::sync::{Arc, Mutex};

use crossterm::style::{style, Stylize};

/// Colours available for inline wrapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextColor {
    Red,
    Green,
    Yellow,
    Blue,
    Cyan,
    Magenta,
    Grey,
}

/// Kind of a written line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    /// Plain output.
    Plain,
    /// Error output.
    Error,
    /// Success output.
    Success,
    /// Informational output.
    Info,
}

/// An opaque output sink.
pub trait Writer: Send + Sync {
    /// Writes text without a trailing newline.
    fn write(&self, text: &str);

    /// Writes text followed by a newline.
    fn writeln(&self, text: &str) {
        self.write(&format!("{text}\n"));
    }

    /// Writes an error line.
    fn write_error(&self, text: &str);

    /// Writes a success line.
    fn write_success(&self, text: &str);

    /// Writes an informational line.
    fn write_info(&self, text: &str);

    /// Wraps text in a colour for inline use.
    fn wrap_color(&self, text: &str, color: TextColor) -> String;
}

/// Writes styled output to stdout.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalWriter;

impl TerminalWriter {
    /// Creates a new terminal writer.
    pub fn new() -> Self {
        Self
    }

    fn emit(&self, text: &str) {
        let mut stdout = std::io::stdout().lock();
        let _ = stdout.write_all(text.as_bytes());
        let _ = stdout.flush();
    }
}

impl Writer for TerminalWriter {
    fn write(&self, text: &str) {
        self.emit(text);
    }

    fn write_error(&self, text: &str) {
        self.emit(&format!("{}\n", style(text).red()));
    }

    fn write_success(&self, text: &str) {
        self.emit(&format!("{}\n", style(text).green()));
    }

    fn write_info(&self, text: &str) {
        self.emit(&format!("{}\n", style(text).cyan()));
    }

    fn wrap_color(&self, text: &str, color: TextColor) -> String {
        let content = style(text);
        let styled = match color {
            TextColor::Red => content.red(),
            TextColor::Green => content.green(),
            TextColor::Yellow => content.yellow(),
            TextColor::Blue => content.blue(),
            TextColor::Cyan => content.cyan(),
            TextColor::Magenta => content.magenta(),
            TextColor::Grey => content.grey(),
        };
        styled.to_string()
    }
}

/// A single recorded write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenLine {
    pub kind: LineKind,
    pub text: String,
}

/// Records everything written to it. Clones share the same buffer.
#[derive(Debug, Default, Clone)]
pub struct BufferWriter {
    lines: Arc<Mutex<Vec<WrittenLine>>>,
}

impl BufferWriter {
    /// Creates an empty buffer writer.
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&self, kind: LineKind, text: &str) {
        if let Ok(mut lines) = self.lines.lock() {
            lines.push(WrittenLine {
                kind,
                text: text.to_string(),
            });
        }
    }

    /// Returns all recorded writes.
    pub fn lines(&self) -> Vec<WrittenLine> {
        self.lines.lock().map(|l| l.clone()).unwrap_or_default()
    }

    /// Returns the text of writes of one kind.
    pub fn lines_of(&self, kind: LineKind) -> Vec<String> {
        self.lines()
            .into_iter()
            .filter(|line| line.kind == kind)
            .map(|line| line.text)
            .collect()
    }

    /// Returns the text of all error writes.
    pub fn errors(&self) -> Vec<String> {
        self.lines_of(LineKind::Error)
    }

    /// Returns all written text concatenated, one entry per line.
    pub fn contents(&self) -> String {
        self.lines()
            .iter()
            .map(|line| line.text.trim_end_matches('\n'))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Discards everything recorded so far.
    pub fn clear(&self) {
        if let Ok(mut lines) = self.lines.lock() {
            lines.clear();
        }
    }
}

impl Writer for BufferWriter {
    fn write(&self, text: &str) {
        self.record(LineKind::Plain, text);
    }

    fn writeln(&self, text: &str) {
        self.record(LineKind::Plain, text);
    }

    fn write_error(&self, text: &str) {
        self.record(LineKind::Error, text);
    }

    fn write_success(&self, text: &str) {
        self.record(LineKind::Success, text);
    }

    fn write_info(&self, text: &str) {
        self.record(LineKind::Info, text);
    }

    fn wrap_color(&self, text: &str, _color: TextColor) -> String {
        text.to_string()
    }
}
