//! Inline formatting: turns one line of text into styled runs.
//!
//! Recognises `**bold**`, `*italic*`, `` `code` `` and the escapes `\*`,
//! `` \` `` and `\\`. Markers left open at the end of the line are put back
//! as literal text, so no formatting ever leaks into the next line.

use crate::block::{Color, TextRun};

/// Run sizes for one line, in half-points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunDefaults {
    pub size: u32,
    pub code_size: u32,
    pub right_to_left: bool,
}

impl RunDefaults {
    /// Inline code is two half-points smaller than the paragraph text, or 20
    /// when the paragraph size is unset.
    pub fn from_paragraph_size(size: Option<u32>, right_to_left: bool) -> Self {
        Self {
            size: size.unwrap_or(24),
            code_size: size.map(|s| s.saturating_sub(2)).unwrap_or(20),
            right_to_left,
        }
    }
}

impl Default for RunDefaults {
    fn default() -> Self {
        Self::from_paragraph_size(None, false)
    }
}

/// Formatting state while scanning a single line.
///
/// The marker positions record where an open `**` or `*` was seen; they
/// only matter for the end-of-line recovery.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FormattingState {
    pub bold: bool,
    pub italic: bool,
    pub inline_code: bool,
    pub bold_marker: Option<usize>,
    pub italic_marker: Option<usize>,
}

impl FormattingState {
    fn toggle_bold(self, at: usize) -> Self {
        let bold = !self.bold;
        Self {
            bold,
            bold_marker: bold.then_some(at),
            ..self
        }
    }

    fn toggle_italic(self, at: usize) -> Self {
        let italic = !self.italic;
        Self {
            italic,
            italic_marker: italic.then_some(at),
            ..self
        }
    }

    fn toggle_code(self) -> Self {
        Self {
            inline_code: !self.inline_code,
            ..self
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Dialect {
    Body,
    /// No code spans; an empty result defaults to bold.
    Heading,
}

/// Split a line of body text into styled runs. Always returns at least one run.
pub fn tokenize(line: &str, defaults: &RunDefaults) -> Vec<TextRun> {
    Tokenizer::new(line, Dialect::Body, *defaults).run()
}

/// Split heading text into runs of the given size.
pub fn tokenize_heading(text: &str, size: u32, right_to_left: bool) -> Vec<TextRun> {
    let defaults = RunDefaults {
        size,
        code_size: size,
        right_to_left,
    };
    Tokenizer::new(text, Dialect::Heading, defaults).run()
}

struct Tokenizer {
    chars: Vec<char>,
    dialect: Dialect,
    defaults: RunDefaults,
    pending: String,
    runs: Vec<TextRun>,
}

impl Tokenizer {
    fn new(line: &str, dialect: Dialect, defaults: RunDefaults) -> Self {
        Self {
            chars: line.chars().collect(),
            dialect,
            defaults,
            pending: String::new(),
            runs: Vec::new(),
        }
    }

    fn run(mut self) -> Vec<TextRun> {
        let mut state = FormattingState::default();
        let mut pos = 0;
        while pos < self.chars.len() {
            (pos, state) = self.step(pos, state);
        }
        self.finish(state)
    }

    /// Consume the input at `pos`, returning the next position and state.
    fn step(&mut self, pos: usize, state: FormattingState) -> (usize, FormattingState) {
        let c = self.chars[pos];
        let next = self.chars.get(pos + 1).copied();

        if c == '\\' {
            if let Some(escaped) = next {
                if self.is_escapable(escaped) {
                    self.pending.push(escaped);
                    return (pos + 2, state);
                }
                self.pending.push(c);
                return (pos + 1, state);
            }
        }

        if c == '`' && self.dialect == Dialect::Body {
            if state.inline_code {
                self.flush_code();
            } else {
                self.flush(state);
            }
            return (pos + 1, state.toggle_code());
        }

        if state.inline_code {
            self.pending.push(c);
            return (pos + 1, state);
        }

        if c == '*' && next == Some('*') {
            self.flush(state);
            return (pos + 2, state.toggle_bold(pos));
        }

        // A lone `*`; the one before it may still be the tail of `**`.
        if c == '*' && (pos == 0 || self.chars[pos - 1] != '*') {
            self.flush(state);
            return (pos + 1, state.toggle_italic(pos));
        }

        self.pending.push(c);
        (pos + 1, state)
    }

    fn is_escapable(&self, c: char) -> bool {
        match self.dialect {
            Dialect::Body => matches!(c, '*' | '`' | '\\'),
            Dialect::Heading => matches!(c, '*' | '\\'),
        }
    }

    fn text_run(&self, text: String, state: FormattingState) -> TextRun {
        TextRun::new(text, self.defaults.size)
            .with_bold(state.bold)
            .with_italic(state.italic)
            .with_rtl(self.defaults.right_to_left)
    }

    fn flush(&mut self, state: FormattingState) {
        if self.pending.is_empty() {
            return;
        }
        let text = std::mem::take(&mut self.pending);
        let run = self.text_run(text, state);
        self.runs.push(run);
    }

    fn flush_code(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        let text = std::mem::take(&mut self.pending);
        self.runs.push(inline_code_run(text, &self.defaults));
    }

    fn finish(mut self, mut state: FormattingState) -> Vec<TextRun> {
        if !self.pending.is_empty() {
            let mut text = std::mem::take(&mut self.pending);
            if state.bold && state.bold_marker.is_some() {
                text.insert_str(0, "**");
                state.bold = false;
            }
            if state.italic && state.italic_marker.is_some() {
                text.insert(0, '*');
                state.italic = false;
            }
            if state.inline_code {
                text.insert(0, '`');
            }
            if !text.trim().is_empty() {
                let run = self.text_run(text, state);
                self.runs.push(run);
            }
        }

        if self.runs.is_empty() {
            let empty = TextRun::new("", self.defaults.size)
                .with_bold(self.dialect == Dialect::Heading)
                .with_rtl(self.defaults.right_to_left);
            self.runs.push(empty);
        }
        self.runs
    }
}

/// A monospace run for inline code. Carries no bold or italic.
pub fn inline_code_run(text: impl Into<String>, defaults: &RunDefaults) -> TextRun {
    let mut run = TextRun::new(text, defaults.code_size)
        .monospace()
        .with_color(Color::CODE_TEXT)
        .shaded(Color::CODE_FILL)
        .with_rtl(defaults.right_to_left);
    run.code = true;
    run
}
