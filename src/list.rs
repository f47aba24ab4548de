//! List item classification and numbering sequences.
//!
//! Numbered items that follow each other without interruption share one
//! sequence id. Anything else in between (a blank line, a bullet, a
//! paragraph) ends the run, and the next numbered item opens a new sequence
//! so its counter starts again at 1. Fenced code is skipped as a whole.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::fence;

static NUMBERED_ITEM: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\s*)\d+\.\s+(.*)$").unwrap());
static BULLET_ITEM: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\s*)[-*+]\s+(.*)$").unwrap());
static BOLD_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\*\*(.+)\*\*$").unwrap());
static RULE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:(?:-\s*){3,}|(?:\*\s*){3,}|(?:_\s*){3,})$").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Numbered,
    Bullet,
    Other,
}

/// `---`, `***`, `___` and their spaced forms such as `- - -`.
pub fn is_rule(line: &str) -> bool {
    RULE.is_match(line.trim())
}

pub fn classify(line: &str) -> LineKind {
    if is_rule(line) {
        LineKind::Other
    } else if NUMBERED_ITEM.is_match(line) {
        LineKind::Numbered
    } else if BULLET_ITEM.is_match(line) {
        LineKind::Bullet
    } else {
        LineKind::Other
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListItem {
    /// Content after the list marker.
    pub text: String,
    /// Bold line written under the item at deeper indentation.
    pub bold_continuation: Option<String>,
    pub numbered: bool,
    /// Set for numbered items once sequenced.
    pub sequence_id: Option<u32>,
}

impl ListItem {
    pub fn kind(&self) -> LineKind {
        if self.numbered {
            LineKind::Numbered
        } else {
            LineKind::Bullet
        }
    }
}

/// Numbering state for one conversion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListSequenceState {
    counter: u32,
    in_numbered_run: bool,
}

impl ListSequenceState {
    pub fn new() -> Self {
        Self::default()
    }

    /// The most recently issued sequence id, 0 before any numbered item.
    pub fn current(&self) -> u32 {
        self.counter
    }

    /// Advance past one list item or other line. Returns the sequence id
    /// for numbered items.
    pub fn advance(self, kind: LineKind) -> (Self, Option<u32>) {
        match kind {
            LineKind::Numbered => {
                let counter = if self.in_numbered_run {
                    self.counter
                } else {
                    self.counter + 1
                };
                let next = Self {
                    counter,
                    in_numbered_run: true,
                };
                (next, Some(counter))
            }
            LineKind::Bullet | LineKind::Other => (
                Self {
                    in_numbered_run: false,
                    ..self
                },
                None,
            ),
        }
    }
}

fn indentation(line: &str) -> usize {
    line.chars().take_while(|c| c.is_whitespace()).count()
}

/// Text of a line that is entirely `**bold**`, if it is.
fn bold_line(line: &str) -> Option<&str> {
    let captures = BOLD_LINE.captures(line.trim())?;
    let inner = captures.get(1)?.as_str();
    if inner.contains("**") {
        return None;
    }
    Some(inner)
}

/// Parse the list item starting at `lines[index]`.
///
/// Returns the item (without a sequence id) and the number of lines it
/// spans: 2 when the next line is its bold continuation, otherwise 1.
pub fn parse_item<S: AsRef<str>>(lines: &[S], index: usize) -> Option<(ListItem, usize)> {
    let line = lines.get(index)?.as_ref();
    if is_rule(line) {
        return None;
    }
    let (captures, numbered) = match NUMBERED_ITEM.captures(line) {
        Some(captures) => (captures, true),
        None => (BULLET_ITEM.captures(line)?, false),
    };
    let indent = captures.get(1).map_or(0, |m| m.as_str().chars().count());
    let text = captures.get(2).map_or("", |m| m.as_str()).trim_end();

    let continuation = lines.get(index + 1).map(AsRef::as_ref).and_then(|next| {
        if indentation(next) > indent && classify(next) == LineKind::Other {
            bold_line(next)
        } else {
            None
        }
    });

    let item = ListItem {
        text: text.to_string(),
        bold_continuation: continuation.map(str::to_string),
        numbered,
        sequence_id: None,
    };
    let span = if item.bold_continuation.is_some() { 2 } else { 1 };
    Some((item, span))
}

/// Sequence ids for every line of a document.
///
/// Entry `i` is `Some` when line `i` starts a numbered item. Continuation
/// lines belong to their item and do not interrupt a run. A fenced code block
/// interrupts once and nothing inside it is numbered.
pub fn sequence_lines<S: AsRef<str>>(
    lines: &[S],
    mut state: ListSequenceState,
) -> (Vec<Option<u32>>, ListSequenceState) {
    let mut ids = vec![None; lines.len()];
    let mut i = 0;

    while i < lines.len() {
        if fence::opening(lines[i].as_ref()).is_some() {
            state = state.advance(LineKind::Other).0;
            i = fence::closing(lines, i) + 1;
            continue;
        }

        match parse_item(lines, i) {
            Some((item, span)) => {
                let (next, id) = state.advance(item.kind());
                state = next;
                ids[i] = id;
                i += span;
            }
            None => {
                state = state.advance(LineKind::Other).0;
                i += 1;
            }
        }
    }

    (ids, state)
}
