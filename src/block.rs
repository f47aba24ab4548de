use std::fmt;

use crate::config::Alignment;
use crate::image::ImageFormat;

/// An RGB colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color(pub u32);

impl Color {
    pub const BLACK: Color = Color(0x000000);
    pub const CODE_TEXT: Color = Color(0x444444);
    pub const MUTED: Color = Color(0x666666);
    pub const CODE_FILL: Color = Color(0xF5F5F5);
    pub const CODE_BORDER: Color = Color(0xDDDDDD);
    pub const QUOTE_BORDER: Color = Color(0xAAAAAA);
    pub const HEADER_FILL: Color = Color(0xF2F2F2);
    pub const REPORT_HEADER_FILL: Color = Color(0xDDDDDD);
    pub const ERROR: Color = Color(0xFF0000);
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:06X}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Font {
    Body,
    Monospace,
}

/// A contiguous span of text sharing one formatting state.
///
/// Sizes are in half-points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextRun {
    pub text: String,
    pub bold: bool,
    pub italic: bool,
    /// Inline code span. Never combined with bold or italic.
    pub code: bool,
    pub font: Font,
    pub size: u32,
    pub color: Color,
    pub shading: Option<Color>,
    pub right_to_left: bool,
}

impl TextRun {
    /// Plain black body text.
    pub fn new(text: impl Into<String>, size: u32) -> Self {
        Self {
            text: text.into(),
            bold: false,
            italic: false,
            code: false,
            font: Font::Body,
            size,
            color: Color::BLACK,
            shading: None,
            right_to_left: false,
        }
    }

    pub fn with_bold(mut self, bold: bool) -> Self {
        self.bold = bold;
        self
    }

    pub fn with_italic(mut self, italic: bool) -> Self {
        self.italic = italic;
        self
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    pub fn with_rtl(mut self, right_to_left: bool) -> Self {
        self.right_to_left = right_to_left;
        self
    }

    pub fn monospace(mut self) -> Self {
        self.font = Font::Monospace;
        self
    }

    pub fn shaded(mut self, fill: Color) -> Self {
        self.shading = Some(fill);
        self
    }
}

/// Paragraph content: styled runs with explicit line breaks between them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inline {
    Run(TextRun),
    LineBreak,
}

impl From<TextRun> for Inline {
    fn from(run: TextRun) -> Self {
        Inline::Run(run)
    }
}

/// Vertical spacing around a block, in twips.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Spacing {
    pub before: u32,
    pub after: u32,
}

impl Spacing {
    pub fn even(amount: u32) -> Self {
        Self {
            before: amount,
            after: amount,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LineHeight {
    /// Multiple of the font's natural line height.
    Auto(f32),
    /// Fixed height in twips.
    Exact(u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BorderEdges {
    Left,
    All,
}

/// Border decoration. `size` is in eighths of a point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Border {
    pub edges: BorderEdges,
    pub size: u8,
    pub color: Color,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Paragraph {
    pub content: Vec<Inline>,
    /// `None` leaves the target format's default alignment in place.
    pub alignment: Option<Alignment>,
    /// Left indent in twips.
    pub indent: u32,
    pub border: Option<Border>,
    pub shading: Option<Color>,
    pub spacing: Spacing,
    pub line_height: Option<LineHeight>,
    pub right_to_left: bool,
}

impl Paragraph {
    pub fn new(content: Vec<Inline>) -> Self {
        Self {
            content,
            alignment: None,
            indent: 0,
            border: None,
            shading: None,
            spacing: Spacing::default(),
            line_height: None,
            right_to_left: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Heading {
    pub level: u8,
    pub runs: Vec<TextRun>,
    pub alignment: Alignment,
    /// Anchor id usable for internal links and the table of contents.
    pub bookmark: String,
    pub spacing: Spacing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListMarker {
    /// Flat level-0 bullet.
    Bullet,
    /// Numbered item; each `sequence_id` has its own counter starting at 1.
    Numbered { sequence_id: u32 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ListParagraph {
    pub content: Vec<Inline>,
    pub marker: ListMarker,
    pub spacing: Spacing,
    pub right_to_left: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableCell {
    pub runs: Vec<TextRun>,
    pub shading: Option<Color>,
    pub alignment: Option<Alignment>,
}

/// A rendered table. Rows are kept as parsed, so a ragged row may hold
/// more or fewer cells than `columns`.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub columns: usize,
    pub header: Vec<TableCell>,
    pub rows: Vec<Vec<TableCell>>,
}

/// A resolved image. Dimensions are in pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct Image {
    pub alt: String,
    pub data: Vec<u8>,
    pub format: ImageFormat,
    pub width: u32,
    pub height: u32,
    pub alignment: Alignment,
    pub spacing: Spacing,
}

/// Document elements in source order, ready for a serialization backend.
#[derive(Debug, Clone, PartialEq)]
pub enum Element {
    Heading(Heading),
    Paragraph(Paragraph),
    ListItem(ListParagraph),
    Table(Table),
    Image(Image),
    TableOfContents,
    PageBreak,
    Rule,
}
