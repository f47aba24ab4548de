//! Block renderers: parsed structures plus style in, element descriptors out.

use crate::block::{
    Border, BorderEdges, Color, Element, Heading, Image, Inline, LineHeight, ListMarker,
    ListParagraph, Paragraph, Spacing, Table, TableCell, TextRun,
};
use crate::config::{Alignment, DocumentType, Style};
use crate::image::{ImageData, ImageRef, resolve_size};
use crate::inline::{tokenize, tokenize_heading};
use crate::list::ListItem;
use crate::table::TableModel;

const NBSP: char = '\u{00A0}';

/// Left indent for blockquotes, in twips.
const QUOTE_INDENT: u32 = 720;
/// Left indent for code blocks, in twips.
const CODE_INDENT: u32 = 360;
/// Fixed code block line height, in twips.
const CODE_LINE_HEIGHT: u32 = 360;

pub fn render_paragraph(line: &str, style: &Style) -> Element {
    let runs = tokenize(line, &style.run_defaults());
    let mut paragraph = Paragraph::new(runs.into_iter().map(Inline::from).collect());
    paragraph.alignment = style.paragraph_alignment;
    paragraph.spacing = Spacing::even(style.paragraph_spacing);
    paragraph.line_height = Some(LineHeight::Auto(style.line_spacing));
    paragraph.right_to_left = style.right_to_left();
    Element::Paragraph(paragraph)
}

pub fn render_heading(level: u8, text: &str, style: &Style) -> Element {
    let runs = tokenize_heading(text, style.heading_size(level), style.right_to_left());
    Element::Heading(Heading {
        level,
        runs,
        alignment: style.alignment_for_heading(level),
        bookmark: bookmark_id(text),
        spacing: Spacing::even(style.heading_spacing),
    })
}

/// Anchor id for heading text: ASCII alphanumerics and `_` only, whitespace
/// runs turned into `_`, never starting with a digit, at most 40 chars.
pub fn bookmark_id(text: &str) -> String {
    let mut id = String::new();
    let mut in_whitespace = false;
    for c in text.chars() {
        if c.is_whitespace() {
            if !in_whitespace {
                id.push('_');
            }
            in_whitespace = true;
        } else if c.is_ascii_alphanumeric() || c == '_' {
            id.push(c);
            in_whitespace = false;
        }
    }
    if !id.starts_with(|c: char| c.is_ascii_alphabetic() || c == '_') {
        id.insert(0, '_');
    }
    id.chars().take(40).collect()
}

/// One italic run, indented, with a left border. Alignment is only applied
/// when the style sets it.
pub fn render_blockquote(text: &str, style: &Style) -> Element {
    let run = TextRun::new(text, style.blockquote_size.unwrap_or(24))
        .with_italic(true)
        .with_rtl(style.right_to_left());

    let mut paragraph = Paragraph::new(vec![run.into()]);
    paragraph.alignment = style.blockquote_alignment;
    paragraph.indent = QUOTE_INDENT;
    paragraph.border = Some(Border {
        edges: BorderEdges::Left,
        size: 3,
        color: Color::QUOTE_BORDER,
    });
    paragraph.spacing = Spacing::even(style.paragraph_spacing);
    paragraph.right_to_left = style.right_to_left();
    Element::Paragraph(paragraph)
}

/// Replace leading whitespace with non-breaking spaces so indentation survives.
fn preserve_indent(line: &str) -> String {
    let body = line.trim_start();
    let indent = line.chars().count() - body.chars().count();
    let mut out: String = std::iter::repeat_n(NBSP, indent).collect();
    out.push_str(body);
    out
}

pub fn render_code_block(code: &str, language: Option<&str>, style: &Style) -> Element {
    let rtl = style.right_to_left();
    let mut content: Vec<Inline> = Vec::new();

    if let Some(language) = language.filter(|l| !l.is_empty()) {
        let label = TextRun::new(language, style.code_block_size.unwrap_or(18))
            .monospace()
            .with_bold(true)
            .with_color(Color::MUTED)
            .with_rtl(rtl);
        content.push(label.into());
        content.push(Inline::LineBreak);
    }

    let size = style.code_block_size.unwrap_or(20);
    for (index, line) in code.split('\n').enumerate() {
        if index > 0 {
            content.push(Inline::LineBreak);
        }
        let run = TextRun::new(preserve_indent(line), size)
            .monospace()
            .with_color(Color::CODE_TEXT)
            .with_rtl(rtl);
        content.push(run.into());
    }

    let mut paragraph = Paragraph::new(content);
    paragraph.indent = CODE_INDENT;
    paragraph.border = Some(Border {
        edges: BorderEdges::All,
        size: 1,
        color: Color::CODE_BORDER,
    });
    paragraph.shading = Some(Color::CODE_FILL);
    paragraph.spacing = Spacing::even(style.paragraph_spacing);
    paragraph.line_height = Some(LineHeight::Exact(CODE_LINE_HEIGHT));
    Element::Paragraph(paragraph)
}

/// Header cells shaded, centered and bold; body cells plain. Rows keep
/// whatever cell count they were parsed with.
pub fn render_table(model: &TableModel, document_type: DocumentType, style: &Style) -> Element {
    let size = style.paragraph_size.unwrap_or(24);
    let fill = match document_type {
        DocumentType::Report => Color::REPORT_HEADER_FILL,
        DocumentType::Document => Color::HEADER_FILL,
    };

    let header = model
        .headers
        .iter()
        .map(|text| TableCell {
            runs: vec![TextRun::new(text.as_str(), size).with_bold(true)],
            shading: Some(fill),
            alignment: Some(Alignment::Center),
        })
        .collect();

    let rows = model
        .rows
        .iter()
        .map(|row| {
            row.iter()
                .map(|text| TableCell {
                    runs: vec![TextRun::new(text.as_str(), size)],
                    shading: None,
                    alignment: None,
                })
                .collect()
        })
        .collect();

    Element::Table(Table {
        columns: model.headers.len(),
        header,
        rows,
    })
}

pub fn render_list_item(item: &ListItem, style: &Style) -> Element {
    let mut content: Vec<Inline> = tokenize(&item.text, &style.run_defaults())
        .into_iter()
        .map(Inline::from)
        .collect();

    if let Some(bold) = &item.bold_continuation {
        let run = TextRun::new(bold.as_str(), style.list_item_size.unwrap_or(24)).with_bold(true);
        content.push(Inline::LineBreak);
        content.push(run.into());
    }

    let marker = match (item.numbered, item.sequence_id) {
        (true, Some(sequence_id)) => ListMarker::Numbered { sequence_id },
        (true, None) => ListMarker::Numbered { sequence_id: 1 },
        (false, _) => ListMarker::Bullet,
    };

    Element::ListItem(ListParagraph {
        content,
        marker,
        spacing: Spacing::even(style.paragraph_spacing / 2),
        right_to_left: style.right_to_left(),
    })
}

pub fn render_comment(text: &str, style: &Style) -> Element {
    let run = TextRun::new(format!("Comment: {text}"), style.paragraph_size.unwrap_or(24))
        .with_italic(true)
        .with_color(Color::MUTED);
    let mut paragraph = Paragraph::new(vec![run.into()]);
    paragraph.spacing = Spacing::even(style.paragraph_spacing);
    Element::Paragraph(paragraph)
}

pub fn render_image(image: &ImageRef, data: ImageData, style: &Style) -> Element {
    let intrinsic = data.format.intrinsic_size(&data.bytes);
    let (width, height) = resolve_size(image.width, image.height, intrinsic);
    Element::Image(Image {
        alt: image.alt.clone(),
        data: data.bytes,
        format: data.format,
        width,
        height,
        alignment: Alignment::Center,
        spacing: Spacing::even(style.paragraph_spacing),
    })
}

/// Visible stand-in for an image that could not be loaded.
pub fn render_image_placeholder(alt: &str, style: &Style) -> Element {
    let run = TextRun::new(
        format!("[Image could not be displayed: {alt}]"),
        style.paragraph_size.unwrap_or(24),
    )
    .with_italic(true)
    .with_color(Color::ERROR);
    let mut paragraph = Paragraph::new(vec![run.into()]);
    paragraph.alignment = Some(Alignment::Center);
    Element::Paragraph(paragraph)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::Font;
    use crate::image::ImageFormat;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn paragraph(element: Element) -> Paragraph {
        match element {
            Element::Paragraph(p) => p,
            other => panic!("expected paragraph, got {other:?}"),
        }
    }

    fn run_texts(content: &[Inline]) -> Vec<Option<&str>> {
        content
            .iter()
            .map(|inline| match inline {
                Inline::Run(run) => Some(run.text.as_str()),
                Inline::LineBreak => None,
            })
            .collect()
    }

    #[test]
    fn blockquote_alignment_only_when_set() {
        let unset = paragraph(render_blockquote("quote", &Style::default()));
        assert_eq!(unset.alignment, None);
        assert_eq!(unset.indent, 720);
        assert_eq!(unset.border.map(|b| b.edges), Some(BorderEdges::Left));

        let style = Style {
            blockquote_alignment: Some(Alignment::Center),
            ..Style::default()
        };
        let set = paragraph(render_blockquote("quote", &style));
        assert_eq!(set.alignment, Some(Alignment::Center));
        match &set.content[0] {
            Inline::Run(run) => assert!(run.italic),
            Inline::LineBreak => panic!("expected a run"),
        }
    }

    #[test]
    fn code_block_preserves_indent_and_blank_lines() {
        let code = "def f():\n    return 1\n\nprint(f())";
        let p = paragraph(render_code_block(code, Some("python"), &Style::default()));

        assert_eq!(
            run_texts(&p.content),
            vec![
                Some("python"),
                None,
                Some("def f():"),
                None,
                Some("\u{a0}\u{a0}\u{a0}\u{a0}return 1"),
                None,
                Some(""),
                None,
                Some("print(f())"),
            ]
        );
        assert_eq!(p.shading, Some(Color::CODE_FILL));
        assert_eq!(p.line_height, Some(LineHeight::Exact(360)));
    }

    #[test]
    fn code_block_label_styling() {
        let style = Style {
            code_block_size: None,
            ..Style::default()
        };
        let p = paragraph(render_code_block("x", Some("rust"), &style));
        match (&p.content[0], &p.content[2]) {
            (Inline::Run(label), Inline::Run(line)) => {
                assert!(label.bold);
                assert_eq!(label.color, Color::MUTED);
                assert_eq!(label.size, 18);
                assert_eq!(line.size, 20);
                assert_eq!(line.font, Font::Monospace);
            }
            other => panic!("unexpected content {other:?}"),
        }
    }

    #[test]
    fn code_block_without_language() {
        let p = paragraph(render_code_block("a\nb", None, &Style::default()));
        assert_eq!(run_texts(&p.content), vec![Some("a"), None, Some("b")]);
    }

    #[rstest]
    #[case(DocumentType::Document, Color::HEADER_FILL)]
    #[case(DocumentType::Report, Color::REPORT_HEADER_FILL)]
    fn table_header_shading(#[case] document_type: DocumentType, #[case] fill: Color) {
        let model = TableModel {
            headers: vec!["A".into(), "B".into()],
            rows: vec![vec!["1".into(), "".into()], vec!["ragged".into()]],
        };
        let Element::Table(table) = render_table(&model, document_type, &Style::default()) else {
            panic!("expected table");
        };

        assert_eq!(table.columns, 2);
        assert!(table.header.iter().all(|c| c.shading == Some(fill)));
        assert!(table.header.iter().all(|c| c.alignment == Some(Alignment::Center)));
        assert!(table.header.iter().all(|c| c.runs[0].bold));
        assert_eq!(table.rows[0][1].runs[0].text, "");
        assert_eq!(table.rows[1].len(), 1);
        assert!(!table.rows[0][0].runs[0].bold);
    }

    #[test]
    fn list_item_with_continuation() {
        let item = ListItem {
            text: "Regular *item*".into(),
            bold_continuation: Some("More bold text".into()),
            numbered: true,
            sequence_id: Some(3),
        };
        let Element::ListItem(list) = render_list_item(&item, &Style::default()) else {
            panic!("expected list item");
        };

        assert_eq!(list.marker, ListMarker::Numbered { sequence_id: 3 });
        assert_eq!(
            run_texts(&list.content),
            vec![Some("Regular "), Some("item"), None, Some("More bold text")]
        );
        match list.content.last() {
            Some(Inline::Run(run)) => assert!(run.bold),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(list.spacing, Spacing::even(120));
    }

    #[test]
    fn bullet_item_marker() {
        let item = ListItem {
            text: "b".into(),
            bold_continuation: None,
            numbered: false,
            sequence_id: None,
        };
        let Element::ListItem(list) = render_list_item(&item, &Style::default()) else {
            panic!("expected list item");
        };
        assert_eq!(list.marker, ListMarker::Bullet);
    }

    #[test]
    fn heading_uses_level_size_and_alignment() {
        let style = Style {
            heading1_alignment: Some(Alignment::Center),
            ..Style::default()
        };
        let Element::Heading(heading) = render_heading(1, "Test **Document**", &style) else {
            panic!("expected heading");
        };
        assert_eq!(heading.alignment, Alignment::Center);
        assert_eq!(heading.runs[0].size, 32);
        assert!(heading.runs[1].bold);
        assert_eq!(heading.bookmark, "Test_Document");
    }

    #[rstest]
    #[case("Section 1", "Section_1")]
    #[case("1. Introduction", "_1_Introduction")]
    #[case("What's new?", "Whats_new")]
    #[case("snake_case id", "snake_case_id")]
    #[case("", "_")]
    fn bookmark_ids(#[case] text: &str, #[case] expected: &str) {
        assert_eq!(bookmark_id(text), expected);
    }

    #[test]
    fn bookmark_id_is_truncated() {
        let long = "word ".repeat(20);
        assert_eq!(bookmark_id(&long).chars().count(), 40);
    }

    #[test]
    fn comment_and_placeholder() {
        let p = paragraph(render_comment("check this", &Style::default()));
        assert_eq!(run_texts(&p.content), vec![Some("Comment: check this")]);

        let p = paragraph(render_image_placeholder("Logo", &Style::default()));
        assert_eq!(
            run_texts(&p.content),
            vec![Some("[Image could not be displayed: Logo]")]
        );
        assert_eq!(p.alignment, Some(Alignment::Center));
    }

    #[test]
    fn image_sized_from_hints() {
        let image = ImageRef {
            alt: "x".into(),
            src: "x.gif".into(),
            width: Some(100),
            height: None,
        };
        let data = ImageData {
            bytes: b"GIF89a\x20\x00\x10\x00".to_vec(),
            format: ImageFormat::Gif,
        };
        let Element::Image(img) = render_image(&image, data, &Style::default()) else {
            panic!("expected image");
        };
        assert_eq!((img.width, img.height), (100, 50));
    }
}
