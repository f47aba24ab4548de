use std::collections::HashMap;
use std::fmt::Write;

use crate::block::{
    Border, BorderEdges, Color, Element, Font, Heading, Image, Inline, LineHeight, ListMarker,
    ListParagraph, Paragraph, Spacing, Table, TableCell, TextRun,
};
use crate::config::{Alignment, Config};
use crate::image::ImageFormat;

const MONOSPACE_FONT: &str = "DejaVu Sans Mono";
/// Typst's default paragraph leading, in em.
const BASE_LEADING: f64 = 0.65;

/// Convert elements to Typst markup
pub fn elements_to_typst(elements: &[Element], config: &Config) -> String {
    let mut emitter = Emitter::default();

    // Set up paragraph settings to prevent widows/orphans
    emitter.out.push_str("#set par(linebreaks: \"optimized\")\n");
    if config.style.right_to_left() {
        emitter.out.push_str("#set text(dir: rtl)\n");
    }
    emitter.out.push('\n');

    let mut i = 0;
    while i < elements.len() {
        match &elements[i] {
            Element::Heading(heading) => {
                emitter.end_list();
                // Keep heading with following content using a block that prevents breaks
                emitter.out.push_str("#block(breakable: false");
                emitter.spacing_args(heading.spacing);
                emitter.out.push_str(")[\n");
                emitter.heading(heading);

                // Page breaks are not allowed inside containers
                if let Some(next) = elements.get(i + 1)
                    && !matches!(next, Element::Heading(_) | Element::PageBreak)
                {
                    i += 1;
                    emitter.element(next);
                    emitter.end_list();
                }
                emitter.out.push_str("]\n\n");
            }
            element => emitter.element(element),
        }

        i += 1;
    }
    emitter.end_list();

    emitter.out
}

#[derive(Default)]
struct Emitter {
    out: String,
    /// Items emitted so far per numbered sequence.
    numbers: HashMap<u32, u32>,
    /// Sequence of the list item just written, `Some(None)` for bullets.
    open_list: Option<Option<u32>>,
}

impl Emitter {
    fn element(&mut self, element: &Element) {
        if let Element::ListItem(item) = element {
            self.list_item(item);
            return;
        }
        self.end_list();

        match element {
            Element::Heading(heading) => self.heading(heading),
            Element::Paragraph(paragraph) => self.paragraph(paragraph),
            Element::ListItem(_) => {}
            Element::Table(table) => {
                // Keep tables together when possible
                self.out.push_str("#block(breakable: false)[\n");
                self.table(table);
                self.out.push_str("]\n\n");
            }
            Element::Image(image) => self.image(image),
            Element::TableOfContents => self.out.push_str("#outline()\n\n"),
            Element::PageBreak => self.out.push_str("#pagebreak()\n\n"),
            Element::Rule => self.out.push_str("#line(length: 100%)\n\n"),
        }
    }

    fn end_list(&mut self) {
        if self.open_list.take().is_some() {
            self.out.push('\n');
        }
    }

    fn spacing_args(&mut self, spacing: Spacing) {
        let _ = write!(
            self.out,
            ", above: {}, below: {}",
            twips(spacing.before),
            twips(spacing.after)
        );
    }

    fn heading(&mut self, heading: &Heading) {
        let _ = write!(
            self.out,
            "#align({})[#heading(level: {})[",
            align_keyword(heading.alignment),
            heading.level
        );
        for run in &heading.runs {
            run_to_typst(run, &mut self.out);
        }
        let _ = writeln!(self.out, "] <{}>]", heading.bookmark);
    }

    fn paragraph(&mut self, paragraph: &Paragraph) {
        self.out.push_str("#block(width: 100%");
        self.spacing_args(paragraph.spacing);
        if paragraph.indent > 0 {
            let padding = if paragraph.border.is_some() || paragraph.shading.is_some() {
                "4pt"
            } else {
                "0pt"
            };
            let _ = write!(
                self.out,
                ", inset: (left: {}, rest: {padding})",
                twips(paragraph.indent)
            );
        }
        if let Some(border) = paragraph.border {
            let _ = write!(self.out, ", stroke: {}", stroke(border));
        }
        if let Some(fill) = paragraph.shading {
            let _ = write!(self.out, ", fill: {}", rgb(fill));
        }
        self.out.push_str(")[\n");

        match paragraph.line_height {
            Some(LineHeight::Auto(factor)) => {
                let _ = writeln!(
                    self.out,
                    "#set par(leading: {:.3}em)",
                    BASE_LEADING * f64::from(factor)
                );
            }
            Some(LineHeight::Exact(height)) => {
                let _ = writeln!(self.out, "#set par(leading: {} - 1em)", twips(height));
            }
            None => {}
        }
        match paragraph.alignment {
            Some(Alignment::Justified) => self.out.push_str("#set par(justify: true)\n"),
            Some(alignment) => {
                let _ = writeln!(self.out, "#set align({})", align_keyword(alignment));
            }
            None => {}
        }
        if paragraph.right_to_left {
            self.out.push_str("#set text(dir: rtl)\n");
        }

        inlines_to_typst(&paragraph.content, &mut self.out);
        self.out.push_str("\n]\n\n");
    }

    fn list_item(&mut self, item: &ListParagraph) {
        let sequence = match item.marker {
            ListMarker::Bullet => None,
            ListMarker::Numbered { sequence_id } => Some(sequence_id),
        };
        // A new numbered sequence right after another list gets its own list
        if let Some(previous) = self.open_list
            && previous != sequence
            && sequence.is_some()
        {
            self.out.push('\n');
        }

        match sequence {
            None => self.out.push_str("- "),
            Some(sequence_id) => {
                let number = self.numbers.entry(sequence_id).or_insert(0);
                *number += 1;
                let _ = write!(self.out, "{number}. ");
            }
        }
        inlines_to_typst(&item.content, &mut self.out);
        self.out.push('\n');
        self.open_list = Some(sequence);
    }

    fn table(&mut self, table: &Table) {
        if table.columns == 0 {
            return;
        }

        self.out.push_str("#table(\n");
        let _ = writeln!(self.out, "  columns: {},", table.columns);

        for cell in &table.header {
            self.cell(cell);
        }
        // Ragged rows are not padded
        for cell in table.rows.iter().flatten() {
            self.cell(cell);
        }

        self.out.push_str(")\n");
    }

    fn cell(&mut self, cell: &TableCell) {
        let mut args = Vec::new();
        if let Some(fill) = cell.shading {
            args.push(format!("fill: {}", rgb(fill)));
        }
        if let Some(alignment) = cell.alignment {
            args.push(format!("align: {}", align_keyword(alignment)));
        }

        if args.is_empty() {
            self.out.push_str("  [");
        } else {
            let _ = write!(self.out, "  table.cell({})[", args.join(", "));
        }
        for run in &cell.runs {
            run_to_typst(run, &mut self.out);
        }
        self.out.push_str("],\n");
    }

    fn image(&mut self, image: &Image) {
        self.out.push_str("#block(width: 100%");
        self.spacing_args(image.spacing);
        self.out.push_str(")[\n");

        let _ = write!(self.out, "#align({})[#image(bytes((", align_keyword(image.alignment));
        for (index, byte) in image.data.iter().enumerate() {
            if index > 0 {
                self.out.push(',');
            }
            let _ = write!(self.out, "{byte}");
        }
        if image.data.len() == 1 {
            self.out.push(',');
        }
        let _ = writeln!(
            self.out,
            ")), format: \"{}\", width: {}, height: {}, alt: {})]",
            format_name(image.format),
            pixels(image.width),
            pixels(image.height),
            string_literal(&image.alt)
        );

        self.out.push_str("]\n\n");
    }
}

fn inlines_to_typst(content: &[Inline], out: &mut String) {
    for inline in content {
        match inline {
            Inline::Run(run) => run_to_typst(run, out),
            Inline::LineBreak => out.push_str("#linebreak()"),
        }
    }
}

fn run_to_typst(run: &TextRun, out: &mut String) {
    if let Some(fill) = run.shading {
        let _ = write!(out, "#highlight(fill: {})[", rgb(fill));
    }

    let _ = write!(out, "#text(size: {}", half_points(run.size));
    if run.bold {
        out.push_str(", weight: \"bold\"");
    }
    if run.italic {
        out.push_str(", style: \"italic\"");
    }
    if run.font == Font::Monospace {
        let _ = write!(out, ", font: \"{MONOSPACE_FONT}\"");
    }
    if run.color != Color::BLACK {
        let _ = write!(out, ", fill: {}", rgb(run.color));
    }
    if run.right_to_left {
        out.push_str(", dir: rtl");
    }
    let _ = write!(out, ", {})", string_literal(&run.text));

    if run.shading.is_some() {
        out.push(']');
    }
}

/// Quote text as a Typst string, so no markup escaping is needed.
fn string_literal(text: &str) -> String {
    let mut literal = String::with_capacity(text.len() + 2);
    literal.push('"');
    for ch in text.chars() {
        match ch {
            '"' => literal.push_str("\\\""),
            '\\' => literal.push_str("\\\\"),
            '\n' => literal.push_str("\\n"),
            _ => literal.push(ch),
        }
    }
    literal.push('"');
    literal
}

fn rgb(color: Color) -> String {
    format!("rgb(\"{color}\")")
}

fn stroke(border: Border) -> String {
    let thickness = format!("{}pt", f64::from(border.size) / 8.0);
    match border.edges {
        BorderEdges::Left => format!("(left: {thickness} + {})", rgb(border.color)),
        BorderEdges::All => format!("{thickness} + {}", rgb(border.color)),
    }
}

fn align_keyword(alignment: Alignment) -> &'static str {
    match alignment {
        Alignment::Left => "left",
        Alignment::Center => "center",
        Alignment::Right => "right",
        // Block-level content has no justified alignment
        Alignment::Justified => "left",
    }
}

fn format_name(format: ImageFormat) -> &'static str {
    match format {
        ImageFormat::Png => "png",
        ImageFormat::Jpeg => "jpg",
        ImageFormat::Gif => "gif",
    }
}

fn half_points(size: u32) -> String {
    format!("{}pt", f64::from(size) / 2.0)
}

fn twips(value: u32) -> String {
    format!("{}pt", f64::from(value) / 20.0)
}

/// CSS pixels to points.
fn pixels(value: u32) -> String {
    format!("{}pt", f64::from(value) * 0.75)
}
