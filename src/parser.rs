use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::block::Element;
use crate::config::Config;
use crate::image::{ImageResolver, parse_image_line};
use crate::fence;
use crate::list::{self, ListItem, ListSequenceState};
use crate::render;
use crate::table::{self, TableBlock};

static HEADING: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(#{1,6})\s+(.*)$").unwrap());

const TOC_MARKER: &str = "[TOC]";
const PAGE_BREAK_MARKER: &str = r"\pagebreak";
const COMMENT_PREFIX: &str = "COMMENT:";

/// Strip YAML frontmatter from the beginning of markdown content
fn strip_frontmatter(markdown: &str) -> &str {
    if !markdown.starts_with("---") {
        return markdown;
    }
    // Find the closing ---
    if let Some(end) = markdown[3..].find("\n---") {
        // Skip past the closing --- and the rest of its line
        let after = &markdown[3 + end + 4..];
        match after.find('\n') {
            Some(newline) => &after[newline + 1..],
            None => "",
        }
    } else {
        markdown
    }
}

/// Parse markdown text into document elements, in source order.
pub fn parse(markdown: &str, config: &Config, images: &dyn ImageResolver) -> Vec<Element> {
    let markdown = strip_frontmatter(markdown);
    let lines: Vec<&str> = markdown.lines().collect();
    let (sequence_ids, _) = list::sequence_lines(&lines, ListSequenceState::new());
    let mut state = ParseState {
        tables: table::locate_tables(&lines)
            .into_iter()
            .map(|block| (block.lines.start, block))
            .collect(),
        sequence_ids,
        last_sequence: 0,
    };
    let mut elements = Vec::new();

    let mut index = 0;
    while index < lines.len() {
        index = process_line(&lines, index, &mut state, config, images, &mut elements);
    }

    elements
}

struct ParseState {
    // Tables found up front, keyed by their header line
    tables: BTreeMap<usize, TableBlock>,
    // Numbering for every line, from one pass over the whole document
    sequence_ids: Vec<Option<u32>>,
    last_sequence: u32,
}

/// Handle the block starting at `lines[index]`, returning the index of the
/// first line after it.
fn process_line(
    lines: &[&str],
    index: usize,
    state: &mut ParseState,
    config: &Config,
    images: &dyn ImageResolver,
    elements: &mut Vec<Element>,
) -> usize {
    let style = &config.style;
    let line = lines[index];
    let trimmed = line.trim();

    if let Some(language) = fence::opening(trimmed) {
        let body_end = fence::closing(lines, index);
        let code = lines[index + 1..body_end].join("\n");
        let language = (!language.is_empty()).then_some(language);
        elements.push(render::render_code_block(&code, language, style));
        return (body_end + 1).min(lines.len());
    }

    if let Some(block) = state.tables.remove(&index) {
        log::debug!(
            "table at line {}: {} columns, {} rows",
            index + 1,
            block.model.headers.len(),
            block.model.rows.len()
        );
        elements.push(render::render_table(&block.model, config.document_type, style));
        return block.lines.end;
    }

    if list::is_rule(trimmed) {
        elements.push(Element::Rule);
        return index + 1;
    }

    if let Some((item, span)) = list::parse_item(lines, index) {
        let sequence_id = state.sequence_ids.get(index).copied().flatten();
        if let Some(id) = sequence_id
            && id != state.last_sequence
        {
            log::debug!("numbered list sequence {id} starts at line {}", index + 1);
            state.last_sequence = id;
        }
        let item = ListItem {
            sequence_id,
            ..item
        };
        elements.push(render::render_list_item(&item, style));
        return index + span;
    }

    if trimmed.is_empty() {
        return index + 1;
    }

    if trimmed == TOC_MARKER {
        elements.push(Element::TableOfContents);
    } else if trimmed == PAGE_BREAK_MARKER {
        elements.push(Element::PageBreak);
    } else if let Some(captures) = HEADING.captures(trimmed) {
        let level = captures[1].len() as u8;
        let text = captures[2].trim_end_matches('#').trim();
        elements.push(render::render_heading(level, text, style));
    } else if let Some(image) = parse_image_line(trimmed) {
        let element = match images.resolve(&image.src) {
            Ok(data) => render::render_image(&image, data, style),
            Err(err) => {
                log::warn!("image `{}` could not be loaded: {err}", image.src);
                render::render_image_placeholder(&image.alt, style)
            }
        };
        elements.push(element);
    } else if let Some(quote) = trimmed.strip_prefix('>') {
        elements.push(render::render_blockquote(quote.trim_start(), style));
    } else if let Some(comment) = trimmed.strip_prefix(COMMENT_PREFIX) {
        elements.push(render::render_comment(comment.trim(), style));
    } else {
        elements.push(render::render_paragraph(trimmed, style));
    }

    index + 1
}
