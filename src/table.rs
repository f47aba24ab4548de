//! Pipe-table detection and cell extraction.

use once_cell::sync::Lazy;
use regex::Regex;
use std::ops::Range;

/// `|---|:--|--:|:-:|` style separator between header and body.
static SEPARATOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*\|(?:\s*:?-{2,}:?\s*\|)+\s*$").unwrap());

/// Header and body cells of one table, as trimmed strings.
///
/// Empty cells are kept as `""`. Body rows are not padded or truncated to
/// the header width.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableModel {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// A table together with the source lines it spans.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableBlock {
    pub lines: Range<usize>,
    pub model: TableModel,
}

pub fn is_table_row(line: &str) -> bool {
    line.trim().starts_with('|')
}

pub fn is_separator(line: &str) -> bool {
    SEPARATOR.is_match(line)
}

/// Strip one outer pipe on each side and split the rest into trimmed cells.
pub fn split_row(line: &str) -> Vec<String> {
    let trimmed = line.trim();
    let inner = trimmed.strip_prefix('|').unwrap_or(trimmed);
    let inner = inner.strip_suffix('|').unwrap_or(inner);
    inner.split('|').map(|cell| cell.trim().to_string()).collect()
}

/// Find every table in `lines`, in source order.
///
/// A table starts at a pipe-prefixed line immediately followed by a
/// separator line, and runs until the first line that is not pipe-prefixed.
/// Scanning resumes after the end of each table.
pub fn locate_tables<S: AsRef<str>>(lines: &[S]) -> Vec<TableBlock> {
    let mut tables = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        let header = lines[i].as_ref();
        let confirmed = is_table_row(header)
            && lines
                .get(i + 1)
                .is_some_and(|next| is_separator(next.as_ref()));
        if !confirmed {
            i += 1;
            continue;
        }

        let headers = split_row(header);
        let mut end = i + 2;
        let mut rows = Vec::new();
        while end < lines.len() && is_table_row(lines[end].as_ref()) {
            rows.push(split_row(lines[end].as_ref()));
            end += 1;
        }

        tables.push(TableBlock {
            lines: i..end,
            model: TableModel { headers, rows },
        });
        i = end;
    }

    tables
}

/// All tables in `lines`. See [`locate_tables`].
pub fn collect_tables<S: AsRef<str>>(lines: &[S]) -> Vec<TableModel> {
    locate_tables(lines)
        .into_iter()
        .map(|block| block.model)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn strings(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn empty_cell_preserved() {
        let lines = ["| A | B |", "|---|---|", "| 1 |   |"];
        let tables = collect_tables(&lines);
        assert_eq!(
            tables,
            vec![TableModel {
                headers: strings(&["A", "B"]),
                rows: vec![strings(&["1", ""])],
            }]
        );
    }

    #[test]
    fn basic_table_with_surrounding_text() {
        let lines = [
            "Intro",
            "| Header 1 | Header 2 |",
            "|----------|----------|",
            "| Cell 1   | Cell 2   |",
            "| Cell 3   | Cell 4   |",
            "",
            "After",
        ];
        let blocks = locate_tables(&lines);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].lines, 1..5);
        assert_eq!(blocks[0].model.headers, strings(&["Header 1", "Header 2"]));
        assert_eq!(blocks[0].model.rows.len(), 2);
        assert_eq!(blocks[0].model.rows[1], strings(&["Cell 3", "Cell 4"]));
    }

    #[test]
    fn alignment_markers_and_empty_columns() {
        let lines = [
            "| Left | Center | Right | Empty |",
            "|:-----|:------:|------:|-------|",
            "| a    |   b    |     c |       |",
            "| d    |   e    |     f |   g   |",
        ];
        let tables = collect_tables(&lines);
        assert_eq!(tables[0].headers.len(), 4);
        assert_eq!(tables[0].rows[0], strings(&["a", "b", "c", ""]));
        assert_eq!(tables[0].rows[1], strings(&["d", "e", "f", "g"]));
    }

    #[test]
    fn header_without_body_rows() {
        let lines = ["| A |", "|---|", "text after"];
        let tables = collect_tables(&lines);
        assert_eq!(tables.len(), 1);
        assert!(tables[0].rows.is_empty());
    }

    #[test]
    fn ragged_rows_pass_through() {
        let lines = ["| A | B |", "|---|---|", "| 1 |", "| 1 | 2 | 3 |"];
        let tables = collect_tables(&lines);
        assert_eq!(tables[0].rows[0], strings(&["1"]));
        assert_eq!(tables[0].rows[1], strings(&["1", "2", "3"]));
    }

    #[test]
    fn adjacent_pipes_yield_empty_cells() {
        assert_eq!(split_row("|a||b|"), strings(&["a", "", "b"]));
        assert_eq!(split_row("  | x |  "), strings(&["x"]));
        assert_eq!(split_row("|"), strings(&[""]));
    }

    #[test]
    fn two_tables_in_order() {
        let lines = [
            "| A |", "|---|", "| 1 |", "", "| B |", "|---|", "| 2 |", "| 3 |",
        ];
        let tables = collect_tables(&lines);
        assert_eq!(tables.len(), 2);
        assert_eq!(tables[0].headers, strings(&["A"]));
        assert_eq!(tables[1].rows.len(), 2);
    }

    #[rstest]
    #[case("|---|---|", true)]
    #[case("|:--|--:|", true)]
    #[case("  | :---: |  ", true)]
    #[case("|-|", false)]
    #[case("---|---", false)]
    #[case("| a | b |", false)]
    #[case("|---|x|", false)]
    fn separator_shapes(#[case] line: &str, #[case] expected: bool) {
        assert_eq!(is_separator(line), expected);
    }

    #[test]
    fn separator_shaped_body_row_stays_in_table() {
        let lines = ["| A |", "|---|", "| 1 |", "|---|", "| 2 |"];
        let blocks = locate_tables(&lines);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].lines, 0..5);
        assert_eq!(
            blocks[0].model.rows,
            vec![strings(&["1"]), strings(&["---"]), strings(&["2"])]
        );
    }

    #[test]
    fn unconfirmed_header_is_not_a_table() {
        let lines = ["| A | B |", "| 1 | 2 |"];
        assert!(collect_tables(&lines).is_empty());
    }
}
