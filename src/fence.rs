//! Fenced code block boundaries.

const FENCE: &str = "```";

/// Language tag of an opening fence line. Empty when the fence has none.
pub fn opening(line: &str) -> Option<&str> {
    line.trim().strip_prefix(FENCE).map(str::trim)
}

/// Index of the fence closing the block opened at `start`, or `lines.len()`
/// when the block runs to the end of input.
pub fn closing<S: AsRef<str>>(lines: &[S], start: usize) -> usize {
    lines
        .iter()
        .enumerate()
        .skip(start + 1)
        .find(|(_, line)| line.as_ref().trim().starts_with(FENCE))
        .map_or(lines.len(), |(index, _)| index)
}
