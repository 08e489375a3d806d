//! Byte-offset to line-number mapping for position reporting.

/// Byte offsets of every newline in `input`.
pub(crate) fn compute_lines(input: &str) -> Vec<usize> {
    input
        .bytes()
        .enumerate()
        .filter(|(_, b)| *b == b'\n')
        .map(|(i, _)| i)
        .collect()
}

/// 1-based line number of the byte at `pos`. A newline byte belongs to the
/// line it terminates.
pub(crate) fn line_at(newlines: &[usize], pos: usize) -> usize {
    newlines.partition_point(|&offset| offset < pos) + 1
}
