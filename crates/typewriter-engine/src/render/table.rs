//! Cell boundaries of a GFM table row, as char offsets into its source line.
//!
//! Code spans are raw zones: a pipe inside matching backtick runs does not
//! split a cell. A backslash escapes the next character.

use super::syntax::{CharCursor, CodeSpan, TablePipe};

/// A char range `[start, end)` of one cell's trimmed content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct TableCellRange {
    pub start: usize,
    pub end: usize,
}

impl TableCellRange {
    #[must_use]
    pub fn len(self) -> usize {
        self.end.saturating_sub(self.start)
    }

    #[must_use]
    pub fn is_empty(self) -> bool {
        self.len() == 0
    }
}

/// Splits `line` into cell ranges.
///
/// Outer pipes are ignored and each range is trimmed of surrounding
/// whitespace. A cell holding only whitespace collapses to an empty range
/// one char past its opening pipe.
pub fn cell_ranges(line: &str) -> Vec<TableCellRange> {
    let chars: Vec<char> = line.chars().collect();
    let pipes = pipe_positions(&chars);

    let mut segments = Vec::with_capacity(pipes.len() + 1);
    let mut seg_start = 0usize;
    for &p in &pipes {
        segments.push((seg_start, p));
        seg_start = p + 1;
    }
    segments.push((seg_start, chars.len()));

    let blank = |(s, e): (usize, usize)| chars[s..e].iter().all(|c| c.is_whitespace());
    if !pipes.is_empty() && segments.first().is_some_and(|s| blank(*s)) {
        segments.remove(0);
    }
    if !pipes.is_empty() && segments.last().is_some_and(|s| blank(*s)) {
        segments.pop();
    }

    segments
        .into_iter()
        .map(|(s, e)| trim_range(&chars, s, e))
        .collect()
}

/// Positions of the pipes that delimit cells.
fn pipe_positions(chars: &[char]) -> Vec<usize> {
    let mut cur = CharCursor::new(chars);
    let mut pipes = Vec::new();

    while let Some(c) = cur.peek() {
        if c == TablePipe::ESCAPE {
            cur.bump_n(2.min(chars.len() - cur.pos()));
        } else if c == CodeSpan::TICK {
            let run = cur.run_len(CodeSpan::TICK);
            cur.bump_n(run);
            if let Some(after_close) = find_closing_run(&cur, run) {
                cur.i = after_close;
            }
        } else if c == TablePipe::PIPE {
            pipes.push(cur.pos());
            cur.bump();
        } else {
            cur.bump();
        }
    }
    pipes
}

/// Finds a backtick run of exactly `run` ticks at or after the cursor and
/// returns the position just past it.
fn find_closing_run(cur: &CharCursor<'_>, run: usize) -> Option<usize> {
    let mut ahead = cur.clone();
    while !ahead.eof() {
        if ahead.peek() == Some(CodeSpan::TICK) {
            let len = ahead.run_len(CodeSpan::TICK);
            ahead.bump_n(len);
            if len == run {
                return Some(ahead.pos());
            }
        } else {
            ahead.bump();
        }
    }
    None
}

fn trim_range(chars: &[char], start: usize, end: usize) -> TableCellRange {
    let slice = &chars[start..end];
    match slice.iter().position(|c| !c.is_whitespace()) {
        Some(first) => {
            let last = slice.iter().rposition(|c| !c.is_whitespace()).unwrap_or(first);
            TableCellRange {
                start: start + first,
                end: start + last + 1,
            }
        }
        None => {
            let at = (start + 1).min(end);
            TableCellRange { start: at, end: at }
        }
    }
}
