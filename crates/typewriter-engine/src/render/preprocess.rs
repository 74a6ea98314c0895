//! # Source Preprocessing
//!
//! Rewrites the source before parsing, one line at a time, without changing
//! the number of lines:
//!
//! - a zero-width anchor `<span class="src-anchor" data-src-line="N"></span>`
//!   goes after each content line's block prefix, so the rendered block
//!   knows which source line it came from;
//! - inline images become placeholders that keep their original Markdown in
//!   a trailing comment.
//!
//! Lines whose content the parser would not treat as inline Markdown get no
//! anchor: fenced code and its delimiters, blank lines, thematic breaks and
//! setext underlines, table delimiter rows, link reference and footnote
//! definitions, raw HTML blocks and indented code. A line that merely starts
//! with inline HTML or an autolink is ordinary text and is anchored.

use std::ops::Range;
use std::sync::LazyLock;

use html_escape::encode_double_quoted_attribute;
use regex::Regex;

use super::char_map::IdSequence;
use super::syntax::{
    AtxHeading, BlockQuote, CodeFence, CodeSpan, FenceSig, HtmlBlock, ListMarker, TablePipe,
};

/// Class carried by line anchors.
pub const ANCHOR_CLASS: &str = "src-anchor";

/// Prefix of the comment that follows an image placeholder.
pub const IMAGE_COMMENT_PREFIX: &str = "<!--MD:";

static THEMATIC_BREAK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^ {0,3}(?:(?:-[ \t]*){3,}|(?:\*[ \t]*){3,}|(?:_[ \t]*){3,})\r?$")
        .expect("valid thematic break pattern")
});

static SETEXT_UNDERLINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^ {0,3}(?:=+|-+)[ \t]*\r?$").expect("valid setext pattern")
});

static TABLE_DELIMITER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\|?\s*:?-+:?\s*(\|\s*:?-+:?\s*)*\|?\s*$").expect("valid delimiter row pattern")
});

static REFERENCE_DEFINITION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^ {0,3}\[[^\]]+\]:").expect("valid reference definition pattern")
});

static INLINE_IMAGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"!\[([^\]]*)\]\(([^)]+)\)").expect("valid image pattern")
});

/// Zero-width anchor for 1-based source line `line`.
pub fn anchor_html(line: usize) -> String {
    format!(r#"<span class="{ANCHOR_CLASS}" data-src-line="{line}"></span>"#)
}

/// Injects line anchors and image placeholders.
pub fn preprocess(source: &str, images: &mut IdSequence) -> String {
    let mut state = LineState::default();
    source
        .split('\n')
        .enumerate()
        .map(|(i, line)| state.process(i + 1, line, Some(&mut *images)))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Injects line anchors only.
pub fn inject_line_anchors(source: &str) -> String {
    let mut state = LineState::default();
    source
        .split('\n')
        .enumerate()
        .map(|(i, line)| state.process(i + 1, line, None))
        .collect::<Vec<_>>()
        .join("\n")
}

struct LineState {
    fence: Option<FenceSig>,
    html_block: Option<HtmlBlock>,
    indented_code: bool,
    in_list: bool,
    prev_blank: bool,
    /// The previous line was paragraph text the next line may continue.
    paragraph_open: bool,
}

impl Default for LineState {
    fn default() -> Self {
        Self {
            fence: None,
            html_block: None,
            indented_code: false,
            in_list: false,
            prev_blank: true,
            paragraph_open: false,
        }
    }
}

impl LineState {
    fn process(&mut self, number: usize, line: &str, images: Option<&mut IdSequence>) -> String {
        let (depth, quote_end) = BlockQuote::strip_prefixes(line);
        let body = &line[quote_end..];
        let continues_paragraph = std::mem::take(&mut self.paragraph_open);

        if let Some(open) = self.fence {
            if CodeFence::closes(open, CodeFence::sig(body), body) {
                self.fence = None;
            }
            return line.to_string();
        }

        if let Some(block) = self.html_block {
            let blank = body.trim().is_empty();
            if blank && block.ends_at_blank() {
                self.html_block = None;
                self.prev_blank = true;
            } else if block.ends_on(body) {
                self.html_block = None;
                self.prev_blank = false;
            }
            return line.to_string();
        }

        if let Some(sig) = CodeFence::sig(body) {
            self.fence = Some(sig);
            self.prev_blank = false;
            return line.to_string();
        }

        if body.trim().is_empty() {
            self.prev_blank = true;
            return line.to_string();
        }
        let prev_blank = std::mem::replace(&mut self.prev_blank, false);

        let indent = indent_width(body);
        if self.indented_code && indent >= 4 {
            return line.to_string();
        }
        self.indented_code = false;
        if prev_blank && indent >= 4 && !self.in_list && depth == 0 {
            self.indented_code = true;
            return line.to_string();
        }

        if THEMATIC_BREAK.is_match(body)
            || SETEXT_UNDERLINE.is_match(body)
            || TABLE_DELIMITER.is_match(body)
            || REFERENCE_DEFINITION.is_match(body)
        {
            return line.to_string();
        }

        let indent_bytes = body.len() - body.trim_start_matches([' ', '\t']).len();
        let mut at = quote_end + indent_bytes;
        let mut heading = false;
        match ListMarker::strip(&line[at..]) {
            Some(marker) => {
                at += marker;
                self.in_list = true;
            }
            None if indent == 0 && prev_blank && depth == 0 => self.in_list = false,
            None => {}
        }
        if let Some(hashes) = AtxHeading::strip(&line[at..]) {
            at += hashes;
            heading = true;
        }

        let remainder = &line[at..];
        if remainder.trim().is_empty() {
            return line.to_string();
        }
        if !heading {
            if let Some(block) = HtmlBlock::start(remainder, !continues_paragraph) {
                if block.ends_at_blank() || !block.ends_on(remainder) {
                    self.html_block = Some(block);
                }
                return line.to_string();
            }
            self.paragraph_open = true;
        }
        if remainder.starts_with(TablePipe::PIPE) {
            at += TablePipe::PIPE.len_utf8();
        }

        let mut out = String::with_capacity(line.len() + 64);
        out.push_str(&line[..at]);
        out.push_str(&anchor_html(number));
        out.push_str(&line[at..]);

        match images {
            Some(ids) => replace_images(&out, ids),
            None => out,
        }
    }
}

/// Leading whitespace width with tabs counted to the next multiple of 4.
fn indent_width(s: &str) -> usize {
    let mut width = 0;
    for c in s.chars() {
        match c {
            ' ' => width += 1,
            '\t' => width += 4 - width % 4,
            _ => break,
        }
    }
    width
}

fn replace_images(line: &str, ids: &mut IdSequence) -> String {
    let code = code_span_ranges(line);
    let mut out = String::with_capacity(line.len());
    let mut last = 0;

    for caps in INLINE_IMAGE.captures_iter(line) {
        let Some(whole) = caps.get(0) else { continue };
        if code.iter().any(|r| r.start < whole.end() && whole.start() < r.end) {
            continue;
        }
        let alt = caps.get(1).map_or("", |m| m.as_str());
        let url = extract_url(caps.get(2).map_or("", |m| m.as_str()));

        out.push_str(&line[last..whole.start()]);
        out.push_str(&format!(
            r#"<img src="{}" alt="{}" data-image-id="{}" />{IMAGE_COMMENT_PREFIX}{}-->"#,
            encode_double_quoted_attribute(url),
            encode_double_quoted_attribute(alt),
            ids.next_id(),
            urlencoding::encode(whole.as_str()),
        ));
        last = whole.end();
    }
    out.push_str(&line[last..]);
    out
}

/// The destination of an inline link, without angle brackets or title.
fn extract_url(inner: &str) -> &str {
    let inner = inner.trim();
    if let Some(rest) = inner.strip_prefix('<') {
        if let Some(end) = rest.find('>') {
            return &rest[..end];
        }
    }
    inner.split_whitespace().next().unwrap_or(inner)
}

/// Byte ranges of closed code spans on one line.
fn code_span_ranges(line: &str) -> Vec<Range<usize>> {
    let b = line.as_bytes();
    let tick = CodeSpan::TICK as u8;
    let run_at = |i: usize| b[i..].iter().take_while(|c| **c == tick).count();

    let mut ranges = Vec::new();
    let mut i = 0;
    while i < b.len() {
        if b[i] != tick {
            i += 1;
            continue;
        }
        let open = run_at(i);
        let mut j = i + open;
        let mut closed = None;
        while j < b.len() {
            if b[j] == tick {
                let run = run_at(j);
                if run == open {
                    closed = Some(j + run);
                    break;
                }
                j += run;
            } else {
                j += 1;
            }
        }
        match closed {
            Some(end) => {
                ranges.push(i..end);
                i = end;
            }
            None => i += open,
        }
    }
    ranges
}
