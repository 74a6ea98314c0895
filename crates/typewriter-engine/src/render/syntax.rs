//! # Line Syntax
//!
//! Block-prefix knowledge used when deciding where a line anchor may go.
//! Each type owns its delimiters; callers never hardcode `>`, `#` or fences.

use std::sync::LazyLock;

use regex::Regex;

/// Blockquote prefix handling.
pub struct BlockQuote;

impl BlockQuote {
    pub const PREFIX: char = '>';
    pub const MAX_INDENT: usize = 3;

    /// Strips every leading `>` marker, returning `(depth, byte_offset)` of
    /// the quoted content.
    pub fn strip_prefixes(s: &str) -> (u8, usize) {
        let mut depth = 0u8;
        let mut at = 0;
        while let Some(len) = Self::marker_len(&s[at..]) {
            depth = depth.saturating_add(1);
            at += len;
        }
        (depth, at)
    }

    /// One marker: up to three spaces, `>`, then at most one space or tab.
    fn marker_len(s: &str) -> Option<usize> {
        let indent = s.len() - s.trim_start_matches(' ').len();
        if indent > Self::MAX_INDENT || !s[indent..].starts_with(Self::PREFIX) {
            return None;
        }
        let after = indent + Self::PREFIX.len_utf8();
        Some(after + usize::from(s[after..].starts_with([' ', '\t'])))
    }
}

/// Raw HTML block kinds, keyed by how they end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HtmlBlock {
    /// `<script>`, `<pre>`, `<style>`, `<textarea>`; ends at the closing tag.
    Raw,
    /// `<!--`; ends at `-->`.
    Comment,
    /// `<?`; ends at `?>`.
    Instruction,
    /// `<!DOCTYPE` and friends; ends at `>`.
    Declaration,
    /// `<![CDATA[`; ends at `]]>`.
    Cdata,
    /// Known block-level tag; ends at a blank line.
    BlockTag,
    /// Any other complete tag alone on its line; ends at a blank line.
    LoneTag,
}

static RAW_OPEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^<(?i:script|pre|style|textarea)(?:[ \t>]|$)").expect("valid raw html pattern")
});

static RAW_CLOSE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"</(?i:script|pre|style|textarea)>").expect("valid raw html close pattern")
});

static DECLARATION_OPEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^<![A-Za-z]").expect("valid declaration pattern"));

static BLOCK_TAG_OPEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^</?(?i:address|article|aside|base|basefont|blockquote|body|caption|center|col|colgroup|dd|details|dialog|dir|div|dl|dt|fieldset|figcaption|figure|footer|form|frame|frameset|h[1-6]|head|header|hr|html|iframe|legend|li|link|main|menu|menuitem|nav|noframes|ol|optgroup|option|p|param|search|section|summary|table|tbody|td|tfoot|th|thead|title|tr|track|ul)(?:[ \t]|/?>|$)",
    )
    .expect("valid block tag pattern")
});

static LONE_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"^(?:<[A-Za-z][A-Za-z0-9-]*(?:[ \t]+[A-Za-z_:][A-Za-z0-9_.:-]*(?:[ \t]*=[ \t]*(?:[^ \t"'=<>`]+|'[^']*'|"[^"]*"))?)*[ \t]*/?>|</[A-Za-z][A-Za-z0-9-]*[ \t]*>)[ \t]*\r?$"#,
    )
    .expect("valid lone tag pattern")
});

impl HtmlBlock {
    /// The block `s` opens, if any. A lone tag cannot interrupt a paragraph,
    /// so it only counts when `after_paragraph_break` is set.
    pub fn start(s: &str, after_paragraph_break: bool) -> Option<Self> {
        if !s.starts_with('<') {
            return None;
        }
        if RAW_OPEN.is_match(s) {
            Some(HtmlBlock::Raw)
        } else if s.starts_with("<!--") {
            Some(HtmlBlock::Comment)
        } else if s.starts_with("<?") {
            Some(HtmlBlock::Instruction)
        } else if s.starts_with("<![CDATA[") {
            Some(HtmlBlock::Cdata)
        } else if DECLARATION_OPEN.is_match(s) {
            Some(HtmlBlock::Declaration)
        } else if BLOCK_TAG_OPEN.is_match(s) {
            Some(HtmlBlock::BlockTag)
        } else if after_paragraph_break && LONE_TAG.is_match(s) {
            Some(HtmlBlock::LoneTag)
        } else {
            None
        }
    }

    /// Whether a blank line closes the block (it is not part of it).
    pub fn ends_at_blank(self) -> bool {
        matches!(self, HtmlBlock::BlockTag | HtmlBlock::LoneTag)
    }

    /// Whether `line` carries this block's end marker; the block ends after it.
    pub fn ends_on(self, line: &str) -> bool {
        match self {
            HtmlBlock::Raw => RAW_CLOSE.is_match(line),
            HtmlBlock::Comment => line.contains("-->"),
            HtmlBlock::Instruction => line.contains("?>"),
            HtmlBlock::Declaration => line.contains('>'),
            HtmlBlock::Cdata => line.contains("]]>"),
            HtmlBlock::BlockTag | HtmlBlock::LoneTag => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FenceKind {
    Backticks,
    Tildes,
}

/// An open fence: which character, and how many of them opened it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FenceSig {
    pub kind: FenceKind,
    pub len: usize,
}

/// Fenced code delimiters.
pub struct CodeFence;

impl CodeFence {
    pub const MIN_LEN: usize = 3;

    /// Recognises a fence delimiter at the start of `remainder` (up to three
    /// spaces of indentation allowed).
    pub fn sig(remainder: &str) -> Option<FenceSig> {
        let t = remainder.trim_end_matches(['\r', '\n']);
        let indent = t.len() - t.trim_start_matches(' ').len();
        if indent > 3 {
            return None;
        }
        let t = &t[indent..];
        let kind = match t.chars().next()? {
            '`' => FenceKind::Backticks,
            '~' => FenceKind::Tildes,
            _ => return None,
        };
        let marker = if kind == FenceKind::Backticks { '`' } else { '~' };
        let len = t.chars().take_while(|c| *c == marker).count();
        if len < Self::MIN_LEN {
            return None;
        }
        // Backtick fence info strings may not contain backticks.
        if kind == FenceKind::Backticks && t[len..].contains('`') {
            return None;
        }
        Some(FenceSig { kind, len })
    }

    /// Whether `candidate` closes a fence opened with `open`.
    pub fn closes(open: FenceSig, candidate: Option<FenceSig>, line: &str) -> bool {
        match candidate {
            Some(sig) => {
                sig.kind == open.kind
                    && sig.len >= open.len
                    && line.trim().chars().all(|c| c == marker_char(open.kind))
            }
            None => false,
        }
    }
}

fn marker_char(kind: FenceKind) -> char {
    match kind {
        FenceKind::Backticks => '`',
        FenceKind::Tildes => '~',
    }
}

/// List item markers: `-`, `*`, `+`, `1.` and `1)`, with an optional task box.
pub struct ListMarker;

impl ListMarker {
    pub const BULLETS: [char; 3] = ['-', '*', '+'];
    pub const MAX_ORDINAL_DIGITS: usize = 9;

    /// Byte length of the list marker (and following space) at the start of
    /// `s`, if `s` starts with one.
    pub fn strip(s: &str) -> Option<usize> {
        let b = s.as_bytes();
        let marker_end = match b.first()? {
            c if Self::BULLETS.contains(&(*c as char)) => 1,
            c if c.is_ascii_digit() => {
                let digits = b.iter().take_while(|c| c.is_ascii_digit()).count();
                if digits > Self::MAX_ORDINAL_DIGITS {
                    return None;
                }
                match b.get(digits) {
                    Some(b'.') | Some(b')') => digits + 1,
                    _ => return None,
                }
            }
            _ => return None,
        };
        match b.get(marker_end) {
            Some(b' ') | Some(b'\t') => {
                let spaces = b[marker_end..]
                    .iter()
                    .take_while(|c| **c == b' ' || **c == b'\t')
                    .count();
                Some(marker_end + spaces + Self::task_box_len(&s[marker_end + spaces..]))
            }
            _ => None,
        }
    }

    /// Length of a leading `[ ] `, `[x] ` or `[X] ` task box.
    fn task_box_len(s: &str) -> usize {
        let b = s.as_bytes();
        if b.len() >= 4
            && b[0] == b'['
            && matches!(b[1], b' ' | b'x' | b'X')
            && b[2] == b']'
            && b[3] == b' '
        {
            4
        } else {
            0
        }
    }
}

/// ATX heading markers.
pub struct AtxHeading;

impl AtxHeading {
    pub const HASH: char = '#';
    pub const MAX_LEVEL: usize = 6;

    /// Byte length of the `#` run plus following whitespace, if `s` opens an
    /// ATX heading with content.
    pub fn strip(s: &str) -> Option<usize> {
        let hashes = s.chars().take_while(|c| *c == Self::HASH).count();
        if hashes == 0 || hashes > Self::MAX_LEVEL {
            return None;
        }
        let rest = &s[hashes..];
        let spaces = rest.len() - rest.trim_start_matches([' ', '\t']).len();
        if spaces == 0 {
            return None;
        }
        Some(hashes + spaces)
    }
}

/// Inline code delimiter.
pub struct CodeSpan;

impl CodeSpan {
    pub const TICK: char = '`';
}

/// Table cell delimiter and its escape.
pub struct TablePipe;

impl TablePipe {
    pub const PIPE: char = '|';
    pub const ESCAPE: char = '\\';
}

/// A cursor over the characters of one line.
///
/// Positions are char indices, which is what editor columns and char maps use.
#[derive(Clone)]
pub struct CharCursor<'a> {
    pub chars: &'a [char],
    pub i: usize,
}

impl<'a> CharCursor<'a> {
    pub fn new(chars: &'a [char]) -> Self {
        Self { chars, i: 0 }
    }

    pub fn pos(&self) -> usize {
        self.i
    }

    pub fn eof(&self) -> bool {
        self.i >= self.chars.len()
    }

    pub fn peek(&self) -> Option<char> {
        self.chars.get(self.i).copied()
    }

    pub fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.i += 1;
        Some(c)
    }

    /// Length of the run of `c` starting at the cursor.
    pub fn run_len(&self, c: char) -> usize {
        self.chars[self.i.min(self.chars.len())..]
            .iter()
            .take_while(|x| **x == c)
            .count()
    }

    pub fn bump_n(&mut self, n: usize) {
        self.i += n;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("plain text", (0, 0))]
    #[case("> quoted", (1, 2))]
    #[case(">> nested", (2, 3))]
    #[case("> > spaced", (2, 4))]
    #[case("   > indented", (1, 5))]
    #[case("    > code", (0, 0))]
    #[case(">\ttab", (1, 2))]
    #[case(">  two spaces", (1, 2))]
    fn quote_prefixes(#[case] line: &str, #[case] expected: (u8, usize)) {
        assert_eq!(BlockQuote::strip_prefixes(line), expected);
    }

    #[rstest]
    #[case("<div>", true, Some(HtmlBlock::BlockTag))]
    #[case("<div>", false, Some(HtmlBlock::BlockTag))]
    #[case("</TABLE>", false, Some(HtmlBlock::BlockTag))]
    #[case("<p class=\"x\">text", true, Some(HtmlBlock::BlockTag))]
    #[case("<pre>", false, Some(HtmlBlock::Raw))]
    #[case("<script type=\"x\">", true, Some(HtmlBlock::Raw))]
    #[case("<!-- note", true, Some(HtmlBlock::Comment))]
    #[case("<?php", true, Some(HtmlBlock::Instruction))]
    #[case("<!DOCTYPE html>", true, Some(HtmlBlock::Declaration))]
    #[case("<![CDATA[", true, Some(HtmlBlock::Cdata))]
    #[case("<custom-tag a=\"1\" b>", true, Some(HtmlBlock::LoneTag))]
    #[case("</span>  ", true, Some(HtmlBlock::LoneTag))]
    #[case("<custom-tag>", false, None)]
    #[case("<b>Bold</b> text", true, None)]
    #[case("<em>Lead</em> sentence", true, None)]
    #[case("<https://example.com> is the site", true, None)]
    #[case("<span>", true, Some(HtmlBlock::LoneTag))]
    #[case("plain", true, None)]
    fn html_block_starts(#[case] line: &str, #[case] after_break: bool, #[case] expected: Option<HtmlBlock>) {
        assert_eq!(HtmlBlock::start(line, after_break), expected);
    }

    #[test]
    fn html_block_ends() {
        assert!(HtmlBlock::Comment.ends_on("still -->"));
        assert!(!HtmlBlock::Comment.ends_on("still going"));
        assert!(HtmlBlock::Raw.ends_on("x</PRE>"));
        assert!(HtmlBlock::Declaration.ends_on("<!DOCTYPE html>"));
        assert!(!HtmlBlock::BlockTag.ends_on("</div>"));
        assert!(HtmlBlock::LoneTag.ends_at_blank());
        assert!(!HtmlBlock::Comment.ends_at_blank());
    }

    #[rstest]
    #[case("```rust", Some(FenceSig { kind: FenceKind::Backticks, len: 3 }))]
    #[case("~~~~", Some(FenceSig { kind: FenceKind::Tildes, len: 4 }))]
    #[case("   ```", Some(FenceSig { kind: FenceKind::Backticks, len: 3 }))]
    #[case("    ```", None)]
    #[case("``", None)]
    #[case("``` a`b", None)]
    #[case("hello", None)]
    fn fence_signatures(#[case] line: &str, #[case] expected: Option<FenceSig>) {
        assert_eq!(CodeFence::sig(line), expected);
    }

    #[test]
    fn fence_closing_rules() {
        let open = FenceSig { kind: FenceKind::Backticks, len: 4 };
        assert!(CodeFence::closes(open, CodeFence::sig("````"), "````"));
        assert!(CodeFence::closes(open, CodeFence::sig("`````"), "`````"));
        assert!(!CodeFence::closes(open, CodeFence::sig("```"), "```"));
        assert!(!CodeFence::closes(open, CodeFence::sig("~~~~"), "~~~~"));
        assert!(!CodeFence::closes(open, CodeFence::sig("````js"), "````js"));
    }

    #[rstest]
    #[case("- item", Some(2))]
    #[case("*   spaced", Some(4))]
    #[case("12. twelve", Some(4))]
    #[case("3) three", Some(3))]
    #[case("- [ ] todo", Some(6))]
    #[case("- [x] done", Some(6))]
    #[case("-no space", None)]
    #[case("1234567890. too long", None)]
    #[case("text", None)]
    fn list_markers(#[case] line: &str, #[case] expected: Option<usize>) {
        assert_eq!(ListMarker::strip(line), expected);
    }

    #[rstest]
    #[case("# Title", Some(2))]
    #[case("###   Spaced", Some(6))]
    #[case("####### seven", None)]
    #[case("#hashtag", None)]
    fn atx_headings(#[case] line: &str, #[case] expected: Option<usize>) {
        assert_eq!(AtxHeading::strip(line), expected);
    }

    #[test]
    fn cursor_basics() {
        let chars: Vec<char> = "``a".chars().collect();
        let mut cur = CharCursor::new(&chars);
        assert_eq!(cur.run_len('`'), 2);
        cur.bump_n(2);
        assert_eq!(cur.peek(), Some('a'));
        assert_eq!(cur.bump(), Some('a'));
        assert!(cur.eof());
        assert_eq!(cur.run_len('`'), 0);
    }
}
