//! # Document Outline
//!
//! Scans source lines for ATX headings (`# Title` through `###### Title`) and
//! gives each one a deterministic id derived from its text and line number.
//!
//! Only ATX headings are recognised. Setext headings (`Title` underlined with
//! `===` or `---`) render as headings in the preview but do not appear in the
//! outline.
//!
//! ## Modules
//!
//! - **`toc`**: table-of-contents generation (Markdown and HTML) from headings

pub mod toc;

use std::iter::Enumerate;
use std::str::Split;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

pub use toc::{toc_html, toc_markdown};

static ATX_HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(#{1,6})\s+(.+)$").expect("valid heading pattern"));

/// Characters dropped from slugs: anything that is not an ASCII word
/// character, whitespace, a hyphen or in the Arabic block.
static SLUG_STRIP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[^A-Za-z0-9_\s\x{0600}-\x{06FF}-]").expect("valid slug pattern")
});

static WHITESPACE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid whitespace pattern"));

static HYPHEN_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-+").expect("valid hyphen pattern"));

/// A heading found in the source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Heading {
    /// `heading-{line}-{slug}`
    pub id: String,
    pub text: String,
    /// 1 to 6
    pub level: u8,
    /// 1-based source line
    pub line: usize,
}

/// Builds the id for a heading with the given text on the given 1-based line.
pub fn heading_id(text: &str, line: usize) -> String {
    let lowered = text.to_lowercase();
    let stripped = SLUG_STRIP.replace_all(&lowered, "");
    let hyphenated = WHITESPACE_RUN.replace_all(stripped.trim(), "-");
    let slug = HYPHEN_RUN.replace_all(&hyphenated, "-");
    format!("heading-{line}-{slug}")
}

/// Parses a single source line as an ATX heading.
///
/// Returns `(level, text)` with the text trimmed.
pub fn parse_heading_line(line: &str) -> Option<(u8, &str)> {
    let caps = ATX_HEADING.captures(line)?;
    let level = u8::try_from(caps.get(1)?.as_str().len()).ok()?;
    Some((level, caps.get(2)?.as_str().trim()))
}

/// Iterator over the headings of a source string, in line order.
///
/// Each call to [`extract_headings`] rescans from the start; clone the
/// iterator to walk the same headings again.
#[derive(Debug, Clone)]
pub struct Headings<'a> {
    lines: Enumerate<Split<'a, char>>,
}

impl Iterator for Headings<'_> {
    type Item = Heading;

    fn next(&mut self) -> Option<Heading> {
        for (index, line) in self.lines.by_ref() {
            if let Some((level, text)) = parse_heading_line(line) {
                let line = index + 1;
                return Some(Heading {
                    id: heading_id(text, line),
                    text: text.to_string(),
                    level,
                    line,
                });
            }
        }
        None
    }
}

/// Extracts the headings of `source`.
pub fn extract_headings(source: &str) -> Headings<'_> {
    Headings {
        lines: source.split('\n').enumerate(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[test]
    fn title_scenario() {
        let headings: Vec<_> = extract_headings("# Title\n\nSome text.").collect();
        assert_eq!(
            headings,
            vec![Heading {
                id: "heading-1-title".to_string(),
                text: "Title".to_string(),
                level: 1,
                line: 1,
            }]
        );
    }

    #[rstest]
    #[case("# One", Some((1, "One")))]
    #[case("###### Six", Some((6, "Six")))]
    #[case("####### Seven", None)]
    #[case("#NoSpace", None)]
    #[case("#", None)]
    #[case("  # Indented", None)]
    #[case("##   padded text  ", Some((2, "padded text")))]
    #[case("## فارسی", Some((2, "فارسی")))]
    fn heading_line_cases(#[case] line: &str, #[case] expected: Option<(u8, &str)>) {
        assert_eq!(parse_heading_line(line), expected);
    }

    #[test]
    fn levels_and_lines() {
        let source = "intro\n## Second\ntext\n### Third\n";
        let headings: Vec<_> = extract_headings(source).collect();
        assert_eq!(headings.len(), 2);
        assert_eq!((headings[0].level, headings[0].line), (2, 2));
        assert_eq!((headings[1].level, headings[1].line), (3, 4));
    }

    #[test]
    fn extraction_is_idempotent_and_restartable() {
        let source = "# A\n## B\n# A";
        let headings = extract_headings(source);
        let first: Vec<_> = headings.clone().collect();
        let second: Vec<_> = headings.collect();
        assert_eq!(first, second);
        assert_eq!(first, extract_headings(source).collect::<Vec<_>>());
        assert_ne!(first[0].id, first[2].id);
    }

    #[test]
    fn empty_source_has_no_headings() {
        assert_eq!(extract_headings("").count(), 0);
    }

    #[rstest]
    #[case("Hello World", 3, "heading-3-hello-world")]
    #[case("What's  new?", 1, "heading-1-whats-new")]
    #[case("a - b -- c", 2, "heading-2-a-b-c")]
    #[case("نوشتن به فارسی", 7, "heading-7-نوشتن-به-فارسی")]
    #[case("Café Crème", 4, "heading-4-caf-crme")]
    #[case("  Trim me  ", 5, "heading-5-trim-me")]
    fn heading_id_cases(#[case] text: &str, #[case] line: usize, #[case] expected: &str) {
        assert_eq!(heading_id(text, line), expected);
    }
}
