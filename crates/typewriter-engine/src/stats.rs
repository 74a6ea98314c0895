//! Status-bar figures.

use std::sync::LazyLock;

use regex::Regex;

static FENCED_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```.*?```").expect("valid fenced code pattern"));

static INLINE_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"`[^`]+`").expect("valid inline code pattern"));

static INLINE_LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\]]+)\]\([^)]+\)").expect("valid link pattern"));

static MARKERS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[#*_~`>\-|]").expect("valid marker pattern"));

/// Counts words, ignoring code, link targets and Markdown markers.
pub fn count_words(text: &str) -> usize {
    if text.trim().is_empty() {
        return 0;
    }
    let text = FENCED_CODE.replace_all(text, "");
    let text = INLINE_CODE.replace_all(&text, "");
    let text = INLINE_LINK.replace_all(&text, "$1");
    let text = MARKERS.replace_all(&text, "");
    text.split_whitespace().count()
}

/// Counts chars (Unicode scalar values).
pub fn count_characters(text: &str) -> usize {
    text.chars().count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("", 0)]
    #[case("   \n ", 0)]
    #[case("one two  three", 3)]
    #[case("# Heading here", 2)]
    #[case("see [the docs](http://example.com/a b) now", 4)]
    #[case("before\n```\nlet a = b;\n```\nafter", 2)]
    #[case("use `x.y()` here", 2)]
    #[case("- item\n- другой", 2)]
    #[case("سلام دنیای زیبا", 3)]
    #[case("well-known *fact*", 2)]
    #[case("--- | ---", 0)]
    fn word_counts(#[case] text: &str, #[case] expected: usize) {
        assert_eq!(count_words(text), expected);
    }

    #[test]
    fn characters_are_scalars() {
        assert_eq!(count_characters("abc"), 3);
        assert_eq!(count_characters("سلام"), 4);
        assert_eq!(count_characters(""), 0);
    }
}
