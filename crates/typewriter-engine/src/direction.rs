//! # Text Direction Detection
//!
//! Classifies text as left-to-right, right-to-left or mixed by counting
//! characters from the Hebrew/Arabic blocks against Latin letters.
//!
//! Two operations exist because they answer different questions:
//!
//! - [`classify`] describes a whole document for the status bar. It needs a
//!   clear (>70%) majority before committing to one side.
//! - [`classify_dominant`] picks a direction for one rendered block. A block
//!   must always end up `ltr` or `rtl`, so any majority wins and ties fall
//!   back to the first strong character.
//!
//! Characters outside both ranges (CJK, emoji, symbols) carry no weight in
//! either ratio. Text made only of such characters classifies as `ltr`.

use serde::{Deserialize, Serialize};

/// Punctuation removed before counting, together with whitespace and ASCII digits.
const NEUTRAL_PUNCTUATION: &str = ".,!?;:'\"()[]{}<>@#$%^&*+=-_/\\|~`";

/// Share of strong characters one side needs for [`classify`] to pick it.
const MAJORITY_RATIO: f64 = 0.7;

/// Result of whole-text classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextDirection {
    Ltr,
    Rtl,
    Mixed,
}

impl TextDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            TextDirection::Ltr => "ltr",
            TextDirection::Rtl => "rtl",
            TextDirection::Mixed => "mixed",
        }
    }
}

/// Direction applied to a single block. Never mixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Ltr,
    Rtl,
}

impl Direction {
    /// Value for the `dir` attribute and the CSS `direction` property.
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Ltr => "ltr",
            Direction::Rtl => "rtl",
        }
    }

    /// CSS `text-align` value matching this direction.
    pub fn text_align(self) -> &'static str {
        match self {
            Direction::Ltr => "left",
            Direction::Rtl => "right",
        }
    }
}

/// Returns true for characters in the right-to-left script ranges.
pub fn is_rtl_char(c: char) -> bool {
    matches!(c, '\u{0591}'..='\u{07FF}' | '\u{FB1D}'..='\u{FDFD}' | '\u{FE70}'..='\u{FEFC}')
}

/// Returns true for Latin and Latin Extended letters.
pub fn is_ltr_char(c: char) -> bool {
    c.is_ascii_alphabetic()
        || matches!(c, '\u{00C0}'..='\u{00D6}' | '\u{00D8}'..='\u{00F6}' | '\u{00F8}'..='\u{02B8}')
}

fn is_neutral(c: char) -> bool {
    c.is_whitespace() || c.is_ascii_digit() || NEUTRAL_PUNCTUATION.contains(c)
}

#[derive(Debug, Default, Clone, Copy)]
struct StrongCounts {
    rtl: usize,
    ltr: usize,
    /// Characters left after removing neutrals, strong or not.
    remaining: usize,
}

fn count_strong(text: &str) -> StrongCounts {
    text.chars()
        .filter(|c| !is_neutral(*c))
        .fold(StrongCounts::default(), |mut acc, c| {
            acc.remaining += 1;
            if is_rtl_char(c) {
                acc.rtl += 1;
            } else if is_ltr_char(c) {
                acc.ltr += 1;
            }
            acc
        })
}

/// Classifies a run of text as `ltr`, `rtl` or `mixed`.
pub fn classify(text: &str) -> TextDirection {
    let counts = count_strong(text);
    let total = counts.rtl + counts.ltr;
    if counts.remaining == 0 || total == 0 {
        return TextDirection::Ltr;
    }

    let rtl_ratio = counts.rtl as f64 / total as f64;
    let ltr_ratio = counts.ltr as f64 / total as f64;

    if rtl_ratio > MAJORITY_RATIO {
        TextDirection::Rtl
    } else if ltr_ratio > MAJORITY_RATIO {
        TextDirection::Ltr
    } else {
        TextDirection::Mixed
    }
}

/// Picks the direction of a single block of text.
pub fn classify_dominant(text: &str) -> Direction {
    let counts = count_strong(text);
    if counts.rtl > counts.ltr {
        return Direction::Rtl;
    }
    if counts.ltr > counts.rtl {
        return Direction::Ltr;
    }
    first_strong(text).unwrap_or_default()
}

/// Direction of the first strong character, if any.
pub fn first_strong(text: &str) -> Option<Direction> {
    text.chars().find_map(|c| {
        if is_rtl_char(c) {
            Some(Direction::Rtl)
        } else if is_ltr_char(c) {
            Some(Direction::Ltr)
        } else {
            None
        }
    })
}
