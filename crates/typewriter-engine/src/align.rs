//! # Source/Rendered Alignment
//!
//! Maps every character of a rendered text run back to a character of the
//! source line it came from, using a longest-common-subsequence alignment.
//!
//! Rendering removes Markdown syntax (`**`, `#`, link targets, ...) and may
//! add characters the source never had. Characters the LCS leaves unmatched
//! take the index right after the closest matched character before them, so
//! a click on them lands next to their neighbour in the source.
//!
//! The table is `O(m·n)` in time and space. Callers align one source line at
//! a time, which keeps both strings short.
//!
//! ## Tie-break
//!
//! Equal characters are matched as soon as the walk reaches them. On a
//! mismatch where skipping either side keeps the same LCS length, the source
//! side is advanced, so an ambiguous rendered character after a mismatch
//! binds to the *later* of two equal source candidates.

/// Aligns `rendered` against `source`, both taken as Unicode scalar values.
///
/// The result has one entry per rendered character, each a char index into
/// `source` in `0..source_len` (all zeros when `source` is empty).
pub fn align(source: &str, rendered: &str) -> Vec<usize> {
    let src: Vec<char> = source.chars().collect();
    let out: Vec<char> = rendered.chars().collect();
    align_chars(&src, &out)
}

/// [`align`] over pre-split characters.
pub fn align_chars(src: &[char], out: &[char]) -> Vec<usize> {
    let (m, n) = (src.len(), out.len());
    if n == 0 {
        return Vec::new();
    }
    if m == 0 {
        return vec![0; n];
    }

    let table = LcsTable::build(src, out);

    let mut matched: Vec<Option<usize>> = vec![None; n];
    let (mut i, mut j) = (0usize, 0usize);
    while i < m && j < n {
        if src[i] == out[j] {
            matched[j] = Some(i);
            i += 1;
            j += 1;
        } else if table.get(i + 1, j) >= table.get(i, j + 1) {
            i += 1;
        } else {
            j += 1;
        }
    }

    fill_unmatched(&matched, m)
}

/// Replaces unmatched entries with `previous match + 1`, clamped to the last
/// source index; unmatched entries before any match become 0.
fn fill_unmatched(matched: &[Option<usize>], source_len: usize) -> Vec<usize> {
    let last = source_len.saturating_sub(1);
    let mut previous: Option<usize> = None;
    matched
        .iter()
        .map(|m| match m {
            Some(i) => {
                previous = Some(*i);
                *i
            }
            None => previous.map_or(0, |p| (p + 1).min(last)),
        })
        .collect()
}

/// Suffix LCS lengths: `get(i, j)` is the LCS of `src[i..]` and `out[j..]`.
struct LcsTable {
    cols: usize,
    cells: Vec<u32>,
}

impl LcsTable {
    fn build(src: &[char], out: &[char]) -> Self {
        let (m, n) = (src.len(), out.len());
        let cols = n + 1;
        let mut cells = vec![0u32; (m + 1) * cols];
        for i in (0..m).rev() {
            for j in (0..n).rev() {
                cells[i * cols + j] = if src[i] == out[j] {
                    cells[(i + 1) * cols + j + 1] + 1
                } else {
                    cells[(i + 1) * cols + j].max(cells[i * cols + j + 1])
                };
            }
        }
        Self { cols, cells }
    }

    fn get(&self, i: usize, j: usize) -> u32 {
        self.cells[i * self.cols + j]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[test]
    fn identity_alignment() {
        let s = "Hello World";
        assert_eq!(align(s, s), (0..s.len()).collect::<Vec<_>>());
    }

    #[test]
    fn identity_alignment_multibyte() {
        let s = "سلام دنیا";
        assert_eq!(align(s, s), (0..s.chars().count()).collect::<Vec<_>>());
    }

    #[test]
    fn strips_emphasis_markers() {
        assert_eq!(
            align("**bold** text", "bold text"),
            vec![2, 3, 4, 5, 8, 9, 10, 11, 12]
        );
    }

    #[test]
    fn strips_heading_prefix() {
        assert_eq!(align("## Title", "Title"), vec![3, 4, 5, 6, 7]);
    }

    #[test]
    fn link_text_maps_inside_brackets() {
        assert_eq!(align("[ab](http://x)", "ab"), vec![1, 2]);
    }

    #[test]
    fn ties_advance_source_first() {
        // LCS of "ab" and "ba" is length 1 either way; advancing the source
        // binds the rendered 'b' to source 1 and the trailing 'a' follows it.
        assert_eq!(align("ab", "ba"), vec![1, 1]);
    }

    #[test]
    fn direct_match_is_taken_immediately() {
        assert_eq!(align("aa", "a"), vec![0]);
    }

    #[test]
    fn ambiguous_match_after_mismatch_binds_to_later_candidate() {
        assert_eq!(align("xaa", "ya"), vec![0, 2]);
    }

    #[test]
    fn inserted_characters_follow_previous_match() {
        assert_eq!(align("ab", "aXYb"), vec![0, 1, 1, 1]);
    }

    #[test]
    fn leading_unmatched_default_to_zero() {
        assert_eq!(align("abc", "XXc"), vec![0, 0, 2]);
    }

    #[test]
    fn trailing_unmatched_clamped_to_last_index() {
        assert_eq!(align("ab", "abXYZ"), vec![0, 1, 1, 1, 1]);
    }

    #[rstest]
    #[case("", "abc", vec![0, 0, 0])]
    #[case("abc", "", vec![])]
    #[case("", "", vec![])]
    fn empty_inputs(#[case] source: &str, #[case] rendered: &str, #[case] expected: Vec<usize>) {
        assert_eq!(align(source, rendered), expected);
    }

    #[rstest]
    #[case("- item with `code` and *em*", "item with code and em")]
    #[case("> quoted **text**", "quoted text")]
    #[case("| a | b |", "ab")]
    #[case("completely different", "zzzz")]
    #[case("x", "a much longer rendered string")]
    fn mapping_has_rendered_length_and_stays_in_bounds(
        #[case] source: &str,
        #[case] rendered: &str,
    ) {
        let map = align(source, rendered);
        let source_len = source.chars().count();
        assert_eq!(map.len(), rendered.chars().count());
        assert!(map.iter().all(|&i| i < source_len));
    }
}
